// Digest computation module
// Provides the algorithm registry, streaming digest engine and hex encoding

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use super::error::{HashCalcError, Result};

use md5::{Digest as Md5Digest, Md5};
use sha1::{Digest as Sha1Digest, Sha1};
use sha2::{Digest as Sha2Digest, Sha256, Sha512};

/// Trait for hash algorithm implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the result
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

// MD5 wrapper
pub struct Md5Wrapper(Md5);

impl Hasher for Md5Wrapper {
    fn update(&mut self, data: &[u8]) {
        Md5Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Md5Digest::finalize(self.0).to_vec()
    }
}

// SHA1 wrapper
pub struct Sha1Wrapper(Sha1);

impl Hasher for Sha1Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha1Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha1Digest::finalize(self.0).to_vec()
    }
}

// SHA-256 wrapper
pub struct Sha256Wrapper(Sha256);

impl Hasher for Sha256Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha2Digest::finalize(self.0).to_vec()
    }
}

// SHA-512 wrapper
pub struct Sha512Wrapper(Sha512);

impl Hasher for Sha512Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha2Digest::finalize(self.0).to_vec()
    }
}

/// Supported digest algorithms
///
/// Names are the case-sensitive literals `MD5`, `SHA1`, `SHA256` and `SHA512`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA1")]
    Sha1,
    #[default]
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Selectable algorithms, in display order
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    pub fn output_bits(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 128,
            HashAlgorithm::Sha1 => 160,
            HashAlgorithm::Sha256 => 256,
            HashAlgorithm::Sha512 => 512,
        }
    }

    /// Resolve an algorithm name, failing with `InvalidAlgorithm` for anything unknown
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name() == name)
            .ok_or_else(|| HashCalcError::InvalidAlgorithm {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashCalcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Registry for hash algorithms
pub struct HashRegistry;

impl HashRegistry {
    /// Get a fresh hasher instance for the specified algorithm
    pub fn get_hasher(algorithm: HashAlgorithm) -> Box<dyn Hasher> {
        match algorithm {
            HashAlgorithm::Md5 => Box::new(Md5Wrapper(Md5Digest::new())),
            HashAlgorithm::Sha1 => Box::new(Sha1Wrapper(Sha1Digest::new())),
            HashAlgorithm::Sha256 => Box::new(Sha256Wrapper(Sha2Digest::new())),
            HashAlgorithm::Sha512 => Box::new(Sha512Wrapper(Sha2Digest::new())),
        }
    }
}

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming digest engine
///
/// Reads the whole stream before returning; there is no partial digesting
/// across calls.
#[derive(Debug, Clone)]
pub struct DigestEngine {
    buffer_size: usize,
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestEngine {
    /// Create a new DigestEngine with the default buffer size (64KB)
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create a new DigestEngine with custom buffer size
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Digest a stream with the algorithm named `algorithm`
    pub fn digest<R: Read>(&self, algorithm: &str, reader: R) -> Result<String> {
        let algorithm = HashAlgorithm::from_name(algorithm)?;
        self.digest_with(algorithm, reader)
    }

    /// Digest a stream with an already resolved algorithm
    pub fn digest_with<R: Read>(&self, algorithm: HashAlgorithm, mut reader: R) -> Result<String> {
        let mut hasher = HashRegistry::get_hasher(algorithm);
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).map_err(|e| {
                HashCalcError::from_io_error(e, "reading stream", None)
            })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(bytes_to_hex(&hasher.finalize()))
    }
}

/// Hex-encode bytes as two uppercase digits per byte, without separators
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(hex, "{:02X}", b);
    }
    hex
}
