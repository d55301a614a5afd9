// Known hash registry module
// Parses user-supplied `HASH*PATH` text into immutable records

use std::sync::Arc;

const NEW_LINE_SEPARATORS: &[char] = &['\r', '\n'];
const HASH_SEPARATOR: char = '*';

/// A known (hash, path) pair
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct KnownHashRecord {
    pub hash: String,
    pub path: String,
}

impl KnownHashRecord {
    pub fn new(hash: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            path: path.into(),
        }
    }
}

/// Parse registry text, one record per non-empty line
///
/// Each line is split on `*` with empty tokens dropped. The first token is
/// the hash, the second (if any) the path. Both are trimmed. A line made only
/// of `*` characters yields an empty record.
pub fn parse_known_hashes(text: &str) -> Vec<KnownHashRecord> {
    text.split(NEW_LINE_SEPARATORS)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut tokens = line.split(HASH_SEPARATOR).filter(|t| !t.is_empty());
            let hash = tokens.next().map(str::trim).unwrap_or_default();
            let path = tokens.next().map(str::trim).unwrap_or_default();
            KnownHashRecord::new(hash, path)
        })
        .collect()
}

/// Immutable snapshot of the known hashes
///
/// Rebuilt wholesale whenever the source text or identity policy changes;
/// cloning shares the same records.
#[derive(Debug, Clone, Default)]
pub struct KnownHashRegistry {
    records: Arc<[KnownHashRecord]>,
    use_full_path: bool,
}

impl KnownHashRegistry {
    pub fn build(text: &str, use_full_path: bool) -> Self {
        let records = parse_known_hashes(text);
        tracing::debug!(records = records.len(), use_full_path, "rebuilt known hash registry");
        Self {
            records: records.into(),
            use_full_path,
        }
    }

    pub fn records(&self) -> &[KnownHashRecord] {
        &self.records
    }

    pub fn use_full_path(&self) -> bool {
        self.use_full_path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
