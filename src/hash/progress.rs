// Read progress module
// Wraps a byte stream and reports how far it has been consumed

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::error::{HashCalcError, Result};

/// Progress of a read, as a fraction and as a truncated percentage
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct ReadProgress {
    /// Value in the range 0 to 1
    pub normalized: f64,
    /// Value in the range 0 to 100
    pub percentage: u8,
}

impl ReadProgress {
    pub fn new(normalized: f64) -> Self {
        let normalized = normalized.clamp(0.0, 1.0);
        Self {
            normalized,
            percentage: (normalized * 100.0) as u8,
        }
    }

    pub fn complete() -> Self {
        Self::new(1.0)
    }
}

type ProgressCallback<'a> = Box<dyn FnMut(ReadProgress) + Send + 'a>;

/// Reader that fires a callback whenever the integer read percentage changes
///
/// Listeners see at most one event per percentage point. A zero-length
/// stream reports 100% on its first read.
pub struct ProgressReader<'a, R> {
    inner: R,
    total_len: u64,
    offset: u64,
    last_percentage: u8,
    finished_empty: bool,
    callback: Option<ProgressCallback<'a>>,
}

impl<'a, R: Read> ProgressReader<'a, R> {
    /// Wrap a reader whose total length is known up front
    pub fn new(inner: R, total_len: u64) -> Self {
        Self {
            inner,
            total_len,
            offset: 0,
            last_percentage: 0,
            finished_empty: false,
            callback: None,
        }
    }

    /// Register the progress listener
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(ReadProgress) + Send + 'a,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn update_progress(&mut self) {
        if self.total_len == 0 {
            if !self.finished_empty {
                self.finished_empty = true;
                self.last_percentage = 100;
                self.emit(ReadProgress::complete());
            }
            return;
        }

        let progress = ReadProgress::new(self.offset as f64 / self.total_len as f64);
        if progress.percentage != self.last_percentage {
            self.last_percentage = progress.percentage;
            self.emit(progress);
        }
    }

    fn emit(&mut self, progress: ReadProgress) {
        if let Some(callback) = self.callback.as_mut() {
            callback(progress);
        }
    }
}

impl<'a> ProgressReader<'a, File> {
    /// Open a file read-only, taking the total length from its metadata
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            HashCalcError::from_io_error(e, "opening", Some(path.to_path_buf()))
        })?;
        let len = file
            .metadata()
            .map_err(|e| HashCalcError::from_io_error(e, "reading metadata", Some(path.to_path_buf())))?
            .len();
        Ok(Self::new(file, len))
    }
}

impl<'a, R: Read> Read for ProgressReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes_read = self.inner.read(buf)?;
        self.offset += bytes_read as u64;
        self.update_progress();
        Ok(bytes_read)
    }
}
