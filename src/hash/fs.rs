// File system collaborator
// Existence checks, readable streams and directory expansion

use std::fs::File;
use std::io::Read;
use std::path::Path;

use jwalk::WalkDir;

use super::error::{HashCalcError, Result};

/// A readable stream together with its total length
pub struct OpenedFile {
    pub reader: Box<dyn Read + Send>,
    pub len: u64,
}

/// File system operations the input list and the hasher depend on
pub trait FileSystem: Send + Sync {
    /// True when a file (not a directory) exists at `path`
    fn exists(&self, path: &str) -> bool;

    fn is_dir(&self, path: &str) -> bool;

    /// Open a file for sequential reading
    fn open(&self, path: &str) -> Result<OpenedFile>;

    /// Every file below `dir`, recursively, in a stable order
    fn walk_files(&self, dir: &str) -> Result<Vec<String>>;
}

/// FileSystem backed by the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn is_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn open(&self, path: &str) -> Result<OpenedFile> {
        let file = File::open(path).map_err(|e| {
            HashCalcError::from_io_error(e, "opening", Some(path.into()))
        })?;
        let len = file
            .metadata()
            .map_err(|e| HashCalcError::from_io_error(e, "reading metadata", Some(path.into())))?
            .len();
        Ok(OpenedFile {
            reader: Box::new(file),
            len,
        })
    }

    fn walk_files(&self, dir: &str) -> Result<Vec<String>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).sort(true).skip_hidden(false) {
            let entry = entry.map_err(|e| {
                let err = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed"));
                HashCalcError::from_io_error(err, "walking directory", Some(dir.into()))
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            files.push(entry.path().to_string_lossy().into_owned());
        }

        Ok(files)
    }
}
