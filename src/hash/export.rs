// Export module
// Writes entries as a checksum file, one `HASH *path` line each

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::{HashCalcError, Result};
use super::input::InputEntry;
use super::path_utils::file_name_of;

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Render a single export line without its terminator
pub fn format_line(hash: &str, path: &str, file_name_only: bool) -> String {
    let path = if file_name_only { file_name_of(path) } else { path };
    format!("{} *{}", hash, path)
}

/// Write every entry to `writer` in list order
pub fn write_entries<W: Write>(writer: &mut W, entries: &[InputEntry], file_name_only: bool) -> std::io::Result<()> {
    for entry in entries {
        writer.write_all(format_line(&entry.calculated_hash, &entry.file_path, file_name_only).as_bytes())?;
        writer.write_all(LINE_ENDING.as_bytes())?;
    }
    writer.flush()
}

/// Create or overwrite `path` with the exported entries
pub fn export_to_file(path: &Path, entries: &[InputEntry], file_name_only: bool) -> Result<()> {
    let export_err = |source| HashCalcError::Export {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(export_err)?;
    let mut writer = BufWriter::new(file);
    write_entries(&mut writer, entries, file_name_only).map_err(export_err)?;

    tracing::info!(path = %path.display(), entries = entries.len(), "exported hashes");
    Ok(())
}
