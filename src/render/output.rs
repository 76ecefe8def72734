//! Staged output files.
//!
//! Results are written to a temporary file beside the destination and moved
//! into place only once complete, so a failed run never leaves a truncated
//! output behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Result;

/// Atomically replace `path` with `contents`.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path)?;
    log::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Derive a sibling output path: `dir/stem<suffix>`.
///
/// `with_suffix("doc/paper-texpos.ndjson", "-marked-boxes.json")` yields
/// `doc/paper-texpos-marked-boxes.json`.
pub fn with_suffix<P: AsRef<Path>>(input: P, suffix: &str) -> PathBuf {
    let input = input.as_ref();
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}{}", stem, suffix))
}
