//! Snapshot load/replace
//!
//! The store keeps one SSTable holding every live record as of the last
//! compaction. Replacing it goes through a temporary file and a rename so
//! a crash leaves either the old snapshot or the new one, never a mix.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::memtable::MemTable;

use super::{SSTable, SSTableBuilder, SSTableReader};

/// Load the snapshot at `path` into a fresh MemTable
///
/// A missing file is an empty snapshot.
pub fn load_snapshot(path: &Path) -> Result<MemTable> {
    let mut table = MemTable::new();
    if !path.exists() {
        return Ok(table);
    }

    let mut reader = SSTableReader::open(path)?;
    for entry in reader.iter()? {
        let (key, value) = entry?;
        table.put(key, value);
    }

    tracing::debug!(
        snapshot = %path.display(),
        entries = table.entry_count(),
        bytes = table.size(),
        "Loaded snapshot"
    );
    Ok(table)
}

/// Write `table` as the new snapshot at `path`
pub fn write_snapshot(path: &Path, table: &MemTable) -> Result<SSTable> {
    let tmp_path = temp_path(path);

    let mut builder = SSTableBuilder::new(&tmp_path)?;
    for (key, value) in table.iter() {
        builder.add(key, value)?;
    }
    let mut meta = builder.finish()?;

    fs::rename(&tmp_path, path)?;
    sync_parent_dir(path)?;
    meta.path = path.to_path_buf();

    Ok(meta)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Make the rename itself durable
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::File::open(dir)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
