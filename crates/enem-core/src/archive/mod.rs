//! Archive extractor: lists ZIP entries, picks the main CSV and copies it
//! byte-for-byte into a scratch directory.

mod select;

pub use select::{is_tabular, select_tabular_entry, EntryInfo};

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fetch::RawArchive;
use crate::layout;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("no CSV entry in archive")]
    NoTabularEntry,
    #[error("copy of {entry} to {path} failed: {source}")]
    Copy {
        entry: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("copy of {entry} is incomplete: declared {declared} bytes, wrote {written}")]
    ShortCopy {
        entry: String,
        declared: u64,
        written: u64,
    },
}

/// The selected entry materialized on disk.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub path: PathBuf,
    pub entry_name: String,
    pub declared_size: u64,
}

/// Lists every entry with its declared uncompressed size.
pub fn list_entries<R: io::Read + io::Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Vec<EntryInfo>, ExtractError> {
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let f = archive.by_index_raw(i)?;
        entries.push(EntryInfo {
            index: i,
            name: f.name().to_string(),
            size: f.size(),
            is_dir: f.is_dir(),
        });
    }
    Ok(entries)
}

/// Extracts the largest CSV entry of `archive` into `work_dir`.
///
/// Consumes the in-memory archive; its buffer is released once the copy is done.
pub fn extract(archive: RawArchive, work_dir: &Path) -> Result<ExtractedFile, ExtractError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes))?;
    let entries = list_entries(&mut zip)?;
    let chosen = select_tabular_entry(&entries)
        .cloned()
        .ok_or(ExtractError::NoTabularEntry)?;
    tracing::info!(
        entry = %chosen.name,
        size_mib = chosen.size as f64 / 1_048_576.0,
        candidates = entries.iter().filter(|e| is_tabular(&e.name)).count(),
        "selected CSV entry"
    );

    let path = work_dir.join(layout::scratch_file_name(&chosen.name));
    let copy_err = |source: io::Error| ExtractError::Copy {
        entry: chosen.name.clone(),
        path: path.clone(),
        source,
    };

    let mut source = zip.by_index(chosen.index)?;
    let file = File::create(&path).map_err(copy_err)?;
    let mut target = BufWriter::new(file);
    let written = io::copy(&mut source, &mut target).map_err(copy_err)?;
    target.flush().map_err(copy_err)?;

    if written != chosen.size {
        return Err(ExtractError::ShortCopy {
            entry: chosen.name,
            declared: chosen.size,
            written,
        });
    }

    Ok(ExtractedFile {
        path,
        entry_name: chosen.name,
        declared_size: chosen.size,
    })
}
