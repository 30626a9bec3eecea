//! Unpacking of the bundled bridge archives
//!
//! Packages may ship the bridge compressed next to where the executable is
//! expected. On startup every `*.tar.gz` and `*.zip` in the platform
//! directory is unpacked in place, all archives concurrently, and each
//! archive is removed once its contents are on disk.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use rayon::prelude::*;
use zip::ZipArchive;

use crate::error::AdvplError;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    /// Detect the format from a file name
    pub fn detect(file_name: &str) -> Option<Self> {
        if file_name.ends_with(".tar.gz") {
            Some(ArchiveKind::TarGz)
        } else if file_name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// Unpacks one archive into a directory
pub trait Unpacker: Sync {
    fn unpack(&self, kind: ArchiveKind, archive: &Path, dest: &Path) -> Result<()>;
}

/// In-process unpacker using the `tar`, `flate2` and `zip` crates.
///
/// Unix permission bits are restored so the bridge stays executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeUnpacker;

impl Unpacker for NativeUnpacker {
    fn unpack(&self, kind: ArchiveKind, archive: &Path, dest: &Path) -> Result<()> {
        let file = File::open(archive)
            .with_context(|| format!("Failed to open archive: {}", archive.display()))?;

        match kind {
            ArchiveKind::TarGz => {
                let mut tarball = tar::Archive::new(GzDecoder::new(file));
                tarball.set_preserve_permissions(true);
                tarball
                    .unpack(dest)
                    .with_context(|| format!("Failed to unpack tarball into {}", dest.display()))?;
            }
            ArchiveKind::Zip => {
                let mut zip = ZipArchive::new(file).context("Failed to read ZIP archive")?;
                zip.extract(dest)
                    .with_context(|| format!("Failed to unpack ZIP into {}", dest.display()))?;
            }
        }

        Ok(())
    }
}

/// Archives unpacked by [`extract`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub extracted: Vec<PathBuf>,
}

/// List the archives in `dir`, sorted by path
pub fn find_archives(dir: &Path) -> Result<Vec<(ArchiveKind, PathBuf)>, AdvplError> {
    let listing_failed = |source: std::io::Error| AdvplError::ArchiveExtractionFailed {
        archive: dir.to_path_buf(),
        source: anyhow::Error::new(source).context("Failed to list directory"),
    };

    let mut archives = Vec::new();
    for entry in fs::read_dir(dir).map_err(listing_failed)? {
        let entry = entry.map_err(listing_failed)?;
        if !entry.file_type().map_err(listing_failed)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(kind) = ArchiveKind::detect(&name.to_string_lossy()) {
            archives.push((kind, entry.path()));
        }
    }

    archives.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(archives)
}

/// Unpack every archive in `dir` and remove it afterwards.
///
/// A missing directory is not an error: there is nothing to unpack. All
/// archives are attempted even if one fails; the first failure is returned
/// and archives that failed are left in place.
pub fn extract(dir: &Path, unpacker: &impl Unpacker) -> Result<ExtractReport, AdvplError> {
    if !dir.is_dir() {
        return Ok(ExtractReport::default());
    }

    let archives = find_archives(dir)?;
    if archives.is_empty() {
        return Ok(ExtractReport::default());
    }

    let outcomes: Vec<(PathBuf, Result<()>)> = archives
        .par_iter()
        .map(|(kind, archive)| (archive.clone(), unpacker.unpack(*kind, archive, dir)))
        .collect();

    let mut report = ExtractReport::default();
    let mut first_error = None;

    for (archive, outcome) in outcomes {
        let outcome = outcome.and_then(|()| {
            fs::remove_file(&archive)
                .with_context(|| format!("Failed to remove archive: {}", archive.display()))
        });

        match outcome {
            Ok(()) => report.extracted.push(archive),
            Err(source) => {
                if first_error.is_none() {
                    first_error = Some(AdvplError::ArchiveExtractionFailed { archive, source });
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}
