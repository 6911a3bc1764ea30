//! Candidate file enumeration.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::{CoreError, Result};

pub const TARGET_EXTENSION: &str = "pdf";

/// A discovered document and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl CandidateFile {
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// A directory could not be read; its contents were skipped.
    Unreadable { path: PathBuf, message: String },
    /// Two sources map to the same destination file name.
    NameCollision { path: PathBuf, other: PathBuf },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryWarning::Unreadable { path, message } => {
                write!(f, "skipped {}: {}", path.display(), message)
            }
            DiscoveryWarning::NameCollision { path, other } => write!(
                f,
                "{} has the same file name as {}; only one can be converted",
                path.display(),
                other.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: Vec<CandidateFile>,
    pub warnings: Vec<DiscoveryWarning>,
}

fn has_target_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TARGET_EXTENSION))
}

/// Recursively lists the PDF files under `source_root`, each paired with a
/// destination of the same file name directly under `destination_root`.
///
/// Directories that cannot be read are skipped with a warning. Any other
/// enumeration fault aborts the scan. If the destination lies inside the
/// source tree it is not scanned. Files are listed in path order.
pub fn collect(source_root: &Path, destination_root: &Path) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    let skip_destination = |entry: &DirEntry| {
        !(entry.file_type().is_dir() && entry.depth() > 0 && entry.path() == destination_root)
    };

    for entry in WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(skip_destination)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source_root.to_path_buf());
                let denied = err
                    .io_error()
                    .is_some_and(|io| io.kind() == ErrorKind::PermissionDenied);
                if denied && err.depth() > 0 {
                    log::warn!("[Discovery] skipping unreadable {}", path.display());
                    discovery.warnings.push(DiscoveryWarning::Unreadable {
                        path,
                        message: err.to_string(),
                    });
                    continue;
                }
                return Err(CoreError::Discovery {
                    path,
                    message: err.to_string(),
                });
            }
        };

        if !entry.file_type().is_file() || !has_target_extension(entry.path()) {
            continue;
        }

        let name = entry.file_name().to_owned();
        let key = name.to_string_lossy().to_string();
        let source = entry.into_path();
        if let Some(other) = seen.insert(key, source.clone()) {
            log::warn!(
                "[Discovery] {} and {} share a file name",
                other.display(),
                source.display()
            );
            discovery.warnings.push(DiscoveryWarning::NameCollision {
                path: source.clone(),
                other,
            });
        }

        discovery.files.push(CandidateFile {
            destination: destination_root.join(&name),
            source,
        });
    }

    log::info!(
        "[Discovery] {} files under {} ({} warnings)",
        discovery.files.len(),
        source_root.display(),
        discovery.warnings.len()
    );
    Ok(discovery)
}
