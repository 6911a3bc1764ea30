//! Batch orchestration for boilerplate page blanking.

pub mod batch;
pub mod discovery;
pub mod registry;

pub use batch::{run_batch, BatchConfig, BatchReport, CancelToken, FileOutcome, FileReport};
pub use discovery::{collect, CandidateFile, Discovery, DiscoveryWarning, TARGET_EXTENSION};
pub use registry::{open_rule_store, register_rule, remove_rule};

use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("cannot scan {}: {message}", .path.display())]
    Discovery { path: PathBuf, message: String },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Rules(#[from] boilerstrip_rules::RuleError),
    #[error(transparent)]
    Audit(#[from] boilerstrip_audit::AuditError),
}

impl CoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Creates `dir` and its parents if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, e))
}
