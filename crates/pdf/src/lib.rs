//! PDF page editing and page blanking.
//!
//! Blanking replaces selected pages with empty pages while keeping the page
//! count. Edits are expressed as an ordered list of same-index
//! remove/insert pairs and applied through the [`DocumentEditor`]
//! capability.

mod editor;
mod metadata;
mod plan;
mod transform;

pub use editor::{LopdfEditor, PdfEditDocument};
pub use plan::{apply_plan, blank_out_plan, PageEdit, PageOp};
pub use transform::{apply_with_editor, blank_out_pages};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, EditError>;

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("failed to open {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },
    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("malformed page tree: {0}")]
    PageTree(String),
    #[error("failed to save {}: {message}", .path.display())]
    Save { path: PathBuf, message: String },
    #[error("source and destination are the same file: {}", .0.display())]
    SameFile(PathBuf),
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub width: f32,
    pub height: f32,
}

impl PaperSize {
    pub const A4: PaperSize = PaperSize {
        width: 595.0,
        height: 842.0,
    };
}

/// Size of every inserted blank page.
///
/// Blank pages always use this fixed size; they do not copy the dimensions
/// of the page they replace.
pub const DEFAULT_BLANK_SIZE: PaperSize = PaperSize::A4;

/// Page editing capability.
pub trait DocumentEditor {
    type Document;

    fn open(&self, path: &Path) -> Result<Self::Document>;

    fn page_count(&self, doc: &Self::Document) -> usize;

    fn remove_page(&self, doc: &mut Self::Document, index: usize) -> Result<()>;

    /// Inserts an empty page so that it ends up at `index`.
    fn insert_blank_page(&self, doc: &mut Self::Document, index: usize, size: PaperSize)
        -> Result<()>;

    fn save(&self, doc: &mut Self::Document, path: &Path) -> Result<()>;
}
