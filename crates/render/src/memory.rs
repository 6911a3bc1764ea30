//! Renderer over in-memory page images.
//!
//! Serves pre-built pages keyed by path. Used where a pdfium library is not
//! available, such as unit tests of comparison and batch logic.

use image::imageops::{self, FilterType};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{PageImage, PageRenderer, PageSize, RenderError, Result};

struct MemoryPage {
    size: PageSize,
    image: PageImage,
}

pub struct MemoryDocument<'a> {
    pages: &'a [MemoryPage],
}

#[derive(Default)]
pub struct MemoryRenderer {
    documents: HashMap<PathBuf, Vec<MemoryPage>>,
    renders: AtomicUsize,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document; each page is its geometry and its image.
    /// Images are scaled to whatever size a render call asks for.
    pub fn insert(&mut self, path: impl Into<PathBuf>, pages: Vec<(PageSize, PageImage)>) {
        let pages = pages
            .into_iter()
            .map(|(size, image)| MemoryPage { size, image })
            .collect();
        self.documents.insert(path.into(), pages);
    }

    /// Number of page renders served so far.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }

    fn page<'a>(doc: &MemoryDocument<'a>, index: usize) -> Result<&'a MemoryPage> {
        doc.pages.get(index).ok_or(RenderError::PageOutOfRange {
            index,
            count: doc.pages.len(),
        })
    }
}

impl PageRenderer for MemoryRenderer {
    type Document<'a> = MemoryDocument<'a>
    where
        Self: 'a;

    fn open<'a>(&'a self, path: &Path) -> Result<MemoryDocument<'a>> {
        self.documents
            .get(path)
            .map(|pages| MemoryDocument { pages })
            .ok_or_else(|| RenderError::Open {
                path: path.to_path_buf(),
                message: "no such document".to_string(),
            })
    }

    fn page_count(&self, doc: &MemoryDocument<'_>) -> usize {
        doc.pages.len()
    }

    fn page_size(&self, doc: &MemoryDocument<'_>, index: usize) -> Result<PageSize> {
        Ok(Self::page(doc, index)?.size)
    }

    fn render(
        &self,
        doc: &MemoryDocument<'_>,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<PageImage> {
        let page = Self::page(doc, index)?;
        self.renders.fetch_add(1, Ordering::Relaxed);

        if page.image.dimensions() == (width, height) {
            return Ok(page.image.clone());
        }
        if width == 0 || height == 0 {
            return Err(RenderError::Render {
                index,
                message: format!("empty target size {}x{}", width, height),
            });
        }
        let scaled = imageops::resize(page.image.as_rgba(), width, height, FilterType::Nearest);
        Ok(PageImage::from(scaled))
    }
}
