//! Pdfium-backed renderer.

use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

use crate::{PageImage, PageRenderer, PageSize, RenderError, Result};

/// Library search paths, most specific first.
fn pdfium_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());
        }
    }

    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));

    paths
}

fn bind_pdfium() -> Result<Pdfium> {
    for path in pdfium_search_paths() {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(&path);
        log::debug!("[Render] trying pdfium at {:?}", lib_path);

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            log::info!("[Render] loaded pdfium from {:?}", path);
            return Ok(Pdfium::new(bindings));
        }
    }

    log::debug!("[Render] trying system pdfium");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| RenderError::Library(e.to_string()))
}

fn page_at<'a>(doc: &PdfDocument<'a>, index: usize) -> Result<PdfPage<'a>> {
    let count = doc.pages().len() as usize;
    let out_of_range = || RenderError::PageOutOfRange { index, count };
    if index >= count {
        return Err(out_of_range());
    }
    let page_index = PdfPageIndex::try_from(index).map_err(|_| out_of_range())?;
    doc.pages().get(page_index).map_err(|e| RenderError::Render {
        index,
        message: e.to_string(),
    })
}

/// Renders pages with the pdfium shared library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Binds pdfium from the usual locations, falling back to the system
    /// library.
    pub fn bind() -> Result<Self> {
        Ok(Self {
            pdfium: bind_pdfium()?,
        })
    }

    /// Binds a specific pdfium library file.
    pub fn bind_at(library: &Path) -> Result<Self> {
        let bindings =
            Pdfium::bind_to_library(library).map_err(|e| RenderError::Library(e.to_string()))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    type Document<'a> = PdfDocument<'a>
    where
        Self: 'a;

    fn open<'a>(&'a self, path: &Path) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| RenderError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn page_count(&self, doc: &PdfDocument<'_>) -> usize {
        doc.pages().len() as usize
    }

    fn page_size(&self, doc: &PdfDocument<'_>, index: usize) -> Result<PageSize> {
        let page = page_at(doc, index)?;
        Ok(PageSize::new(page.width().value, page.height().value))
    }

    fn render(
        &self,
        doc: &PdfDocument<'_>,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<PageImage> {
        let page = page_at(doc, index)?;
        let render_error = |message: String| RenderError::Render { index, message };

        let target_width = i32::try_from(width).map_err(|e| render_error(e.to_string()))?;
        let target_height = i32::try_from(height).map_err(|e| render_error(e.to_string()))?;
        let config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| render_error(e.to_string()))?;

        log::debug!("[Render] page {} -> {}x{} px", index, width, height);
        Ok(PageImage::from(bitmap.as_image().to_rgba8()))
    }
}
