//! PDF page rasterization.
//!
//! The renderer is consumed as a capability: open a document, ask for page
//! geometry, and rasterize a page to an RGBA buffer of a requested size.

#[cfg(any(test, feature = "testing"))]
mod memory;
mod pdfium;

#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryRenderer;
pub use pdfium::PdfiumRenderer;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("pdfium library unavailable: {0}")]
    Library(String),
    #[error("failed to open {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },
    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("failed to render page {index}: {message}")]
    Render { index: usize, message: String },
}

/// Page geometry in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Target pixel dimensions at `dpi`, truncated toward zero.
    pub fn pixels_at(&self, dpi: u32) -> (u32, u32) {
        let scale = dpi as f32 / POINTS_PER_INCH;
        ((self.width * scale) as u32, (self.height * scale) as u32)
    }
}

/// A rendered page: 4 channels, 8 bits per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    buffer: RgbaImage,
}

impl PageImage {
    pub const CHANNELS: usize = 4;
    pub const MAX_CHANNEL_VALUE: u8 = u8::MAX;

    /// Wraps raw interleaved pixel data; `None` if the length does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// A page of a single colour.
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        Self {
            buffer: RgbaImage::from_pixel(width, height, image::Rgba(pixel)),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Interleaved channel bytes, row-major without padding.
    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn as_rgba_mut(&mut self) -> &mut RgbaImage {
        &mut self.buffer
    }
}

impl From<RgbaImage> for PageImage {
    fn from(buffer: RgbaImage) -> Self {
        Self { buffer }
    }
}

/// Rasterization capability.
///
/// Document handles are not shared across threads; open one per worker.
pub trait PageRenderer {
    type Document<'a>
    where
        Self: 'a;

    fn open<'a>(&'a self, path: &Path) -> Result<Self::Document<'a>>;

    fn page_count(&self, doc: &Self::Document<'_>) -> usize;

    fn page_size(&self, doc: &Self::Document<'_>, index: usize) -> Result<PageSize>;

    fn render(
        &self,
        doc: &Self::Document<'_>,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<PageImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_at_dpi() {
        let a4 = PageSize::new(595.0, 842.0);
        assert_eq!(a4.pixels_at(72), (595, 842));
        assert_eq!(a4.pixels_at(150), (1239, 1754));
    }

    #[test]
    fn test_page_image_from_raw_checks_length() {
        assert!(PageImage::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(PageImage::from_raw(2, 2, vec![0; 15]).is_none());

        let image = PageImage::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(image.pixel_count(), 6);
        assert_eq!(&image.as_raw()[..4], &[1, 2, 3, 4]);
    }
}
