//! Visual page equivalence.
//!
//! Two pages are equivalent when they have the same geometry and the
//! average per-channel absolute difference of their renders, normalized to
//! `[0, 1]`, does not exceed a tolerance. Re-rendering identical content can
//! shift anti-aliased edges slightly, so exact byte equality is not used.

use boilerstrip_render::{PageImage, PageRenderer, RenderError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, VerifyError>;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("page index {index} out of range for {} ({count} pages)", .path.display())]
    PageIndexOutOfRange {
        path: PathBuf,
        index: usize,
        count: usize,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Per-invocation comparison policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Largest normalized difference still counted as equal.
    pub tolerance: f32,
    /// Render resolution in dots per inch.
    pub dpi: u32,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            dpi: 150,
        }
    }
}

/// Outcome of checking a set of pages against a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Equivalent,
    /// First zero-based page index that differs. Later pages were not
    /// examined.
    Differs { index: usize },
}

impl Verdict {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Verdict::Equivalent)
    }
}

/// Normalized mean absolute channel difference, or `None` if the images
/// differ in size.
pub fn normalized_difference(a: &PageImage, b: &PageImage) -> Option<f64> {
    if a.dimensions() != b.dimensions() {
        return None;
    }
    let samples = a.pixel_count() * PageImage::CHANNELS as u64;
    if samples == 0 {
        return Some(0.0);
    }

    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();

    Some(total as f64 / (samples as f64 * PageImage::MAX_CHANNEL_VALUE as f64))
}

/// Image-level test; a size mismatch is never equivalent.
pub fn images_equivalent(a: &PageImage, b: &PageImage, tolerance: f32) -> bool {
    match normalized_difference(a, b) {
        Some(diff) => diff <= tolerance as f64,
        None => false,
    }
}

fn check_index<R: PageRenderer>(
    renderer: &R,
    doc: &R::Document<'_>,
    path: &Path,
    index: usize,
) -> Result<()> {
    let count = renderer.page_count(doc);
    if index >= count {
        return Err(VerifyError::PageIndexOutOfRange {
            path: path.to_path_buf(),
            index,
            count,
        });
    }
    Ok(())
}

/// Compares pages of two already-open documents.
fn compare_open<R: PageRenderer>(
    renderer: &R,
    (doc_a, path_a, index_a): (&R::Document<'_>, &Path, usize),
    (doc_b, path_b, index_b): (&R::Document<'_>, &Path, usize),
    options: &CompareOptions,
) -> Result<bool> {
    check_index(renderer, doc_a, path_a, index_a)?;
    check_index(renderer, doc_b, path_b, index_b)?;

    let size_a = renderer.page_size(doc_a, index_a)?;
    let size_b = renderer.page_size(doc_b, index_b)?;
    if size_a != size_b {
        log::debug!(
            "[Verify] geometry differs: {:?} vs {:?}, skipping render",
            size_a,
            size_b
        );
        return Ok(false);
    }

    let (width, height) = size_a.pixels_at(options.dpi);
    let image_a = renderer.render(doc_a, index_a, width, height)?;
    let image_b = renderer.render(doc_b, index_b, width, height)?;

    let diff = normalized_difference(&image_a, &image_b);
    let equal = diff.is_some_and(|d| d <= options.tolerance as f64);
    log::debug!(
        "[Verify] {} p{} vs {} p{}: diff={:?}, equal={}",
        path_a.display(),
        index_a + 1,
        path_b.display(),
        index_b + 1,
        diff,
        equal
    );
    Ok(equal)
}

/// Whether page `index_a` of `doc_a` looks the same as page `index_b` of
/// `doc_b`. Indices are zero-based.
pub fn pages_equivalent<R: PageRenderer>(
    renderer: &R,
    doc_a: &Path,
    index_a: usize,
    doc_b: &Path,
    index_b: usize,
    options: &CompareOptions,
) -> Result<bool> {
    let a = renderer.open(doc_a)?;
    let b = renderer.open(doc_b)?;
    compare_open(
        renderer,
        (&a, doc_a, index_a),
        (&b, doc_b, index_b),
        options,
    )
}

/// Checks every index of `candidate` against the same index of `reference`,
/// stopping at the first page that differs.
pub fn verify_pages<R: PageRenderer>(
    renderer: &R,
    candidate: &Path,
    reference: &Path,
    indices: impl IntoIterator<Item = usize>,
    options: &CompareOptions,
) -> Result<Verdict> {
    let doc = renderer.open(candidate)?;
    let reference_doc = renderer.open(reference)?;

    for index in indices {
        let equal = compare_open(
            renderer,
            (&doc, candidate, index),
            (&reference_doc, reference, index),
            options,
        )?;
        if !equal {
            return Ok(Verdict::Differs { index });
        }
    }
    Ok(Verdict::Equivalent)
}
