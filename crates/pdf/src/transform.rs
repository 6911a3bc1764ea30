//! Blank out pages and move the result to its destination.

use std::fs;
use std::path::{Path, PathBuf};

use crate::plan::{apply_plan, blank_out_plan, PageEdit, PageOp};
use crate::{DocumentEditor, EditError, Result, DEFAULT_BLANK_SIZE};

/// Runs a plan through an editor. The plan is first replayed on a shadow
/// page list so that a bad plan fails before any page is touched.
pub fn apply_with_editor<E: DocumentEditor>(
    editor: &E,
    doc: &mut E::Document,
    plan: &[PageOp],
) -> Result<()> {
    let mut shadow = vec![(); editor.page_count(doc)];
    apply_plan(&mut shadow, plan, |_| ())?;

    for op in plan {
        match op.edit {
            PageEdit::Remove => editor.remove_page(doc, op.index)?,
            PageEdit::InsertBlank(size) => editor.insert_blank_page(doc, op.index, size)?,
        }
    }
    Ok(())
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Replaces the pages at `indices` (zero-based) of `source` with blank pages
/// and writes the result to `destination`. The source file is deleted only
/// once the output has been written; on any failure the source is left as
/// it was and no output remains. An existing destination is never replaced.
pub fn blank_out_pages<E: DocumentEditor>(
    editor: &E,
    source: &Path,
    indices: &[usize],
    destination: &Path,
) -> Result<()> {
    if source == destination {
        return Err(EditError::SameFile(source.to_path_buf()));
    }
    if destination.exists() {
        return Err(EditError::DestinationExists(destination.to_path_buf()));
    }

    let mut doc = editor.open(source)?;
    let plan = blank_out_plan(indices, DEFAULT_BLANK_SIZE);
    apply_with_editor(editor, &mut doc, &plan)?;

    let staging = staging_path(destination);
    if let Err(err) = editor.save(&mut doc, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    if let Err(err) = fs::rename(&staging, destination) {
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }

    if let Err(err) = fs::remove_file(source) {
        log::warn!(
            "[Transform] could not remove {}, discarding {}",
            source.display(),
            destination.display()
        );
        let _ = fs::remove_file(destination);
        return Err(err.into());
    }

    log::info!(
        "[Transform] {} -> {} ({} pages blanked)",
        source.display(),
        destination.display(),
        plan.len() / 2
    );
    Ok(())
}
