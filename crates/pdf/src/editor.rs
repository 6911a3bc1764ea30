//! lopdf-backed page editor.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::path::Path;

use crate::metadata::stamp_metadata;
use crate::{DocumentEditor, EditError, PaperSize, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on page tree depth when walking `Parent` links.
const MAX_TREE_DEPTH: usize = 64;

fn tree_error(err: lopdf::Error) -> EditError {
    EditError::PageTree(err.to_string())
}

/// An open document plus its working page order.
pub struct PdfEditDocument {
    doc: Document,
    pages_root: ObjectId,
    pages: Vec<ObjectId>,
    edited: bool,
}

impl PdfEditDocument {
    pub fn from_document(doc: Document) -> Result<Self> {
        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(tree_error)?;
        let pages_root = doc
            .get_dictionary(catalog_id)
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(tree_error)?;
        let pages = doc.get_pages().into_values().collect();

        Ok(Self {
            doc,
            pages_root,
            pages,
            edited: false,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.pages
    }

    fn add_blank_page(&mut self, size: PaperSize) -> ObjectId {
        let contents_id = self.doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_root,
            "MediaBox" => vec![0.into(), 0.into(), size.width.into(), size.height.into()],
            "Resources" => dictionary! {},
            "Contents" => contents_id,
        })
    }

    /// Copies attributes inherited from intermediate page tree nodes onto
    /// the page itself, so the page renders the same once it hangs directly
    /// under the root.
    fn pin_inherited_attributes(&mut self, page_id: ObjectId) -> Result<()> {
        let page = self.doc.get_dictionary(page_id).map_err(tree_error)?;
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut inherited: Vec<(&[u8], Object)> = Vec::new();

        let mut depth = 0;
        while let Some(node_id) = parent {
            if node_id == self.pages_root || missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }
            let node = self.doc.get_dictionary(node_id).map_err(tree_error)?;
            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((*key, value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }

        if inherited.is_empty() {
            return Ok(());
        }
        let page = self.doc.get_dictionary_mut(page_id).map_err(tree_error)?;
        for (key, value) in inherited {
            page.set(key.to_vec(), value);
        }
        Ok(())
    }

    /// Rewrites the page tree as a single level under the root node,
    /// following the working page order.
    fn rebuild_page_tree(&mut self) -> Result<()> {
        for page_id in self.pages.clone() {
            self.pin_inherited_attributes(page_id)?;
        }

        let pages_root = self.pages_root;
        for page_id in &self.pages {
            let page = self.doc.get_dictionary_mut(*page_id).map_err(tree_error)?;
            if page.get(b"Parent").and_then(Object::as_reference).ok() != Some(pages_root) {
                page.set("Parent", pages_root);
            }
        }

        let kids: Vec<Object> = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        let root: &mut Dictionary = self.doc.get_dictionary_mut(pages_root).map_err(tree_error)?;
        root.set("Kids", kids);
        root.set("Count", count);

        let pruned = self.doc.prune_objects();
        log::debug!("[Transform] page tree rebuilt, {} objects pruned", pruned.len());
        Ok(())
    }
}

/// Edits PDF files in memory with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEditor;

impl DocumentEditor for LopdfEditor {
    type Document = PdfEditDocument;

    fn open(&self, path: &Path) -> Result<PdfEditDocument> {
        let doc = Document::load(path).map_err(|e| EditError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        PdfEditDocument::from_document(doc)
    }

    fn page_count(&self, doc: &PdfEditDocument) -> usize {
        doc.pages.len()
    }

    fn remove_page(&self, doc: &mut PdfEditDocument, index: usize) -> Result<()> {
        if index >= doc.pages.len() {
            return Err(EditError::PageOutOfRange {
                index,
                count: doc.pages.len(),
            });
        }
        doc.pages.remove(index);
        doc.edited = true;
        Ok(())
    }

    fn insert_blank_page(
        &self,
        doc: &mut PdfEditDocument,
        index: usize,
        size: PaperSize,
    ) -> Result<()> {
        if index > doc.pages.len() {
            return Err(EditError::PageOutOfRange {
                index,
                count: doc.pages.len(),
            });
        }
        let page_id = doc.add_blank_page(size);
        doc.pages.insert(index, page_id);
        doc.edited = true;
        Ok(())
    }

    fn save(&self, doc: &mut PdfEditDocument, path: &Path) -> Result<()> {
        if doc.edited {
            doc.rebuild_page_tree()?;
        }
        stamp_metadata(&mut doc.doc);

        let save_error = |message: String| EditError::Save {
            path: path.to_path_buf(),
            message,
        };
        let mut file = fs::File::create(path).map_err(|e| save_error(e.to_string()))?;
        doc.doc
            .save_to(&mut file)
            .map_err(|e| save_error(e.to_string()))?;
        Ok(())
    }
}
