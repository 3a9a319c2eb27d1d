//! PDF backend
//!
//! MuPDF supplies the text layer (words, search hits, page bounds). The MuPDF
//! binding has no usable annotation API, so annotation objects are read and
//! written with lopdf and appended to the file as an incremental update.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document as LoDocument, IncrementalDocument, Object, ObjectId, Stream};
use mupdf::Document;
use tracing::debug;

use crate::document::{
    AnnotationHandle, DocumentError, FreeTextOptions, NativeAnnotation, PdfPages, Result, Rgb, Word,
};
use crate::geometry::{self, Point, Rect};

use super::annots::{self, PageBox};
use super::text;

const PDF_MIME: &str = "application/pdf";

/// Encode an object id as an annotation handle
fn handle_for(id: ObjectId) -> AnnotationHandle {
    AnnotationHandle(((id.0 as u64) << 16) | id.1 as u64)
}

fn object_id_for(handle: AnnotationHandle) -> ObjectId {
    ((handle.0 >> 16) as u32, (handle.0 & 0xFFFF) as u16)
}

/// A PDF opened for syncing
///
/// Holds the MuPDF document for text, the lopdf object graph for annotations,
/// and the bytes both were loaded from. Changes stay in memory until
/// [`PdfPages::save_incremental`] appends them to the file.
pub struct MupdfDocument {
    /// Where saves go; `None` for documents built from bytes
    path: Option<PathBuf>,
    /// Current file contents
    bytes: Vec<u8>,
    document: Document,
    objects: IncrementalDocument,
    /// Page object ids in page order
    page_ids: Vec<ObjectId>,
    page_boxes: Vec<PageBox>,
    dirty: bool,
}

impl MupdfDocument {
    /// Open a PDF file; saves are written back to it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DocumentError::NotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        let mut document = Self::from_bytes(bytes)?;
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Load a PDF from memory; saves only update [`MupdfDocument::bytes`]
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let document = Document::from_bytes(&bytes, PDF_MIME)?;
        let objects = Self::incremental(&bytes)?;

        let previous = objects.get_prev_documents();
        let page_ids: Vec<ObjectId> = previous.get_pages().into_values().collect();
        let page_boxes = page_ids
            .iter()
            .map(|id| Self::page_box(previous, *id))
            .collect::<Result<Vec<_>>>()?;

        let page_count = document.page_count()? as usize;
        if page_count != page_ids.len() {
            return Err(DocumentError::ParseError(format!(
                "Page tree lists {} pages, MuPDF sees {}",
                page_ids.len(),
                page_count
            )));
        }

        Ok(Self {
            path: None,
            bytes,
            document,
            objects,
            page_ids,
            page_boxes,
            dirty: false,
        })
    }

    fn incremental(bytes: &[u8]) -> Result<IncrementalDocument> {
        let previous = LoDocument::load_mem(bytes)?;
        let mut objects = IncrementalDocument::create_from(bytes.to_vec(), previous);
        objects.new_document.version = objects.get_prev_documents().version.clone();
        Ok(objects)
    }

    /// Crop box, else media box, following inheritance up the page tree
    pub(super) fn page_box(document: &LoDocument, page_id: ObjectId) -> Result<PageBox> {
        let mut node = document.get_dictionary(page_id)?;
        let mut media_box = None;

        // bounded walk in case of a cyclic /Parent chain
        for _ in 0..64 {
            if let Some(values) = Self::box_entry(document, node, b"CropBox") {
                return Ok(PageBox::from_array(values));
            }
            if media_box.is_none() {
                media_box = Self::box_entry(document, node, b"MediaBox");
            }
            match node.get(b"Parent") {
                Ok(Object::Reference(parent)) => node = document.get_dictionary(*parent)?,
                _ => break,
            }
        }

        media_box
            .map(PageBox::from_array)
            .ok_or_else(|| DocumentError::ParseError(format!("Page {:?} has no MediaBox", page_id)))
    }

    fn box_entry(document: &LoDocument, dict: &Dictionary, key: &[u8]) -> Option<[f64; 4]> {
        match dict.get(key).ok()? {
            Object::Reference(id) => document.get_object(*id).ok().and_then(annots::as_rect_array),
            direct => annots::as_rect_array(direct),
        }
    }

    /// Current file contents, including saved updates
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether there are changes not yet saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn check_page(&self, page: usize) -> Result<()> {
        if page >= self.page_ids.len() {
            return Err(DocumentError::PageNotFound(page, self.page_ids.len()));
        }
        Ok(())
    }

    fn load_page(&self, page: usize) -> Result<mupdf::Page> {
        self.check_page(page)?;
        Ok(self.document.load_page(page as i32)?)
    }

    /// Object as updated so far, falling back to the loaded file
    fn object(&self, id: ObjectId) -> Result<&Object> {
        match self.objects.new_document.get_object(id) {
            Ok(object) => Ok(object),
            Err(_) => Ok(self.objects.get_prev_documents().get_object(id)?),
        }
    }

    /// References listed in the page's `/Annots`
    fn annotation_ids(&self, page: usize) -> Result<Vec<ObjectId>> {
        self.check_page(page)?;
        let page_dict = self.object(self.page_ids[page])?.as_dict()?;
        let entries = match page_dict.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => self.object(*id)?.as_array()?.clone(),
            _ => Vec::new(),
        };

        Ok(entries
            .iter()
            .filter_map(|entry| match entry {
                Object::Reference(id) => Some(*id),
                _ => None,
            })
            .collect())
    }

    /// Apply `edit` to the page's `/Annots` array in the update
    fn edit_annots<F>(&mut self, page: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Object>),
    {
        self.check_page(page)?;
        let page_id = self.page_ids[page];
        self.objects.opt_clone_object_to_new_document(page_id)?;

        // an indirect /Annots array is inlined into the updated page
        let mut entries = match self.object(page_id)?.as_dict()?.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => self.object(*id)?.as_array()?.clone(),
            _ => Vec::new(),
        };
        edit(&mut entries);

        let page_dict = self
            .objects
            .new_document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)?;
        page_dict.set("Annots", Object::Array(entries));
        self.dirty = true;
        Ok(())
    }

    fn add_annotation(
        &mut self,
        page: usize,
        mut annot: Dictionary,
        appearance: Stream,
    ) -> Result<AnnotationHandle> {
        self.check_page(page)?;
        annot.set("P", Object::Reference(self.page_ids[page]));

        let appearance_id = self.objects.new_document.add_object(Object::Stream(appearance));
        let mut states = Dictionary::new();
        states.set("N", Object::Reference(appearance_id));
        annot.set("AP", Object::Dictionary(states));

        let id = self.objects.new_document.new_object_id();
        self.objects
            .new_document
            .set_object(id, Object::Dictionary(annot));
        self.edit_annots(page, |entries| entries.push(Object::Reference(id)))?;

        debug!(page, object = id.0, "Annotation added");
        Ok(handle_for(id))
    }
}

impl PdfPages for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let bounds = self.load_page(page)?.bounds()?;
        Ok(((bounds.x1 - bounds.x0) as f64, (bounds.y1 - bounds.y0) as f64))
    }

    fn words(&self, page: usize) -> Result<Vec<Word>> {
        text::extract_words(&self.load_page(page)?)
    }

    fn search_text(&self, page: usize, query: &str) -> Result<Vec<Rect>> {
        text::search_text(&self.load_page(page)?, query)
    }

    fn annotations(&self, page: usize) -> Result<Vec<NativeAnnotation>> {
        let ids = self.annotation_ids(page)?;
        let page_box = self.page_boxes[page];
        let mut found = Vec::new();

        for id in ids {
            let Ok(Object::Dictionary(dict)) = self.object(id) else {
                continue;
            };
            if let Some(annotation) = annots::parse_annotation(handle_for(id), dict, &page_box) {
                found.push(annotation);
            }
        }

        Ok(found)
    }

    fn create_highlight(
        &mut self,
        page: usize,
        quads: &[Rect],
        stroke: Rgb,
        fill: Rgb,
    ) -> Result<AnnotationHandle> {
        self.check_page(page)?;
        let bounds =
            geometry::union(quads).map_err(|e| DocumentError::ObjectError(e.to_string()))?;
        let page_box = &self.page_boxes[page];
        let annot = annots::highlight_annotation(page_box, &bounds, quads, stroke, fill);
        let appearance = annots::highlight_appearance(page_box, &bounds, quads, fill)?;
        self.add_annotation(page, annot, appearance)
    }

    fn create_text_note(&mut self, page: usize, at: Point, content: &str) -> Result<AnnotationHandle> {
        self.check_page(page)?;
        let page_box = &self.page_boxes[page];
        let annot = annots::text_note_annotation(page_box, at.x, at.y, content);
        let appearance = annots::text_note_appearance(page_box, at.x, at.y)?;
        self.add_annotation(page, annot, appearance)
    }

    fn create_free_text(
        &mut self,
        page: usize,
        rect: Rect,
        content: &str,
        options: &FreeTextOptions,
    ) -> Result<AnnotationHandle> {
        self.check_page(page)?;
        let page_box = &self.page_boxes[page];
        let annot = annots::free_text_annotation(page_box, &rect, content, options);
        let appearance = annots::free_text_appearance(page_box, &rect, content, options)?;
        self.add_annotation(page, annot, appearance)
    }

    fn delete_annotation(&mut self, page: usize, handle: AnnotationHandle) -> Result<()> {
        let target = object_id_for(handle);
        if !self.annotation_ids(page)?.contains(&target) {
            return Err(DocumentError::AnnotationNotFound(handle.0, page));
        }

        self.edit_annots(page, |entries| {
            entries.retain(|entry| !matches!(entry, Object::Reference(id) if *id == target));
        })?;
        debug!(page, object = target.0, "Annotation removed");
        Ok(())
    }

    fn save_incremental(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut buffer = Vec::new();
        self.objects.save_to(&mut buffer)?;
        if let Some(path) = &self.path {
            std::fs::write(path, &buffer)?;
        }

        // later edits build on top of the update just written
        self.objects = Self::incremental(&buffer)?;
        self.bytes = buffer;
        self.dirty = false;

        debug!(bytes = self.bytes.len(), "Incremental update saved");
        Ok(())
    }
}
