//! PDF Document abstraction
//!
//! Thin adapter over `lopdf` exposing exactly what the form filler and the
//! signature field allocator need: pages, their geometry, their annotations,
//! and the interactive form dictionary.

use std::collections::HashSet;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};

/// Maximum reference chain followed before giving up
const MAX_RESOLVE_DEPTH: usize = 32;

/// Width and height of a page in default user space units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// PDF Document wrapper for loading, inspecting and saving
#[derive(Debug, Clone)]
pub struct PdfDocument {
    document: Document,
}

impl PdfDocument {
    /// Parses a PDF from memory
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes)
            .map_err(|e| Error::analysis(format!("Unable to read PDF document: {}", e)))?;
        Ok(Self { document })
    }

    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    /// Serializes the document back to bytes
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|e| Error::analysis(format!("Unable to write PDF document: {}", e)))?;
        Ok(buffer)
    }

    pub fn inner(&self) -> &Document {
        &self.document
    }

    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn page_count(&self) -> u32 {
        self.page_ids().len() as u32
    }

    /// Object id of a 1-based page number
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        (page_number as usize)
            .checked_sub(1)
            .and_then(|index| self.page_ids().get(index).copied())
            .ok_or_else(|| Error::analysis(format!("Page {} does not exist", page_number)))
    }

    /// Leaf pages in document order.
    ///
    /// Unlike `lopdf::Document::get_pages`, `/Kids` arrays held in their
    /// own object are followed. Unreadable nodes are left out, as viewers do.
    fn page_ids(&self) -> Vec<ObjectId> {
        let root = match self
            .catalog()
            .and_then(|catalog| Ok(catalog.get(b"Pages")?.as_reference()?))
        {
            Ok(root) => root,
            Err(_) => return Vec::new(),
        };

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            if depth > MAX_RESOLVE_DEPTH || !visited.insert(id) {
                continue;
            }
            let node = match self.dictionary(id) {
                Ok(node) => node,
                Err(_) => continue,
            };
            let kids = node.get(b"Kids").ok().and_then(|kids| self.resolve(kids).ok());
            match kids {
                Some(Object::Array(kids)) if !is_name(node.get(b"Type").ok(), b"Page") => {
                    for kid in kids.iter().rev() {
                        if let Object::Reference(kid) = kid {
                            stack.push((*kid, depth + 1));
                        }
                    }
                }
                _ if is_name(node.get(b"Type").ok(), b"Page") => pages.push(id),
                _ => {}
            }
        }
        pages
    }

    /// Follows indirect references until a direct object is reached
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        let mut current = object;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(id) => current = self.document.get_object(*id)?,
                other => return Ok(other),
            }
        }
        Err(Error::analysis("Reference chain too deep"))
    }

    pub fn dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        Ok(self.document.get_object(id)?.as_dict()?)
    }

    pub fn dictionary_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        Ok(self.document.get_object_mut(id)?.as_dict_mut()?)
    }

    /// Document catalog (`/Root`)
    pub fn catalog(&self) -> Result<&Dictionary> {
        let root = self
            .document
            .trailer
            .get(b"Root")
            .map_err(|_| Error::analysis("Trailer has no /Root entry"))?;
        Ok(self.resolve(root)?.as_dict()?)
    }

    /// Page size from the (possibly inherited) `/MediaBox`
    pub fn page_size(&self, page_number: u32) -> Result<PageSize> {
        let mut node_id = self.page_id(page_number)?;
        for _ in 0..MAX_RESOLVE_DEPTH {
            let node = self.dictionary(node_id)?;
            if let Ok(media_box) = node.get(b"MediaBox") {
                let rect = rect_from_object(self.resolve(media_box)?).ok_or_else(|| {
                    Error::analysis(format!("Page {} has a malformed /MediaBox", page_number))
                })?;
                return Ok(PageSize {
                    width: (rect[2] - rect[0]).abs(),
                    height: (rect[3] - rect[1]).abs(),
                });
            }
            node_id = node
                .get(b"Parent")
                .and_then(Object::as_reference)
                .map_err(|_| {
                    Error::analysis(format!("Page {} has no /MediaBox", page_number))
                })?;
        }
        Err(Error::analysis("Page tree too deep"))
    }

    /// Annotation dictionaries attached to a page
    pub fn page_annotations(&self, page_number: u32) -> Result<Vec<&Dictionary>> {
        let page = self.dictionary(self.page_id(page_number)?)?;
        let annots = match page.get(b"Annots") {
            Ok(annots) => self.resolve(annots)?,
            Err(_) => return Ok(Vec::new()),
        };
        let array = annots
            .as_array()
            .map_err(|_| Error::analysis(format!("Page {} has malformed /Annots", page_number)))?;

        let mut result = Vec::with_capacity(array.len());
        for entry in array {
            // dangling annotation references are ignored by viewers too
            if let Ok(Object::Dictionary(dict)) = self.resolve(entry) {
                result.push(dict);
            }
        }
        Ok(result)
    }

    /// Number of widget annotations on a page
    pub fn widget_count(&self, page_number: u32) -> Result<usize> {
        Ok(self
            .page_annotations(page_number)?
            .into_iter()
            .filter(|annot| is_name(annot.get(b"Subtype").ok(), b"Widget"))
            .count())
    }

    /// Appends an empty page at the end of the root page tree and returns its number
    pub fn append_page(&mut self, size: PageSize) -> Result<u32> {
        let pages_id = self
            .catalog()?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| Error::analysis("Catalog has no /Pages reference"))?;

        // /Kids may itself be an indirect array
        let kids_id = match self.dictionary(pages_id)?.get(b"Kids") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Array(_)) => None,
            _ => return Err(Error::analysis("Page tree root has no /Kids array")),
        };

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width as _),
                Object::Real(size.height as _),
            ],
            "Resources" => Dictionary::new(),
        });

        let kids = match kids_id {
            Some(id) => self.document.get_object_mut(id)?,
            None => self.dictionary_mut(pages_id)?.get_mut(b"Kids")?,
        };
        match kids {
            Object::Array(kids) => kids.push(Object::Reference(page_id)),
            _ => return Err(Error::analysis("Page tree root has no /Kids array")),
        }

        let pages = self.dictionary_mut(pages_id)?;
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages.set("Count", Object::Integer(count + 1));

        let page_number = self.page_count();
        debug!("Appended page {} ({}x{})", page_number, size.width, size.height);
        Ok(page_number)
    }

    /// Interactive form dictionary, if the document has one
    pub fn acro_form(&self) -> Result<Option<&Dictionary>> {
        match self.catalog()?.get(b"AcroForm") {
            Ok(form) => Ok(Some(self.resolve(form)?.as_dict()?)),
            Err(_) => Ok(None),
        }
    }
}

/// Numeric value of an integer or real object
pub fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// `[x1 y1 x2 y2]` rectangle
pub fn rect_from_object(object: &Object) -> Option<[f64; 4]> {
    let array = object.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, value) in rect.iter_mut().zip(array) {
        *slot = number(value)?;
    }
    Some(rect)
}

pub fn is_name(object: Option<&Object>, expected: &[u8]) -> bool {
    matches!(object, Some(Object::Name(name)) if name.as_slice() == expected)
}

/// Decodes a PDF text string (UTF-16BE with BOM, otherwise PDFDocEncoding)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Encodes a text string, using UTF-16BE only when the text is not plain ASCII
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, lopdf::StringFormat::Hexadecimal)
    }
}
