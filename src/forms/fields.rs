//! AcroForm field tree
//!
//! Walks `/AcroForm /Fields` down to the terminal fields, resolving the
//! inheritable attributes (`/FT`, `/Ff`, `/V`, `/DA`, `/Q`) and the fully
//! qualified dotted names on the way.

use std::collections::HashSet;

use lopdf::{Dictionary, Object, ObjectId};
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::forms::flags::FieldFlags;
use crate::pdf_document::{decode_text_string, is_name, PdfDocument};

const MAX_FIELD_DEPTH: usize = 32;

/// Field type from `/FT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"Tx" => FieldKind::Text,
            b"Btn" => FieldKind::Button,
            b"Ch" => FieldKind::Choice,
            b"Sig" => FieldKind::Signature,
            _ => FieldKind::Unknown,
        }
    }
}

/// A terminal form field and the widgets displaying it
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub id: ObjectId,
    /// Fully qualified name, parts joined with `.`
    pub name: String,
    pub kind: FieldKind,
    pub flags: FieldFlags,
    pub value: Option<String>,
    pub default_appearance: Option<String>,
    pub quadding: i64,
    pub widgets: Vec<ObjectId>,
}

impl FormField {
    pub fn is_signature(&self) -> bool {
        self.kind == FieldKind::Signature
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(FieldFlags::READ_ONLY)
    }
}

#[derive(Debug, Clone, Default)]
struct Inherited {
    kind: Option<FieldKind>,
    flags: Option<FieldFlags>,
    value: Option<String>,
    default_appearance: Option<String>,
    quadding: Option<i64>,
}

struct Pending {
    id: ObjectId,
    parent_name: Option<String>,
    inherited: Inherited,
    depth: usize,
}

/// Terminal fields of the document, in document order
pub fn collect_fields(document: &PdfDocument) -> Result<Vec<FormField>> {
    let acro_form = match document.acro_form()? {
        Some(acro_form) => acro_form,
        None => return Ok(Vec::new()),
    };
    let roots = match acro_form.get(b"Fields") {
        Ok(fields) => document
            .resolve(fields)?
            .as_array()
            .map_err(|_| Error::analysis("AcroForm /Fields is not an array"))?,
        Err(_) => return Ok(Vec::new()),
    };

    let defaults = Inherited {
        default_appearance: text_entry(document, acro_form, b"DA"),
        quadding: integer_entry(document, acro_form, b"Q"),
        ..Inherited::default()
    };

    let mut stack: Vec<Pending> = Vec::new();
    for entry in roots.iter().rev() {
        match entry {
            Object::Reference(id) => stack.push(Pending {
                id: *id,
                parent_name: None,
                inherited: defaults.clone(),
                depth: 0,
            }),
            _ => {
                return Err(Error::analysis(
                    "AcroForm /Fields holds a direct object instead of a field reference",
                ))
            }
        }
    }

    let mut visited = HashSet::new();
    let mut fields = Vec::new();

    while let Some(pending) = stack.pop() {
        if pending.depth > MAX_FIELD_DEPTH {
            return Err(Error::analysis("Form field tree too deep"));
        }
        if !visited.insert(pending.id) {
            warn!("Field object {:?} reached twice, ignoring", pending.id);
            continue;
        }

        let dict = document.dictionary(pending.id).map_err(|e| {
            malformed(
                pending.parent_name.as_deref(),
                format!("field object {:?} is unreadable: {}", pending.id, e),
            )
        })?;

        let name = match (pending.parent_name, text_entry(document, dict, b"T")) {
            (Some(parent), Some(partial)) => Some(format!("{}.{}", parent, partial)),
            (None, partial) => partial,
            (parent, None) => parent,
        };
        let inherited = Inherited {
            kind: kind_entry(document, dict).or(pending.inherited.kind),
            flags: flags_entry(document, dict).or(pending.inherited.flags),
            value: value_entry(document, dict).or(pending.inherited.value),
            default_appearance: text_entry(document, dict, b"DA")
                .or(pending.inherited.default_appearance),
            quadding: integer_entry(document, dict, b"Q").or(pending.inherited.quadding),
        };

        let (child_fields, widget_kids) = split_kids(document, dict, name.as_deref())?;

        if child_fields.is_empty() {
            let name = match name {
                Some(name) => name,
                None => {
                    warn!("Skipping unnamed field {:?}", pending.id);
                    continue;
                }
            };
            let widgets = if widget_kids.is_empty() && is_widget(dict) {
                vec![pending.id]
            } else {
                widget_kids
            };
            fields.push(FormField {
                id: pending.id,
                name,
                kind: inherited.kind.unwrap_or(FieldKind::Unknown),
                flags: inherited.flags.unwrap_or_default(),
                value: inherited.value,
                default_appearance: inherited.default_appearance,
                quadding: inherited.quadding.unwrap_or(0),
                widgets,
            });
        } else {
            for child in child_fields.into_iter().rev() {
                stack.push(Pending {
                    id: child,
                    parent_name: name.clone(),
                    inherited: inherited.clone(),
                    depth: pending.depth + 1,
                });
            }
        }
    }

    Ok(fields)
}

/// Kids carrying a `/T` are fields, the others are widget annotations.
///
/// A kid that cannot be read fails the walk, blamed on `owner`.
fn split_kids(
    document: &PdfDocument,
    dict: &Dictionary,
    owner: Option<&str>,
) -> Result<(Vec<ObjectId>, Vec<ObjectId>)> {
    let mut fields = Vec::new();
    let mut widgets = Vec::new();

    let kids = match dict.get(b"Kids") {
        Ok(kids) => match document.resolve(kids) {
            Ok(Object::Array(kids)) => kids,
            _ => return Err(malformed(owner, "/Kids is not an array".to_string())),
        },
        Err(_) => return Ok((fields, widgets)),
    };
    for kid in kids {
        let id = match kid {
            Object::Reference(id) => *id,
            _ => return Err(malformed(owner, "/Kids holds a direct object".to_string())),
        };
        match document.dictionary(id) {
            Ok(kid_dict) if kid_dict.has(b"T") => fields.push(id),
            Ok(_) => widgets.push(id),
            Err(e) => {
                return Err(malformed(
                    owner,
                    format!("kid {:?} is unreadable: {}", id, e),
                ))
            }
        }
    }
    Ok((fields, widgets))
}

/// Field-level failure when the field is known, document-level otherwise
fn malformed(owner: Option<&str>, reason: String) -> Error {
    match owner {
        Some(name) => Error::form_update(name, reason),
        None => Error::analysis(reason),
    }
}

fn is_widget(dict: &Dictionary) -> bool {
    is_name(dict.get(b"Subtype").ok(), b"Widget") || dict.has(b"Rect")
}

fn entry<'a>(document: &'a PdfDocument, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|o| document.resolve(o).ok())
}

fn text_entry(document: &PdfDocument, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match entry(document, dict, key)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

fn integer_entry(document: &PdfDocument, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match entry(document, dict, key)? {
        Object::Integer(value) => Some(*value),
        _ => None,
    }
}

fn kind_entry(document: &PdfDocument, dict: &Dictionary) -> Option<FieldKind> {
    match entry(document, dict, b"FT")? {
        Object::Name(name) => Some(FieldKind::from_name(name)),
        _ => None,
    }
}

fn flags_entry(document: &PdfDocument, dict: &Dictionary) -> Option<FieldFlags> {
    FieldFlags::from_object(entry(document, dict, b"Ff"))
}

fn value_entry(document: &PdfDocument, dict: &Dictionary) -> Option<String> {
    match entry(document, dict, b"V")? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Object::String(bytes, _) => Some(decode_text_string(bytes)),
                    _ => None,
                })
                .collect();
            Some(parts.join(","))
        }
        _ => None,
    }
}
