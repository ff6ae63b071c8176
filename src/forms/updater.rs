//! Form field update engine
//!
//! Every terminal field goes through one of three transitions: signature
//! fields are skipped, fields missing from the update map stay untouched,
//! and the remaining fields get the new value, become read-only and lose
//! their editable chrome.

use std::collections::{BTreeMap, HashSet};

use lopdf::{dictionary, Dictionary, Object, ObjectId};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::forms::appearance::{self, DefaultAppearance, TextBox};
use crate::forms::fields::{collect_fields, FieldKind, FormField};
use crate::forms::flags::{AnnotationFlags, FieldFlags};
use crate::pdf_document::{encode_text_string, rect_from_object, PdfDocument};

const OFF_STATE: &[u8] = b"Off";

/// What happened to each field during an update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormUpdateReport {
    pub applied: Vec<String>,
    pub skipped_signatures: Vec<String>,
    pub untouched: usize,
    /// Map keys matching no field of the document
    pub unknown_keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FormUpdateOutcome {
    pub bytes: Vec<u8>,
    pub report: FormUpdateReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldAction<'v> {
    Skip,
    Untouched,
    Apply(&'v str),
}

fn action_for<'v>(field: &FormField, values: &'v BTreeMap<String, String>) -> FieldAction<'v> {
    if field.is_signature() {
        return FieldAction::Skip;
    }
    match values.get(&field.name) {
        Some(value) => FieldAction::Apply(value.as_str()),
        None => FieldAction::Untouched,
    }
}

/// Applies name to value maps to the form fields of a PDF
#[derive(Debug, Clone, Default)]
pub struct FormFieldUpdater;

impl FormFieldUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Fills and locks the fields named in `values`.
    ///
    /// When nothing is applied the input bytes are returned unchanged.
    #[instrument(skip(self, bytes, values), fields(values = values.len()))]
    pub fn update(
        &self,
        bytes: &[u8],
        values: &BTreeMap<String, String>,
    ) -> Result<FormUpdateOutcome> {
        if values.is_empty() {
            debug!("No field values, document left as is");
            return Ok(FormUpdateOutcome {
                bytes: bytes.to_vec(),
                report: FormUpdateReport::default(),
            });
        }

        let mut document = PdfDocument::load(bytes)?;
        let fields = collect_fields(&document)?;
        let mut report = FormUpdateReport::default();

        for field in &fields {
            match action_for(field, values) {
                FieldAction::Skip => {
                    debug!("Skipping signature field {}", field.name);
                    report.skipped_signatures.push(field.name.clone());
                }
                FieldAction::Untouched => report.untouched += 1,
                FieldAction::Apply(value) => {
                    apply(&mut document, field, value).map_err(|e| match e {
                        Error::FormUpdate { .. } => e,
                        other => Error::form_update(&field.name, other.to_string()),
                    })?;
                    debug!("Updated field {}", field.name);
                    report.applied.push(field.name.clone());
                }
            }
        }

        let known: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        report.unknown_keys = values
            .keys()
            .filter(|key| !known.contains(key.as_str()))
            .cloned()
            .collect();
        for key in &report.unknown_keys {
            warn!("No form field named '{}'", key);
        }

        if report.applied.is_empty() {
            info!("No field matched, document left as is");
            return Ok(FormUpdateOutcome {
                bytes: bytes.to_vec(),
                report,
            });
        }

        let bytes = document.save()?;
        info!(
            "Updated {} field(s), {} signature field(s) skipped",
            report.applied.len(),
            report.skipped_signatures.len()
        );
        Ok(FormUpdateOutcome { bytes, report })
    }
}

fn apply(document: &mut PdfDocument, field: &FormField, value: &str) -> Result<()> {
    match field.kind {
        FieldKind::Button => apply_button(document, field, value)?,
        FieldKind::Signature => return Err(Error::form_update(&field.name, "signature field")),
        FieldKind::Text | FieldKind::Choice | FieldKind::Unknown => {
            document
                .dictionary_mut(field.id)?
                .set("V", encode_text_string(value));
        }
    }

    let flags = field.flags | FieldFlags::READ_ONLY;
    document.dictionary_mut(field.id)?.set("Ff", flags.to_object());

    let resources = font_resources(document)?;
    for widget_id in &field.widgets {
        strip_chrome(document.dictionary_mut(*widget_id)?);
        if field.kind != FieldKind::Button {
            write_text_appearance(document, field, *widget_id, value, &resources)?;
        }
    }
    Ok(())
}

/// Canonical non-editable look: no border, no highlight, printable
fn strip_chrome(widget: &mut Dictionary) {
    let flags = AnnotationFlags::of(widget) | AnnotationFlags::PRINT;
    widget.set("F", flags.to_object());
    widget.set(
        "Border",
        vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
    );
    widget.set("H", Object::Name(b"N".to_vec()));
    widget.remove(b"BS");
    widget.remove(b"MK");
    widget.remove(b"CA");
}

fn write_text_appearance(
    document: &mut PdfDocument,
    field: &FormField,
    widget_id: ObjectId,
    value: &str,
    resources: &Dictionary,
) -> Result<()> {
    let widget = document.dictionary(widget_id)?;
    let rect = match widget.get(b"Rect").ok().and_then(rect_from_object) {
        Some(rect) => rect,
        None => {
            debug!("Widget {:?} of {} has no /Rect, no appearance", widget_id, field.name);
            return Ok(());
        }
    };
    let da = match widget.get(b"DA") {
        Ok(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
    .or_else(|| field.default_appearance.clone());
    let da = da.map(|da| DefaultAppearance::parse(&da)).unwrap_or_default();

    let text_box = TextBox {
        width: (rect[2] - rect[0]).abs(),
        height: (rect[3] - rect[1]).abs(),
        quadding: field.quadding,
        multiline: field.flags.contains(FieldFlags::MULTILINE),
    };
    let shown = if field.flags.contains(FieldFlags::PASSWORD) {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let mut resources = resources.clone();
    ensure_font(&mut resources, &da.font);
    let content = appearance::text_content(&shown, &da, &text_box);
    let stream = appearance::form_xobject(content, text_box.width, text_box.height, resources);
    let stream_id = document.inner_mut().add_object(stream);

    document
        .dictionary_mut(widget_id)?
        .set("AP", dictionary! { "N" => stream_id });
    Ok(())
}

/// Font resources from the form's `/DR`, copied so each stream is standalone
fn font_resources(document: &PdfDocument) -> Result<Dictionary> {
    let mut fonts = Dictionary::new();
    if let Some(acro_form) = document.acro_form()? {
        if let Ok(dr) = acro_form.get(b"DR") {
            if let Ok(Object::Dictionary(dr)) = document.resolve(dr) {
                if let Ok(font) = dr.get(b"Font") {
                    if let Ok(Object::Dictionary(font)) = document.resolve(font) {
                        fonts = font.clone();
                    }
                }
            }
        }
    }
    Ok(dictionary! { "Font" => fonts })
}

fn ensure_font(resources: &mut Dictionary, font: &str) {
    if let Ok(Object::Dictionary(fonts)) = resources.get_mut(b"Font") {
        if !fonts.has(font.as_bytes()) {
            fonts.set(font.as_bytes().to_vec(), appearance::helvetica());
        }
    }
}

fn apply_button(document: &mut PdfDocument, field: &FormField, value: &str) -> Result<()> {
    if field.flags.contains(FieldFlags::PUSHBUTTON) {
        return Ok(());
    }

    let wanted = value.trim();
    let off = is_off(wanted);

    if field.widgets.is_empty() {
        let state = if off { OFF_STATE.to_vec() } else { wanted.as_bytes().to_vec() };
        document.dictionary_mut(field.id)?.set("V", Object::Name(state));
        return Ok(());
    }

    let mut chosen: Option<Vec<u8>> = None;
    for widget_id in &field.widgets {
        let states = on_states(document, *widget_id)?;
        let state = if off {
            None
        } else if states.iter().any(|s| s.as_slice() == wanted.as_bytes()) {
            Some(wanted.as_bytes().to_vec())
        } else if !field.flags.contains(FieldFlags::RADIO) && is_on(wanted) {
            Some(states.into_iter().next().unwrap_or_else(|| b"Yes".to_vec()))
        } else {
            None
        };

        let widget = document.dictionary_mut(*widget_id)?;
        match state {
            Some(state) => {
                widget.set("AS", Object::Name(state.clone()));
                chosen = Some(state);
            }
            None => widget.set("AS", Object::Name(OFF_STATE.to_vec())),
        }
    }

    if !off && chosen.is_none() {
        return Err(Error::form_update(
            &field.name,
            format!("'{}' is not a state of this button", wanted),
        ));
    }
    document
        .dictionary_mut(field.id)?
        .set("V", Object::Name(chosen.unwrap_or_else(|| OFF_STATE.to_vec())));
    Ok(())
}

/// Appearance state names of a widget other than `Off`
fn on_states(document: &PdfDocument, widget_id: ObjectId) -> Result<Vec<Vec<u8>>> {
    let widget = document.dictionary(widget_id)?;
    let normal = widget
        .get(b"AP")
        .ok()
        .and_then(|ap| document.resolve(ap).ok())
        .and_then(|ap| ap.as_dict().ok())
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|n| document.resolve(n).ok());

    Ok(match normal {
        Some(Object::Dictionary(states)) => states
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| name.as_slice() != OFF_STATE)
            .collect(),
        _ => Vec::new(),
    })
}

fn is_off(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "off" | "false" | "no" | "0"
    )
}

fn is_on(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "on" | "true" | "yes" | "1" | "x" | "checked"
    )
}
