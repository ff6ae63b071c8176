//! In-memory AcroForm document shared by the form unit tests

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::forms::appearance::helvetica;

pub(crate) fn numbers(values: &[i64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Integer(*v)).collect())
}

fn text(value: &str) -> Object {
    Object::string_literal(value)
}

fn checkbox_state(document: &mut Document, content: &[u8]) -> ObjectId {
    document.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => numbers(&[0, 0, 20, 20]),
        },
        content.to_vec(),
    ))
}

/// One page holding: `name` (text, decorated), `applicant.city` and
/// `applicant.zip` (text under a required parent), `agree` (checkbox),
/// `signature` (signature field) and `notes` (multiline text, two widgets).
pub(crate) fn form_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let applicant_id = doc.new_object_id();
    let notes_id = doc.new_object_id();

    let helv_id = doc.add_object(helvetica());

    let name_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => text("name"),
        "Rect" => numbers(&[50, 700, 250, 720]),
        "P" => page_id,
        "F" => Object::Integer(2),
        "Border" => numbers(&[0, 0, 2]),
        "BS" => dictionary! { "W" => Object::Integer(2), "S" => "S" },
        "MK" => dictionary! {
            "BC" => numbers(&[0, 0, 1]),
            "BG" => numbers(&[1, 1, 0]),
        },
        "H" => "P",
        "CA" => Object::Real(0.5 as _),
        "Q" => Object::Integer(1),
    });

    let city_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "T" => text("city"),
        "Parent" => applicant_id,
        "V" => text("Lyon"),
        "Rect" => numbers(&[50, 650, 250, 670]),
        "P" => page_id,
    });
    let zip_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "T" => text("zip"),
        "Parent" => applicant_id,
        "Rect" => numbers(&[300, 650, 400, 670]),
        "P" => page_id,
        "DA" => text("/Helv 9 Tf 1 0 0 rg"),
    });
    doc.objects.insert(
        applicant_id,
        Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "T" => text("applicant"),
            "Ff" => Object::Integer(2),
            "Kids" => vec![Object::Reference(city_id), Object::Reference(zip_id)],
        }),
    );

    let on_id = checkbox_state(&mut doc, b"0 g 4 4 12 12 re f");
    let off_id = checkbox_state(&mut doc, b"");
    let agree_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => text("agree"),
        "V" => "Off",
        "AS" => "Off",
        "Rect" => numbers(&[50, 600, 70, 620]),
        "P" => page_id,
        "AP" => dictionary! {
            "N" => dictionary! { "Yes" => on_id, "Off" => off_id },
        },
    });

    let signature_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Sig",
        "T" => text("signature"),
        "Rect" => numbers(&[50, 500, 220, 550]),
        "P" => page_id,
        "F" => Object::Integer(4),
        "MK" => dictionary! { "BC" => numbers(&[0, 0, 0]) },
    });

    let first_note = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Parent" => notes_id,
        "Rect" => numbers(&[50, 400, 300, 450]),
        "P" => page_id,
        "MK" => dictionary! { "BG" => numbers(&[1, 1, 1]) },
    });
    let second_note = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Parent" => notes_id,
        "Rect" => numbers(&[50, 300, 300, 350]),
        "P" => page_id,
    });
    doc.objects.insert(
        notes_id,
        Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "T" => text("notes"),
            "V" => text("draft"),
            "Ff" => Object::Integer(1 << 12),
            "Kids" => vec![Object::Reference(first_note), Object::Reference(second_note)],
        }),
    );

    let annots: Vec<Object> = [
        name_id,
        city_id,
        zip_id,
        agree_id,
        signature_id,
        first_note,
        second_note,
    ]
    .iter()
    .map(|id| Object::Reference(*id))
    .collect();

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => numbers(&[0, 0, 612, 792]),
            "Annots" => annots,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );

    let fields: Vec<Object> = [name_id, applicant_id, agree_id, signature_id, notes_id]
        .iter()
        .map(|id| Object::Reference(*id))
        .collect();
    let acro_form_id = doc.add_object(dictionary! {
        "Fields" => fields,
        "DA" => text("/Helv 0 Tf 0 g"),
        "DR" => dictionary! {
            "Font" => dictionary! { "Helv" => helv_id },
        },
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acro_form_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
