#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use docsign::backend::{BackendResult, SignatureBackend, TspSource};
use docsign::error::BackendError;
use docsign::layout::FieldPlacement;
use docsign::signature::{CounterSignatureParameters, SignatureParameters, TimestampParameters};
use docsign::types::{DigestAlgorithm, DssDocument, SignatureValue, TimestampToken, ToBeSigned};
use docsign::PdfDocument;
use lopdf::{dictionary, Document, Object, ObjectId};
use tokio::sync::Mutex;

pub fn get_test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

pub struct TestFixtures;

impl TestFixtures {
    pub fn signer_pem() -> Vec<u8> {
        std::fs::read(get_test_data_dir().join("signer.pem")).unwrap()
    }

    /// Inside the validity period of the test certificate
    pub fn signing_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 15, 10, 30, 0).unwrap()
    }

    /// Letter pages, the last one carrying `widgets` widget annotations
    pub fn pdf_with_widgets(pages: usize, widgets: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();

        for index in 0..pages {
            let page_id = doc.new_object_id();
            let annots: Vec<Object> = if index + 1 == pages {
                (0..widgets)
                    .map(|i| {
                        Object::Reference(doc.add_object(widget(page_id, 20 + 60 * i as i64)))
                    })
                    .collect()
            } else {
                Vec::new()
            };
            doc.objects.insert(
                page_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => numbers(&[0, 0, 612, 792]),
                    "Annots" => annots,
                }),
            );
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(pages as i64),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        save(&mut doc)
    }

    /// Registration form: `full_name`, `email`, `address.street`,
    /// `address.country` (combo box), `newsletter` (checkbox) and
    /// `signer` (signature field)
    pub fn registration_form() -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        let address_id = doc.new_object_id();

        let helv_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let full_name = doc.add_object(text_widget(page_id, "full_name", 700, None));
        let email = doc.add_object(text_widget(page_id, "email", 660, None));
        let street = doc.add_object(text_widget(page_id, "street", 620, Some(address_id)));
        let country = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Ch",
            "Ff" => Object::Integer(1 << 17),
            "T" => Object::string_literal("country"),
            "Parent" => address_id,
            "Opt" => vec![Object::string_literal("FR"), Object::string_literal("AR")],
            "Rect" => numbers(&[50, 580, 250, 600]),
            "P" => page_id,
            "MK" => dictionary! { "BC" => numbers(&[0, 0, 0]) },
        });
        doc.objects.insert(
            address_id,
            Object::Dictionary(dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal("address"),
                "Kids" => vec![Object::Reference(street), Object::Reference(country)],
            }),
        );

        let on = doc.add_object(lopdf::Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => numbers(&[0, 0, 12, 12]) },
            b"0 g 2 2 8 8 re f".to_vec(),
        ));
        let off = doc.add_object(lopdf::Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => numbers(&[0, 0, 12, 12]) },
            Vec::new(),
        ));
        let newsletter = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::string_literal("newsletter"),
            "V" => "Off",
            "AS" => "Off",
            "Rect" => numbers(&[50, 540, 62, 552]),
            "P" => page_id,
            "AP" => dictionary! { "N" => dictionary! { "On" => on, "Off" => off } },
            "MK" => dictionary! { "BC" => numbers(&[0, 0, 0]) },
        });
        let signer = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Sig",
            "T" => Object::string_literal("signer"),
            "Rect" => numbers(&[300, 100, 470, 150]),
            "P" => page_id,
            "F" => Object::Integer(4),
            "BS" => dictionary! { "W" => Object::Integer(1) },
        });

        let annots: Vec<Object> = [full_name, email, street, country, newsletter, signer]
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

        let fields: Vec<Object> = [full_name, email, address_id, newsletter, signer]
            .iter()
            .map(|id| Object::Reference(*id))
            .collect();
        let acro_form = doc.add_object(dictionary! {
            "Fields" => fields,
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            "DR" => dictionary! { "Font" => dictionary! { "Helv" => helv_id } },
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => acro_form,
        });
        doc.trailer.set("Root", catalog_id);
        save(&mut doc)
    }

    /// Registration form plus a `comments` field whose only widget is missing
    pub fn registration_form_with_broken_field() -> Vec<u8> {
        let mut document = PdfDocument::load(&Self::registration_form()).unwrap();
        let broken = document.inner_mut().add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("comments"),
            "Kids" => vec![Object::Reference((999, 0))],
        });
        let acro_form = document
            .catalog()
            .unwrap()
            .get(b"AcroForm")
            .and_then(Object::as_reference)
            .unwrap();
        if let Ok(Object::Array(fields)) = document.dictionary_mut(acro_form).unwrap().get_mut(b"Fields") {
            fields.push(Object::Reference(broken));
        }
        document.save().unwrap()
    }

    /// Adds a widget annotation at `placement` to its page
    pub fn add_widget(document: &mut PdfDocument, placement: &FieldPlacement) {
        let page_id = document.page_id(placement.page).unwrap();
        let height = document.page_size(placement.page).unwrap().height;
        let x = placement.origin_x as i64;
        let top = height as i64 - placement.origin_y as i64;
        let widget_id = document.inner_mut().add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Sig",
            "Rect" => numbers(&[x, top - placement.height as i64, x + placement.width as i64, top]),
            "P" => page_id,
        });

        let page = document.dictionary_mut(page_id).unwrap();
        if !matches!(page.get(b"Annots"), Ok(Object::Array(_))) {
            page.set("Annots", Vec::<Object>::new());
        }
        if let Ok(Object::Array(annots)) = page.get_mut(b"Annots") {
            annots.push(Object::Reference(widget_id));
        }
    }
}

fn numbers(values: &[i64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Integer(*v)).collect())
}

fn widget(page_id: ObjectId, y: i64) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => numbers(&[20, y, 190, y + 50]),
        "P" => page_id,
    }
}

fn text_widget(page_id: ObjectId, name: &str, y: i64, parent: Option<ObjectId>) -> lopdf::Dictionary {
    let mut dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "T" => Object::string_literal(name),
        "Rect" => numbers(&[50, y, 250, y + 20]),
        "P" => page_id,
        "BS" => dictionary! { "W" => Object::Integer(1), "S" => "B" },
        "MK" => dictionary! { "BC" => numbers(&[0, 0, 0]), "BG" => numbers(&[1, 1, 1]) },
    };
    match parent {
        Some(parent) => dict.set("Parent", parent),
        None => dict.set("FT", "Tx"),
    }
    dict
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Timestamp source answering with the digest it was given
#[derive(Default)]
pub struct FakeTsp {
    pub issued: AtomicUsize,
}

#[async_trait]
impl TspSource for FakeTsp {
    async fn issue(
        &self,
        _algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> BackendResult<TimestampToken> {
        self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(TimestampToken {
            bytes: digest.to_vec(),
            generation_time: Some(TestFixtures::signing_date()),
        })
    }
}

impl FakeTsp {
    pub fn count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

/// One backend call as seen by [`RecordingBackend`]
#[derive(Debug, Clone)]
pub struct Recorded {
    pub operation: &'static str,
    pub documents: Vec<DssDocument>,
    pub parameters: Option<SignatureParameters>,
    pub timestamp: Option<TimestampParameters>,
    pub counter: Option<CounterSignatureParameters>,
}

impl Recorded {
    fn new(operation: &'static str, documents: Vec<DssDocument>) -> Self {
        Self {
            operation,
            documents,
            parameters: None,
            timestamp: None,
            counter: None,
        }
    }
}

/// Backend keeping every call for later inspection
#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Mutex<Vec<Recorded>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn last(&self) -> Recorded {
        self.calls.lock().await.last().cloned().unwrap()
    }

    pub async fn count(&self) -> usize {
        self.calls.lock().await.len()
    }

    async fn record(&self, call: Recorded) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl SignatureBackend for RecordingBackend {
    async fn get_data_to_sign(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
    ) -> BackendResult<ToBeSigned> {
        let mut call = Recorded::new("get_data_to_sign", vec![document.clone()]);
        call.parameters = Some(parameters.clone());
        self.record(call).await;

        let mut bytes = document.bytes.clone();
        bytes.extend_from_slice(parameters.level().to_string().as_bytes());
        Ok(ToBeSigned::new(bytes))
    }

    async fn sign_document(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
        signature: &SignatureValue,
        _tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        let mut call = Recorded::new("sign_document", vec![document.clone()]);
        call.parameters = Some(parameters.clone());
        self.record(call).await;

        let mut bytes = document.bytes.clone();
        bytes.extend_from_slice(&signature.value);
        Ok(DssDocument::named("signed", bytes))
    }

    async fn extend_document(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
        _tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        let mut call = Recorded::new("extend_document", vec![document.clone()]);
        call.parameters = Some(parameters.clone());
        self.record(call).await;
        Ok(document.clone())
    }

    async fn get_content_timestamp(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
        tsp: &dyn TspSource,
    ) -> BackendResult<TimestampToken> {
        let mut call = Recorded::new("get_content_timestamp", vec![document.clone()]);
        call.parameters = Some(parameters.clone());
        self.record(call).await;

        let digest = docsign::types::Digest::compute(parameters.digest_algorithm(), &document.bytes);
        tsp.issue(digest.algorithm, &digest.value).await
    }

    async fn timestamp(
        &self,
        documents: &[DssDocument],
        parameters: &TimestampParameters,
        tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        let mut call = Recorded::new("timestamp", documents.to_vec());
        call.timestamp = Some(*parameters);
        self.record(call).await;

        let token = tsp.issue(parameters.digest_algorithm, b"content").await?;
        Ok(DssDocument::named("timestamped", token.bytes))
    }

    async fn get_data_to_be_counter_signed(
        &self,
        signed_document: &DssDocument,
        parameters: &CounterSignatureParameters,
    ) -> BackendResult<ToBeSigned> {
        let mut call = Recorded::new("get_data_to_be_counter_signed", vec![signed_document.clone()]);
        call.counter = Some(parameters.clone());
        self.record(call).await;
        Ok(ToBeSigned::new(parameters.signature_id.as_bytes().to_vec()))
    }

    async fn counter_sign_signature(
        &self,
        signed_document: &DssDocument,
        parameters: &CounterSignatureParameters,
        signature: &SignatureValue,
        _tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        let mut call = Recorded::new("counter_sign_signature", vec![signed_document.clone()]);
        call.counter = Some(parameters.clone());
        self.record(call).await;

        let mut bytes = signed_document.bytes.clone();
        bytes.extend_from_slice(&signature.value);
        Ok(DssDocument::named("counter-signed", bytes))
    }
}

/// Backend rejecting everything with a detailed message
pub struct RejectingBackend;

#[async_trait]
impl SignatureBackend for RejectingBackend {
    async fn get_data_to_sign(
        &self,
        _: &DssDocument,
        _: &SignatureParameters,
    ) -> BackendResult<ToBeSigned> {
        Err(BackendError::Rejected("key handle 0xDEAD refused".into()))
    }

    async fn sign_document(
        &self,
        _: &DssDocument,
        _: &SignatureParameters,
        _: &SignatureValue,
        _: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        Err(BackendError::Rejected("key handle 0xDEAD refused".into()))
    }

    async fn extend_document(
        &self,
        _: &DssDocument,
        _: &SignatureParameters,
        _: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        Err(BackendError::Timestamp("tsa unreachable".into()))
    }

    async fn get_content_timestamp(
        &self,
        _: &DssDocument,
        _: &SignatureParameters,
        _: &dyn TspSource,
    ) -> BackendResult<TimestampToken> {
        Err(BackendError::Timestamp("tsa unreachable".into()))
    }
}
