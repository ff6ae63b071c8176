mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use docsign::backend::SignatureBackends;
use docsign::config::ServiceConfig;
use docsign::requests::{
    CounterSignatureRequest, ExtensionRequest, SignatureDocumentRequest, TimestampRequest,
    VisualSignatureRequest,
};
use docsign::signature::{
    BackendKind, CounterSignatureFormat, FormatParameters, SignatureFieldParameters, TimestampKind,
};
use docsign::types::{
    ContainerType, DigestAlgorithm, DssDocument, JwsSerializationType, SignatureForm,
    SignatureLevel, SignaturePackaging,
};
use docsign::{Error, PdfDocument, SigningService};
use fixtures::{FakeTsp, RecordingBackend, RejectingBackend, TestFixtures};

struct Harness {
    service: SigningService,
    backends: HashMap<BackendKind, Arc<RecordingBackend>>,
    tsp: Arc<FakeTsp>,
}

impl Harness {
    fn new() -> Self {
        let tsp = Arc::new(FakeTsp::default());
        let mut registry = SignatureBackends::new();
        let mut backends = HashMap::new();
        for kind in BackendKind::ALL {
            let backend = RecordingBackend::new();
            registry = registry.register(kind, backend.clone());
            backends.insert(kind, backend);
        }
        let service = SigningService::new(ServiceConfig::default(), registry, tsp.clone()).unwrap();
        Self {
            service,
            backends,
            tsp,
        }
    }

    fn backend(&self, kind: BackendKind) -> &RecordingBackend {
        &self.backends[&kind]
    }

    async fn total_calls(&self) -> usize {
        let mut total = 0;
        for backend in self.backends.values() {
            total += backend.count().await;
        }
        total
    }
}

fn signature_request(
    document: Vec<u8>,
    form: SignatureForm,
    packaging: SignaturePackaging,
    level: SignatureLevel,
) -> SignatureDocumentRequest {
    let mut request = SignatureDocumentRequest::new(
        DssDocument::named("contract", document),
        form,
        packaging,
        level,
    );
    request.signing_certificate = Some(TestFixtures::signer_pem());
    request.signing_date = TestFixtures::signing_date();
    request
}

fn cades_request() -> SignatureDocumentRequest {
    signature_request(
        b"hello".to_vec(),
        SignatureForm::CAdES,
        SignaturePackaging::Enveloping,
        SignatureLevel::CAdES_BASELINE_B,
    )
}

fn pades_request(document: Vec<u8>) -> SignatureDocumentRequest {
    let mut request = signature_request(
        document,
        SignatureForm::PAdES,
        SignaturePackaging::Enveloped,
        SignatureLevel::PAdES_BASELINE_B,
    );
    request.visual_signature = Some(VisualSignatureRequest::default());
    request
}

fn counter_request(form: SignatureForm, level: SignatureLevel) -> CounterSignatureRequest {
    CounterSignatureRequest {
        signed_document: DssDocument::named("signed", b"signed content".to_vec()),
        signature_form: form,
        container_type: None,
        signature_id_to_counter_sign: "id-7f3a".to_string(),
        signature_level: level,
        digest_algorithm: DigestAlgorithm::SHA256,
        encryption_algorithm: None,
        signing_certificate: Some(TestFixtures::signer_pem()),
        certificate_chain: Vec::new(),
        signing_date: TestFixtures::signing_date(),
        claimed_signer_roles: vec!["Witness".to_string()],
        signature_value: None,
    }
}

#[tokio::test]
async fn test_cades_data_to_sign() {
    let harness = Harness::new();
    let data = harness
        .service
        .get_data_to_sign(&cades_request())
        .await
        .unwrap();
    assert_eq!(data.bytes, b"helloCAdES-BASELINE-B".to_vec());

    let call = harness.backend(BackendKind::Cades).last().await;
    assert_eq!(call.operation, "get_data_to_sign");
    let parameters = call.parameters.unwrap();
    assert_eq!(parameters.format(), &FormatParameters::Cades);
    assert_eq!(parameters.packaging(), Some(SignaturePackaging::Enveloping));
    assert_eq!(parameters.b_level().signing_date, TestFixtures::signing_date());
    assert_eq!(
        parameters.signing_certificate().unwrap().signer_name(),
        "Jane Signer"
    );

    let timestamps = parameters.timestamps().unwrap();
    assert!(timestamps.is_shared());
    assert_eq!(timestamps.content.kind, TimestampKind::Cades);
    assert_eq!(harness.total_calls().await, 1);
}

#[tokio::test]
async fn test_xades_in_extended_container() {
    let harness = Harness::new();
    let mut request = signature_request(
        b"<doc/>".to_vec(),
        SignatureForm::XAdES,
        SignaturePackaging::Detached,
        SignatureLevel::XAdES_BASELINE_T,
    );
    request.container_type = Some(ContainerType::AsicE);

    harness.service.get_data_to_sign(&request).await.unwrap();

    let parameters = harness
        .backend(BackendKind::AsicWithXades)
        .last()
        .await
        .parameters
        .unwrap();
    assert_eq!(
        parameters.format(),
        &FormatParameters::AsicWithXades {
            container: ContainerType::AsicE
        }
    );
    assert_eq!(
        parameters.timestamps().unwrap().signature.kind,
        TimestampKind::Xades
    );
}

#[tokio::test]
async fn test_pades_in_container_is_rejected_before_any_backend_call() {
    let harness = Harness::new();
    let mut request = pades_request(TestFixtures::pdf_with_widgets(1, 0));
    request.visual_signature = None;
    request.container_type = Some(ContainerType::AsicS);

    let result = harness.service.get_data_to_sign(&request).await;
    assert!(matches!(result, Err(Error::UnsupportedCombination { .. })));
    assert_eq!(harness.total_calls().await, 0);
}

#[tokio::test]
async fn test_level_of_another_standard_is_rejected() {
    let harness = Harness::new();
    let mut request = cades_request();
    request.signature_level = SignatureLevel::XAdES_BASELINE_B;

    let result = harness.service.get_data_to_sign(&request).await;
    assert!(matches!(result, Err(Error::UnsupportedCombination { .. })));
}

#[tokio::test]
async fn test_visible_signature_gets_its_own_page() {
    let harness = Harness::new();
    let request = pades_request(TestFixtures::pdf_with_widgets(1, 0));

    harness.service.get_data_to_sign(&request).await.unwrap();

    let call = harness.backend(BackendKind::Pades).last().await;
    let signed = PdfDocument::load(&call.documents[0].bytes).unwrap();
    assert_eq!(signed.page_count(), 2);
    assert_eq!(call.documents[0].name.as_deref(), Some("contract"));

    let parameters = call.parameters.unwrap();
    let image = parameters.image().unwrap();
    assert_eq!(
        image.field,
        SignatureFieldParameters {
            field_id: None,
            page: 2,
            origin_x: 20.0,
            origin_y: 20.0,
            width: 170.0,
            height: 50.0,
        }
    );
    assert_eq!(
        image.text.as_ref().unwrap().text,
        "Signed by: Jane Signer\nDate: 2030-01-15 10:30:00 UTC"
    );
}

#[tokio::test]
async fn test_visible_signature_next_to_existing_ones() {
    let harness = Harness::new();
    let pdf = TestFixtures::pdf_with_widgets(1, 2);
    let mut request = pades_request(pdf.clone());
    request.visual_signature = Some(VisualSignatureRequest {
        text: Some("Approved".to_string()),
        ..VisualSignatureRequest::default()
    });

    harness.service.get_data_to_sign(&request).await.unwrap();

    let call = harness.backend(BackendKind::Pades).last().await;
    assert_eq!(call.documents[0].bytes, pdf);
    let parameters = call.parameters.unwrap();
    let image = parameters.image().unwrap();
    assert_eq!(
        (image.field.page, image.field.origin_x, image.field.origin_y),
        (1, 400.0, 20.0)
    );
    assert_eq!(image.text.as_ref().unwrap().text, "Approved");
}

#[tokio::test]
async fn test_explicit_field_is_kept() {
    let harness = Harness::new();
    let pdf = TestFixtures::pdf_with_widgets(1, 0);
    let field = SignatureFieldParameters {
        field_id: Some("Signature1".to_string()),
        page: 1,
        origin_x: 300.0,
        origin_y: 600.0,
        width: 120.0,
        height: 40.0,
    };
    let mut request = pades_request(pdf.clone());
    request.visual_signature = Some(VisualSignatureRequest {
        field: Some(field.clone()),
        ..VisualSignatureRequest::default()
    });

    harness.service.get_data_to_sign(&request).await.unwrap();

    let call = harness.backend(BackendKind::Pades).last().await;
    assert_eq!(call.documents[0].bytes, pdf);
    assert_eq!(call.parameters.unwrap().image().unwrap().field, field);
}

#[tokio::test]
async fn test_visible_signature_requires_pades() {
    let harness = Harness::new();
    let mut request = cades_request();
    request.visual_signature = Some(VisualSignatureRequest::default());

    let result = harness.service.get_data_to_sign(&request).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_sign_requires_signature_value() {
    let harness = Harness::new();
    let result = harness.service.sign_document(&cades_request()).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(harness.total_calls().await, 0);
}

#[tokio::test]
async fn test_sign_document() {
    let harness = Harness::new();
    let mut request = cades_request();
    request.signature_value = Some(vec![0xAB, 0xCD]);

    let signed = harness.service.sign_document(&request).await.unwrap();
    assert_eq!(signed.bytes, b"hello\xAB\xCD".to_vec());
    assert_eq!(
        harness.backend(BackendKind::Cades).last().await.operation,
        "sign_document"
    );
}

#[tokio::test]
async fn test_preparation_is_deterministic() {
    let harness = Harness::new();
    let request = pades_request(TestFixtures::pdf_with_widgets(1, 0));

    let first = harness.service.prepare(&request).unwrap();
    let second = harness.service.prepare(&request).unwrap();
    assert_eq!(first.backend_kind, BackendKind::Pades);
    assert_eq!(first.document, second.document);
    assert_eq!(first.parameters, second.parameters);
}

#[tokio::test]
async fn test_expired_certificate() {
    let harness = Harness::new();
    let mut request = cades_request();
    request.signing_date = Utc.with_ymd_and_hms(2040, 6, 1, 0, 0, 0).unwrap();

    let result = harness.service.get_data_to_sign(&request).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    request.sign_with_expired_certificate = true;
    harness.service.get_data_to_sign(&request).await.unwrap();
    let parameters = harness
        .backend(BackendKind::Cades)
        .last()
        .await
        .parameters
        .unwrap();
    assert!(parameters.sign_with_expired_certificate());
}

#[tokio::test]
async fn test_backend_failure_is_wrapped() {
    let backends = SignatureBackends::new().register(BackendKind::Cades, Arc::new(RejectingBackend));
    let service =
        SigningService::new(ServiceConfig::default(), backends, Arc::new(FakeTsp::default()))
            .unwrap();

    let error = service
        .get_data_to_sign(&cades_request())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        Error::SigningBackend {
            operation: "get_data_to_sign",
            ..
        }
    ));
    assert!(!error.to_string().contains("0xDEAD"));
}

#[tokio::test]
async fn test_content_timestamp_uses_the_tsp() {
    let harness = Harness::new();
    let token = harness
        .service
        .get_content_timestamp(&cades_request())
        .await
        .unwrap();
    assert_eq!(harness.tsp.count(), 1);
    assert_eq!(token.bytes.len(), 32);
    assert_eq!(
        harness.backend(BackendKind::Cades).last().await.operation,
        "get_content_timestamp"
    );
}

#[tokio::test]
async fn test_extend_keeps_detached_contents() {
    let harness = Harness::new();
    let original = DssDocument::named("data.xml", b"<data/>".to_vec());
    let request = ExtensionRequest {
        signed_document: DssDocument::named("signature.xml", b"<sig/>".to_vec()),
        signature_form: SignatureForm::XAdES,
        container_type: None,
        signature_level: SignatureLevel::XAdES_BASELINE_LT,
        original_documents: vec![original.clone()],
    };

    let extended = harness.service.extend(&request).await.unwrap();
    assert_eq!(extended, request.signed_document);

    let call = harness.backend(BackendKind::Xades).last().await;
    assert_eq!(call.operation, "extend_document");
    let parameters = call.parameters.unwrap();
    assert_eq!(parameters.level(), SignatureLevel::XAdES_BASELINE_LT);
    assert_eq!(parameters.detached_contents(), &[original][..]);
}

#[tokio::test]
async fn test_timestamp_single_document() {
    let harness = Harness::new();
    let request = TimestampRequest {
        documents: vec![DssDocument::named("a.pdf", b"%PDF-a".to_vec())],
        container_type: None,
        digest_algorithm: DigestAlgorithm::SHA512,
    };

    harness.service.timestamp(&request).await.unwrap();

    let parameters = harness
        .backend(BackendKind::Pades)
        .last()
        .await
        .timestamp
        .unwrap();
    assert_eq!(parameters.kind, TimestampKind::Pades);
    assert_eq!(parameters.digest_algorithm, DigestAlgorithm::SHA512);
    assert_eq!(harness.tsp.count(), 1);
}

#[tokio::test]
async fn test_timestamp_several_documents_needs_a_container() {
    let harness = Harness::new();
    let mut request = TimestampRequest {
        documents: vec![
            DssDocument::named("a.txt", b"a".to_vec()),
            DssDocument::named("b.txt", b"b".to_vec()),
        ],
        container_type: None,
        digest_algorithm: DigestAlgorithm::SHA256,
    };

    let result = harness.service.timestamp(&request).await;
    assert!(matches!(result, Err(Error::TooManyDocuments(2))));

    request.container_type = Some(ContainerType::AsicE);
    harness.service.timestamp(&request).await.unwrap();

    let call = harness.backend(BackendKind::AsicWithCades).last().await;
    assert_eq!(call.documents.len(), 2);
    assert_eq!(
        call.timestamp.unwrap().kind,
        TimestampKind::AsicWithCades(ContainerType::AsicE)
    );
}

#[tokio::test]
async fn test_counter_signature_of_jades() {
    let harness = Harness::new();
    let mut request = counter_request(SignatureForm::JAdES, SignatureLevel::JAdES_BASELINE_B);

    let data = harness
        .service
        .get_data_to_be_counter_signed(&request)
        .await
        .unwrap();
    assert_eq!(data.bytes, b"id-7f3a".to_vec());

    let parameters = harness
        .backend(BackendKind::Jades)
        .last()
        .await
        .counter
        .unwrap();
    assert_eq!(
        parameters.format,
        CounterSignatureFormat::Jades {
            serialization: JwsSerializationType::FlattenedJsonSerialization
        }
    );
    assert_eq!(parameters.b_level.claimed_signer_roles, vec!["Witness"]);

    request.signature_value = Some(vec![1, 2, 3]);
    let signed = harness
        .service
        .counter_sign_signature(&request)
        .await
        .unwrap();
    assert!(signed.bytes.ends_with(&[1, 2, 3]));
}

#[tokio::test]
async fn test_counter_signature_routes_wrapped_cades() {
    let harness = Harness::new();
    let mut request = counter_request(SignatureForm::CAdES, SignatureLevel::CAdES_BASELINE_B);
    request.container_type = Some(ContainerType::AsicS);

    harness
        .service
        .get_data_to_be_counter_signed(&request)
        .await
        .unwrap();
    assert_eq!(
        harness.backend(BackendKind::AsicWithCades).count().await,
        1
    );
}

#[tokio::test]
async fn test_pades_cannot_be_counter_signed() {
    let harness = Harness::new();
    let request = counter_request(SignatureForm::PAdES, SignatureLevel::PAdES_BASELINE_B);

    let result = harness.service.get_data_to_be_counter_signed(&request).await;
    assert!(matches!(result, Err(Error::UnsupportedCombination { .. })));
    assert_eq!(harness.total_calls().await, 0);
}
