//! External signing collaborators
//!
//! The cryptographic engines and the timestamp authority live outside this
//! crate. They are reached through the traits below and registered per
//! [`BackendKind`] in a [`SignatureBackends`] table.

use std::collections::HashMap;
use std::result::Result as StdResult;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BackendError, Error, Result};
use crate::signature::{
    BackendKind, CounterSignatureParameters, SignatureParameters, TimestampParameters,
};
use crate::types::{DigestAlgorithm, DssDocument, SignatureValue, TimestampToken, ToBeSigned};

pub type BackendResult<T> = StdResult<T, BackendError>;

/// Timestamp authority client
#[async_trait]
pub trait TspSource: Send + Sync {
    async fn issue(&self, algorithm: DigestAlgorithm, digest: &[u8])
        -> BackendResult<TimestampToken>;
}

/// One signature format engine
#[async_trait]
pub trait SignatureBackend: Send + Sync {
    async fn get_data_to_sign(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
    ) -> BackendResult<ToBeSigned>;

    async fn sign_document(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
        signature: &SignatureValue,
        tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument>;

    async fn extend_document(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
        tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument>;

    async fn get_content_timestamp(
        &self,
        document: &DssDocument,
        parameters: &SignatureParameters,
        tsp: &dyn TspSource,
    ) -> BackendResult<TimestampToken>;

    /// Timestamps the documents without signing them
    async fn timestamp(
        &self,
        documents: &[DssDocument],
        parameters: &TimestampParameters,
        tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        let _ = (documents, parameters, tsp);
        Err(BackendError::NotSupported("timestamp".into()))
    }

    async fn get_data_to_be_counter_signed(
        &self,
        signed_document: &DssDocument,
        parameters: &CounterSignatureParameters,
    ) -> BackendResult<ToBeSigned> {
        let _ = (signed_document, parameters);
        Err(BackendError::NotSupported("counter signature".into()))
    }

    async fn counter_sign_signature(
        &self,
        signed_document: &DssDocument,
        parameters: &CounterSignatureParameters,
        signature: &SignatureValue,
        tsp: &dyn TspSource,
    ) -> BackendResult<DssDocument> {
        let _ = (signed_document, parameters, signature, tsp);
        Err(BackendError::NotSupported("counter signature".into()))
    }
}

/// Registered backends, keyed by family
#[derive(Clone, Default)]
pub struct SignatureBackends {
    backends: HashMap<BackendKind, Arc<dyn SignatureBackend>>,
}

impl SignatureBackends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: BackendKind, backend: Arc<dyn SignatureBackend>) -> Self {
        self.backends.insert(kind, backend);
        self
    }

    pub fn get(&self, kind: BackendKind) -> Result<Arc<dyn SignatureBackend>> {
        self.backends
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::Config(format!("No signing backend registered for {}", kind)))
    }

    pub fn is_registered(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }
}

impl std::fmt::Debug for SignatureBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.backends.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("SignatureBackends")
            .field("registered", &kinds)
            .finish()
    }
}
