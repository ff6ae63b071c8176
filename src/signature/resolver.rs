//! Parameter resolution
//!
//! Maps a (container, standard) pair to the backend able to produce the
//! signature and to a configuration builder pre-loaded with that backend's
//! defaults. The tables are closed: anything not listed is rejected.

use serde::Serialize;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::signature::parameters::{
    CounterSignatureFormat, FormatParameters, SignatureParametersBuilder,
};
use crate::types::{ContainerType, JwsSerializationType, SigDMechanism, SignatureForm};

/// Signing backend families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    Cades,
    Pades,
    Xades,
    Jades,
    AsicWithCades,
    AsicWithXades,
}

impl BackendKind {
    pub const ALL: [BackendKind; 6] = [
        BackendKind::Cades,
        BackendKind::Pades,
        BackendKind::Xades,
        BackendKind::Jades,
        BackendKind::AsicWithCades,
        BackendKind::AsicWithXades,
    ];
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendKind::Cades => "CAdES",
            BackendKind::Pades => "PAdES",
            BackendKind::Xades => "XAdES",
            BackendKind::Jades => "JAdES",
            BackendKind::AsicWithCades => "ASiC-with-CAdES",
            BackendKind::AsicWithXades => "ASiC-with-XAdES",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    pub backend: BackendKind,
    pub parameters: SignatureParametersBuilder,
}

/// Outcome of a counter-signature resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterResolution {
    pub backend: BackendKind,
    pub format: CounterSignatureFormat,
}

/// Selects backends and default configurations
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    pades_content_size: usize,
    jades_serialization: JwsSerializationType,
    jades_sig_d_mechanism: SigDMechanism,
    counter_serialization: JwsSerializationType,
}

impl Default for ParameterResolver {
    fn default() -> Self {
        Self::new(&ServiceConfig::default())
    }
}

impl ParameterResolver {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            pades_content_size: config.pades.content_size,
            jades_serialization: config.jades.serialization,
            jades_sig_d_mechanism: config.jades.sig_d_mechanism,
            counter_serialization: config.jades.counter_signature_serialization,
        }
    }

    /// Backend for `(container, form)`, without building any configuration
    pub fn backend_for(
        container: Option<ContainerType>,
        form: SignatureForm,
    ) -> Result<BackendKind> {
        match (container, form) {
            (None, SignatureForm::CAdES) => Ok(BackendKind::Cades),
            (None, SignatureForm::PAdES) => Ok(BackendKind::Pades),
            (None, SignatureForm::XAdES) => Ok(BackendKind::Xades),
            (None, SignatureForm::JAdES) => Ok(BackendKind::Jades),
            (Some(_), SignatureForm::CAdES) => Ok(BackendKind::AsicWithCades),
            (Some(_), SignatureForm::XAdES) => Ok(BackendKind::AsicWithXades),
            (Some(_), SignatureForm::PAdES) | (Some(_), SignatureForm::JAdES) => {
                Err(Error::unsupported(form, container))
            }
        }
    }

    /// Resolves a signature request to its backend and an empty builder
    pub fn resolve(
        &self,
        container: Option<ContainerType>,
        form: SignatureForm,
    ) -> Result<Resolution> {
        let backend = Self::backend_for(container, form)?;
        let format = match (backend, container) {
            (BackendKind::Cades, _) => FormatParameters::Cades,
            (BackendKind::Pades, _) => FormatParameters::Pades {
                content_size: self.pades_content_size,
                image: None,
            },
            (BackendKind::Xades, _) => FormatParameters::Xades,
            (BackendKind::Jades, _) => FormatParameters::Jades {
                serialization: self.jades_serialization,
                sig_d_mechanism: self.jades_sig_d_mechanism,
            },
            (BackendKind::AsicWithCades, Some(container)) => {
                FormatParameters::AsicWithCades { container }
            }
            (BackendKind::AsicWithXades, Some(container)) => {
                FormatParameters::AsicWithXades { container }
            }
            (_, None) => return Err(Error::unsupported(form, container)),
        };

        Ok(Resolution {
            backend,
            parameters: SignatureParametersBuilder::new(format),
        })
    }

    /// Resolves a counter-signature request.
    ///
    /// `is_archive_wrapped` tells whether the signature to counter-sign
    /// lives inside an ASiC container. PAdES signatures cannot be
    /// counter-signed, nor can JAdES ones inside a container.
    pub fn resolve_counter(
        &self,
        is_archive_wrapped: bool,
        form: SignatureForm,
    ) -> Result<CounterResolution> {
        let resolved = match (is_archive_wrapped, form) {
            (true, SignatureForm::CAdES) => {
                (BackendKind::AsicWithCades, CounterSignatureFormat::Cades)
            }
            (true, SignatureForm::XAdES) => {
                (BackendKind::AsicWithXades, CounterSignatureFormat::Xades)
            }
            (false, SignatureForm::CAdES) => (BackendKind::Cades, CounterSignatureFormat::Cades),
            (false, SignatureForm::XAdES) => (BackendKind::Xades, CounterSignatureFormat::Xades),
            (false, SignatureForm::JAdES) => (
                BackendKind::Jades,
                CounterSignatureFormat::Jades {
                    serialization: self.counter_serialization,
                },
            ),
            _ => return Err(Error::unsupported_with(form, None, "counter signature")),
        };

        Ok(CounterResolution {
            backend: resolved.0,
            format: resolved.1,
        })
    }
}
