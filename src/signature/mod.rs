//! Signature parameter resolution and assembly

pub mod image;
pub mod parameters;
pub mod resolver;
pub mod timestamp;

pub use image::{
    FontSpec, SignatureFieldParameters, SignatureImageParameters, SignatureImageTextParameters,
};
pub use parameters::{
    BLevelParameters, CounterSignatureFormat, CounterSignatureParameters, FormatParameters,
    SignaturePolicy, SignatureParameters, SignatureParametersBuilder, SignerLocation,
};
pub use resolver::{BackendKind, CounterResolution, ParameterResolver, Resolution};
pub use timestamp::{TimestampKind, TimestampParameters, TimestampRoles};
