// Type definitions shared by the signing and form-filling modules

pub mod common;
pub mod document;

pub use common::*;
pub use document::*;
