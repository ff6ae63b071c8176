//! Field (`/Ff`) and annotation (`/F`) flag sets

use bitflags::bitflags;
use lopdf::{Dictionary, Object};

bitflags! {
    /// Field flags, common and type specific bits in one set
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u32 {
        const READ_ONLY = 1 << 0;
        const REQUIRED = 1 << 1;
        const NO_EXPORT = 1 << 2;
        /// Tx: several lines of text
        const MULTILINE = 1 << 12;
        const PASSWORD = 1 << 13;
        /// Btn: radio group
        const RADIO = 1 << 15;
        /// Btn: push button, keeps no value
        const PUSHBUTTON = 1 << 16;
        /// Ch: combo box rather than list box
        const COMBO = 1 << 17;
        const COMB = 1 << 24;
    }
}

bitflags! {
    /// Annotation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AnnotationFlags: u32 {
        const INVISIBLE = 1 << 0;
        const HIDDEN = 1 << 1;
        const PRINT = 1 << 2;
        const NO_ZOOM = 1 << 3;
        const NO_ROTATE = 1 << 4;
        const NO_VIEW = 1 << 5;
        const READ_ONLY = 1 << 6;
        const LOCKED = 1 << 7;
        const TOGGLE_NO_VIEW = 1 << 8;
        const LOCKED_CONTENTS = 1 << 9;
    }
}

impl FieldFlags {
    pub fn from_object(object: Option<&Object>) -> Option<Self> {
        match object {
            Some(Object::Integer(bits)) => Some(Self::from_bits_retain(*bits as u32)),
            _ => None,
        }
    }

    pub fn to_object(self) -> Object {
        Object::Integer(self.bits() as i64)
    }
}

impl AnnotationFlags {
    pub fn of(annotation: &Dictionary) -> Self {
        match annotation.get(b"F") {
            Ok(Object::Integer(bits)) => Self::from_bits_retain(*bits as u32),
            _ => Self::empty(),
        }
    }

    pub fn to_object(self) -> Object {
        Object::Integer(self.bits() as i64)
    }
}
