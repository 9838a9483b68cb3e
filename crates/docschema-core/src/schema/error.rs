//! Compilation errors.

use thiserror::Error;

/// A description that violates compiler assumptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at '{path}')")]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// Dotted path of the offending field.
    pub path: String,
    /// Error kind for programmatic handling.
    pub kind: CompileErrorKind,
}

/// Kinds of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Reference with an empty target collection.
    EmptyReferenceTarget,
    /// Property with an empty name.
    EmptyFieldName,
    /// Attribute or constraint that would overwrite compiler output.
    ReservedOption,
    /// Reference used as an array element.
    NestedReference,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, path: impl Into<String>, kind: CompileErrorKind) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            kind,
        }
    }

    pub fn empty_reference_target(path: &str) -> Self {
        Self::new(
            "reference has an empty target collection",
            path,
            CompileErrorKind::EmptyReferenceTarget,
        )
    }

    pub fn empty_field_name(path: &str) -> Self {
        Self::new(
            "property name is empty",
            path,
            CompileErrorKind::EmptyFieldName,
        )
    }

    pub fn reserved_option(option: &str, path: &str) -> Self {
        Self::new(
            format!("option '{}' is reserved by the compiler", option),
            path,
            CompileErrorKind::ReservedOption,
        )
    }

    pub fn nested_reference(path: &str) -> Self {
        Self::new(
            "reference used as an array element; use a reference array instead",
            path,
            CompileErrorKind::NestedReference,
        )
    }
}
