//! Type descriptions and their compilation into storage fields.
//!
//! Descriptions are authored with the [`vocab`] constructors and compiled by
//! [`compile`] into [`StorageFields`], the definition consumed by the storage
//! engine.

mod compiler;
mod error;
mod field;
mod node;

pub mod vocab;

pub use compiler::{compile, Compiler, KEY_MATCH_OPTION};
pub use error::{CompileError, CompileErrorKind};
pub use field::{StorageField, StorageFields, StorageType};
pub use node::{
    Annotated, ArrayNode, DictionaryNode, Meta, ObjectNode, Options, ReferenceNode, ScalarKind,
    ScalarNode, TypeNode,
};
