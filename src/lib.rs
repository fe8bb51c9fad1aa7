//! # Field Patcher
//!
//! Declarative merging of one in-memory record into another of the same type.
//!
//! A [`Processor`] holds one update operation per field. Running it on a
//! target and a source overwrites the target fields whose source values are
//! eligible and differ, recurses into nested records through nested
//! processors and merges lists by element key. The returned
//! [`UpdateResult`] tree names every field and list element that changed;
//! a failure surfaces as an [`UpdateError`] carrying the path of the field
//! that failed.
//!
//! ## Modules
//!
//! - [`field`] - Field identifiers used as labels
//! - [`result`] - The update result tree
//! - [`error`] - Path-qualified update failures
//! - [`lens`] - Field bindings: accessors and mutators
//! - [`eligibility`] - Policies deciding whether a source value is considered
//! - [`operation`] - Single-value and keyed-list update operations
//! - [`processor`] - Processors and their registration surface
//! - [`document`] - Schema-driven processors for JSON/YAML documents

pub mod document;
pub mod eligibility;
pub mod error;
pub mod field;
pub mod lens;
pub mod operation;
pub mod processor;
pub mod result;

#[cfg(test)]
mod processor_test;

pub use document::{DocumentProcessor, MergeSchema, SchemaError};
pub use error::{BoxError, UpdateError};
pub use field::Field;
pub use lens::{ClearRequired, Lens};
pub use operation::{FieldUpdateOperation, ListUpdateOperation, OperationKind, UpdateOperation};
pub use processor::{Processor, ProcessorBuilder, SharedProcessor, UpdateProcessor};
pub use result::UpdateResult;
