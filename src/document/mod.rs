//! Document module - Processors for dynamic JSON/YAML documents.
//!
//! A [`MergeSchema`] declares named document types and, per field, whether
//! it is a plain value or a keyed list, its eligibility policy and the
//! named type its values (or list elements) are merged as. A
//! [`DocumentProcessor`] compiles the schema into one [`Processor`] per
//! type over [`serde_json::Value`].
//!
//! [`Processor`]: crate::processor::Processor

mod processor;
mod schema;


pub use processor::*;
pub use schema::*;
