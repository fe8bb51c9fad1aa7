//! Update operations - the per-field units of work a processor runs.
//!
//! Two variants exist: [`FieldUpdateOperation`] overwrites or recursively
//! merges a single value, [`ListUpdateOperation`] merges a list by element
//! key.

mod field;
mod list;

pub use field::*;
pub use list::*;

use crate::error::UpdateError;
use crate::field::Field;
use crate::result::UpdateResult;
use std::fmt;

/// Eligibility test applied to the source value of a field.
pub type Condition<R> = Box<dyn Fn(Option<&R>) -> bool + Send + Sync>;

/// OperationKind tells the operation variants apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A single value, overwritten or merged recursively.
    Field,
    /// A list merged by element key.
    List,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Field => write!(f, "field"),
            OperationKind::List => write!(f, "list"),
        }
    }
}

/// UpdateOperation merges one field of `T` from a source into a target.
pub trait UpdateOperation<T>: Send + Sync {
    /// Returns the field this operation owns.
    fn field(&self) -> &Field;

    /// Returns the variant of this operation.
    fn kind(&self) -> OperationKind;

    /// Merges the field of `source` into `target`.
    ///
    /// Returns `None` when the field was skipped, either because the source
    /// value is not eligible or because it equals the target value.
    fn execute(&self, target: &mut T, source: &T) -> Result<Option<UpdateResult>, UpdateError>;
}
