//! Single-value update operation.

use super::{Condition, OperationKind, UpdateOperation};
use crate::error::UpdateError;
use crate::field::Field;
use crate::lens::Lens;
use crate::processor::SharedProcessor;
use crate::result::UpdateResult;
use tracing::trace;

/// FieldUpdateOperation overwrites a field with the source value, or merges
/// it with a nested processor when both sides hold a value.
pub struct FieldUpdateOperation<T, R> {
    field: Field,
    lens: Lens<T, R>,
    condition: Condition<R>,
    processor: Option<SharedProcessor<R>>,
}

impl<T, R> FieldUpdateOperation<T, R> {
    /// Creates a new FieldUpdateOperation.
    pub fn new(
        field: Field,
        lens: Lens<T, R>,
        condition: Condition<R>,
        processor: Option<SharedProcessor<R>>,
    ) -> Self {
        FieldUpdateOperation {
            field,
            lens,
            condition,
            processor,
        }
    }

    /// Returns the binding to the field.
    pub fn lens(&self) -> &Lens<T, R> {
        &self.lens
    }

    /// Applies the eligibility test to a source value.
    pub fn is_eligible(&self, value: Option<&R>) -> bool {
        (self.condition)(value)
    }

    /// Returns the nested processor, if any.
    pub fn processor(&self) -> Option<&SharedProcessor<R>> {
        self.processor.as_ref()
    }
}

impl<T, R> FieldUpdateOperation<T, R>
where
    R: PartialEq + Clone,
{
    fn apply(&self, target: &mut T, source: &T) -> Result<Option<UpdateResult>, UpdateError> {
        let value = self.lens.get(source);
        if !self.is_eligible(value) {
            return Ok(None);
        }
        if self.lens.get(target) == value {
            return Ok(None);
        }

        if let (Some(processor), Some(value)) = (&self.processor, value) {
            if let Some(current) = self.lens.get_mut(target) {
                trace!(field = %self.field, "merging nested value");
                let result = processor.execute(current, value)?;
                return Ok(Some(result.with_field(self.field.clone())));
            }
        }

        trace!(field = %self.field, "overwriting value");
        self.lens
            .set(target, value.cloned())
            .map_err(UpdateError::new)?;
        Ok(Some(UpdateResult::field(self.field.clone())))
    }
}

impl<T, R> UpdateOperation<T> for FieldUpdateOperation<T, R>
where
    R: PartialEq + Clone,
{
    fn field(&self) -> &Field {
        &self.field
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Field
    }

    fn execute(&self, target: &mut T, source: &T) -> Result<Option<UpdateResult>, UpdateError> {
        self.apply(target, source)
            .map_err(|err| err.within_field(self.field.name()))
    }
}
