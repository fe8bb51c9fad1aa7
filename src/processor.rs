//! Processors - ordered sets of update operations for one record type.

use crate::eligibility;
use crate::error::UpdateError;
use crate::field::Field;
use crate::lens::Lens;
use crate::operation::{FieldUpdateOperation, ListUpdateOperation, UpdateOperation};
use crate::result::UpdateResult;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::{debug, warn};

/// UpdateProcessor merges a whole source value into a target value.
///
/// This is the contract a nested field or list element is merged with, and
/// the contract [`Processor`] itself satisfies, so processors nest to any
/// depth.
pub trait UpdateProcessor<T>: Send + Sync {
    /// Merges `source` into `target` in place and reports what changed.
    ///
    /// A failure aborts the merge; changes already applied to `target` stay
    /// applied.
    fn execute(&self, target: &mut T, source: &T) -> Result<UpdateResult, UpdateError>;

    /// Merges `source` into a copy of `target`, leaving `target` untouched.
    fn patched(&self, target: &T, source: &T) -> Result<(T, UpdateResult), UpdateError>
    where
        T: Clone,
    {
        let mut merged = target.clone();
        let result = self.execute(&mut merged, source)?;
        Ok((merged, result))
    }
}

/// Shared handle to a nested processor.
pub type SharedProcessor<R> = Arc<dyn UpdateProcessor<R>>;

impl<T, P> UpdateProcessor<T> for Arc<P>
where
    P: UpdateProcessor<T> + ?Sized,
{
    fn execute(&self, target: &mut T, source: &T) -> Result<UpdateResult, UpdateError> {
        (**self).execute(target, source)
    }
}

/// A weak handle lets a processor refer to itself, e.g. for a list whose
/// elements are of the record type being merged. Build it with
/// [`Arc::new_cyclic`].
impl<T, P> UpdateProcessor<T> for Weak<P>
where
    P: UpdateProcessor<T>,
{
    fn execute(&self, target: &mut T, source: &T) -> Result<UpdateResult, UpdateError> {
        match self.upgrade() {
            Some(processor) => processor.execute(target, source),
            None => {
                warn!("nested processor dropped before use");
                Err(UpdateError::new(ProcessorDropped))
            }
        }
    }
}

/// Raised when a weak processor handle outlives its processor.
#[derive(Debug, Clone, Copy, Error)]
#[error("nested processor is no longer available")]
pub struct ProcessorDropped;

/// Processor runs its operations in registration order against the same
/// target and source.
///
/// ```
/// use field_patcher::{Lens, Processor, UpdateProcessor};
///
/// #[derive(Clone)]
/// struct Pojo { name: Option<String>, tags: Option<Vec<String>> }
///
/// let processor = Processor::builder()
///     .map("name", Lens::optional(|p: &Pojo| &p.name, |p: &mut Pojo| &mut p.name))
///     .merge_list(
///         "tags",
///         Lens::optional(|p: &Pojo| &p.tags, |p: &mut Pojo| &mut p.tags),
///         |tag: &String| tag.clone(),
///     )
///     .build();
///
/// let mut target = Pojo { name: Some("a".into()), tags: Some(vec!["x".into()]) };
/// let source = Pojo { name: Some("b".into()), tags: Some(vec!["y".into()]) };
/// let result = processor.execute(&mut target, &source).unwrap();
/// assert_eq!(result.to_string(), "{name,tags{[1]}}");
/// ```
pub struct Processor<T> {
    operations: Vec<Box<dyn UpdateOperation<T>>>,
}

impl<T: 'static> Processor<T> {
    /// Creates a new ProcessorBuilder.
    pub fn builder() -> ProcessorBuilder<T> {
        ProcessorBuilder::new()
    }
}

impl<T> Processor<T> {
    /// Returns the registered operations in registration order.
    pub fn operations(&self) -> &[Box<dyn UpdateOperation<T>>] {
        &self.operations
    }

    /// Returns the number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if no operations are registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<T> UpdateProcessor<T> for Processor<T> {
    fn execute(&self, target: &mut T, source: &T) -> Result<UpdateResult, UpdateError> {
        let mut children = Vec::new();
        for operation in &self.operations {
            if let Some(result) = operation.execute(target, source)? {
                children.push(result);
            }
        }
        debug!(
            operations = self.operations.len(),
            updated = children.len(),
            "processor finished"
        );
        Ok(UpdateResult::with_children(children))
    }
}

/// ProcessorBuilder registers the operations of a [`Processor`].
///
/// Plain fields default to the [`eligibility::present`] policy, lists to
/// [`eligibility::non_empty`].
pub struct ProcessorBuilder<T> {
    operations: Vec<Box<dyn UpdateOperation<T>>>,
}

impl<T: 'static> Default for ProcessorBuilder<T> {
    fn default() -> Self {
        ProcessorBuilder::new()
    }
}

impl<T: 'static> ProcessorBuilder<T> {
    /// Creates a new, empty ProcessorBuilder.
    pub fn new() -> Self {
        ProcessorBuilder {
            operations: Vec::new(),
        }
    }

    /// Registers a custom operation.
    pub fn operation(mut self, operation: impl UpdateOperation<T> + 'static) -> Self {
        self.operations.push(Box::new(operation));
        self
    }

    /// Overwrites the field whenever the source value is present.
    pub fn map<R>(self, field: impl Into<Field>, lens: Lens<T, R>) -> Self
    where
        R: PartialEq + Clone + 'static,
    {
        self.map_if(field, lens, eligibility::present::<R>, None)
    }

    /// Overwrites the field whenever it differs, even with an absent value.
    pub fn map_always<R>(self, field: impl Into<Field>, lens: Lens<T, R>) -> Self
    where
        R: PartialEq + Clone + 'static,
    {
        self.map_if(field, lens, eligibility::always::<R>, None)
    }

    /// Merges the field with a nested processor when both sides are present.
    pub fn map_with<R, P>(self, field: impl Into<Field>, lens: Lens<T, R>, processor: P) -> Self
    where
        R: PartialEq + Clone + 'static,
        P: UpdateProcessor<R> + 'static,
    {
        let processor: SharedProcessor<R> = Arc::new(processor);
        self.map_if(field, lens, eligibility::present::<R>, Some(processor))
    }

    /// Registers a field with an explicit eligibility test and an optional
    /// nested processor.
    pub fn map_if<R, C>(
        self,
        field: impl Into<Field>,
        lens: Lens<T, R>,
        condition: C,
        processor: Option<SharedProcessor<R>>,
    ) -> Self
    where
        R: PartialEq + Clone + 'static,
        C: Fn(Option<&R>) -> bool + Send + Sync + 'static,
    {
        self.operation(FieldUpdateOperation::new(
            field.into(),
            lens,
            Box::new(condition),
            processor,
        ))
    }

    /// Merges a list by element key, adopting source elements as they are.
    pub fn merge_list<E, K, F>(self, field: impl Into<Field>, lens: Lens<T, Vec<E>>, key: F) -> Self
    where
        E: PartialEq + Clone + 'static,
        K: Eq + Hash + 'static,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        self.merge_list_if(field, lens, key, None, eligibility::non_empty::<E>)
    }

    /// Merges a list by element key, merging matching elements with a
    /// nested processor.
    pub fn merge_list_with<E, K, F, P>(
        self,
        field: impl Into<Field>,
        lens: Lens<T, Vec<E>>,
        key: F,
        processor: P,
    ) -> Self
    where
        E: PartialEq + Clone + 'static,
        K: Eq + Hash + 'static,
        F: Fn(&E) -> K + Send + Sync + 'static,
        P: UpdateProcessor<E> + 'static,
    {
        let processor: SharedProcessor<E> = Arc::new(processor);
        self.merge_list_if(field, lens, key, Some(processor), eligibility::non_empty::<E>)
    }

    /// Registers a list with an explicit eligibility test and an optional
    /// nested element processor.
    pub fn merge_list_if<E, K, F, C>(
        self,
        field: impl Into<Field>,
        lens: Lens<T, Vec<E>>,
        key: F,
        processor: Option<SharedProcessor<E>>,
        condition: C,
    ) -> Self
    where
        E: PartialEq + Clone + 'static,
        K: Eq + Hash + 'static,
        F: Fn(&E) -> K + Send + Sync + 'static,
        C: Fn(Option<&Vec<E>>) -> bool + Send + Sync + 'static,
    {
        self.operation(ListUpdateOperation::new(
            field.into(),
            lens,
            Box::new(condition),
            Box::new(key),
            processor,
        ))
    }

    /// Builds the Processor.
    pub fn build(self) -> Processor<T> {
        Processor {
            operations: self.operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pojo {
        field_one: Option<String>,
        string_list: Option<Vec<String>>,
    }

    fn field_one() -> Lens<Pojo, String> {
        Lens::optional(|p: &Pojo| &p.field_one, |p: &mut Pojo| &mut p.field_one)
    }

    fn string_list() -> Lens<Pojo, Vec<String>> {
        Lens::optional(|p: &Pojo| &p.string_list, |p: &mut Pojo| &mut p.string_list)
    }

    #[test]
    fn test_builder_registration_order() {
        let processor = Processor::builder()
            .map("fieldOne", field_one())
            .merge_list("stringList", string_list(), |s: &String| s.clone())
            .map_always("fieldTwo", field_one())
            .build();

        assert_eq!(processor.len(), 3);
        let registered: Vec<(&str, OperationKind)> = processor
            .operations()
            .iter()
            .map(|op| (op.field().name(), op.kind()))
            .collect();
        assert_eq!(
            registered,
            vec![
                ("fieldOne", OperationKind::Field),
                ("stringList", OperationKind::List),
                ("fieldTwo", OperationKind::Field),
            ]
        );
    }

    #[test]
    fn test_empty_processor_has_no_updates() {
        let processor: Processor<Pojo> = Processor::builder().build();
        assert!(processor.is_empty());

        let mut target = Pojo::default();
        let result = processor.execute(&mut target, &Pojo::default()).unwrap();
        assert!(!result.has_updates());
        assert_eq!(result.to_string(), "");
    }

    #[test]
    fn test_patched_leaves_target_untouched() {
        let processor = Processor::builder().map("fieldOne", field_one()).build();
        let target = Pojo {
            field_one: Some("originalValue".to_string()),
            ..Default::default()
        };
        let source = Pojo {
            field_one: Some("updatedValue".to_string()),
            ..Default::default()
        };

        let (merged, result) = processor.patched(&target, &source).unwrap();
        assert_eq!(result.to_string(), "{fieldOne}");
        assert_eq!(merged.field_one.as_deref(), Some("updatedValue"));
        assert_eq!(target.field_one.as_deref(), Some("originalValue"));
    }

    #[test]
    fn test_dropped_weak_processor() {
        let weak: Weak<Processor<Pojo>> = {
            let processor = Arc::new(Processor::builder().build());
            Arc::downgrade(&processor)
        };

        let mut target = Pojo::default();
        let err = weak.execute(&mut target, &Pojo::default()).unwrap_err();
        assert_eq!(err.path(), "");
        assert!(err.cause().is::<ProcessorDropped>());
    }

    #[test]
    fn test_processor_is_shareable_across_threads() {
        fn assert_send_sync<P: Send + Sync>(_: &P) {}

        let processor = Arc::new(Processor::builder().map("fieldOne", field_one()).build());
        assert_send_sync(&processor);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let processor = Arc::clone(&processor);
                std::thread::spawn(move || {
                    let mut target = Pojo::default();
                    let source = Pojo {
                        field_one: Some(format!("value{}", i)),
                        ..Default::default()
                    };
                    processor.execute(&mut target, &source).map(|_| target)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let target = handle.join().unwrap().unwrap();
            assert_eq!(target.field_one, Some(format!("value{}", i)));
        }
    }
}
