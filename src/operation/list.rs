//! Keyed list update operation.

use super::{Condition, OperationKind, UpdateOperation};
use crate::error::UpdateError;
use crate::field::Field;
use crate::lens::Lens;
use crate::processor::SharedProcessor;
use crate::result::UpdateResult;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, trace};

/// Extracts the key that identifies a list element across target and source.
pub type KeyExtractor<E, K> = Box<dyn Fn(&E) -> K + Send + Sync>;

/// Where the element at one merge index comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Target(usize),
    Source(usize),
    Both(usize, usize),
}

/// ListUpdateOperation merges a list field by element key.
///
/// Elements are matched by key rather than position. The merged list holds
/// the target keys in their original order followed by the keys only the
/// source has. Target-only elements are kept, source-only elements are
/// adopted and elements on both sides are either merged with the nested
/// processor or replaced by the source element. Nothing is ever removed.
///
/// When a list holds several elements with the same key, only the first of
/// them takes part in the merge.
pub struct ListUpdateOperation<T, E, K> {
    field: Field,
    lens: Lens<T, Vec<E>>,
    condition: Condition<Vec<E>>,
    key: KeyExtractor<E, K>,
    processor: Option<SharedProcessor<E>>,
}

impl<T, E, K> ListUpdateOperation<T, E, K> {
    /// Creates a new ListUpdateOperation.
    pub fn new(
        field: Field,
        lens: Lens<T, Vec<E>>,
        condition: Condition<Vec<E>>,
        key: KeyExtractor<E, K>,
        processor: Option<SharedProcessor<E>>,
    ) -> Self {
        ListUpdateOperation {
            field,
            lens,
            condition,
            key,
            processor,
        }
    }

    /// Returns the binding to the list field.
    pub fn lens(&self) -> &Lens<T, Vec<E>> {
        &self.lens
    }

    /// Applies the eligibility test to a source list.
    pub fn is_eligible(&self, items: Option<&Vec<E>>) -> bool {
        (self.condition)(items)
    }

    /// Returns the key of an element.
    pub fn key_of(&self, item: &E) -> K {
        (self.key)(item)
    }

    /// Returns the nested element processor, if any.
    pub fn processor(&self) -> Option<&SharedProcessor<E>> {
        self.processor.as_ref()
    }
}

impl<T, E, K> ListUpdateOperation<T, E, K>
where
    E: PartialEq + Clone,
    K: Eq + Hash,
{
    /// Lines up both lists by key, in merge index order.
    fn align(&self, current: &[E], incoming: &[E]) -> Vec<Slot> {
        let mut positions: HashMap<K, usize> = HashMap::new();
        let mut slots = Vec::with_capacity(current.len() + incoming.len());

        for (i, item) in current.iter().enumerate() {
            if let Entry::Vacant(entry) = positions.entry(self.key_of(item)) {
                entry.insert(slots.len());
                slots.push(Slot::Target(i));
            }
        }
        for (i, item) in incoming.iter().enumerate() {
            match positions.entry(self.key_of(item)) {
                Entry::Occupied(entry) => {
                    let slot = &mut slots[*entry.get()];
                    if let Slot::Target(t) = *slot {
                        *slot = Slot::Both(t, i);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(slots.len());
                    slots.push(Slot::Source(i));
                }
            }
        }
        slots
    }

    /// Merges `incoming` into `current`, returning the merged list and one
    /// result per changed element.
    fn merge(
        &self,
        current: &mut [E],
        incoming: &[E],
    ) -> Result<(Vec<E>, Vec<UpdateResult>), UpdateError> {
        let slots = self.align(current, incoming);
        let mut merged = Vec::with_capacity(slots.len());
        let mut children = Vec::new();

        for (index, slot) in slots.into_iter().enumerate() {
            match (slot, &self.processor) {
                (Slot::Target(t), _) => merged.push(current[t].clone()),
                (Slot::Both(t, s), Some(processor)) => {
                    let result = processor
                        .execute(&mut current[t], &incoming[s])
                        .map_err(|err| err.within_element(self.field.name(), index))?;
                    if result.has_updates() {
                        children.push(result.with_index(index));
                    }
                    merged.push(current[t].clone());
                }
                (Slot::Both(_, s), None) | (Slot::Source(s), _) => {
                    trace!(field = %self.field, index, "adopting source element");
                    merged.push(incoming[s].clone());
                    children.push(UpdateResult::index(index));
                }
            }
        }

        debug!(
            field = %self.field,
            target = current.len(),
            source = incoming.len(),
            merged = merged.len(),
            changed = children.len(),
            "merged list"
        );
        Ok((merged, children))
    }
}

impl<T, E, K> UpdateOperation<T> for ListUpdateOperation<T, E, K>
where
    E: PartialEq + Clone,
    K: Eq + Hash,
{
    fn field(&self) -> &Field {
        &self.field
    }

    fn kind(&self) -> OperationKind {
        OperationKind::List
    }

    fn execute(&self, target: &mut T, source: &T) -> Result<Option<UpdateResult>, UpdateError> {
        let items = self.lens.get(source);
        if !self.is_eligible(items) {
            return Ok(None);
        }
        if self.lens.get(target) == items {
            return Ok(None);
        }

        let merged = match (items, self.lens.get_mut(target)) {
            (Some(incoming), Some(current)) => Some(self.merge(current, incoming)?),
            _ => None,
        };

        let (value, result) = match merged {
            Some((merged, children)) => (
                Some(merged),
                UpdateResult::with_children(children).with_field(self.field.clone()),
            ),
            None => {
                trace!(field = %self.field, "overwriting list");
                (items.cloned(), UpdateResult::field(self.field.clone()))
            }
        };
        self.lens
            .set(target, value)
            .map_err(|err| UpdateError::new(err).within_field(self.field.name()))?;
        Ok(Some(result))
    }
}
