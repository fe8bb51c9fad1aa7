//! Update result tree.

use crate::field::Field;
use serde::Serialize;
use std::fmt;

/// UpdateResult records what a merge changed.
///
/// A node names either a field or the merge index of a list element, and
/// carries the results of nested merges as children. The root node produced
/// by a processor names neither and only aggregates.
///
/// Equality ignores the index. The rendering shows `[index]` only for
/// element nodes that name no field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<UpdateResult>,
}

impl UpdateResult {
    /// Creates an empty result with no updates.
    pub fn new() -> Self {
        UpdateResult::default()
    }

    /// Creates a leaf result for a field that was overwritten.
    pub fn field(field: Field) -> Self {
        UpdateResult {
            field: Some(field),
            ..Default::default()
        }
    }

    /// Creates a leaf result for a list element at the given merge index.
    pub fn index(index: usize) -> Self {
        UpdateResult {
            index: Some(index),
            ..Default::default()
        }
    }

    /// Creates an aggregating result with the given children.
    pub fn with_children(children: Vec<UpdateResult>) -> Self {
        UpdateResult {
            children,
            ..Default::default()
        }
    }

    /// Returns a copy of this result labelled with the given field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    /// Returns a copy of this result labelled with the given merge index.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Returns the field this node names, if any.
    pub fn field_name(&self) -> Option<&Field> {
        self.field.as_ref()
    }

    /// Returns the merge index this node names, if any.
    pub fn merge_index(&self) -> Option<usize> {
        self.index
    }

    /// Returns the nested results.
    pub fn children(&self) -> &[UpdateResult] {
        &self.children
    }

    /// Returns true if this node records any change.
    pub fn has_updates(&self) -> bool {
        self.field.is_some() || self.index.is_some() || !self.children.is_empty()
    }

    /// Flattens the tree into the paths of its leaves.
    ///
    /// Paths use the same grammar as failure paths, e.g.
    /// `pojoList[0].stringList`.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(String::new(), &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: String, paths: &mut Vec<String>) {
        let own = match (&self.field, self.index) {
            (Some(field), _) => join_field(&prefix, field.name()),
            (None, Some(index)) => format!("{}[{}]", prefix, index),
            (None, None) => prefix,
        };
        if self.children.is_empty() {
            if !own.is_empty() {
                paths.push(own);
            }
            return;
        }
        for child in &self.children {
            child.collect_paths(own.clone(), paths);
        }
    }
}

fn join_field(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

impl PartialEq for UpdateResult {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.children == other.children
    }
}

impl Eq for UpdateResult {}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "{}", field)?;
        } else if let Some(index) = self.index {
            write!(f, "[{}]", index)?;
        }
        if !self.children.is_empty() {
            write!(f, "{{")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}
