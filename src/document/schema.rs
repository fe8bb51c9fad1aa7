//! Merge schema definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// MergeSchema declares how the documents of each named type are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeSchema {
    /// Type used when none is requested. Defaults to the first type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
}

/// TypeDef lists the fields merged for one document type, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
}

/// FieldDef describes one merged field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Named type the value (or each list element) is merged as.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    /// Present when the field is a list merged by element key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListDef>,
}

/// ListDef configures keyed list merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListDef {
    /// Element field holding the key. The whole element is the key when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Policy decides whether a source value is considered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Policy {
    /// The source value is present and not null.
    Present,
    /// Every source value, including an absent one.
    Always,
    /// The source value is present and not an empty string, list or map.
    NonEmpty,
}

impl Policy {
    /// Returns true if the policy admits the given source value.
    pub fn admits(&self, value: Option<&Value>) -> bool {
        match self {
            Policy::Present => value.is_some(),
            Policy::Always => true,
            Policy::NonEmpty => match value {
                None => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Array(items)) => !items.is_empty(),
                Some(Value::Object(map)) => !map.is_empty(),
                Some(_) => true,
            },
        }
    }

    /// Returns true if the policy admits the given source list.
    pub fn admits_list(&self, items: Option<&Vec<Value>>) -> bool {
        match self {
            Policy::Present => items.is_some(),
            Policy::Always => true,
            Policy::NonEmpty => items.is_some_and(|items| !items.is_empty()),
        }
    }
}

impl FieldDef {
    /// Returns the configured policy, or the default for the field kind.
    pub fn effective_policy(&self) -> Policy {
        match (self.policy, &self.list) {
            (Some(policy), _) => policy,
            (None, Some(_)) => Policy::NonEmpty,
            (None, None) => Policy::Present,
        }
    }
}

/// SchemaError represents an invalid merge schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse merge schema: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("merge schema declares no types")]
    Empty,

    #[error("duplicate type: {0}")]
    DuplicateType(String),

    #[error("{type_name}: duplicate field: {field}")]
    DuplicateField { type_name: String, field: String },

    #[error("{type_name}.{field}: unknown type: {referenced}")]
    UnknownType {
        type_name: String,
        field: String,
        referenced: String,
    },

    #[error("unknown type: {0}")]
    UnknownRoot(String),
}

impl MergeSchema {
    /// Parses a schema from YAML or JSON and validates it.
    pub fn from_yaml(input: &str) -> Result<Self, SchemaError> {
        let schema: MergeSchema = serde_yaml::from_str(input)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Checks type names, field names and type references.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.types.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut names = HashSet::new();
        for def in &self.types {
            if !names.insert(def.name.as_str()) {
                return Err(SchemaError::DuplicateType(def.name.clone()));
            }
        }

        for def in &self.types {
            let mut fields = HashSet::new();
            for field in &def.fields {
                if !fields.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        type_name: def.name.clone(),
                        field: field.name.clone(),
                    });
                }
                if let Some(referenced) = &field.type_name {
                    if !names.contains(referenced.as_str()) {
                        return Err(SchemaError::UnknownType {
                            type_name: def.name.clone(),
                            field: field.name.clone(),
                            referenced: referenced.clone(),
                        });
                    }
                }
            }
        }

        if let Some(root) = &self.root {
            if !names.contains(root.as_str()) {
                return Err(SchemaError::UnknownRoot(root.clone()));
            }
        }
        Ok(())
    }

    /// Returns the name of the root type.
    pub fn root_type(&self) -> Option<&str> {
        self.root
            .as_deref()
            .or_else(|| self.types.first().map(|def| def.name.as_str()))
    }

    /// Returns the names of all types, in declaration order.
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|def| def.name.as_str()).collect()
    }
}
