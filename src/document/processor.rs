//! Processors compiled from a merge schema.

use super::schema::{FieldDef, MergeSchema, SchemaError, TypeDef};
use crate::error::{BoxError, UpdateError};
use crate::field::Field;
use crate::lens::Lens;
use crate::processor::{Processor, ProcessorBuilder, SharedProcessor, UpdateProcessor};
use crate::result::UpdateResult;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::debug;

type Slots = [OnceCell<Processor<Value>>];

/// DocumentError is raised while merging documents.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("expected an object, found {0}")]
    NotAnObject(&'static str),

    #[error("type {0} is not available")]
    Unresolved(String),
}

/// DocumentProcessor merges JSON/YAML documents as declared by a
/// [`MergeSchema`].
///
/// A missing key and an explicit `null` both count as absent. Writing an
/// absent value removes the key.
pub struct DocumentProcessor {
    slots: Arc<Slots>,
    names: Vec<String>,
    root: usize,
}

impl DocumentProcessor {
    /// Validates the schema and compiles one processor per type.
    pub fn new(schema: &MergeSchema) -> Result<Self, SchemaError> {
        schema.validate()?;

        let index: HashMap<&str, usize> = schema
            .types
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.as_str(), i))
            .collect();
        let slots: Arc<Slots> = schema.types.iter().map(|_| OnceCell::new()).collect();

        for (slot, def) in slots.iter().zip(&schema.types) {
            slot.get_or_init(|| compile(def, &index, &slots));
        }

        let root_name = schema.root_type().ok_or(SchemaError::Empty)?;
        let root = index
            .get(root_name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownRoot(root_name.to_string()))?;
        debug!(types = schema.types.len(), root = %schema.types[root].name, "compiled merge schema");

        Ok(DocumentProcessor {
            slots,
            names: schema.types.iter().map(|def| def.name.clone()).collect(),
            root,
        })
    }

    /// Parses, validates and compiles a schema from YAML or JSON.
    pub fn from_yaml(input: &str) -> Result<Self, SchemaError> {
        DocumentProcessor::new(&MergeSchema::from_yaml(input)?)
    }

    /// Returns the names of all types, in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the name of the root type.
    pub fn root_type(&self) -> &str {
        &self.names[self.root]
    }

    /// Returns the processor of the named type.
    pub fn processor(&self, type_name: &str) -> Option<&Processor<Value>> {
        let i = self.names.iter().position(|name| name == type_name)?;
        self.slots[i].get()
    }

    /// Merges `source` into `target` as the named type.
    pub fn execute_as(
        &self,
        type_name: &str,
        target: &mut Value,
        source: &Value,
    ) -> Result<UpdateResult, UpdateError> {
        let processor = self
            .processor(type_name)
            .ok_or_else(|| UpdateError::new(DocumentError::Unresolved(type_name.to_string())))?;
        processor.execute(target, source)
    }
}

impl UpdateProcessor<Value> for DocumentProcessor {
    fn execute(&self, target: &mut Value, source: &Value) -> Result<UpdateResult, UpdateError> {
        self.execute_as(self.root_type(), target, source)
    }
}

/// Refers to the processor of a type by slot, so types can nest themselves.
struct TypeRef {
    slots: Weak<Slots>,
    index: usize,
    name: String,
}

impl UpdateProcessor<Value> for TypeRef {
    fn execute(&self, target: &mut Value, source: &Value) -> Result<UpdateResult, UpdateError> {
        let slots = self
            .slots
            .upgrade()
            .ok_or_else(|| UpdateError::new(DocumentError::Unresolved(self.name.clone())))?;
        match slots[self.index].get() {
            Some(processor) => processor.execute(target, source),
            None => Err(UpdateError::new(DocumentError::Unresolved(self.name.clone()))),
        }
    }
}

fn compile(def: &TypeDef, index: &HashMap<&str, usize>, slots: &Arc<Slots>) -> Processor<Value> {
    let mut builder = ProcessorBuilder::new();
    for field in &def.fields {
        let nested = field
            .type_name
            .as_ref()
            .and_then(|name| index.get(name.as_str()).map(|&i| (name, i)))
            .map(|(name, i)| -> SharedProcessor<Value> {
                Arc::new(TypeRef {
                    slots: Arc::downgrade(slots),
                    index: i,
                    name: name.clone(),
                })
            });
        builder = register(builder, field, nested);
    }
    builder.build()
}

fn register(
    builder: ProcessorBuilder<Value>,
    def: &FieldDef,
    nested: Option<SharedProcessor<Value>>,
) -> ProcessorBuilder<Value> {
    let policy = def.effective_policy();
    let field = Field::new(def.name.clone());
    match &def.list {
        Some(list) => {
            let key = list.key.clone();
            builder.merge_list_if(
                field,
                list_lens(&def.name),
                move |item: &Value| element_key(item, key.as_deref()),
                nested,
                move |items: Option<&Vec<Value>>| policy.admits_list(items),
            )
        }
        None => builder.map_if(
            field,
            value_lens(&def.name),
            move |value: Option<&Value>| policy.admits(value),
            nested,
        ),
    }
}

fn element_key(item: &Value, key: Option<&str>) -> String {
    match key {
        Some(key) => item.get(key).unwrap_or(&Value::Null).to_string(),
        None => item.to_string(),
    }
}

fn value_lens(name: &str) -> Lens<Value, Value> {
    let (get_name, mut_name, set_name) = (name.to_string(), name.to_string(), name.to_string());
    Lens::new(
        move |doc: &Value| doc.get(&get_name).filter(|v| !v.is_null()),
        move |doc: &mut Value| doc.get_mut(&mut_name).filter(|v| !v.is_null()),
        move |doc: &mut Value, value: Option<Value>| write_field(doc, &set_name, value),
    )
}

fn list_lens(name: &str) -> Lens<Value, Vec<Value>> {
    let (get_name, mut_name, set_name) = (name.to_string(), name.to_string(), name.to_string());
    Lens::new(
        move |doc: &Value| doc.get(&get_name).and_then(Value::as_array),
        move |doc: &mut Value| doc.get_mut(&mut_name).and_then(Value::as_array_mut),
        move |doc: &mut Value, items: Option<Vec<Value>>| {
            write_field(doc, &set_name, items.map(Value::Array))
        },
    )
}

fn write_field(doc: &mut Value, name: &str, value: Option<Value>) -> Result<(), BoxError> {
    if doc.is_null() {
        *doc = Value::Object(serde_json::Map::new());
    }
    let kind = kind_of(doc);
    let map = doc
        .as_object_mut()
        .ok_or(DocumentError::NotAnObject(kind))?;
    match value {
        Some(value) => {
            map.insert(name.to_string(), value);
        }
        None => {
            map.remove(name);
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
