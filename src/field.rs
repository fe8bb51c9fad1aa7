//! Field identifiers.

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Field names a single field of a record type.
///
/// It is only a label: update results and failure paths carry it so callers
/// can tell which field changed or failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field {
    name: Cow<'static, str>,
}

impl Field {
    /// Creates a field from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Field {
            name: Cow::Owned(name.into()),
        }
    }

    /// Creates a field from a static name, usable in `const` items.
    pub const fn from_static(name: &'static str) -> Self {
        Field {
            name: Cow::Borrowed(name),
        }
    }

    /// Returns the display name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&'static str> for Field {
    fn from(name: &'static str) -> Self {
        Field::from_static(name)
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::new(name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}
