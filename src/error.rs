//! Update failures.

use thiserror::Error;

/// Boxed error raised by a field mutator or a custom processor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// UpdateError reports a failed merge together with the path of the field
/// that failed, e.g. `outer.innerList[2].deepField`.
///
/// The error is created at the failing field and each enclosing operation
/// prepends its own segment on the way out. The cause is never replaced.
#[derive(Debug, Error)]
#[error("Failed to update field: {path}")]
pub struct UpdateError {
    path: String,
    #[source]
    cause: BoxError,
}

impl UpdateError {
    /// Creates an error with an empty path.
    ///
    /// Custom processors return this for failures of their own; the
    /// operation that called them fills in the path.
    pub fn new(cause: impl Into<BoxError>) -> Self {
        UpdateError {
            path: String::new(),
            cause: cause.into(),
        }
    }

    /// Creates an error for the given path.
    pub fn at(path: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        UpdateError {
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Returns the path of the failing field.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the innermost cause.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Follows the source chain of the cause down to its root.
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        let mut current: &(dyn std::error::Error + 'static) = self.cause.as_ref();
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    /// Consumes the error, returning its cause.
    pub fn into_cause(self) -> BoxError {
        self.cause
    }

    /// Prepends `name.` to the path, or sets it to `name` if empty.
    pub fn within_field(self, name: &str) -> Self {
        self.prefixed(name.to_string())
    }

    /// Prepends `name[index].` to the path, or sets it to `name[index]` if
    /// empty.
    pub fn within_element(self, name: &str, index: usize) -> Self {
        self.prefixed(format!("{}[{}]", name, index))
    }

    fn prefixed(self, segment: String) -> Self {
        let path = if self.path.is_empty() {
            segment
        } else {
            format!("{}.{}", segment, self.path)
        };
        UpdateError {
            path,
            cause: self.cause,
        }
    }
}
