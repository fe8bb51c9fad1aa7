//! Eligibility policies for source values.
//!
//! A field is only considered for an update when its policy admits the
//! source value.

/// Admits any present source value. Default for plain fields.
pub fn present<R>(value: Option<&R>) -> bool {
    value.is_some()
}

/// Admits every source value, including an absent one.
pub fn always<R>(_value: Option<&R>) -> bool {
    true
}

/// Admits a present, non-empty list. Default for list fields.
pub fn non_empty<E>(value: Option<&Vec<E>>) -> bool {
    value.is_some_and(|items| !items.is_empty())
}
