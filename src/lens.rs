//! Field bindings.
//!
//! A [`Lens`] bundles the three ways an operation touches one field of a
//! record: reading it, reaching into it for in-place recursive merges, and
//! writing a new value.

use crate::error::BoxError;
use thiserror::Error;

type Getter<T, R> = Box<dyn Fn(&T) -> Option<&R> + Send + Sync>;
type GetterMut<T, R> = Box<dyn Fn(&mut T) -> Option<&mut R> + Send + Sync>;
type Setter<T, R> = Box<dyn Fn(&mut T, Option<R>) -> Result<(), BoxError> + Send + Sync>;

/// ClearRequired is returned when `None` is written through a
/// [`Lens::required`] lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("required field cannot be cleared")]
pub struct ClearRequired;

/// Lens binds a field of type `R` inside a record of type `T`.
///
/// An absent field reads as `None`. Writing `None` clears the field.
pub struct Lens<T, R> {
    get: Getter<T, R>,
    get_mut: GetterMut<T, R>,
    set: Setter<T, R>,
}

impl<T: 'static, R: 'static> Lens<T, R> {
    /// Creates a lens from explicit accessors and a fallible mutator.
    pub fn new<G, M, S>(get: G, get_mut: M, set: S) -> Self
    where
        G: Fn(&T) -> Option<&R> + Send + Sync + 'static,
        M: Fn(&mut T) -> Option<&mut R> + Send + Sync + 'static,
        S: Fn(&mut T, Option<R>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Lens {
            get: Box::new(get),
            get_mut: Box::new(get_mut),
            set: Box::new(set),
        }
    }

    /// Creates a lens over an `Option<R>` field.
    ///
    /// ```
    /// use field_patcher::Lens;
    ///
    /// struct Person { name: Option<String> }
    ///
    /// let lens = Lens::optional(|p: &Person| &p.name, |p: &mut Person| &mut p.name);
    /// let mut person = Person { name: None };
    /// lens.set(&mut person, Some("Ada".to_string())).unwrap();
    /// assert_eq!(lens.get(&person).map(String::as_str), Some("Ada"));
    /// ```
    pub fn optional<G, M>(get: G, get_mut: M) -> Self
    where
        G: Fn(&T) -> &Option<R> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<R> + Clone + Send + Sync + 'static,
    {
        let set_slot = get_mut.clone();
        Lens {
            get: getter(move |t| get(t).as_ref()),
            get_mut: getter_mut(move |t| get_mut(t).as_mut()),
            set: setter(move |t, value| {
                *set_slot(t) = value;
                Ok(())
            }),
        }
    }

    /// Creates a lens over a field that is always present.
    ///
    /// Writing `None` fails with [`ClearRequired`] and leaves the field
    /// unchanged.
    pub fn required<G, M>(get: G, get_mut: M) -> Self
    where
        G: Fn(&T) -> &R + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut R + Clone + Send + Sync + 'static,
    {
        let set_slot = get_mut.clone();
        Lens {
            get: getter(move |t| Some(get(t))),
            get_mut: getter_mut(move |t| Some(get_mut(t))),
            set: setter(move |t, value| {
                *set_slot(t) = value.ok_or(ClearRequired)?;
                Ok(())
            }),
        }
    }
}

fn getter<T, R, F>(f: F) -> Getter<T, R>
where
    F: Fn(&T) -> Option<&R> + Send + Sync + 'static,
{
    Box::new(f)
}

fn getter_mut<T, R, F>(f: F) -> GetterMut<T, R>
where
    F: Fn(&mut T) -> Option<&mut R> + Send + Sync + 'static,
{
    Box::new(f)
}

fn setter<T, R, F>(f: F) -> Setter<T, R>
where
    F: Fn(&mut T, Option<R>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Box::new(f)
}

impl<T, R> Lens<T, R> {
    /// Reads the field.
    pub fn get<'a>(&self, record: &'a T) -> Option<&'a R> {
        (self.get)(record)
    }

    /// Reaches into the field for in-place modification.
    pub fn get_mut<'a>(&self, record: &'a mut T) -> Option<&'a mut R> {
        (self.get_mut)(record)
    }

    /// Writes the field.
    pub fn set(&self, record: &mut T, value: Option<R>) -> Result<(), BoxError> {
        (self.set)(record, value)
    }
}
