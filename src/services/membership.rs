//! Membership tests over slices

use crate::models::CanonicalForm;

/// Check whether `needle` equals any element of `items`.
///
/// Comparison goes through `PartialEq<U>`, so a `&[String]` can be searched
/// with a `&str` and a `&[Value]` with a number. An empty slice never
/// contains anything.
pub fn contains<T, U>(items: &[T], needle: &U) -> bool
where
    T: PartialEq<U>,
    U: ?Sized,
{
    items.iter().any(|item| item == needle)
}

/// Check whether a record with the same canonical form as `needle` is present.
///
/// Field order inside objects is ignored, so two rows holding the same
/// fields compare equal however they were built.
pub fn contains_record<R>(items: &[R], needle: &R) -> bool
where
    R: CanonicalForm,
{
    let wanted = needle.canonical_form();
    items.iter().any(|item| item.canonical_form() == wanted)
}
