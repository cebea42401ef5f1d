//! Small generic helpers shared across the model engine.

/// Applies `predicate` over a one-or-many slice view, returning the first
/// `Some` result and short-circuiting the rest.
///
/// Field values produce the view with
/// [`FieldValue::as_slice`](crate::FieldValue::as_slice): a single value is
/// a one-element slice, an array contributes its elements.
///
/// # Examples
///
/// ```
/// use modelkit_core::util::find_from_one_or_many;
///
/// let values = [1, 2, 3, 4];
/// let found = find_from_one_or_many(&values, |n| (*n > 2).then_some(n * 10));
/// assert_eq!(found, Some(30));
///
/// let none = find_from_one_or_many(&values, |n| (*n > 9).then_some(*n));
/// assert_eq!(none, None);
/// ```
pub fn find_from_one_or_many<T, R>(
    values: &[T],
    predicate: impl FnMut(&T) -> Option<R>,
) -> Option<R> {
    values.iter().find_map(predicate)
}
