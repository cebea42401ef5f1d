//! Recursive field selection trees.
//!
//! A [`FieldMask`] names the fields of a (possibly nested) object graph that
//! an operation cares about: each entry selects a field whole or, through a
//! nested mask, only parts of it. Masks support union ([`FieldMask::add`]),
//! difference ([`FieldMask::remove`]), coverage ([`FieldMask::includes`]),
//! and a JSON wire form ([`FieldMask::to_value`] / [`FieldMask::from_value`])
//! where a whole selection is `true` and a partial one is a nested object.

pub mod error;
pub mod mask;

pub use error::FieldMaskError;
pub use mask::{FieldMask, Selection};
