use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::FieldMaskError;

/// How a single field is selected by a [`FieldMask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The field is selected whole, substructure included.
    All,
    /// Only the listed parts of the field are selected.
    Partial(FieldMask),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn as_partial(&self) -> Option<&FieldMask> {
        match self {
            Selection::Partial(mask) => Some(mask),
            Selection::All => None,
        }
    }
}

/// A recursive field selection tree.
///
/// Each entry maps a field name to a [`Selection`]: the whole field, or a
/// nested mask describing which parts of it are selected. Entries keep
/// insertion order, and two masks are equal when they select the same fields
/// the same way, regardless of entry order.
///
/// # Examples
///
/// ```
/// use modelkit_field_mask::{FieldMask, Selection};
///
/// let mut mask = FieldMask::new();
/// mask.set("title", Selection::All)?;
///
/// let mut author = FieldMask::new();
/// author.set("name", Selection::All)?;
/// mask.set("author", Selection::Partial(author))?;
///
/// assert!(mask.has("title")?);
/// assert_eq!(mask.to_value(), serde_json::json!({
///     "title": true,
///     "author": { "name": true },
/// }));
/// # Ok::<(), modelkit_field_mask::FieldMaskError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask {
    entries: IndexMap<String, Selection>,
}

impl FieldMask {
    /// An empty mask, selecting nothing.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> + '_ {
        self.entries.iter().map(|(name, sel)| (name.as_str(), sel))
    }

    /// The selection stored under `name`, if any.
    pub fn get(&self, name: &str) -> Result<Option<&Selection>, FieldMaskError> {
        check_name(name)?;
        Ok(self.entries.get(name))
    }

    /// Whether `name` has an entry, whole or partial.
    pub fn has(&self, name: &str) -> Result<bool, FieldMaskError> {
        check_name(name)?;
        Ok(self.entries.contains_key(name))
    }

    /// Insert or replace the selection under `name`.
    pub fn set(&mut self, name: &str, selection: Selection) -> Result<(), FieldMaskError> {
        check_name(name)?;
        self.entries.insert(name.to_string(), selection);
        Ok(())
    }

    /// Whether every selection in `other` is covered by this mask.
    ///
    /// A whole entry covers both whole and partial selections of the same
    /// field. A partial entry covers only partial selections whose sub-mask
    /// it includes recursively; it never covers a whole selection, since the
    /// unlisted parts are missing.
    pub fn includes(&self, other: &FieldMask) -> bool {
        for (name, required) in &other.entries {
            match (self.entries.get(name), required) {
                (None, _) => return false,
                (Some(Selection::All), _) => {}
                (Some(Selection::Partial(_)), Selection::All) => return false,
                (Some(Selection::Partial(own)), Selection::Partial(sub)) => {
                    if !own.includes(sub) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// The union of two masks.
    ///
    /// Fields present on one side only are carried over; partial entries
    /// present on both sides merge recursively. A field selected whole on
    /// one side and partially on the other has no faithful union and fails
    /// with [`FieldMaskError::IncompatibleMasks`].
    ///
    /// # Examples
    ///
    /// ```
    /// use modelkit_field_mask::FieldMask;
    /// use serde_json::json;
    ///
    /// let a = FieldMask::from_value(&json!({ "a": true, "c": { "x": true } }))?;
    /// let b = FieldMask::from_value(&json!({ "b": true, "c": { "y": true } }))?;
    /// let merged = a.add(&b)?;
    /// assert_eq!(
    ///     merged.to_value(),
    ///     json!({ "a": true, "c": { "x": true, "y": true }, "b": true }),
    /// );
    /// # Ok::<(), modelkit_field_mask::FieldMaskError>(())
    /// ```
    pub fn add(&self, other: &FieldMask) -> Result<FieldMask, FieldMaskError> {
        self.add_at(other, "")
    }

    fn add_at(&self, other: &FieldMask, path: &str) -> Result<FieldMask, FieldMaskError> {
        let mut entries = self.entries.clone();
        for (name, incoming) in &other.entries {
            let child_path = join_path(path, name);
            let merged = match entries.get(name) {
                None => incoming.clone(),
                Some(Selection::All) => match incoming {
                    Selection::All => continue,
                    Selection::Partial(_) => {
                        return Err(FieldMaskError::IncompatibleMasks(child_path))
                    }
                },
                Some(Selection::Partial(own)) => match incoming {
                    Selection::All => {
                        return Err(FieldMaskError::IncompatibleMasks(child_path))
                    }
                    Selection::Partial(sub) => Selection::Partial(own.add_at(sub, &child_path)?),
                },
            };
            entries.insert(name.clone(), merged);
        }
        Ok(FieldMask { entries })
    }

    /// The difference of two masks: everything selected here and not
    /// selected by `other`.
    ///
    /// Removing a whole entry drops the field. Removing a partial selection
    /// from a partial entry subtracts recursively, dropping the field once
    /// its sub-mask empties out. Removing a partial selection from a whole
    /// entry also drops the field: the remainder ("everything except these
    /// parts") is not representable as a mask.
    pub fn remove(&self, other: &FieldMask) -> FieldMask {
        let mut entries = IndexMap::new();
        for (name, kept) in &self.entries {
            match other.entries.get(name) {
                None => {
                    entries.insert(name.clone(), kept.clone());
                }
                Some(Selection::All) => {}
                Some(Selection::Partial(sub)) => {
                    if let Selection::Partial(own) = kept {
                        let remainder = own.remove(sub);
                        if !remainder.is_empty() {
                            entries.insert(name.clone(), Selection::Partial(remainder));
                        }
                    }
                }
            }
        }
        FieldMask { entries }
    }

    /// The wire form: an object mapping each field name to `true` or to a
    /// nested wire form.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (name, selection) in &self.entries {
            let entry = match selection {
                Selection::All => Value::Bool(true),
                Selection::Partial(sub) => sub.to_value(),
            };
            map.insert(name.clone(), entry);
        }
        Value::Object(map)
    }

    /// Parse the wire form produced by [`FieldMask::to_value`].
    ///
    /// Every entry must be `true` or a nested object; anything else fails
    /// with [`FieldMaskError::InvalidStructure`] naming the dotted path of
    /// the offending entry.
    pub fn from_value(value: &Value) -> Result<FieldMask, FieldMaskError> {
        Self::from_value_at(value, "")
    }

    fn from_value_at(value: &Value, path: &str) -> Result<FieldMask, FieldMaskError> {
        let Value::Object(map) = value else {
            let at = if path.is_empty() {
                "(root)".to_string()
            } else {
                path.to_string()
            };
            return Err(FieldMaskError::InvalidStructure(at));
        };
        let mut entries = IndexMap::new();
        for (name, entry) in map {
            if name.is_empty() {
                return Err(FieldMaskError::InvalidName);
            }
            let child_path = join_path(path, name);
            let selection = match entry {
                Value::Bool(true) => Selection::All,
                Value::Object(_) => Selection::Partial(Self::from_value_at(entry, &child_path)?),
                _ => return Err(FieldMaskError::InvalidStructure(child_path)),
            };
            entries.insert(name.clone(), selection);
        }
        Ok(FieldMask { entries })
    }

    /// Whether `value` parses as a mask.
    pub fn is_mask_value(value: &Value) -> bool {
        Self::from_value(value).is_ok()
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

fn check_name(name: &str) -> Result<(), FieldMaskError> {
    if name.is_empty() {
        return Err(FieldMaskError::InvalidName);
    }
    Ok(())
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}
