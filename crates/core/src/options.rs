use modelkit_field_mask::{FieldMask, Selection};

/// Which fields an operation selects by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldFilter {
    /// Every field.
    #[default]
    All,
    /// No field by itself; change- and ownership-driven policies may still
    /// pull fields in.
    None,
    /// The named fields at this level.
    Names(Vec<String>),
    /// Mask-driven selection, with per-field substructure for nested
    /// instances.
    Mask(FieldMask),
}

impl FieldFilter {
    pub fn selects(&self, name: &str) -> bool {
        match self {
            FieldFilter::All => true,
            FieldFilter::None => false,
            FieldFilter::Names(names) => names.iter().any(|n| n == name),
            // Declared field names are never empty, so the lookup cannot
            // fail; an empty probe simply selects nothing.
            FieldFilter::Mask(mask) => mask.has(name).unwrap_or(false),
        }
    }
}

/// Options steering [`Instance::serialize_with`](crate::Instance::serialize_with).
///
/// A field is included when the filter selects it, when
/// `include_changed_fields` is on and the field changed since the last
/// commit, or when `include_owned_fields` is on and the field is declared
/// owned. Unset included fields are skipped unless
/// `include_undefined_fields` asks for an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializeOptions {
    pub include_fields: FieldFilter,
    pub include_changed_fields: bool,
    pub include_undefined_fields: bool,
    pub include_owned_fields: bool,
}

impl SerializeOptions {
    /// Defaults: every field, no undefined entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// The delta profile: only changed fields, plus owned fields.
    pub fn changed_only() -> Self {
        Self {
            include_fields: FieldFilter::None,
            include_changed_fields: true,
            include_owned_fields: true,
            ..Self::default()
        }
    }

    pub fn with_fields(mut self, filter: FieldFilter) -> Self {
        self.include_fields = filter;
        self
    }

    pub fn with_changed_fields(mut self, on: bool) -> Self {
        self.include_changed_fields = on;
        self
    }

    pub fn with_undefined_fields(mut self, on: bool) -> Self {
        self.include_undefined_fields = on;
        self
    }

    pub fn with_owned_fields(mut self, on: bool) -> Self {
        self.include_owned_fields = on;
        self
    }

    /// The options a nested instance under `field_name` serializes with:
    /// flags pass through, and a mask filter narrows to the field's
    /// sub-mask. A whole selection (or a non-mask filter) leaves the nested
    /// instance unfiltered.
    pub fn nested_for(&self, field_name: &str) -> SerializeOptions {
        let include_fields = match &self.include_fields {
            FieldFilter::Mask(mask) => match mask.get(field_name) {
                Ok(Some(Selection::Partial(sub))) => FieldFilter::Mask(sub.clone()),
                _ => FieldFilter::All,
            },
            other => other.clone(),
        };
        SerializeOptions {
            include_fields,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_selection() {
        assert!(FieldFilter::All.selects("anything"));
        assert!(!FieldFilter::None.selects("anything"));

        let names = FieldFilter::Names(vec!["a".to_string(), "b".to_string()]);
        assert!(names.selects("a"));
        assert!(!names.selects("c"));

        let mask = FieldFilter::Mask(
            FieldMask::from_value(&json!({ "a": true, "b": { "x": true } })).unwrap(),
        );
        assert!(mask.selects("a"));
        assert!(mask.selects("b"));
        assert!(!mask.selects("x"));
        assert!(!mask.selects(""));
    }

    #[test]
    fn nested_options_narrow_mask_filters() {
        let mask = FieldMask::from_value(&json!({
            "plain": true,
            "nested": { "kept": true },
        }))
        .unwrap();
        let options = SerializeOptions::new()
            .with_fields(FieldFilter::Mask(mask))
            .with_undefined_fields(true);

        // Whole selection: the nested instance serializes unfiltered.
        let plain = options.nested_for("plain");
        assert_eq!(plain.include_fields, FieldFilter::All);
        assert!(plain.include_undefined_fields);

        // Partial selection: the sub-mask becomes the nested filter.
        let nested = options.nested_for("nested");
        assert_eq!(
            nested.include_fields,
            FieldFilter::Mask(FieldMask::from_value(&json!({ "kept": true })).unwrap()),
        );
    }

    #[test]
    fn nested_options_pass_other_filters_through() {
        let options = SerializeOptions::changed_only();
        let nested = options.nested_for("whatever");
        assert_eq!(nested, options);

        let names = SerializeOptions::new()
            .with_fields(FieldFilter::Names(vec!["n".to_string()]));
        assert_eq!(names.nested_for("n"), names);
    }
}
