use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde_json::Value;

use crate::constants::{BASE_TYPE_NAME, TYPE_TAG};
use crate::error::ModelError;
use crate::field::Field;
use crate::instance::Instance;
use crate::registry::Registry;
use crate::value::{json_kind, Raw};

/// An immutable, resolved model type: name, ancestry, and field table.
///
/// Built by [`RegistryBuilder::build`](crate::RegistryBuilder::build), which
/// installs a weak back-reference to the shared [`Registry`], or by
/// [`TypeDef::build_standalone`](crate::TypeDef::build_standalone) with no
/// registry behind it. Always handled through `Arc`: instances keep their
/// type alive, and construction entry points hang off `&Arc<Self>`.
#[derive(Debug)]
pub struct ModelType {
    name: String,
    lineage: Vec<String>,
    fields: IndexMap<String, Field>,
    registry: Weak<Registry>,
}

impl ModelType {
    pub(crate) fn new(
        name: String,
        lineage: Vec<String>,
        fields: IndexMap<String, Field>,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            name,
            lineage,
            fields,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own name first, then ancestors, nearest first.
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// True for the type's own name, any ancestor's name, and the root
    /// marker [`BASE_TYPE_NAME`].
    pub fn is_of_type(&self, name: &str) -> bool {
        name == BASE_TYPE_NAME || self.lineage.iter().any(|n| n == name)
    }

    /// Fields in declaration order, inherited fields first.
    pub fn fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Applies `f` to each field in declaration order, returning the first
    /// `Some` result.
    pub fn find_field<'a, R>(&'a self, mut f: impl FnMut(&'a Field) -> Option<R>) -> Option<R> {
        self.fields.values().find_map(move |field| f(field))
    }

    /// Lookup by wire key; serialized-name overrides win over declared
    /// names.
    pub fn field_by_wire_name(&self, wire: &str) -> Option<&Field> {
        self.find_field(|field| (field.wire_name() == wire).then_some(field))
    }

    /// Resolves a type name through this type's registry.
    pub fn lookup(&self, name: &str) -> Result<Arc<ModelType>, ModelError> {
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| ModelError::RegistryMissing(self.name.clone()))?;
        Ok(Arc::clone(registry.get(name)?))
    }

    /// A fresh instance: nothing populated, defaults applied, no recorded
    /// changes.
    pub fn create(self: &Arc<Self>) -> Result<Instance, ModelError> {
        self.instantiate(None, false)
    }

    /// An instance populated from plain JSON.
    ///
    /// Every assigned field is recorded as changed; defaults fill the
    /// remaining fields afterwards, without change records. A type tag in
    /// the input redirects construction to the named subtype.
    pub fn from_value(self: &Arc<Self>, value: Value) -> Result<Instance, ModelError> {
        self.instantiate(Some(value), false)
    }

    /// An instance rehydrated from the wire.
    ///
    /// Fields match by wire name, defaults stay unapplied, and nothing is
    /// recorded as changed: the result compares and serializes like the
    /// instance that produced the payload.
    pub fn deserialize(self: &Arc<Self>, value: Value) -> Result<Instance, ModelError> {
        self.instantiate(Some(value), true)
    }

    fn instantiate(
        self: &Arc<Self>,
        input: Option<Value>,
        deserializing: bool,
    ) -> Result<Instance, ModelError> {
        let mut instance = Instance::empty(Arc::clone(self));
        if let Some(value) = input {
            let mut map = match value {
                Value::Object(map) => map,
                other => {
                    return Err(ModelError::TypeMismatch {
                        expected: format!("an object for type '{}'", self.name),
                        actual: json_kind(&other).to_string(),
                    })
                }
            };

            let tag = map
                .get(TYPE_TAG)
                .and_then(Value::as_str)
                .map(str::to_owned);
            if let Some(tag) = tag {
                if tag != self.name {
                    // The payload claims a more specific type; construction
                    // restarts there, provided it stays within this type's
                    // lineage.
                    let target = self.lookup(&tag)?;
                    if !target.is_of_type(&self.name) {
                        return Err(ModelError::TypeMismatch {
                            expected: format!("a type compatible with '{}'", self.name),
                            actual: format!("'{tag}'"),
                        });
                    }
                    map.remove(TYPE_TAG);
                    return target.instantiate(Some(Value::Object(map)), deserializing);
                }
            }

            for (key, raw) in map {
                if key == TYPE_TAG {
                    continue;
                }
                let field = if deserializing {
                    self.field_by_wire_name(&key)
                } else {
                    self.field(&key)
                };
                // Unknown keys pass through silently; peers may carry
                // fields this schema does not declare.
                if let Some(field) = field {
                    instance.assign(field, Raw::Value(raw), deserializing)?;
                }
            }
        }
        if !deserializing {
            instance.apply_defaults()?;
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use crate::registry::TypeDef;

    fn sample() -> Arc<ModelType> {
        TypeDef::new("Sample")
            .field(Field::new("alpha", FieldType::String))
            .field(Field::new("beta", FieldType::Number).serialized_name("b"))
            .field(Field::new("gamma", FieldType::Boolean))
            .build_standalone()
            .unwrap()
    }

    #[test]
    fn type_identity() {
        let ty = sample();
        assert_eq!(ty.name(), "Sample");
        assert!(ty.is_of_type("Sample"));
        assert!(ty.is_of_type("Model"));
        assert!(!ty.is_of_type("Other"));
    }

    #[test]
    fn find_field_short_circuits_in_declaration_order() {
        let ty = sample();
        let mut seen = Vec::new();
        let hit = ty.find_field(|field| {
            seen.push(field.name().to_string());
            (field.name() == "beta").then_some(field.name().to_string())
        });
        assert_eq!(hit.as_deref(), Some("beta"));
        assert_eq!(seen, ["alpha", "beta"]);
    }

    #[test]
    fn wire_name_lookup() {
        let ty = sample();
        assert_eq!(ty.field_by_wire_name("b").unwrap().name(), "beta");
        assert_eq!(ty.field_by_wire_name("alpha").unwrap().name(), "alpha");
        // The declared name of an overridden field is not a wire name.
        assert!(ty.field_by_wire_name("beta").is_none());
    }

    #[test]
    fn lookup_without_registry_fails() {
        let ty = sample();
        assert_eq!(
            ty.lookup("Sample").unwrap_err(),
            ModelError::RegistryMissing("Sample".to_string())
        );
    }

    #[test]
    fn construction_rejects_non_objects() {
        let ty = sample();
        assert_eq!(
            ty.from_value(serde_json::json!([1, 2])).unwrap_err(),
            ModelError::TypeMismatch {
                expected: "an object for type 'Sample'".to_string(),
                actual: "an array".to_string(),
            }
        );
    }
}
