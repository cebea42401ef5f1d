use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde_json::Value;

use crate::constants::{BASE_TYPE_NAME, TYPE_TAG};
use crate::error::ModelError;
use crate::field::Field;
use crate::instance::Instance;
use crate::model_type::ModelType;
use crate::value::json_kind;

/// Declarative definition of a model type, resolved by a
/// [`RegistryBuilder`] or, for registry-free use, by
/// [`TypeDef::build_standalone`].
#[derive(Debug, Clone)]
pub struct TypeDef {
    name: String,
    parent: Option<String>,
    fields: Vec<Field>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    /// A definition extending a previously registered parent. The parent
    /// contributes its whole field table, in declaration order, ahead of the
    /// fields declared here.
    pub fn extends(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves this definition without a registry.
    ///
    /// Extension needs the parent's resolved table, so `extends` definitions
    /// are rejected. Model-typed fields stay declarable, but resolving their
    /// target type later fails with [`ModelError::RegistryMissing`].
    pub fn build_standalone(self) -> Result<Arc<ModelType>, ModelError> {
        check_type_name(&self.name)?;
        if let Some(parent) = self.parent {
            return Err(ModelError::UnknownType(parent));
        }
        let fields = resolve_fields(&self.name, None, &self.fields)?;
        let lineage = vec![self.name.clone()];
        Ok(Arc::new(ModelType::new(
            self.name,
            lineage,
            fields,
            Weak::new(),
        )))
    }
}

/// Accumulates type definitions and resolves them into an immutable
/// [`Registry`].
///
/// Definitions resolve in registration order, so parents register before
/// the types extending them.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: Vec<TypeDef>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a definition; names are unique across one registry.
    pub fn register(&mut self, def: TypeDef) -> Result<&mut Self, ModelError> {
        if self.defs.iter().any(|d| d.name == def.name) {
            return Err(ModelError::DuplicateType(def.name));
        }
        self.defs.push(def);
        Ok(self)
    }

    pub fn build(self) -> Result<Arc<Registry>, ModelError> {
        let mut resolved: IndexMap<String, (Vec<String>, IndexMap<String, Field>)> =
            IndexMap::new();
        for def in &self.defs {
            check_type_name(&def.name)?;
            let (parent_lineage, parent_fields) = match &def.parent {
                None => (Vec::new(), None),
                Some(parent) => {
                    let (lineage, fields) = resolved
                        .get(parent)
                        .ok_or_else(|| ModelError::UnknownType(parent.clone()))?;
                    (lineage.clone(), Some(fields.clone()))
                }
            };
            let fields = resolve_fields(&def.name, parent_fields.as_ref(), &def.fields)?;
            let mut lineage = Vec::with_capacity(parent_lineage.len() + 1);
            lineage.push(def.name.clone());
            lineage.extend(parent_lineage);
            resolved.insert(def.name.clone(), (lineage, fields));
        }
        // The registry owns its types while every type points back through a
        // weak reference, so dropping the last outside Arc frees the whole
        // graph.
        Ok(Arc::new_cyclic(|registry: &Weak<Registry>| {
            let mut types = IndexMap::new();
            for (name, (lineage, fields)) in resolved {
                let ty = Arc::new(ModelType::new(name.clone(), lineage, fields, registry.clone()));
                types.insert(name, ty);
            }
            Registry { types }
        }))
    }
}

/// Immutable mapping from type name to [`ModelType`], shared via `Arc`.
#[derive(Debug)]
pub struct Registry {
    types: IndexMap<String, Arc<ModelType>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Result<&Arc<ModelType>, ModelError> {
        self.types
            .get(name)
            .ok_or_else(|| ModelError::UnknownType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered types, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<ModelType>> + '_ {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Polymorphic deserialization: dispatches on the payload's own type
    /// tag, with no expected type constraining the result.
    pub fn deserialize(&self, value: Value) -> Result<Instance, ModelError> {
        let tag = match value.as_object().and_then(|map| map.get(TYPE_TAG)) {
            Some(Value::String(tag)) => tag.clone(),
            _ => {
                return Err(ModelError::TypeMismatch {
                    expected: "an object carrying a string type tag".to_string(),
                    actual: json_kind(&value).to_string(),
                })
            }
        };
        self.get(&tag)?.deserialize(value)
    }
}

fn check_type_name(name: &str) -> Result<(), ModelError> {
    // The root marker would make every instance claim the name, and an
    // empty name can never round-trip through a type tag.
    if name.is_empty() || name == BASE_TYPE_NAME {
        return Err(ModelError::InvalidTypeName(name.to_string()));
    }
    Ok(())
}

fn resolve_fields(
    type_name: &str,
    parent: Option<&IndexMap<String, Field>>,
    own: &[Field],
) -> Result<IndexMap<String, Field>, ModelError> {
    // The inherited table is copied, never shared: a field defined on a
    // subtype cannot leak into its ancestors.
    let mut fields = parent.cloned().unwrap_or_default();
    for field in own {
        if field.name().is_empty() {
            return Err(ModelError::InvalidFieldName {
                type_name: type_name.to_string(),
                field: field.name().to_string(),
                reason: "field names must be non-empty",
            });
        }
        if field.name() == TYPE_TAG || field.wire_name() == TYPE_TAG {
            return Err(ModelError::InvalidFieldName {
                type_name: type_name.to_string(),
                field: field.name().to_string(),
                reason: "the type tag key is reserved",
            });
        }
        if fields.contains_key(field.name()) {
            return Err(ModelError::DuplicateField {
                type_name: type_name.to_string(),
                field: field.name().to_string(),
            });
        }
        fields.insert(field.name().to_string(), field.clone());
    }
    Ok(fields)
}
