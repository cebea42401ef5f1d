use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::constants::TYPE_TAG;
use crate::error::ModelError;
use crate::field::Field;
use crate::model_type::ModelType;
use crate::options::SerializeOptions;
use crate::util::find_from_one_or_many;
use crate::value::{FieldValue, Raw};

/// A mutable instance of a [`ModelType`].
///
/// An instance owns its field values, nested instances included, so commit
/// and rollback walk a tree rather than a graph. Mutation goes through
/// [`set`](Instance::set) or through a [`submodel_mut`](Instance::submodel_mut)
/// borrow; the first write to a field since the last commit snapshots the
/// field's prior state, and that snapshot is what [`rollback`](Instance::rollback)
/// restores and what marks the field changed.
#[derive(Debug, Clone)]
pub struct Instance {
    ty: Arc<ModelType>,
    field_values: IndexMap<String, FieldValue>,
    saved_field_values: IndexMap<String, Option<FieldValue>>,
}

impl PartialEq for Instance {
    /// Structural: same type name and equal current field values. Pending
    /// snapshots are not part of instance identity.
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name() && self.field_values == other.field_values
    }
}

impl Instance {
    pub(crate) fn empty(ty: Arc<ModelType>) -> Self {
        Self {
            ty,
            field_values: IndexMap::new(),
            saved_field_values: IndexMap::new(),
        }
    }

    pub fn model_type(&self) -> &Arc<ModelType> {
        &self.ty
    }

    pub fn is_of_type(&self, name: &str) -> bool {
        self.ty.is_of_type(name)
    }

    fn require_known(&self, name: &str) -> Result<(), ModelError> {
        if self.ty.field(name).is_none() {
            return Err(ModelError::UnknownField {
                type_name: self.ty.name().to_string(),
                field: name.to_string(),
            });
        }
        Ok(())
    }

    /// The stored value under a declared field, `None` while unset.
    pub fn get(&self, name: &str) -> Result<Option<&FieldValue>, ModelError> {
        self.require_known(name)?;
        Ok(self.field_values.get(name))
    }

    /// Assigns a declared field, coercing `raw` against the declared field
    /// type. The first assignment since the last commit snapshots the
    /// field's prior state.
    pub fn set(&mut self, name: &str, raw: impl Into<Raw>) -> Result<(), ModelError> {
        let ty = Arc::clone(&self.ty);
        let field = ty.field(name).ok_or_else(|| ModelError::UnknownField {
            type_name: ty.name().to_string(),
            field: name.to_string(),
        })?;
        self.assign(field, raw.into(), false)
    }

    pub(crate) fn assign(
        &mut self,
        field: &Field,
        raw: Raw,
        deserializing: bool,
    ) -> Result<(), ModelError> {
        let ty = Arc::clone(&self.ty);
        let value = field.create_value(raw, &ty, deserializing)?;
        let previous = self.field_values.insert(field.name().to_string(), value);
        if !deserializing && !self.saved_field_values.contains_key(field.name()) {
            // Only the first write records a snapshot; the pre-commit state
            // survives any number of further writes.
            self.saved_field_values
                .insert(field.name().to_string(), previous);
        }
        Ok(())
    }

    pub(crate) fn apply_defaults(&mut self) -> Result<(), ModelError> {
        let ty = Arc::clone(&self.ty);
        for field in ty.fields() {
            if self.field_values.contains_key(field.name()) || !field.has_default() {
                continue;
            }
            if let Some(raw) = field.resolve_default(ty.name())? {
                let value = field.create_value(Raw::Value(raw), &ty, false)?;
                // Defaults are construction state, not caller changes; they
                // bypass the snapshot protocol.
                self.field_values.insert(field.name().to_string(), value);
            }
        }
        Ok(())
    }

    /// The nested instance stored under a model-typed field.
    pub fn submodel(&self, name: &str) -> Result<Option<&Instance>, ModelError> {
        Ok(self.get(name)?.and_then(FieldValue::as_model))
    }

    /// Mutable access to a nested instance. Writes through the borrow are
    /// tracked by the nested instance itself and surface through
    /// [`is_changed`](Instance::is_changed) on every owner up the tree.
    pub fn submodel_mut(&mut self, name: &str) -> Result<Option<&mut Instance>, ModelError> {
        self.require_known(name)?;
        Ok(self
            .field_values
            .get_mut(name)
            .and_then(FieldValue::as_model_mut))
    }

    /// The nested instance at `index` of an array-typed field.
    pub fn submodel_at(&self, name: &str, index: usize) -> Result<Option<&Instance>, ModelError> {
        Ok(self
            .get(name)?
            .and_then(FieldValue::as_array)
            .and_then(|items| items.get(index))
            .and_then(FieldValue::as_model))
    }

    pub fn submodel_at_mut(
        &mut self,
        name: &str,
        index: usize,
    ) -> Result<Option<&mut Instance>, ModelError> {
        self.require_known(name)?;
        let Some(FieldValue::Array(items)) = self.field_values.get_mut(name) else {
            return Ok(None);
        };
        Ok(items.get_mut(index).and_then(FieldValue::as_model_mut))
    }

    /// Whether the field holds a pending snapshot, or a changed instance
    /// somewhere inside its value.
    pub fn field_is_changed(&self, name: &str) -> Result<bool, ModelError> {
        self.require_known(name)?;
        if self.saved_field_values.contains_key(name) {
            return Ok(true);
        }
        Ok(self
            .field_values
            .get(name)
            .is_some_and(contains_changed_submodel))
    }

    /// Whether anything in the owned tree changed since the last commit.
    pub fn is_changed(&self) -> bool {
        !self.saved_field_values.is_empty()
            || self.field_values.values().any(contains_changed_submodel)
    }

    /// Accepts the current state: drops every snapshot here, then commits
    /// every owned instance.
    pub fn commit(&mut self) {
        self.saved_field_values.clear();
        for value in self.field_values.values_mut() {
            each_submodel_mut(value, |submodel| submodel.commit());
        }
    }

    /// Restores every snapshot (unsetting fields that had none before their
    /// first write), then rolls back every owned instance. A nested
    /// instance may hold its own uncommitted changes even when the field
    /// holding it was never reassigned.
    pub fn rollback(&mut self) {
        let saved = std::mem::take(&mut self.saved_field_values);
        for (name, previous) in saved {
            match previous {
                Some(value) => {
                    self.field_values.insert(name, value);
                }
                None => {
                    self.field_values.shift_remove(&name);
                }
            }
        }
        for value in self.field_values.values_mut() {
            each_submodel_mut(value, |submodel| submodel.rollback());
        }
    }

    /// Serializes with default options: every field, no undefined entries.
    pub fn serialize(&self) -> Result<Value, ModelError> {
        self.serialize_with(&SerializeOptions::default())
    }

    /// Produces the wire object: the type tag first, then every included
    /// field under its wire name, in declaration order.
    pub fn serialize_with(&self, options: &SerializeOptions) -> Result<Value, ModelError> {
        let mut out = Map::new();
        out.insert(
            TYPE_TAG.to_string(),
            Value::String(self.ty.name().to_string()),
        );
        for field in self.ty.fields() {
            let name = field.name();
            let include = options.include_fields.selects(name)
                || (options.include_changed_fields && self.field_is_changed(name)?)
                || (options.include_owned_fields && field.is_owned());
            if !include {
                continue;
            }
            match self.field_values.get(name) {
                Some(value) => {
                    let nested = options.nested_for(name);
                    let serialized = field.serialize_value(value, &nested)?;
                    out.insert(field.wire_name().to_string(), serialized);
                }
                None => {
                    if options.include_undefined_fields {
                        out.insert(field.wire_name().to_string(), Value::Null);
                    }
                }
            }
        }
        Ok(Value::Object(out))
    }

    /// A structural copy through the wire form: serialize with default
    /// options, rehydrate on the same type. The copy reports no pending
    /// changes.
    pub fn duplicate(&self) -> Result<Instance, ModelError> {
        let wire = self.serialize()?;
        self.ty.deserialize(wire)
    }
}

fn contains_changed_submodel(value: &FieldValue) -> bool {
    find_from_one_or_many(value.as_slice(), |element| match element {
        FieldValue::Model(instance) if instance.is_changed() => Some(()),
        _ => None,
    })
    .is_some()
}

fn each_submodel_mut(value: &mut FieldValue, mut f: impl FnMut(&mut Instance)) {
    match value {
        FieldValue::Model(instance) => f(instance),
        FieldValue::Array(items) => {
            for item in items {
                if let FieldValue::Model(instance) = item {
                    f(instance);
                }
            }
        }
        FieldValue::Json(_) => {}
    }
}
