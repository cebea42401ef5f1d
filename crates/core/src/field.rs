use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::constants::DEFAULT_CHAIN_LIMIT;
use crate::error::ModelError;
use crate::model_type::ModelType;
use crate::options::SerializeOptions;
use crate::value::{json_kind, FieldValue, Raw};

/// Declared value type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Any JSON value or instance, stored verbatim.
    Any,
    Boolean,
    Number,
    String,
    /// A nested model, named by its registered type tag. Accepts any
    /// registered subtype of the named type.
    Model(String),
    /// An array whose elements share one declared type.
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn model(tag: impl Into<String>) -> Self {
        FieldType::Model(tag.into())
    }

    pub fn array(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }

    fn expectation(&self) -> String {
        match self {
            FieldType::Any => "any value".to_string(),
            FieldType::Boolean => "a boolean".to_string(),
            FieldType::Number => "a number".to_string(),
            FieldType::String => "a string".to_string(),
            FieldType::Model(tag) => format!("an instance of '{tag}'"),
            FieldType::Array(element) => format!("an array of {}", element.expectation()),
        }
    }
}

/// A field default: a concrete JSON value, or a thunk yielding the next link
/// of a resolve chain (`None` ends the chain with no default).
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Thunk(Arc<dyn Fn() -> Option<DefaultValue> + Send + Sync>),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

/// Descriptor for one declared field: name, wire name, declared type,
/// optional default, and the ownership flag.
///
/// Built fluently and handed to [`TypeDef::field`](crate::TypeDef::field):
///
/// ```
/// use modelkit_core::{Field, FieldType};
/// use serde_json::json;
///
/// let field = Field::new("display_name", FieldType::String)
///     .serialized_name("displayName")
///     .default_value(json!("anonymous"));
/// assert_eq!(field.name(), "display_name");
/// assert_eq!(field.wire_name(), "displayName");
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    serialized_name: Option<String>,
    field_type: FieldType,
    default: Option<DefaultValue>,
    is_owned: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            serialized_name: None,
            field_type,
            default: None,
            is_owned: false,
        }
    }

    /// Wire key override; the declared name is used on the wire when absent.
    pub fn serialized_name(mut self, wire: impl Into<String>) -> Self {
        self.serialized_name = Some(wire.into());
        self
    }

    /// Owned fields ride along whenever an owned-fields serialization policy
    /// is active, independent of selection and change state.
    pub fn owned(mut self) -> Self {
        self.is_owned = true;
        self
    }

    /// A concrete default, applied at construction when the field was not
    /// populated.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Value(value));
        self
    }

    /// A lazy default: the thunk runs at construction and may chain into
    /// further thunks.
    pub fn default_with<F>(mut self, thunk: F) -> Self
    where
        F: Fn() -> Option<DefaultValue> + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Thunk(Arc::new(thunk)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wire_name(&self) -> &str {
        self.serialized_name.as_deref().unwrap_or(&self.name)
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_owned(&self) -> bool {
        self.is_owned
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Walks the default chain: a value terminates, a thunk yields the next
    /// link, `None` terminates with no default. Chains longer than
    /// [`DEFAULT_CHAIN_LIMIT`] fail with
    /// [`ModelError::DefaultChainTooDeep`].
    pub fn resolve_default(&self, type_name: &str) -> Result<Option<Value>, ModelError> {
        let mut current = self.default.clone();
        for _ in 0..DEFAULT_CHAIN_LIMIT {
            match current {
                None => return Ok(None),
                Some(DefaultValue::Value(value)) => return Ok(Some(value)),
                Some(DefaultValue::Thunk(thunk)) => current = thunk(),
            }
        }
        Err(ModelError::DefaultChainTooDeep {
            type_name: type_name.to_string(),
            field: self.name.clone(),
        })
    }

    /// Coerces raw assignment input into this field's typed representation.
    ///
    /// `owner` is the type declaring the field; model-typed fields resolve
    /// their target type through its registry. During deserialization,
    /// nested objects rehydrate without defaults or change records.
    pub fn create_value(
        &self,
        raw: Raw,
        owner: &ModelType,
        deserializing: bool,
    ) -> Result<FieldValue, ModelError> {
        create_typed(&self.field_type, raw, owner, deserializing)
    }

    /// Serializes a stored value back to plain JSON; nested instances apply
    /// `options` recursively.
    pub fn serialize_value(
        &self,
        value: &FieldValue,
        options: &SerializeOptions,
    ) -> Result<Value, ModelError> {
        serialize_typed(value, options)
    }
}

fn create_typed(
    field_type: &FieldType,
    raw: Raw,
    owner: &ModelType,
    deserializing: bool,
) -> Result<FieldValue, ModelError> {
    match field_type {
        FieldType::Any => Ok(match raw {
            Raw::Value(value) => FieldValue::Json(value),
            Raw::Model(instance) => FieldValue::Model(Box::new(instance)),
        }),
        FieldType::Boolean | FieldType::Number | FieldType::String => {
            let Raw::Value(value) = raw else {
                return Err(mismatch(field_type, "a model instance"));
            };
            let fits = match (field_type, &value) {
                (_, Value::Null) => true,
                (FieldType::Boolean, Value::Bool(_)) => true,
                (FieldType::Number, Value::Number(_)) => true,
                (FieldType::String, Value::String(_)) => true,
                _ => false,
            };
            if fits {
                Ok(FieldValue::Json(value))
            } else {
                Err(mismatch(field_type, json_kind(&value)))
            }
        }
        FieldType::Model(tag) => match raw {
            Raw::Model(instance) => {
                if instance.is_of_type(tag) {
                    Ok(FieldValue::Model(Box::new(instance)))
                } else {
                    Err(ModelError::TypeMismatch {
                        expected: format!("an instance of '{tag}'"),
                        actual: format!("an instance of '{}'", instance.model_type().name()),
                    })
                }
            }
            Raw::Value(Value::Null) => Ok(FieldValue::Json(Value::Null)),
            Raw::Value(value @ Value::Object(_)) => {
                let target = owner.lookup(tag)?;
                let instance = if deserializing {
                    target.deserialize(value)?
                } else {
                    target.from_value(value)?
                };
                Ok(FieldValue::Model(Box::new(instance)))
            }
            Raw::Value(other) => Err(mismatch(field_type, json_kind(&other))),
        },
        FieldType::Array(element) => match raw {
            Raw::Value(Value::Null) => Ok(FieldValue::Json(Value::Null)),
            Raw::Value(Value::Array(items)) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(create_typed(element, Raw::Value(item), owner, deserializing)?);
                }
                Ok(FieldValue::Array(values))
            }
            Raw::Value(other) => Err(mismatch(field_type, json_kind(&other))),
            Raw::Model(_) => Err(mismatch(field_type, "a model instance")),
        },
    }
}

fn serialize_typed(value: &FieldValue, options: &SerializeOptions) -> Result<Value, ModelError> {
    match value {
        FieldValue::Json(json) => Ok(json.clone()),
        FieldValue::Model(instance) => instance.serialize_with(options),
        FieldValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(serialize_typed(item, options)?);
            }
            Ok(Value::Array(out))
        }
    }
}

fn mismatch(field_type: &FieldType, actual: &str) -> ModelError {
    ModelError::TypeMismatch {
        expected: field_type.expectation(),
        actual: actual.to_string(),
    }
}
