use serde_json::Value;

use crate::instance::Instance;

/// A typed value stored on an instance field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain JSON: scalars, `null`, and verbatim `Any` data.
    Json(Value),
    /// A nested instance, owned by the field holding it.
    Model(Box<Instance>),
    /// The elements of an array-typed field.
    Array(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Instance> {
        match self {
            FieldValue::Model(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_model_mut(&mut self) -> Option<&mut Instance> {
        match self {
            FieldValue::Model(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// One-or-many view: an array yields its elements, anything else is a
    /// one-element slice of itself.
    pub fn as_slice(&self) -> &[FieldValue] {
        match self {
            FieldValue::Array(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

/// Raw assignment input: plain JSON, or an already constructed instance.
#[derive(Debug, Clone)]
pub enum Raw {
    Value(Value),
    Model(Instance),
}

impl From<Value> for Raw {
    fn from(value: Value) -> Self {
        Raw::Value(value)
    }
}

impl From<Instance> for Raw {
    fn from(instance: Instance) -> Self {
        Raw::Model(instance)
    }
}

impl From<bool> for Raw {
    fn from(v: bool) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<i32> for Raw {
    fn from(v: i32) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<i64> for Raw {
    fn from(v: i64) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<f64> for Raw {
    fn from(v: f64) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<&str> for Raw {
    fn from(v: &str) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<String> for Raw {
    fn from(v: String) -> Self {
        Raw::Value(Value::from(v))
    }
}

/// Human-readable JSON kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
