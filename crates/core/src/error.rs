use modelkit_field_mask::FieldMaskError;
use thiserror::Error;

/// Errors produced by type registration, instance construction, and
/// serialization.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// A value did not fit where it was used: a field assignment against the
    /// declared field type, a non-object construction input, or a wire tag
    /// naming a type outside the expected lineage.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A field name was declared twice on the same type, inherited fields
    /// included.
    #[error("field '{field}' is already defined on type '{type_name}'")]
    DuplicateField { type_name: String, field: String },

    /// Two registered types share a name.
    #[error("type '{0}' is already registered")]
    DuplicateType(String),

    /// A type tag with no registered type behind it.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// A tag lookup on a type whose registry is gone or was never installed.
    #[error("type '{0}' has no registry to resolve type tags through")]
    RegistryMissing(String),

    /// A field access under a name the type does not declare.
    #[error("type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    /// A reserved or empty type name.
    #[error("invalid type name '{0}'")]
    InvalidTypeName(String),

    /// A field declaration the type system cannot honor.
    #[error("invalid field '{field}' on type '{type_name}': {reason}")]
    InvalidFieldName {
        type_name: String,
        field: String,
        reason: &'static str,
    },

    /// A default-value thunk chain that never terminated within the
    /// resolution step limit.
    #[error("default value chain for field '{field}' on type '{type_name}' did not terminate")]
    DefaultChainTooDeep { type_name: String, field: String },

    /// A field mask error surfaced through serialization options.
    #[error(transparent)]
    Mask(#[from] FieldMaskError),
}
