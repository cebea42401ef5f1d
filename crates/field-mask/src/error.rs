use thiserror::Error;

/// Errors produced by field mask operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldMaskError {
    /// Field names are non-empty strings.
    #[error("invalid field name: must be a non-empty string")]
    InvalidName,

    /// A wire value contained something other than `true` or a nested
    /// object. The payload is the dotted path of the offending entry.
    #[error("invalid field mask structure at '{0}'")]
    InvalidStructure(String),

    /// Two masks disagree about whether a field is selected whole or
    /// partially. The payload is the dotted path of the conflicting entry.
    #[error("incompatible field masks at '{0}': whole selection on one side, partial on the other")]
    IncompatibleMasks(String),
}
