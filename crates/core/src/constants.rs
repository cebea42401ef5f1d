//! Shared constants of the model engine.

/// Reserved wire key carrying an instance's type name.
pub const TYPE_TAG: &str = "_type";

/// Root marker every model type answers to in
/// [`is_of_type`](crate::ModelType::is_of_type) checks.
pub const BASE_TYPE_NAME: &str = "Model";

/// Upper bound on the number of links a default-value thunk chain may have
/// before resolution gives up.
pub const DEFAULT_CHAIN_LIMIT: usize = 32;
