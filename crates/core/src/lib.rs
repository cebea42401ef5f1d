//! Typed object modeling: type registries with inheritance, change-tracked
//! instances, masked serialization, and polymorphic deserialization.
//!
//! A [`Registry`] resolves declarative [`TypeDef`]s into immutable
//! [`ModelType`]s; a type extending another copies the parent's field table
//! at build time, so the hierarchy is flattened before the first instance
//! exists. [`Instance`]s own their field values, nested instances included.
//! The first write to a field since the last commit snapshots its prior
//! state, which makes [`commit`](Instance::commit) and
//! [`rollback`](Instance::rollback) recursive tree walks and keeps "what
//! changed" a local question.
//!
//! Serialization emits a type-tagged JSON object filtered by
//! [`SerializeOptions`]: by name, by change state, by ownership, or by a
//! [`FieldMask`] whose partial selections narrow nested instances.
//! Deserialization reads the tag back and dispatches through the registry,
//! so a payload rehydrates as the subtype it was serialized from.
//!
//! ```
//! use modelkit_core::{Field, FieldType, Registry, TypeDef};
//! use serde_json::json;
//!
//! let mut builder = Registry::builder();
//! builder.register(
//!     TypeDef::new("Note")
//!         .field(Field::new("title", FieldType::String))
//!         .field(Field::new("pinned", FieldType::Boolean).default_value(json!(false))),
//! )?;
//! let registry = builder.build()?;
//!
//! let mut note = registry.get("Note")?.create()?;
//! note.set("title", "first")?;
//! assert!(note.is_changed());
//!
//! let wire = note.serialize()?;
//! assert_eq!(wire, json!({ "_type": "Note", "title": "first", "pinned": false }));
//!
//! let copy = registry.deserialize(wire)?;
//! assert_eq!(copy, note);
//! assert!(!copy.is_changed());
//! # Ok::<(), modelkit_core::ModelError>(())
//! ```

pub mod constants;
pub mod error;
pub mod field;
pub mod instance;
pub mod model_type;
pub mod options;
pub mod registry;
pub mod util;
pub mod value;

pub use constants::{BASE_TYPE_NAME, DEFAULT_CHAIN_LIMIT, TYPE_TAG};
pub use error::ModelError;
pub use field::{DefaultValue, Field, FieldType};
pub use instance::Instance;
pub use model_type::ModelType;
pub use options::{FieldFilter, SerializeOptions};
pub use registry::{Registry, RegistryBuilder, TypeDef};
pub use value::{FieldValue, Raw};

pub use modelkit_field_mask::{FieldMask, FieldMaskError, Selection};
