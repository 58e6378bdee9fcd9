//! Validation Schema to OpenAPI
//!
//! Translates validation-rule schema trees into OpenAPI 3 (or Swagger 2)
//! Schema Objects, collecting named schemas into a reusable component registry.
//!
//! # Example
//!
//! ```
//! use validation_swagger::{translate, Components, Schema, TranslateOptions};
//! use serde_json::json;
//!
//! let user = Schema::object()
//!     .key("id", Schema::number().integer().required())
//!     .key("email", Schema::string().email().class_name("Email"));
//!
//! let result = translate(&user, &Components::new(), &TranslateOptions::default()).unwrap();
//!
//! // Named schemas are stored once and referenced
//! assert_eq!(
//!     result.swagger.unwrap()["properties"]["email"],
//!     json!({ "$ref": "#/components/schemas/Email" })
//! );
//! assert!(result.components.contains("schemas", "Email"));
//! ```
//!
//! # Registry Threading
//!
//! Each call returns only the components it discovered. Pass the accumulated
//! registry to later calls so shared schemas are expanded once:
//!
//! | Input registry | Named node | Result |
//! |----------------|------------|--------|
//! | name absent | `className: "Email"` | fragment stored, `$ref` returned |
//! | name present | `className: "Email"` | `$ref` returned, nothing stored |
//! | any | no `className` | fragment returned inline |
//!
//! # Description Format
//!
//! Schemas can also be given in their JSON description form, see
//! [`description`] and [`translate_value`].

mod alternatives;
pub mod description;
mod error;
mod loader;
mod primitives;
mod registry;
mod schema;
mod structure;
mod translator;
mod types;

pub use error::{LoadError, TranslateError};
pub use loader::{
    load_components, load_description, load_description_str, load_json, load_json_str,
};
pub use registry::Components;
pub use schema::{
    BaseKind, Case, Conditional, DefaultValue, Flags, Kind, Match, Meta, Rule, Schema, Sign,
    SwitchCase,
};
pub use translator::{translate, translate_value, Translation};
pub use types::{
    json_type_name, Dialect, MatchMode, Presence, TranslateOptions, DEFAULT_COLLECTION,
    DEFAULT_MAX_DEPTH, DEFINITIONS_COLLECTION, REQUIRED_MARKER,
};
