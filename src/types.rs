//! Core types for schema translation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Collection used for named definitions when none is given.
pub const DEFAULT_COLLECTION: &str = "schemas";

/// The single collection used by the Swagger 2 dialect.
pub const DEFINITIONS_COLLECTION: &str = "definitions";

/// Marker placed on fragments that are required in at least one branch.
pub const REQUIRED_MARKER: &str = "x-required";

/// Default nesting limit for a single translation.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// OpenAPI 3: `#/components/<collection>/<name>` references, `nullable: true`.
    #[default]
    OpenApi3,
    /// Swagger 2: flat `#/definitions/<name>` references, `type: [t, "null"]`.
    Swagger2,
}

impl Dialect {
    /// Build the reference string for a definition.
    pub fn reference(&self, collection: &str, name: &str) -> String {
        match self {
            Dialect::OpenApi3 => format!("#/components/{}/{}", collection, name),
            Dialect::Swagger2 => format!("#/{}/{}", DEFINITIONS_COLLECTION, name),
        }
    }

    /// Collection a definition is stored under.
    ///
    /// Swagger 2 has no per-target collections, so everything lands in `definitions`.
    pub fn collection<'a>(&self, requested: &'a str) -> &'a str {
        match self {
            Dialect::OpenApi3 => requested,
            Dialect::Swagger2 => DEFINITIONS_COLLECTION,
        }
    }

    /// Parse a dialect name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "openapi3" => Some(Dialect::OpenApi3),
            "swagger2" => Some(Dialect::Swagger2),
            _ => None,
        }
    }
}

/// Presence of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presence {
    #[default]
    Optional,
    Required,
    /// The field must not appear; translation yields the omit sentinel.
    Forbidden,
}

impl Presence {
    /// Parse a presence value from a string.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "optional" => Some(Presence::Optional),
            "required" => Some(Presence::Required),
            "forbidden" => Some(Presence::Forbidden),
            _ => None,
        }
    }
}

/// How alternatives combine when translated into a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Exactly one branch matches (`oneOf`).
    One,
    /// At least one branch matches (`anyOf`).
    Any,
    /// Every branch matches (`allOf`).
    All,
}

impl MatchMode {
    /// The union keyword emitted for this mode.
    pub fn keyword(&self) -> &'static str {
        match self {
            MatchMode::One => "oneOf",
            MatchMode::Any => "anyOf",
            MatchMode::All => "allOf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one" => Some(MatchMode::One),
            "any" => Some(MatchMode::Any),
            "all" => Some(MatchMode::All),
            _ => None,
        }
    }
}

/// Union keywords, in the order they are inspected.
pub const UNION_KEYWORDS: &[&str] = &["oneOf", "anyOf", "allOf"];

/// Options for schema translation.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Output dialect.
    pub dialect: Dialect,
    /// When true, a union left with a single branch is replaced by that branch.
    pub unwrap_single_branch: bool,
    /// When true, two different fragments claiming the same definition name is an error.
    /// Otherwise the later one silently wins.
    pub strict_definitions: bool,
    /// When true, objects that do not allow unknown keys get `additionalProperties: false`.
    pub close_objects: bool,
    /// Maximum schema nesting depth before translation is aborted.
    pub max_depth: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslateOptions {
    /// Create options for the OpenAPI 3 dialect with single branches unwrapped.
    pub fn new() -> Self {
        Self {
            dialect: Dialect::OpenApi3,
            unwrap_single_branch: true,
            strict_definitions: false,
            close_objects: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn unwrap_single_branch(mut self, unwrap: bool) -> Self {
        self.unwrap_single_branch = unwrap;
        self
    }

    pub fn strict_definitions(mut self, strict: bool) -> Self {
        self.strict_definitions = strict;
        self
    }

    pub fn close_objects(mut self, close: bool) -> Self {
        self.close_objects = close;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
