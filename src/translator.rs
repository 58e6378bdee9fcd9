//! Schema translation - turns validation schemas into OpenAPI schema objects.
//!
//! Each node is translated depth-first. A call returns the node's fragment
//! plus only the components it discovered; callers merge those into their own
//! view before translating the next sibling, so a named schema is expanded
//! once and referenced everywhere after.

use std::fmt::Display;

use serde_json::{json, Map, Value};

use crate::alternatives::{convert_alternatives, convert_any, convert_whens};
use crate::description::parse_root;
use crate::error::TranslateError;
use crate::primitives::{
    convert_binary, convert_boolean, convert_date, convert_number, convert_string,
};
use crate::registry::Components;
use crate::schema::{BaseKind, DefaultValue, Schema};
use crate::structure::{convert_array, convert_object};
use crate::types::{Dialect, TranslateOptions, DEFAULT_COLLECTION};

/// Result of translating one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// The fragment, or `None` when the schema is forbidden and the field should be omitted.
    pub swagger: Option<Value>,
    /// Components discovered by this call, not including the ones passed in.
    pub components: Components,
}

impl Translation {
    pub(crate) fn new(swagger: Value, components: Components) -> Self {
        Self {
            swagger: Some(swagger),
            components,
        }
    }

    pub(crate) fn forbidden(components: Components) -> Self {
        Self {
            swagger: None,
            components,
        }
    }

    /// True when the schema translated to the omit sentinel.
    pub fn is_forbidden(&self) -> bool {
        self.swagger.is_none()
    }

    /// JSON form: `{"swagger": <fragment or false>, "components": {...}}`.
    pub fn to_value(&self) -> Value {
        json!({
            "swagger": self.swagger.clone().unwrap_or(Value::Bool(false)),
            "components": self.components.to_value(),
        })
    }
}

/// Translate a schema into an OpenAPI schema object.
///
/// `existing` holds components from earlier calls. Named schemas already
/// present there are emitted as references without being expanded again.
/// The returned components contain only new definitions; `existing` is not
/// modified.
///
/// # Errors
///
/// Returns `TranslateError` if a node has an unknown kind, selects a missing
/// item or branch, chains overrides, conflicts with another definition in
/// strict mode, or nests deeper than `options.max_depth`.
pub fn translate(
    schema: &Schema,
    existing: &Components,
    options: &TranslateOptions,
) -> Result<Translation, TranslateError> {
    let ctx = Context::root(options);
    translate_node(schema, existing, &ctx)
}

/// Translate a schema description (the JSON form of a [`Schema`]).
///
/// An object without a `type` key is read as a mapping of field names to
/// schema descriptions and translated as an object schema.
///
/// # Errors
///
/// Returns `TranslateError::InvalidInput` for `null`,
/// `TranslateError::NotASchema` for values that do not describe a schema, and
/// any error [`translate`] returns.
pub fn translate_value(
    value: &Value,
    existing: &Components,
    options: &TranslateOptions,
) -> Result<Translation, TranslateError> {
    let schema = parse_root(value)?;
    translate(&schema, existing, options)
}

/// Position of the walk: options, nesting depth and a JSON-pointer-like path.
pub(crate) struct Context<'a> {
    pub options: &'a TranslateOptions,
    pub depth: usize,
    pub path: String,
}

impl<'a> Context<'a> {
    fn root(options: &'a TranslateOptions) -> Self {
        Self {
            options,
            depth: 0,
            path: "#".to_string(),
        }
    }

    /// Context for a child node.
    pub fn descend(&self, segment: impl Display) -> Result<Context<'a>, TranslateError> {
        let path = format!("{}/{}", self.path, segment);
        if self.depth >= self.options.max_depth {
            return Err(TranslateError::RecursionLimit {
                limit: self.options.max_depth,
                path,
            });
        }
        Ok(Context {
            options: self.options,
            depth: self.depth + 1,
            path,
        })
    }
}

/// Merge components found by a child call into the caller's accumulator.
pub(crate) fn absorb(
    target: &mut Components,
    discovered: &Components,
    options: &TranslateOptions,
) -> Result<(), TranslateError> {
    if options.strict_definitions {
        target.merge_strict(discovered)
    } else {
        target.merge(discovered);
        Ok(())
    }
}

/// Translate one node against the components known so far.
pub(crate) fn translate_node(
    schema: &Schema,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    let dialect = ctx.options.dialect;
    let definition = schema.meta.class_name.as_deref().map(|name| {
        let target = schema
            .meta
            .class_target
            .as_deref()
            .unwrap_or(DEFAULT_COLLECTION);
        (dialect.collection(target), name)
    });

    if schema.meta.swagger_override {
        if let Some(fragment) = &schema.meta.swagger {
            let fragment = Value::Object(fragment.clone());
            return finish(fragment, Components::new(), definition, known, ctx);
        }
    }

    if let Some(replacement) = &schema.meta.replacement {
        if replacement.meta.replacement.is_some() {
            return Err(TranslateError::NestedOverrideNotAllowed {
                path: ctx.path.clone(),
            });
        }
        return translate_node(replacement, known, ctx);
    }

    // Strict mode expands known names to compare them, unless there is nothing to expand.
    if let Some((collection, name)) = definition {
        let reusable = !ctx.options.strict_definitions || schema.is_forbidden();
        if reusable && known.contains(collection, name) {
            tracing::trace!(collection, name, path = %ctx.path, "reusing definition");
            return Ok(Translation::new(reference(dialect, collection, name), Components::new()));
        }
    }

    if schema.is_forbidden() {
        tracing::debug!(path = %ctx.path, "omitting forbidden schema");
        return Ok(Translation::forbidden(Components::new()));
    }

    let Some(base) = schema.meta.base_type.or_else(|| schema.kind.base()) else {
        return Err(TranslateError::UnknownKind {
            kind: schema.kind.name().to_string(),
            path: ctx.path.clone(),
        });
    };

    let converted = match base {
        BaseKind::Any => convert_any(schema, known, ctx)?,
        _ if !schema.whens.is_empty() => convert_whens(schema, known, ctx)?,
        BaseKind::Number => Translation::new(convert_number(schema), Components::new()),
        BaseKind::String => Translation::new(convert_string(schema), Components::new()),
        BaseKind::Boolean => Translation::new(convert_boolean(schema), Components::new()),
        BaseKind::Date => Translation::new(convert_date(schema), Components::new()),
        BaseKind::Binary => Translation::new(convert_binary(schema), Components::new()),
        BaseKind::Array => convert_array(schema, known, ctx)?,
        BaseKind::Object => convert_object(schema, known, ctx)?,
        BaseKind::Alternatives => convert_alternatives(schema, known, ctx)?,
    };

    let Translation {
        swagger,
        components,
    } = converted;
    let Some(mut fragment) = swagger else {
        return Ok(Translation::forbidden(components));
    };

    if let Value::Object(map) = &mut fragment {
        decorate(map, schema, dialect);
    }

    finish(fragment, components, definition, known, ctx)
}

/// Store a named fragment and hand back a reference, or return the fragment as-is.
fn finish(
    fragment: Value,
    mut components: Components,
    definition: Option<(&str, &str)>,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    let Some((collection, name)) = definition else {
        return Ok(Translation::new(fragment, components));
    };

    let dialect = ctx.options.dialect;
    if ctx.options.strict_definitions {
        match known.get(collection, name) {
            Some(existing) if *existing == fragment => {
                return Ok(Translation::new(reference(dialect, collection, name), components));
            }
            Some(_) => {
                return Err(TranslateError::DuplicateDefinitionConflict {
                    collection: collection.to_string(),
                    name: name.to_string(),
                });
            }
            None => components.insert_strict(collection, name, fragment)?,
        }
    } else if known.contains(collection, name) {
        tracing::trace!(collection, name, path = %ctx.path, "reusing definition");
        return Ok(Translation::new(reference(dialect, collection, name), components));
    } else {
        components.insert(collection, name, fragment);
    }

    tracing::debug!(collection, name, path = %ctx.path, "stored definition");
    Ok(Translation::new(reference(dialect, collection, name), components))
}

fn reference(dialect: Dialect, collection: &str, name: &str) -> Value {
    json!({ "$ref": dialect.reference(collection, name) })
}

/// Apply node-level documentation: nullability, description, examples, title,
/// default and the non-exclusive override.
fn decorate(fragment: &mut Map<String, Value>, schema: &Schema, dialect: Dialect) {
    if schema.valids.iter().any(Value::is_null) {
        mark_nullable(fragment, dialect);
    }

    if let Some(description) = &schema.flags.description {
        fragment.insert("description".to_string(), json!(description));
    }

    match schema.examples.as_slice() {
        [] => {}
        [single] => {
            fragment.insert("example".to_string(), single.clone());
        }
        many => {
            fragment.insert("examples".to_string(), Value::Array(many.to_vec()));
        }
    }

    if let Some(label) = &schema.flags.label {
        fragment.insert("title".to_string(), json!(label));
    }

    // Generated defaults have no literal to document.
    if let Some(DefaultValue::Literal(value)) = &schema.flags.default {
        fragment.insert("default".to_string(), value.clone());
    }

    if !schema.meta.swagger_override {
        if let Some(extra) = &schema.meta.swagger {
            for (key, value) in extra {
                fragment.insert(key.clone(), value.clone());
            }
        }
    }
}

fn mark_nullable(fragment: &mut Map<String, Value>, dialect: Dialect) {
    match dialect {
        Dialect::OpenApi3 => {
            fragment.insert("nullable".to_string(), Value::Bool(true));
        }
        Dialect::Swagger2 => {
            // Untyped fragments already accept null.
            if let Some(Value::String(kind)) = fragment.get("type") {
                let types = json!([kind, "null"]);
                fragment.insert("type".to_string(), types);
            }
        }
    }
}
