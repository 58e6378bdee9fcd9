//! Converters for container kinds: arrays and objects.

use serde_json::{json, Map, Value};

use crate::error::TranslateError;
use crate::primitives::min_max;
use crate::registry::Components;
use crate::schema::{Rule, Schema};
use crate::translator::{absorb, translate_node, Context, Translation};
use crate::types::{REQUIRED_MARKER, UNION_KEYWORDS};

pub(crate) fn convert_array(
    schema: &Schema,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    let mut components = Components::new();
    let items = schema.item_schemas();

    let items_fragment = match schema.meta.swagger_index {
        Some(index) => {
            let Some(item) = items.get(index) else {
                return Err(TranslateError::MissingIndexedSchema {
                    container: "array",
                    index,
                    path: ctx.path.clone(),
                });
            };
            let result = translate_node(item, known, &ctx.descend("items")?)?;
            absorb(&mut components, &result.components, ctx.options)?;
            result.swagger.unwrap_or_else(|| json!({}))
        }
        None => {
            let child = ctx.descend("items")?;
            let mut fragments: Vec<Value> = Vec::new();
            for item in items {
                let view = known.merged(&components);
                let result = translate_node(item, &view, &child)?;
                absorb(&mut components, &result.components, ctx.options)?;

                let Some(fragment) = result.swagger else {
                    continue;
                };
                if !fragments.contains(&fragment) {
                    fragments.push(fragment);
                }
            }

            match fragments.len() {
                0 => json!({}),
                1 => fragments.remove(0),
                _ => json!({ "oneOf": fragments }),
            }
        }
    };

    let mut fragment = Map::new();
    fragment.insert("type".to_string(), json!("array"));
    fragment.extend(min_max(schema, "Items"));
    if schema.rules.contains(&Rule::Unique) {
        fragment.insert("uniqueItems".to_string(), Value::Bool(true));
    }
    fragment.insert("items".to_string(), items_fragment);

    Ok(Translation::new(Value::Object(fragment), components))
}

pub(crate) fn convert_object(
    schema: &Schema,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    let mut components = Components::new();
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for (key, child) in schema.properties() {
        let view = known.merged(&components);
        let result = translate_node(child, &view, &ctx.descend(format!("properties/{}", key))?)?;
        absorb(&mut components, &result.components, ctx.options)?;

        // Forbidden keys are left out of the documented shape entirely.
        let Some(mut property) = result.swagger else {
            continue;
        };

        let conditionally_required = take_required_marker(&mut property);
        if child.is_required() || conditionally_required {
            required.push(json!(key));
        }
        properties.insert(key.clone(), property);
    }

    let mut additional = None;
    if schema.properties().is_empty() {
        for (regex, value_schema) in schema.patterns() {
            let view = known.merged(&components);
            let child = ctx.descend(format!("patternProperties/{}", regex))?;
            let result = translate_node(value_schema, &view, &child)?;
            if let Some(fragment) = result.swagger {
                absorb(&mut components, &result.components, ctx.options)?;
                additional = Some(fragment);
                break;
            }
        }
    }

    let mut fragment = Map::new();
    fragment.insert("type".to_string(), json!("object"));
    if !required.is_empty() {
        fragment.insert("required".to_string(), Value::Array(required));
    }
    fragment.insert("properties".to_string(), Value::Object(properties));

    match additional {
        Some(pattern_schema) => {
            fragment.insert("additionalProperties".to_string(), pattern_schema);
        }
        None if ctx.options.close_objects && schema.flags.unknown != Some(true) => {
            fragment.insert("additionalProperties".to_string(), Value::Bool(false));
        }
        None => {}
    }

    Ok(Translation::new(Value::Object(fragment), components))
}

/// Consume the conditional-required marker from a property fragment.
///
/// Returns true when the fragment itself is marked, or is a union whose every
/// branch is marked. Markers are only removed when they make the property
/// required; partial markers stay on their branches.
pub(crate) fn take_required_marker(property: &mut Value) -> bool {
    let Value::Object(map) = property else {
        return false;
    };

    if map.get(REQUIRED_MARKER) == Some(&Value::Bool(true)) {
        map.remove(REQUIRED_MARKER);
        return true;
    }

    for keyword in UNION_KEYWORDS {
        let Some(Value::Array(branches)) = map.get_mut(*keyword) else {
            continue;
        };
        let all_marked = !branches.is_empty()
            && branches
                .iter()
                .all(|b| b.get(REQUIRED_MARKER) == Some(&Value::Bool(true)));
        if all_marked {
            for branch in branches.iter_mut() {
                if let Value::Object(branch) = branch {
                    branch.remove(REQUIRED_MARKER);
                }
            }
            return true;
        }
    }
    false
}
