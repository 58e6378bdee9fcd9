//! Schema descriptions - the JSON form of a [`Schema`].
//!
//! The layout follows the upstream validation library's own `describe()`
//! output, so described schemas can be exported from an existing API and
//! documented without rewriting them:
//!
//! ```json
//! {
//!   "type": "object",
//!   "flags": { "presence": "required" },
//!   "metas": [{ "className": "User" }],
//!   "keys": {
//!     "id": { "type": "number", "rules": [{ "name": "integer" }] },
//!     "email": { "type": "string", "rules": [{ "name": "email" }] }
//!   }
//! }
//! ```
//!
//! Rules with no documentation counterpart (`trim`, `normalize`, ...) are
//! accepted and ignored.

use serde_json::{Map, Number, Value};

use crate::error::TranslateError;
use crate::schema::{
    BaseKind, Case, Conditional, DefaultValue, Kind, Match, Meta, Rule, Schema, Sign, SwitchCase,
};
use crate::types::{json_type_name, MatchMode, Presence};

/// Parse the top-level input of a translation.
///
/// `null` is a missing schema. An object without a `type` key is a mapping of
/// field names to schema descriptions.
///
/// # Errors
///
/// Returns `TranslateError::InvalidInput` for `null`, `TranslateError::NotASchema`
/// for values that are neither a description nor a mapping, and
/// `TranslateError::InvalidDescription` for malformed descriptions.
pub fn parse_root(value: &Value) -> Result<Schema, TranslateError> {
    match value {
        Value::Null => Err(TranslateError::InvalidInput),
        Value::Object(map) if !map.contains_key("type") => {
            let mut keys = Vec::with_capacity(map.len());
            for (name, child) in map {
                let schema = parse_schema(child, &format!("#/{}", name))?;
                keys.push((name.clone(), schema));
            }
            Ok(keys.into_iter().collect())
        }
        other => parse_schema(other, "#"),
    }
}

/// Parse a single schema description.
///
/// # Errors
///
/// Returns `TranslateError::NotASchema` if the value is not an object with a
/// string `type`, and `TranslateError::InvalidDescription` for malformed parts.
pub fn parse_schema(value: &Value, path: &str) -> Result<Schema, TranslateError> {
    let Some(map) = value.as_object() else {
        return Err(TranslateError::NotASchema {
            path: path.to_string(),
            actual: json_type_name(value).to_string(),
        });
    };
    let Some(type_name) = map.get("type").and_then(Value::as_str) else {
        return Err(TranslateError::NotASchema {
            path: path.to_string(),
            actual: "object without a type".to_string(),
        });
    };

    let kind = parse_kind(type_name, map, path)?;
    let mut schema = Schema::new(kind);

    if let Some(flags) = map.get("flags") {
        parse_flags(&mut schema, flags, &format!("{}/flags", path))?;
    }

    if let Some(prefs) = map.get("preferences") {
        schema.strict = prefs.get("convert") == Some(&Value::Bool(false));
    }

    for (i, rule) in array_field(map, "rules", path)?.iter().enumerate() {
        if let Some(rule) = parse_rule(rule, &format!("{}/rules/{}", path, i))? {
            schema.rules.push(rule);
        }
    }

    schema.valids = array_field(map, "allow", path)?.to_vec();
    schema.invalids = array_field(map, "invalid", path)?.to_vec();
    schema.examples = array_field(map, "examples", path)?.to_vec();

    let metas = array_field(map, "metas", path)?;
    if !metas.is_empty() {
        schema.meta = parse_metas(metas, &format!("{}/metas", path))?;
    }

    for (i, when) in array_field(map, "whens", path)?.iter().enumerate() {
        let condition = parse_conditional(when, &format!("{}/whens/{}", path, i))?;
        schema = schema.when(condition);
    }

    Ok(schema)
}

fn parse_kind(type_name: &str, map: &Map<String, Value>, path: &str) -> Result<Kind, TranslateError> {
    let Some(base) = BaseKind::parse(type_name) else {
        return Ok(Kind::Extension {
            name: type_name.to_string(),
        });
    };

    let kind = match base {
        BaseKind::Any => Kind::Any,
        BaseKind::Number => Kind::Number,
        BaseKind::String => Kind::String,
        BaseKind::Boolean => Kind::Boolean,
        BaseKind::Date => Kind::Date,
        BaseKind::Binary => Kind::Binary,
        BaseKind::Array => {
            let mut items = Vec::new();
            for (i, item) in array_field(map, "items", path)?.iter().enumerate() {
                items.push(parse_schema(item, &format!("{}/items/{}", path, i))?);
            }
            Kind::Array { items }
        }
        BaseKind::Object => {
            let mut keys = Vec::new();
            match map.get("keys") {
                None | Some(Value::Null) => {}
                Some(Value::Object(children)) => {
                    for (name, child) in children {
                        let schema = parse_schema(child, &format!("{}/keys/{}", path, name))?;
                        keys.push((name.clone(), schema));
                    }
                }
                Some(other) => return Err(wrong_type(&format!("{}/keys", path), "an object", other)),
            }

            let mut patterns = Vec::new();
            for (i, entry) in array_field(map, "patterns", path)?.iter().enumerate() {
                let entry_path = format!("{}/patterns/{}", path, i);
                let Some(regex) = entry.get("regex").and_then(Value::as_str) else {
                    return Err(invalid(&entry_path, "pattern entry needs a string regex"));
                };
                let Some(rule) = entry.get("rule") else {
                    return Err(invalid(&entry_path, "pattern entry needs a rule schema"));
                };
                let schema = parse_schema(rule, &format!("{}/rule", entry_path))?;
                patterns.push((strip_regex_delimiters(regex).to_string(), schema));
            }
            Kind::Object { keys, patterns }
        }
        BaseKind::Alternatives => {
            let mut matches = Vec::new();
            for (i, entry) in array_field(map, "matches", path)?.iter().enumerate() {
                let entry_path = format!("{}/matches/{}", path, i);
                match entry.get("schema") {
                    Some(schema) => matches.push(Match::Schema(parse_schema(
                        schema,
                        &format!("{}/schema", entry_path),
                    )?)),
                    None => matches.push(Match::Conditional(parse_conditional(entry, &entry_path)?)),
                }
            }
            let mode = match map.get("flags").and_then(|f| f.get("match")) {
                None => None,
                Some(Value::String(s)) => Some(MatchMode::parse(s).ok_or_else(|| {
                    invalid(
                        &format!("{}/flags/match", path),
                        &format!("unknown match mode \"{}\": expected one, any, or all", s),
                    )
                })?),
                Some(other) => {
                    return Err(wrong_type(&format!("{}/flags/match", path), "a string", other))
                }
            };
            Kind::Alternatives { matches, mode }
        }
    };
    Ok(kind)
}

fn parse_flags(schema: &mut Schema, flags: &Value, path: &str) -> Result<(), TranslateError> {
    let Some(flags) = flags.as_object() else {
        return Err(wrong_type(path, "an object", flags));
    };

    for (key, value) in flags {
        let flag_path = format!("{}/{}", path, key);
        match key.as_str() {
            "presence" => {
                let name = expect_str(value, &flag_path)?;
                schema.flags.presence = Presence::parse(name).ok_or_else(|| {
                    invalid(
                        &flag_path,
                        &format!(
                            "unknown presence \"{}\": expected optional, required, or forbidden",
                            name
                        ),
                    )
                })?;
            }
            "description" => schema.flags.description = Some(expect_str(value, &flag_path)?.to_string()),
            "label" => schema.flags.label = Some(expect_str(value, &flag_path)?.to_string()),
            "default" => schema.flags.default = Some(DefaultValue::Literal(value.clone())),
            "defaultGenerator" => {
                let name = expect_str(value, &flag_path)?;
                schema.flags.default = Some(DefaultValue::Generator(name.to_string()));
            }
            "unknown" => schema.flags.unknown = Some(expect_bool(value, &flag_path)?),
            "encoding" => schema.flags.encoding = Some(expect_str(value, &flag_path)?.to_string()),
            "format" => schema.flags.format = Some(expect_str(value, &flag_path)?.to_string()),
            "only" => schema.flags.only = expect_bool(value, &flag_path)?,
            // Read with the alternatives kind; other flags have no documentation counterpart.
            _ => {}
        }
    }
    Ok(())
}

/// Parse one rule. Returns `None` for rules that do not affect documentation.
fn parse_rule(value: &Value, path: &str) -> Result<Option<Rule>, TranslateError> {
    let Some(name) = value.get("name").and_then(Value::as_str) else {
        return Err(invalid(path, "rule needs a string name"));
    };
    let args = value.get("args");
    let arg = |key: &str| args.and_then(|a| a.get(key));

    let rule = match name {
        "min" | "max" | "length" => {
            let limit = limit_arg(arg("limit"), path)?;
            match name {
                "min" => Rule::Min(limit),
                "max" => Rule::Max(limit),
                _ => Rule::Length(limit),
            }
        }
        "integer" => Rule::Integer,
        "precision" => {
            let digits = arg("limit").and_then(Value::as_u64).unwrap_or(0);
            Rule::Precision(u32::try_from(digits).unwrap_or(u32::MAX))
        }
        "sign" => match arg("sign").and_then(Value::as_str) {
            Some("positive") => Rule::Sign(Sign::Positive),
            Some("negative") => Rule::Sign(Sign::Negative),
            _ => return Err(invalid(path, "sign rule needs sign: positive or negative")),
        },
        "positive" => Rule::Sign(Sign::Positive),
        "negative" => Rule::Sign(Sign::Negative),
        "alphanum" => Rule::Alphanum,
        "token" => Rule::Token,
        "case" => match arg("direction").and_then(Value::as_str) {
            Some("lower") => Rule::Case(Case::Lower),
            Some("upper") => Rule::Case(Case::Upper),
            _ => return Err(invalid(path, "case rule needs direction: lower or upper")),
        },
        "email" => Rule::Email,
        "isoDate" => Rule::IsoDate,
        "guid" | "uuid" => Rule::Uuid,
        "pattern" | "regex" => {
            let Some(source) = arg("regex").and_then(Value::as_str) else {
                return Err(invalid(path, "pattern rule needs a string regex"));
            };
            Rule::Pattern(strip_regex_delimiters(source).to_string())
        }
        "unique" => Rule::Unique,
        other => {
            tracing::trace!(rule = other, path, "ignoring rule without documentation counterpart");
            return Ok(None);
        }
    };
    Ok(Some(rule))
}

fn limit_arg(value: Option<&Value>, path: &str) -> Result<Number, TranslateError> {
    match value {
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(other) => Err(wrong_type(&format!("{}/args/limit", path), "a number", other)),
        None => Err(invalid(path, "rule needs a numeric limit")),
    }
}

/// Flatten meta objects left to right, later keys overwriting earlier ones.
fn parse_metas(metas: &[Value], path: &str) -> Result<Meta, TranslateError> {
    let mut flattened = Map::new();
    for (i, meta) in metas.iter().enumerate() {
        let Some(entries) = meta.as_object() else {
            return Err(wrong_type(&format!("{}/{}", path, i), "an object", meta));
        };
        for (key, value) in entries {
            flattened.insert(key.clone(), value.clone());
        }
    }

    let mut meta = Meta::default();
    for (key, value) in &flattened {
        let key_path = format!("{}/{}", path, key);
        match key.as_str() {
            "swagger" => match value {
                Value::Object(fragment) => meta.swagger = Some(fragment.clone()),
                other => return Err(wrong_type(&key_path, "an object", other)),
            },
            "swaggerOverride" => meta.swagger_override = expect_bool(value, &key_path)?,
            "className" => meta.class_name = Some(expect_str(value, &key_path)?.to_string()),
            "classTarget" => meta.class_target = Some(expect_str(value, &key_path)?.to_string()),
            "swaggerIndex" => {
                let index = value
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(|| wrong_type(&key_path, "a non-negative integer", value))?;
                meta.swagger_index = Some(index);
            }
            "swaggerType" => meta.file_upload = expect_str(value, &key_path)? == "file",
            "swaggerSchema" => {
                meta.replacement = Some(Box::new(parse_schema(value, &key_path)?));
            }
            "baseType" => {
                let name = expect_str(value, &key_path)?;
                let base = BaseKind::parse(name).ok_or_else(|| TranslateError::UnknownKind {
                    kind: name.to_string(),
                    path: key_path.clone(),
                })?;
                meta.base_type = Some(base);
            }
            // Free-form annotations for other tools.
            _ => {}
        }
    }
    Ok(meta)
}

fn parse_conditional(value: &Value, path: &str) -> Result<Conditional, TranslateError> {
    let Some(map) = value.as_object() else {
        return Err(wrong_type(path, "an object", value));
    };

    let reference = match map.get("ref") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(r)) => match r.get("path") {
            Some(Value::Array(segments)) => segments
                .iter()
                .map(|s| match s {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("."),
            _ => r
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        // `is` without a reference tests the value itself.
        None => String::new(),
        Some(other) => return Err(wrong_type(&format!("{}/ref", path), "a string or object", other)),
    };

    let mut condition = Conditional::new(reference);
    condition.is = map.get("is").cloned();
    condition.then = optional_schema(map, "then", path)?;
    condition.otherwise = optional_schema(map, "otherwise", path)?;

    for (i, case) in array_field(map, "switch", path)?.iter().enumerate() {
        let case_path = format!("{}/switch/{}", path, i);
        let Some(case_map) = case.as_object() else {
            return Err(wrong_type(&case_path, "an object", case));
        };
        condition.switch.push(SwitchCase {
            is: case_map.get("is").cloned(),
            then: optional_schema(case_map, "then", &case_path)?,
            otherwise: optional_schema(case_map, "otherwise", &case_path)?,
        });
    }
    Ok(condition)
}

fn optional_schema(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<Box<Schema>>, TranslateError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(Box::new(parse_schema(
            value,
            &format!("{}/{}", path, key),
        )?))),
    }
}

/// Regex source from either a bare pattern or a `/source/flags` literal.
fn strip_regex_delimiters(regex: &str) -> &str {
    if let Some(rest) = regex.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            return &rest[..end];
        }
    }
    regex
}

fn array_field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a [Value], TranslateError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(values)) => Ok(values),
        Some(other) => Err(wrong_type(&format!("{}/{}", path, key), "an array", other)),
    }
}

fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, TranslateError> {
    value.as_str().ok_or_else(|| wrong_type(path, "a string", value))
}

fn expect_bool(value: &Value, path: &str) -> Result<bool, TranslateError> {
    value.as_bool().ok_or_else(|| wrong_type(path, "a boolean", value))
}

fn invalid(path: &str, message: &str) -> TranslateError {
    TranslateError::InvalidDescription {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn wrong_type(path: &str, expected: &str, actual: &Value) -> TranslateError {
    invalid(
        path,
        &format!("expected {}, got {}", expected, json_type_name(actual)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rules_in_order() {
        let schema = parse_schema(
            &json!({
                "type": "string",
                "rules": [
                    { "name": "max", "args": { "limit": 9 } },
                    { "name": "trim", "args": { "enabled": true } },
                    { "name": "length", "args": { "limit": 14 } },
                    { "name": "min", "args": { "limit": 4, "encoding": "utf8" } }
                ]
            }),
            "#",
        )
        .unwrap();
        assert_eq!(
            schema.rules,
            vec![
                Rule::Max(9.into()),
                Rule::Length(14.into()),
                Rule::Min(4.into())
            ]
        );
    }

    #[test]
    fn pattern_delimiters_stripped() {
        let schema = parse_schema(
            &json!({
                "type": "string",
                "rules": [{ "name": "pattern", "args": { "regex": "/^A$/i" } }]
            }),
            "#",
        )
        .unwrap();
        assert_eq!(schema.rules, vec![Rule::Pattern("^A$".into())]);
        assert_eq!(strip_regex_delimiters("^plain$"), "^plain$");
    }

    #[test]
    fn metas_flatten_left_to_right() {
        let schema = parse_schema(
            &json!({
                "type": "number",
                "metas": [
                    { "className": "First", "swaggerIndex": 1 },
                    { "className": "Second", "note": "ignored" }
                ]
            }),
            "#",
        )
        .unwrap();
        assert_eq!(schema.meta.class_name.as_deref(), Some("Second"));
        assert_eq!(schema.meta.swagger_index, Some(1));
    }

    #[test]
    fn keys_keep_declaration_order() {
        let schema = parse_schema(
            &json!({
                "type": "object",
                "keys": {
                    "zeta": { "type": "string" },
                    "alpha": { "type": "number" }
                }
            }),
            "#",
        )
        .unwrap();
        let names: Vec<&str> = schema.properties().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha"]);
    }

    #[test]
    fn mapping_sugar() {
        let schema = parse_root(&json!({
            "id": { "type": "number" },
            "name": { "type": "string" }
        }))
        .unwrap();
        assert_eq!(schema.kind.base(), Some(BaseKind::Object));
        assert_eq!(schema.properties().len(), 2);
    }

    #[test]
    fn null_is_invalid_input() {
        assert!(matches!(
            parse_root(&Value::Null),
            Err(TranslateError::InvalidInput)
        ));
    }

    #[test]
    fn scalars_are_not_schemas() {
        assert!(matches!(
            parse_root(&json!(42)),
            Err(TranslateError::NotASchema { actual, .. }) if actual == "number"
        ));
        assert!(matches!(
            parse_root(&json!({ "name": "plain string" })),
            Err(TranslateError::NotASchema { path, .. }) if path == "#/name"
        ));
    }

    #[test]
    fn unknown_type_becomes_extension() {
        let schema = parse_schema(
            &json!({ "type": "money", "metas": [{ "baseType": "number" }] }),
            "#",
        )
        .unwrap();
        assert_eq!(schema.kind.name(), "money");
        assert_eq!(schema.meta.base_type, Some(BaseKind::Number));
    }

    #[test]
    fn unknown_base_type_fails() {
        let result = parse_schema(
            &json!({ "type": "money", "metas": [{ "baseType": "currency" }] }),
            "#",
        );
        assert!(matches!(
            result,
            Err(TranslateError::UnknownKind { kind, .. }) if kind == "currency"
        ));
    }

    #[test]
    fn bad_presence_reports_path() {
        let result = parse_schema(
            &json!({ "type": "string", "flags": { "presence": "sometimes" } }),
            "#/keys/id",
        );
        assert!(matches!(
            result,
            Err(TranslateError::InvalidDescription { path, .. }) if path == "#/keys/id/flags/presence"
        ));
    }

    #[test]
    fn conditional_matches() {
        let schema = parse_schema(
            &json!({
                "type": "alternatives",
                "flags": { "match": "one" },
                "matches": [
                    { "schema": { "type": "string" } },
                    {
                        "ref": { "path": ["kind"] },
                        "is": true,
                        "then": { "type": "number" },
                        "switch": [{ "is": 1, "otherwise": { "type": "boolean" } }]
                    }
                ]
            }),
            "#",
        )
        .unwrap();
        assert_eq!(schema.mode(), Some(MatchMode::One));
        assert_eq!(schema.matches().len(), 2);
        let Match::Conditional(condition) = &schema.matches()[1] else {
            panic!("expected a conditional match");
        };
        assert_eq!(condition.reference, "kind");
        assert_eq!(condition.switch.len(), 1);
        assert!(condition.otherwise.is_none());
    }

    #[test]
    fn whens_attach_to_typed_node() {
        let schema = parse_schema(
            &json!({
                "type": "number",
                "whens": [{
                    "ref": "someField",
                    "is": true,
                    "then": { "type": "any", "flags": { "presence": "required" } },
                    "otherwise": { "type": "any", "flags": { "presence": "forbidden" } }
                }]
            }),
            "#",
        )
        .unwrap();
        assert_eq!(schema.whens.len(), 1);
        assert_eq!(schema.kind, Kind::Number);
    }

    #[test]
    fn strict_preference_and_generator_default() {
        let schema = parse_schema(
            &json!({
                "type": "string",
                "preferences": { "convert": false },
                "flags": { "defaultGenerator": "uuid" }
            }),
            "#",
        )
        .unwrap();
        assert!(schema.strict);
        assert_eq!(
            schema.flags.default,
            Some(DefaultValue::Generator("uuid".into()))
        );
    }
}
