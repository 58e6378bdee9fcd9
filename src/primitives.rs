//! Converters for scalar kinds: number, string, boolean, date and binary.

use serde_json::{json, Map, Value};

use crate::schema::{Case, Rule, Schema, Sign};

/// Date format flag that documents as `format: date`.
const DAY_FORMAT: &str = "YYYY-MM-DD";

/// Character-class rules that translate to a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Alphanum,
    Token,
}

/// Pattern for a character-class rule.
///
/// Lenient schemas convert case before validating, so the case rule only
/// narrows the pattern in strict mode.
fn class_pattern(class: CharClass, case: Option<Case>, strict: bool) -> &'static str {
    let case = if strict { case } else { None };
    match (class, case) {
        (CharClass::Alphanum, None) => "^[a-zA-Z0-9]*$",
        (CharClass::Alphanum, Some(Case::Lower)) => "^[a-z0-9]*$",
        (CharClass::Alphanum, Some(Case::Upper)) => "^[A-Z0-9]*$",
        (CharClass::Token, None) => "^[a-zA-Z0-9_]*$",
        (CharClass::Token, Some(Case::Lower)) => "^[a-z0-9_]*$",
        (CharClass::Token, Some(Case::Upper)) => "^[A-Z0-9_]*$",
    }
}

/// Bounds from `min`, `max` and `length` rules, in declaration order.
///
/// `length` sets both bounds; a later `min` or `max` overrides its half.
pub(crate) fn min_max(schema: &Schema, suffix: &str) -> Map<String, Value> {
    let min_key = format!("min{}", suffix);
    let max_key = format!("max{}", suffix);
    let mut bounds = Map::new();

    for rule in &schema.rules {
        match rule {
            Rule::Min(limit) => {
                bounds.insert(min_key.clone(), Value::Number(limit.clone()));
            }
            Rule::Max(limit) => {
                bounds.insert(max_key.clone(), Value::Number(limit.clone()));
            }
            Rule::Length(limit) => {
                bounds.insert(min_key.clone(), Value::Number(limit.clone()));
                bounds.insert(max_key.clone(), Value::Number(limit.clone()));
            }
            _ => {}
        }
    }
    bounds
}

fn has_rule(schema: &Schema, wanted: &Rule) -> bool {
    schema.rules.iter().any(|rule| rule == wanted)
}

/// Enumerations for the literals of one JSON type.
///
/// Allowed literals become `enum` only when the node accepts nothing else;
/// disallowed literals always become `not: {enum}`.
fn literal_enums(
    fragment: &mut Map<String, Value>,
    schema: &Schema,
    is_kind: fn(&Value) -> bool,
) {
    let valids: Vec<Value> = schema.valids.iter().filter(|v| is_kind(v)).cloned().collect();
    if schema.flags.only && !valids.is_empty() {
        fragment.insert("enum".to_string(), Value::Array(valids));
    }

    let invalids: Vec<Value> = schema
        .invalids
        .iter()
        .filter(|v| is_kind(v))
        .cloned()
        .collect();
    if !invalids.is_empty() {
        fragment.insert("not".to_string(), json!({ "enum": invalids }));
    }
}

pub(crate) fn convert_number(schema: &Schema) -> Value {
    let mut fragment = Map::new();

    if has_rule(schema, &Rule::Integer) {
        fragment.insert("type".to_string(), json!("integer"));
    } else {
        fragment.insert("type".to_string(), json!("number"));
        let precise = schema
            .rules
            .iter()
            .any(|rule| matches!(rule, Rule::Precision(_)));
        let format = if precise { "double" } else { "float" };
        fragment.insert("format".to_string(), json!(format));
    }

    // Sign gives a default bound; explicit limits replace it.
    let sign = schema.rules.iter().rev().find_map(|rule| match rule {
        Rule::Sign(sign) => Some(*sign),
        _ => None,
    });
    match sign {
        Some(Sign::Positive) => {
            fragment.insert("minimum".to_string(), json!(1));
        }
        Some(Sign::Negative) => {
            fragment.insert("maximum".to_string(), json!(-1));
        }
        None => {}
    }

    for rule in &schema.rules {
        match rule {
            Rule::Min(limit) => {
                fragment.insert("minimum".to_string(), Value::Number(limit.clone()));
            }
            Rule::Max(limit) => {
                fragment.insert("maximum".to_string(), Value::Number(limit.clone()));
            }
            _ => {}
        }
    }

    literal_enums(&mut fragment, schema, Value::is_number);
    Value::Object(fragment)
}

pub(crate) fn convert_string(schema: &Schema) -> Value {
    let mut fragment = Map::new();
    fragment.insert("type".to_string(), json!("string"));

    let case = schema.rules.iter().rev().find_map(|rule| match rule {
        Rule::Case(case) => Some(*case),
        _ => None,
    });

    if has_rule(schema, &Rule::Alphanum) {
        let pattern = class_pattern(CharClass::Alphanum, case, schema.strict);
        fragment.insert("pattern".to_string(), json!(pattern));
    }

    if has_rule(schema, &Rule::Token) {
        let pattern = class_pattern(CharClass::Token, case, schema.strict);
        fragment.insert("pattern".to_string(), json!(pattern));
    }

    // Formats describe the value fully and drop any character-class pattern.
    for (rule, format) in [
        (Rule::Email, "email"),
        (Rule::IsoDate, "date-time"),
        (Rule::Uuid, "uuid"),
    ] {
        if has_rule(schema, &rule) {
            fragment.insert("format".to_string(), json!(format));
            fragment.remove("pattern");
        }
    }

    let pattern = schema.rules.iter().rev().find_map(|rule| match rule {
        Rule::Pattern(source) => Some(source),
        _ => None,
    });
    if let Some(source) = pattern {
        fragment.insert("pattern".to_string(), json!(source));
    }

    fragment.extend(min_max(schema, "Length"));
    literal_enums(&mut fragment, schema, Value::is_string);
    Value::Object(fragment)
}

pub(crate) fn convert_boolean(_schema: &Schema) -> Value {
    json!({ "type": "boolean" })
}

pub(crate) fn convert_date(schema: &Schema) -> Value {
    let format = match schema.flags.format.as_deref() {
        Some(DAY_FORMAT) => "date",
        _ => "date-time",
    };
    json!({ "type": "string", "format": format })
}

pub(crate) fn convert_binary(schema: &Schema) -> Value {
    let mut fragment = Map::new();
    fragment.insert("type".to_string(), json!("string"));

    let format = match schema.flags.encoding.as_deref() {
        Some("base64") => "byte",
        _ => "binary",
    };
    fragment.insert("format".to_string(), json!(format));

    fragment.extend(min_max(schema, "Length"));
    Value::Object(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_bounds() {
        let schema = Schema::number().integer().min(1).max(10);
        assert_eq!(
            convert_number(&schema),
            json!({ "type": "integer", "minimum": 1, "maximum": 10 })
        );
    }

    #[test]
    fn positive_sets_minimum() {
        assert_eq!(
            convert_number(&Schema::number().positive()),
            json!({ "type": "number", "format": "float", "minimum": 1 })
        );
    }

    #[test]
    fn precision_negative_is_double() {
        assert_eq!(
            convert_number(&Schema::number().precision(2).negative()),
            json!({ "type": "number", "format": "double", "maximum": -1 })
        );
    }

    #[test]
    fn explicit_min_overrides_sign() {
        assert_eq!(
            convert_number(&Schema::number().min(5).positive()),
            json!({ "type": "number", "format": "float", "minimum": 5 })
        );
    }

    #[test]
    fn number_enum_needs_only_mode() {
        let schema = Schema::number().valid([1, 2, 3]);
        assert_eq!(
            convert_number(&schema),
            json!({ "type": "number", "format": "float", "enum": [1, 2, 3] })
        );

        let schema = Schema::number().allow([1, 2]);
        assert_eq!(
            convert_number(&schema),
            json!({ "type": "number", "format": "float" })
        );
    }

    #[test]
    fn number_invalids_negated() {
        let schema = Schema::number().integer().invalid([0]);
        assert_eq!(
            convert_number(&schema),
            json!({ "type": "integer", "not": { "enum": [0] } })
        );
    }

    #[test]
    fn string_bounds_follow_declaration_order() {
        let schema = Schema::string().min(4).max(9).length(14);
        assert_eq!(
            convert_string(&schema),
            json!({ "type": "string", "minLength": 14, "maxLength": 14 })
        );

        let schema = Schema::string().max(9).length(14).min(4);
        assert_eq!(
            convert_string(&schema),
            json!({ "type": "string", "minLength": 4, "maxLength": 14 })
        );
    }

    #[test]
    fn alphanum_patterns() {
        assert_eq!(
            convert_string(&Schema::string().alphanum()),
            json!({ "type": "string", "pattern": "^[a-zA-Z0-9]*$" })
        );
        assert_eq!(
            convert_string(&Schema::string().alphanum().uppercase()),
            json!({ "type": "string", "pattern": "^[a-zA-Z0-9]*$" })
        );
        assert_eq!(
            convert_string(&Schema::string().strict().alphanum().lowercase()),
            json!({ "type": "string", "pattern": "^[a-z0-9]*$" })
        );
        assert_eq!(
            convert_string(&Schema::string().strict().alphanum().uppercase()),
            json!({ "type": "string", "pattern": "^[A-Z0-9]*$" })
        );
    }

    #[test]
    fn token_patterns() {
        assert_eq!(
            convert_string(&Schema::string().token()),
            json!({ "type": "string", "pattern": "^[a-zA-Z0-9_]*$" })
        );
        assert_eq!(
            convert_string(&Schema::string().strict().token().lowercase()),
            json!({ "type": "string", "pattern": "^[a-z0-9_]*$" })
        );
    }

    #[test]
    fn formats_drop_patterns() {
        assert_eq!(
            convert_string(&Schema::string().alphanum().email()),
            json!({ "type": "string", "format": "email" })
        );
        assert_eq!(
            convert_string(&Schema::string().alphanum().iso_date()),
            json!({ "type": "string", "format": "date-time" })
        );
        assert_eq!(
            convert_string(&Schema::string().token().uuid()),
            json!({ "type": "string", "format": "uuid" })
        );
    }

    #[test]
    fn explicit_pattern_wins() {
        assert_eq!(
            convert_string(&Schema::string().pattern("^A$").alphanum()),
            json!({ "type": "string", "pattern": "^A$" })
        );
        assert_eq!(
            convert_string(&Schema::string().email().pattern("@example\\.com$")),
            json!({ "type": "string", "format": "email", "pattern": "@example\\.com$" })
        );
    }

    #[test]
    fn string_enum_skips_null() {
        let schema = Schema::string().valid([json!("A"), json!("B"), Value::Null]);
        assert_eq!(
            convert_string(&schema),
            json!({ "type": "string", "enum": ["A", "B"] })
        );
    }

    #[test]
    fn date_formats() {
        assert_eq!(
            convert_date(&Schema::date()),
            json!({ "type": "string", "format": "date-time" })
        );
        assert_eq!(
            convert_date(&Schema::date().format("YYYY-MM-DD")),
            json!({ "type": "string", "format": "date" })
        );
    }

    #[test]
    fn binary_encodings() {
        assert_eq!(
            convert_binary(&Schema::binary()),
            json!({ "type": "string", "format": "binary" })
        );
        assert_eq!(
            convert_binary(&Schema::binary().encoding("base64").max(1024)),
            json!({ "type": "string", "format": "byte", "maxLength": 1024 })
        );
    }

    #[test]
    fn boolean_is_fixed() {
        assert_eq!(convert_boolean(&Schema::boolean()), json!({ "type": "boolean" }));
    }
}
