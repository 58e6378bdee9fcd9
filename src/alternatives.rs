//! Alternatives and conditional branches, plus the untyped (`any`) kind.
//!
//! All branches are flattened into one ordered candidate list, translated
//! independently, and combined into a single union node:
//!
//! 1. `when` clauses push `then` then `otherwise`; switch lists push every
//!    case's `then` and `otherwise`; chained clauses concatenate in order.
//! 2. Forbidden candidates are dropped.
//! 3. Candidates declared required are tagged with `x-required`, which the
//!    enclosing object folds into its `required` list.
//! 4. Structurally identical fragments are collapsed, first occurrence kept.
//! 5. The union keyword comes from the explicit match mode, or defaults to
//!    `oneOf` for a single plain `when` and `anyOf` otherwise.

use std::borrow::Cow;

use serde_json::{json, Map, Value};

use crate::error::TranslateError;
use crate::registry::Components;
use crate::schema::{BaseKind, Conditional, Match, Schema};
use crate::translator::{absorb, translate_node, Context, Translation};
use crate::types::{MatchMode, REQUIRED_MARKER};

/// Translate an alternatives node.
pub(crate) fn convert_alternatives(
    schema: &Schema,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    let mut candidates: Vec<Cow<'_, Schema>> = Vec::new();
    let mut plain = 0;
    let mut clauses: Vec<&Conditional> = Vec::new();

    for entry in schema.matches() {
        match entry {
            Match::Schema(branch) => {
                plain += 1;
                candidates.push(Cow::Borrowed(branch));
            }
            Match::Conditional(condition) => {
                clauses.push(condition);
                flatten(condition, None, &mut candidates);
            }
        }
    }

    let mode = schema.mode().unwrap_or_else(|| {
        if plain == 0 {
            default_conditional_mode(&clauses)
        } else {
            MatchMode::Any
        }
    });

    combine(schema, candidates, mode, known, ctx)
}

/// Translate a node carrying `when` conditions.
///
/// Each branch is applied onto the node itself: a bare presence change such
/// as `then: required()` keeps the node's type, a typed branch replaces it.
/// A typed node missing a `then` or `otherwise` falls back to itself.
pub(crate) fn convert_whens(
    schema: &Schema,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    let typed = schema.meta.base_type.or_else(|| schema.kind.base()) != Some(BaseKind::Any);
    let base = typed.then_some(schema);

    let mut candidates: Vec<Cow<'_, Schema>> = Vec::new();
    for condition in &schema.whens {
        flatten(condition, base, &mut candidates);
    }

    let clauses: Vec<&Conditional> = schema.whens.iter().collect();
    combine(
        schema,
        candidates,
        default_conditional_mode(&clauses),
        known,
        ctx,
    )
}

/// Translate an untyped node.
pub(crate) fn convert_any(
    schema: &Schema,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    if !schema.whens.is_empty() {
        return convert_whens(schema, known, ctx);
    }

    let mut fragment = Map::new();
    if schema.meta.file_upload {
        fragment.insert("type".to_string(), json!("file"));
        fragment.insert("in".to_string(), json!("formData"));
    }
    Ok(Translation::new(Value::Object(fragment), Components::new()))
}

fn default_conditional_mode(clauses: &[&Conditional]) -> MatchMode {
    match clauses {
        [single] if single.switch.is_empty() => MatchMode::One,
        _ => MatchMode::Any,
    }
}

/// Push the candidates of one conditional clause.
fn flatten<'a>(
    condition: &'a Conditional,
    base: Option<&'a Schema>,
    candidates: &mut Vec<Cow<'a, Schema>>,
) {
    push_pair(
        condition.then.as_deref(),
        condition.otherwise.as_deref(),
        base,
        candidates,
    );
    for case in &condition.switch {
        push_pair(case.then.as_deref(), case.otherwise.as_deref(), base, candidates);
    }
}

fn push_pair<'a>(
    then: Option<&'a Schema>,
    otherwise: Option<&'a Schema>,
    base: Option<&'a Schema>,
    candidates: &mut Vec<Cow<'a, Schema>>,
) {
    for branch in [then, otherwise] {
        match (branch, base) {
            (Some(branch), Some(base)) => candidates.push(Cow::Owned(base.with_branch(branch))),
            (Some(branch), None) => candidates.push(Cow::Borrowed(branch)),
            (None, Some(base)) => candidates.push(Cow::Owned(base.without_conditions())),
            (None, None) => {}
        }
    }
}

/// Translate the candidates and build the union node.
fn combine(
    schema: &Schema,
    candidates: Vec<Cow<'_, Schema>>,
    mode: MatchMode,
    known: &Components,
    ctx: &Context<'_>,
) -> Result<Translation, TranslateError> {
    if let Some(index) = schema.meta.swagger_index {
        let Some(selected) = candidates.get(index) else {
            return Err(TranslateError::MissingIndexedSchema {
                container: "alternatives",
                index,
                path: ctx.path.clone(),
            });
        };
        let mut result = translate_node(selected, known, &ctx.descend(mode.keyword())?)?;
        if let Some(fragment) = &mut result.swagger {
            if selected.is_required() {
                mark_required(fragment);
            }
        }
        return Ok(result);
    }

    let mut components = Components::new();
    let mut branches: Vec<Value> = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        let view = known.merged(&components);
        let child = ctx.descend(format!("{}/{}", mode.keyword(), i))?;
        let result = translate_node(candidate, &view, &child)?;
        absorb(&mut components, &result.components, ctx.options)?;

        let Some(mut fragment) = result.swagger else {
            tracing::debug!(path = %child.path, "dropping forbidden branch");
            continue;
        };
        if candidate.is_required() {
            mark_required(&mut fragment);
        }

        if branches.contains(&fragment) {
            tracing::trace!(path = %child.path, "collapsing duplicate branch");
        } else {
            branches.push(fragment);
        }
    }

    // Every branch forbidden: the field can never be present.
    if branches.is_empty() {
        return Ok(Translation::forbidden(components));
    }

    let swagger = if branches.len() == 1 && ctx.options.unwrap_single_branch {
        branches.remove(0)
    } else {
        let mut union = Map::new();
        union.insert(mode.keyword().to_string(), Value::Array(branches));
        Value::Object(union)
    };
    Ok(Translation::new(swagger, components))
}

fn mark_required(fragment: &mut Value) {
    if let Value::Object(map) = fragment {
        map.insert(REQUIRED_MARKER.to_string(), Value::Bool(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SwitchCase;
    use crate::translator::translate;
    use crate::types::TranslateOptions;
    use pretty_assertions::assert_eq;

    fn run_with(schema: &Schema, options: &TranslateOptions) -> Option<Value> {
        translate(schema, &Components::new(), options)
            .unwrap()
            .swagger
    }

    fn run(schema: &Schema) -> Option<Value> {
        run_with(schema, &TranslateOptions::default())
    }

    #[test]
    fn plain_alternatives_default_to_any_of() {
        let schema = Schema::alternatives([Schema::string(), Schema::number().integer()]);
        assert_eq!(
            run(&schema),
            Some(json!({ "anyOf": [{ "type": "string" }, { "type": "integer" }] }))
        );
    }

    #[test]
    fn explicit_match_mode() {
        let schema = Schema::alternatives([Schema::string(), Schema::boolean()])
            .match_mode(MatchMode::One);
        assert_eq!(
            run(&schema),
            Some(json!({ "oneOf": [{ "type": "string" }, { "type": "boolean" }] }))
        );
    }

    #[test]
    fn identical_branches_collapse_per_policy() {
        let schema = Schema::alternatives([Schema::string(), Schema::string()]);
        assert_eq!(run(&schema), Some(json!({ "type": "string" })));

        let wrapped = TranslateOptions::new().unwrap_single_branch(false);
        assert_eq!(
            run_with(&schema, &wrapped),
            Some(json!({ "anyOf": [{ "type": "string" }] }))
        );
    }

    #[test]
    fn indexed_branch_selected() {
        let schema =
            Schema::alternatives([Schema::string(), Schema::number()]).swagger_index(1);
        assert_eq!(
            run(&schema),
            Some(json!({ "type": "number", "format": "float" }))
        );
    }

    #[test]
    fn indexed_branch_missing() {
        let schema = Schema::alternatives([Schema::string()]).swagger_index(4);
        let result = translate(&schema, &Components::new(), &TranslateOptions::default());
        assert!(matches!(
            result,
            Err(TranslateError::MissingIndexedSchema { container: "alternatives", index: 4, .. })
        ));
    }

    #[test]
    fn single_when_is_one_of() {
        let schema = Schema::conditional(
            Conditional::new("kind")
                .is(true)
                .then(Schema::string())
                .otherwise(Schema::number()),
        );
        assert_eq!(
            run(&schema),
            Some(json!({
                "oneOf": [
                    { "type": "string" },
                    { "type": "number", "format": "float" }
                ]
            }))
        );
    }

    #[test]
    fn when_branch_selected_by_index() {
        let when = Conditional::new("flag")
            .is(true)
            .then(Schema::string())
            .otherwise(Schema::number());
        assert_eq!(
            run(&Schema::conditional(when.clone())),
            Some(json!({
                "oneOf": [
                    { "type": "string" },
                    { "type": "number", "format": "float" }
                ]
            }))
        );
        assert_eq!(
            run(&Schema::conditional(when.clone()).swagger_index(0)),
            Some(json!({ "type": "string" }))
        );
        assert_eq!(
            run(&Schema::conditional(when).swagger_index(1)),
            Some(json!({ "type": "number", "format": "float" }))
        );
    }

    #[test]
    fn chained_whens_are_any_of() {
        let schema = Schema::any()
            .when(Conditional::new("a").then(Schema::string()))
            .when(Conditional::new("b").then(Schema::boolean()));
        assert_eq!(
            run(&schema),
            Some(json!({ "anyOf": [{ "type": "string" }, { "type": "boolean" }] }))
        );
    }

    #[test]
    fn switch_branches_flatten_in_order() {
        let schema = Schema::conditional(
            Conditional::new("kind")
                .case(SwitchCase::new("a").then(Schema::string()))
                .case(
                    SwitchCase::new("b")
                        .then(Schema::boolean())
                        .otherwise(Schema::date()),
                ),
        );
        assert_eq!(
            run(&schema),
            Some(json!({
                "anyOf": [
                    { "type": "string" },
                    { "type": "boolean" },
                    { "type": "string", "format": "date-time" }
                ]
            }))
        );
    }

    #[test]
    fn forbidden_branches_dropped() {
        let schema = Schema::alternatives([Schema::string().forbidden(), Schema::boolean()]);
        assert_eq!(run(&schema), Some(json!({ "type": "boolean" })));

        let schema = Schema::alternatives([Schema::string().forbidden()]);
        assert_eq!(run(&schema), None);
    }

    #[test]
    fn required_branches_are_marked() {
        let schema = Schema::alternatives([Schema::string().required(), Schema::number()]);
        assert_eq!(
            run(&schema),
            Some(json!({
                "anyOf": [
                    { "type": "string", "x-required": true },
                    { "type": "number", "format": "float" }
                ]
            }))
        );
    }

    #[test]
    fn typed_when_keeps_base_type() {
        let schema = Schema::number().integer().when(
            Conditional::new("mode")
                .is("strict")
                .then(Schema::any().required()),
        );
        assert_eq!(
            run(&schema),
            Some(json!({
                "oneOf": [
                    { "type": "integer", "x-required": true },
                    { "type": "integer" }
                ]
            }))
        );
    }

    #[test]
    fn extension_when_uses_base_type() {
        let schema = Schema::extension("money")
            .base_type(BaseKind::Number)
            .integer()
            .when(
                Conditional::new("a")
                    .is(true)
                    .then(Schema::any().required()),
            );
        assert_eq!(
            run(&schema),
            Some(json!({
                "oneOf": [
                    { "type": "integer", "x-required": true },
                    { "type": "integer" }
                ]
            }))
        );
    }

    #[test]
    fn any_with_base_type_when_keeps_string_rules() {
        let schema = Schema::any()
            .base_type(BaseKind::String)
            .min(3)
            .when(
                Conditional::new("a")
                    .is(true)
                    .then(Schema::any().required()),
            );
        assert_eq!(
            run(&schema),
            Some(json!({
                "oneOf": [
                    { "type": "string", "minLength": 3, "x-required": true },
                    { "type": "string", "minLength": 3 }
                ]
            }))
        );
    }

    #[test]
    fn typed_when_forbidden_branch_by_index() {
        let schema = Schema::number()
            .when(
                Conditional::new("someField")
                    .is(true)
                    .then(Schema::any().required())
                    .otherwise(Schema::any().forbidden()),
            )
            .swagger_index(1);
        assert_eq!(run(&schema), None);
    }

    #[test]
    fn any_is_empty_or_file() {
        assert_eq!(run(&Schema::any()), Some(json!({})));
        assert_eq!(
            run(&Schema::any().file_upload()),
            Some(json!({ "type": "file", "in": "formData" }))
        );
    }
}
