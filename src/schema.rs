//! Validation schema model and fluent builder.
//!
//! A [`Schema`] is one node of a validation-rule tree: a kind, an ordered list
//! of rules, allowed and disallowed literals, flags, typed metadata, examples
//! and any conditional branches. Trees are built with chained calls:
//!
//! ```
//! use validation_swagger::Schema;
//!
//! let point = Schema::object()
//!     .key("lat", Schema::number().min(-90).max(90).required())
//!     .key("lon", Schema::number().min(-180).max(180).required())
//!     .class_name("GeoPoint");
//! assert_eq!(point.properties().len(), 2);
//! ```

use serde_json::{Map, Number, Value};

use crate::types::{MatchMode, Presence};

/// Kinds a schema node can be translated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Any,
    Number,
    String,
    Boolean,
    Date,
    Binary,
    Array,
    Object,
    Alternatives,
}

impl BaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseKind::Any => "any",
            BaseKind::Number => "number",
            BaseKind::String => "string",
            BaseKind::Boolean => "boolean",
            BaseKind::Date => "date",
            BaseKind::Binary => "binary",
            BaseKind::Array => "array",
            BaseKind::Object => "object",
            BaseKind::Alternatives => "alternatives",
        }
    }

    /// Parse a kind name. Returns `None` for names with no converter.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "any" => Some(BaseKind::Any),
            "number" => Some(BaseKind::Number),
            "string" => Some(BaseKind::String),
            "boolean" => Some(BaseKind::Boolean),
            "date" => Some(BaseKind::Date),
            "binary" => Some(BaseKind::Binary),
            "array" => Some(BaseKind::Array),
            "object" => Some(BaseKind::Object),
            "alternatives" => Some(BaseKind::Alternatives),
            _ => None,
        }
    }
}

/// Kind of a schema node, with the children the kind carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Any,
    Number,
    String,
    Boolean,
    Date,
    Binary,
    /// Positional item schemas, one per declared item type.
    Array { items: Vec<Schema> },
    /// Declared keys in declaration order, plus key-pattern schemas for unkeyed properties.
    Object {
        keys: Vec<(String, Schema)>,
        patterns: Vec<(String, Schema)>,
    },
    Alternatives {
        matches: Vec<Match>,
        mode: Option<MatchMode>,
    },
    /// A user-defined kind. Translated through `Meta::base_type`.
    Extension { name: String },
}

impl Kind {
    /// The converter this kind maps to, if it is a built-in kind.
    pub fn base(&self) -> Option<BaseKind> {
        match self {
            Kind::Any => Some(BaseKind::Any),
            Kind::Number => Some(BaseKind::Number),
            Kind::String => Some(BaseKind::String),
            Kind::Boolean => Some(BaseKind::Boolean),
            Kind::Date => Some(BaseKind::Date),
            Kind::Binary => Some(BaseKind::Binary),
            Kind::Array { .. } => Some(BaseKind::Array),
            Kind::Object { .. } => Some(BaseKind::Object),
            Kind::Alternatives { .. } => Some(BaseKind::Alternatives),
            Kind::Extension { .. } => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Kind::Extension { name } => name.as_str(),
            other => other.base().map(|b| b.as_str()).unwrap_or("any"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Lower,
    Upper,
}

/// A named constraint. Rules keep declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Min(Number),
    Max(Number),
    /// Sets both bounds at once.
    Length(Number),
    Integer,
    Precision(u32),
    Sign(Sign),
    Alphanum,
    Token,
    Case(Case),
    Email,
    IsoDate,
    Uuid,
    /// Regex source, without delimiters.
    Pattern(String),
    Unique,
}

/// Default value of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(Value),
    /// Computed at validation time; never emitted.
    Generator(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flags {
    pub presence: Presence,
    pub description: Option<String>,
    pub label: Option<String>,
    pub default: Option<DefaultValue>,
    /// Whether objects accept keys that are not declared.
    pub unknown: Option<bool>,
    pub encoding: Option<String>,
    /// Date format, e.g. `YYYY-MM-DD`.
    pub format: Option<String>,
    /// Only the `valids` list is accepted.
    pub only: bool,
}

/// Documentation metadata attached to a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    /// Fragment shallow-merged over the translated output.
    pub swagger: Option<Map<String, Value>>,
    /// Emit `swagger` verbatim instead of translating the node.
    pub swagger_override: bool,
    /// Definition name; the node becomes a reusable component.
    pub class_name: Option<String>,
    /// Collection the definition is stored in. Defaults to `schemas`.
    pub class_target: Option<String>,
    /// Selects a single array item or alternative branch.
    pub swagger_index: Option<usize>,
    /// Document an untyped node as a form-data file upload.
    pub file_upload: bool,
    /// Translate this schema in place of the node.
    pub replacement: Option<Box<Schema>>,
    /// Converter to use instead of the node's own kind.
    pub base_type: Option<BaseKind>,
}

impl Meta {
    /// Overlay `other` onto this metadata. Values set in `other` win; set flags stay set.
    pub fn merge(&mut self, other: Meta) {
        if other.swagger.is_some() {
            self.swagger = other.swagger;
        }
        self.swagger_override |= other.swagger_override;
        if other.class_name.is_some() {
            self.class_name = other.class_name;
        }
        if other.class_target.is_some() {
            self.class_target = other.class_target;
        }
        if other.swagger_index.is_some() {
            self.swagger_index = other.swagger_index;
        }
        self.file_upload |= other.file_upload;
        if other.replacement.is_some() {
            self.replacement = other.replacement;
        }
        if other.base_type.is_some() {
            self.base_type = other.base_type;
        }
    }
}

/// A conditional branch: `when(reference, is, then, otherwise)` or a switch list.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub reference: String,
    pub is: Option<Value>,
    pub then: Option<Box<Schema>>,
    pub otherwise: Option<Box<Schema>>,
    pub switch: Vec<SwitchCase>,
}

impl Conditional {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            is: None,
            then: None,
            otherwise: None,
            switch: Vec::new(),
        }
    }

    pub fn is(mut self, value: impl Into<Value>) -> Self {
        self.is = Some(value.into());
        self
    }

    pub fn then(mut self, schema: Schema) -> Self {
        self.then = Some(Box::new(schema));
        self
    }

    pub fn otherwise(mut self, schema: Schema) -> Self {
        self.otherwise = Some(Box::new(schema));
        self
    }

    pub fn case(mut self, case: SwitchCase) -> Self {
        self.switch.push(case);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwitchCase {
    pub is: Option<Value>,
    pub then: Option<Box<Schema>>,
    pub otherwise: Option<Box<Schema>>,
}

impl SwitchCase {
    pub fn new(is: impl Into<Value>) -> Self {
        Self {
            is: Some(is.into()),
            ..Default::default()
        }
    }

    pub fn then(mut self, schema: Schema) -> Self {
        self.then = Some(Box::new(schema));
        self
    }

    pub fn otherwise(mut self, schema: Schema) -> Self {
        self.otherwise = Some(Box::new(schema));
        self
    }
}

/// One entry of an alternatives node.
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    Schema(Schema),
    Conditional(Conditional),
}

/// A node of the validation-rule tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: Kind,
    pub rules: Vec<Rule>,
    /// Allowed literals. May contain `null`, which marks the node nullable.
    pub valids: Vec<Value>,
    pub invalids: Vec<Value>,
    pub flags: Flags,
    pub meta: Meta,
    pub examples: Vec<Value>,
    /// Conditions attached to a typed node.
    pub whens: Vec<Conditional>,
    /// Input conversion is disabled (strict mode).
    pub strict: bool,
}

impl Schema {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
            valids: Vec::new(),
            invalids: Vec::new(),
            flags: Flags::default(),
            meta: Meta::default(),
            examples: Vec::new(),
            whens: Vec::new(),
            strict: false,
        }
    }

    pub fn any() -> Self {
        Self::new(Kind::Any)
    }

    pub fn number() -> Self {
        Self::new(Kind::Number)
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn boolean() -> Self {
        Self::new(Kind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(Kind::Date)
    }

    pub fn binary() -> Self {
        Self::new(Kind::Binary)
    }

    pub fn array() -> Self {
        Self::new(Kind::Array { items: Vec::new() })
    }

    pub fn object() -> Self {
        Self::new(Kind::Object {
            keys: Vec::new(),
            patterns: Vec::new(),
        })
    }

    /// A union over plain schemas.
    pub fn alternatives(schemas: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(Kind::Alternatives {
            matches: schemas.into_iter().map(Match::Schema).collect(),
            mode: None,
        })
    }

    /// An untyped node whose shape depends on a condition.
    pub fn conditional(condition: Conditional) -> Self {
        Self::any().when(condition)
    }

    /// A user-defined kind; give it a `base_type` to make it translatable.
    pub fn extension(name: impl Into<String>) -> Self {
        Self::new(Kind::Extension { name: name.into() })
    }

    // --- Rules ---

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn min(self, limit: impl Into<Number>) -> Self {
        self.rule(Rule::Min(limit.into()))
    }

    pub fn max(self, limit: impl Into<Number>) -> Self {
        self.rule(Rule::Max(limit.into()))
    }

    pub fn length(self, limit: impl Into<Number>) -> Self {
        self.rule(Rule::Length(limit.into()))
    }

    pub fn integer(self) -> Self {
        self.rule(Rule::Integer)
    }

    pub fn precision(self, digits: u32) -> Self {
        self.rule(Rule::Precision(digits))
    }

    pub fn positive(self) -> Self {
        self.rule(Rule::Sign(Sign::Positive))
    }

    pub fn negative(self) -> Self {
        self.rule(Rule::Sign(Sign::Negative))
    }

    pub fn alphanum(self) -> Self {
        self.rule(Rule::Alphanum)
    }

    pub fn token(self) -> Self {
        self.rule(Rule::Token)
    }

    pub fn lowercase(self) -> Self {
        self.rule(Rule::Case(Case::Lower))
    }

    pub fn uppercase(self) -> Self {
        self.rule(Rule::Case(Case::Upper))
    }

    pub fn email(self) -> Self {
        self.rule(Rule::Email)
    }

    pub fn iso_date(self) -> Self {
        self.rule(Rule::IsoDate)
    }

    pub fn uuid(self) -> Self {
        self.rule(Rule::Uuid)
    }

    pub fn pattern(self, regex: impl Into<String>) -> Self {
        self.rule(Rule::Pattern(regex.into()))
    }

    pub fn unique(self) -> Self {
        self.rule(Rule::Unique)
    }

    // --- Values ---

    /// Restrict the node to the given literals.
    pub fn valid<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.valids.extend(values.into_iter().map(Into::into));
        self.flags.only = true;
        self
    }

    /// Accept the given literals in addition to the kind's own values.
    pub fn allow<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.valids.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn allow_null(mut self) -> Self {
        self.valids.push(Value::Null);
        self
    }

    pub fn invalid<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.invalids.extend(values.into_iter().map(Into::into));
        self
    }

    // --- Flags ---

    pub fn presence(mut self, presence: Presence) -> Self {
        self.flags.presence = presence;
        self
    }

    pub fn required(self) -> Self {
        self.presence(Presence::Required)
    }

    pub fn optional(self) -> Self {
        self.presence(Presence::Optional)
    }

    pub fn forbidden(self) -> Self {
        self.presence(Presence::Forbidden)
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.flags.description = Some(text.into());
        self
    }

    pub fn label(mut self, text: impl Into<String>) -> Self {
        self.flags.label = Some(text.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.flags.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_generator(mut self, name: impl Into<String>) -> Self {
        self.flags.default = Some(DefaultValue::Generator(name.into()));
        self
    }

    pub fn unknown(mut self, allow: bool) -> Self {
        self.flags.unknown = Some(allow);
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.flags.encoding = Some(encoding.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.flags.format = Some(format.into());
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn example(mut self, value: impl Into<Value>) -> Self {
        self.examples.push(value.into());
        self
    }

    // --- Children ---

    /// Append item schemas. Ignored unless the node is an array.
    pub fn items(mut self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        if let Kind::Array { items } = &mut self.kind {
            items.extend(schemas);
        }
        self
    }

    /// Declare a key. Ignored unless the node is an object.
    pub fn key(mut self, name: impl Into<String>, schema: Schema) -> Self {
        if let Kind::Object { keys, .. } = &mut self.kind {
            keys.push((name.into(), schema));
        }
        self
    }

    pub fn keys<K: Into<String>>(self, children: impl IntoIterator<Item = (K, Schema)>) -> Self {
        children
            .into_iter()
            .fold(self, |acc, (name, schema)| acc.key(name, schema))
    }

    /// Schema for keys matching a regex. Ignored unless the node is an object.
    pub fn pattern_key(mut self, regex: impl Into<String>, schema: Schema) -> Self {
        if let Kind::Object { patterns, .. } = &mut self.kind {
            patterns.push((regex.into(), schema));
        }
        self
    }

    /// Add a conditional branch. On alternatives nodes it becomes a match entry.
    pub fn when(mut self, condition: Conditional) -> Self {
        match &mut self.kind {
            Kind::Alternatives { matches, .. } => matches.push(Match::Conditional(condition)),
            _ => self.whens.push(condition),
        }
        self
    }

    /// Set how alternatives combine. Ignored unless the node is an alternatives node.
    pub fn match_mode(mut self, match_mode: MatchMode) -> Self {
        if let Kind::Alternatives { mode, .. } = &mut self.kind {
            *mode = Some(match_mode);
        }
        self
    }

    // --- Metadata ---

    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta.merge(meta);
        self
    }

    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.meta.class_name = Some(name.into());
        self
    }

    pub fn class_target(mut self, collection: impl Into<String>) -> Self {
        self.meta.class_target = Some(collection.into());
        self
    }

    pub fn swagger_index(mut self, index: usize) -> Self {
        self.meta.swagger_index = Some(index);
        self
    }

    /// Shallow-merge `fragment` over the translated output.
    pub fn swagger(mut self, fragment: Map<String, Value>) -> Self {
        self.meta.swagger = Some(fragment);
        self
    }

    /// Emit `fragment` verbatim instead of translating the node.
    pub fn swagger_override(mut self, fragment: Map<String, Value>) -> Self {
        self.meta.swagger = Some(fragment);
        self.meta.swagger_override = true;
        self
    }

    pub fn file_upload(mut self) -> Self {
        self.meta.file_upload = true;
        self
    }

    pub fn replace_with(mut self, schema: Schema) -> Self {
        self.meta.replacement = Some(Box::new(schema));
        self
    }

    pub fn base_type(mut self, base: BaseKind) -> Self {
        self.meta.base_type = Some(base);
        self
    }

    // --- Accessors ---

    pub fn is_required(&self) -> bool {
        self.flags.presence == Presence::Required
    }

    pub fn is_forbidden(&self) -> bool {
        self.flags.presence == Presence::Forbidden
    }

    pub fn item_schemas(&self) -> &[Schema] {
        match &self.kind {
            Kind::Array { items } => items,
            _ => &[],
        }
    }

    pub fn properties(&self) -> &[(String, Schema)] {
        match &self.kind {
            Kind::Object { keys, .. } => keys,
            _ => &[],
        }
    }

    pub fn patterns(&self) -> &[(String, Schema)] {
        match &self.kind {
            Kind::Object { patterns, .. } => patterns,
            _ => &[],
        }
    }

    pub fn matches(&self) -> &[Match] {
        match &self.kind {
            Kind::Alternatives { matches, .. } => matches,
            _ => &[],
        }
    }

    pub fn mode(&self) -> Option<MatchMode> {
        match &self.kind {
            Kind::Alternatives { mode, .. } => *mode,
            _ => None,
        }
    }

    /// Whether this node only adjusts presence or documentation of another node.
    ///
    /// `then: required()` on a typed node keeps the node's type and changes its presence.
    pub(crate) fn is_modifier(&self) -> bool {
        matches!(self.kind, Kind::Any)
            && self.rules.is_empty()
            && self.whens.is_empty()
            && self.meta.base_type.is_none()
    }

    /// This node without its conditions, metadata or documentation.
    ///
    /// Used as the body of a conditional branch; the documentation belongs to
    /// the union built from the branches. The base type is kept so extension
    /// kinds still resolve to a converter.
    pub(crate) fn without_conditions(&self) -> Schema {
        let mut bare = self.clone();
        bare.whens.clear();
        bare.meta = Meta {
            base_type: self.meta.base_type,
            ..Meta::default()
        };
        bare.flags.description = None;
        bare.flags.label = None;
        bare.flags.default = None;
        bare.examples.clear();
        bare
    }

    /// Apply a conditional branch to this node, producing the branch candidate.
    pub(crate) fn with_branch(&self, branch: &Schema) -> Schema {
        if !branch.is_modifier() {
            return branch.clone();
        }

        let mut merged = self.without_conditions();
        if branch.flags.presence != Presence::Optional {
            merged.flags.presence = branch.flags.presence;
        }
        merged.flags.description = branch.flags.description.clone();
        merged.flags.label = branch.flags.label.clone();
        merged.flags.default = branch.flags.default.clone();
        merged.valids.extend(branch.valids.iter().cloned());
        merged.examples = branch.examples.clone();
        merged.meta.merge(branch.meta.clone());
        merged
    }
}

/// A mapping of field names to schemas is an object schema with those keys.
impl<K: Into<String>> FromIterator<(K, Schema)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, Schema)>>(iter: I) -> Self {
        Schema::object().keys(iter)
    }
}
