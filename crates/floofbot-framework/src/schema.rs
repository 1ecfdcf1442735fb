//! Argument schemas and the parsers compiled from them.
//!
//! A handler declares the shape of its arguments as an [`ArgumentSchema`]:
//! an ordered list of [`ArgumentField`]s, each with a declared
//! [`FieldType`]. At registration time the schema is compiled once into a
//! [`CompiledParser`], which is then reused for every invocation:
//!
//! ```rust,ignore
//! let schema = ArgumentSchema::new()
//!     .describe("Shows the help text of a command")
//!     .field(ArgumentField::text("command").optional().describe("Name of the command"));
//!
//! let parser = CompiledParser::compile(&schema)?;
//! let args = parser.parse("ping")?;
//! assert_eq!(args.text("command"), Some("ping"));
//! ```
//!
//! Only three primitives are accepted: integers, real numbers and text,
//! optionally wrapped as nullable. Anything else fails compilation with
//! [`LoaderError::UnsupportedArgumentType`].

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;

use floofbot_core::{Failure, LoaderError};

use crate::split::{SplitError, shell_split};

// =============================================================================
// Declared types
// =============================================================================

/// The three primitive types a compiled parser can coerce to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Integer,
    Number,
    Text,
}

impl Primitive {
    /// Name shown in help text.
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Text => "text",
        }
    }

    /// Coerces a raw token.
    fn coerce(self, token: &str) -> Option<ArgValue> {
        match self {
            Self::Integer => token.trim().parse().ok().map(ArgValue::Integer),
            Self::Number => token.trim().parse().ok().map(ArgValue::Number),
            Self::Text => Some(ArgValue::Text(token.to_string())),
        }
    }

    /// Coerces a decoded structured value. `Null` is handled by the caller.
    fn coerce_value(self, value: &Value) -> Option<ArgValue> {
        match (self, value) {
            (Self::Integer, Value::Number(n)) => n.as_i64().map(ArgValue::Integer),
            (Self::Number, Value::Number(n)) => n.as_f64().map(ArgValue::Number),
            (Self::Text, Value::Number(n)) => Some(ArgValue::Text(n.to_string())),
            (Self::Text, Value::Bool(b)) => Some(ArgValue::Text(b.to_string())),
            (_, Value::String(s)) => self.coerce(s),
            _ => None,
        }
    }
}

/// A declared argument type, as written by a plugin author.
///
/// Declarations are parsed from type names: `integer`, `number`, `text`
/// (and the aliases `int`, `float`, `string`, `str`), a trailing `?` for a
/// nullable wrapper and a trailing `[]` for a list. Only the primitives and
/// nullable primitives compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Number,
    Text,
    Boolean,
    List(Box<FieldType>),
    Nullable(Box<FieldType>),
    Named(String),
}

impl FieldType {
    /// Resolves the declaration into a primitive plus a nullable flag.
    fn resolve(&self) -> Option<(Primitive, bool)> {
        match self {
            Self::Integer => Some((Primitive::Integer, false)),
            Self::Number => Some((Primitive::Number, false)),
            Self::Text => Some((Primitive::Text, false)),
            Self::Nullable(inner) => match inner.resolve() {
                Some((primitive, false)) => Some((primitive, true)),
                _ => None,
            },
            Self::Boolean | Self::List(_) | Self::Named(_) => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::Text => f.write_str("text"),
            Self::Boolean => f.write_str("boolean"),
            Self::List(inner) => write!(f, "{inner}[]"),
            Self::Nullable(inner) => write!(f, "{inner}?"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for FieldType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            return Ok(Self::Nullable(Box::new(inner.parse()?)));
        }
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(Self::List(Box::new(inner.parse()?)));
        }
        Ok(match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Self::Integer,
            "number" | "float" => Self::Number,
            "text" | "string" | "str" => Self::Text,
            "boolean" | "bool" => Self::Boolean,
            _ => Self::Named(s.to_string()),
        })
    }
}

impl From<&str> for FieldType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }
}

impl From<Primitive> for FieldType {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::Integer => Self::Integer,
            Primitive::Number => Self::Number,
            Primitive::Text => Self::Text,
        }
    }
}

// =============================================================================
// Values
// =============================================================================

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl ArgValue {
    fn primitive(&self) -> Primitive {
        match self {
            Self::Integer(_) => Primitive::Integer,
            Self::Number(_) => Primitive::Number,
            Self::Text(_) => Primitive::Text,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

// =============================================================================
// Schema declaration
// =============================================================================

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentField {
    pub name: String,
    pub ty: FieldType,
    pub default: Option<ArgValue>,
    pub description: Option<String>,
    /// Consume every remaining token. Only valid on the last, text field.
    pub greedy: bool,
}

impl ArgumentField {
    /// Declares a field with an arbitrary type declaration.
    pub fn new(name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            default: None,
            description: None,
            greedy: false,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Wraps the declared type as nullable, making the field omissible.
    pub fn optional(mut self) -> Self {
        if !matches!(self.ty, FieldType::Nullable(_)) {
            self.ty = FieldType::Nullable(Box::new(self.ty));
        }
        self
    }

    /// Sets a default, which also makes the field optional.
    pub fn default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Lets this (last, text) field swallow the rest of the input.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }
}

/// An ordered argument declaration with an overall description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    pub description: Option<String>,
    pub fields: Vec<ArgumentField>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: ArgumentField) -> Self {
        self.fields.push(field);
        self
    }
}

// =============================================================================
// Parse errors
// =============================================================================

/// Errors raised by a compiled parser. All of them are user errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("the following arguments are required: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("argument {field}: invalid {expected} value: '{value}'")]
    InvalidValue {
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("unrecognized arguments: {}", .0.join(" "))]
    Unrecognized(Vec<String>),

    #[error("expected a mapping of argument names to values")]
    NotAMapping,

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<ParseError> for Failure {
    fn from(err: ParseError) -> Self {
        Failure::syntax(err.to_string())
    }
}

// =============================================================================
// Parsed record
// =============================================================================

/// Parsed arguments, in declaration order. Omitted optional fields without a
/// default are present with no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<(String, Option<ArgValue>)>,
}

impl Args {
    /// An empty record, passed to handlers declared without a schema.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ArgValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// A real number; integer values are widened.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ArgValue::Number(n) => Some(*n),
            ArgValue::Integer(i) => Some(*i as f64),
            ArgValue::Text(_) => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ArgValue>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// The record as a JSON object; absent values become `null`.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(n, v)| (n.clone(), v.as_ref().map_or(Value::Null, ArgValue::to_json)))
            .collect();
        Value::Object(map)
    }

    /// Deserializes the record into a plugin-defined struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Failure> {
        serde_json::from_value(self.to_json()).map_err(Failure::unclassified)
    }
}

// =============================================================================
// Compiled parser
// =============================================================================

#[derive(Debug, Clone)]
struct CompiledField {
    name: String,
    primitive: Primitive,
    optional: bool,
    default: Option<ArgValue>,
    description: Option<String>,
    greedy: bool,
}

/// Help metadata for one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentHelp {
    pub name: String,
    pub description: Option<String>,
    pub optional: bool,
    pub default: Option<ArgValue>,
    pub type_name: &'static str,
}

/// A positional parser compiled from an [`ArgumentSchema`].
#[derive(Debug, Clone)]
pub struct CompiledParser {
    fields: Vec<CompiledField>,
}

impl CompiledParser {
    /// Validates `schema` and builds its parser.
    ///
    /// # Errors
    ///
    /// Returns a [`LoaderError`] when a field has an unsupported type, a
    /// default of the wrong type, a misplaced greedy flag, or a duplicate
    /// name.
    pub fn compile(schema: &ArgumentSchema) -> Result<Self, LoaderError> {
        let mut fields = Vec::with_capacity(schema.fields.len());
        let last = schema.fields.len().saturating_sub(1);

        for (index, field) in schema.fields.iter().enumerate() {
            if field.name.is_empty() || field.name.contains(char::is_whitespace) {
                return Err(LoaderError::InvalidName(field.name.clone()));
            }
            if fields.iter().any(|f: &CompiledField| f.name == field.name) {
                return Err(LoaderError::DuplicateField {
                    field: field.name.clone(),
                });
            }

            let (primitive, nullable) =
                field
                    .ty
                    .resolve()
                    .ok_or_else(|| LoaderError::UnsupportedArgumentType {
                        field: field.name.clone(),
                        declared: field.ty.to_string(),
                    })?;

            if let Some(default) = &field.default
                && default.primitive() != primitive
                && !(primitive == Primitive::Number && default.primitive() == Primitive::Integer)
            {
                return Err(LoaderError::InvalidDefault {
                    field: field.name.clone(),
                    expected: primitive.name().to_string(),
                });
            }

            if field.greedy {
                if primitive != Primitive::Text {
                    return Err(LoaderError::InvalidGreedy {
                        field: field.name.clone(),
                        reason: "only text fields can be greedy",
                    });
                }
                if index != last {
                    return Err(LoaderError::InvalidGreedy {
                        field: field.name.clone(),
                        reason: "only the last field can be greedy",
                    });
                }
            }

            let default = match (&field.default, primitive) {
                (Some(ArgValue::Integer(i)), Primitive::Number) => Some(ArgValue::Number(*i as f64)),
                (other, _) => other.clone(),
            };

            fields.push(CompiledField {
                name: field.name.clone(),
                primitive,
                optional: nullable || default.is_some(),
                default,
                description: field.description.clone(),
                greedy: field.greedy,
            });
        }

        Ok(Self { fields })
    }

    /// Help metadata for every field, in declaration order.
    pub fn arguments(&self) -> Vec<ArgumentHelp> {
        self.fields
            .iter()
            .map(|f| ArgumentHelp {
                name: f.name.clone(),
                description: f.description.clone(),
                optional: f.optional,
                default: f.default.clone(),
                type_name: f.primitive.name(),
            })
            .collect()
    }

    /// Tokenizes `text` with shell quoting rules and parses the tokens.
    pub fn parse(&self, text: &str) -> Result<Args, ParseError> {
        let tokens = shell_split(text)?;
        self.parse_tokens(&tokens)
    }

    /// Assigns tokens to fields positionally.
    ///
    /// Required fields always receive a token; optional fields are filled
    /// left to right with whatever tokens remain beyond the required ones.
    pub fn parse_tokens(&self, tokens: &[String]) -> Result<Args, ParseError> {
        let required: Vec<&CompiledField> = self.fields.iter().filter(|f| !f.optional).collect();
        if tokens.len() < required.len() {
            let missing = required[tokens.len()..]
                .iter()
                .map(|f| f.name.clone())
                .collect();
            return Err(ParseError::Missing(missing));
        }

        let mut values = Vec::with_capacity(self.fields.len());
        let mut next = 0;
        let mut required_left = required.len();

        for field in &self.fields {
            let available = tokens.len() - next;
            let take = if field.optional {
                available > required_left
            } else {
                required_left -= 1;
                true
            };

            let value = if take {
                let raw = if field.greedy {
                    let joined = tokens[next..].join(" ");
                    next = tokens.len();
                    joined
                } else {
                    next += 1;
                    tokens[next - 1].clone()
                };
                Some(field.primitive.coerce(&raw).ok_or_else(|| {
                    ParseError::InvalidValue {
                        field: field.name.clone(),
                        expected: field.primitive.name(),
                        value: raw.clone(),
                    }
                })?)
            } else {
                field.default.clone()
            };
            values.push((field.name.clone(), value));
        }

        if next < tokens.len() {
            return Err(ParseError::Unrecognized(tokens[next..].to_vec()));
        }

        Ok(Args { values })
    }

    /// Validates a decoded mapping against the fields.
    ///
    /// Keys are matched by name; `null` counts as omitted. Keys no field
    /// declares are skipped.
    pub fn parse_object(&self, object: &Map<String, Value>) -> Result<Args, ParseError> {
        let unknown: Vec<&String> = object
            .keys()
            .filter(|k| !self.fields.iter().any(|f| &f.name == *k))
            .collect();
        if !unknown.is_empty() {
            debug!(?unknown, "Ignoring undeclared payload keys");
        }

        let mut values = Vec::with_capacity(self.fields.len());
        let mut missing = Vec::new();

        for field in &self.fields {
            let value = match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if !field.optional {
                        missing.push(field.name.clone());
                    }
                    field.default.clone()
                }
                Some(raw) => Some(field.primitive.coerce_value(raw).ok_or_else(|| {
                    ParseError::InvalidValue {
                        field: field.name.clone(),
                        expected: field.primitive.name(),
                        value: match raw {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        },
                    }
                })?),
            };
            values.push((field.name.clone(), value));
        }

        if !missing.is_empty() {
            return Err(ParseError::Missing(missing));
        }

        Ok(Args { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn counter_schema() -> ArgumentSchema {
        ArgumentSchema::new().field(ArgumentField::integer("count").default(0))
    }

    #[test]
    fn test_field_type_parsing() {
        assert_eq!(FieldType::from("integer"), FieldType::Integer);
        assert_eq!(FieldType::from("float"), FieldType::Number);
        assert_eq!(FieldType::from("string"), FieldType::Text);
        assert_eq!(
            FieldType::from("int?"),
            FieldType::Nullable(Box::new(FieldType::Integer))
        );
        assert_eq!(
            FieldType::from("text[]"),
            FieldType::List(Box::new(FieldType::Text))
        );
        assert_eq!(FieldType::from("UserId"), FieldType::Named("UserId".into()));
    }

    #[test]
    fn test_optional_integer_with_default() {
        let parser = CompiledParser::compile(&counter_schema()).unwrap();

        let args = parser.parse("").unwrap();
        assert_eq!(args.integer("count"), Some(0));

        let args = parser.parse("5").unwrap();
        assert_eq!(args.integer("count"), Some(5));

        let err = parser.parse("abc").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                field: "count".into(),
                expected: "integer",
                value: "abc".into(),
            }
        );
        assert_eq!(
            Failure::from(err).kind(),
            floofbot_core::FailureKind::Syntax
        );
    }

    #[test]
    fn test_required_fields_and_coercion() {
        let schema = ArgumentSchema::new()
            .field(ArgumentField::text("name"))
            .field(ArgumentField::integer("age"))
            .field(ArgumentField::number("height"));
        let parser = CompiledParser::compile(&schema).unwrap();

        let args = parser.parse(r#""Ada Lovelace" 36 1.65"#).unwrap();
        assert_eq!(args.text("name"), Some("Ada Lovelace"));
        assert_eq!(args.integer("age"), Some(36));
        assert_eq!(args.number("height"), Some(1.65));

        assert_eq!(
            parser.parse("Ada").unwrap_err(),
            ParseError::Missing(vec!["age".into(), "height".into()])
        );
        assert!(matches!(
            parser.parse("Ada 36 tall"),
            Err(ParseError::InvalidValue { field, .. }) if field == "height"
        ));
    }

    #[test]
    fn test_surplus_tokens_are_rejected() {
        let parser = CompiledParser::compile(&counter_schema()).unwrap();
        assert_eq!(
            parser.parse("1 2 3").unwrap_err(),
            ParseError::Unrecognized(tokens(&["2", "3"]))
        );
    }

    #[test]
    fn test_optional_fields_fill_left_to_right() {
        let schema = ArgumentSchema::new()
            .field(ArgumentField::text("first").optional())
            .field(ArgumentField::text("target"))
            .field(ArgumentField::text("last").default("end"));
        let parser = CompiledParser::compile(&schema).unwrap();

        let args = parser.parse_tokens(&tokens(&["t"])).unwrap();
        assert_eq!(args.text("first"), None);
        assert_eq!(args.text("target"), Some("t"));
        assert_eq!(args.text("last"), Some("end"));

        let args = parser.parse_tokens(&tokens(&["a", "t"])).unwrap();
        assert_eq!(args.text("first"), Some("a"));
        assert_eq!(args.text("target"), Some("t"));
        assert_eq!(args.text("last"), Some("end"));

        let args = parser.parse_tokens(&tokens(&["a", "t", "z"])).unwrap();
        assert_eq!(args.text("last"), Some("z"));
    }

    #[test]
    fn test_greedy_last_field() {
        let schema = ArgumentSchema::new()
            .field(ArgumentField::text("user"))
            .field(ArgumentField::text("reason").optional().greedy());
        let parser = CompiledParser::compile(&schema).unwrap();

        let args = parser.parse("@bob being very rude").unwrap();
        assert_eq!(args.text("user"), Some("@bob"));
        assert_eq!(args.text("reason"), Some("being very rude"));

        let args = parser.parse("@bob").unwrap();
        assert_eq!(args.text("reason"), None);
    }

    #[test]
    fn test_unsupported_types_fail_compilation() {
        for declared in ["boolean", "text[]", "UserId", "bool?"] {
            let schema = ArgumentSchema::new().field(ArgumentField::new("flag", declared));
            assert!(matches!(
                CompiledParser::compile(&schema),
                Err(LoaderError::UnsupportedArgumentType { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_declarations_fail_compilation() {
        let bad_default =
            ArgumentSchema::new().field(ArgumentField::integer("count").default("zero"));
        assert!(matches!(
            CompiledParser::compile(&bad_default),
            Err(LoaderError::InvalidDefault { .. })
        ));

        let greedy_first = ArgumentSchema::new()
            .field(ArgumentField::text("rest").greedy())
            .field(ArgumentField::text("tail"));
        assert!(matches!(
            CompiledParser::compile(&greedy_first),
            Err(LoaderError::InvalidGreedy { .. })
        ));

        let greedy_int = ArgumentSchema::new().field(ArgumentField::integer("n").greedy());
        assert!(matches!(
            CompiledParser::compile(&greedy_int),
            Err(LoaderError::InvalidGreedy { .. })
        ));

        let duplicate = ArgumentSchema::new()
            .field(ArgumentField::text("a"))
            .field(ArgumentField::integer("a"));
        assert!(matches!(
            CompiledParser::compile(&duplicate),
            Err(LoaderError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_integer_default_on_number_field_is_widened() {
        let schema = ArgumentSchema::new().field(ArgumentField::number("ratio").default(1));
        let parser = CompiledParser::compile(&schema).unwrap();
        assert_eq!(parser.parse("").unwrap().get("ratio"), Some(&ArgValue::Number(1.0)));
    }

    #[test]
    fn test_tokenizer_errors_are_parse_errors() {
        let parser = CompiledParser::compile(&counter_schema()).unwrap();
        assert_eq!(
            parser.parse("\"5").unwrap_err().to_string(),
            "No closing quotation"
        );
    }

    #[test]
    fn test_parse_object() {
        let schema = ArgumentSchema::new()
            .field(ArgumentField::text("a"))
            .field(ArgumentField::integer("page").default(1));
        let parser = CompiledParser::compile(&schema).unwrap();

        let object = serde_json::json!({ "a": "n" });
        let args = parser.parse_object(object.as_object().unwrap()).unwrap();
        assert_eq!(args.text("a"), Some("n"));
        assert_eq!(args.integer("page"), Some(1));

        let object = serde_json::json!({ "a": "n", "page": "3" });
        let args = parser.parse_object(object.as_object().unwrap()).unwrap();
        assert_eq!(args.integer("page"), Some(3));

        let object = serde_json::json!({ "page": 2 });
        assert_eq!(
            parser.parse_object(object.as_object().unwrap()).unwrap_err(),
            ParseError::Missing(vec!["a".into()])
        );

        let object = serde_json::json!({ "a": "p", "extra": 1 });
        let args = parser.parse_object(object.as_object().unwrap()).unwrap();
        assert_eq!(args.text("a"), Some("p"));
        assert_eq!(args.integer("page"), Some(1));

        let object = serde_json::json!({ "b": "n" });
        assert_eq!(
            parser.parse_object(object.as_object().unwrap()).unwrap_err(),
            ParseError::Missing(vec!["a".into()])
        );
    }

    #[test]
    fn test_args_deserialize() {
        #[derive(serde::Deserialize)]
        struct Counter {
            count: i64,
            label: Option<String>,
        }

        let schema = counter_schema().field(ArgumentField::text("label").optional());
        let parser = CompiledParser::compile(&schema).unwrap();
        let counter: Counter = parser.parse("7").unwrap().deserialize().unwrap();
        assert_eq!(counter.count, 7);
        assert!(counter.label.is_none());
    }

    #[test]
    fn test_arguments_help_metadata() {
        let schema = ArgumentSchema::new()
            .field(ArgumentField::integer("count").default(0).describe("How many"))
            .field(ArgumentField::text("note").optional());
        let help = CompiledParser::compile(&schema).unwrap().arguments();
        assert_eq!(help.len(), 2);
        assert!(help[0].optional);
        assert_eq!(help[0].default, Some(ArgValue::Integer(0)));
        assert_eq!(help[0].type_name, "integer");
        assert_eq!(help[1].description, None);
    }
}
