//! Schema rules.

use super::error::{FieldKey, ValidationError};
use chrono::{DateTime, Utc};
use mantle_core::Value;
use regex::Regex;
use std::fmt;
use std::rc::Rc;

/// A custom field validator: receives the raw value (if present) and its key.
pub type Validator = Rc<dyn Fn(Option<&Value>, &FieldKey) -> Result<Value, ValidationError>>;

/// Constraint for one field, list element or record value.
///
/// Exactly one kind per rule; any rule can be made [`optional`](Rule::optional).
#[derive(Clone)]
pub struct Rule {
    pub(crate) kind: RuleKind,
    pub(crate) optional: bool,
}

#[derive(Clone)]
pub(crate) enum RuleKind {
    Custom(Validator),
    Array(ArrayRule),
    Object(Schema),
    Record(Box<Rule>),
    Simple(SimpleRule),
}

/// Rules for scalar values. At most one constraint family applies.
#[derive(Clone, Debug)]
pub enum SimpleRule {
    /// Any present value.
    Any,
    /// A boolean.
    Boolean,
    /// A string.
    String(StringRule),
    /// A number, or a numeric string.
    Number(NumberRule),
    /// A date, a date string or epoch milliseconds.
    Date(DateRule),
    /// One of a fixed set of values.
    OneOf(Vec<Value>),
}

impl Rule {
    fn simple(rule: SimpleRule) -> Self {
        Self {
            kind: RuleKind::Simple(rule),
            optional: false,
        }
    }

    /// Accept any present value.
    pub fn any() -> Self {
        Self::simple(SimpleRule::Any)
    }

    /// Accept a boolean.
    pub fn boolean() -> Self {
        Self::simple(SimpleRule::Boolean)
    }

    /// Accept a string.
    pub fn string(rule: StringRule) -> Self {
        Self::simple(SimpleRule::String(rule))
    }

    /// Accept a number or numeric string.
    pub fn number(rule: NumberRule) -> Self {
        Self::simple(SimpleRule::Number(rule))
    }

    /// Accept a date, date string or epoch milliseconds.
    pub fn date(rule: DateRule) -> Self {
        Self::simple(SimpleRule::Date(rule))
    }

    /// Accept only values equal to one of `values`.
    pub fn one_of<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::simple(SimpleRule::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// Accept a list.
    pub fn array(rule: ArrayRule) -> Self {
        Self {
            kind: RuleKind::Array(rule),
            optional: false,
        }
    }

    /// A nested record validated against `schema`.
    pub fn object(schema: Schema) -> Self {
        Self {
            kind: RuleKind::Object(schema),
            optional: false,
        }
    }

    /// A record of arbitrary keys whose values all satisfy `values`.
    pub fn record(values: Rule) -> Self {
        Self {
            kind: RuleKind::Record(Box::new(values)),
            optional: false,
        }
    }

    /// A rule implemented by `validator`. The validator is also called for
    /// absent values unless the rule is optional.
    pub fn custom<F>(validator: F) -> Self
    where
        F: Fn(Option<&Value>, &FieldKey) -> Result<Value, ValidationError> + 'static,
    {
        Self {
            kind: RuleKind::Custom(Rc::new(validator)),
            optional: false,
        }
    }

    /// Let the value be absent (or null); it is then omitted from the result.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether absent and null values are allowed.
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Rule");
        match &self.kind {
            RuleKind::Custom(_) => s.field("kind", &"custom"),
            RuleKind::Array(rule) => s.field("array", rule),
            RuleKind::Object(schema) => s.field("object", schema),
            RuleKind::Record(rule) => s.field("record", rule),
            RuleKind::Simple(rule) => s.field("simple", rule),
        };
        s.field("optional", &self.optional).finish()
    }
}

/// String constraints. Lengths count characters.
#[derive(Clone, Debug, Default)]
pub struct StringRule {
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) pattern: Option<Regex>,
    pub(crate) trim: bool,
}

impl StringRule {
    /// No constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum number of characters.
    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    /// Maximum number of characters.
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Require the (trimmed, if enabled) string to match `pattern`.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Strip surrounding whitespace before checking and in the result.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }
}

/// Number constraints.
#[derive(Clone, Debug, Default)]
pub struct NumberRule {
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) integer: bool,
    pub(crate) positive: bool,
}

impl NumberRule {
    /// No constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Reject fractional values.
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    /// Require a value strictly greater than zero.
    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }
}

/// Date constraints (inclusive bounds).
#[derive(Clone, Debug, Default)]
pub struct DateRule {
    pub(crate) min: Option<DateTime<Utc>>,
    pub(crate) max: Option<DateTime<Utc>>,
}

impl DateRule {
    /// No constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest accepted date.
    pub fn min(mut self, min: DateTime<Utc>) -> Self {
        self.min = Some(min);
        self
    }

    /// Latest accepted date.
    pub fn max(mut self, max: DateTime<Utc>) -> Self {
        self.max = Some(max);
        self
    }
}

/// List constraints.
#[derive(Clone, Debug, Default)]
pub struct ArrayRule {
    pub(crate) items: Option<Box<Rule>>,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
}

impl ArrayRule {
    /// A list of anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A list whose elements satisfy `items`.
    pub fn of(items: Rule) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Minimum number of elements.
    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    /// Maximum number of elements.
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }
}

/// An ordered mapping from field name to rule.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<(String, Rule)>,
}

impl Schema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rule for `name`.
    pub fn field(mut self, name: impl Into<String>, rule: Rule) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = rule,
            None => self.fields.push((name, rule)),
        }
        self
    }

    /// The rule for `name`.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rule)| rule)
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
