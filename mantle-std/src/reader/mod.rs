//! Declarative validation of untrusted records.
//!
//! An [`ObjectReader`] checks an input record against a [`Schema`] and
//! produces a new record containing only the declared fields, with coerced
//! values. Every failing field is reported, not just the first.
//!
//! # Example
//!
//! ```rust,ignore
//! let reader = ObjectReader::new(
//!     Schema::new()
//!         .field("name", Rule::string(StringRule::new().min_length(1)))
//!         .field("age", Rule::number(NumberRule::new().integer()).optional()),
//! );
//! let record = reader.read_json_string(r#"{"name": "Ada", "age": "36"}"#)?;
//! ```

mod coerce;
mod error;
mod rule;

pub use error::{FieldErrors, FieldKey, ValidationError};
pub use rule::{ArrayRule, DateRule, NumberRule, Rule, Schema, SimpleRule, StringRule, Validator};

use mantle_core::{Record, Value};
use rule::RuleKind;

/// Default nesting limit for object, array and record rules.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Validates input records against a schema.
#[derive(Debug, Clone)]
pub struct ObjectReader {
    schema: Schema,
    max_depth: usize,
}

impl ObjectReader {
    /// A reader with the default depth budget.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply nested rules may recurse.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The schema this reader validates against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate `input`, which must be a record.
    pub fn read(&self, input: &Value) -> Result<Record, FieldErrors> {
        match input.as_record() {
            Some(record) => self.read_record(record),
            None => Err(FieldErrors::input(ValidationError::new(format!(
                "Expected an object, got {}",
                input.type_name()
            )))),
        }
    }

    /// Validate every schema field of `input`.
    ///
    /// Fields not in the schema are dropped. Optional fields that are absent
    /// or null are omitted from the result.
    pub fn read_record(&self, input: &Record) -> Result<Record, FieldErrors> {
        let mut output = Record::new();
        let mut errors = FieldErrors::default();

        for (name, rule) in self.schema.iter() {
            let key = FieldKey::Name(name.to_owned());
            match read_value(rule, input.get(name), &key, self.max_depth) {
                Ok(Some(value)) => {
                    output.insert(name.to_owned(), value);
                }
                Ok(None) => {}
                Err(err) => errors.insert(name, err.within(key)),
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            tracing::debug!(failed = errors.len(), "record failed validation");
            Err(errors)
        }
    }

    /// Validate a single schema field of `input`.
    ///
    /// Returns `Ok(None)` for an optional field that is absent or null.
    pub fn read_field(&self, input: &Record, name: &str) -> Result<Option<Value>, ValidationError> {
        let key = FieldKey::Name(name.to_owned());
        let rule = self
            .schema
            .get(name)
            .ok_or_else(|| ValidationError::new("Unknown field").within(key.clone()))?;
        read_value(rule, input.get(name), &key, self.max_depth).map_err(|err| err.within(key))
    }

    /// Parse `text` as JSON and validate the result.
    ///
    /// Malformed JSON is reported under [`FieldErrors::INPUT_KEY`].
    pub fn read_json_string(&self, text: &str) -> Result<Record, FieldErrors> {
        let json: serde_json::Value = serde_json::from_str(text).map_err(|err| {
            FieldErrors::input(ValidationError::new(format!("Invalid JSON: {err}")))
        })?;
        self.read(&Value::from(json))
    }
}

fn read_value(
    rule: &Rule,
    value: Option<&Value>,
    key: &FieldKey,
    depth: usize,
) -> Result<Option<Value>, ValidationError> {
    if rule.optional && value.is_none_or(Value::is_null) {
        return Ok(None);
    }
    let Some(value) = value else {
        return match &rule.kind {
            RuleKind::Custom(validator) => validator(None, key).map(Some),
            _ => Err(ValidationError::new("Required")),
        };
    };

    match &rule.kind {
        RuleKind::Simple(simple) => coerce::check_simple(simple, value).map(Some),
        RuleKind::Object(schema) => {
            let input = nested_record(value, depth)?;
            let mut output = Record::new();
            for (name, field) in schema.iter() {
                let key = FieldKey::Name(name.to_owned());
                if let Some(read) = read_value(field, input.get(name), &key, depth - 1)
                    .map_err(|err| err.within(key))?
                {
                    output.insert(name.to_owned(), read);
                }
            }
            Ok(Some(Value::Record(output)))
        }
        RuleKind::Record(values) => {
            let input = nested_record(value, depth)?;
            let mut output = Record::new();
            for (name, item) in input {
                let key = FieldKey::Name(name.clone());
                if let Some(read) =
                    read_value(values, Some(item), &key, depth - 1).map_err(|err| err.within(key))?
                {
                    output.insert(name.clone(), read);
                }
            }
            Ok(Some(Value::Record(output)))
        }
        RuleKind::Array(array) => {
            check_depth(depth)?;
            let items = value.as_list().ok_or_else(|| {
                ValidationError::new(format!("Expected an array, got {}", value.type_name()))
            })?;
            if let Some(min) = array.min_length {
                if items.len() < min {
                    return Err(ValidationError::new(format!(
                        "Must contain at least {min} items"
                    )));
                }
            }
            if let Some(max) = array.max_length {
                if items.len() > max {
                    return Err(ValidationError::new(format!(
                        "Must contain at most {max} items"
                    )));
                }
            }
            let Some(item_rule) = &array.items else {
                return Ok(Some(value.clone()));
            };
            let mut output = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let key = FieldKey::Index(index);
                let read = read_value(item_rule, Some(item), &key, depth - 1)
                    .map_err(|err| err.within(key))?;
                output.push(read.unwrap_or(Value::Null));
            }
            Ok(Some(Value::List(output)))
        }
        RuleKind::Custom(validator) => validator(Some(value), key).map(Some),
    }
}

fn check_depth(depth: usize) -> Result<(), ValidationError> {
    if depth == 0 {
        Err(ValidationError::new("Maximum nesting depth exceeded"))
    } else {
        Ok(())
    }
}

fn nested_record(value: &Value, depth: usize) -> Result<&Record, ValidationError> {
    check_depth(depth)?;
    value.as_record().ok_or_else(|| {
        ValidationError::new(format!("Expected an object, got {}", value.type_name()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> Value {
        Value::from(serde_json::from_str::<serde_json::Value>(json).unwrap())
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let reader = ObjectReader::new(Schema::new().field("a", Rule::any()));
        let out = reader.read(&record(r#"{"a": 1, "b": 2}"#)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out["a"], Value::Number(1.0));
    }

    #[test]
    fn test_all_failures_are_collected() {
        let reader = ObjectReader::new(
            Schema::new()
                .field("name", Rule::string(StringRule::new()))
                .field("active", Rule::boolean())
                .field("count", Rule::number(NumberRule::new())),
        );
        let errors = reader
            .read(&record(r#"{"name": 3, "count": 1}"#))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains("name"));
        assert!(errors.contains("active"));
    }

    #[test]
    fn test_nested_error_path() {
        let reader = ObjectReader::new(Schema::new().field(
            "address",
            Rule::object(Schema::new().field(
                "lines",
                Rule::array(ArrayRule::of(Rule::string(StringRule::new()))),
            )),
        ));
        let errors = reader
            .read(&record(r#"{"address": {"lines": ["a", "b", 3]}}"#))
            .unwrap_err();
        let err = errors.get("address").unwrap();
        assert_eq!(err.path_string(), "address.lines[2]");
    }

    #[test]
    fn test_record_rule() {
        let reader = ObjectReader::new(
            Schema::new().field("scores", Rule::record(Rule::number(NumberRule::new()))),
        );
        let out = reader
            .read(&record(r#"{"scores": {"x": "1", "y": 2}}"#))
            .unwrap();
        let scores = out["scores"].as_record().unwrap();
        assert_eq!(scores["x"], Value::Number(1.0));
        assert!(reader.read(&record(r#"{"scores": {"x": "no"}}"#)).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let nested = Rule::object(Schema::new().field(
            "inner",
            Rule::object(Schema::new().field("inner", Rule::any())),
        ));
        let reader = ObjectReader::new(Schema::new().field("inner", nested)).with_max_depth(1);
        let errors = reader
            .read(&record(r#"{"inner": {"inner": {"inner": 1}}}"#))
            .unwrap_err();
        assert_eq!(
            errors.get("inner").unwrap().message(),
            "Maximum nesting depth exceeded"
        );
    }

    fn nested(levels: usize) -> (Rule, Value) {
        let mut rule = Rule::any();
        let mut value = Value::Number(1.0);
        for _ in 0..levels {
            rule = Rule::object(Schema::new().field("inner", rule));
            value = Value::Record(Record::from([("inner".to_owned(), value)]));
        }
        (rule, value)
    }

    #[test]
    fn test_default_depth_budget() {
        let (rule, value) = nested(DEFAULT_MAX_DEPTH);
        let reader = ObjectReader::new(Schema::new().field("inner", rule));
        let input = Record::from([("inner".to_owned(), value)]);
        assert!(reader.read_record(&input).is_ok());

        let (rule, value) = nested(DEFAULT_MAX_DEPTH + 1);
        let reader = ObjectReader::new(Schema::new().field("inner", rule));
        let input = Record::from([("inner".to_owned(), value)]);
        let errors = reader.read_record(&input).unwrap_err();
        assert_eq!(
            errors.get("inner").unwrap().message(),
            "Maximum nesting depth exceeded"
        );
    }

    #[test]
    fn test_custom_rule_sees_absent_values() {
        let reader = ObjectReader::new(Schema::new().field(
            "token",
            Rule::custom(|value, _key| match value {
                Some(v) => Ok(v.clone()),
                None => Ok(Value::from("generated")),
            }),
        ));
        let out = reader.read(&record("{}")).unwrap();
        assert_eq!(out["token"], Value::from("generated"));
    }

    #[test]
    fn test_read_field_unknown() {
        let reader = ObjectReader::new(Schema::new());
        let err = reader.read_field(&Record::new(), "nope").unwrap_err();
        assert_eq!(err.path(), &[FieldKey::Name("nope".into())]);
    }
}
