//! Scalar checks and coercions.

use super::error::ValidationError;
use super::rule::{DateRule, NumberRule, SimpleRule, StringRule};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mantle_core::Value;

pub(crate) fn check_simple(rule: &SimpleRule, value: &Value) -> Result<Value, ValidationError> {
    match rule {
        SimpleRule::Any => Ok(value.clone()),
        SimpleRule::Boolean => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| expected("a boolean", value)),
        SimpleRule::String(rule) => check_string(rule, value),
        SimpleRule::Number(rule) => check_number(rule, value),
        SimpleRule::Date(rule) => check_date(rule, value),
        SimpleRule::OneOf(options) => {
            if options.contains(value) {
                Ok(value.clone())
            } else {
                Err(ValidationError::new("Must be one of the allowed values"))
            }
        }
    }
}

fn expected(what: &str, value: &Value) -> ValidationError {
    ValidationError::new(format!("Expected {what}, got {}", value.type_name()))
}

fn check_string(rule: &StringRule, value: &Value) -> Result<Value, ValidationError> {
    let text = value.as_str().ok_or_else(|| expected("a string", value))?;
    let text = if rule.trim { text.trim() } else { text };

    let length = text.chars().count();
    if let Some(min) = rule.min_length {
        if length < min {
            return Err(ValidationError::new(format!(
                "Must be at least {min} characters"
            )));
        }
    }
    if let Some(max) = rule.max_length {
        if length > max {
            return Err(ValidationError::new(format!(
                "Must be at most {max} characters"
            )));
        }
    }
    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(text) {
            return Err(ValidationError::new("Does not match the required format"));
        }
    }
    Ok(Value::String(text.to_owned()))
}

fn check_number(rule: &NumberRule, value: &Value) -> Result<Value, ValidationError> {
    let number = match value {
        Value::Number(n) => *n,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::new("Expected a number"))?,
        other => return Err(expected("a number", other)),
    };
    if !number.is_finite() {
        return Err(ValidationError::new("Expected a finite number"));
    }
    if rule.integer && number.fract() != 0.0 {
        return Err(ValidationError::new("Must be a whole number"));
    }
    if rule.positive && number <= 0.0 {
        return Err(ValidationError::new("Must be positive"));
    }
    if let Some(min) = rule.min {
        if number < min {
            return Err(ValidationError::new(format!("Must be at least {min}")));
        }
    }
    if let Some(max) = rule.max {
        if number > max {
            return Err(ValidationError::new(format!("Must be at most {max}")));
        }
    }
    Ok(Value::Number(number))
}

fn check_date(rule: &DateRule, value: &Value) -> Result<Value, ValidationError> {
    let date = match value {
        Value::Date(date) => Some(*date),
        Value::String(s) => parse_date(s),
        Value::Number(ms) if ms.is_finite() => DateTime::from_timestamp_millis(*ms as i64),
        other => return Err(expected("a date", other)),
    };
    let date = date.ok_or_else(|| ValidationError::new("Expected a valid date"))?;

    if let Some(min) = rule.min {
        if date < min {
            return Err(ValidationError::new(format!(
                "Must not be before {}",
                min.to_rfc3339()
            )));
        }
    }
    if let Some(max) = rule.max {
        if date > max {
            return Err(ValidationError::new(format!(
                "Must not be after {}",
                max.to_rfc3339()
            )));
        }
    }
    Ok(Value::Date(date))
}

/// Accepts RFC 3339, naive date-times (read as UTC) and plain `YYYY-MM-DD`.
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    #[test]
    fn test_numeric_strings_are_coerced() {
        let rule = NumberRule::new().integer();
        assert_eq!(check_number(&rule, &" 42 ".into()).unwrap(), Value::Number(42.0));
        assert!(check_number(&rule, &"4.5".into()).is_err());
        assert!(check_number(&rule, &"abc".into()).is_err());
        assert!(check_number(&rule, &true.into()).is_err());
    }

    #[test]
    fn test_number_bounds() {
        let rule = NumberRule::new().min(1.0).max(10.0);
        assert!(check_number(&rule, &Value::Number(0.5)).is_err());
        assert!(check_number(&rule, &Value::Number(10.0)).is_ok());
        let err = check_number(&rule, &Value::Number(11.0)).unwrap_err();
        assert_eq!(err.message(), "Must be at most 10");
        assert!(check_number(&NumberRule::new().positive(), &Value::Number(0.0)).is_err());
    }

    #[test]
    fn test_string_trim_and_pattern() {
        let rule = StringRule::new()
            .trim()
            .min_length(2)
            .pattern(Regex::new("^[a-z]+$").unwrap());
        assert_eq!(check_string(&rule, &"  abc ".into()).unwrap(), Value::from("abc"));
        assert!(check_string(&rule, &" a ".into()).is_err());
        assert!(check_string(&rule, &"ABC".into()).is_err());
    }

    #[test]
    fn test_string_length_counts_characters() {
        let rule = StringRule::new().max_length(3);
        assert!(check_string(&rule, &"äöü".into()).is_ok());
        assert!(check_string(&rule, &"äöüß".into()).is_err());
    }

    #[test]
    fn test_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for input in [
            Value::from("2024-03-01"),
            Value::from("2024-03-01T00:00:00Z"),
            Value::from("2024-03-01T02:00:00+02:00"),
            Value::from("2024-03-01 00:00:00"),
            Value::Number(expected.timestamp_millis() as f64),
            Value::Date(expected),
        ] {
            assert_eq!(
                check_date(&DateRule::new(), &input).unwrap(),
                Value::Date(expected),
                "input {input}"
            );
        }
        assert!(check_date(&DateRule::new(), &"yesterday".into()).is_err());
    }

    #[test]
    fn test_date_bounds() {
        let min = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rule = DateRule::new().min(min);
        assert!(check_date(&rule, &"2023-12-31".into()).is_err());
        assert!(check_date(&rule, &"2024-01-01".into()).is_ok());
    }

    #[test]
    fn test_one_of() {
        let rule = SimpleRule::OneOf(vec!["red".into(), "green".into()]);
        assert!(check_simple(&rule, &"red".into()).is_ok());
        assert!(check_simple(&rule, &"blue".into()).is_err());
    }
}
