//! Request payload validation: pulls typed fields out of a JSON object and collects
//! per-field messages instead of failing on the first problem.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

pub const MISSING_FIELD: &str = "Missing data for required field.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_A_NUMBER: &str = "Not a valid number.";
pub const NOT_AN_INTEGER: &str = "Not a valid integer.";
pub const NOT_AN_EMAIL: &str = "Not a valid email address.";
pub const NOT_A_DATETIME: &str = "Not a valid datetime.";
pub const NEGATIVE_NUMBER: &str = "Must be greater than or equal to 0.";
pub const UNKNOWN_FIELD: &str = "Unknown field.";
pub const INVALID_INPUT_TYPE: &str = "Invalid input type.";

/// Key used for errors that concern the payload as a whole.
pub const SCHEMA_KEY: &str = "_schema";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"));

/// Field name -> messages. Serializes as a plain JSON object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}

/// A JSON object being validated against a fixed set of known keys.
///
/// Every getter that returns `None` has recorded an error, so callers can
/// build their typed input when all getters returned `Some` and the error
/// set is empty.
pub struct Fields {
    map: Map<String, Value>,
    errors: FieldErrors,
}

impl Fields {
    /// Accepts only JSON objects. Keys outside `known` are reported as unknown.
    pub fn from_body(body: Value, known: &[&str]) -> Result<Self, FieldErrors> {
        let map = match body {
            Value::Object(m) => m,
            _ => {
                let mut errors = FieldErrors::new();
                errors.add(SCHEMA_KEY, INVALID_INPUT_TYPE);
                return Err(errors);
            }
        };
        let mut errors = FieldErrors::new();
        for key in map.keys() {
            if !known.contains(&key.as_str()) {
                errors.add(key, UNKNOWN_FIELD);
            }
        }
        Ok(Fields { map, errors })
    }

    fn present(&mut self, field: &str) -> Option<Value> {
        match self.map.get(field) {
            None | Some(Value::Null) => {
                self.errors.add(field, MISSING_FIELD);
                None
            }
            Some(v) => Some(v.clone()),
        }
    }

    /// Required string of at most `max_len` characters.
    pub fn required_str(&mut self, field: &str, max_len: usize) -> Option<String> {
        let s = match self.present(field)? {
            Value::String(s) => s,
            _ => {
                self.errors.add(field, NOT_A_STRING);
                return None;
            }
        };
        if s.chars().count() > max_len {
            self.errors.add(field, format!("Longer than maximum length {}.", max_len));
            return None;
        }
        Some(s)
    }

    /// Required string that must look like an email address.
    pub fn required_email(&mut self, field: &str, max_len: usize) -> Option<String> {
        let s = self.required_str(field, max_len)?;
        if !EMAIL_RE.is_match(&s) {
            self.errors.add(field, NOT_AN_EMAIL);
            return None;
        }
        Some(s)
    }

    /// Required finite, non-negative number. Numeric strings are accepted.
    pub fn required_amount(&mut self, field: &str) -> Option<f64> {
        let n = match self.present(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(n) = n.filter(|n| n.is_finite()) else {
            self.errors.add(field, NOT_A_NUMBER);
            return None;
        };
        if n < 0.0 {
            self.errors.add(field, NEGATIVE_NUMBER);
            return None;
        }
        Some(n)
    }

    /// Required integer id. Integer-valued strings are accepted.
    pub fn required_id(&mut self, field: &str) -> Option<i32> {
        let n = match self.present(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match n.and_then(|n| i32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                self.errors.add(field, NOT_AN_INTEGER);
                None
            }
        }
    }

    /// Optional timestamp: RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC.
    /// `None` when absent or null; a malformed value also yields `None` but records an error.
    pub fn optional_datetime(&mut self, field: &str) -> Option<DateTime<Utc>> {
        let raw = match self.map.get(field) {
            None | Some(Value::Null) => return None,
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.errors.add(field, NOT_A_DATETIME);
                return None;
            }
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        self.errors.add(field, NOT_A_DATETIME);
        None
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_body_is_a_schema_error() {
        let errors = Fields::from_body(json!([1, 2]), &["name"]).err().unwrap();
        assert_eq!(errors.get(SCHEMA_KEY), Some(&[INVALID_INPUT_TYPE.to_string()][..]));
    }

    #[test]
    fn unknown_keys_are_reported() {
        let fields = Fields::from_body(json!({"name": "x", "id": 4}), &["name"]).unwrap();
        let errors = fields.into_errors();
        assert_eq!(errors.get("id"), Some(&[UNKNOWN_FIELD.to_string()][..]));
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn missing_and_null_are_both_missing() {
        let mut fields = Fields::from_body(json!({"address": null}), &["name", "address"]).unwrap();
        assert!(fields.required_str("name", 10).is_none());
        assert!(fields.required_str("address", 10).is_none());
        let errors = fields.into_errors();
        assert_eq!(errors.get("name"), Some(&[MISSING_FIELD.to_string()][..]));
        assert_eq!(errors.get("address"), Some(&[MISSING_FIELD.to_string()][..]));
    }

    #[test]
    fn length_counts_characters() {
        let mut fields = Fields::from_body(json!({"name": "ééé", "long": "abcd"}), &["name", "long"]).unwrap();
        assert_eq!(fields.required_str("name", 3).as_deref(), Some("ééé"));
        assert!(fields.required_str("long", 3).is_none());
        assert_eq!(
            fields.into_errors().get("long"),
            Some(&["Longer than maximum length 3.".to_string()][..])
        );
    }

    #[test]
    fn wrong_types_are_reported() {
        let mut fields =
            Fields::from_body(json!({"name": 5, "price": true, "user_id": 1.5}), &["name", "price", "user_id"])
                .unwrap();
        assert!(fields.required_str("name", 10).is_none());
        assert!(fields.required_amount("price").is_none());
        assert!(fields.required_id("user_id").is_none());
        let errors = fields.into_errors();
        assert_eq!(errors.get("name"), Some(&[NOT_A_STRING.to_string()][..]));
        assert_eq!(errors.get("price"), Some(&[NOT_A_NUMBER.to_string()][..]));
        assert_eq!(errors.get("user_id"), Some(&[NOT_AN_INTEGER.to_string()][..]));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let mut fields = Fields::from_body(json!({"price": "9.5", "user_id": "12"}), &["price", "user_id"]).unwrap();
        assert_eq!(fields.required_amount("price"), Some(9.5));
        assert_eq!(fields.required_id("user_id"), Some(12));
        assert!(fields.into_errors().is_empty());
    }

    #[test]
    fn negative_amount_rejected() {
        let mut fields = Fields::from_body(json!({"price": -1}), &["price"]).unwrap();
        assert!(fields.required_amount("price").is_none());
        assert_eq!(fields.into_errors().get("price"), Some(&[NEGATIVE_NUMBER.to_string()][..]));
    }

    #[test]
    fn email_shape() {
        let mut fields =
            Fields::from_body(json!({"good": "a@x.com", "bad": "not-an-email"}), &["good", "bad"]).unwrap();
        assert_eq!(fields.required_email("good", 200).as_deref(), Some("a@x.com"));
        assert!(fields.required_email("bad", 200).is_none());
        assert_eq!(fields.into_errors().get("bad"), Some(&[NOT_AN_EMAIL.to_string()][..]));
    }

    #[test]
    fn datetimes() {
        let mut fields = Fields::from_body(
            json!({"a": "2024-05-01T10:00:00Z", "b": "2024-05-01T10:00:00", "c": "yesterday"}),
            &["a", "b", "c", "d"],
        )
        .unwrap();
        let a = fields.optional_datetime("a").unwrap();
        let b = fields.optional_datetime("b").unwrap();
        assert_eq!(a, b);
        assert!(fields.optional_datetime("c").is_none());
        assert!(fields.optional_datetime("d").is_none());
        let errors = fields.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("c"), Some(&[NOT_A_DATETIME.to_string()][..]));
    }

    #[test]
    fn display_joins_fields() {
        let mut errors = FieldErrors::new();
        errors.add("name", MISSING_FIELD);
        errors.add("email", NOT_AN_EMAIL);
        assert_eq!(
            errors.to_string(),
            "email: Not a valid email address.; name: Missing data for required field."
        );
    }
}
