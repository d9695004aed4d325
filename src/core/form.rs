//! Declarative form schemas.
//!
//! Admin and public forms describe their fields once; the same description is
//! served to clients for rendering and used here to validate submissions.

use crate::core::validation::{MSG_EMAIL, MSG_PHONE, MSG_URL, is_valid_email, is_valid_phone, is_valid_url};
use crate::errors::FieldErrors;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Input widget / value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line text
    Textarea,
    /// Email address
    Email,
    /// Indonesian phone number
    Phone,
    /// Number, given as JSON number or numeric string
    Number,
    /// http(s) URL
    Url,
    /// `YYYY-MM-DD`
    Date,
    /// One of `options`
    Select,
    /// Boolean
    Checkbox,
    /// Array of strings
    List,
}

/// One field of a form
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    /// Key in the submitted object
    pub name: String,
    /// Label shown to users and used in messages
    pub label: String,
    /// Value type
    pub kind: FieldKind,
    /// Blank values are rejected
    pub required: bool,
    /// Allowed values for [`FieldKind::Select`]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Lower bound for numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound for numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum text length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum text length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldSpec {
    /// An optional field without constraints
    #[must_use]
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            options: Vec::new(),
            min: None,
            max: None,
            min_length: None,
            max_length: None,
        }
    }

    /// Marks the field required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets allowed values
    #[must_use]
    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| (*o).to_string()).collect();
        self
    }

    /// Sets a numeric lower bound
    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets a numeric upper bound
    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets text length bounds
    #[must_use]
    pub const fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(_) => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Checks `values` against `fields`; returns one message per failing field.
///
/// Keys not described by `fields` are ignored.
#[must_use]
pub fn validate(fields: &[FieldSpec], values: &Map<String, Value>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in fields {
        let value = values.get(&field.name);
        if is_blank(value) {
            if field.required {
                errors.insert(field.name.clone(), format!("{} wajib diisi", field.label));
            }
            continue;
        }
        let Some(value) = value else { continue };
        if let Some(message) = check_value(field, value) {
            errors.insert(field.name.clone(), message);
        }
    }
    errors
}

fn check_value(field: &FieldSpec, value: &Value) -> Option<String> {
    match field.kind {
        FieldKind::Number => {
            let Some(n) = as_number(value) else {
                return Some("Harus berupa angka".to_string());
            };
            if let Some(min) = field.min.filter(|min| n < *min) {
                return Some(format!("Minimal {min}"));
            }
            field.max.filter(|max| n > *max).map(|max| format!("Maksimal {max}"))
        }
        FieldKind::Checkbox => (!value.is_boolean()).then(|| "Format tidak valid".to_string()),
        FieldKind::List => {
            let ok = value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            (!ok).then(|| "Harus berupa daftar".to_string())
        }
        _ => {
            let Some(text) = value.as_str() else {
                return Some("Format tidak valid".to_string());
            };
            check_text(field, text.trim())
        }
    }
}

fn check_text(field: &FieldSpec, text: &str) -> Option<String> {
    let invalid = match field.kind {
        FieldKind::Email => (!is_valid_email(text)).then_some(MSG_EMAIL),
        FieldKind::Phone => (!is_valid_phone(text)).then_some(MSG_PHONE),
        FieldKind::Url => (!is_valid_url(text)).then_some(MSG_URL),
        FieldKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .is_err()
            .then_some("Format tanggal tidak valid"),
        FieldKind::Select => (!field.options.iter().any(|o| o == text)).then_some("Pilihan tidak valid"),
        _ => None,
    };
    if let Some(message) = invalid {
        return Some(message.to_string());
    }

    if matches!(field.kind, FieldKind::Text | FieldKind::Textarea | FieldKind::Email) {
        let len = text.chars().count();
        if let Some(min) = field.min_length.filter(|min| len < *min) {
            return Some(format!("Minimal {min} karakter"));
        }
        if let Some(max) = field.max_length.filter(|max| len > *max) {
            return Some(format!("Maksimal {max} karakter"));
        }
    }
    None
}

/// Prepares validated browser values for typed deserialization.
///
/// Numeric strings become numbers, blank strings on non-text fields are
/// dropped so optional fields fall back to their defaults, and text is trimmed.
#[must_use]
pub fn normalize(fields: &[FieldSpec], values: &Map<String, Value>) -> Map<String, Value> {
    let mut out = values.clone();
    for field in fields {
        let Some(Value::String(raw)) = out.get(&field.name) else {
            continue;
        };
        let trimmed = raw.trim().to_string();
        let replacement = match field.kind {
            FieldKind::Number if trimmed.is_empty() => None,
            FieldKind::Number => Some(
                trimmed
                    .parse::<i64>()
                    .map(|n| Value::Number(n.into()))
                    .or_else(|_| {
                        trimmed
                            .parse::<f64>()
                            .ok()
                            .and_then(Number::from_f64)
                            .map(Value::Number)
                            .ok_or(())
                    })
                    .unwrap_or(Value::String(trimmed)),
            ),
            FieldKind::Date | FieldKind::Url | FieldKind::Select | FieldKind::Email
                if trimmed.is_empty() =>
            {
                None
            }
            _ => Some(Value::String(trimmed)),
        };
        match replacement {
            Some(value) => {
                out.insert(field.name.clone(), value);
            }
            None => {
                out.remove(&field.name);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("name", "Nama", FieldKind::Text)
                .required()
                .length(Some(3), Some(10)),
            FieldSpec::new("email", "Email", FieldKind::Email),
            FieldSpec::new("phone", "Telepon", FieldKind::Phone),
            FieldSpec::new("website", "Website", FieldKind::Url),
            FieldSpec::new("quota", "Kuota", FieldKind::Number).min(1.0).max(500.0),
            FieldSpec::new("gender", "Jenis Kelamin", FieldKind::Select).options(&["L", "P"]),
            FieldSpec::new("birth_date", "Tanggal Lahir", FieldKind::Date),
            FieldSpec::new("subjects", "Mata Pelajaran", FieldKind::List).required(),
            FieldSpec::new("agree", "Persetujuan", FieldKind::Checkbox).required(),
        ]
    }

    fn check(value: Value) -> FieldErrors {
        validate(&fields(), value.as_object().unwrap())
    }

    #[test]
    fn test_valid_submission_has_no_errors() {
        let errors = check(json!({
            "name": "Budi",
            "email": "budi@example.com",
            "phone": "081234567890",
            "website": "https://example.com",
            "quota": "36",
            "gender": "L",
            "birth_date": "2010-05-17",
            "subjects": ["Matematika"],
            "agree": true,
            "unknown": 1,
        }));
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_required_fields() {
        let errors = check(json!({ "name": "  ", "subjects": [], "agree": false }));
        assert_eq!(errors["name"], "Nama wajib diisi");
        assert_eq!(errors["subjects"], "Mata Pelajaran wajib diisi");
        assert_eq!(errors["agree"], "Persetujuan wajib diisi");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_format_errors() {
        let errors = check(json!({
            "name": "Budi",
            "email": "budi",
            "phone": "0812-abc",
            "website": "example.com",
            "quota": "banyak",
            "gender": "X",
            "birth_date": "17/05/2010",
            "subjects": [1, 2],
            "agree": "yes",
        }));
        assert_eq!(errors["email"], MSG_EMAIL);
        assert_eq!(errors["phone"], MSG_PHONE);
        assert_eq!(errors["website"], MSG_URL);
        assert_eq!(errors["quota"], "Harus berupa angka");
        assert_eq!(errors["gender"], "Pilihan tidak valid");
        assert_eq!(errors["birth_date"], "Format tanggal tidak valid");
        assert_eq!(errors["subjects"], "Harus berupa daftar");
        assert_eq!(errors["agree"], "Format tidak valid");
    }

    #[test]
    fn test_bounds() {
        let errors = check(json!({ "name": "Al", "quota": 0, "subjects": ["x"], "agree": true }));
        assert_eq!(errors["name"], "Minimal 3 karakter");
        assert_eq!(errors["quota"], "Minimal 1");

        let errors = check(json!({ "name": "Abdurrahman Wahid", "quota": 501, "subjects": ["x"], "agree": true }));
        assert_eq!(errors["name"], "Maksimal 10 karakter");
        assert_eq!(errors["quota"], "Maksimal 500");
    }

    #[test]
    fn test_normalize() {
        let values = json!({
            "name": "  Budi ",
            "quota": " 36 ",
            "website": "",
            "birth_date": "",
            "extra": "kept",
        });
        let out = normalize(&fields(), values.as_object().unwrap());
        assert_eq!(out["name"], json!("Budi"));
        assert_eq!(out["quota"], json!(36));
        assert!(!out.contains_key("website"));
        assert!(!out.contains_key("birth_date"));
        assert_eq!(out["extra"], json!("kept"));
    }

    #[test]
    fn test_schema_serializes_for_clients() {
        let spec = FieldSpec::new("gender", "Jenis Kelamin", FieldKind::Select)
            .required()
            .options(&["L", "P"]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "select");
        assert_eq!(json["options"], json!(["L", "P"]));
        assert!(json.get("min").is_none());
    }
}
