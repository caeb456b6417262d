use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::types::canonical_uuid;

/// Storage kind of a resource column; decides validation and the bind cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_len: usize },
    Date,
    /// Non-negative numeric(precision, scale)
    Decimal { precision: u32, scale: u32 },
    Uuid,
    Bool,
}

impl FieldKind {
    pub fn cast(&self) -> Option<&'static str> {
        match self {
            FieldKind::Text { .. } => None,
            FieldKind::Date => Some("date"),
            FieldKind::Decimal { .. } => Some("numeric"),
            FieldKind::Uuid => Some("uuid"),
            FieldKind::Bool => Some("boolean"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present (and non-blank) on create
    pub required: bool,
}

impl FieldDef {
    pub const fn text(name: &'static str, max_len: usize) -> Self {
        Self { name, kind: FieldKind::Text { max_len }, required: false }
    }

    pub const fn date(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Date, required: false }
    }

    pub const fn decimal(name: &'static str, precision: u32, scale: u32) -> Self {
        Self { name, kind: FieldKind::Decimal { precision, scale }, required: false }
    }

    pub const fn uuid(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Uuid, required: false }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Bool, required: false }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Check a payload value and return it in the form it is bound with.
    /// Errors are human-readable and end up in `field_errors`.
    pub fn normalize(&self, value: &Value) -> Result<Value, String> {
        match self.kind {
            FieldKind::Text { max_len } => {
                let s = value.as_str().ok_or("must be a string")?;
                if self.required && s.trim().is_empty() {
                    return Err("must not be blank".to_string());
                }
                if s.chars().count() > max_len {
                    return Err(format!("must be at most {} characters", max_len));
                }
                Ok(Value::String(s.to_string()))
            }
            FieldKind::Date => {
                let s = value.as_str().ok_or("must be a date string (YYYY-MM-DD)")?;
                let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| "must be a valid date (YYYY-MM-DD)".to_string())?;
                Ok(Value::String(date.format("%Y-%m-%d").to_string()))
            }
            FieldKind::Decimal { precision, scale } => {
                let raw = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err("must be a decimal number".to_string()),
                };
                let d = Decimal::from_str(&raw)
                    .or_else(|_| Decimal::from_scientific(&raw))
                    .map_err(|_| "must be a decimal number".to_string())?;
                if d.is_sign_negative() && !d.is_zero() {
                    return Err("must not be negative".to_string());
                }
                if d.round_dp(scale) != d {
                    return Err(format!("must have at most {} decimal places", scale));
                }
                let limit = Decimal::from(10u64.pow(precision - scale));
                if d >= limit {
                    return Err(format!("must be less than {}", limit));
                }
                Ok(Value::String(d.normalize().to_string()))
            }
            FieldKind::Uuid => {
                let s = value.as_str().ok_or("must be a UUID string")?;
                let id = canonical_uuid(s).ok_or("must be a valid UUID")?;
                Ok(Value::String(id.to_string()))
            }
            FieldKind::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                _ => Err("must be true or false".to_string()),
            },
        }
    }
}
