//! Service layer custom field value model.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::error::FieldValueValidationError;
use crate::service::field_definition::FieldDefinition;
use crate::shared::{DataType, parse_calendar_date};

/// A custom field value, typed according to its definition's [DataType].
///
/// Serializes as a plain JSON scalar:
/// text and select as strings, numbers as numbers, booleans as booleans
/// and dates as `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    Select(String),
}

/// The untyped text payload stored for one customer and one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFieldValue {
    pub field_id: Uuid,
    pub value: String,
}

impl FieldValue {
    /// The data type this value belongs to
    pub fn data_type(&self) -> DataType {
        match self {
            FieldValue::Text(_) => DataType::Text,
            FieldValue::Number(_) => DataType::Number,
            FieldValue::Date(_) => DataType::Date,
            FieldValue::Boolean(_) => DataType::Boolean,
            FieldValue::Select(_) => DataType::Select,
        }
    }

    /// Interpret submitted JSON for the given definition.
    ///
    /// Returns `Ok(None)` for `null` and blank strings, which mean "no value".
    pub fn parse_input(
        definition: &FieldDefinition,
        input: &Value,
    ) -> Result<Option<Self>, FieldValueValidationError> {
        let scalar = match input {
            Value::Null => return Ok(None),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => Scalar::Str(s),
            Value::Number(n) => Scalar::Num(n.as_f64()),
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Array(_) | Value::Object(_) => {
                return Err(FieldValueValidationError::UnsupportedShape(
                    input.to_string(),
                ));
            }
        };

        let value = match definition.data_type {
            DataType::Text => FieldValue::Text(scalar.to_text(input)),
            DataType::Number => {
                let number = match scalar {
                    Scalar::Num(Some(n)) => n,
                    Scalar::Str(s) => s
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| FieldValueValidationError::NotANumber(s.to_string()))?,
                    _ => return Err(FieldValueValidationError::NotANumber(input.to_string())),
                };
                if !number.is_finite() {
                    return Err(FieldValueValidationError::NonFiniteNumber);
                }
                FieldValue::Number(number)
            }
            DataType::Date => match scalar {
                Scalar::Str(s) => FieldValue::Date(
                    parse_calendar_date(s.trim())
                        .ok_or_else(|| FieldValueValidationError::NotADate(s.to_string()))?,
                ),
                _ => return Err(FieldValueValidationError::NotADate(input.to_string())),
            },
            DataType::Boolean => match scalar {
                Scalar::Bool(b) => FieldValue::Boolean(b),
                Scalar::Str(s) => FieldValue::Boolean(
                    parse_bool(s)
                        .ok_or_else(|| FieldValueValidationError::NotABoolean(s.to_string()))?,
                ),
                _ => return Err(FieldValueValidationError::NotABoolean(input.to_string())),
            },
            DataType::Select => {
                let option = scalar.to_text(input).trim().to_string();
                if !definition.allows_option(&option) {
                    return Err(FieldValueValidationError::NotAnOption {
                        value: option,
                        allowed: definition.options().to_vec(),
                    });
                }
                FieldValue::Select(option)
            }
        };

        Ok(Some(value))
    }

    /// The text payload persisted for this value
    pub fn to_stored(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Select(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Boolean(b) => b.to_string(),
        }
    }

    /// Interpret a stored text payload under the field's current definition.
    ///
    /// Select payloads that are no longer one of the options are rejected.
    pub fn from_stored(
        definition: &FieldDefinition,
        raw: &str,
    ) -> Result<Self, FieldValueValidationError> {
        match definition.data_type {
            DataType::Text => Ok(FieldValue::Text(raw.to_string())),
            DataType::Select if definition.allows_option(raw) => {
                Ok(FieldValue::Select(raw.to_string()))
            }
            DataType::Select => Err(FieldValueValidationError::NotAnOption {
                value: raw.to_string(),
                allowed: definition.options().to_vec(),
            }),
            DataType::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(|| FieldValueValidationError::NotANumber(raw.to_string())),
            DataType::Date => parse_calendar_date(raw)
                .map(FieldValue::Date)
                .ok_or_else(|| FieldValueValidationError::NotADate(raw.to_string())),
            DataType::Boolean => parse_bool(raw)
                .map(FieldValue::Boolean)
                .ok_or_else(|| FieldValueValidationError::NotABoolean(raw.to_string())),
        }
    }
}

enum Scalar<'a> {
    Str(&'a str),
    Num(Option<f64>),
    Bool(bool),
}

impl Scalar<'_> {
    fn to_text(&self, input: &Value) -> String {
        match self {
            Scalar::Str(s) => s.to_string(),
            Scalar::Num(_) | Scalar::Bool(_) => input.to_string(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
