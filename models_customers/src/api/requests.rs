//! API layer request types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::api::error::{CustomerValidationError, FieldDefinitionValidationError};
use crate::service::{CustomerAttributes, FieldSpec};
use crate::shared::{DataType, parse_calendar_date};

/// Maximum length of a field name, in characters.
pub const MAX_FIELD_NAME_LENGTH: usize = 100;

// ===== Field Definition Requests =====

/// Options for select fields as they arrive over the wire.
///
/// The canonical form is a list. A comma-joined string is accepted for older
/// clients and is split once here, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(untagged)]
pub enum FieldOptionsInput {
    /// `["Regular", "VIP"]`
    List(Vec<String>),
    /// `"Regular,VIP"`
    Joined(String),
}

impl FieldOptionsInput {
    /// Canonicalize into an ordered list of trimmed, non-empty, unique options.
    pub fn into_options(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            FieldOptionsInput::List(options) => options,
            FieldOptionsInput::Joined(joined) => {
                joined.split(',').map(ToString::to_string).collect()
            }
        };

        let mut options: Vec<String> = Vec::with_capacity(raw.len());
        for option in raw {
            let option = option.trim();
            if option.is_empty() || options.iter().any(|existing| existing == option) {
                continue;
            }
            options.push(option.to_string());
        }
        options
    }
}

/// Request body to define or redefine a custom field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FieldDefinitionRequest {
    /// Display label of the field
    #[serde(default)]
    pub name: String,
    /// One of text, number, date, boolean, select
    #[serde(default)]
    pub data_type: String,
    /// Allowed values, only meaningful for select fields
    #[serde(default)]
    pub options: Option<FieldOptionsInput>,
}

impl FieldDefinitionRequest {
    /// Validates the request, producing the canonical [FieldSpec]
    pub fn validate(self) -> Result<FieldSpec, FieldDefinitionValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FieldDefinitionValidationError::EmptyName);
        }

        let length = name.chars().count();
        if length > MAX_FIELD_NAME_LENGTH {
            return Err(FieldDefinitionValidationError::NameTooLong {
                length,
                max: MAX_FIELD_NAME_LENGTH,
            });
        }

        let data_type = DataType::from_str(self.data_type.trim()).map_err(|_| {
            FieldDefinitionValidationError::UnknownDataType(self.data_type.clone())
        })?;

        let options = if data_type.requires_options() {
            let options = self
                .options
                .map(FieldOptionsInput::into_options)
                .unwrap_or_default();
            if options.is_empty() {
                return Err(FieldDefinitionValidationError::MissingOptions);
            }
            Some(options)
        } else {
            None
        };

        Ok(FieldSpec {
            name,
            data_type,
            options,
        })
    }
}

// ===== Customer Requests =====

/// Request body to create or fully replace a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CustomerRequest {
    #[serde(default)]
    pub name: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp. Blank or absent means unknown.
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub location: String,
    /// Field definition id to raw value. Unknown ids are ignored.
    #[serde(default)]
    pub custom_field_values: HashMap<String, serde_json::Value>,
}

impl CustomerRequest {
    /// Validates and normalizes the base attributes of the request
    pub fn attributes(&self) -> Result<CustomerAttributes, CustomerValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }

        let dob = match self.dob.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_calendar_date(raw)
                    .ok_or_else(|| CustomerValidationError::InvalidDateOfBirth(raw.to_string()))?,
            ),
        };

        Ok(CustomerAttributes {
            name: name.to_string(),
            dob,
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            occupation: self.occupation.trim().to_string(),
            location: self.location.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn field_request(name: &str, data_type: &str, options: Option<FieldOptionsInput>) -> FieldDefinitionRequest {
        FieldDefinitionRequest {
            name: name.to_string(),
            data_type: data_type.to_string(),
            options,
        }
    }

    #[test]
    fn it_accepts_a_text_field() {
        let spec = field_request(" Notes ", "text", None).validate().unwrap();
        assert_eq!(spec.name, "Notes");
        assert_eq!(spec.data_type, DataType::Text);
        assert_eq!(spec.options, None);
    }

    #[test]
    fn it_rejects_an_empty_name() {
        assert_eq!(
            field_request("   ", "text", None).validate(),
            Err(FieldDefinitionValidationError::EmptyName)
        );
    }

    #[test]
    fn it_rejects_a_long_name() {
        let name = "x".repeat(MAX_FIELD_NAME_LENGTH + 1);
        assert_eq!(
            field_request(&name, "text", None).validate(),
            Err(FieldDefinitionValidationError::NameTooLong {
                length: MAX_FIELD_NAME_LENGTH + 1,
                max: MAX_FIELD_NAME_LENGTH
            })
        );
    }

    #[test]
    fn it_rejects_an_unknown_data_type() {
        assert_eq!(
            field_request("Tier", "currency", None).validate(),
            Err(FieldDefinitionValidationError::UnknownDataType(
                "currency".to_string()
            ))
        );
    }

    #[test]
    fn select_requires_options() {
        assert_eq!(
            field_request("Tier", "select", None).validate(),
            Err(FieldDefinitionValidationError::MissingOptions)
        );
        assert_eq!(
            field_request("Tier", "select", Some(FieldOptionsInput::List(vec![" ".into()])))
                .validate(),
            Err(FieldDefinitionValidationError::MissingOptions)
        );
    }

    #[test]
    fn legacy_joined_options_are_canonicalized() {
        let spec = field_request(
            "Tier",
            "select",
            Some(FieldOptionsInput::Joined("Regular, VIP,,Regular".into())),
        )
        .validate()
        .unwrap();
        assert_eq!(
            spec.options,
            Some(vec!["Regular".to_string(), "VIP".to_string()])
        );
    }

    #[test]
    fn options_are_dropped_for_non_select_fields() {
        let spec = field_request(
            "Age",
            "number",
            Some(FieldOptionsInput::List(vec!["1".into()])),
        )
        .validate()
        .unwrap();
        assert_eq!(spec.options, None);
    }

    #[test]
    fn options_deserialize_from_either_encoding() {
        let list: FieldDefinitionRequest =
            serde_json::from_str(r#"{"name":"Tier","data_type":"select","options":["A","B"]}"#)
                .unwrap();
        assert_eq!(
            list.options,
            Some(FieldOptionsInput::List(vec!["A".into(), "B".into()]))
        );

        let joined: FieldDefinitionRequest =
            serde_json::from_str(r#"{"name":"Tier","data_type":"select","options":"A,B"}"#)
                .unwrap();
        assert_eq!(joined.options, Some(FieldOptionsInput::Joined("A,B".into())));
    }

    #[test]
    fn customer_dob_is_normalized() {
        let request = CustomerRequest {
            name: "Ann".to_string(),
            dob: Some("1990-05-15T08:30:00Z".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.attributes().unwrap().dob,
            NaiveDate::from_ymd_opt(1990, 5, 15)
        );
    }

    #[test]
    fn customer_blank_dob_is_null() {
        let request = CustomerRequest {
            name: "Ann".to_string(),
            dob: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(request.attributes().unwrap().dob, None);
    }

    #[test]
    fn customer_requires_a_name_and_a_valid_dob() {
        assert_eq!(
            CustomerRequest::default().attributes(),
            Err(CustomerValidationError::EmptyName)
        );

        let request = CustomerRequest {
            name: "Ann".to_string(),
            dob: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.attributes(),
            Err(CustomerValidationError::InvalidDateOfBirth(
                "yesterday".to_string()
            ))
        );
    }
}
