//! Data type shared across database, service, and API layers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Data type of a custom field, determining how its values are validated and coerced.
///
/// Stored in `field_definitions.data_type` as its lowercase name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DataType {
    /// Free text.
    Text,
    /// Numeric values.
    Number,
    /// Calendar dates without a time of day.
    Date,
    /// Boolean true/false values.
    Boolean,
    /// One value out of a fixed, ordered list of options.
    Select,
}

impl DataType {
    /// Check if this data type requires a list of options
    pub fn requires_options(&self) -> bool {
        matches!(self, DataType::Select)
    }
}

impl TryFrom<String> for DataType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DataType::from_str(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_case_insensitively() {
        assert_eq!(DataType::from_str("text").unwrap(), DataType::Text);
        assert_eq!(DataType::from_str("Select").unwrap(), DataType::Select);
        assert_eq!(DataType::from_str("BOOLEAN").unwrap(), DataType::Boolean);
        assert!(DataType::from_str("currency").is_err());
    }

    #[test]
    fn it_displays_the_stored_name() {
        assert_eq!(DataType::Number.to_string(), "number");
        assert_eq!(<&'static str>::from(DataType::Date), "date");
    }

    #[test]
    fn only_select_requires_options() {
        assert!(DataType::Select.requires_options());
        assert!(!DataType::Text.requires_options());
        assert!(!DataType::Number.requires_options());
        assert!(!DataType::Date.requires_options());
        assert!(!DataType::Boolean.requires_options());
    }
}
