//! Database row for `field_definitions`.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::db::error::DbConversionError;
use crate::service::FieldDefinition;
use crate::shared::DataType;

/// A row of `field_definitions`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FieldDefinitionRow {
    pub id: Uuid,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub data_type: DataType,
    pub options_json: Option<Json<Vec<String>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FieldDefinitionRow> for FieldDefinition {
    type Error = DbConversionError;

    fn try_from(row: FieldDefinitionRow) -> Result<Self, Self::Error> {
        let options = match (row.data_type.requires_options(), row.options_json) {
            (true, Some(Json(options))) if !options.is_empty() => Some(options),
            (true, _) => return Err(DbConversionError::SelectWithoutOptions { id: row.id }),
            (false, _) => None,
        };

        Ok(FieldDefinition {
            id: row.id,
            name: row.name,
            data_type: row.data_type,
            options,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl FieldDefinition {
    /// The value bound to `options_json`
    pub fn options_json(&self) -> Option<Json<&[String]>> {
        self.options.as_deref().map(Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(data_type: DataType, options_json: Option<Vec<&str>>) -> FieldDefinitionRow {
        let now = Utc::now();
        FieldDefinitionRow {
            id: Uuid::now_v7(),
            name: "Tier".to_string(),
            data_type,
            options_json: options_json
                .map(|options| Json(options.into_iter().map(String::from).collect())),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn select_rows_keep_their_options() {
        let definition = FieldDefinition::try_from(row(DataType::Select, Some(vec!["A", "B"])))
            .unwrap();
        assert_eq!(definition.options().to_vec(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn select_rows_without_options_are_rejected() {
        let row = row(DataType::Select, Some(vec![]));
        let id = row.id;
        assert_eq!(
            FieldDefinition::try_from(row),
            Err(DbConversionError::SelectWithoutOptions { id })
        );
    }

    #[test]
    fn stray_options_are_ignored_for_other_types() {
        let definition =
            FieldDefinition::try_from(row(DataType::Text, Some(vec!["A"]))).unwrap();
        assert_eq!(definition.options, None);
    }
}
