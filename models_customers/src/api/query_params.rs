//! API layer query parameters.

use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for listing customers
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerQueryParams {
    /// Case-insensitive substring matched against name, phone and email.
    #[serde(default)]
    pub search: Option<String>,
}

impl CustomerQueryParams {
    /// The search term, if one was provided and is not blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
