//! Company discovery through Google Places Text Search.

use area_insights_area_models::Area;
use serde::Deserialize;

use crate::MarketError;
use crate::http::build_client;
use crate::registry::{self, PlacesConfig};

/// Environment variable holding the Places API key.
pub const API_KEY_VAR: &str = "GOOGLE_PLACES_API_KEY";

/// Client for the Places Text Search endpoint.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    config: PlacesConfig,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<Place>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
}

impl PlacesClient {
    /// Creates a client with the given configuration and key.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if the HTTP client cannot be built.
    pub fn new(config: PlacesConfig, api_key: String) -> Result<Self, MarketError> {
        let client = build_client(&std::collections::BTreeMap::new(), config.timeout_secs)?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Creates a client from the embedded configuration and
    /// `GOOGLE_PLACES_API_KEY`. Returns `Ok(None)` when the key is unset.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Option<Self>, MarketError> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::new(registry::places(), key).map(Some),
            _ => {
                log::warn!("{API_KEY_VAR} not set; salary data will be unavailable");
                Ok(None)
            }
        }
    }

    /// The search text for an area.
    #[must_use]
    pub fn query_for(&self, area: &Area) -> String {
        registry::fill(
            &self.config.query_template,
            &[("name", &area.name), ("pinCode", &area.pin_code.to_string())],
        )
    }

    /// Names of up to `max_companies` companies located in `area`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Http`] if the request fails, or
    /// [`MarketError::Unavailable`] if Places reports an error status.
    pub async fn company_names(&self, area: &Area) -> Result<Vec<String>, MarketError> {
        let query = self.query_for(area);
        let url = reqwest::Url::parse_with_params(
            &self.config.base_url,
            &[("query", query.as_str()), ("key", self.api_key.as_str())],
        )
        .map_err(|e| MarketError::Parse(format!("invalid Places URL: {e}")))?;

        log::debug!("Searching {} for '{query}'", self.config.name);

        let body: serde_json::Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        company_names_from_response(body, self.config.max_companies)
    }
}

/// Extracts distinct company names from a Text Search response body.
fn company_names_from_response(
    body: serde_json::Value,
    max_companies: usize,
) -> Result<Vec<String>, MarketError> {
    let response: TextSearchResponse = serde_json::from_value(body)
        .map_err(|e| MarketError::Parse(format!("unexpected Places response: {e}")))?;

    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => {}
        status => {
            let detail = response.error_message.unwrap_or_default();
            return Err(MarketError::Unavailable(format!(
                "Places returned {status} {detail}"
            )));
        }
    }

    let mut names: Vec<String> = Vec::new();
    for place in response.results {
        if names.len() >= max_companies {
            break;
        }
        let name = place.name.trim();
        if !name.is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
