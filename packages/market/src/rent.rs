//! Rent distributions from a JSON listings API.

use area_insights_area_models::{Area, PinCode};
use serde::Serialize;

use crate::MarketError;
use crate::histogram::Histogram;
use crate::http::{build_client, number_from_value, resolve_path};
use crate::registry::{self, RentConfig};

/// Environment variable overriding the listings URL template.
pub const URL_VAR: &str = "RENT_API_URL";

/// Rent distribution of an area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentDistribution {
    pub pin_code: PinCode,
    pub area_name: String,
    #[serde(flatten)]
    pub histogram: Histogram,
}

/// Builds rent distributions for areas.
#[derive(Debug, Clone)]
pub struct RentService {
    config: RentConfig,
    client: reqwest::Client,
}

impl RentService {
    /// Creates the service for the given listings configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if the HTTP client cannot be built.
    pub fn new(config: RentConfig) -> Result<Self, MarketError> {
        let client = build_client(&config.headers, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Creates the service from the embedded configuration, with
    /// `RENT_API_URL` overriding the URL template.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, MarketError> {
        let mut config = registry::rent();
        if let Ok(url) = std::env::var(URL_VAR) {
            log::info!("Using rent listings from {url}");
            config.url_template = url;
        }
        Self::new(config)
    }

    /// Listings URL for an area.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Parse`] if the filled template is not a URL.
    pub fn listings_url(&self, area: &Area) -> Result<reqwest::Url, MarketError> {
        let filled = registry::fill(
            &self.config.url_template,
            &[("pinCode", &area.pin_code.to_string()), ("name", &area.name)],
        );
        reqwest::Url::parse(&filled)
            .map_err(|e| MarketError::Parse(format!("invalid listings URL '{filled}': {e}")))
    }

    /// Fetches the listings of `area` and buckets their rents.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Unavailable`] if the listings cannot be
    /// fetched or read.
    pub async fn rent_distribution(&self, area: &Area) -> Result<RentDistribution, MarketError> {
        let rents = self.fetch_rents(area).await.map_err(|e| {
            log::warn!("Rent listings for {} failed: {e}", area.name);
            MarketError::Unavailable(e.to_string())
        })?;

        log::debug!("{} rent listings for {}", rents.len(), area.name);

        Ok(RentDistribution {
            pin_code: area.pin_code,
            area_name: area.name.clone(),
            histogram: Histogram::from_values(&self.config.bucket_edges, rents),
        })
    }

    async fn fetch_rents(&self, area: &Area) -> Result<Vec<f64>, MarketError> {
        let url = self.listings_url(area)?;
        let body: serde_json::Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        rents_from_body(&body, &self.config.records_path, &self.config.price_field)
    }
}

/// Reads the price of every listing at `records_path`. Listings without a
/// readable price are skipped.
fn rents_from_body(
    body: &serde_json::Value,
    records_path: &str,
    price_field: &str,
) -> Result<Vec<f64>, MarketError> {
    let records = resolve_path(body, records_path)
        .ok_or_else(|| MarketError::Parse(format!("response does not contain path '{records_path}'")))?
        .as_array()
        .ok_or_else(|| MarketError::Parse("expected JSON array of listings".to_owned()))?;

    Ok(records
        .iter()
        .filter_map(|listing| resolve_path(listing, price_field))
        .filter_map(number_from_value)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn area() -> Area {
        Area {
            pin_code: PinCode::new(560_102),
            name: "HSR Layout".to_string(),
            is_served: true,
            wiki_name: None,
            geometry: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn reads_prices_at_configured_path() {
        let body = json!({"data": {"listings": [
            {"rent": 18000},
            {"rent": "₹ 32,500"},
            {"rent": null},
            {"title": "no price"},
            {"rent": 9000.0}
        ]}});
        assert_eq!(
            rents_from_body(&body, "data.listings", "rent").unwrap(),
            [18_000.0, 32_500.0, 9_000.0]
        );
    }

    #[test]
    fn accepts_bare_arrays_and_nested_price_fields() {
        let body = json!([{"price": {"monthly": 21000}}]);
        assert_eq!(
            rents_from_body(&body, "", "price.monthly").unwrap(),
            [21_000.0]
        );
    }

    #[test]
    fn missing_records_path_is_parse_error() {
        let body = json!({"data": {}});
        assert!(matches!(
            rents_from_body(&body, "data.listings", "rent"),
            Err(MarketError::Parse(_))
        ));
        assert!(matches!(
            rents_from_body(&json!({"data": {"listings": 3}}), "data.listings", "rent"),
            Err(MarketError::Parse(_))
        ));
    }

    #[test]
    fn fills_listings_url() {
        let service = RentService::new(registry::rent()).unwrap();
        let url = service.listings_url(&area()).unwrap();
        assert!(url.as_str().contains("pinCode=560102"));
        assert!(url.as_str().contains("locality=HSR%20Layout"));
    }

    #[tokio::test]
    async fn unreachable_api_is_unavailable() {
        let mut config = registry::rent();
        config.url_template = "http://127.0.0.1:9/listings?pin={pinCode}".to_string();
        config.timeout_secs = 2;
        let service = RentService::new(config).unwrap();
        let err = service.rent_distribution(&area()).await.unwrap_err();
        assert!(matches!(err, MarketError::Unavailable(_)));
    }
}
