//! Compile-time registry of market data service configurations.
//!
//! Each upstream service is described by a TOML file under `services/`.
//! The files are embedded at compile time; environment variables may
//! override individual fields when a service is created.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Google Places Text Search configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesConfig {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Text Search endpoint.
    pub base_url: String,
    /// Search text. `{name}` and `{pinCode}` are filled per area.
    pub query_template: String,
    /// Upper bound on companies taken from the results.
    pub max_companies: usize,
    /// Request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Salary site scraping configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SalaryConfig {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Company page URL. `{slug}` is the lower-kebab company name.
    pub url_template: String,
    /// CSS selector of the element holding the average salary.
    pub average_selector: String,
    /// Request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Histogram bucket edges in lakhs per annum.
    pub bucket_edges: Vec<f64>,
    /// Headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Rent listings API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RentConfig {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Listings URL. `{pinCode}` and `{name}` are filled per area.
    pub url_template: String,
    /// Dot-separated path to the listing array; empty for a bare array.
    #[serde(default)]
    pub records_path: String,
    /// Field of each listing holding the monthly rent.
    pub price_field: String,
    /// Request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Histogram bucket edges in rupees per month.
    pub bucket_edges: Vec<f64>,
    /// Headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

const fn default_timeout() -> u64 {
    10
}

// ── Compile-time embedded TOML files ────────────────────────────────

const PLACES_TOML: &str = include_str!("../services/places.toml");
const SALARY_TOML: &str = include_str!("../services/salary.toml");
const RENT_TOML: &str = include_str!("../services/rent.toml");

fn parse<T: serde::de::DeserializeOwned>(name: &str, toml_str: &str) -> T {
    toml::de::from_str(toml_str)
        .unwrap_or_else(|e| panic!("Failed to parse market service '{name}': {e}"))
}

/// Returns the Places configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed.
#[must_use]
pub fn places() -> PlacesConfig {
    parse("places", PLACES_TOML)
}

/// Returns the salary site configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed.
#[must_use]
pub fn salary() -> SalaryConfig {
    parse("salary", SALARY_TOML)
}

/// Returns the rent listings configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed.
#[must_use]
pub fn rent() -> RentConfig {
    parse("rent", RENT_TOML)
}

/// Fills `{key}` placeholders in `template`.
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_services_parse() {
        let places = places();
        assert!(places.query_template.contains("{name}"));
        assert!(places.max_companies > 0);

        let salary = salary();
        assert!(salary.url_template.contains("{slug}"));
        assert!(!salary.bucket_edges.is_empty());
        assert!(salary.headers.contains_key("User-Agent"));

        let rent = rent();
        assert!(rent.url_template.contains("{pinCode}"));
        assert!(!rent.price_field.is_empty());
        assert!(!rent.bucket_edges.is_empty());
    }

    #[test]
    fn edges_are_ascending() {
        for edges in [salary().bucket_edges, rent().bucket_edges] {
            assert!(edges.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn fills_placeholders() {
        assert_eq!(
            fill(
                "companies in {name} Bengaluru {pinCode}",
                &[("name", "HSR Layout"), ("pinCode", "560102")]
            ),
            "companies in HSR Layout Bengaluru 560102"
        );
    }
}
