//! Salary distributions from company salary pages.

use std::sync::LazyLock;

use area_insights_area_models::{Area, PinCode};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

use crate::histogram::Histogram;
use crate::http::build_client;
use crate::places::{self, PlacesClient};
use crate::registry::{self, SalaryConfig};
use crate::MarketError;

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(?:(lpa|lakhs?|l|crores?|cr)\b)?").expect("valid regex")
});

const RUPEES_PER_LAKH: f64 = 100_000.0;

/// A company and its scraped average salary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySalary {
    /// Company name as listed by the places search.
    pub name: String,
    /// Lakhs per annum; `None` if the page could not be scraped.
    pub average_salary_lpa: Option<f64>,
}

/// Salary distribution of an area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryDistribution {
    pub pin_code: PinCode,
    /// Name of the area with the requested pin code.
    pub area_name: String,
    /// Companies near the area, in search order.
    pub companies: Vec<CompanySalary>,
    /// Bucket counts over the scraped averages.
    #[serde(flatten)]
    pub histogram: Histogram,
}

/// Parses a salary figure into lakhs per annum.
///
/// Accepts `"₹ 6.5 LPA"`, `"6.5L"`, `"8 Lakhs"`, `"1.2 Cr"` and plain
/// rupee amounts such as `"12,00,000"`. A bare number below 1000 is read
/// as lakhs.
#[must_use]
pub fn parse_lpa(text: &str) -> Option<f64> {
    let caps = AMOUNT_RE.captures(text)?;
    let amount: f64 = caps[1].replace(',', "").parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());

    let lakhs = match unit.as_deref() {
        Some(u) if u.starts_with('c') => amount * 100.0,
        Some(_) => amount,
        None if amount >= 1000.0 => amount / RUPEES_PER_LAKH,
        None => amount,
    };
    Some(lakhs).filter(|v| v.is_finite() && *v > 0.0)
}

/// Lower-kebab form of a company name used in salary page URLs.
#[must_use]
pub fn company_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Reads the average salary from a salary page.
///
/// # Errors
///
/// Returns [`MarketError::Parse`] if the selector is invalid, matches
/// nothing, or the text is not a salary.
pub fn average_from_html(html: &str, selector: &str) -> Result<f64, MarketError> {
    let sel = Selector::parse(selector)
        .map_err(|e| MarketError::Parse(format!("invalid CSS selector '{selector}': {e}")))?;
    let document = Html::parse_document(html);

    let text = document
        .select(&sel)
        .map(|el| el.text().collect::<String>())
        .find(|t| !t.trim().is_empty())
        .ok_or_else(|| MarketError::Parse(format!("no element matching '{selector}'")))?;

    parse_lpa(&text).ok_or_else(|| MarketError::Parse(format!("not a salary: '{}'", text.trim())))
}

/// Scrapes company salary pages.
#[derive(Debug, Clone)]
pub struct SalaryScraper {
    config: SalaryConfig,
    client: reqwest::Client,
}

impl SalaryScraper {
    /// Creates a scraper for the given site configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if the HTTP client cannot be built.
    pub fn new(config: SalaryConfig) -> Result<Self, MarketError> {
        let client = build_client(&config.headers, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Page URL for a company.
    #[must_use]
    pub fn page_url(&self, company: &str) -> String {
        registry::fill(&self.config.url_template, &[("slug", &company_slug(company))])
    }

    /// Average salary of `company` in lakhs per annum.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if the page cannot be fetched or parsed.
    pub async fn average_salary(&self, company: &str) -> Result<f64, MarketError> {
        let url = self.page_url(company);
        log::debug!("Scraping salary page {url}");

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        average_from_html(&body, &self.config.average_selector)
    }

    /// Bucket edges in lakhs per annum.
    #[must_use]
    pub fn bucket_edges(&self) -> &[f64] {
        &self.config.bucket_edges
    }
}

/// Builds salary distributions for areas.
#[derive(Debug, Clone)]
pub struct SalaryService {
    places: Option<PlacesClient>,
    scraper: SalaryScraper,
}

impl SalaryService {
    /// Creates the service. Without a Places client every request is
    /// answered with [`MarketError::Unavailable`].
    #[must_use]
    pub const fn new(places: Option<PlacesClient>, scraper: SalaryScraper) -> Self {
        Self { places, scraper }
    }

    /// Creates the service from the embedded configuration and
    /// `GOOGLE_PLACES_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if an HTTP client cannot be built.
    pub fn from_env() -> Result<Self, MarketError> {
        Ok(Self::new(
            PlacesClient::from_env()?,
            SalaryScraper::new(registry::salary())?,
        ))
    }

    /// Discovers companies in `area`, scrapes each one's average salary
    /// and buckets the results.
    ///
    /// Companies whose page cannot be scraped are reported with no salary
    /// and left out of the histogram.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Unavailable`] if no Places key is configured
    /// or the company search fails.
    pub async fn salary_distribution(&self, area: &Area) -> Result<SalaryDistribution, MarketError> {
        let client = self.places.as_ref().ok_or_else(|| {
            MarketError::Unavailable(format!("{} is not set", places::API_KEY_VAR))
        })?;

        let names = client.company_names(area).await.map_err(|e| {
            log::warn!("Company search for {} failed: {e}", area.name);
            match e {
                MarketError::Unavailable(_) => e,
                other => MarketError::Unavailable(other.to_string()),
            }
        })?;

        let salaries = futures::future::join_all(
            names.iter().map(|name| self.scraper.average_salary(name)),
        )
        .await;

        let companies = names
            .into_iter()
            .zip(salaries)
            .map(|(name, result)| {
                let average_salary_lpa = result
                    .inspect_err(|e| log::warn!("No salary for {name}: {e}"))
                    .ok();
                CompanySalary {
                    name,
                    average_salary_lpa,
                }
            })
            .collect();

        Ok(distribution(area, companies, self.scraper.bucket_edges()))
    }
}

fn distribution(area: &Area, companies: Vec<CompanySalary>, edges: &[f64]) -> SalaryDistribution {
    let histogram = Histogram::from_values(
        edges,
        companies.iter().filter_map(|c| c.average_salary_lpa),
    );
    SalaryDistribution {
        pin_code: area.pin_code,
        area_name: area.name.clone(),
        companies,
        histogram,
    }
}
