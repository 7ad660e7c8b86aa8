#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Market data for Bengaluru areas.
//!
//! Salary distributions are built by discovering companies in an area
//! through Google Places ([`places`]) and scraping each company's salary
//! page ([`salary`]). Rent distributions come from a JSON listings API
//! ([`rent`]). Both are bucketed with [`histogram::Histogram`].
//!
//! Endpoints, selectors and bucket edges are configured in TOML files
//! embedded at compile time ([`registry`]).

pub mod histogram;
pub mod http;
pub mod places;
pub mod registry;
pub mod rent;
pub mod salary;

/// Errors that can occur while fetching market data.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parsing the response body failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The upstream service cannot be used right now.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}
