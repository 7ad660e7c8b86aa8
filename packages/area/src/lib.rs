#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area dataset and area queries for the dashboard API.
//!
//! The three static tables (`areas.json`, `stats.json`, `lockedArea.json`)
//! are loaded once at startup into an immutable [`dataset::Dataset`] that
//! every request reads from. The [`queries`] module implements the area
//! endpoints on top of it, calling out to an encyclopedia
//! [`summary::SummaryClient`] for unserved areas.

pub mod dataset;
pub mod queries;
pub mod summary;

use area_insights_area_models::PinCode;
use thiserror::Error;

/// Errors from loading the static dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A fixture file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed to load.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A fixture file is not valid JSON for its table.
    #[error("Failed to parse {path}: {source}")]
    Json {
        /// File that failed to parse.
        path: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Two areas share a pin code.
    #[error("Duplicate area pin code {0}")]
    DuplicatePinCode(PinCode),
}

/// Errors from talking to the encyclopedia summary service.
#[derive(Debug, Error)]
pub enum AreaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The summary URL could not be built.
    #[error("Invalid summary URL: {message}")]
    InvalidUrl {
        /// Description of what went wrong.
        message: String,
    },
}

/// Outcomes of [`queries::area_stats`] that are not a stats payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AreaStatsError {
    /// No area has this pin code.
    #[error("Area not found")]
    AreaNotFound(PinCode),

    /// The area is served but has no statistics row.
    #[error("Area stats not found")]
    StatsNotFound(PinCode),

    /// The area is unserved, the summary lookup failed and there is no
    /// fallback row.
    #[error("Something went wrong")]
    SummaryUnavailable(PinCode),
}
