//! Builds the context blob sent to the model ahead of the user's message.

use std::fmt::Write as _;

use area_insights_area::dataset::{AreaStat, Dataset};
use area_insights_area_models::{Area, LockedAreaStat, PinCode, ServedAreaStat};
use serde::Serialize;
use thiserror::Error;

use crate::mentions::{self, Extraction};

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Errors from building a chat context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The request named a pin code with no statistics row.
    #[error("Invalid pin code {0}")]
    UnknownPinCode(PinCode),

    /// A statistics record could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the context is built for.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'m> {
    /// The new user message.
    pub message: &'m str,
    /// Area the dashboard currently has selected, if any.
    pub pin_code: Option<PinCode>,
}

/// An implicitly mentioned area with its statistics reshaped for the
/// prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedArea<'a> {
    /// Locality name as listed in the dataset.
    pub name: &'a str,
    /// Six-digit postal code of the area.
    pub pin_code: PinCode,
    /// Whether the area has delivery coverage.
    pub is_served: bool,
    /// Served or socioeconomic figures, or `{}` when the area has no row.
    pub stats: EnrichedStats,
}

/// Statistics of an enriched area. Served and unserved fields never mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnrichedStats {
    /// Operational figures.
    Served(ServedSnapshot),
    /// Socioeconomic figures.
    Locked(LockedSnapshot),
    /// No statistics row.
    Missing(NoStats),
}

/// Operational figures of a served area. Missing numbers read as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServedSnapshot {
    /// Daily capacity.
    pub capacity: f64,
    /// Sum of the daily order counts.
    pub total_orders: u64,
    /// Average delivery time in minutes.
    pub avg_delivery_time: f64,
    /// Average delay past the promised time, in minutes.
    pub delivery_delay: f64,
    /// Utilisation formatted to two decimals.
    pub utilisation_rate: String,
}

impl From<&ServedAreaStat> for ServedSnapshot {
    fn from(stat: &ServedAreaStat) -> Self {
        Self {
            capacity: stat.daily_capacity.unwrap_or(0.0),
            total_orders: stat.daily_order_total(),
            avg_delivery_time: stat.avg_delivery_time.unwrap_or(0.0),
            delivery_delay: stat.delivery_delay.unwrap_or(0.0),
            utilisation_rate: stat.utilisation().to_string(),
        }
    }
}

/// Socioeconomic figures of an unserved area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedSnapshot {
    /// People per square kilometre.
    pub population_density: Option<f64>,
    /// Median yearly household income.
    pub median_household_income: Option<f64>,
    /// Purchasing power index.
    pub purchasing_power: Option<f64>,
}

impl From<&LockedAreaStat> for LockedSnapshot {
    fn from(stat: &LockedAreaStat) -> Self {
        Self {
            population_density: stat.population_density,
            median_household_income: stat.median_household_income,
            purchasing_power: stat.purchasing_power,
        }
    }
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoStats {}

/// Reshapes an area and its statistics row for the prompt. Areas without
/// a row are kept with empty stats.
#[must_use]
pub fn enrich<'a>(area: &'a Area, dataset: &Dataset) -> EnrichedArea<'a> {
    let stats = match dataset.stat_for(area) {
        Some(AreaStat::Served(stat)) => EnrichedStats::Served(stat.into()),
        Some(AreaStat::Locked(stat)) => EnrichedStats::Locked(stat.into()),
        None => EnrichedStats::Missing(NoStats {}),
    };

    EnrichedArea {
        name: &area.name,
        pin_code: area.pin_code,
        is_served: area.is_served,
        stats,
    }
}

/// Assembles the context blob for one chat turn.
///
/// # Errors
///
/// Returns [`ContextError::UnknownPinCode`] if `request.pin_code` has no
/// statistics row in either table.
///
/// # Panics
///
/// Only if writing into the `String` buffer fails.
pub fn build(
    request: &ContextRequest<'_>,
    dataset: &Dataset,
    max_context_chars: usize,
) -> Result<String, ContextError> {
    let mut context = String::new();

    if let Some(pin_code) = request.pin_code {
        let stat_json = match dataset.any_stat(pin_code) {
            Some(AreaStat::Served(stat)) => serde_json::to_string(stat)?,
            Some(AreaStat::Locked(stat)) => serde_json::to_string(stat)?,
            None => return Err(ContextError::UnknownPinCode(pin_code)),
        };
        write!(
            context,
            "Area Stats for Pin Code {pin_code}:\n{stat_json}\n\n"
        )
        .unwrap();
    }

    let Extraction {
        explicit,
        implicit,
        overlaps,
    } = mentions::extract(request.message, dataset);

    let names = implicit
        .iter()
        .map(|area| area.name.to_lowercase())
        .collect::<Vec<_>>()
        .join(", ");
    write!(context, "Insights on areas mentioned: {names}\n\n").unwrap();

    let enriched: Vec<EnrichedArea<'_>> = implicit
        .into_iter()
        .map(|area| enrich(area, dataset))
        .collect();
    let stats_json = serde_json::to_string_pretty(&enriched)?;
    write!(
        context,
        "Relevant Stats:\n{}\n\n",
        truncate(&stats_json, max_context_chars)
    )
    .unwrap();

    context.push_str("Additional Metrics:\n");
    for mention in &explicit {
        writeln!(context, "{mention}").unwrap();
    }

    if !overlaps.is_empty() {
        context.push_str("Ambiguous locality matches:\n");
        for overlap in &overlaps {
            writeln!(context, "{overlap}").unwrap();
        }
    }

    Ok(context)
}

/// Cuts `text` to at most `max_chars` characters, marking the cut.
fn truncate(text: &str, max_chars: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]).into(),
        None => text.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_json_str(
            r#"[
                {"pinCode": 560034, "name": "Koramangala", "isServed": true, "geometry": {"type": "Point", "coordinates": [77.62, 12.93]}},
                {"pinCode": 560064, "name": "Yelahanka", "isServed": false},
                {"pinCode": 560001, "name": "MG Road", "isServed": true}
            ]"#,
            r#"[
                {"pinCode": 560034, "dailyOrders": [{"date": "2024-06-01", "orders": 50}, {"date": "2024-06-02", "orders": 40}],
                 "dailyCapacity": 100, "avgDeliveryTime": 32}
            ]"#,
            r#"[
                {"pinCode": 560064, "populationDensity": 8200, "medianHouseholdIncome": 540000, "purchasingPower": 61.5}
            ]"#,
        )
        .unwrap()
    }

    fn build_for(message: &str, pin_code: Option<u32>) -> Result<String, ContextError> {
        let request = ContextRequest {
            message,
            pin_code: pin_code.map(PinCode::new),
        };
        build(&request, &dataset(), 10_000)
    }

    #[test]
    fn enriches_each_mentioned_area_per_served_flag() {
        let context = build_for("Compare Koramangala and Yelahanka", None).unwrap();
        assert!(context.contains("Insights on areas mentioned: koramangala, yelahanka\n\n"));

        let start = context.find("Relevant Stats:\n").unwrap() + "Relevant Stats:\n".len();
        let end = context.find("\n\nAdditional Metrics:").unwrap();
        let stats: serde_json::Value = serde_json::from_str(&context[start..end]).unwrap();

        let kora = &stats[0]["stats"];
        assert_eq!(stats[0]["name"], "Koramangala");
        assert_eq!(kora["utilisationRate"], "0.90");
        assert_eq!(kora["totalOrders"], 90);
        assert!(kora.get("populationDensity").is_none());

        let yel = &stats[1]["stats"];
        assert_eq!(stats[1]["isServed"], false);
        assert_eq!(yel["purchasingPower"], 61.5);
        assert!(yel.get("utilisationRate").is_none());
        assert!(yel.get("capacity").is_none());
    }

    #[test]
    fn keeps_areas_without_stats() {
        let context = build_for("What about MG Road?", None).unwrap();
        assert!(context.contains("\"stats\": {}"));
        assert!(context.contains("\"pinCode\": 560001"));
    }

    #[test]
    fn never_includes_geometry() {
        let context = build_for("koramangala", Some(560_034)).unwrap();
        assert!(!context.contains("coordinates"));
    }

    #[test]
    fn prepends_selected_area_stats() {
        let context = build_for("hello", Some(560_064)).unwrap();
        assert!(context.starts_with("Area Stats for Pin Code 560064:\n{"));
        assert!(context.contains("\"medianHouseholdIncome\":540000"));
    }

    #[test]
    fn rejects_pin_code_without_stats() {
        let err = build_for("hello", Some(560_001)).unwrap_err();
        assert!(matches!(err, ContextError::UnknownPinCode(pin) if pin == PinCode::new(560_001)));
        assert!(matches!(
            build_for("hello", Some(999_999)),
            Err(ContextError::UnknownPinCode(_))
        ));
    }

    #[test]
    fn sections_appear_in_order() {
        let context = build_for(
            "@Koramangala/avgDeliveryTime and @Whitefield/totalOrders",
            Some(560_034),
        )
        .unwrap();
        let pin = context.find("Area Stats for Pin Code").unwrap();
        let insights = context.find("Insights on areas mentioned").unwrap();
        let stats = context.find("Relevant Stats:").unwrap();
        let metrics = context.find("Additional Metrics:").unwrap();
        assert!(pin < insights && insights < stats && stats < metrics);
        assert!(context.ends_with(
            "Additional Metrics:\nMetric for Koramangala - avgDeliveryTime: 32\nCould not find data for Whitefield\n"
        ));
    }

    #[test]
    fn bounds_relevant_stats() {
        let request = ContextRequest {
            message: "koramangala yelahanka",
            pin_code: None,
        };
        let context = build(&request, &dataset(), 40).unwrap();
        assert!(context.contains(TRUNCATION_MARKER));
        assert!(!context.contains("purchasingPower"));
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("₹₹₹", 2), format!("₹₹{TRUNCATION_MARKER}"));
        assert_eq!(truncate("abc", 3), "abc");
    }
}
