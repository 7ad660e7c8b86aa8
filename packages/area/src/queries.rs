//! Area endpoints implemented over the static [`Dataset`].

use area_insights_area_models::{Area, DailyOrders, PinCode, ServedAreaStat};
use serde::Serialize;

use crate::AreaStatsError;
use crate::dataset::Dataset;
use crate::summary::SummaryClient;

/// A served area merged with its statistics row (or `null`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServedAreaWithData<'a> {
    /// The area, flattened into the object.
    #[serde(flatten)]
    pub area: &'a Area,
    /// Its statistics row, if the fixture has one.
    pub stats: Option<&'a ServedAreaStat>,
}

/// Public statistics shape of a served area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServedStatsView {
    /// Precomputed total, or the sum of `daily_orders`.
    pub total_orders: u64,
    /// Average order value in rupees.
    pub avg_order_value: Option<f64>,
    /// Average delivery time in minutes.
    pub avg_delivery_time: Option<f64>,
    /// Average delivery delay in minutes.
    pub delivery_delay: Option<f64>,
    pub daily_orders: Vec<DailyOrders>,
    /// Passed through as stored.
    pub app_opens_history: Option<serde_json::Value>,
    /// Name of the area with the requested pin code.
    pub area_name: String,
}

/// Encyclopedia summary of an unserved area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedSummaryView {
    /// Always `true`.
    pub is_locked: bool,
    pub pin_code: PinCode,
    pub area_name: String,
    /// Page summary JSON as returned by Wikipedia.
    pub wiki_data: serde_json::Value,
}

/// Socioeconomic fallback statistics of an unserved area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackStatsView {
    /// Always `true`.
    pub is_fallback: bool,
    pub pin_code: PinCode,
    pub area_name: String,
    /// Residents per square kilometre.
    pub population_density: Option<f64>,
    /// Median annual household income in rupees.
    pub median_household_income: Option<f64>,
    /// Relative purchasing power index.
    pub purchasing_power: Option<f64>,
}

/// Result of [`area_stats`]: exactly one of the three shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AreaStatsView {
    /// Served area with operational statistics.
    Served(ServedStatsView),
    /// Unserved area described by its encyclopedia summary.
    Locked(LockedSummaryView),
    /// Unserved area described by fallback statistics.
    Fallback(FallbackStatsView),
}

/// Every area, verbatim.
#[must_use]
pub fn list_all(dataset: &Dataset) -> &[Area] {
    dataset.areas()
}

/// Areas with operational data.
#[must_use]
pub fn list_served(dataset: &Dataset) -> Vec<&Area> {
    dataset.areas().iter().filter(|a| a.is_served).collect()
}

/// Served areas, each merged with its statistics row or `null`.
#[must_use]
pub fn served_with_data(dataset: &Dataset) -> Vec<ServedAreaWithData<'_>> {
    list_served(dataset)
        .into_iter()
        .map(|area| ServedAreaWithData {
            area,
            stats: dataset.served_stat(area.pin_code),
        })
        .collect()
}

/// Resolves the statistics shown for one area.
///
/// Unknown pin codes are rejected before any external call. Unserved
/// areas are described by their encyclopedia summary, falling back to the
/// `lockedArea.json` row when the summary cannot be fetched.
///
/// # Errors
///
/// Returns [`AreaStatsError`] when the area is unknown, a served area has
/// no statistics row, or an unserved area has neither a summary nor a
/// fallback row.
pub async fn area_stats(
    dataset: &Dataset,
    summaries: &dyn SummaryClient,
    pin_code: PinCode,
) -> Result<AreaStatsView, AreaStatsError> {
    let area = dataset
        .area(pin_code)
        .ok_or(AreaStatsError::AreaNotFound(pin_code))?;

    if !area.is_served {
        return locked_area_stats(dataset, summaries, area).await;
    }

    let stat = dataset
        .served_stat(pin_code)
        .ok_or(AreaStatsError::StatsNotFound(pin_code))?;

    Ok(AreaStatsView::Served(ServedStatsView {
        total_orders: stat.total_orders(),
        avg_order_value: stat.avg_order_value,
        avg_delivery_time: stat.avg_delivery_time,
        delivery_delay: stat.delivery_delay,
        daily_orders: stat.daily_orders.clone(),
        app_opens_history: stat.app_opens_history.clone(),
        area_name: area.name.clone(),
    }))
}

async fn locked_area_stats(
    dataset: &Dataset,
    summaries: &dyn SummaryClient,
    area: &Area,
) -> Result<AreaStatsView, AreaStatsError> {
    match summaries.summary(area.summary_title()).await {
        Ok(Some(wiki_data)) => {
            return Ok(AreaStatsView::Locked(LockedSummaryView {
                is_locked: true,
                pin_code: area.pin_code,
                area_name: area.name.clone(),
                wiki_data,
            }));
        }
        Ok(None) => {}
        Err(e) => log::warn!("Summary lookup for {} failed: {e}", area.name),
    }

    let fallback = dataset
        .locked_stat(area.pin_code)
        .ok_or(AreaStatsError::SummaryUnavailable(area.pin_code))?;

    Ok(AreaStatsView::Fallback(FallbackStatsView {
        is_fallback: true,
        pin_code: area.pin_code,
        area_name: area.name.clone(),
        population_density: fallback.population_density,
        median_household_income: fallback.median_household_income,
        purchasing_power: fallback.purchasing_power,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::AreaError;

    const AREAS: &str = r#"[
        {"pinCode": 560034, "name": "Koramangala", "isServed": true},
        {"pinCode": 560076, "name": "BTM Layout", "isServed": true},
        {"pinCode": 560064, "name": "Yelahanka", "isServed": false},
        {"pinCode": 560099, "name": "Anekal", "isServed": false}
    ]"#;
    const SERVED: &str = r#"[
        {"pinCode": 560034, "dailyOrders": [{"date": "2024-06-01", "orders": 50}, {"date": "2024-06-02", "orders": 40}],
         "dailyCapacity": 100, "avgDeliveryTime": 24, "avgOrderValue": 410.5}
    ]"#;
    const LOCKED: &str = r#"[
        {"pinCode": 560064, "populationDensity": 8200, "medianHouseholdIncome": 540000, "purchasingPower": 61.5}
    ]"#;

    fn dataset() -> Dataset {
        Dataset::from_json_str(AREAS, SERVED, LOCKED).unwrap()
    }

    enum Mode {
        Found,
        Missing,
        Broken,
    }

    struct MockSummaries {
        mode: Mode,
        calls: AtomicUsize,
    }

    impl MockSummaries {
        const fn new(mode: Mode) -> Self {
            Self {
                mode,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl SummaryClient for MockSummaries {
        async fn summary(&self, title: &str) -> Result<Option<serde_json::Value>, AreaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Found => Ok(Some(serde_json::json!({ "title": title }))),
                Mode::Missing => Ok(None),
                Mode::Broken => Err(AreaError::InvalidUrl {
                    message: "offline".to_string(),
                }),
            }
        }
    }

    #[test]
    fn lists_all_and_served_areas() {
        let ds = dataset();
        assert_eq!(list_all(&ds).len(), 4);
        let served: Vec<&str> = list_served(&ds).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(served, ["Koramangala", "BTM Layout"]);
    }

    #[test]
    fn served_with_data_uses_null_for_missing_stats() {
        let ds = dataset();
        let json = serde_json::to_value(served_with_data(&ds)).unwrap();
        assert_eq!(json[0]["name"], "Koramangala");
        assert_eq!(json[0]["stats"]["dailyCapacity"], 100.0);
        assert_eq!(json[1]["name"], "BTM Layout");
        assert!(json[1]["stats"].is_null());
    }

    #[tokio::test]
    async fn unknown_pin_code_never_calls_summary_service() {
        let ds = dataset();
        let summaries = MockSummaries::new(Mode::Found);
        for pin in [1, 560_001, 999_999] {
            let result = area_stats(&ds, &summaries, PinCode::new(pin)).await;
            assert_eq!(result, Err(AreaStatsError::AreaNotFound(PinCode::new(pin))));
        }
        assert_eq!(summaries.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn served_area_returns_public_stats_shape() {
        let ds = dataset();
        let summaries = MockSummaries::new(Mode::Found);
        let view = area_stats(&ds, &summaries, PinCode::new(560_034))
            .await
            .unwrap();
        let AreaStatsView::Served(stats) = view else {
            panic!("expected served stats, got {view:?}");
        };
        assert_eq!(stats.total_orders, 90);
        assert_eq!(stats.area_name, "Koramangala");
        assert_eq!(stats.avg_order_value, Some(410.5));
        assert_eq!(summaries.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn served_area_without_stats_is_not_found() {
        let ds = dataset();
        let summaries = MockSummaries::new(Mode::Found);
        let result = area_stats(&ds, &summaries, PinCode::new(560_076)).await;
        assert_eq!(result, Err(AreaStatsError::StatsNotFound(PinCode::new(560_076))));
    }

    #[tokio::test]
    async fn locked_area_prefers_summary() {
        let ds = dataset();
        let summaries = MockSummaries::new(Mode::Found);
        let view = area_stats(&ds, &summaries, PinCode::new(560_064))
            .await
            .unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["isLocked"], true);
        assert_eq!(json["wikiData"]["title"], "Yelahanka");
        assert!(json.get("isFallback").is_none());
        assert!(json.get("populationDensity").is_none());
    }

    #[tokio::test]
    async fn locked_area_falls_back_on_missing_or_failed_summary() {
        let ds = dataset();
        for mode in [Mode::Missing, Mode::Broken] {
            let summaries = MockSummaries::new(mode);
            let view = area_stats(&ds, &summaries, PinCode::new(560_064))
                .await
                .unwrap();
            let json = serde_json::to_value(&view).unwrap();
            assert_eq!(json["isFallback"], true);
            assert_eq!(json["populationDensity"], 8200.0);
            assert!(json.get("isLocked").is_none());
            assert!(json.get("wikiData").is_none());
            assert_eq!(summaries.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn locked_area_without_fallback_is_unavailable() {
        let ds = dataset();
        let summaries = MockSummaries::new(Mode::Broken);
        let result = area_stats(&ds, &summaries, PinCode::new(560_099)).await;
        assert_eq!(
            result,
            Err(AreaStatsError::SummaryUnavailable(PinCode::new(560_099)))
        );
    }

    #[tokio::test]
    async fn every_known_area_yields_exactly_one_shape() {
        let ds = dataset();
        let summaries = MockSummaries::new(Mode::Missing);
        for area in ds.areas() {
            let Ok(view) = area_stats(&ds, &summaries, area.pin_code).await else {
                continue;
            };
            let json = serde_json::to_value(&view).unwrap();
            let served_keys = json.get("totalOrders").is_some();
            let locked_keys = json.get("isLocked").is_some() || json.get("isFallback").is_some();
            assert!(served_keys != locked_keys, "mixed shape for {}", area.name);
            assert_eq!(served_keys, area.is_served);
        }
    }
}
