#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area, pin code and per-area statistics types.
//!
//! These types mirror the three static JSON tables the dashboard ships
//! with: served areas (`areas.json`), operational statistics for served
//! areas (`stats.json`) and socioeconomic fallback statistics for unserved
//! areas (`lockedArea.json`). Fields that the fixtures do not always carry
//! are `Option`s so that "absent" is a case callers must handle.

use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// A postal pin code identifying a Bengaluru locality.
///
/// The fixture files are not consistent about whether pin codes are JSON
/// numbers or numeric strings, so both are accepted on input. Pin codes
/// are always serialized as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PinCode(u32);

impl PinCode {
    /// Wraps a raw pin code value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PinCode {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl<'de> Deserialize<'de> for PinCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A Bengaluru locality as stored in `areas.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Postal pin code (unique across the table).
    pub pin_code: PinCode,
    /// Display name (e.g. "Koramangala").
    pub name: String,
    /// Whether the dashboard has operational data for this area.
    pub is_served: bool,
    /// Encyclopedia page title, when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_name: Option<String>,
    /// Boundary geometry for the map. Never included in chat context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
    /// Any other fields present in the fixture, passed through verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Area {
    /// Title used to look this area up in the encyclopedia.
    #[must_use]
    pub fn summary_title(&self) -> &str {
        self.wiki_name.as_deref().unwrap_or(&self.name)
    }
}

/// Number of orders placed on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOrders {
    /// Day label (ISO 8601 date).
    pub date: String,
    /// Orders placed that day.
    pub orders: u64,
}

/// Operational statistics for a served area (`stats.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServedAreaStat {
    /// Pin code of the served area this row belongs to.
    pub pin_code: PinCode,
    /// Per-day order counts.
    #[serde(default)]
    pub daily_orders: Vec<DailyOrders>,
    /// Orders the area can fulfil per day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_capacity: Option<f64>,
    /// Average delivery time in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_delivery_time: Option<f64>,
    /// Average delivery delay in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_delay: Option<f64>,
    /// Precomputed total orders, when the fixture carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_orders: Option<u64>,
    /// Average order value in rupees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_order_value: Option<f64>,
    /// App-open history series, shape defined by the dashboard frontend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_opens_history: Option<serde_json::Value>,
    /// Any other metrics present in the fixture.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ServedAreaStat {
    /// Sum of all daily order counts.
    #[must_use]
    pub fn daily_order_total(&self) -> u64 {
        self.daily_orders.iter().map(|d| d.orders).sum()
    }

    /// Total orders, preferring the precomputed value when present.
    #[must_use]
    pub fn total_orders(&self) -> u64 {
        self.total_orders
            .unwrap_or_else(|| self.daily_order_total())
    }

    /// Ratio of summed daily orders to daily capacity.
    #[must_use]
    pub fn utilisation(&self) -> Utilisation {
        Utilisation::compute(self.daily_order_total(), self.daily_capacity)
    }

    /// Looks up a metric by its camelCase field name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<serde_json::Value> {
        metric_of(self, name)
    }
}

/// Socioeconomic fallback statistics for an unserved area
/// (`lockedArea.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedAreaStat {
    /// Pin code of the unserved area this row belongs to.
    pub pin_code: PinCode,
    /// Residents per square kilometre.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population_density: Option<f64>,
    /// Median annual household income in rupees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_household_income: Option<f64>,
    /// Relative purchasing power index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchasing_power: Option<f64>,
    /// Any other metrics present in the fixture.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LockedAreaStat {
    /// Looks up a metric by its camelCase field name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<serde_json::Value> {
        metric_of(self, name)
    }
}

/// Serializes a stat row and reads one top-level field. Fields skipped
/// during serialization (absent `Option`s) are reported as missing.
fn metric_of<T: Serialize>(stat: &T, name: &str) -> Option<serde_json::Value> {
    match serde_json::to_value(stat).ok()? {
        serde_json::Value::Object(mut map) => map.remove(name),
        _ => None,
    }
}

/// Orders-to-capacity ratio of a served area, in `[0, ∞)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Utilisation(f64);

impl Utilisation {
    /// Computes `orders / max(capacity, 1)`. A missing capacity counts
    /// as 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(total_orders: u64, daily_capacity: Option<f64>) -> Self {
        let capacity = daily_capacity
            .filter(|c| c.is_finite())
            .unwrap_or(0.0)
            .max(1.0);
        Self(total_orders as f64 / capacity)
    }

    /// The raw ratio.
    #[must_use]
    pub const fn ratio(self) -> f64 {
        self.0
    }
}

/// Formats to two decimal places (`"0.90"`).
impl fmt::Display for Utilisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn served(orders: &[u64], capacity: Option<f64>) -> ServedAreaStat {
        ServedAreaStat {
            pin_code: PinCode::new(560_034),
            daily_orders: orders
                .iter()
                .enumerate()
                .map(|(i, &orders)| DailyOrders {
                    date: format!("2024-06-{:02}", i + 1),
                    orders,
                })
                .collect(),
            daily_capacity: capacity,
            avg_delivery_time: Some(28.0),
            delivery_delay: None,
            total_orders: None,
            avg_order_value: None,
            app_opens_history: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn pin_code_accepts_number_and_string() {
        let a: PinCode = serde_json::from_value(serde_json::json!(560_034)).unwrap();
        let b: PinCode = serde_json::from_value(serde_json::json!("560034")).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(a).unwrap(), serde_json::json!(560_034));
    }

    #[test]
    fn pin_code_rejects_garbage() {
        assert!(serde_json::from_value::<PinCode>(serde_json::json!("abc")).is_err());
        assert!("56x".parse::<PinCode>().is_err());
    }

    #[test]
    fn utilisation_formats_two_decimals() {
        let stat = served(&[50, 40], Some(100.0));
        assert_eq!(stat.utilisation().to_string(), "0.90");
    }

    #[test]
    fn utilisation_treats_missing_or_zero_capacity_as_one() {
        assert_eq!(served(&[3, 4], None).utilisation().to_string(), "7.00");
        assert_eq!(served(&[3, 4], Some(0.0)).utilisation().to_string(), "7.00");
        assert_eq!(served(&[], Some(10.0)).utilisation().to_string(), "0.00");
    }

    #[test]
    fn total_orders_prefers_precomputed_value() {
        let mut stat = served(&[10, 20], Some(50.0));
        assert_eq!(stat.total_orders(), 30);
        stat.total_orders = Some(999);
        assert_eq!(stat.total_orders(), 999);
        assert_eq!(stat.daily_order_total(), 30);
    }

    #[test]
    fn metric_lookup_uses_camel_case_names() {
        let stat = served(&[1], Some(5.0));
        assert_eq!(stat.metric("avgDeliveryTime"), Some(serde_json::json!(28.0)));
        assert_eq!(stat.metric("deliveryDelay"), None);
        assert_eq!(stat.metric("avg_delivery_time"), None);
        assert!(stat.metric("dailyOrders").unwrap().is_array());
    }

    #[test]
    fn metric_lookup_sees_extra_fixture_fields() {
        let stat: LockedAreaStat = serde_json::from_value(serde_json::json!({
            "pinCode": "560064",
            "populationDensity": 8200.0,
            "literacyRate": 0.91
        }))
        .unwrap();
        assert_eq!(stat.metric("literacyRate"), Some(serde_json::json!(0.91)));
        assert_eq!(stat.metric("purchasingPower"), None);
    }

    #[test]
    fn area_passes_unknown_fields_through() {
        let raw = serde_json::json!({
            "pinCode": 560_034,
            "name": "Koramangala",
            "isServed": true,
            "zone": "South"
        });
        let area: Area = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(area.summary_title(), "Koramangala");
        assert_eq!(serde_json::to_value(&area).unwrap(), raw);
    }
}
