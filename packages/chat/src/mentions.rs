//! Finds the localities a chat message talks about.
//!
//! Two kinds of mention are recognised:
//!
//! * explicit `@<locality>/<metric>` requests, e.g.
//!   `@Koramangala/avgDeliveryTime`, which resolve to a single metric line;
//! * implicit mentions, where a known area name simply appears somewhere
//!   in the message (case-insensitive).

use std::fmt;
use std::sync::LazyLock;

use area_insights_area::dataset::Dataset;
use area_insights_area_models::Area;
use regex::Regex;
use serde_json::Value;

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w\s]+)/(\w+)").expect("valid regex"));

/// Outcome of one `@<locality>/<metric>` request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplicitMention<'a> {
    /// No area has this name.
    LocalityNotFound {
        /// Locality text as written, trimmed.
        raw: String,
    },
    /// The area exists but has no value for the metric.
    MetricNotFound {
        area: &'a Area,
        metric: String,
    },
    /// The metric was found.
    Resolved {
        area: &'a Area,
        metric: String,
        value: Value,
    },
}

impl fmt::Display for ExplicitMention<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalityNotFound { raw } => write!(f, "Could not find data for {raw}"),
            Self::MetricNotFound { area, metric } => {
                write!(f, "No metric \"{metric}\" found for {}", area.name)
            }
            Self::Resolved {
                area,
                metric,
                value,
            } => write!(
                f,
                "Metric for {} - {metric}: {}",
                area.name,
                render_value(value)
            ),
        }
    }
}

/// Two implicitly matched areas where one name contains the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap<'a> {
    /// Area whose name is contained in the other's.
    pub shorter: &'a Area,
    /// Area whose name contains the other's.
    pub longer: &'a Area,
}

impl fmt::Display for Overlap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" also matches \"{}\"",
            self.shorter.name, self.longer.name
        )
    }
}

/// Everything [`extract`] found in a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction<'a> {
    /// Explicit requests, in message order.
    pub explicit: Vec<ExplicitMention<'a>>,
    /// Areas named anywhere in the message, in dataset order.
    pub implicit: Vec<&'a Area>,
    /// Implicit matches whose names overlap. Both areas stay in
    /// `implicit`.
    pub overlaps: Vec<Overlap<'a>>,
}

/// Extracts explicit and implicit locality mentions from `message`.
#[must_use]
pub fn extract<'a>(message: &str, dataset: &'a Dataset) -> Extraction<'a> {
    let explicit = MENTION_RE
        .captures_iter(message)
        .map(|caps| {
            let raw = caps[1].trim();
            let metric = caps[2].to_string();

            let Some(area) = dataset.area_by_name(raw) else {
                return ExplicitMention::LocalityNotFound {
                    raw: raw.to_string(),
                };
            };

            match dataset.stat_for(area).and_then(|stat| stat.metric(&metric)) {
                Some(value) => ExplicitMention::Resolved {
                    area,
                    metric,
                    value,
                },
                None => ExplicitMention::MetricNotFound { area, metric },
            }
        })
        .collect();

    let lowered = message.to_lowercase();
    let matched: Vec<(&str, &Area)> = dataset
        .lower_names()
        .filter(|(name, _)| !name.is_empty() && lowered.contains(name))
        .collect();

    let mut overlaps = Vec::new();
    for (i, &(a_name, a)) in matched.iter().enumerate() {
        for &(b_name, b) in &matched[i + 1..] {
            let overlap = if b_name.contains(a_name) {
                Some(Overlap {
                    shorter: a,
                    longer: b,
                })
            } else if a_name.contains(b_name) {
                Some(Overlap {
                    shorter: b,
                    longer: a,
                })
            } else {
                None
            };
            if let Some(overlap) = overlap {
                log::warn!("Ambiguous locality match: {overlap}");
                overlaps.push(overlap);
            }
        }
    }

    Extraction {
        explicit,
        implicit: matched.into_iter().map(|(_, area)| area).collect(),
        overlaps,
    }
}

/// Renders a metric value for a prompt line.
///
/// Strings are written raw, whole numbers without a trailing `.0`, and
/// arrays or objects as compact JSON.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
