//! Bucketed distributions of salaries and rents.

use serde::Serialize;

/// One bucket of a [`Histogram`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Human-readable range, e.g. `"<3"`, `"3-6"` or `"25+"`.
    pub label: String,
    /// Values that fell into this bucket.
    pub count: usize,
    /// Share of all values, in percent, rounded to two decimals.
    pub percentage: f64,
}

/// Values partitioned into `[-∞, e1)`, `[e1, e2)`, …, `[en, ∞)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    /// Number of values counted.
    pub total: usize,
    /// Buckets in ascending order.
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    /// Buckets `values` by `edges`.
    ///
    /// Edges are sorted and de-duplicated first; non-finite edges and
    /// values are ignored. With no edges there is a single bucket.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(edges: &[f64], values: impl IntoIterator<Item = f64>) -> Self {
        let mut edges: Vec<f64> = edges.iter().copied().filter(|e| e.is_finite()).collect();
        edges.sort_by(f64::total_cmp);
        edges.dedup();

        let mut counts = vec![0_usize; edges.len() + 1];
        for value in values.into_iter().filter(|v| v.is_finite()) {
            counts[edges.partition_point(|&e| e <= value)] += 1;
        }
        let total: usize = counts.iter().sum();

        let buckets = counts
            .into_iter()
            .enumerate()
            .map(|(idx, count)| Bucket {
                label: label(&edges, idx),
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    (count as f64 * 10_000.0 / total as f64).round() / 100.0
                },
            })
            .collect();

        Self { total, buckets }
    }
}

fn label(edges: &[f64], idx: usize) -> String {
    match (idx.checked_sub(1).map(|i| edges[i]), edges.get(idx)) {
        (None, None) => "all".to_string(),
        (None, Some(upper)) => format!("<{upper}"),
        (Some(lower), Some(upper)) => format!("{lower}-{upper}"),
        (Some(lower), None) => format!("{lower}+"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_values_into_half_open_buckets() {
        let hist = Histogram::from_values(&[3.0, 6.0, 10.0], [1.0, 3.0, 5.9, 6.0, 12.5, 40.0]);
        let counts: Vec<usize> = hist.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, [1, 2, 1, 2]);
        assert_eq!(hist.total, 6);

        let labels: Vec<&str> = hist.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["<3", "3-6", "6-10", "10+"]);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let hist = Histogram::from_values(&[10.0, 20.0], [5.0, 15.0, 25.0]);
        let sum: f64 = hist.buckets.iter().map(|b| b.percentage).sum();
        assert!((sum - 100.0).abs() < 0.05, "sum was {sum}");
        assert!((hist.buckets[0].percentage - 33.33).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input_has_zeroed_buckets() {
        let hist = Histogram::from_values(&[10.0, 20.0], []);
        assert_eq!(hist.total, 0);
        assert_eq!(hist.buckets.len(), 3);
        assert!(hist.buckets.iter().all(|b| b.count == 0 && b.percentage == 0.0));
    }

    #[test]
    fn drops_non_finite_values_and_sorts_edges() {
        let hist = Histogram::from_values(&[20.0, f64::NAN, 10.0, 10.0], [f64::NAN, f64::INFINITY, 15.0]);
        assert_eq!(hist.total, 1);
        assert_eq!(hist.buckets.len(), 3);
        assert_eq!(hist.buckets[1].label, "10-20");
        assert_eq!(hist.buckets[1].count, 1);
        assert!((hist.buckets[1].percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_edges_means_one_bucket() {
        let hist = Histogram::from_values(&[], [1.0, 2.0]);
        assert_eq!(hist.buckets.len(), 1);
        assert_eq!(hist.buckets[0].label, "all");
        assert_eq!(hist.buckets[0].count, 2);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Histogram::from_values(&[1.0], [0.5])).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["buckets"][0]["label"], "<1");
        assert_eq!(json["buckets"][0]["percentage"], 100.0);
    }
}
