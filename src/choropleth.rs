//! District-level values and colour-class boundaries for the choropleth map.
use crate::charge_point::ChargePoint;
use crate::id::DistrictCode;
use crate::input::DistrictMap;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

/// The quantiles used for bin edges unless configured otherwise
pub const DEFAULT_QUANTILES: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Factor by which the last edge is scaled when too few distinct edges remain
const EDGE_SCALE_FACTOR: f64 = 1.1;

/// The minimum number of edges for a usable legend
const MIN_EDGES: usize = 3;

/// Number of charging points per district code
pub type DistrictCounts = BTreeMap<DistrictCode, usize>;

/// A district with its point count, as drawn on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictValue {
    /// Official district code
    pub code: DistrictCode,
    /// Display name
    pub name: String,
    /// Number of charging points (zero if there are none)
    pub count: usize,
}

/// Count charging points per district code
pub fn district_point_counts<'a, I>(records: I) -> DistrictCounts
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    let mut counts = DistrictCounts::new();
    for point in records {
        *counts.entry(point.district_code.clone()).or_default() += 1;
    }

    counts
}

/// Join point counts onto the district table.
///
/// Every district in the table appears once, in table order; districts without points get a
/// count of zero. Counts for codes missing from the table are ignored.
pub fn district_values(counts: &DistrictCounts, districts: &DistrictMap) -> Vec<DistrictValue> {
    districts
        .iter()
        .map(|(code, name)| DistrictValue {
            code: code.clone(),
            name: name.clone(),
            count: counts.get(code).copied().unwrap_or(0),
        })
        .collect()
}

/// Linearly interpolated quantile of sorted, non-empty data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor();
    let frac = pos - lower;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = lower as usize;
    let upper = (lower + 1).min(sorted.len() - 1);

    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Compute bin edges for the choropleth legend.
///
/// Quantiles are taken over the strictly positive values only, as zero is drawn as a separate
/// "no data" class. Repeated edges are removed, then the last edge is scaled up until there are at
/// least three. If there are no positive values the result is `[0, 1]`; if no quantiles were
/// requested it is `[0, max / 2, max]`.
///
/// # Arguments
///
/// * `values` - Non-negative values, e.g. point counts per district
/// * `quantiles` - Ascending quantiles in the range [0, 1]
pub fn quantile_bins(values: &[f64], quantiles: &[f64]) -> Vec<f64> {
    let positive: Vec<f64> = values
        .iter()
        .copied()
        .filter(|value| value.is_finite() && *value > 0.0)
        .sorted_by(f64::total_cmp)
        .collect();
    let Some(&max) = positive.last() else {
        return vec![0.0, 1.0];
    };

    let mut edges: Vec<f64> = quantiles
        .iter()
        .filter(|q| q.is_finite())
        .map(|q| quantile(&positive, q.clamp(0.0, 1.0)))
        .dedup()
        .collect();
    let Some(mut last) = edges.last().copied() else {
        return vec![0.0, max / 2.0, max];
    };

    while edges.len() < MIN_EDGES {
        last *= EDGE_SCALE_FACTOR;
        edges.push(last);
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::charge_points;
    use float_cmp::assert_approx_eq;
    use map_macro::btree_map;
    use rstest::rstest;

    #[rstest]
    fn test_district_point_counts(charge_points: Vec<ChargePoint>) {
        assert_eq!(
            district_point_counts(&charge_points),
            btree_map! {
                "06611".into() => 3,
                "09162".into() => 3,
            }
        );
    }

    #[test]
    fn test_district_point_counts_empty() {
        assert!(district_point_counts(&[]).is_empty());
    }

    #[test]
    fn test_district_values() {
        let counts = btree_map! {
            DistrictCode::from("09162") => 7,
            DistrictCode::from("99999") => 1,
        };
        let districts = DistrictMap::from([
            ("01001".into(), "Flensburg".to_string()),
            ("09162".into(), "München".to_string()),
        ]);

        assert_eq!(
            district_values(&counts, &districts),
            [
                DistrictValue {
                    code: "01001".into(),
                    name: "Flensburg".into(),
                    count: 0
                },
                DistrictValue {
                    code: "09162".into(),
                    name: "München".into(),
                    count: 7
                },
            ]
        );
    }

    #[rstest]
    #[case(&[1.0], 0.5, 1.0)]
    #[case(&[1.0, 2.0, 3.0, 4.0], 0.0, 1.0)]
    #[case(&[1.0, 2.0, 3.0, 4.0], 1.0, 4.0)]
    #[case(&[1.0, 2.0, 3.0, 4.0], 0.5, 2.5)]
    #[case(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.2, 1.8)]
    fn test_quantile(#[case] sorted: &[f64], #[case] q: f64, #[case] expected: f64) {
        assert_approx_eq!(f64, quantile(sorted, q), expected);
    }

    #[test]
    fn test_quantile_bins_distinct_values() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0];
        let edges = quantile_bins(&values, &DEFAULT_QUANTILES);
        let expected = [1.0, 1.8, 2.6, 3.4, 4.2, 5.0];
        assert_eq!(edges.len(), expected.len());
        for (edge, expected) in edges.into_iter().zip(expected) {
            assert_approx_eq!(f64, edge, expected);
        }
    }

    #[test]
    fn test_quantile_bins_all_equal() {
        let edges = quantile_bins(&[5.0, 5.0, 5.0, 5.0], &DEFAULT_QUANTILES);
        assert_eq!(edges.len(), 3);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        assert_approx_eq!(f64, edges[0], 5.0);
        assert_approx_eq!(f64, edges[1], 5.5);
        assert_approx_eq!(f64, edges[2], 6.05);
    }

    #[test]
    fn test_quantile_bins_repeated_edges_removed() {
        let edges = quantile_bins(&[1.0, 1.0, 1.0, 1.0, 10.0], &DEFAULT_QUANTILES);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        assert_approx_eq!(f64, edges[0], 1.0);
        assert_approx_eq!(f64, *edges.last().unwrap(), 10.0);
    }

    #[rstest]
    #[case(&[])]
    #[case(&[0.0, 0.0])]
    fn test_quantile_bins_no_positive_values(#[case] values: &[f64]) {
        assert_eq!(quantile_bins(values, &DEFAULT_QUANTILES), [0.0, 1.0]);
    }

    #[test]
    fn test_quantile_bins_no_quantiles() {
        assert_eq!(quantile_bins(&[0.0, 2.0, 8.0], &[]), [0.0, 4.0, 8.0]);
    }
}
