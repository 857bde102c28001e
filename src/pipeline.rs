//! Runs every aggregate for a filtered view of the data and memoises the results.
use crate::charge_point::ChargePoint;
use crate::choropleth::{
    DEFAULT_QUANTILES, DistrictCounts, DistrictValue, district_point_counts, district_values,
    quantile_bins,
};
use crate::filter::{FilterCriteria, filter_records};
use crate::input::DistrictMap;
use crate::kpi::{Kpis, compute_kpis};
use crate::series::{
    CategoryCount, MonthCount, OperatorCount, YearCategoryCount, YearCount, category_shares,
    cumulative_by_month, dense_cumulative_by_year_and_category, dense_group_by_year_and_category,
    group_by_year, top_operators,
};
use indexmap::IndexMap;
use log::debug;
use std::rc::Rc;

/// The default number of operators to rank
pub const DEFAULT_TOP_OPERATORS: usize = 10;

/// The default number of filtered views kept by [`AggregateCache`]
pub const DEFAULT_CACHE_LIMIT: usize = 64;

/// Parameters for the aggregates which are not part of the filter criteria
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    /// How many operators to include in the ranking
    pub top_operators: usize,
    /// Quantiles used for the choropleth bin edges
    pub quantiles: Vec<f64>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_operators: DEFAULT_TOP_OPERATORS,
            quantiles: DEFAULT_QUANTILES.to_vec(),
        }
    }
}

/// Chart-ready results for one filtered view
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    /// Headline figures
    pub kpis: Kpis,
    /// Charging points commissioned per year
    pub points_per_year: Vec<YearCount>,
    /// Charging stations commissioned per year
    pub stations_per_year: Vec<YearCount>,
    /// Running total of charging points per month
    pub cumulative_points_by_month: Vec<MonthCount>,
    /// Running total of charging stations per month
    pub cumulative_stations_by_month: Vec<MonthCount>,
    /// Points per year and power category, zero-filled
    pub points_by_year_and_category: Vec<YearCategoryCount>,
    /// Cumulative points per year and power category, zero-filled
    pub cumulative_points_by_year_and_category: Vec<YearCategoryCount>,
    /// Points per power category
    pub category_shares: Vec<CategoryCount>,
    /// Operators with the most points
    pub top_operators: Vec<OperatorCount>,
    /// Points per district code
    pub district_counts: DistrictCounts,
    /// Districts with their point counts, if a district table is available
    pub district_values: Option<Vec<DistrictValue>>,
    /// Colour-class boundaries for the map
    pub bin_edges: Vec<f64>,
}

impl Aggregates {
    /// Compute every aggregate for the given (already filtered) points
    pub fn compute(
        records: &[&ChargePoint],
        districts: Option<&DistrictMap>,
        options: &AggregateOptions,
    ) -> Self {
        let records = records.iter().copied();
        let district_counts = district_point_counts(records.clone());
        let district_values =
            districts.map(|districts| district_values(&district_counts, districts));

        // Bin over every district drawn on the map, or just those with points if there is no map
        let values: Vec<f64> = match &district_values {
            Some(values) => values.iter().map(|value| value.count as f64).collect(),
            None => district_counts.values().map(|&count| count as f64).collect(),
        };

        Self {
            kpis: compute_kpis(records.clone()),
            points_per_year: group_by_year(records.clone(), false),
            stations_per_year: group_by_year(records.clone(), true),
            cumulative_points_by_month: cumulative_by_month(records.clone(), false),
            cumulative_stations_by_month: cumulative_by_month(records.clone(), true),
            points_by_year_and_category: dense_group_by_year_and_category(records.clone()),
            cumulative_points_by_year_and_category: dense_cumulative_by_year_and_category(
                records.clone(),
            ),
            category_shares: category_shares(records.clone()),
            top_operators: top_operators(records, options.top_operators),
            bin_edges: quantile_bins(&values, &options.quantiles),
            district_counts,
            district_values,
        }
    }
}

/// A pure function cache for [`Aggregates`].
///
/// Results are keyed by the filter criteria and the version of the dataset they were computed
/// from, so entries for an older dataset are never returned. At most `limit` entries are kept;
/// when full, the least recently used entry is evicted.
pub struct AggregateCache {
    entries: IndexMap<(FilterCriteria, u64), Rc<Aggregates>>,
    limit: usize,
}

impl Default for AggregateCache {
    fn default() -> Self {
        Self::with_limit(DEFAULT_CACHE_LIMIT)
    }
}

impl AggregateCache {
    /// Create an empty cache holding up to [`DEFAULT_CACHE_LIMIT`] entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache holding up to `limit` entries (at least one)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            limit: limit.max(1),
        }
    }

    /// Get the aggregates for `criteria`, computing them if they are not cached.
    ///
    /// # Arguments
    ///
    /// * `records` - The full, unfiltered dataset
    /// * `districts` - The district table, if available
    /// * `version` - Version of the dataset which `records` belongs to
    /// * `criteria` - The filter to apply
    /// * `options` - Other aggregate parameters
    pub fn get_or_compute(
        &mut self,
        records: &[ChargePoint],
        districts: Option<&DistrictMap>,
        version: u64,
        criteria: &FilterCriteria,
        options: &AggregateOptions,
    ) -> Rc<Aggregates> {
        let key = (criteria.clone(), version);
        if let Some((index, _, aggregates)) = self.entries.get_full(&key) {
            debug!("Using cached aggregates for dataset version {version}");
            let aggregates = Rc::clone(aggregates);

            // Most recently used entries live at the back
            self.entries.move_index(index, self.entries.len() - 1);
            return aggregates;
        }

        let filtered = filter_records(records, criteria);
        debug!(
            "Computing aggregates for {} of {} charging points",
            filtered.len(),
            records.len()
        );
        let aggregates = Rc::new(Aggregates::compute(&filtered, districts, options));
        if self.entries.len() >= self.limit {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, Rc::clone(&aggregates));

        aggregates
    }

    /// Drop entries computed from datasets other than `version`
    pub fn retain_version(&mut self, version: u64) {
        self.entries.retain(|(_, entry_version), _| *entry_version == version);
    }

    /// The number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
