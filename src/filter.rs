//! Filtering of charging points by the selections a user has made.
//!
//! All predicates are conjunctive. A set-valued option which is empty places no restriction on
//! the records, matching the "everything selected" default presented to users.
use crate::charge_point::{ChargePoint, PowerCategory};
use crate::input::read_toml;
use anyhow::{Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use strum::IntoEnumIterator;

/// The criteria used to select a subset of charging points.
///
/// Implements [`Hash`] so that it can be used as a cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterCriteria {
    /// Inclusive range of commissioning years
    pub year_range: Option<(i32, i32)>,
    /// Regions (federal states) to include
    pub regions: BTreeSet<String>,
    /// Power categories to include
    pub power_categories: BTreeSet<PowerCategory>,
    /// Use cases to include. Points without a use case only match if this is empty.
    pub use_cases: BTreeSet<String>,
    /// Case-insensitive substring which the district name must contain
    pub district_query: Option<String>,
    /// Case-insensitive substring which the operator name must contain
    pub operator_query: Option<String>,
}

impl FilterCriteria {
    /// Read filter criteria from a TOML file
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let criteria: Self = read_toml(file_path)?;
        if let Some((min, max)) = criteria.year_range {
            ensure!(min <= max, "Invalid year range: {min} > {max}");
        }

        Ok(criteria)
    }

    /// Whether the given point satisfies every predicate
    pub fn matches(&self, point: &ChargePoint) -> bool {
        if let Some((min, max)) = self.year_range
            && !(min..=max).contains(&point.year())
        {
            return false;
        }

        if !self.regions.is_empty() && !self.regions.contains(&*point.region) {
            return false;
        }

        if !self.power_categories.is_empty()
            && !self.power_categories.contains(&point.power_category)
        {
            return false;
        }

        if !self.use_cases.is_empty() {
            let Some(use_case) = &point.use_case else {
                return false;
            };
            if !self.use_cases.contains(&**use_case) {
                return false;
            }
        }

        contains_ignore_case(&point.district, self.district_query.as_deref())
            && contains_ignore_case(&point.operator_name, self.operator_query.as_deref())
    }
}

/// Case-insensitive substring check. An absent or empty query always matches.
fn contains_ignore_case(haystack: &str, query: Option<&str>) -> bool {
    match query {
        None | Some("") => true,
        Some(query) => haystack.to_lowercase().contains(&query.to_lowercase()),
    }
}

/// Select the points which match `criteria`, preserving input order.
///
/// The input is not modified; the result holds references into it.
pub fn filter_records<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<&'a ChargePoint>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    records
        .into_iter()
        .filter(|point| criteria.matches(point))
        .collect()
}

/// The choices available to a user, derived from the full dataset
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    /// Earliest and latest commissioning year, if there is any data
    pub year_bounds: Option<(i32, i32)>,
    /// Distinct regions, sorted
    pub regions: Vec<String>,
    /// Power categories present in the data, highest first
    pub power_categories: Vec<PowerCategory>,
    /// Distinct use cases, sorted. Untagged points are not represented.
    pub use_cases: Vec<String>,
}

impl FilterOptions {
    /// Collect the available options from the given points
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ChargePoint> + Clone,
    {
        let year_bounds = records
            .clone()
            .into_iter()
            .map(ChargePoint::year)
            .minmax()
            .into_option();
        let regions = records
            .clone()
            .into_iter()
            .map(|point| point.region.to_string())
            .sorted()
            .dedup()
            .collect();
        let present: BTreeSet<_> = records
            .clone()
            .into_iter()
            .map(|point| point.power_category)
            .collect();
        let power_categories = PowerCategory::iter()
            .filter(|category| present.contains(category))
            .collect();
        let use_cases = records
            .into_iter()
            .filter_map(|point| point.use_case.as_deref().map(str::to_string))
            .sorted()
            .dedup()
            .collect();

        Self {
            year_bounds,
            regions,
            power_categories,
            use_cases,
        }
    }

    /// Criteria with every option selected and no text queries.
    ///
    /// The use-case selection is left empty, as selecting every known use case would still drop
    /// points with no use case.
    pub fn all_selected(&self) -> FilterCriteria {
        FilterCriteria {
            year_range: self.year_bounds,
            regions: self.regions.iter().cloned().collect(),
            power_categories: self.power_categories.iter().copied().collect(),
            use_cases: BTreeSet::new(),
            district_query: None,
            operator_query: None,
        }
    }
}
