//! Grouped series for charts: build-out per year, per-category breakdowns and operator rankings.
use crate::charge_point::{ChargePoint, PowerCategory};
use chrono::{Datelike, Days, Months, NaiveDate};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::iter;
use std::rc::Rc;

/// The number of records in a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    /// Commissioning year
    pub year: i32,
    /// Number of records
    pub count: usize,
}

/// The running total of records up to and including a month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// Calendar year
    pub year: i32,
    /// Calendar month (1 to 12)
    pub month: u32,
    /// Number of records commissioned in or before this month
    pub count: usize,
}

/// The number of records with a given category in a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCategoryCount {
    /// Commissioning year
    pub year: i32,
    /// Power category
    pub category: PowerCategory,
    /// Number of records (cumulative or not, depending on the producer)
    pub count: usize,
}

/// The number of records with a given category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Power category
    pub category: PowerCategory,
    /// Number of records
    pub count: usize,
}

/// The number of charging points run by an operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorCount {
    /// Operator name
    pub operator: Rc<str>,
    /// Number of charging points
    pub count: usize,
}

/// Keep only the first record seen for each station, preserving order
pub(crate) fn unique_stations<'a, I>(records: I) -> impl Iterator<Item = &'a ChargePoint>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    records
        .into_iter()
        .unique_by(|point| point.station_id.clone())
}

/// Count records per commissioning year, ordered by year.
///
/// If `dedupe_by_station` is set, only the first record for each station is counted, giving the
/// station build-out. Years without records are not included; see
/// [`dense_group_by_year_and_category`] for a zero-filled series.
pub fn group_by_year<'a, I>(records: I, dedupe_by_station: bool) -> Vec<YearCount>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    let years: Vec<i32> = if dedupe_by_station {
        unique_stations(records).map(ChargePoint::year).collect()
    } else {
        records.into_iter().map(ChargePoint::year).collect()
    };

    years
        .into_iter()
        .counts()
        .into_iter()
        .sorted()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// Count records for every combination of year and power category.
///
/// The year axis runs from the earliest to the latest year present, including years without any
/// records, and is crossed with every category present. Combinations with no records are filled
/// in with a count of zero. Output is ordered by year, then category.
pub fn dense_group_by_year_and_category<'a, I>(records: I) -> Vec<YearCategoryCount>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    let mut counts = BTreeMap::new();
    let mut categories = BTreeSet::new();
    for point in records {
        categories.insert(point.power_category);
        *counts
            .entry((point.year(), point.power_category))
            .or_insert(0) += 1;
    }

    let Some((first, last)) = counts
        .keys()
        .map(|&(year, _)| year)
        .minmax()
        .into_option()
    else {
        return Vec::new();
    };

    (first..=last)
        .cartesian_product(categories.iter().copied())
        .map(|(year, category)| YearCategoryCount {
            year,
            category,
            count: counts.get(&(year, category)).copied().unwrap_or(0),
        })
        .collect()
}

/// As [`dense_group_by_year_and_category`], but with counts accumulated over years.
///
/// Each category is accumulated independently.
pub fn dense_cumulative_by_year_and_category<'a, I>(records: I) -> Vec<YearCategoryCount>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    let mut totals = BTreeMap::new();
    dense_group_by_year_and_category(records)
        .into_iter()
        .map(|entry| {
            let total = totals.entry(entry.category).or_insert(0);
            *total += entry.count;
            YearCategoryCount {
                count: *total,
                ..entry
            }
        })
        .collect()
}

/// The first day of the month in which the point was commissioned
fn commissioning_month(point: &ChargePoint) -> NaiveDate {
    let date = point.commissioning_date;
    date - Days::new(u64::from(date.day0()))
}

/// Cumulative build-out per calendar month.
///
/// Every month from the earliest to the latest commissioning month is included, so months without
/// new records repeat the previous total. If `dedupe_by_station` is set, only the first record
/// for each station is counted.
pub fn cumulative_by_month<'a, I>(records: I, dedupe_by_station: bool) -> Vec<MonthCount>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    let months: Vec<NaiveDate> = if dedupe_by_station {
        unique_stations(records).map(commissioning_month).collect()
    } else {
        records.into_iter().map(commissioning_month).collect()
    };
    let counts = months.into_iter().counts();
    let Some((first, last)) = counts.keys().copied().minmax().into_option() else {
        return Vec::new();
    };

    let mut total = 0;
    iter::successors(Some(first), |month| month.checked_add_months(Months::new(1)))
        .take_while(|month| *month <= last)
        .map(|month| {
            total += counts.get(&month).copied().unwrap_or(0);
            MonthCount {
                year: month.year(),
                month: month.month(),
                count: total,
            }
        })
        .collect()
}

/// Count records per power category, largest first (ties in category order)
pub fn category_shares<'a, I>(records: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    records
        .into_iter()
        .map(|point| point.power_category)
        .counts()
        .into_iter()
        .sorted_by(|(cat1, count1), (cat2, count2)| count2.cmp(count1).then(cat1.cmp(cat2)))
        .map(|(category, count)| CategoryCount { category, count })
        .collect()
}

/// The `n` operators with the most charging points.
///
/// Ordered by count descending, with ties broken by operator name ascending. Points with an empty
/// operator name are not counted.
pub fn top_operators<'a, I>(records: I, n: usize) -> Vec<OperatorCount>
where
    I: IntoIterator<Item = &'a ChargePoint>,
{
    records
        .into_iter()
        .filter(|point| !point.operator_name.is_empty())
        .map(|point| &point.operator_name)
        .counts()
        .into_iter()
        .sorted_by(|(op1, count1), (op2, count2)| count2.cmp(count1).then(op1.cmp(op2)))
        .take(n)
        .map(|(operator, count)| OperatorCount {
            operator: Rc::clone(operator),
            count,
        })
        .collect()
}
