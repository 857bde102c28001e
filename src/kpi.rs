//! Headline figures for a set of charging points.
use crate::charge_point::ChargePoint;
use crate::series::unique_stations;
use serde::Serialize;
use std::collections::HashSet;

/// Number of kW in a GW
const KW_PER_GW: f64 = 1_000_000.0;

/// Key performance indicators for a filtered view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    /// Number of distinct charging stations
    pub station_count: usize,
    /// Number of charging points
    pub point_count: usize,
    /// Total power summed over charging points (GW)
    pub point_power_sum_gw: f64,
    /// Total installed power summed over charging stations (GW)
    pub station_power_sum_gw: f64,
}

/// Compute KPIs for the given charging points.
///
/// Installed station power is counted once per station (taken from the first point seen for that
/// station); summing it per point would multiply it by the number of points at the station.
/// Missing installed power counts as zero. An empty input gives all-zero KPIs.
pub fn compute_kpis<'a, I>(records: I) -> Kpis
where
    I: IntoIterator<Item = &'a ChargePoint> + Clone,
{
    let station_count = records
        .clone()
        .into_iter()
        .map(|point| &point.station_id)
        .collect::<HashSet<_>>()
        .len();

    let (point_count, point_power_kw) = records
        .clone()
        .into_iter()
        .fold((0, 0.0), |(count, sum), point| (count + 1, sum + point.power_kw));

    let station_power_kw: f64 = unique_stations(records)
        .filter_map(|point| point.installed_station_power_kw)
        .sum();

    Kpis {
        station_count,
        point_count,
        point_power_sum_gw: point_power_kw / KW_PER_GW,
        station_power_sum_gw: station_power_kw / KW_PER_GW,
    }
}
