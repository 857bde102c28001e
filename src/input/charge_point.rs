//! Code for reading [`ChargePoint`]s from the charging infrastructure CSV file.
use super::*;
use crate::charge_point::{ChargePoint, PowerCategory};
use anyhow::{Result, ensure};
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use log::info;
use serde::Deserialize;
use std::path::Path;

/// Columns which must be present in the header of the input file
const REQUIRED_COLUMNS: [&str; 10] = [
    "ladestation_id",
    "ladepunkt_id",
    "Inbetriebnahmedatum",
    "Bundesland",
    "KreisKreisfreieStadt",
    "ARS",
    "LadeleistungInKW",
    "InstallierteLadeleistungNLL",
    "BetreiberBereinigt",
    "LadeUseCase",
];

/// A row of the input file as it appears on disk.
///
/// Cells which are empty or fail to parse are read as `None`.
#[derive(Debug, Deserialize, PartialEq)]
struct ChargePointRaw {
    #[serde(rename = "ladestation_id")]
    station_id: Option<String>,
    #[serde(rename = "ladepunkt_id")]
    id: Option<String>,
    #[serde(rename = "Inbetriebnahmedatum")]
    commissioning_date: Option<String>,
    #[serde(rename = "Bundesland")]
    region: Option<String>,
    #[serde(rename = "KreisKreisfreieStadt")]
    district: Option<String>,
    #[serde(rename = "ARS")]
    district_code: Option<String>,
    #[serde(
        rename = "LadeleistungInKW",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    power_kw: Option<f64>,
    #[serde(
        rename = "InstallierteLadeleistungNLL",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    installed_station_power_kw: Option<f64>,
    #[serde(rename = "BetreiberBereinigt")]
    operator_name: Option<String>,
    #[serde(rename = "LadeUseCase")]
    use_case: Option<String>,
}

impl ChargePointRaw {
    /// Validate the row, returning `None` if a required field is missing
    fn into_charge_point(self) -> Option<ChargePoint> {
        let commissioning_date = parse_date(self.commissioning_date.as_deref()?)?;
        let power_kw = self.power_kw.filter(|power| power.is_finite())?;

        Some(ChargePoint {
            id: self.id?.into(),
            station_id: self.station_id?.into(),
            commissioning_date,
            region: self.region?.into(),
            district: self.district?.into(),
            district_code: self.district_code?.into(),
            power_kw,
            operator_name: self.operator_name.unwrap_or_default().into(),
            use_case: self.use_case.map(Into::into),
            installed_station_power_kw: self
                .installed_station_power_kw
                .filter(|power| power.is_finite()),
            power_category: PowerCategory::classify(power_kw),
        })
    }
}

/// Parse an ISO 8601 date, optionally followed by a time of day
fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = s.parse::<NaiveDate>() {
        return Some(date);
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Check that the header of the file contains every required column
fn check_required_columns(file_path: &Path) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;
    let headers = reader.headers()?;
    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().contains(*column))
        .join(", ");
    ensure!(missing.is_empty(), "Missing required columns: {missing}");

    Ok(())
}

/// Read charging points from the specified CSV file.
///
/// Rows lacking any of the fields needed for grouping (commissioning date, region, district,
/// district code), an ID or a power rating are dropped.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// The valid charging points, in file order, or an error if the file could not be read.
pub fn read_charge_points(file_path: &Path) -> Result<Vec<ChargePoint>> {
    check_required_columns(file_path).with_context(|| input_err_msg(file_path))?;
    let rows: Vec<ChargePointRaw> = read_csv(file_path)?;
    let total = rows.len();
    let points = read_charge_points_from_iter(rows.into_iter());

    let dropped = total - points.len();
    if dropped > 0 {
        info!(
            "Dropped {dropped} of {total} rows with missing required fields from {}",
            file_path.display()
        );
    }

    Ok(points)
}

/// Validate raw rows, discarding any which are incomplete
fn read_charge_points_from_iter<I>(iter: I) -> Vec<ChargePoint>
where
    I: Iterator<Item = ChargePointRaw>,
{
    iter.filter_map(ChargePointRaw::into_charge_point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    /// A complete row for an HPC point in München
    fn raw_row() -> ChargePointRaw {
        ChargePointRaw {
            station_id: Some("1".into()),
            id: Some("10".into()),
            commissioning_date: Some("2021-03-04".into()),
            region: Some("Bayern".into()),
            district: Some("München".into()),
            district_code: Some("091620000000".into()),
            power_kw: Some(150.0),
            installed_station_power_kw: Some(300.0),
            operator_name: Some("EnBW".into()),
            use_case: Some("Öffentlich".into()),
        }
    }

    #[fixture]
    fn raw() -> ChargePointRaw {
        raw_row()
    }

    #[rstest]
    #[case("2021-03-04", Some(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()))]
    #[case("2021-03-04 00:00:00", Some(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()))]
    #[case("2021-03-04T12:30:00", Some(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()))]
    #[case("04.03.2021", None)]
    #[case("not a date", None)]
    fn test_parse_date(#[case] input: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_date(input), expected);
    }

    #[rstest]
    fn test_into_charge_point_valid(raw: ChargePointRaw) {
        let point = raw.into_charge_point().unwrap();
        assert_eq!(point.station_id, "1".into());
        assert_eq!(point.district_code, "091620000000".into());
        assert_eq!(point.year(), 2021);
        assert_eq!(point.power_category, PowerCategory::Hpc);
        assert_eq!(point.installed_station_power_kw, Some(300.0));
    }

    #[rstest]
    fn test_into_charge_point_optional_fields(raw: ChargePointRaw) {
        let raw = ChargePointRaw {
            operator_name: None,
            use_case: None,
            installed_station_power_kw: None,
            ..raw
        };
        let point = raw.into_charge_point().unwrap();
        assert_eq!(point.operator_name.as_ref(), "");
        assert_eq!(point.use_case, None);
        assert_eq!(point.installed_station_power_kw, None);
    }

    #[rstest]
    #[case::no_date(ChargePointRaw { commissioning_date: None, ..raw_row() })]
    #[case::bad_date(ChargePointRaw { commissioning_date: Some("x".into()), ..raw_row() })]
    #[case::no_region(ChargePointRaw { region: None, ..raw_row() })]
    #[case::no_district(ChargePointRaw { district: None, ..raw_row() })]
    #[case::no_code(ChargePointRaw { district_code: None, ..raw_row() })]
    #[case::no_power(ChargePointRaw { power_kw: None, ..raw_row() })]
    #[case::nan_power(ChargePointRaw { power_kw: Some(f64::NAN), ..raw_row() })]
    #[case::no_station(ChargePointRaw { station_id: None, ..raw_row() })]
    fn test_into_charge_point_dropped(#[case] raw: ChargePointRaw) {
        assert!(raw.into_charge_point().is_none());
    }

    #[test]
    fn test_read_charge_points() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("points.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(
                file,
                "ladestation_id,ladepunkt_id,Inbetriebnahmedatum,Bundesland,KreisKreisfreieStadt,ARS,LadeleistungInKW,InstallierteLadeleistungNLL,BetreiberBereinigt,LadeUseCase,Extra
1,10,2020-05-01,Bayern,München,09162,22,44,EnBW,Öffentlich,x
1,11,2020-05-01,Bayern,München,09162,22,,EnBW,,x
2,20,,Hessen,Kassel,06611,50,50,Mainova,Öffentlich,x
3,30,2022-01-15,Hessen,Kassel,06611,abc,50,Mainova,Öffentlich,x"
            )
            .unwrap();
        }

        let points = read_charge_points(&file_path).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].district_code, "09162".into());
        assert_eq!(points[1].id, "11".into());
        assert_eq!(points[1].use_case, None);
        assert_eq!(points[1].installed_station_power_kw, None);
    }

    #[test]
    fn test_read_charge_points_missing_column() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("points.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "ladestation_id,ladepunkt_id\n1,10").unwrap();
        }

        let err = read_charge_points(&file_path).unwrap_err();
        assert!(
            format!("{err:#}").contains("Missing required columns: Inbetriebnahmedatum"),
            "{err:#}"
        );
    }

    #[test]
    fn test_read_charge_points_missing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("points.csv");
        assert_error!(read_charge_points(&file_path), input_err_msg(&file_path));
    }
}
