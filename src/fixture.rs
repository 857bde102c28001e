//! Fixtures for tests
use crate::charge_point::{ChargePoint, PowerCategory};
use chrono::NaiveDate;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A charging point in München with a 22 kW station, commissioned on 1 June of `year`
pub fn point(id: &str, station_id: &str, year: i32, power_kw: f64) -> ChargePoint {
    ChargePoint {
        id: id.into(),
        station_id: station_id.into(),
        commissioning_date: NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
        region: "Bayern".into(),
        district: "München".into(),
        district_code: "09162".into(),
        power_kw,
        operator_name: "EnBW".into(),
        use_case: Some("Öffentlich".into()),
        installed_station_power_kw: Some(22.0),
        power_category: PowerCategory::classify(power_kw),
    }
}

/// A point in Kassel run by Mainova
fn kassel_point(id: &str, station_id: &str, year: i32, power_kw: f64) -> ChargePoint {
    ChargePoint {
        region: "Hessen".into(),
        district: "Kassel".into(),
        district_code: "06611".into(),
        operator_name: "Mainova".into(),
        installed_station_power_kw: Some(power_kw),
        ..point(id, station_id, year, power_kw)
    }
}

#[fixture]
pub fn charge_points() -> Vec<ChargePoint> {
    vec![
        point("p1", "s1", 2020, 11.0),
        point("p2", "s1", 2020, 11.0),
        ChargePoint {
            operator_name: "Ionity".into(),
            installed_station_power_kw: Some(300.0),
            ..point("p3", "s2", 2021, 150.0)
        },
        kassel_point("p4", "s3", 2022, 50.0),
        kassel_point("p5", "s3", 2022, 50.0),
        ChargePoint {
            use_case: None,
            ..kassel_point("p6", "s4", 2020, 350.0)
        },
    ]
}
