//! Charging points are the individual sockets at which a single vehicle can charge.
//!
//! Each charging point belongs to exactly one charging station, and the station carries an
//! installed power rating which is shared by all of its points.
use crate::id::{ChargePointID, DistrictCode, StationID};
use chrono::{Datelike, NaiveDate};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::rc::Rc;
use strum::EnumIter;

/// Points with at least this power (kW) are high-power chargers
pub const HPC_THRESHOLD_KW: f64 = 150.0;

/// Points with more than this power (kW) are fast chargers
pub const FAST_THRESHOLD_KW: f64 = 22.0;

/// The power band a charging point falls into.
///
/// Variants are declared from the highest band downwards; the derived ordering is used when
/// sorting grouped output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum PowerCategory {
    /// High-power charging (>= 150 kW)
    #[string = "HPC"]
    Hpc,
    /// Fast charging (> 22 kW and < 150 kW)
    #[string = "Fast"]
    Fast,
    /// Normal charging (<= 22 kW)
    #[string = "Normal"]
    Normal,
}

impl PowerCategory {
    /// Classify a charging power rating (in kW).
    ///
    /// The HPC threshold is checked first, so a value on the boundary lands in the higher band.
    /// Zero, negative and NaN values are all treated as [`PowerCategory::Normal`].
    pub fn classify(power_kw: f64) -> Self {
        if power_kw >= HPC_THRESHOLD_KW {
            Self::Hpc
        } else if power_kw > FAST_THRESHOLD_KW {
            Self::Fast
        } else {
            Self::Normal
        }
    }
}

/// A single charging point, validated at ingestion time
#[derive(Debug, Clone, PartialEq)]
pub struct ChargePoint {
    /// Unique identifier for the point
    pub id: ChargePointID,
    /// The station this point belongs to
    pub station_id: StationID,
    /// When the point went into operation
    pub commissioning_date: NaiveDate,
    /// Federal state (Bundesland)
    pub region: Rc<str>,
    /// District or independent city name
    pub district: Rc<str>,
    /// Official regional code of the district
    pub district_code: DistrictCode,
    /// Charging power of this point (kW)
    pub power_kw: f64,
    /// Cleaned operator name
    pub operator_name: Rc<str>,
    /// Use case tag, if any
    pub use_case: Option<Rc<str>>,
    /// Installed power of the parent station (kW). Only meaningful once per station.
    pub installed_station_power_kw: Option<f64>,
    /// Derived from `power_kw`
    pub power_category: PowerCategory,
}

impl ChargePoint {
    /// The year in which the point was commissioned
    pub fn year(&self) -> i32 {
        self.commissioning_date.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case(350.0, PowerCategory::Hpc)]
    #[case(150.0, PowerCategory::Hpc)]
    #[case(149.9, PowerCategory::Fast)]
    #[case(50.0, PowerCategory::Fast)]
    #[case(22.1, PowerCategory::Fast)]
    #[case(22.0, PowerCategory::Normal)]
    #[case(11.0, PowerCategory::Normal)]
    #[case(0.0, PowerCategory::Normal)]
    #[case(-5.0, PowerCategory::Normal)]
    #[case(f64::NAN, PowerCategory::Normal)]
    fn test_classify(#[case] power_kw: f64, #[case] expected: PowerCategory) {
        assert_eq!(PowerCategory::classify(power_kw), expected);
    }

    #[test]
    fn test_category_order() {
        let categories: Vec<_> = PowerCategory::iter().collect();
        assert_eq!(
            categories,
            [
                PowerCategory::Hpc,
                PowerCategory::Fast,
                PowerCategory::Normal
            ]
        );
        assert_eq!(PowerCategory::Hpc.to_string(), "HPC");
    }
}
