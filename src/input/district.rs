//! Code for reading the optional district table used to label the choropleth map.
use super::*;
use crate::id::DistrictCode;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;
use std::path::Path;

/// Display names of districts, keyed by district code
pub type DistrictMap = IndexMap<DistrictCode, String>;

#[derive(Debug, Deserialize, PartialEq)]
struct DistrictRaw {
    #[serde(rename = "AGS")]
    code: String,
    #[serde(rename = "GEN")]
    name: String,
}

/// Read the district table from the specified CSV file, if it exists.
///
/// The map is optional: if the file is missing a warning is logged and `None` is returned, so
/// that non-geographic views remain available.
///
/// # Arguments
///
/// * `file_path` - Path to a CSV file with `AGS` (district code) and `GEN` (name) columns
pub fn read_districts(file_path: &Path) -> Result<Option<DistrictMap>> {
    if !file_path.is_file() {
        warn!(
            "District file not found at {}. The map will not be available.",
            file_path.display()
        );
        return Ok(None);
    }

    let rows = read_csv(file_path)?;
    let districts =
        read_districts_from_iter(rows.into_iter()).with_context(|| input_err_msg(file_path))?;

    Ok(Some(districts))
}

fn read_districts_from_iter<I>(iter: I) -> Result<DistrictMap>
where
    I: Iterator<Item = DistrictRaw>,
{
    let mut districts = DistrictMap::new();
    for row in iter {
        ensure!(!row.code.is_empty(), "Empty district code");
        let code = DistrictCode::from(row.code);
        ensure!(
            districts.insert(code.clone(), row.name).is_none(),
            "Duplicate district code: {code}"
        );
    }

    Ok(districts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_districts() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("districts.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "AGS,GEN,BEZ\n01001,Flensburg,Kreisfreie Stadt\n09162,München,Kreisfreie Stadt").unwrap();
        }

        let districts = read_districts(&file_path).unwrap().unwrap();
        assert_eq!(
            districts,
            DistrictMap::from([
                ("01001".into(), "Flensburg".to_string()),
                ("09162".into(), "München".to_string()),
            ])
        );
    }

    #[test]
    fn test_read_districts_missing_file() {
        let dir = tempdir().unwrap();
        assert!(
            read_districts(&dir.path().join("districts.csv"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_read_districts_from_iter_duplicate() {
        let rows = [
            DistrictRaw {
                code: "01001".into(),
                name: "Flensburg".into(),
            },
            DistrictRaw {
                code: "01001".into(),
                name: "Kiel".into(),
            },
        ];
        assert_error!(
            read_districts_from_iter(rows.into_iter()),
            "Duplicate district code: 01001"
        );
    }
}
