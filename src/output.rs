//! The module responsible for writing aggregates to disk as CSV files.
use crate::id::DistrictCode;
use crate::pipeline::Aggregates;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which dataset-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "chargemap_results";

/// The output file name for KPIs
pub const KPIS_FILE_NAME: &str = "kpis.csv";

/// The output file name for points commissioned per year
pub const POINTS_PER_YEAR_FILE_NAME: &str = "points_per_year.csv";

/// The output file name for stations commissioned per year
pub const STATIONS_PER_YEAR_FILE_NAME: &str = "stations_per_year.csv";

/// The output file name for points per year and power category
pub const POINTS_BY_CATEGORY_FILE_NAME: &str = "points_by_year_and_category.csv";

/// The output file name for cumulative points per year and power category
pub const CUMULATIVE_POINTS_BY_CATEGORY_FILE_NAME: &str =
    "cumulative_points_by_year_and_category.csv";

/// The output file name for the running total of points per month
pub const CUMULATIVE_POINTS_BY_MONTH_FILE_NAME: &str = "cumulative_points_by_month.csv";

/// The output file name for the running total of stations per month
pub const CUMULATIVE_STATIONS_BY_MONTH_FILE_NAME: &str = "cumulative_stations_by_month.csv";

/// The output file name for points per power category
pub const CATEGORY_SHARES_FILE_NAME: &str = "category_shares.csv";

/// The output file name for the operator ranking
pub const TOP_OPERATORS_FILE_NAME: &str = "top_operators.csv";

/// The output file name for point counts per district
pub const DISTRICTS_FILE_NAME: &str = "districts.csv";

/// The output file name for map bin edges
pub const BIN_EDGES_FILE_NAME: &str = "bin_edges.csv";

/// Get the default output folder for the specified input file
pub fn get_output_dir(data_path: &Path) -> Result<PathBuf> {
    let data_name = data_path
        .file_stem()
        .context("Input file has no name")?
        .to_str()
        .context("Invalid chars in input file name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, data_name].iter().collect())
}

/// Create a new output directory.
///
/// If the directory already exists and is not empty, it is only reused if `allow_overwrite` is
/// set.
///
/// # Returns
///
/// True if existing output files will be overwritten, false otherwise.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// A row of the district output file
#[derive(Serialize)]
struct DistrictRow<'a> {
    code: &'a DistrictCode,
    name: Option<&'a str>,
    count: usize,
}

/// A row of the bin edges output file
#[derive(Serialize)]
struct BinEdgeRow {
    edge: f64,
}

/// Write rows to a new CSV file in `output_dir`
fn write_rows<T, I>(output_dir: &Path, file_name: &str, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file_path = output_dir.join(file_name);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write all aggregates to CSV files in `output_dir`.
///
/// If a district table was available, every district is written with its name (including those
/// without points); otherwise only districts with points are written.
pub fn write_aggregates(output_dir: &Path, aggregates: &Aggregates) -> Result<()> {
    write_rows(output_dir, KPIS_FILE_NAME, [&aggregates.kpis])?;
    write_rows(
        output_dir,
        POINTS_PER_YEAR_FILE_NAME,
        &aggregates.points_per_year,
    )?;
    write_rows(
        output_dir,
        STATIONS_PER_YEAR_FILE_NAME,
        &aggregates.stations_per_year,
    )?;
    write_rows(
        output_dir,
        POINTS_BY_CATEGORY_FILE_NAME,
        &aggregates.points_by_year_and_category,
    )?;
    write_rows(
        output_dir,
        CUMULATIVE_POINTS_BY_CATEGORY_FILE_NAME,
        &aggregates.cumulative_points_by_year_and_category,
    )?;
    write_rows(
        output_dir,
        CUMULATIVE_POINTS_BY_MONTH_FILE_NAME,
        &aggregates.cumulative_points_by_month,
    )?;
    write_rows(
        output_dir,
        CUMULATIVE_STATIONS_BY_MONTH_FILE_NAME,
        &aggregates.cumulative_stations_by_month,
    )?;
    write_rows(
        output_dir,
        CATEGORY_SHARES_FILE_NAME,
        &aggregates.category_shares,
    )?;
    write_rows(output_dir, TOP_OPERATORS_FILE_NAME, &aggregates.top_operators)?;

    match &aggregates.district_values {
        Some(values) => write_rows(
            output_dir,
            DISTRICTS_FILE_NAME,
            values.iter().map(|value| DistrictRow {
                code: &value.code,
                name: Some(value.name.as_str()),
                count: value.count,
            }),
        )?,
        None => write_rows(
            output_dir,
            DISTRICTS_FILE_NAME,
            aggregates
                .district_counts
                .iter()
                .map(|(code, &count)| DistrictRow {
                    code,
                    name: None,
                    count,
                }),
        )?,
    }

    write_rows(
        output_dir,
        BIN_EDGES_FILE_NAME,
        aggregates.bin_edges.iter().map(|&edge| BinEdgeRow { edge }),
    )
}
