//! The in-memory dataset and the loader which memoises it.
use crate::charge_point::ChargePoint;
use crate::input::{DistrictMap, read_charge_points, read_districts};
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

/// The base data for a session. Never modified once loaded.
#[derive(Debug)]
pub struct Dataset {
    /// Identifies this load of the data; increases each time the data are reloaded
    pub version: u64,
    /// All valid charging points, in file order
    pub charge_points: Vec<ChargePoint>,
    /// District names for the map, if a district file was supplied and found
    pub districts: Option<DistrictMap>,
}

impl Dataset {
    /// Load a dataset from disk
    ///
    /// # Arguments
    ///
    /// * `data_path` - The charging point CSV file
    /// * `districts_path` - The optional district CSV file
    /// * `version` - Version number to give the dataset
    pub fn load(data_path: &Path, districts_path: Option<&Path>, version: u64) -> Result<Self> {
        let charge_points =
            read_charge_points(data_path).context("Failed to load charging point data.")?;
        info!(
            "Loaded {} charging points from {}",
            charge_points.len(),
            data_path.display()
        );

        let districts = match districts_path {
            Some(path) => read_districts(path).context("Failed to load district data.")?,
            None => None,
        };

        Ok(Self {
            version,
            charge_points,
            districts,
        })
    }
}

/// Get the last modification time of a file, if available
fn modified_time(file_path: &Path) -> Option<SystemTime> {
    fs::metadata(file_path).and_then(|m| m.modified()).ok()
}

/// Modification times of the charging point file and the district file, respectively
type InputModifiedTimes = (Option<SystemTime>, Option<SystemTime>);

/// Loads the dataset once and hands out shared, immutable handles to it.
///
/// The data are reloaded when [`DatasetStore::invalidate`] has been called or when the
/// modification time of either the charging point file or the district file changes. A district
/// file which appears or disappears also counts as a change.
pub struct DatasetStore {
    data_path: PathBuf,
    districts_path: Option<PathBuf>,
    current: Option<Rc<Dataset>>,
    loaded_modified: Option<InputModifiedTimes>,
    next_version: u64,
}

impl DatasetStore {
    /// Create a store for the given input files. Nothing is read until [`DatasetStore::get`].
    pub fn new(data_path: PathBuf, districts_path: Option<PathBuf>) -> Self {
        Self {
            data_path,
            districts_path,
            current: None,
            loaded_modified: None,
            next_version: 1,
        }
    }

    /// Modification times of the input files as they are on disk now
    fn input_modified_times(&self) -> InputModifiedTimes {
        (
            modified_time(&self.data_path),
            self.districts_path.as_deref().and_then(modified_time),
        )
    }

    /// Get the current dataset, loading it if necessary
    pub fn get(&mut self) -> Result<Rc<Dataset>> {
        let modified = self.input_modified_times();
        if let Some(dataset) = &self.current {
            if self.loaded_modified == Some(modified) {
                return Ok(Rc::clone(dataset));
            }

            info!("Input files have changed; reloading");
        }

        let dataset = Rc::new(Dataset::load(
            &self.data_path,
            self.districts_path.as_deref(),
            self.next_version,
        )?);
        self.next_version += 1;
        self.loaded_modified = Some(modified);
        self.current = Some(Rc::clone(&dataset));

        Ok(dataset)
    }

    /// Discard the loaded dataset so that the next call to [`DatasetStore::get`] reloads it
    pub fn invalidate(&mut self) {
        self.current = None;
        self.loaded_modified = None;
    }
}
