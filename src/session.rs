//! A session ties together the dataset, the aggregate cache and the user's current selections.
//!
//! Presentation layers (with or without a map, in any language) drive the pipeline through this
//! type rather than filtering and aggregating the data themselves.
use crate::dataset::{Dataset, DatasetStore};
use crate::filter::{FilterCriteria, FilterOptions};
use crate::pipeline::{AggregateCache, AggregateOptions, Aggregates};
use anyhow::Result;
use std::path::PathBuf;
use std::rc::Rc;

/// An interactive session over one dataset
pub struct Session {
    store: DatasetStore,
    cache: AggregateCache,
    options: AggregateOptions,
}

impl Session {
    /// Open a session, loading the dataset immediately so that a missing input fails early
    pub fn open(
        data_path: PathBuf,
        districts_path: Option<PathBuf>,
        options: AggregateOptions,
    ) -> Result<Self> {
        let mut store = DatasetStore::new(data_path, districts_path);
        store.get()?;

        Ok(Self {
            store,
            cache: AggregateCache::new(),
            options,
        })
    }

    /// The current dataset
    pub fn dataset(&mut self) -> Result<Rc<Dataset>> {
        let dataset = self.store.get()?;
        self.cache.retain_version(dataset.version);

        Ok(dataset)
    }

    /// The options a user can choose from, derived from the full dataset
    pub fn filter_options(&mut self) -> Result<FilterOptions> {
        let dataset = self.dataset()?;
        Ok(FilterOptions::from_records(&dataset.charge_points))
    }

    /// Aggregates for the given selection. Repeated calls with equal criteria are served from
    /// the cache.
    pub fn aggregates(&mut self, criteria: &FilterCriteria) -> Result<Rc<Aggregates>> {
        let dataset = self.dataset()?;
        Ok(self.cache.get_or_compute(
            &dataset.charge_points,
            dataset.districts.as_ref(),
            dataset.version,
            criteria,
            &self.options,
        ))
    }

    /// Force the dataset to be reloaded on next use
    pub fn reload(&mut self) {
        self.store.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    fn create_data_file(dir_path: &Path) -> PathBuf {
        let file_path = dir_path.join("points.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "ladestation_id,ladepunkt_id,Inbetriebnahmedatum,Bundesland,KreisKreisfreieStadt,ARS,LadeleistungInKW,InstallierteLadeleistungNLL,BetreiberBereinigt,LadeUseCase
1,10,2020-01-01,Bayern,München,09162,11,22,EnBW,Öffentlich
1,11,2020-01-01,Bayern,München,09162,11,22,EnBW,Öffentlich
2,20,2021-07-01,Hessen,Kassel,06611,300,300,Ionity,Öffentlich"
        )
        .unwrap();
        file_path
    }

    #[test]
    fn test_session_aggregates() {
        let dir = tempdir().unwrap();
        let mut session =
            Session::open(create_data_file(dir.path()), None, AggregateOptions::default())
                .unwrap();

        let options = session.filter_options().unwrap();
        assert_eq!(options.year_bounds, Some((2020, 2021)));

        let all = session.aggregates(&options.all_selected()).unwrap();
        assert_eq!(all.kpis.station_count, 2);
        assert_eq!(all.kpis.point_count, 3);

        let criteria = FilterCriteria {
            regions: ["Hessen".to_string()].into(),
            ..Default::default()
        };
        let hessen = session.aggregates(&criteria).unwrap();
        assert_eq!(hessen.kpis.point_count, 1);
        assert!(Rc::ptr_eq(&hessen, &session.aggregates(&criteria).unwrap()));
    }

    #[test]
    fn test_session_reload_clears_cache() {
        let dir = tempdir().unwrap();
        let mut session =
            Session::open(create_data_file(dir.path()), None, AggregateOptions::default())
                .unwrap();
        let criteria = FilterCriteria::default();
        let before = session.aggregates(&criteria).unwrap();

        session.reload();
        let after = session.aggregates(&criteria).unwrap();
        assert!(!Rc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_session_open_missing_file() {
        let dir = tempdir().unwrap();
        assert!(
            Session::open(
                dir.path().join("points.csv"),
                None,
                AggregateOptions::default()
            )
            .is_err()
        );
    }
}
