use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

mod date;

pub use date::{date_from_file_name, date_keys};

pub const CONCENTRATION_SUFFIX: &str = "_concentration_v3.0.tif";
pub const EXTENT_SUFFIX: &str = "_extent_v3.0.tif";
pub const DEFAULT_YEARS: RangeInclusive<i32> = 1978..=2020;

#[derive(Debug)]
pub enum LookupError {
    MissingDate(NaiveDate),
    WalkError(walkdir::Error),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for LookupError {}

impl From<walkdir::Error> for LookupError {
    fn from(e: walkdir::Error) -> Self {
        LookupError::WalkError(e)
    }
}

type Table<T> = BTreeMap<String, BTreeMap<String, BTreeMap<String, T>>>;

/// Year -> month -> day -> concentration raster path.
///
/// Only dates with a raster are present, so no year or month is ever empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RasterLookup(Table<PathBuf>);

#[derive(Debug)]
pub struct ScanReport {
    pub lookup: RasterLookup,
    /// Concentration rasters whose name holds no valid date.
    pub rejected: Vec<PathBuf>,
}

impl RasterLookup {
    /// Indexes every `*_concentration_v3.0.tif` under `root`.
    ///
    /// `years` seeds the calendar skeleton. Dates found outside it are still indexed.
    pub fn scan<P: AsRef<Path>>(
        root: P,
        years: RangeInclusive<i32>,
    ) -> Result<ScanReport, LookupError> {
        let root = root.as_ref();
        let mut skeleton = skeleton(years);
        let mut rejected = vec![];
        if !root.exists() {
            warn!("No raster directory at {}, index is empty", root.display());
            return Ok(ScanReport {
                lookup: prune(skeleton),
                rejected,
            });
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || !name.ends_with(CONCENTRATION_SUFFIX) {
                continue;
            }
            let Some(date) = date_from_file_name(&name) else {
                warn!("No date in raster name {}", entry.path().display());
                rejected.push(entry.path().to_path_buf());
                continue;
            };
            let (year, month, day) = date_keys(date);
            let slot = skeleton
                .entry(year)
                .or_default()
                .entry(month)
                .or_default()
                .entry(day)
                .or_default();
            if let Some(previous) = slot.replace(entry.path().to_path_buf()) {
                warn!("Duplicate raster for {date}, replacing {}", previous.display());
            }
        }

        let lookup = prune(skeleton);
        info!(
            "Indexed {} rasters under {} ({} rejected)",
            lookup.len(),
            root.display(),
            rejected.len()
        );
        Ok(ScanReport { lookup, rejected })
    }

    pub fn get(&self, date: NaiveDate) -> Result<&Path, LookupError> {
        let (year, month, day) = date_keys(date);
        self.0
            .get(&year)
            .and_then(|months| months.get(&month))
            .and_then(|days| days.get(&day))
            .map(PathBuf::as_path)
            .ok_or(LookupError::MissingDate(date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.get(date).is_ok()
    }

    /// Number of indexed dates.
    pub fn len(&self) -> usize {
        self.0
            .values()
            .flat_map(|months| months.values())
            .map(|days| days.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn months(&self, year: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(year)
            .into_iter()
            .flat_map(|months| months.keys().map(String::as_str))
    }
}

/// Every calendar day of every year in range, with no raster yet.
fn skeleton(years: RangeInclusive<i32>) -> Table<Option<PathBuf>> {
    let mut table: Table<Option<PathBuf>> = BTreeMap::new();
    for year in years {
        let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
            continue;
        };
        for date in first.iter_days().take_while(|d| d.year() == year) {
            let (year, month, day) = date_keys(date);
            table
                .entry(year)
                .or_default()
                .entry(month)
                .or_default()
                .insert(day, None);
        }
    }
    table
}

/// Filtered copy keeping only filled days, then non-empty months, then non-empty years.
fn prune(skeleton: Table<Option<PathBuf>>) -> RasterLookup {
    let table: Table<PathBuf> = skeleton
        .into_iter()
        .filter_map(|(year, months)| {
            let months: BTreeMap<_, _> = months
                .into_iter()
                .filter_map(|(month, days)| {
                    let days: BTreeMap<_, _> = days
                        .into_iter()
                        .filter_map(|(day, path)| path.map(|path| (day, path)))
                        .collect();
                    (!days.is_empty()).then_some((month, days))
                })
                .collect();
            (!months.is_empty()).then_some((year, months))
        })
        .collect();
    debug!("Pruned lookup to {} years", table.len());
    RasterLookup(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();
        path
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn skeleton_has_every_calendar_day() {
        let table = skeleton(2020..=2021);
        assert_eq!(table["2020"]["02"].len(), 29);
        assert_eq!(table["2021"]["02"].len(), 28);
        assert_eq!(table["2021"].len(), 12);
    }

    #[test]
    fn empty_directory_gives_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let report = RasterLookup::scan(dir.path(), DEFAULT_YEARS).unwrap();
        assert!(report.lookup.is_empty());
        assert_eq!(report.lookup.len(), 0);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn missing_directory_gives_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let report = RasterLookup::scan(dir.path().join("south"), 2020..=2020).unwrap();
        assert!(report.lookup.is_empty());
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn indexes_matching_files_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "north/daily/geotiff/2019/03_Mar/N_20190305_concentration_v3.0.tif");
        touch(dir.path(), "north/daily/geotiff/2019/03_Mar/N_20190306_extent_v3.0.tif");
        let late = touch(dir.path(), "north/2023/N_20230101_concentration_v3.0.tif");

        let lookup = RasterLookup::scan(dir.path(), 2018..=2020).unwrap().lookup;
        assert_eq!(lookup.get(ymd(2019, 3, 5)).unwrap(), path.as_path());
        assert!(matches!(
            lookup.get(ymd(2019, 3, 6)),
            Err(LookupError::MissingDate(date)) if date == ymd(2019, 3, 6)
        ));
        // Outside the skeleton range but still indexed
        assert_eq!(lookup.get(ymd(2023, 1, 1)).unwrap(), late.as_path());

        assert_eq!(lookup.years().collect::<Vec<_>>(), vec!["2019", "2023"]);
        assert_eq!(lookup.months("2019").collect::<Vec<_>>(), vec!["03"]);
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn malformed_names_are_reported_not_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let bad = touch(dir.path(), "N_2019x305_concentration_v3.0.tif");
        let report = RasterLookup::scan(dir.path(), 2019..=2019).unwrap();
        assert!(report.lookup.is_empty());
        assert_eq!(report.rejected, vec![bad]);
    }

    #[test]
    fn survives_a_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "S_20000101_concentration_v3.0.tif");
        let lookup = RasterLookup::scan(dir.path(), 2000..=2000).unwrap().lookup;
        let json = serde_json::to_string(&lookup).unwrap();
        assert!(json.starts_with("{\"2000\":{\"01\":{\"01\":"));
        let restored: RasterLookup = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, lookup);
    }
}
