use crate::lookup::date_from_file_name;
use crate::projection::Hemisphere;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

#[cfg(feature = "ftp")]
mod ftp;

#[cfg(feature = "ftp")]
pub use ftp::FtpSource;

pub const NSIDC_HOST: &str = "sidads.colorado.edu";
pub const NSIDC_ROOT: &str = "/DATASETS/NOAA/G02135/";

#[derive(Debug)]
pub enum SyncError {
    #[cfg(feature = "ftp")]
    FtpError(suppaftp::FtpError),
    Remote(String),
    IoError(io::Error),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for SyncError {}

impl From<io::Error> for SyncError {
    fn from(e: io::Error) -> Self {
        SyncError::IoError(e)
    }
}

#[cfg(feature = "ftp")]
impl From<suppaftp::FtpError> for SyncError {
    fn from(e: suppaftp::FtpError) -> Self {
        SyncError::FtpError(e)
    }
}

/// Directory listing and binary retrieval on a remote file tree.
pub trait RemoteSource {
    /// Entries of a remote directory. Either bare names or full paths.
    fn list(&mut self, path: &str) -> Result<Vec<String>, SyncError>;
    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, SyncError>;
}

#[derive(Clone, Debug)]
pub struct SyncOptions {
    pub last_update: NaiveDate,
    pub out_dir: PathBuf,
    pub north: bool,
    pub south: bool,
    pub root: String,
}

impl SyncOptions {
    pub fn new(last_update: NaiveDate, out_dir: PathBuf) -> Self {
        Self {
            last_update,
            out_dir,
            north: true,
            south: true,
            root: NSIDC_ROOT.to_string(),
        }
    }

    pub fn with_north(mut self, north: bool) -> Self {
        self.north = north;
        self
    }

    pub fn with_south(mut self, south: bool) -> Self {
        self.south = south;
        self
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.root = root.to_string();
        self
    }

    fn hemispheres(&self) -> Vec<Hemisphere> {
        Hemisphere::all()
            .into_iter()
            .filter(|h| match h {
                Hemisphere::Arctic => self.north,
                Hemisphere::Antarctic => self.south,
            })
            .collect()
    }
}

fn base_name(entry: &str) -> &str {
    entry.trim_end_matches('/').rsplit('/').next().unwrap_or(entry)
}

fn entries<R: RemoteSource>(remote: &mut R, path: &str) -> Result<Vec<String>, SyncError> {
    Ok(remote
        .list(path)?
        .iter()
        .map(|entry| base_name(entry).to_string())
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .collect())
}

/// Downloads daily rasters dated after `last_update`, recreating the remote
/// `<pole>/daily/geotiff/<year>/<MM_Mon>/` layout under `out_dir`.
///
/// Stops at the first failed transfer.
pub fn update_rasters<R: RemoteSource>(
    remote: &mut R,
    options: &SyncOptions,
) -> Result<Vec<PathBuf>, SyncError> {
    let cutoff = options.last_update;
    let mut downloaded = vec![];
    for hemisphere in options.hemispheres() {
        let relative = format!("{}/daily/geotiff", hemisphere.nsidc_prefix());
        let base = format!("{}/{relative}", options.root.trim_end_matches('/'));
        info!("Checking {base} for rasters after {cutoff}");

        for year_dir in entries(remote, &base)? {
            let Ok(year) = year_dir.parse::<i32>() else {
                continue;
            };
            if year < cutoff.year() {
                continue;
            }
            for month_dir in entries(remote, &format!("{base}/{year_dir}"))? {
                let Some(month) = month_dir.get(..2).and_then(|m| m.parse::<u32>().ok()) else {
                    continue;
                };
                if (year, month) < (cutoff.year(), cutoff.month()) {
                    continue;
                }
                let remote_dir = format!("{base}/{year_dir}/{month_dir}");
                for file in entries(remote, &remote_dir)? {
                    match date_from_file_name(&file) {
                        Some(date) if date > cutoff => {}
                        _ => continue,
                    }
                    let local_dir = options
                        .out_dir
                        .join(&relative)
                        .join(&year_dir)
                        .join(&month_dir);
                    let local = local_dir.join(&file);
                    debug!("Getting {remote_dir}/{file}");
                    let bytes = remote.retrieve(&format!("{remote_dir}/{file}"))?;
                    fs::create_dir_all(&local_dir)?;
                    fs::write(&local, bytes)?;
                    downloaded.push(local);
                }
            }
        }
    }
    info!("Downloaded {} files", downloaded.len());
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Mirror {
        dirs: HashMap<String, Vec<String>>,
        files: HashMap<String, Vec<u8>>,
        retrieved: Vec<String>,
    }

    impl Mirror {
        fn add(&mut self, path: &str) {
            let mut parent = String::new();
            for part in path.trim_start_matches('/').split('/') {
                let child = format!("{parent}/{part}");
                let listing = self.dirs.entry(parent.clone()).or_default();
                if !listing.contains(&child) {
                    listing.push(child.clone());
                }
                parent = child;
            }
            self.files.insert(path.to_string(), path.as_bytes().to_vec());
        }
    }

    impl RemoteSource for Mirror {
        fn list(&mut self, path: &str) -> Result<Vec<String>, SyncError> {
            self.dirs
                .get(path)
                .cloned()
                .ok_or_else(|| SyncError::Remote(format!("550 {path}")))
        }

        fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, SyncError> {
            self.retrieved.push(path.to_string());
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| SyncError::Remote(format!("550 {path}")))
        }
    }

    const NORTH: &str = "/DATASETS/NOAA/G02135/north/daily/geotiff";

    fn mirror() -> Mirror {
        let mut mirror = Mirror::default();
        for file in [
            "2018/12_Dec/N_20181231_concentration_v3.0.tif",
            "2019/07_Jul/N_20190730_concentration_v3.0.tif",
            "2019/07_Jul/N_20190731_concentration_v3.0.tif",
            "2019/08_Aug/N_20190801_concentration_v3.0.tif",
            "2019/08_Aug/N_20190801_extent_v3.0.tif",
            "2020/01_Jan/N_20200101_concentration_v3.0.tif",
        ] {
            mirror.add(&format!("{NORTH}/{file}"));
        }
        mirror.add("/DATASETS/NOAA/G02135/south/daily/geotiff/2020/01_Jan/S_20200101_extent_v3.0.tif");
        mirror
    }

    #[test]
    fn downloads_only_files_after_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = mirror();
        let options = SyncOptions::new(
            NaiveDate::from_ymd_opt(2019, 7, 31).unwrap(),
            dir.path().to_path_buf(),
        )
        .with_south(false);

        let downloaded = update_rasters(&mut remote, &options).unwrap();
        assert_eq!(
            remote.retrieved,
            vec![
                format!("{NORTH}/2019/08_Aug/N_20190801_concentration_v3.0.tif"),
                format!("{NORTH}/2019/08_Aug/N_20190801_extent_v3.0.tif"),
                format!("{NORTH}/2020/01_Jan/N_20200101_concentration_v3.0.tif"),
            ]
        );
        let local = dir
            .path()
            .join("north/daily/geotiff/2020/01_Jan/N_20200101_concentration_v3.0.tif");
        assert_eq!(downloaded.len(), 3);
        assert!(downloaded.contains(&local));
        assert_eq!(
            fs::read(&local).unwrap(),
            format!("{NORTH}/2020/01_Jan/N_20200101_concentration_v3.0.tif").into_bytes()
        );
    }

    #[test]
    fn both_hemispheres_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = mirror();
        let options = SyncOptions::new(
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
            dir.path().to_path_buf(),
        );
        let downloaded = update_rasters(&mut remote, &options).unwrap();
        assert_eq!(downloaded.len(), 2);
        assert!(dir
            .path()
            .join("south/daily/geotiff/2020/01_Jan/S_20200101_extent_v3.0.tif")
            .exists());
    }

    #[test]
    fn failed_listing_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = Mirror::default();
        let options = SyncOptions::new(
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
            dir.path().to_path_buf(),
        );
        assert!(matches!(
            update_rasters(&mut remote, &options),
            Err(SyncError::Remote(_))
        ));
    }

    #[test]
    fn listing_entries_are_reduced_to_names() {
        assert_eq!(base_name("/a/b/2019"), "2019");
        assert_eq!(base_name("2019/"), "2019");
        assert_eq!(base_name("N_1.tif"), "N_1.tif");
    }
}
