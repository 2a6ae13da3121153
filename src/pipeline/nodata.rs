use crate::encode::Encoder;
use crate::error::CoastIceResult;
use crate::geotiff::{Compression, GeoTiff};
use crate::lookup::{date_from_file_name, LookupError, CONCENTRATION_SUFFIX, EXTENT_SUFFIX};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Missing, land, coast and pole hole classes of concentration rasters.
pub const CONCENTRATION_NODATA: [f64; 4] = [2550.0, 2540.0, 2530.0, 2510.0];
/// Missing, land, coast and pole hole classes of extent rasters.
pub const EXTENT_NODATA: [f64; 4] = [255.0, 254.0, 253.0, 210.0];

#[derive(Clone, Debug)]
pub struct RemapOptions {
    pub sea_ice_dir: PathBuf,
    pub last_update: NaiveDate,
    pub out_dir: PathBuf,
    pub out_nodata: f64,
    pub concentration_values: Vec<f64>,
    pub extent_values: Vec<f64>,
    pub compression: Compression,
}

impl RemapOptions {
    pub fn new(sea_ice_dir: PathBuf, last_update: NaiveDate, out_dir: PathBuf) -> Self {
        Self {
            sea_ice_dir,
            last_update,
            out_dir,
            out_nodata: -9999.0,
            concentration_values: CONCENTRATION_NODATA.to_vec(),
            extent_values: EXTENT_NODATA.to_vec(),
            compression: Compression::Deflate,
        }
    }

    pub fn with_out_nodata(mut self, nodata: f64) -> Self {
        self.out_nodata = nodata;
        self
    }

    pub fn with_concentration_values(mut self, values: &[f64]) -> Self {
        self.concentration_values = values.to_vec();
        self
    }

    pub fn with_extent_values(mut self, values: &[f64]) -> Self {
        self.extent_values = values.to_vec();
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Class values to remap for a raster file name, `None` for other files.
    pub fn values_for(&self, file_name: &str) -> Option<&[f64]> {
        if file_name.ends_with(CONCENTRATION_SUFFIX) {
            Some(&self.concentration_values)
        } else if file_name.ends_with(EXTENT_SUFFIX) {
            Some(&self.extent_values)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct RemapReport {
    pub written: Vec<PathBuf>,
    /// Rasters at or before the last update.
    pub up_to_date: usize,
    pub rejected: Vec<PathBuf>,
}

/// Rewrites `src` with every cell in `targets` set to `out_nodata`, declared as the output's
/// no data value. Georeferencing is kept and unsigned types widen to their signed counterpart.
pub fn resample_nodata(
    src: &Path,
    targets: &[f64],
    out_path: &Path,
    out_nodata: f64,
    compression: Compression,
) -> CoastIceResult<()> {
    let tif = GeoTiff::open_path(src)?;
    let data_type = tif.data_type().signed();
    let raster = tif.raster.replace_values(targets, out_nodata, data_type)?;
    Encoder::new(raster)
        .with_geo_tags(tif.geo_tags)
        .with_nodata(out_nodata)
        .with_compression(compression)
        .encode_to_path(out_path)?;
    debug!("Resampled {} to {}", src.display(), out_path.display());
    Ok(())
}

/// Remaps every concentration and extent raster dated after `last_update`, mirroring the
/// directory layout under `out_dir`.
pub fn resample_loop(options: &RemapOptions) -> CoastIceResult<RemapReport> {
    let mut report = RemapReport::default();
    for entry in WalkDir::new(&options.sea_ice_dir).sort_by_file_name() {
        let entry = entry.map_err(LookupError::from)?;
        let name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(targets) = options.values_for(&name) else {
            continue;
        };
        let Some(date) = date_from_file_name(&name) else {
            warn!("No date in raster name {}", entry.path().display());
            report.rejected.push(entry.path().to_path_buf());
            continue;
        };
        if date <= options.last_update {
            report.up_to_date += 1;
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&options.sea_ice_dir)
            .unwrap_or(entry.path());
        let out_path = options.out_dir.join(relative);
        resample_nodata(
            entry.path(),
            targets,
            &out_path,
            options.out_nodata,
            options.compression,
        )?;
        report.written.push(out_path);
        if report.written.len() % 100 == 0 {
            info!("Resampled {} rasters...", report.written.len());
        }
    }
    info!(
        "Resampled {} rasters after {} ({} up to date, {} rejected)",
        report.written.len(),
        options.last_update,
        report.up_to_date,
        report.rejected.len()
    );
    Ok(report)
}
