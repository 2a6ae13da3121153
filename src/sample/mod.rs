use crate::error::CoastIceResult;
use crate::geotiff::GeoTiff;
use crate::lookup::RasterLookup;
use crate::projection::{Hemisphere, PolarProjector};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

mod window;

pub use window::{
    adaptive_window, concentration_from_cells, ConcentrationGrid, WindowSample, INITIAL_WINDOW,
    MAX_WINDOW, MISSING,
};

/// Opens concentration rasters by path.
pub trait RasterSource {
    type Grid: ConcentrationGrid;

    fn open(&mut self, path: &Path) -> CoastIceResult<&Self::Grid>;
}

/// Reads GeoTIFFs from disk, keeping the last one decoded since footprints arrive in date runs.
#[derive(Debug, Default)]
pub struct GeoTiffSource {
    current: Option<(PathBuf, GeoTiff)>,
}

impl GeoTiffSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RasterSource for GeoTiffSource {
    type Grid = GeoTiff;

    fn open(&mut self, path: &Path) -> CoastIceResult<&GeoTiff> {
        let entry = match self.current.take() {
            Some((current, tif)) if current == path => (current, tif),
            _ => {
                let tif = GeoTiff::open_path(path)?;
                debug!("Loaded {tif}");
                (path.to_path_buf(), tif)
            }
        };
        let (_, tif) = self.current.insert(entry);
        Ok(tif)
    }
}

/// Samples daily sea ice concentration at geographic points.
pub struct SeaIceSampler<S: RasterSource> {
    arctic: RasterLookup,
    antarctic: RasterLookup,
    source: S,
    projector: PolarProjector,
}

impl<S: RasterSource> SeaIceSampler<S> {
    pub fn new(arctic: RasterLookup, antarctic: RasterLookup, source: S) -> CoastIceResult<Self> {
        Ok(Self {
            arctic,
            antarctic,
            source,
            projector: PolarProjector::new()?,
        })
    }

    pub fn lookup(&self, hemisphere: Hemisphere) -> &RasterLookup {
        match hemisphere {
            Hemisphere::Arctic => &self.arctic,
            Hemisphere::Antarctic => &self.antarctic,
        }
    }

    /// Concentration in percent at WGS84 `(lon, lat)` on `date`, 0 outside the polar regions.
    ///
    /// Fails with `LookupError::MissingDate` when no raster covers the date.
    pub fn sample(&mut self, lon: f64, lat: f64, date: NaiveDate) -> CoastIceResult<i32> {
        let Some(hemisphere) = Hemisphere::from_latitude(lat) else {
            return Ok(0);
        };
        let (x, y) = self.projector.project(lon, lat, hemisphere)?;
        let path = self.lookup(hemisphere).get(date)?.to_path_buf();
        let grid = self.source.open(&path)?;
        let sample = adaptive_window(grid, x, y);
        debug!(
            "{hemisphere} ({lon}, {lat}) on {date}: {}% after {} windows",
            sample.concentration, sample.attempts
        );
        Ok(sample.concentration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoastIceError;
    use crate::lookup::LookupError;
    use std::collections::HashMap;

    struct Flat(f64);

    impl ConcentrationGrid for Flat {
        fn cell_size(&self) -> (f64, f64) {
            (25000.0, 25000.0)
        }

        fn read_window(&self, _: (f64, f64), ncols: usize, nrows: usize) -> Vec<Option<f64>> {
            vec![Some(self.0); ncols * nrows]
        }
    }

    #[derive(Default)]
    struct Grids {
        grids: HashMap<PathBuf, Flat>,
        opened: Vec<PathBuf>,
    }

    impl RasterSource for Grids {
        type Grid = Flat;

        fn open(&mut self, path: &Path) -> CoastIceResult<&Flat> {
            self.opened.push(path.to_path_buf());
            Ok(&self.grids[path])
        }
    }

    fn lookup_with(dir: &Path, name: &str) -> RasterLookup {
        std::fs::write(dir.join(name), b"").unwrap();
        RasterLookup::scan(dir, 2020..=2020).unwrap().lookup
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn non_polar_points_are_zero_without_lookups() {
        let mut sampler =
            SeaIceSampler::new(RasterLookup::default(), RasterLookup::default(), Grids::default())
                .unwrap();
        for lat in [-49.99, 0.0, 50.0, -50.0] {
            assert_eq!(sampler.sample(12.0, lat, ymd(1900, 1, 1)).unwrap(), 0);
        }
        assert!(sampler.source.opened.is_empty());
    }

    #[test]
    fn picks_the_hemisphere_raster_for_the_date() {
        let north = tempfile::tempdir().unwrap();
        let south = tempfile::tempdir().unwrap();
        let arctic = lookup_with(north.path(), "N_20200115_concentration_v3.0.tif");
        let antarctic = lookup_with(south.path(), "S_20200115_concentration_v3.0.tif");
        let mut grids = Grids::default();
        grids.grids.insert(
            arctic.get(ymd(2020, 1, 15)).unwrap().to_path_buf(),
            Flat(870.0),
        );
        grids.grids.insert(
            antarctic.get(ymd(2020, 1, 15)).unwrap().to_path_buf(),
            Flat(125.0),
        );

        let mut sampler = SeaIceSampler::new(arctic, antarctic, grids).unwrap();
        assert_eq!(sampler.sample(-60.0, 75.0, ymd(2020, 1, 15)).unwrap(), 87);
        assert_eq!(sampler.sample(30.0, -65.0, ymd(2020, 1, 15)).unwrap(), 12);
    }

    #[test]
    fn missing_date_surfaces_to_caller() {
        let mut sampler =
            SeaIceSampler::new(RasterLookup::default(), RasterLookup::default(), Grids::default())
                .unwrap();
        let result = sampler.sample(-60.0, 75.0, ymd(2020, 2, 1));
        assert!(matches!(
            result,
            Err(CoastIceError::LookupError(LookupError::MissingDate(_)))
        ));
    }
}
