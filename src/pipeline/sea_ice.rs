use super::{layer_path, Outcome, PROGRESS_INTERVAL};
use crate::cache::CacheStore;
use crate::error::CoastIceResult;
use crate::footprint::{acquisition_date, centroid, FootprintLayer, Source, CONCENTRATION_FIELD};
use crate::lookup::{RasterLookup, DEFAULT_YEARS};
use crate::projection::Hemisphere;
use crate::sample::{RasterSource, SeaIceSampler};
use geojson::JsonValue;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct SeaIceOptions {
    pub source: Source,
    pub initial_candidates: PathBuf,
    pub final_name: String,
    pub workspace: PathBuf,
    pub threshold: f64,
    pub update_luts: bool,
    pub arctic_dir: PathBuf,
    pub antarctic_dir: PathBuf,
    pub years: RangeInclusive<i32>,
}

impl SeaIceOptions {
    /// Rasters default to the remapped NSIDC tree under `working_dir`.
    pub fn new(
        source: Source,
        initial_candidates: PathBuf,
        workspace: PathBuf,
        working_dir: &Path,
    ) -> Self {
        let ice_dir = |pole: &str| {
            working_dir
                .join("noaa_sea_ice")
                .join(pole)
                .join("resampled_nd")
                .join("daily")
                .join("geotiff")
        };
        Self {
            final_name: format!("{source}_coastline_candidates_ice"),
            source,
            initial_candidates,
            workspace,
            threshold: 20.0,
            update_luts: false,
            arctic_dir: ice_dir(Hemisphere::Arctic.nsidc_prefix()),
            antarctic_dir: ice_dir(Hemisphere::Antarctic.nsidc_prefix()),
            years: DEFAULT_YEARS,
        }
    }

    pub fn with_final_name(mut self, name: &str) -> Self {
        self.final_name = name.to_string();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_update_luts(mut self, update: bool) -> Self {
        self.update_luts = update;
        self
    }

    pub fn with_ice_dirs(mut self, arctic: PathBuf, antarctic: PathBuf) -> Self {
        self.arctic_dir = arctic;
        self.antarctic_dir = antarctic;
        self
    }

    pub fn with_years(mut self, years: RangeInclusive<i32>) -> Self {
        self.years = years;
        self
    }

    fn ice_dir(&self, hemisphere: Hemisphere) -> &Path {
        match hemisphere {
            Hemisphere::Arctic => &self.arctic_dir,
            Hemisphere::Antarctic => &self.antarctic_dir,
        }
    }
}

/// Concentration attribute as a number, `None` when unset.
pub fn concentration_of(feature: &geojson::Feature) -> Option<f64> {
    feature
        .property(CONCENTRATION_FIELD)
        .and_then(JsonValue::as_f64)
}

/// Keeps features whose concentration is set and at most `threshold`.
pub fn threshold_filter(layer: &FootprintLayer, name: &str, threshold: f64) -> FootprintLayer {
    layer.select(name, |f| concentration_of(f).is_some_and(|c| c <= threshold))
}

/// Writes the sampled concentration onto every feature of `layer`.
pub fn annotate_sea_ice<S: RasterSource>(
    layer: &mut FootprintLayer,
    sampler: &mut SeaIceSampler<S>,
    date_column: &str,
) -> CoastIceResult<()> {
    layer.add_field(CONCENTRATION_FIELD);
    for (i, feature) in layer.iter_mut().enumerate() {
        if i % PROGRESS_INTERVAL == 0 {
            info!("Calculating sea ice on feature number: {i}...");
        }
        let Some((lon, lat)) = centroid(feature)? else {
            warn!("Feature {i} has no geometry, leaving {CONCENTRATION_FIELD} unset");
            continue;
        };
        let concentration = match Hemisphere::from_latitude(lat) {
            Some(_) => sampler.sample(lon, lat, acquisition_date(feature, date_column)?)?,
            None => 0,
        };
        feature.set_property(CONCENTRATION_FIELD, concentration);
    }
    Ok(())
}

/// Annotates candidates with sea ice concentration and keeps those at or under the threshold.
pub fn coastline_sea_ice<C: CacheStore, S: RasterSource>(
    options: &SeaIceOptions,
    cache: &C,
    source: S,
) -> CoastIceResult<Outcome> {
    info!("Loading raster look-up-tables.");
    let load = |hemisphere: Hemisphere| -> CoastIceResult<RasterLookup> {
        cache.fetch(&hemisphere.cache_key(), options.update_luts, || {
            Ok(RasterLookup::scan(options.ice_dir(hemisphere), options.years.clone())?.lookup)
        })
    };
    let mut sampler = SeaIceSampler::new(
        load(Hemisphere::Arctic)?,
        load(Hemisphere::Antarctic)?,
        source,
    )?;

    info!("Copying candidates feature class.");
    let all_ice_name = format!("{}_all_ice", options.source);
    let mut layer = FootprintLayer::read(&options.initial_candidates)?.copy(&all_ice_name);

    info!("Sampling rasters for ice concentration...");
    annotate_sea_ice(&mut layer, &mut sampler, options.source.date_column())?;
    layer.write(layer_path(&options.workspace, &all_ice_name))?;

    info!("Writing {}...", options.final_name);
    let selection = threshold_filter(&layer, &options.final_name, options.threshold);
    let path = layer_path(&options.workspace, &options.final_name);
    selection.write(&path)?;
    Ok(Outcome::Written {
        count: selection.len(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Feature;
    use serde_json::json;

    fn feature(properties: JsonValue) -> Feature {
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    #[test]
    fn threshold_is_inclusive_and_skips_unset() {
        let mut features: Vec<Feature> = [0, 10, 20, 30]
            .into_iter()
            .map(|c| feature(json!({ "sea_ice_concentration": c })))
            .collect();
        features.push(feature(json!({ "sea_ice_concentration": null })));
        features.push(feature(json!({})));
        let layer = FootprintLayer::new("all", features);

        let kept = threshold_filter(&layer, "final", 20.0);
        let values: Vec<f64> = kept.features().iter().filter_map(concentration_of).collect();
        assert_eq!(values, vec![0.0, 10.0, 20.0]);
        assert_eq!(kept.name, "final");
    }

    #[test]
    fn default_raster_dirs_follow_nsidc_layout() {
        let options = SeaIceOptions::new(
            Source::Mfp,
            PathBuf::from("initial.geojson"),
            PathBuf::from("gdb"),
            Path::new("wd"),
        );
        assert_eq!(
            options.arctic_dir,
            Path::new("wd/noaa_sea_ice/north/resampled_nd/daily/geotiff")
        );
        assert_eq!(options.final_name, "mfp_coastline_candidates_ice");
        assert_eq!(options.years, 1978..=2020);
    }
}
