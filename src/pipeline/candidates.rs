use super::{layer_path, Outcome};
use crate::cache::CacheStore;
use crate::error::CoastIceResult;
use crate::footprint::{
    geometry, max_ona_ids, read_catalog_ids, read_stereo_pairs, Coastline, FootprintError,
    FootprintLayer, SelectionClause, Source, MAX_ONA_KEY,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

pub const INTERMEDIATE_LAYER: &str = "intermed_sel";

#[derive(Clone, Debug)]
pub struct CandidateOptions {
    pub source: Source,
    pub footprint: PathBuf,
    pub coastline: PathBuf,
    pub workspace: PathBuf,
    pub distance_km: f64,
    pub out_name: String,
    pub min_ona: Option<PathBuf>,
    pub stereo_pairs: Option<PathBuf>,
    pub update_ona: bool,
}

impl CandidateOptions {
    pub fn new(source: Source, footprint: PathBuf, coastline: PathBuf, workspace: PathBuf) -> Self {
        Self {
            out_name: format!("{source}_coastline_candidates"),
            source,
            footprint,
            coastline,
            workspace,
            distance_km: 10.0,
            min_ona: None,
            stereo_pairs: None,
            update_ona: false,
        }
    }

    pub fn with_distance_km(mut self, km: f64) -> Self {
        self.distance_km = km;
        self
    }

    pub fn with_out_name(mut self, name: &str) -> Self {
        self.out_name = name.to_string();
        self
    }

    /// CSV inventories used to rebuild the off-nadir exclusion set.
    pub fn with_ona_inventories(mut self, min_ona: PathBuf, stereo_pairs: PathBuf) -> Self {
        self.min_ona = Some(min_ona);
        self.stereo_pairs = Some(stereo_pairs);
        self
    }

    pub fn with_update_ona(mut self, update: bool) -> Self {
        self.update_ona = update;
        self
    }
}

/// Exclusion set from the cache, rebuilt from the inventories when updating.
pub fn exclusion_set<C: CacheStore>(
    options: &CandidateOptions,
    cache: &C,
) -> CoastIceResult<BTreeSet<String>> {
    cache.fetch(MAX_ONA_KEY, options.update_ona, || -> CoastIceResult<_> {
        let min_ona = options
            .min_ona
            .as_ref()
            .ok_or(FootprintError::MissingInventory("min_ona"))?;
        let stereo_pairs = options
            .stereo_pairs
            .as_ref()
            .ok_or(FootprintError::MissingInventory("stereo_pairs"))?;
        Ok(max_ona_ids(
            &read_catalog_ids(min_ona)?,
            &read_stereo_pairs(stereo_pairs)?,
        ))
    })
}

/// Selects footprints meeting the imagery criteria within `distance_km` of the coastline.
pub fn coastline_candidates<C: CacheStore>(
    options: &CandidateOptions,
    cache: &C,
) -> CoastIceResult<Outcome> {
    info!("Loading coastline.");
    let coastline = Coastline::read(&options.coastline)?;

    info!("Loading source footprint.");
    let footprint = FootprintLayer::read(&options.footprint)?;
    let exclude = exclusion_set(options, cache)?;
    let clause = SelectionClause::for_source(options.source, &exclude)?;

    info!("Selecting based on criteria.");
    let selection = footprint.select(INTERMEDIATE_LAYER, |f| clause.matches(f));
    if selection.is_empty() {
        info!("No features in selection. Exiting.");
        return Ok(Outcome::NoResults);
    }
    info!("Features selected: {}", selection.len());
    info!("Writing intermediate selection...");
    selection.write(layer_path(&options.workspace, INTERMEDIATE_LAYER))?;

    info!(
        "Identifying footprints within {} kilometers of coastline.",
        options.distance_km
    );
    let near = selection.try_select(&options.out_name, |f| {
        Ok::<_, FootprintError>(
            geometry(f)?.is_some_and(|g| coastline.within_distance(&g, options.distance_km)),
        )
    })?;
    if near.is_empty() {
        info!("No features in selection. Exiting.");
        return Ok(Outcome::NoResults);
    }

    info!("Writing final candidates to feature class.");
    let path = layer_path(&options.workspace, &options.out_name);
    near.write(&path)?;
    info!("Features selected: {}", near.len());
    Ok(Outcome::Written {
        count: near.len(),
        path,
    })
}
