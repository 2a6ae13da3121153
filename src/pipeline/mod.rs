use std::path::{Path, PathBuf};

mod candidates;
mod nodata;
mod sea_ice;

pub use candidates::{coastline_candidates, CandidateOptions, INTERMEDIATE_LAYER};
pub use nodata::{
    resample_loop, resample_nodata, RemapOptions, RemapReport, CONCENTRATION_NODATA,
    EXTENT_NODATA,
};
pub use sea_ice::{annotate_sea_ice, coastline_sea_ice, concentration_of, threshold_filter, SeaIceOptions};

pub const LAYER_EXTENSION: &str = "geojson";
/// Features between progress log lines.
pub const PROGRESS_INTERVAL: usize = 10_000;

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Written { count: usize, path: PathBuf },
    /// A selection stage matched nothing and the run stopped early.
    NoResults,
}

/// Path of a named layer inside a workspace directory.
pub fn layer_path(workspace: &Path, name: &str) -> PathBuf {
    workspace.join(format!("{name}.{LAYER_EXTENSION}"))
}
