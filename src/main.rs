use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use coastice::footprint::Source;
use coastice::pipeline::{
    coastline_candidates, coastline_sea_ice, resample_loop, CandidateOptions, RemapOptions,
    SeaIceOptions,
};
use coastice::sync::SyncOptions;
use coastice::{CoastIceResult, FsCache, GeoTiffSource, Outcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "coastice",
    about = "Coastline imagery candidates and NSIDC sea ice concentration tools",
    after_help = "The no data remapper runs as: coastice nodata <SEA_ICE_DIRECTORY> <LAST_UPDATE_DATE> <OUT_DIRECTORY> [--out_nodata N]"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resample NSIDC sea ice raster class values (land, coast, etc.) to a no data value
    ///
    /// Usage: coastice nodata <SEA_ICE_DIRECTORY> <LAST_UPDATE_DATE> <OUT_DIRECTORY> [--out_nodata N]
    Nodata {
        /// Directory containing sea ice rasters. Subdirectories are OK.
        sea_ice_directory: PathBuf,
        /// Date through which rasters have been resampled, YYYY-MM-DD
        #[arg(value_parser = parse_date)]
        last_update_date: NaiveDate,
        /// Directory to write resampled rasters to
        out_directory: PathBuf,
        /// No data value to use for resampled rasters
        #[arg(long = "out_nodata", default_value_t = -9999.0, allow_negative_numbers = true)]
        out_nodata: f64,
    },
    /// Select footprints near the coastline meeting the imagery criteria
    Candidates {
        /// Footprint inventory: mfp, dg or nasa
        #[arg(long, value_parser = parse_source)]
        source: Source,
        /// Footprint layer (GeoJSON)
        #[arg(long)]
        footprint: PathBuf,
        /// Coastline layer (GeoJSON)
        #[arg(long)]
        coastline: PathBuf,
        /// Directory receiving the output layers
        #[arg(long)]
        workspace: PathBuf,
        /// Working directory holding the cache
        #[arg(long, default_value = ".")]
        working_dir: PathBuf,
        /// Search distance from the coastline in kilometers
        #[arg(long, default_value_t = 10.0)]
        distance: f64,
        #[arg(long)]
        out_name: Option<String>,
        /// Rebuild the off-nadir exclusion set from the inventories
        #[arg(long, requires_all = ["min_ona", "stereo_pairs"])]
        update_ona: bool,
        /// CSV with a catalogid column of minimum off-nadir ids
        #[arg(long)]
        min_ona: Option<PathBuf>,
        /// CSV with catalogid and stereopair columns
        #[arg(long)]
        stereo_pairs: Option<PathBuf>,
    },
    /// Annotate candidates with sea ice concentration and filter by threshold
    SeaIce {
        #[arg(long, value_parser = parse_source)]
        source: Source,
        /// Initial candidates layer (GeoJSON)
        #[arg(long)]
        initial: PathBuf,
        #[arg(long)]
        workspace: PathBuf,
        #[arg(long, default_value = ".")]
        working_dir: PathBuf,
        #[arg(long)]
        final_name: Option<String>,
        /// Keep candidates at or below this concentration (percent)
        #[arg(long, default_value_t = 20.0)]
        threshold: f64,
        /// Rebuild the raster look-up-tables
        #[arg(long)]
        update_luts: bool,
        #[arg(long)]
        arctic_dir: Option<PathBuf>,
        #[arg(long)]
        antarctic_dir: Option<PathBuf>,
    },
    /// Download NSIDC daily rasters newer than the last update
    Update {
        #[arg(value_parser = parse_date)]
        last_update_date: NaiveDate,
        out_directory: PathBuf,
        #[arg(long)]
        no_north: bool,
        #[arg(long)]
        no_south: bool,
        #[arg(long, default_value = coastice::sync::NSIDC_HOST)]
        host: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

fn parse_source(s: &str) -> Result<Source, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    match run(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Written { count, path } => info!("Wrote {count} features to {}", path.display()),
        Outcome::NoResults => info!("No results."),
    }
}

fn run(command: Command) -> CoastIceResult<()> {
    match command {
        Command::Nodata {
            sea_ice_directory,
            last_update_date,
            out_directory,
            out_nodata,
        } => {
            let options = RemapOptions::new(sea_ice_directory, last_update_date, out_directory)
                .with_out_nodata(out_nodata);
            resample_loop(&options)?;
        }
        Command::Candidates {
            source,
            footprint,
            coastline,
            workspace,
            working_dir,
            distance,
            out_name,
            update_ona,
            min_ona,
            stereo_pairs,
        } => {
            let mut options = CandidateOptions::new(source, footprint, coastline, workspace)
                .with_distance_km(distance)
                .with_update_ona(update_ona);
            if let Some(name) = out_name {
                options = options.with_out_name(&name);
            }
            if let (Some(min_ona), Some(stereo_pairs)) = (min_ona, stereo_pairs) {
                options = options.with_ona_inventories(min_ona, stereo_pairs);
            }
            report(coastline_candidates(&options, &FsCache::new(working_dir))?);
        }
        Command::SeaIce {
            source,
            initial,
            workspace,
            working_dir,
            final_name,
            threshold,
            update_luts,
            arctic_dir,
            antarctic_dir,
        } => {
            let mut options = SeaIceOptions::new(source, initial, workspace, &working_dir)
                .with_threshold(threshold)
                .with_update_luts(update_luts);
            if let Some(name) = final_name {
                options = options.with_final_name(&name);
            }
            let arctic = arctic_dir.unwrap_or_else(|| options.arctic_dir.clone());
            let antarctic = antarctic_dir.unwrap_or_else(|| options.antarctic_dir.clone());
            options = options.with_ice_dirs(arctic, antarctic);
            report(coastline_sea_ice(
                &options,
                &FsCache::new(working_dir),
                GeoTiffSource::new(),
            )?);
        }
        Command::Update {
            last_update_date,
            out_directory,
            no_north,
            no_south,
            host,
        } => {
            let options = SyncOptions::new(last_update_date, out_directory)
                .with_north(!no_north)
                .with_south(!no_south);
            update(&host, &options)?;
        }
    }
    Ok(())
}

#[cfg(feature = "ftp")]
fn update(host: &str, options: &SyncOptions) -> CoastIceResult<()> {
    use coastice::sync::{update_rasters, FtpSource};

    let mut remote = FtpSource::connect(host)?;
    update_rasters(&mut remote, options)?;
    remote.quit()?;
    Ok(())
}

#[cfg(not(feature = "ftp"))]
fn update(_host: &str, _options: &SyncOptions) -> CoastIceResult<()> {
    Err(coastice::sync::SyncError::Remote("built without the ftp feature".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodata_arguments_parse() {
        let cli = Cli::try_parse_from([
            "coastice",
            "nodata",
            "sea_ice",
            "2019-07-31",
            "out",
            "--out_nodata",
            "-1",
        ])
        .unwrap();
        match cli.command {
            Command::Nodata {
                sea_ice_directory,
                last_update_date,
                out_directory,
                out_nodata,
            } => {
                assert_eq!(sea_ice_directory, PathBuf::from("sea_ice"));
                assert_eq!(last_update_date, NaiveDate::from_ymd_opt(2019, 7, 31).unwrap());
                assert_eq!(out_directory, PathBuf::from("out"));
                assert_eq!(out_nodata, -1.0);
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn nodata_default_and_bad_date() {
        let cli = Cli::try_parse_from(["coastice", "nodata", "in", "2019-07-31", "out"]).unwrap();
        assert!(matches!(cli.command, Command::Nodata { out_nodata, .. } if out_nodata == -9999.0));
        assert!(Cli::try_parse_from(["coastice", "nodata", "in", "2019-7-x", "out"]).is_err());
    }
}
