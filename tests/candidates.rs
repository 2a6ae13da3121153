use coastice::footprint::{FootprintLayer, Source};
use coastice::pipeline::{coastline_candidates, layer_path, CandidateOptions, INTERMEDIATE_LAYER};
use coastice::{CacheStore, FsCache, MemoryCache, Outcome};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn footprint(lon: f64, id: &str, cloudcover: f64) -> Value {
    let (lat, d) = (70.5, 0.005);
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [lon, lat - d], [lon + d, lat - d], [lon + d, lat + d], [lon, lat + d], [lon, lat - d]
            ]]
        },
        "properties": {
            "catalog_id": id,
            "cloudcover": cloudcover,
            "sensor": "WV02",
            "prod_code": "M1BS",
            "abscalfact": 0.01,
            "bandwidth": 0.5,
            "sun_elev": 12.5,
            "acq_time": "2019-08-01T10:00:00"
        }
    })
}

fn write_collection(path: &Path, features: Vec<Value>) {
    let collection = json!({ "type": "FeatureCollection", "features": features });
    fs::write(path, collection.to_string()).unwrap();
}

/// Meridian coastline from 70N to 71N.
fn write_coastline(path: &Path) {
    write_collection(
        path,
        vec![json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": [[0.0, 70.0], [0.0, 71.0]] },
            "properties": { "name": "meridian" }
        })],
    );
}

#[test]
fn selects_clear_footprints_near_the_coast() {
    let dir = tempfile::tempdir().unwrap();
    let coastline = dir.path().join("coast.geojson");
    let footprints = dir.path().join("mfp.geojson");
    write_coastline(&coastline);
    write_collection(
        &footprints,
        vec![
            footprint(0.05, "NEAR", 0.1),
            footprint(1.0, "FAR", 0.0),
            footprint(0.02, "CLOUDY", 0.5),
            footprint(0.03, "STEEP", 0.2),
        ],
    );
    let min_ona = dir.path().join("min_ona.csv");
    fs::write(&min_ona, "catalogid\nLEVEL\n").unwrap();
    let pairs = dir.path().join("stereo.csv");
    fs::write(&pairs, "catalogid,stereopair\nLEVEL,STEEP\nOTHER,\n").unwrap();

    let workspace = dir.path().join("gdb");
    let options = CandidateOptions::new(Source::Mfp, footprints, coastline, workspace.clone())
        .with_ona_inventories(min_ona, pairs)
        .with_update_ona(true);
    let cache = FsCache::new(dir.path());
    let outcome = coastline_candidates(&options, &cache).unwrap();

    let out_path = layer_path(&workspace, "mfp_coastline_candidates");
    assert_eq!(
        outcome,
        Outcome::Written {
            count: 1,
            path: out_path.clone()
        }
    );
    let ids = |path: &Path| -> Vec<Value> {
        FootprintLayer::read(path)
            .unwrap()
            .features()
            .iter()
            .filter_map(|f| f.property("catalog_id").cloned())
            .collect()
    };
    assert_eq!(ids(&out_path), vec![json!("NEAR")]);
    assert_eq!(
        ids(&layer_path(&workspace, INTERMEDIATE_LAYER)),
        vec![json!("NEAR"), json!("FAR")]
    );
    assert!(cache.path("max_ona_ids").exists());

    // A wider search reuses the cached exclusion set
    let wider = options
        .with_update_ona(false)
        .with_distance_km(50.0)
        .with_out_name("wide");
    match coastline_candidates(&wider, &cache).unwrap() {
        Outcome::Written { count, .. } => assert_eq!(count, 2),
        Outcome::NoResults => panic!("expected candidates"),
    }
}

#[test]
fn nothing_selected_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let coastline = dir.path().join("coast.geojson");
    let footprints = dir.path().join("mfp.geojson");
    write_coastline(&coastline);
    write_collection(&footprints, vec![footprint(0.05, "CLOUDY", 0.9)]);

    let workspace = dir.path().join("gdb");
    let cache = MemoryCache::new();
    cache.store("max_ona_ids", &Vec::<String>::new()).unwrap();
    let options = CandidateOptions::new(Source::Mfp, footprints.clone(), coastline.clone(), workspace.clone());
    assert_eq!(coastline_candidates(&options, &cache).unwrap(), Outcome::NoResults);
    assert!(!layer_path(&workspace, INTERMEDIATE_LAYER).exists());

    // Passes the attributes but lies far from the coast
    write_collection(&footprints, vec![footprint(2.0, "FAR", 0.0)]);
    assert_eq!(coastline_candidates(&options, &cache).unwrap(), Outcome::NoResults);
    assert!(layer_path(&workspace, INTERMEDIATE_LAYER).exists());
    assert!(!layer_path(&workspace, "mfp_coastline_candidates").exists());
}
