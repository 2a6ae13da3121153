use super::FootprintError;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

pub const MAX_ONA_KEY: &str = "max_ona_ids";

/// Row of the stereo inventory.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StereoPair {
    pub catalogid: String,
    pub stereopair: Option<String>,
}

impl StereoPair {
    pub fn new(catalogid: &str, stereopair: &str) -> Self {
        Self {
            catalogid: catalogid.to_string(),
            stereopair: Some(stereopair.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct CatalogId {
    catalogid: String,
}

/// Partners of the minimum off-nadir ids, i.e. the higher off-nadir image of each pair.
///
/// An id may appear on either side of a pair.
pub fn max_ona_ids(min_ona: &BTreeSet<String>, pairs: &[StereoPair]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for pair in pairs {
        let Some(stereopair) = &pair.stereopair else {
            continue;
        };
        if min_ona.contains(&pair.catalogid) {
            ids.insert(stereopair.clone());
        }
        if min_ona.contains(stereopair) {
            ids.insert(pair.catalogid.clone());
        }
    }
    info!(
        "{} higher off-nadir ids from {} pairs",
        ids.len(),
        pairs.len()
    );
    ids
}

/// Reads the `catalogid` column of a CSV.
pub fn read_catalog_ids<P: AsRef<Path>>(path: P) -> Result<BTreeSet<String>, FootprintError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut ids = BTreeSet::new();
    for row in reader.deserialize::<CatalogId>() {
        ids.insert(row?.catalogid);
    }
    Ok(ids)
}

/// Reads `catalogid,stereopair` rows of a CSV. Other columns are ignored.
pub fn read_stereo_pairs<P: AsRef<Path>>(path: P) -> Result<Vec<StereoPair>, FootprintError> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.deserialize().collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn partners_on_either_side() {
        let pairs = [
            StereoPair::new("A", "X"),
            StereoPair::new("Y", "B"),
            StereoPair::new("C", "D"),
        ];
        assert_eq!(max_ona_ids(&ids(&["A", "B"]), &pairs), ids(&["X", "Y"]));
    }

    #[test]
    fn duplicates_collapse_and_unpaired_rows_are_skipped() {
        let pairs = [
            StereoPair::new("A", "X"),
            StereoPair::new("X", "A"),
            StereoPair {
                catalogid: "B".to_string(),
                stereopair: None,
            },
        ];
        assert_eq!(max_ona_ids(&ids(&["A", "B"]), &pairs), ids(&["X"]));
    }

    #[test]
    fn reads_inventories_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let min_ona = dir.path().join("min_ona.csv");
        let stereo = dir.path().join("stereo.csv");
        fs::write(&min_ona, "catalogid\nA\nB\n").unwrap();
        fs::write(&stereo, "catalogid,stereopair,platform\nA,X,WV02\nY,B,WV03\nC,,WV02\n").unwrap();

        let min_ona = read_catalog_ids(&min_ona).unwrap();
        let pairs = read_stereo_pairs(&stereo).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2].stereopair, None);
        assert_eq!(max_ona_ids(&min_ona, &pairs), ids(&["X", "Y"]));
    }
}
