use chrono::NaiveDate;
use geo::Centroid;
use geojson::{Feature, FeatureCollection, GeoJson, JsonValue};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

mod coastline;
mod ona;
mod selection;

pub use coastline::Coastline;
pub use ona::{max_ona_ids, read_catalog_ids, read_stereo_pairs, StereoPair, MAX_ONA_KEY};
pub use selection::{Predicate, SelectionClause, Source, CLOUDCOVER_MAX, PROD_CODE, SENSORS};

pub const CONCENTRATION_FIELD: &str = "sea_ice_concentration";

#[derive(Debug)]
pub enum FootprintError {
    UnknownSource(String),
    UnsupportedSource(Source),
    MissingInventory(&'static str),
    NotAFeatureCollection(String),
    BadGeometry(String),
    BadDate((String, String)),
    GeoJsonError(geojson::Error),
    CsvError(csv::Error),
    IoError(io::Error),
}

impl fmt::Display for FootprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for FootprintError {}

impl From<geojson::Error> for FootprintError {
    fn from(e: geojson::Error) -> Self {
        FootprintError::GeoJsonError(e)
    }
}

impl From<csv::Error> for FootprintError {
    fn from(e: csv::Error) -> Self {
        FootprintError::CsvError(e)
    }
}

impl From<io::Error> for FootprintError {
    fn from(e: io::Error) -> Self {
        FootprintError::IoError(e)
    }
}

/// A named GeoJSON feature collection standing in for a feature class.
#[derive(Clone, Debug, Default)]
pub struct FootprintLayer {
    pub name: String,
    fields: Vec<String>,
    features: Vec<Feature>,
}

impl FootprintLayer {
    pub fn new(name: &str, features: Vec<Feature>) -> Self {
        let mut fields: Vec<String> = vec![];
        for properties in features.iter().filter_map(|f| f.properties.as_ref()) {
            for key in properties.keys() {
                if !fields.contains(key) {
                    fields.push(key.clone());
                }
            }
        }
        Self {
            name: name.to_string(),
            fields,
            features,
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, FootprintError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let geojson: GeoJson = fs::read_to_string(path)?.parse()?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(FootprintError::NotAFeatureCollection(
                path.display().to_string(),
            ));
        };
        let layer = Self::new(&name, collection.features);
        debug!("Read {} features from {}", layer.len(), path.display());
        Ok(layer)
    }

    /// Writes the layer as a FeatureCollection, creating parent directories.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), FootprintError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let collection = FeatureCollection {
            bbox: None,
            features: self.features.clone(),
            foreign_members: None,
        };
        fs::write(path, GeoJson::FeatureCollection(collection).to_string())?;
        debug!("Wrote {} features to {}", self.len(), path.display());
        Ok(())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Adds a field unset on every feature. Returns false if it already existed.
    pub fn add_field(&mut self, field: &str) -> bool {
        if self.has_field(field) {
            return false;
        }
        self.fields.push(field.to_string());
        for feature in self.features.iter_mut() {
            if !feature.contains_property(field) {
                feature.set_property(field, JsonValue::Null);
            }
        }
        true
    }

    /// Copies the matching features into a new layer.
    pub fn select<F: Fn(&Feature) -> bool>(&self, name: &str, predicate: F) -> Self {
        Self {
            name: name.to_string(),
            fields: self.fields.clone(),
            features: self
                .features
                .iter()
                .filter(|f| predicate(f))
                .cloned()
                .collect(),
        }
    }

    /// Like `select` for predicates that can fail.
    pub fn try_select<E, F: FnMut(&Feature) -> Result<bool, E>>(
        &self,
        name: &str,
        mut predicate: F,
    ) -> Result<Self, E> {
        let mut features = vec![];
        for feature in self.features.iter() {
            if predicate(feature)? {
                features.push(feature.clone());
            }
        }
        Ok(Self {
            name: name.to_string(),
            fields: self.fields.clone(),
            features,
        })
    }

    pub fn copy(&self, name: &str) -> Self {
        self.select(name, |_| true)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Feature> {
        self.features.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Converts a feature's geometry for spatial operations.
pub fn geometry(feature: &Feature) -> Result<Option<geo::Geometry<f64>>, FootprintError> {
    match &feature.geometry {
        Some(geometry) => geo::Geometry::<f64>::try_from(geometry.value.clone())
            .map(Some)
            .map_err(|e| FootprintError::BadGeometry(e.to_string())),
        None => Ok(None),
    }
}

/// Centroid as `(lon, lat)`.
pub fn centroid(feature: &Feature) -> Result<Option<(f64, f64)>, FootprintError> {
    Ok(geometry(feature)?
        .and_then(|g| g.centroid())
        .map(|point| (point.x(), point.y())))
}

/// Date from the first 10 characters (`YYYY-MM-DD`) of a timestamp attribute.
pub fn acquisition_date(feature: &Feature, column: &str) -> Result<NaiveDate, FootprintError> {
    let text = match feature.property(column) {
        Some(JsonValue::String(text)) => text.as_str(),
        other => {
            return Err(FootprintError::BadDate((
                column.to_string(),
                format!("{other:?}"),
            )))
        }
    };
    text.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| FootprintError::BadDate((column.to_string(), text.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, Value};
    use serde_json::json;

    pub(crate) fn square(lon: f64, lat: f64, size: f64, properties: JsonValue) -> Feature {
        let ring = vec![
            vec![lon, lat],
            vec![lon + size, lat],
            vec![lon + size, lat + size],
            vec![lon, lat + size],
            vec![lon, lat],
        ];
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    #[test]
    fn parses_date_prefix() {
        let feature = square(0.0, 0.0, 1.0, json!({"acq_time": "2019-08-21T14:15:04"}));
        assert_eq!(
            acquisition_date(&feature, "acq_time").unwrap(),
            NaiveDate::from_ymd_opt(2019, 8, 21).unwrap()
        );
        assert!(matches!(
            acquisition_date(&feature, "ACQ_TIME"),
            Err(FootprintError::BadDate(_))
        ));
        let short = square(0.0, 0.0, 1.0, json!({"acqdate": "2019-08"}));
        assert!(acquisition_date(&short, "acqdate").is_err());
    }

    #[test]
    fn centroid_of_square() {
        let feature = square(10.0, 60.0, 2.0, json!({}));
        assert_eq!(centroid(&feature).unwrap(), Some((11.0, 61.0)));
    }

    #[test]
    fn add_field_only_when_missing() {
        let mut layer = FootprintLayer::new(
            "fp",
            vec![
                square(0.0, 0.0, 1.0, json!({"catalog_id": "A"})),
                square(0.0, 0.0, 1.0, json!({"catalog_id": "B", "sea_ice_concentration": 5})),
            ],
        );
        assert!(layer.add_field("extra"));
        assert!(!layer.add_field("extra"));
        assert!(!layer.add_field(CONCENTRATION_FIELD));
        assert_eq!(layer.fields(), ["catalog_id", "sea_ice_concentration", "extra"]);
        assert_eq!(layer.features()[1].property(CONCENTRATION_FIELD), Some(&json!(5)));
        assert_eq!(layer.features()[0].property("extra"), Some(&JsonValue::Null));
    }

    #[test]
    fn writes_and_reads_layers() {
        let dir = tempfile::tempdir().unwrap();
        let layer = FootprintLayer::new(
            "candidates",
            vec![square(0.0, 0.0, 1.0, json!({"catalog_id": "A"}))],
        );
        let path = dir.path().join("gdb/candidates.geojson");
        layer.write(&path).unwrap();
        let read = FootprintLayer::read(&path).unwrap();
        assert_eq!(read.name, "candidates");
        assert_eq!(read.len(), 1);
        assert_eq!(read.features()[0].property("catalog_id"), Some(&json!("A")));

        let kept = read.select("none", |f| f.property("catalog_id") == Some(&json!("B")));
        assert!(kept.is_empty());
        assert_eq!(kept.fields(), read.fields());
    }
}
