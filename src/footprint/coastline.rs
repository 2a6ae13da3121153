use super::{geometry, FootprintError, FootprintLayer};
use geo::{
    coord, BoundingRect, Closest, Geometry, HaversineClosestPoint, HaversineDistance,
    Intersects, LineString, Point, Polygon, Rect,
};
use std::path::Path;
use tracing::info;

const KM_PER_DEGREE_LAT: f64 = 110.574;
const KM_PER_DEGREE_LON: f64 = 111.320;

/// Coastline polylines in WGS84 degrees.
#[derive(Clone, Debug, Default)]
pub struct Coastline {
    lines: Vec<LineString<f64>>,
    bounds: Vec<Rect<f64>>,
}

/// A geometry flattened into the pieces the distance test needs.
#[derive(Default)]
struct Parts {
    lines: Vec<LineString<f64>>,
    polygons: Vec<Polygon<f64>>,
    points: Vec<Point<f64>>,
}

impl Parts {
    fn of(geometry: &Geometry<f64>) -> Self {
        let mut parts = Self::default();
        parts.push(geometry);
        parts
    }

    fn push(&mut self, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.points.push(*p),
            Geometry::MultiPoint(mp) => self.points.extend(mp.iter().copied()),
            Geometry::Line(l) => self.lines.push(LineString::new(vec![l.start, l.end])),
            Geometry::LineString(ls) => self.lines.push(ls.clone()),
            Geometry::MultiLineString(mls) => self.lines.extend(mls.iter().cloned()),
            Geometry::Polygon(p) => self.push_polygon(p.clone()),
            Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| self.push_polygon(p.clone())),
            Geometry::Rect(r) => self.push_polygon(r.to_polygon()),
            Geometry::Triangle(t) => self.push_polygon(t.to_polygon()),
            Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| self.push(g)),
        }
    }

    fn push_polygon(&mut self, polygon: Polygon<f64>) {
        self.lines.push(polygon.exterior().clone());
        self.lines.extend(polygon.interiors().iter().cloned());
        self.polygons.push(polygon);
    }

    fn vertices(&self) -> impl Iterator<Item = Point<f64>> + '_ {
        self.points
            .iter()
            .copied()
            .chain(self.lines.iter().flat_map(|l| l.points()))
    }
}

fn haversine_to_line(line: &LineString<f64>, point: &Point<f64>) -> f64 {
    match line.haversine_closest_point(point) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => point.haversine_distance(&p),
        Closest::Indeterminate => f64::INFINITY,
    }
}

/// Grows a lon/lat box by `km` on every side.
fn expand(rect: Rect<f64>, km: f64) -> Rect<f64> {
    let dlat = km / KM_PER_DEGREE_LAT;
    let max_lat = (rect.max().y.abs().max(rect.min().y.abs()) + dlat).min(90.0);
    let cos = max_lat.to_radians().cos();
    let dlon = if cos > 1e-6 {
        (km / (KM_PER_DEGREE_LON * cos)).min(360.0)
    } else {
        360.0
    };
    Rect::new(
        coord! { x: rect.min().x - dlon, y: rect.min().y - dlat },
        coord! { x: rect.max().x + dlon, y: rect.max().y + dlat },
    )
}

/// The expanded box plus its copy shifted by a full turn when it crosses the antimeridian.
fn search_boxes(rect: Rect<f64>, km: f64) -> Vec<Rect<f64>> {
    let search = expand(rect, km);
    let shift = |dx: f64| {
        Rect::new(
            coord! { x: search.min().x + dx, y: search.min().y },
            coord! { x: search.max().x + dx, y: search.max().y },
        )
    };
    let mut boxes = vec![search];
    if search.max().x > 180.0 {
        boxes.push(shift(-360.0));
    }
    if search.min().x < -180.0 {
        boxes.push(shift(360.0));
    }
    boxes
}

impl Coastline {
    pub fn new(geometries: &[Geometry<f64>]) -> Self {
        let mut parts = Parts::default();
        geometries.iter().for_each(|g| parts.push(g));
        // Isolated points carry no shoreline
        let lines: Vec<LineString<f64>> =
            parts.lines.into_iter().filter(|l| l.0.len() > 1).collect();
        let bounds = lines.iter().filter_map(|l| l.bounding_rect()).collect();
        Self { lines, bounds }
    }

    pub fn from_layer(layer: &FootprintLayer) -> Result<Self, FootprintError> {
        let mut geometries = vec![];
        for feature in layer.features() {
            geometries.extend(geometry(feature)?);
        }
        Ok(Self::new(&geometries))
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, FootprintError> {
        let coastline = Self::from_layer(&FootprintLayer::read(path)?)?;
        info!("Loaded coastline with {} lines", coastline.lines.len());
        Ok(coastline)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when `geometry` intersects the coastline or comes within `km` great circle
    /// kilometers of it.
    pub fn within_distance(&self, geometry: &Geometry<f64>, km: f64) -> bool {
        let Some(rect) = geometry.bounding_rect() else {
            return false;
        };
        let search = search_boxes(rect, km);
        let meters = km * 1000.0;
        let parts = Parts::of(geometry);

        self.lines
            .iter()
            .zip(&self.bounds)
            .filter(|(_, bounds)| search.iter().any(|b| bounds.intersects(b)))
            .any(|(line, _)| {
                parts.polygons.iter().any(|p| line.intersects(p))
                    || parts.lines.iter().any(|l| line.intersects(l))
                    || parts.vertices().any(|v| haversine_to_line(line, &v) <= meters)
                    || line
                        .points()
                        .filter(|p| search.iter().any(|b| b.intersects(p)))
                        .any(|p| parts.lines.iter().any(|l| haversine_to_line(l, &p) <= meters))
            })
    }
}
