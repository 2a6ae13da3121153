use proj4rs::errors::Error as Proj4Error;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use std::fmt;

const WGS84: u16 = 4326;

#[derive(Debug)]
pub enum ProjectionError {
    Proj4Error(Proj4Error),
    NonFinite((f64, f64)),
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for ProjectionError {}

impl From<Proj4Error> for ProjectionError {
    fn from(e: Proj4Error) -> Self {
        ProjectionError::Proj4Error(e)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hemisphere {
    Arctic,
    Antarctic,
}

impl Hemisphere {
    /// Polar hemisphere of a latitude, `None` between 50S and 50N inclusive.
    pub fn from_latitude(lat: f64) -> Option<Self> {
        if lat > 50.0 {
            Some(Self::Arctic)
        } else if lat < -50.0 {
            Some(Self::Antarctic)
        } else {
            None
        }
    }

    pub fn epsg(&self) -> u16 {
        match self {
            Self::Arctic => 3413,
            Self::Antarctic => 3412,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Arctic => "arctic",
            Self::Antarctic => "antarctic",
        }
    }

    /// NSIDC directory and filename prefix.
    pub fn nsidc_prefix(&self) -> &'static str {
        match self {
            Self::Arctic => "north",
            Self::Antarctic => "south",
        }
    }

    pub fn cache_key(&self) -> String {
        format!("{}_lookup", self.name())
    }

    pub fn all() -> [Self; 2] {
        [Self::Arctic, Self::Antarctic]
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Projects WGS84 longitude/latitude degrees onto the NSIDC polar grids.
#[derive(Clone, Debug)]
pub struct PolarProjector {
    geographic: Proj,
    north: Proj,
    south: Proj,
}

impl PolarProjector {
    pub fn new() -> Result<Self, ProjectionError> {
        Ok(Self {
            geographic: Proj::from_epsg_code(WGS84)?,
            north: Proj::from_epsg_code(Hemisphere::Arctic.epsg())?,
            south: Proj::from_epsg_code(Hemisphere::Antarctic.epsg())?,
        })
    }

    pub fn project(
        &self,
        lon: f64,
        lat: f64,
        hemisphere: Hemisphere,
    ) -> Result<(f64, f64), ProjectionError> {
        let to = match hemisphere {
            Hemisphere::Arctic => &self.north,
            Hemisphere::Antarctic => &self.south,
        };
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&self.geographic, to, &mut point)?;
        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(ProjectionError::NonFinite((point.0, point.1)));
        }
        Ok((point.0, point.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hemisphere_bounds_are_exclusive() {
        assert_eq!(Hemisphere::from_latitude(50.0), None);
        assert_eq!(Hemisphere::from_latitude(-50.0), None);
        assert_eq!(Hemisphere::from_latitude(0.0), None);
        assert_eq!(Hemisphere::from_latitude(50.01), Some(Hemisphere::Arctic));
        assert_eq!(Hemisphere::from_latitude(-72.0), Some(Hemisphere::Antarctic));
        assert_eq!(Hemisphere::Arctic.epsg(), 3413);
        assert_eq!(Hemisphere::Antarctic.epsg(), 3412);
    }

    #[test]
    fn cache_keys_differ_per_hemisphere() {
        assert_ne!(Hemisphere::Arctic.cache_key(), Hemisphere::Antarctic.cache_key());
    }

    #[test]
    fn north_pole_is_grid_origin() {
        let projector = PolarProjector::new().unwrap();
        let (x, y) = projector.project(-45.0, 90.0, Hemisphere::Arctic).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn nsidc_north_grid_corner() {
        // Upper-left corner of the 25 km north grid sits at 30.98N 168.35E
        let projector = PolarProjector::new().unwrap();
        let (x, y) = projector.project(168.35, 30.98, Hemisphere::Arctic).unwrap();
        assert_abs_diff_eq!(x, -3_850_000.0, epsilon = 2_000.0);
        assert_abs_diff_eq!(y, 5_850_000.0, epsilon = 2_000.0);
    }

    #[test]
    fn central_meridians_point_along_y() {
        let projector = PolarProjector::new().unwrap();
        let (x, y) = projector.project(-45.0, 70.0, Hemisphere::Arctic).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-3);
        assert!(y < -1.0e6 && y > -3.0e6);

        let (x, y) = projector.project(0.0, -70.0, Hemisphere::Antarctic).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-3);
        assert!(y > 1.0e6 && y < 3.0e6);
    }
}
