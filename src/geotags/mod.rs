// https://docs.ogc.org/is/19-008r4/19-008r4.html#_geotiff_tags_for_coordinate_transformations

use crate::tiff::{Endian, Ifd, TagData, TagId};
use num_traits::NumCast;
use std::fmt::Display;

mod error;
mod id;
mod keys;
mod value;

pub use error::GeoTiffError;
pub use id::{
    GeoKeyId, MODEL_TYPE_GEOGRAPHIC, MODEL_TYPE_PROJECTED, RASTER_PIXEL_IS_AREA,
    RASTER_PIXEL_IS_POINT,
};
pub use keys::{GeoKey, GeoKeyDirectory};
pub use value::GeoKeyValue;

/// Affine pixel to model transform in GDAL coefficient order.
///
/// `x = gt[0] + col * gt[1] + row * gt[2]`, `y = gt[3] + col * gt[4] + row * gt[5]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn north_up(origin: (f64, f64), cell_size: (f64, f64)) -> Self {
        Self([origin.0, cell_size.0, 0.0, origin.1, 0.0, -cell_size.1])
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn cell_size(&self) -> (f64, f64) {
        (self.0[1].abs(), self.0[5].abs())
    }

    pub fn is_north_up(&self) -> bool {
        self.0[2] == 0.0 && self.0[4] == 0.0
    }

    /// Fractional (col, row) of a model coordinate. Only valid for north-up transforms.
    pub fn pixel_of(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.0[0]) / self.0[1], (y - self.0[3]) / self.0[5])
    }

    pub fn model_of(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.0[0] + col * self.0[1] + row * self.0[2],
            self.0[3] + col * self.0[4] + row * self.0[5],
        )
    }
}

#[derive(Clone, Debug)]
pub struct GeoTags {
    pub directory: GeoKeyDirectory,
    pub model: GeoModel,
}

#[derive(Clone, Debug)]
pub enum GeoModel {
    Transformed(GeoModelTransformed),
    Scaled(GeoModelScaled),
}

#[derive(Clone, Debug)]
pub struct GeoModelTransformed {
    pub transformation: [f64; 16],
    pub tiepoint: Option<[f64; 6]>,
}

#[derive(Clone, Debug)]
pub struct GeoModelScaled {
    pub pixel_scale: [f64; 3],
    pub tiepoint: [f64; 6],
}

impl Display for GeoTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GeoTIFF Tags:")?;
        match &self.model {
            GeoModel::Transformed(model) => {
                writeln!(f, "  Tiepoint: {:?}", model.tiepoint)?;
                writeln!(f, "  Transformation: {:?}", model.transformation)?;
            }
            GeoModel::Scaled(model) => {
                writeln!(f, "  Tiepoint: {:?}", model.tiepoint)?;
                writeln!(f, "  Pixel Scale: {:?}", model.pixel_scale)?;
            }
        }
        write!(
            f,
            "  Directory: {{version: {}, revision: {}.{}}}",
            self.directory.version, self.directory.revision.0, self.directory.revision.1,
        )?;
        for key in self.directory.keys.iter() {
            write!(f, "\n    {key}")?;
        }
        Ok(())
    }
}

impl GeoTags {
    /// Scaled model for a north-up grid whose upper-left corner is `gt.origin()`.
    pub fn from_geo_transform(gt: &GeoTransform) -> Result<Self, GeoTiffError> {
        if !gt.is_north_up() {
            return Err(GeoTiffError::UnsupportedModel(format!(
                "Rotated geotransform {:?}",
                gt.0
            )));
        }
        let (origin_x, origin_y) = gt.origin();
        let (scale_x, scale_y) = gt.cell_size();
        let mut directory = GeoKeyDirectory::new();
        directory.set(
            GeoKeyId::GTRasterTypeGeoKey,
            GeoKeyValue::Short(vec![RASTER_PIXEL_IS_AREA]),
        );
        Ok(Self {
            model: GeoModel::Scaled(GeoModelScaled {
                tiepoint: [0.0, 0.0, 0.0, origin_x, origin_y, 0.0],
                pixel_scale: [scale_x, scale_y, 0.0],
            }),
            directory,
        })
    }

    pub fn with_epsg(mut self, epsg: u16) -> Self {
        let (model_type, key) = match epsg {
            4000..=4999 => (MODEL_TYPE_GEOGRAPHIC, GeoKeyId::GeographicTypeGeoKey),
            _ => (MODEL_TYPE_PROJECTED, GeoKeyId::ProjectedCSTypeGeoKey),
        };
        self.directory
            .set(GeoKeyId::GTModelTypeGeoKey, GeoKeyValue::Short(vec![model_type]));
        self.directory.set(key, GeoKeyValue::Short(vec![epsg]));
        self
    }

    pub fn parse(ifd: &Ifd) -> Result<Self, GeoTiffError> {
        let tiepoint = get_tag_as_array(ifd, TagId::ModelTiepoint).ok();
        let pixel_scale = get_tag_as_array(ifd, TagId::ModelPixelScale).ok();
        let transformation = get_tag_as_array(ifd, TagId::ModelTransformation).ok();
        let model = match (tiepoint, pixel_scale, transformation) {
            (Some(tiepoint), Some(pixel_scale), _) => GeoModel::Scaled(GeoModelScaled {
                tiepoint,
                pixel_scale,
            }),
            (tiepoint, _, Some(transformation)) => GeoModel::Transformed(GeoModelTransformed {
                tiepoint,
                transformation,
            }),
            _ => return Err(GeoTiffError::MissingTag(TagId::ModelPixelScale)),
        };

        let directory = GeoKeyDirectory::parse(ifd)?;

        Ok(Self { model, directory })
    }

    pub fn add_to_ifd(&self, ifd: &mut Ifd, endian: Endian) {
        match &self.model {
            GeoModel::Transformed(model) => {
                ifd.set_tag(
                    TagId::ModelTransformation,
                    TagData::Double(model.transformation.to_vec()),
                    endian,
                );
                if let Some(tiepoint) = model.tiepoint {
                    ifd.set_tag(
                        TagId::ModelTiepoint,
                        TagData::Double(tiepoint.to_vec()),
                        endian,
                    );
                }
            }
            GeoModel::Scaled(model) => {
                ifd.set_tag(
                    TagId::ModelTiepoint,
                    TagData::Double(model.tiepoint.to_vec()),
                    endian,
                );
                ifd.set_tag(
                    TagId::ModelPixelScale,
                    TagData::Double(model.pixel_scale.to_vec()),
                    endian,
                );
            }
        }
        self.directory.add_to_ifd(ifd, endian);
    }

    /// EPSG code of the projected or geographic CRS, if the keys name one.
    pub fn epsg(&self) -> Option<u16> {
        self.directory
            .get(GeoKeyId::ProjectedCSTypeGeoKey)
            .or_else(|| self.directory.get(GeoKeyId::GeographicTypeGeoKey))
            .and_then(|value| value.as_number())
            // 32767 is "user defined"
            .filter(|code| *code != 32767)
    }

    pub fn geo_transform(&self) -> GeoTransform {
        let mut gt = match &self.model {
            GeoModel::Scaled(model) => {
                let [i, j, _, x, y, _] = model.tiepoint;
                let [sx, sy, _] = model.pixel_scale;
                GeoTransform([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy])
            }
            GeoModel::Transformed(model) => {
                let m = model.transformation;
                GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]])
            }
        };
        // Pixel-is-point rasters reference cell centers
        let is_point = self
            .directory
            .get(GeoKeyId::GTRasterTypeGeoKey)
            .and_then(|value| value.as_number::<u16>())
            == Some(RASTER_PIXEL_IS_POINT);
        if is_point {
            let (x, y) = gt.model_of(-0.5, -0.5);
            gt.0[0] = x;
            gt.0[3] = y;
        }
        gt
    }
}

fn get_tag_as_array<const N: usize, T: NumCast>(
    ifd: &Ifd,
    id: TagId,
) -> Result<[T; N], GeoTiffError> {
    ifd.get_tag(id)
        .map_err(|_| GeoTiffError::MissingTag(id))?
        .values::<T>()
        .and_then(|values| values.try_into().ok())
        .ok_or(GeoTiffError::BadTag(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_model_to_geo_transform() {
        let gt = GeoTransform::north_up((-3850000.0, 5850000.0), (25000.0, 25000.0));
        let tags = GeoTags::from_geo_transform(&gt).unwrap().with_epsg(3413);

        let mut ifd = Ifd::new();
        tags.add_to_ifd(&mut ifd, Endian::Little);
        let parsed = GeoTags::parse(&ifd).unwrap();

        assert_eq!(parsed.geo_transform(), gt);
        assert_eq!(parsed.epsg(), Some(3413));
    }

    #[test]
    fn pixel_lookup_on_north_up_grid() {
        let gt = GeoTransform::north_up((-100.0, 100.0), (10.0, 10.0));
        assert_eq!(gt.pixel_of(-95.0, 95.0), (0.5, 0.5));
        assert_eq!(gt.model_of(20.0, 20.0), (100.0, -100.0));
    }

    #[test]
    fn geographic_epsg_uses_geographic_key() {
        let gt = GeoTransform::north_up((-180.0, 90.0), (0.25, 0.25));
        let tags = GeoTags::from_geo_transform(&gt).unwrap().with_epsg(4326);
        assert_eq!(
            tags.directory.get(GeoKeyId::GeographicTypeGeoKey),
            Some(&GeoKeyValue::Short(vec![4326]))
        );
        assert_eq!(tags.epsg(), Some(4326));
    }
}
