use crate::geotags::{GeoTags, GeoTransform};
use crate::raster::{DataType, Raster};
use crate::tiff::{Ifd, TagId, Tiff};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;

mod compression;
mod error;
mod layout;

pub use compression::{Compression, DecompressError, Predictor};
pub use error::{ReadError, ReadResult};
pub use layout::{Chunking, ImageLayout};

/// A fully decoded single band GeoTIFF.
#[derive(Clone, Debug)]
pub struct GeoTiff {
    pub raster: Raster,
    pub geo_tags: GeoTags,
    pub geo_transform: GeoTransform,
    pub nodata: Option<f64>,
}

impl GeoTiff {
    pub fn open<R: Read + Seek>(source: &mut R) -> ReadResult<Self> {
        let stream = &mut BufReader::new(source);

        let tiff = Tiff::open(stream)?;
        let ifd0 = tiff.ifd0()?;
        let geo_tags = GeoTags::parse(ifd0)?;
        let geo_transform = geo_tags.geo_transform();
        if !geo_transform.is_north_up() {
            return Err(ReadError::NotSupported(format!(
                "Rotated geotransform {:?}",
                geo_transform.0
            )));
        }

        let layout = ImageLayout::from_ifd(ifd0)?;
        let raster = layout.read_raster(stream, tiff.endian)?;

        Ok(Self {
            raster,
            geo_tags,
            geo_transform,
            nodata: parse_nodata(ifd0),
        })
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> ReadResult<Self> {
        let path = path.as_ref();
        debug!("Opening {}", path.display());
        let mut file = File::open(path)?;
        Self::open(&mut file)
    }

    pub fn epsg(&self) -> Option<u16> {
        self.geo_tags.epsg()
    }

    pub fn cell_size(&self) -> (f64, f64) {
        self.geo_transform.cell_size()
    }

    pub fn data_type(&self) -> DataType {
        self.raster.data_type
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions
    }

    /// Reads `ncols` x `nrows` cells whose lower-left cell contains the model coordinate
    /// `lower_left`. Rows are returned top to bottom. Cells outside the raster are `None`.
    pub fn read_window(
        &self,
        lower_left: (f64, f64),
        ncols: usize,
        nrows: usize,
    ) -> Vec<Option<f64>> {
        let (col, row) = self.geo_transform.pixel_of(lower_left.0, lower_left.1);
        let left = col.floor() as i64;
        let bottom = row.floor() as i64;
        let top = bottom - nrows as i64 + 1;
        self.raster.window(left, top, ncols, nrows)
    }
}

fn parse_nodata(ifd: &Ifd) -> Option<f64> {
    ifd.get_tag(TagId::GDALNoData)
        .ok()?
        .try_to_string()?
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse()
        .ok()
}

impl Display for GeoTiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (ox, oy) = self.geo_transform.origin();
        let (cw, ch) = self.cell_size();
        write!(
            f,
            "GeoTiff({}, EPSG:{}, origin ({ox}, {oy}), cell {cw}x{ch}, nodata {:?})",
            self.raster,
            self.epsg().map_or("?".to_string(), |code| code.to_string()),
            self.nodata
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::{Endian, TagData};

    fn grid() -> GeoTiff {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        let raster = Raster::from_values((4, 4), DataType::Int16, Endian::Little, &values).unwrap();
        let geo_transform = GeoTransform::north_up((0.0, 4.0), (1.0, 1.0));
        GeoTiff {
            raster,
            geo_tags: GeoTags::from_geo_transform(&geo_transform).unwrap(),
            geo_transform,
            nodata: None,
        }
    }

    #[test]
    fn window_grows_up_from_lower_left() {
        let tif = grid();
        let window: Vec<f64> = tif.read_window((1.5, 1.5), 2, 2).into_iter().flatten().collect();
        assert_eq!(window, vec![5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn window_past_the_edge_is_missing() {
        let tif = grid();
        let window = tif.read_window((3.5, 0.5), 2, 1);
        assert_eq!(window, vec![Some(15.0), None]);
    }

    #[test]
    fn nodata_is_read_from_gdal_tag() {
        let mut ifd = Ifd::new();
        ifd.set_tag(TagId::GDALNoData, TagData::from_string(" -9999 "), Endian::Little);
        assert_eq!(parse_nodata(&ifd), Some(-9999.0));
        assert_eq!(parse_nodata(&Ifd::new()), None);
    }
}
