use crate::geotags::GeoTags;
use crate::geotiff::Compression;
use crate::raster::{PhotometricInterpretation, PlanarConfiguration, Raster};
use crate::tiff::{Endian, Ifd, TagData, TagId};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub mod error;

pub use error::{EncodeError, EncodeResult};

const HEADER_SIZE: u64 = 8;
const ENTRY_SIZE: u64 = 12;

/// Writes a single band raster as a classic (32 bit offset) striped GeoTIFF.
#[derive(Debug)]
pub struct Encoder {
    raster: Raster,
    geo_tags: Option<GeoTags>,
    nodata: Option<f64>,
    compression: Compression,
    rows_per_strip: u32,
}

impl Encoder {
    pub fn new(raster: Raster) -> Self {
        Self {
            raster,
            geo_tags: None,
            nodata: None,
            compression: Compression::Deflate,
            rows_per_strip: 64,
        }
    }

    pub fn with_geo_tags(mut self, geo_tags: GeoTags) -> Self {
        self.geo_tags = Some(geo_tags);
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = rows.max(1);
        self
    }

    pub fn encode<W: Write>(&self, writer: &mut W) -> EncodeResult<()> {
        let endian = self.raster.endian;
        let (width, height) = self.raster.dimensions;
        let data_type = self.raster.data_type;
        let row_bytes = width as usize * data_type.size_in_bytes();
        let rows_per_strip = self.rows_per_strip.min(height.max(1));

        // Strips
        let strips = self
            .raster
            .buffer
            .chunks((rows_per_strip as usize * row_bytes).max(1))
            .map(|chunk| self.compression.encode(chunk))
            .collect::<Result<Vec<_>, _>>()?;
        let mut strip_offsets = Vec::with_capacity(strips.len());
        let mut position = HEADER_SIZE;
        for strip in strips.iter() {
            strip_offsets.push(to_offset(position)?);
            position += strip.len() as u64;
        }
        let ifd_offset = position + position % 2;

        // Directory
        let mut ifd = Ifd::new();
        ifd.set_tag(TagId::ImageWidth, TagData::from_long(width), endian);
        ifd.set_tag(TagId::ImageHeight, TagData::from_long(height), endian);
        ifd.set_tag(
            TagId::BitsPerSample,
            TagData::from_short(data_type.bits_per_sample()),
            endian,
        );
        ifd.set_tag(
            TagId::Compression,
            TagData::from_short(self.compression.into()),
            endian,
        );
        ifd.set_tag(
            TagId::PhotometricInterpretation,
            TagData::from_short(PhotometricInterpretation::BlackIsZero.into()),
            endian,
        );
        ifd.set_tag(TagId::StripOffsets, TagData::Long(strip_offsets), endian);
        ifd.set_tag(TagId::SamplesPerPixel, TagData::from_short(1), endian);
        ifd.set_tag(TagId::RowsPerStrip, TagData::from_long(rows_per_strip), endian);
        ifd.set_tag(
            TagId::StripByteCounts,
            TagData::Long(
                strips
                    .iter()
                    .map(|strip| to_offset(strip.len() as u64))
                    .collect::<EncodeResult<_>>()?,
            ),
            endian,
        );
        ifd.set_tag(
            TagId::PlanarConfiguration,
            TagData::from_short(PlanarConfiguration::Chunky.into()),
            endian,
        );
        ifd.set_tag(
            TagId::SampleFormat,
            TagData::from_short(data_type.sample_format().into()),
            endian,
        );
        if let Some(geo_tags) = &self.geo_tags {
            geo_tags.add_to_ifd(&mut ifd, endian);
        }
        if let Some(nodata) = self.nodata {
            ifd.set_tag(
                TagId::GDALNoData,
                TagData::from_string(&nodata.to_string()),
                endian,
            );
        }

        // Tag values larger than 4 bytes go after the directory
        let tags = ifd.tags();
        let overflow_start = ifd_offset + 2 + ENTRY_SIZE * tags.len() as u64 + 4;
        let mut entries = Vec::with_capacity(tags.len() * ENTRY_SIZE as usize);
        let mut overflow = vec![];
        for tag in tags {
            entries.extend(endian.encode(tag.code));
            entries.extend(endian.encode(u16::from(tag.datatype)));
            entries.extend(endian.encode(to_offset(tag.count as u64)?));
            if tag.data.len() <= 4 {
                let mut inline = tag.data.clone();
                inline.resize(4, 0);
                entries.extend(inline);
            } else {
                let offset = overflow_start + overflow.len() as u64;
                entries.extend(endian.encode(to_offset(offset)?));
                overflow.extend(&tag.data);
                if overflow.len() % 2 == 1 {
                    overflow.push(0);
                }
            }
        }
        to_offset(overflow_start + overflow.len() as u64)?;

        // Write all
        let magic: &[u8; 2] = match endian {
            Endian::Little => b"II",
            Endian::Big => b"MM",
        };
        writer.write_all(magic)?;
        writer.write_all(&endian.encode(42_u16))?;
        writer.write_all(&endian.encode(to_offset(ifd_offset)?))?;
        for strip in strips.iter() {
            writer.write_all(strip)?;
        }
        if position % 2 == 1 {
            writer.write_all(&[0])?;
        }
        writer.write_all(&endian.encode(tags.len() as u16))?;
        writer.write_all(&entries)?;
        writer.write_all(&endian.encode(0_u32))?;
        writer.write_all(&overflow)?;
        writer.flush()?;

        debug!(
            "Encoded {} as {} {:?} strips, {} tags",
            self.raster,
            strips.len(),
            self.compression,
            tags.len()
        );
        Ok(())
    }

    /// Encodes to a file, creating missing parent directories.
    pub fn encode_to_path<P: AsRef<Path>>(&self, path: P) -> EncodeResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.encode(&mut writer)
    }
}

fn to_offset(value: u64) -> EncodeResult<u32> {
    u32::try_from(value).map_err(|_| EncodeError::TooLarge(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geotags::GeoTransform;
    use crate::geotiff::GeoTiff;
    use crate::raster::DataType;
    use std::io::Cursor;

    fn sample_raster(endian: Endian) -> Raster {
        let values: Vec<f64> = (0..35).map(|v| v as f64 * 10.0).collect();
        Raster::from_values((7, 5), DataType::UInt16, endian, &values).unwrap()
    }

    #[test]
    fn reads_back_what_it_writes() {
        for endian in [Endian::Little, Endian::Big] {
            for compression in [Compression::Uncompressed, Compression::Deflate] {
                let raster = sample_raster(endian);
                let gt = GeoTransform::north_up((-100.0, 50.0), (25.0, 25.0));
                let tags = GeoTags::from_geo_transform(&gt).unwrap().with_epsg(3413);
                let mut bytes = vec![];
                Encoder::new(raster.clone())
                    .with_geo_tags(tags)
                    .with_nodata(-9999.0)
                    .with_compression(compression)
                    .with_rows_per_strip(2)
                    .encode(&mut bytes)
                    .unwrap();

                let tif = GeoTiff::open(&mut Cursor::new(bytes)).unwrap();
                assert_eq!(tif.raster, raster);
                assert_eq!(tif.geo_transform, gt);
                assert_eq!(tif.epsg(), Some(3413));
                assert_eq!(tif.nodata, Some(-9999.0));
            }
        }
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.tif");
        let gt = GeoTransform::north_up((0.0, 0.0), (1.0, 1.0));
        Encoder::new(sample_raster(Endian::Little))
            .with_geo_tags(GeoTags::from_geo_transform(&gt).unwrap())
            .encode_to_path(&path)
            .unwrap();
        let tif = GeoTiff::open_path(&path).unwrap();
        assert_eq!(tif.dimensions(), (7, 5));
        assert_eq!(tif.nodata, None);
        assert_eq!(tif.epsg(), None);
    }
}
