use super::compression::{Compression, Predictor};
use super::error::{ReadError, ReadResult};
use crate::raster::{DataType, PlanarConfiguration, Raster, SampleFormat};
use crate::tiff::{Endian, Ifd, TagId};
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Chunking {
    Strips { rows_per_strip: u32 },
    Tiles { tile_width: u32, tile_height: u32 },
}

/// Where and how the image data of an IFD is stored.
#[derive(Clone, Debug)]
pub struct ImageLayout {
    pub dimensions: (u32, u32),
    pub data_type: DataType,
    pub compression: Compression,
    pub predictor: Predictor,
    pub chunking: Chunking,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl ImageLayout {
    pub fn from_ifd(ifd: &Ifd) -> ReadResult<Self> {
        let width = ifd.get_tag_value(TagId::ImageWidth)?;
        let height = ifd.get_tag_value(TagId::ImageHeight)?;

        let samples_per_pixel: u16 = ifd.get_tag_value(TagId::SamplesPerPixel).unwrap_or(1);
        let planar: u16 = ifd
            .get_tag_value(TagId::PlanarConfiguration)
            .unwrap_or(PlanarConfiguration::Chunky.into());
        if samples_per_pixel != 1 {
            return Err(ReadError::NotSupported(format!(
                "{samples_per_pixel} samples per pixel ({:?})",
                PlanarConfiguration::from(planar)
            )));
        }

        let bits_per_sample = ifd.get_tag_value(TagId::BitsPerSample)?;
        let sample_format =
            SampleFormat::from(ifd.get_tag_value::<u16>(TagId::SampleFormat).unwrap_or(1));
        let data_type = DataType::from_tiff(bits_per_sample, sample_format);
        if !data_type.is_scalar() {
            return Err(ReadError::NotSupported(format!(
                "{bits_per_sample} bit {sample_format:?} samples"
            )));
        }

        let compression =
            Compression::from(ifd.get_tag_value::<u16>(TagId::Compression).unwrap_or(1));
        let predictor = Predictor::from(ifd.get_tag_value::<u16>(TagId::Predictor).unwrap_or(1));

        let (chunking, offsets, byte_counts) = match ifd.get_tag(TagId::TileOffsets) {
            Ok(_) => (
                Chunking::Tiles {
                    tile_width: ifd.get_tag_value(TagId::TileWidth)?,
                    tile_height: ifd.get_tag_value(TagId::TileLength)?,
                },
                ifd.get_tag_values(TagId::TileOffsets)?,
                ifd.get_tag_values(TagId::TileByteCounts)?,
            ),
            Err(_) => (
                Chunking::Strips {
                    rows_per_strip: ifd
                        .get_tag_value::<u32>(TagId::RowsPerStrip)
                        .unwrap_or(height)
                        .clamp(1, height.max(1)),
                },
                ifd.get_tag_values(TagId::StripOffsets)?,
                ifd.get_tag_values(TagId::StripByteCounts)?,
            ),
        };
        if offsets.len() != byte_counts.len() {
            return Err(ReadError::NotSupported(format!(
                "{} chunk offsets but {} byte counts",
                offsets.len(),
                byte_counts.len()
            )));
        }

        Ok(Self {
            dimensions: (width, height),
            data_type,
            compression,
            predictor,
            chunking,
            offsets,
            byte_counts,
        })
    }

    /// Decodes every chunk into one row-major raster.
    pub fn read_raster<R: Read + Seek>(&self, stream: &mut R, endian: Endian) -> ReadResult<Raster> {
        let (width, height) = (self.dimensions.0 as usize, self.dimensions.1 as usize);
        let n = self.data_type.size_in_bytes();
        let row_bytes = width * n;
        let mut buffer = vec![0u8; row_bytes * height];

        for (index, (offset, byte_count)) in self.offsets.iter().zip(&self.byte_counts).enumerate() {
            let mut bytes = vec![0u8; *byte_count as usize];
            stream.seek(SeekFrom::Start(*offset))?;
            stream
                .read_exact(&mut bytes)
                .map_err(|_| ReadError::ChunkOutOfRange((index, *offset, *byte_count)))?;
            let mut chunk = self.compression.decode(&bytes)?;

            match self.chunking {
                Chunking::Strips { rows_per_strip } => {
                    self.predictor.predict(&mut chunk, width, n, endian)?;
                    let start = index * rows_per_strip as usize * row_bytes;
                    if start >= buffer.len() {
                        continue;
                    }
                    let len = chunk.len().min(buffer.len() - start);
                    buffer[start..start + len].copy_from_slice(&chunk[..len]);
                }
                Chunking::Tiles {
                    tile_width,
                    tile_height,
                } => {
                    let (tile_width, tile_height) = (tile_width as usize, tile_height as usize);
                    self.predictor.predict(&mut chunk, tile_width, n, endian)?;
                    let across = width.div_ceil(tile_width.max(1));
                    let x0 = (index % across.max(1)) * tile_width;
                    let y0 = (index / across.max(1)) * tile_height;
                    let cols = tile_width.min(width.saturating_sub(x0));
                    for r in 0..tile_height {
                        let y = y0 + r;
                        let src = r * tile_width * n;
                        if y >= height || src + cols * n > chunk.len() {
                            break;
                        }
                        let dst = (y * width + x0) * n;
                        buffer[dst..dst + cols * n].copy_from_slice(&chunk[src..src + cols * n]);
                    }
                }
            }
        }
        debug!(
            "Decoded {} {:?} chunks into {}x{} {}",
            self.offsets.len(),
            self.compression,
            width,
            height,
            self.data_type
        );

        Ok(Raster::new(self.dimensions, buffer, self.data_type, endian)?)
    }
}
