// https://en.wikipedia.org/wiki/TIFF#TIFF_Compression_Tag
// https://github.com/image-rs/image-tiff/blob/master/src/decoder/mod.rs

use crate::tiff::Endian;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use num_enum::{FromPrimitive, IntoPrimitive};
use salzweg::decoder::{DecodingError, TiffStyleDecoder};
use std::io::{self, Read, Write};

#[derive(Debug)]
pub enum DecompressError {
    LzwError(DecodingError),
    CompressionNotSupported(Compression),
    PredictorNotSupported(Predictor),
    IoError(io::Error),
}

impl From<io::Error> for DecompressError {
    fn from(e: io::Error) -> Self {
        DecompressError::IoError(e)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Compression {
    Uncompressed = 1,
    Lzw = 5,
    Jpeg = 7,
    DeflateAdobe = 8,
    PackBits = 32773,
    Deflate = 32946,
    Zstd = 34926,

    #[num_enum(default)]
    Unknown = 0x0000,
}

impl Compression {
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        match self {
            Self::Uncompressed => Ok(bytes.to_vec()),
            Self::Lzw => TiffStyleDecoder::decode_to_vec(bytes).map_err(DecompressError::LzwError),
            Self::DeflateAdobe | Self::Deflate => {
                let mut buf = vec![];
                ZlibDecoder::new(bytes).read_to_end(&mut buf)?;
                Ok(buf)
            }
            Self::PackBits => Ok(unpack_bits(bytes)),
            other => Err(DecompressError::CompressionNotSupported(*other)),
        }
    }

    pub fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        match self {
            Self::Uncompressed => Ok(bytes.to_vec()),
            Self::DeflateAdobe | Self::Deflate => {
                let mut encoder = ZlibEncoder::new(vec![], flate2::Compression::default());
                encoder.write_all(bytes)?;
                Ok(encoder.finish()?)
            }
            other => Err(DecompressError::CompressionNotSupported(*other)),
        }
    }
}

fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![];
    let mut i = 0;
    while i < bytes.len() {
        let n = bytes[i] as i8;
        i += 1;
        match n {
            0..=127 => {
                let end = (i + n as usize + 1).min(bytes.len());
                out.extend_from_slice(&bytes[i..end]);
                i = end;
            }
            -127..=-1 => {
                if let Some(v) = bytes.get(i) {
                    out.extend(std::iter::repeat(*v).take(1 + (-n) as usize));
                }
                i += 1;
            }
            // -128 is a no-op
            _ => {}
        }
    }
    out
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Predictor {
    No = 1,
    Horizontal = 2,
    FloatingPoint = 3,

    #[num_enum(default)]
    Unknown = 0x0000,
}

impl Predictor {
    /// Reverses the predictor in place over rows of `width` samples.
    pub fn predict(
        &self,
        buffer: &mut [u8],
        width: usize,
        sample_bytes: usize,
        endian: Endian,
    ) -> Result<(), DecompressError> {
        match self {
            Self::No => {}
            Self::Horizontal => {
                let row_bytes = width * sample_bytes;
                if row_bytes == 0 {
                    return Ok(());
                }
                let mask = match sample_bytes {
                    8 => u64::MAX,
                    n => (1_u64 << (8 * n)) - 1,
                };
                for row in buffer.chunks_exact_mut(row_bytes) {
                    for k in 1..width {
                        let (done, rest) = row.split_at_mut(k * sample_bytes);
                        let prev = read_uint(&done[(k - 1) * sample_bytes..], endian);
                        let current = &mut rest[..sample_bytes];
                        let value = read_uint(current, endian).wrapping_add(prev) & mask;
                        write_uint(current, value, endian);
                    }
                }
            }
            other => return Err(DecompressError::PredictorNotSupported(*other)),
        }
        Ok(())
    }
}

fn read_uint(bytes: &[u8], endian: Endian) -> u64 {
    let fold = |acc: u64, b: &u8| (acc << 8) | *b as u64;
    match endian {
        Endian::Big => bytes.iter().fold(0, fold),
        Endian::Little => bytes.iter().rev().fold(0, fold),
    }
}

fn write_uint(bytes: &mut [u8], value: u64, endian: Endian) {
    let n = bytes.len();
    for i in 0..n {
        let byte = (value >> (8 * i)) as u8;
        match endian {
            Endian::Little => bytes[i] = byte,
            Endian::Big => bytes[n - 1 - i] = byte,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_round_trip() {
        let data: Vec<u8> = (0..255).cycle().take(4096).collect();
        let packed = Compression::Deflate.encode(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(Compression::DeflateAdobe.decode(&packed).unwrap(), data);
    }

    #[test]
    fn packbits_literal_and_run() {
        let packed = [0x02, 1, 2, 3, 0xFE, 9];
        assert_eq!(unpack_bits(&packed), vec![1, 2, 3, 9, 9, 9]);
    }

    #[test]
    fn horizontal_predictor_on_16_bit_rows() {
        let endian = Endian::Little;
        // Row of deltas [100, 50, -30] as u16
        let mut buffer: Vec<u8> = [100_u16, 50, (-30_i16) as u16]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        Predictor::Horizontal
            .predict(&mut buffer, 3, 2, endian)
            .unwrap();
        let values: Vec<u16> = buffer
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(values, vec![100, 150, 120]);
    }

    #[test]
    fn floating_point_predictor_unsupported() {
        let result = Predictor::FloatingPoint.predict(&mut [0; 4], 1, 4, Endian::Big);
        assert!(matches!(
            result,
            Err(DecompressError::PredictorNotSupported(Predictor::FloatingPoint))
        ));
    }
}
