use super::SampleFormat;
use crate::tiff::Endian;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use num_traits::{Bounded, NumCast, ToPrimitive};
use std::fmt::Display;

/// Pixel data types, numbered with GDAL's type codes.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DataType {
    Unknown = 0,
    Byte = 1,
    UInt16 = 2,
    Int16 = 3,
    UInt32 = 4,
    Int32 = 5,
    Float32 = 6,
    Float64 = 7,
    CInt16 = 8,
    CInt32 = 9,
    CFloat32 = 10,
    CFloat64 = 11,
}

impl DataType {
    pub fn from_tiff(bits_per_sample: u16, format: SampleFormat) -> Self {
        match (format, bits_per_sample) {
            (SampleFormat::Unsigned | SampleFormat::Undefined, 8) => Self::Byte,
            (SampleFormat::Unsigned | SampleFormat::Undefined, 16) => Self::UInt16,
            (SampleFormat::Unsigned | SampleFormat::Undefined, 32) => Self::UInt32,
            (SampleFormat::Signed, 16) => Self::Int16,
            (SampleFormat::Signed, 32) => Self::Int32,
            (SampleFormat::Float, 32) => Self::Float32,
            (SampleFormat::Float, 64) => Self::Float64,
            (SampleFormat::ComplexInt, 32) => Self::CInt16,
            (SampleFormat::ComplexInt, 64) => Self::CInt32,
            (SampleFormat::ComplexFloat, 64) => Self::CFloat32,
            (SampleFormat::ComplexFloat, 128) => Self::CFloat64,
            _ => Self::Unknown,
        }
    }

    /// Output type for a remapped raster of this type.
    ///
    /// Unsigned integers become their signed counterpart so negative no-data
    /// values can be stored. Byte stays Byte.
    pub fn signed(&self) -> Self {
        match self {
            Self::UInt16 => Self::Int16,
            Self::UInt32 => Self::Int32,
            other => *other,
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            Self::Unknown => 0,
            Self::Byte => 8,
            Self::UInt16 | Self::Int16 => 16,
            Self::UInt32 | Self::Int32 | Self::Float32 | Self::CInt16 => 32,
            Self::Float64 | Self::CInt32 | Self::CFloat32 => 64,
            Self::CFloat64 => 128,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.bits_per_sample() as usize / 8
    }

    pub fn sample_format(&self) -> SampleFormat {
        match self {
            Self::Unknown => SampleFormat::Undefined,
            Self::Byte | Self::UInt16 | Self::UInt32 => SampleFormat::Unsigned,
            Self::Int16 | Self::Int32 => SampleFormat::Signed,
            Self::Float32 | Self::Float64 => SampleFormat::Float,
            Self::CInt16 | Self::CInt32 => SampleFormat::ComplexInt,
            Self::CFloat32 | Self::CFloat64 => SampleFormat::ComplexFloat,
        }
    }

    /// Real-valued types that can be read into and written from `f64`.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::UInt16
                | Self::Int16
                | Self::UInt32
                | Self::Int32
                | Self::Float32
                | Self::Float64
        )
    }

    pub fn decode(&self, endian: Endian, bytes: &[u8]) -> Option<f64> {
        match self {
            Self::Byte => bytes.first().map(|v| *v as f64),
            Self::UInt16 => endian.decode::<2, u16>(bytes.try_into().ok()?).ok()?.to_f64(),
            Self::Int16 => endian.decode::<2, i16>(bytes.try_into().ok()?).ok()?.to_f64(),
            Self::UInt32 => endian.decode::<4, u32>(bytes.try_into().ok()?).ok()?.to_f64(),
            Self::Int32 => endian.decode::<4, i32>(bytes.try_into().ok()?).ok()?.to_f64(),
            Self::Float32 => endian.decode::<4, f32>(bytes.try_into().ok()?).ok()?.to_f64(),
            Self::Float64 => endian.decode::<8, f64>(bytes.try_into().ok()?).ok(),
            _ => None,
        }
    }

    /// Encodes `value`, rounding and clamping integers into range the way
    /// GDAL does when writing out-of-range values.
    pub fn encode(&self, endian: Endian, value: f64) -> Option<Vec<u8>> {
        Some(match self {
            Self::Byte => vec![saturating::<u8>(value)],
            Self::UInt16 => endian.encode(saturating::<u16>(value)).to_vec(),
            Self::Int16 => endian.encode(saturating::<i16>(value)).to_vec(),
            Self::UInt32 => endian.encode(saturating::<u32>(value)).to_vec(),
            Self::Int32 => endian.encode(saturating::<i32>(value)).to_vec(),
            Self::Float32 => endian.encode(value as f32).to_vec(),
            Self::Float64 => endian.encode(value).to_vec(),
            _ => return None,
        })
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

fn saturating<T: NumCast + Bounded + ToPrimitive>(value: f64) -> T {
    let low = T::min_value().to_f64().unwrap_or(f64::MIN);
    let high = T::max_value().to_f64().unwrap_or(f64::MAX);
    let clamped = if value.is_nan() {
        0.0
    } else {
        value.round().clamp(low, high)
    };
    T::from(clamped).unwrap_or_else(T::min_value)
}
