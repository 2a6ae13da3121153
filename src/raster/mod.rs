use crate::tiff::Endian;
use std::fmt::Display;

mod datatype;
mod ops;
mod photometrics;

pub use datatype::DataType;
pub use photometrics::{PhotometricInterpretation, PlanarConfiguration, SampleFormat};

#[derive(Debug)]
pub enum RasterError {
    BufferSize((usize, (u32, u32), DataType)),
    NotSupported(String),
}

/// Single band raster held as raw sample bytes in file byte order.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub dimensions: (u32, u32),
    pub buffer: Vec<u8>,
    pub data_type: DataType,
    pub endian: Endian,
}

impl Raster {
    pub fn new(
        dimensions: (u32, u32),
        buffer: Vec<u8>,
        data_type: DataType,
        endian: Endian,
    ) -> Result<Self, RasterError> {
        let required_bytes =
            dimensions.0 as usize * dimensions.1 as usize * data_type.size_in_bytes();
        if buffer.len() != required_bytes {
            Err(RasterError::BufferSize((buffer.len(), dimensions, data_type)))
        } else {
            Ok(Self {
                dimensions,
                buffer,
                data_type,
                endian,
            })
        }
    }

    pub fn from_values(
        dimensions: (u32, u32),
        data_type: DataType,
        endian: Endian,
        values: &[f64],
    ) -> Result<Self, RasterError> {
        if !data_type.is_scalar() {
            return Err(RasterError::NotSupported(format!(
                "Cannot encode samples as {data_type}"
            )));
        }
        let buffer = values
            .iter()
            .filter_map(|v| data_type.encode(endian, *v))
            .flatten()
            .collect();
        Self::new(dimensions, buffer, data_type, endian)
    }

    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.dimensions.0 || y >= self.dimensions.1 {
            return None;
        }
        let n = self.data_type.size_in_bytes();
        let start = (y as usize * self.dimensions.0 as usize + x as usize) * n;
        self.data_type
            .decode(self.endian, self.buffer.get(start..start + n)?)
    }

    /// All samples in row-major order.
    pub fn values(&self) -> Result<Vec<f64>, RasterError> {
        if !self.data_type.is_scalar() {
            return Err(RasterError::NotSupported(format!(
                "Cannot decode samples of {}",
                self.data_type
            )));
        }
        let n = self.data_type.size_in_bytes();
        Ok(self
            .buffer
            .chunks_exact(n)
            .map(|chunk| self.data_type.decode(self.endian, chunk).unwrap_or(f64::NAN))
            .collect())
    }
}

impl Display for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Raster({}x{}, {}, {}Bytes, {:?} Endian)",
            self.dimensions.0,
            self.dimensions.1,
            self.data_type,
            self.buffer.len(),
            self.endian
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_through_buffer() {
        let values = [2550.0, 100.0, 0.0, 1000.0];
        let raster =
            Raster::from_values((2, 2), DataType::UInt16, Endian::Big, &values).unwrap();
        assert_eq!(raster.buffer.len(), 8);
        assert_eq!(raster.get(1, 0), Some(100.0));
        assert_eq!(raster.get(2, 0), None);
        assert_eq!(raster.values().unwrap(), values.to_vec());
    }

    #[test]
    fn buffer_size_is_checked() {
        let result = Raster::new((3, 3), vec![0; 8], DataType::Byte, Endian::Little);
        assert!(matches!(result, Err(RasterError::BufferSize(_))));
    }
}
