use super::{DataType, Raster, RasterError};

impl Raster {
    /// Reads a `ncols` x `nrows` block whose upper-left cell is (`col`, `row`).
    ///
    /// Cells beyond the raster edge are `None`. Output is row-major, top row first.
    pub fn window(&self, col: i64, row: i64, ncols: usize, nrows: usize) -> Vec<Option<f64>> {
        let mut cells = Vec::with_capacity(ncols * nrows);
        for j in row..row + nrows as i64 {
            for i in col..col + ncols as i64 {
                let cell = match (u32::try_from(i), u32::try_from(j)) {
                    (Ok(x), Ok(y)) => self.get(x, y),
                    _ => None,
                };
                cells.push(cell);
            }
        }
        cells
    }

    /// Copy of this raster with every sample equal to one of `targets` set to
    /// `replacement`, stored as `data_type`.
    pub fn replace_values(
        &self,
        targets: &[f64],
        replacement: f64,
        data_type: DataType,
    ) -> Result<Raster, RasterError> {
        let values: Vec<f64> = self
            .values()?
            .into_iter()
            .map(|v| if targets.contains(&v) { replacement } else { v })
            .collect();
        Raster::from_values(self.dimensions, data_type, self.endian, &values)
    }
}

#[cfg(test)]
mod tests {
    use crate::raster::{DataType, Raster};
    use crate::tiff::Endian;

    fn grid() -> Raster {
        let values: Vec<f64> = (0..9).map(|v| v as f64).collect();
        Raster::from_values((3, 3), DataType::Int16, Endian::Little, &values).unwrap()
    }

    #[test]
    fn window_clips_to_edges() {
        let cells = grid().window(-1, 1, 2, 3);
        assert_eq!(cells, vec![None, Some(3.0), None, Some(6.0), None, None]);
    }

    #[test]
    fn replace_values_changes_type() {
        let values = [2540.0, 100.0, 2540.0, 100.0];
        let raster = Raster::from_values((2, 2), DataType::UInt16, Endian::Little, &values)
            .unwrap()
            .replace_values(&[2550.0, 2540.0, 2530.0, 2510.0], -9999.0, DataType::Int16)
            .unwrap();
        assert_eq!(raster.data_type, DataType::Int16);
        assert_eq!(raster.values().unwrap(), vec![-9999.0, 100.0, -9999.0, 100.0]);
    }
}
