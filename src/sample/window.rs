use crate::geotiff::GeoTiff;

/// Raw cell value marking missing sea ice data.
pub const MISSING: f64 = -9999.0;
pub const INITIAL_WINDOW: usize = 4;
/// The window keeps growing while its side is at most this many cells.
pub const MAX_WINDOW: usize = 10;

/// A north-up grid of raw concentration values (percent x 10).
pub trait ConcentrationGrid {
    fn cell_size(&self) -> (f64, f64);

    /// `ncols` x `nrows` cells whose lower-left cell contains `lower_left`. `None` off the grid.
    fn read_window(&self, lower_left: (f64, f64), ncols: usize, nrows: usize) -> Vec<Option<f64>>;
}

impl ConcentrationGrid for GeoTiff {
    fn cell_size(&self) -> (f64, f64) {
        GeoTiff::cell_size(self)
    }

    fn read_window(&self, lower_left: (f64, f64), ncols: usize, nrows: usize) -> Vec<Option<f64>> {
        GeoTiff::read_window(self, lower_left, ncols, nrows)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSample {
    pub concentration: i32,
    /// Side of the last window read.
    pub size: usize,
    pub attempts: usize,
}

/// Mean of the valid cells scaled from tenths of a percent, truncated toward zero.
pub fn concentration_from_cells(cells: &[Option<f64>]) -> Option<i32> {
    let valid: Vec<f64> = cells
        .iter()
        .flatten()
        .copied()
        .filter(|v| *v != MISSING && v.is_finite())
        .collect();
    if valid.is_empty() {
        return None;
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    Some((mean / 10.0).trunc() as i32)
}

/// Samples around projected `(x, y)`, growing a square window from its lower-left corner until
/// a valid cell turns up. Gives 0 once a window wider than `MAX_WINDOW` is still empty.
pub fn adaptive_window<G: ConcentrationGrid + ?Sized>(grid: &G, x: f64, y: f64) -> WindowSample {
    let (cell_width, cell_height) = grid.cell_size();
    let lower_left = (x - 2.0 * cell_width, y - 2.0 * cell_height);
    let mut size = INITIAL_WINDOW;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let cells = grid.read_window(lower_left, size, size);
        if let Some(concentration) = concentration_from_cells(&cells) {
            return WindowSample {
                concentration,
                size,
                attempts,
            };
        }
        if size > MAX_WINDOW {
            return WindowSample {
                concentration: 0,
                size,
                attempts,
            };
        }
        size += 1;
    }
}
