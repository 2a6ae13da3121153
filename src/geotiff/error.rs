use super::compression::DecompressError;
use crate::geotags::GeoTiffError;
use crate::raster::RasterError;
use crate::tiff::TiffError;
use std::fmt;
use std::io;

pub type ReadResult<T> = Result<T, ReadError>;

#[derive(Debug)]
pub enum ReadError {
    BadTiff(TiffError),
    BadGeoTiff(GeoTiffError),
    IoError(io::Error),
    DecompresionError(DecompressError),
    RasterizationError(RasterError),
    ChunkOutOfRange((usize, u64, u64)),
    NotSupported(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for ReadError {}

impl From<TiffError> for ReadError {
    fn from(e: TiffError) -> Self {
        match e {
            TiffError::ReadError(io_error) => ReadError::IoError(io_error),
            tiff_error => ReadError::BadTiff(tiff_error),
        }
    }
}

impl From<GeoTiffError> for ReadError {
    fn from(e: GeoTiffError) -> Self {
        ReadError::BadGeoTiff(e)
    }
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        ReadError::IoError(e)
    }
}

impl From<DecompressError> for ReadError {
    fn from(e: DecompressError) -> Self {
        ReadError::DecompresionError(e)
    }
}

impl From<RasterError> for ReadError {
    fn from(e: RasterError) -> Self {
        ReadError::RasterizationError(e)
    }
}
