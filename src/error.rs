use crate::cache::CacheError;
use crate::encode::EncodeError;
use crate::footprint::FootprintError;
use crate::geotiff::ReadError;
use crate::lookup::LookupError;
use crate::projection::ProjectionError;
use crate::raster::RasterError;
use crate::sync::SyncError;
use std::fmt;
use std::io;

pub type CoastIceResult<T> = Result<T, CoastIceError>;

#[derive(Debug)]
pub enum CoastIceError {
    RasterReadError(ReadError),
    RasterWriteError(EncodeError),
    RasterizationError(RasterError),
    ProjectionError(ProjectionError),
    LookupError(LookupError),
    CacheError(CacheError),
    FootprintError(FootprintError),
    SyncError(SyncError),
    IoError(io::Error),
    DateError(chrono::ParseError),
}

impl fmt::Display for CoastIceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for CoastIceError {}

impl From<ReadError> for CoastIceError {
    fn from(e: ReadError) -> Self {
        CoastIceError::RasterReadError(e)
    }
}

impl From<EncodeError> for CoastIceError {
    fn from(e: EncodeError) -> Self {
        CoastIceError::RasterWriteError(e)
    }
}

impl From<RasterError> for CoastIceError {
    fn from(e: RasterError) -> Self {
        CoastIceError::RasterizationError(e)
    }
}

impl From<ProjectionError> for CoastIceError {
    fn from(e: ProjectionError) -> Self {
        CoastIceError::ProjectionError(e)
    }
}

impl From<LookupError> for CoastIceError {
    fn from(e: LookupError) -> Self {
        CoastIceError::LookupError(e)
    }
}

impl From<CacheError> for CoastIceError {
    fn from(e: CacheError) -> Self {
        CoastIceError::CacheError(e)
    }
}

impl From<FootprintError> for CoastIceError {
    fn from(e: FootprintError) -> Self {
        CoastIceError::FootprintError(e)
    }
}

impl From<SyncError> for CoastIceError {
    fn from(e: SyncError) -> Self {
        CoastIceError::SyncError(e)
    }
}

impl From<io::Error> for CoastIceError {
    fn from(e: io::Error) -> Self {
        CoastIceError::IoError(e)
    }
}

impl From<chrono::ParseError> for CoastIceError {
    fn from(e: chrono::ParseError) -> Self {
        CoastIceError::DateError(e)
    }
}
