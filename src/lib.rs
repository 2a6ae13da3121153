pub mod cache;
pub mod encode;
pub mod error;
pub mod footprint;
pub mod geotags;
pub mod geotiff;
pub mod lookup;
pub mod pipeline;
pub mod projection;
pub mod raster;
pub mod sample;
pub mod sync;
pub mod tiff;

pub use cache::{CacheStore, FsCache, MemoryCache};
pub use encode::Encoder;
pub use error::{CoastIceError, CoastIceResult};
pub use geotiff::GeoTiff;
pub use lookup::RasterLookup;
pub use pipeline::Outcome;
pub use projection::{Hemisphere, PolarProjector};
pub use sample::{GeoTiffSource, SeaIceSampler};
