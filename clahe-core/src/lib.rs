pub mod buffer;
pub mod clahe;
pub mod curve;
pub mod error;
pub mod exif_orientation;
pub mod geometry;
pub mod histogram;
pub mod pipeline;
pub mod remap;

pub use buffer::PixelBuffer;
pub use clahe::{build_curves, clahe, clahe_in_place, transform, ClaheParams, DEFAULT_SMOOTHING};
pub use curve::{cumulative_distribution, equalization_curve, CurveTable};
pub use error::{ClaheError, ClaheResult};
pub use geometry::{clamp, Neighborhood, TileGrid, TileRect};
pub use histogram::{
    build_tile_histograms, clip_limit, redistribute_excess, Histogram, TileHistograms, LEVELS,
};
pub use remap::remap;
