//! CLAHE (Contrast Limited Adaptive Histogram Equalization)
//!
//! - Divide the image into `tile_length x tile_length` tiles (edge tiles clipped)
//! - Per-tile, per-channel histogram with a clip limit; excess redistributed evenly
//! - Normalized CDF, blended toward identity by `blend_factor`
//! - Bilinear interpolation between the four surrounding tile curves, damped
//!   toward the original value by `smoothing`

use tracing::debug;

use crate::buffer::{sample_count, PixelBuffer};
use crate::curve::{cumulative_distribution, equalization_curve, CurveTable};
use crate::error::{ClaheError, ClaheResult};
use crate::geometry::{clamp, TileGrid};
use crate::histogram::{build_tile_histograms, clip_limit};
use crate::remap::remap;

/// Default fraction of the original value mixed back into each result.
pub const DEFAULT_SMOOTHING: f64 = 0.1;

/// Processing parameters for one CLAHE invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheParams {
    /// Tile edge in pixels. Must be > 0.
    pub tile_length: u32,
    /// `<= 0` disables clipping, otherwise clip limit = `tile_length^2 / clip_factor` (min 4).
    pub clip_factor: f64,
    /// 0 = identity, 1 = full equalization. Clamped to `[0, 1]`.
    pub blend_factor: f64,
    /// Damping toward the original value. Clamped to `[0, 1]`.
    pub smoothing: f64,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self::standard()
    }
}

impl ClaheParams {
    pub fn new(tile_length: u32, clip_factor: f64, blend_factor: f64) -> Self {
        Self {
            tile_length,
            clip_factor,
            blend_factor,
            smoothing: DEFAULT_SMOOTHING,
        }
    }

    /// Balanced local contrast with a partial blend.
    pub fn standard() -> Self {
        Self::new(32, 10.0, 0.6)
    }

    /// Full equalization with a high clip limit.
    pub fn strong() -> Self {
        Self::new(32, 4.0, 1.0)
    }

    /// Large tiles, tight clip limit, mostly identity.
    pub fn gentle() -> Self {
        Self::new(64, 20.0, 0.4)
    }

    /// Full equalization with no smoothing.
    pub fn classic() -> Self {
        Self {
            smoothing: 0.0,
            ..Self::new(32, 10.0, 1.0)
        }
    }

    pub fn from_preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "strong" => Some(Self::strong()),
            "gentle" => Some(Self::gentle()),
            "classic" => Some(Self::classic()),
            _ => None,
        }
    }

    pub fn all_presets() -> Vec<(&'static str, Self)> {
        vec![
            ("standard", Self::standard()),
            ("strong", Self::strong()),
            ("gentle", Self::gentle()),
            ("classic", Self::classic()),
        ]
    }

    pub fn preset_names() -> Vec<&'static str> {
        Self::all_presets().into_iter().map(|(name, _)| name).collect()
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Blend factor clamped into `[0, 1]`.
    pub fn alpha(&self) -> f64 {
        clamp(self.blend_factor, 0.0, 1.0)
    }

    /// Smoothing clamped into `[0, 1]`.
    pub fn smoothing_factor(&self) -> f64 {
        clamp(self.smoothing, 0.0, 1.0)
    }

    pub fn clip_limit(&self) -> u32 {
        clip_limit(self.tile_length, self.clip_factor)
    }

    /// Reject parameters that would produce undefined geometry or NaN curves.
    pub fn validate(&self) -> ClaheResult<()> {
        if self.tile_length == 0 {
            return Err(ClaheError::InvalidTileLength);
        }
        for (name, value) in [
            ("clip_factor", self.clip_factor),
            ("blend_factor", self.blend_factor),
            ("smoothing", self.smoothing),
        ] {
            if value.is_nan() {
                return Err(ClaheError::InvalidParameters(format!(
                    "{} must be a number",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Equalize `buffer` in place with the default smoothing.
///
/// On error the buffer is left untouched.
pub fn transform(
    buffer: &mut PixelBuffer,
    tile_length: u32,
    clip_factor: f64,
    blend_factor: f64,
) -> ClaheResult<()> {
    clahe(buffer, &ClaheParams::new(tile_length, clip_factor, blend_factor))
}

/// Equalize `buffer` in place.
pub fn clahe(buffer: &mut PixelBuffer, params: &ClaheParams) -> ClaheResult<()> {
    let (width, height) = buffer.dimensions();
    let channels = buffer.channels();
    clahe_in_place(buffer.as_raw_mut(), width, height, channels, params)
}

/// Equalize raw row-major, channel-interleaved samples in place.
pub fn clahe_in_place(
    data: &mut [u8],
    width: u32,
    height: u32,
    channels: u8,
    params: &ClaheParams,
) -> ClaheResult<()> {
    if data.is_empty() || width == 0 || height == 0 {
        return Err(ClaheError::EmptyBuffer);
    }
    if !(1..=3).contains(&channels) {
        return Err(ClaheError::UnsupportedChannels(channels));
    }
    let expected = sample_count(width, height, channels);
    if data.len() != expected {
        return Err(ClaheError::BufferSizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    params.validate()?;

    let grid = TileGrid::new(width, height, params.tile_length)?;
    let curves = build_curves(data, &grid, channels as usize, params);
    remap(
        data,
        &grid,
        channels as usize,
        &curves,
        params.smoothing_factor(),
    );
    Ok(())
}

/// Compute the equalization curve of every tile and channel.
///
/// Tiles are independent; the table must be complete before any pixel is
/// remapped.
pub fn build_curves(
    data: &[u8],
    grid: &TileGrid,
    channels: usize,
    params: &ClaheParams,
) -> CurveTable {
    let limit = params.clip_limit();
    let alpha = params.alpha();
    debug!(
        tiles_x = grid.tiles_x(),
        tiles_y = grid.tiles_y(),
        tile_length = grid.tile_length(),
        clip_limit = limit,
        alpha,
        channels,
        "building tile curves"
    );

    let mut curves = CurveTable::identity(grid.len(), channels);
    for (tile, rect) in grid.tiles().enumerate() {
        let mut hists = build_tile_histograms(data, grid.width(), channels, rect, limit);
        hists.redistribute();
        for (c, hist) in hists.channels.iter().enumerate() {
            let cdf = cumulative_distribution(hist, hists.pixel_count);
            curves.set_curve(tile, c, &equalization_curve(&cdf, alpha));
        }
    }
    curves
}
