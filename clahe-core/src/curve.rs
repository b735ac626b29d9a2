//! Cumulative distributions and per-tile equalization curves.

use ndarray::{Array3, ArrayView1, ArrayViewMut1};

use crate::histogram::{Histogram, LEVELS};

/// Normalized cumulative distribution of a histogram over `pixel_count`
/// samples. Non-decreasing, ending at 1.0 when the histogram holds exactly
/// `pixel_count` samples.
pub fn cumulative_distribution(hist: &Histogram, pixel_count: u32) -> [f64; LEVELS] {
    debug_assert!(pixel_count > 0);
    let n = pixel_count as f64;
    let mut cdf = [0.0f64; LEVELS];
    cdf[0] = hist[0] as f64 / n;
    for i in 1..LEVELS {
        cdf[i] = cdf[i - 1] + hist[i] as f64 / n;
    }
    cdf
}

/// Equalization curve blended toward identity.
///
/// `alpha = 1` maps level `i` to `cdf[i] * i`; `alpha = 0` leaves every
/// level unchanged.
pub fn equalization_curve(cdf: &[f64; LEVELS], alpha: f64) -> [f64; LEVELS] {
    let mut curve = [0.0f64; LEVELS];
    for (i, (out, &c)) in curve.iter_mut().zip(cdf.iter()).enumerate() {
        let level = i as f64;
        *out = alpha * c * level + (1.0 - alpha) * level;
    }
    curve
}

/// Equalization curves for every tile and channel of one invocation,
/// indexed `(tile, channel, level)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable {
    curves: Array3<f64>,
}

impl CurveTable {
    /// A table where every curve is the identity.
    pub fn identity(tiles: usize, channels: usize) -> Self {
        let curves = Array3::from_shape_fn((tiles, channels, LEVELS), |(_, _, i)| i as f64);
        Self { curves }
    }

    pub fn tiles(&self) -> usize {
        self.curves.dim().0
    }

    pub fn channels(&self) -> usize {
        self.curves.dim().1
    }

    pub fn curve(&self, tile: usize, channel: usize) -> ArrayView1<'_, f64> {
        self.curves.slice(ndarray::s![tile, channel, ..])
    }

    pub fn curve_mut(&mut self, tile: usize, channel: usize) -> ArrayViewMut1<'_, f64> {
        self.curves.slice_mut(ndarray::s![tile, channel, ..])
    }

    /// Replace one curve.
    pub fn set_curve(&mut self, tile: usize, channel: usize, curve: &[f64; LEVELS]) {
        for (dst, &src) in self.curve_mut(tile, channel).iter_mut().zip(curve.iter()) {
            *dst = src;
        }
    }

    /// Curve value of `tile`/`channel` at intensity `level`.
    #[inline]
    pub fn value(&self, tile: usize, channel: usize, level: u8) -> f64 {
        self.curves[[tile, channel, level as usize]]
    }
}
