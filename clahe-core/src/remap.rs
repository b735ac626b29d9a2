//! Interpolated remapping of every pixel through the tile curves.

use crate::curve::CurveTable;
use crate::geometry::{clamp, TileGrid};

/// Rewrite `data` in place by blending the curves of the four tiles around
/// each pixel, then damping the result toward the original value by
/// `smoothing`.
///
/// Every sample is computed from its own original value only, so writing
/// back pixel by pixel never feeds an already-equalized value into another
/// pixel.
pub fn remap(
    data: &mut [u8],
    grid: &TileGrid,
    channels: usize,
    curves: &CurveTable,
    smoothing: f64,
) {
    debug_assert_eq!(data.len(), grid.width() * grid.height() * channels);
    debug_assert_eq!(curves.tiles(), grid.len());
    debug_assert_eq!(curves.channels(), channels);

    let row_len = grid.width() * channels;
    for (y, row) in data.chunks_exact_mut(row_len).enumerate() {
        for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
            let n = grid.neighborhood(x, y);
            let [tl, tr, bl, br] = n.tiles;
            for (c, sample) in pixel.iter_mut().enumerate() {
                let original = *sample;
                let interpolated = n.blend([
                    curves.value(tl, c, original),
                    curves.value(tr, c, original),
                    curves.value(bl, c, original),
                    curves.value(br, c, original),
                ]);
                let damped = (1.0 - smoothing) * interpolated + smoothing * original as f64;
                *sample = clamp(damped, 0.0, 255.0).round() as u8;
            }
        }
    }
}
