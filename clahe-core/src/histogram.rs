//! Per-tile histograms with excess clipping and even redistribution.

use crate::geometry::TileRect;

/// Number of intensity levels for 8-bit samples.
pub const LEVELS: usize = 256;

/// Smallest clip limit allowed when clipping is enabled.
pub const MIN_CLIP_LIMIT: u32 = 4;

pub type Histogram = [u32; LEVELS];

/// Histograms of one tile, one per channel, before or after redistribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileHistograms {
    pub channels: Vec<Histogram>,
    /// Samples diverted from a full bin, per channel.
    pub excess: Vec<u32>,
    pub pixel_count: u32,
}

impl TileHistograms {
    /// Spread every channel's excess back over its bins.
    pub fn redistribute(&mut self) {
        for (hist, excess) in self.channels.iter_mut().zip(self.excess.iter_mut()) {
            redistribute_excess(hist, *excess);
            *excess = 0;
        }
    }
}

/// Maximum count a single bin may reach before samples become excess.
///
/// `clip_factor <= 0` disables clipping by allowing a full tile in one bin.
pub fn clip_limit(tile_length: u32, clip_factor: f64) -> u32 {
    let area = tile_length as u64 * tile_length as u64;
    let limit = if clip_factor > 0.0 {
        ((area as f64 / clip_factor) as u64).max(MIN_CLIP_LIMIT as u64)
    } else {
        area
    };
    limit.min(u32::MAX as u64) as u32
}

/// Accumulate the clipped histograms of one tile.
///
/// `data` is the full row-major, channel-interleaved image with rows of
/// `width` pixels.
pub fn build_tile_histograms(
    data: &[u8],
    width: usize,
    channels: usize,
    rect: TileRect,
    clip_limit: u32,
) -> TileHistograms {
    let mut hists = vec![[0u32; LEVELS]; channels];
    let mut excess = vec![0u32; channels];

    for y in rect.y..rect.y + rect.height {
        let row_start = (y * width + rect.x) * channels;
        let row = &data[row_start..row_start + rect.width * channels];
        for pixel in row.chunks_exact(channels) {
            for (c, &value) in pixel.iter().enumerate() {
                let bin = &mut hists[c][value as usize];
                if *bin < clip_limit {
                    *bin += 1;
                } else {
                    excess[c] += 1;
                }
            }
        }
    }

    TileHistograms {
        channels: hists,
        excess,
        pixel_count: rect.pixel_count() as u32,
    }
}

/// Add `excess` samples back across all bins as evenly as possible.
///
/// A fractional carry decides each bin's whole-number share, so the total
/// added is exactly `excess` with no drift toward either end.
pub fn redistribute_excess(hist: &mut Histogram, excess: u32) {
    if excess == 0 {
        return;
    }
    let add = excess as f64 / LEVELS as f64;
    let mut acc = 0.0f64;
    for bin in hist.iter_mut() {
        acc += add;
        let inc = (acc + 0.5).floor();
        *bin += inc as u32;
        acc -= inc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_rect(width: usize, height: usize) -> TileRect {
        TileRect {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn test_clip_limit() {
        assert_eq!(clip_limit(32, 10.0), 102);
        assert_eq!(clip_limit(8, 100.0), MIN_CLIP_LIMIT);
        assert_eq!(clip_limit(32, 0.0), 1024);
        assert_eq!(clip_limit(32, -1.0), 1024);
    }

    #[test]
    fn test_histogram_respects_clip_limit() {
        let data = vec![7u8; 16 * 16];
        let h = build_tile_histograms(&data, 16, 1, full_rect(16, 16), 10);
        assert_eq!(h.channels[0][7], 10);
        assert_eq!(h.excess[0], 246);
        assert!(h.channels[0].iter().all(|&b| b <= 10));
    }

    #[test]
    fn test_histogram_channels_are_independent() {
        // 2x2 RGB, red constant, green ramps
        let data = vec![10, 0, 5, 10, 1, 5, 10, 2, 5, 10, 3, 5];
        let h = build_tile_histograms(&data, 2, 3, full_rect(2, 2), 1000);
        assert_eq!(h.channels[0][10], 4);
        assert_eq!(&h.channels[1][0..4], &[1, 1, 1, 1]);
        assert_eq!(h.channels[2][5], 4);
        assert_eq!(h.pixel_count, 4);
    }

    #[test]
    fn test_histogram_reads_only_its_tile() {
        // 4x2 gray image, right half is a different tile
        let data = vec![1, 1, 9, 9, 1, 1, 9, 9];
        let rect = TileRect {
            x: 2,
            y: 0,
            width: 2,
            height: 2,
        };
        let h = build_tile_histograms(&data, 4, 1, rect, 100);
        assert_eq!(h.channels[0][9], 4);
        assert_eq!(h.channels[0][1], 0);
    }

    #[test]
    fn test_redistribution_conserves_mass() {
        for excess in [0u32, 1, 100, 255, 256, 257, 1000, 12345] {
            let mut hist = [0u32; LEVELS];
            redistribute_excess(&mut hist, excess);
            assert_eq!(hist.iter().sum::<u32>(), excess, "excess = {}", excess);
        }
    }

    #[test]
    fn test_redistribution_is_even() {
        let mut hist = [0u32; LEVELS];
        redistribute_excess(&mut hist, 1000);
        let min = *hist.iter().min().unwrap();
        let max = *hist.iter().max().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn test_tile_mass_after_redistribution() {
        let data: Vec<u8> = (0..40 * 24).map(|i| (i % 3) as u8 * 50).collect();
        let mut h = build_tile_histograms(&data, 40, 1, full_rect(40, 24), 8);
        h.redistribute();
        assert_eq!(h.channels[0].iter().sum::<u32>(), h.pixel_count);
        assert_eq!(h.excess[0], 0);
    }
}
