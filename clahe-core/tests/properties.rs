//! End-to-end behavior of the CLAHE transform on raw buffers.

use clahe_core::{
    build_tile_histograms, clahe, clip_limit, cumulative_distribution, transform, ClaheError,
    ClaheParams, PixelBuffer, TileGrid,
};

/// Deterministic pseudo-random samples (LCG) so tests need no rand crate.
fn noise(width: u32, height: u32, channels: u8, seed: u32) -> PixelBuffer {
    let mut state = seed;
    let data = (0..width as usize * height as usize * channels as usize)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();
    PixelBuffer::from_raw(width, height, channels, data).unwrap()
}

/// Dark image with a narrow intensity range, the case CLAHE is meant for.
fn low_contrast(width: u32, height: u32) -> PixelBuffer {
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| 60 + ((x / 3 + y / 5) % 20) as u8))
        .collect();
    PixelBuffer::from_raw(width, height, 1, data).unwrap()
}

#[test]
fn shape_is_preserved() {
    for channels in 1..=3 {
        let mut buf = noise(77, 41, channels, 7);
        transform(&mut buf, 16, 8.0, 0.7).unwrap();
        assert_eq!(buf.dimensions(), (77, 41));
        assert_eq!(buf.channels(), channels);
        assert_eq!(buf.as_raw().len(), 77 * 41 * channels as usize);
    }
}

#[test]
fn histogram_mass_is_conserved_per_tile() {
    let buf = noise(100, 70, 3, 11);
    let grid = TileGrid::new(100, 70, 32).unwrap();
    let limit = clip_limit(32, 12.0);
    for rect in grid.tiles() {
        let mut hists = build_tile_histograms(buf.as_raw(), 100, 3, rect, limit);
        for hist in &hists.channels {
            assert!(hist.iter().all(|&b| b <= limit));
        }
        hists.redistribute();
        for hist in &hists.channels {
            assert_eq!(hist.iter().sum::<u32>(), rect.pixel_count() as u32);
        }
    }
}

#[test]
fn cumulative_distribution_ends_at_one_for_every_tile() {
    let buf = noise(90, 50, 1, 3);
    let grid = TileGrid::new(90, 50, 20).unwrap();
    let limit = clip_limit(20, 5.0);
    for rect in grid.tiles() {
        let mut hists = build_tile_histograms(buf.as_raw(), 90, 1, rect, limit);
        hists.redistribute();
        let cdf = cumulative_distribution(&hists.channels[0], hists.pixel_count);
        assert!(cdf.windows(2).all(|w| w[1] >= w[0]));
        assert!((cdf[255] - 1.0).abs() < 1e-6);
    }
}

#[test]
fn zero_blend_returns_input_exactly() {
    for channels in 1..=3 {
        let original = noise(64, 48, channels, 21);
        let mut buf = original.clone();
        transform(&mut buf, 16, 10.0, 0.0).unwrap();
        assert_eq!(buf, original);
    }
}

#[test]
fn output_is_deterministic() {
    let original = noise(123, 77, 3, 5);
    let mut a = original.clone();
    let mut b = original.clone();
    let params = ClaheParams::strong();
    clahe(&mut a, &params).unwrap();
    clahe(&mut b, &params).unwrap();
    assert_eq!(a, b);
}

#[test]
fn non_divisible_dimensions_complete() {
    // 33x17 with tile 8 leaves 1-pixel-wide and 1-pixel-tall edge tiles
    let grid = TileGrid::new(33, 17, 8).unwrap();
    assert_eq!((grid.tiles_x(), grid.tiles_y()), (5, 3));
    assert_eq!(grid.tile(4, 2).pixel_count(), 1);

    let mut buf = noise(33, 17, 2, 9);
    transform(&mut buf, 8, 4.0, 1.0).unwrap();
    assert_eq!(buf.as_raw().len(), 33 * 17 * 2);
}

#[test]
fn tile_larger_than_image() {
    let mut buf = noise(10, 6, 3, 1);
    transform(&mut buf, 256, 10.0, 1.0).unwrap();
    assert_eq!(buf.dimensions(), (10, 6));
}

#[test]
fn single_pixel_image() {
    let mut buf = PixelBuffer::filled(1, 1, 3, 200);
    transform(&mut buf, 1, 10.0, 1.0).unwrap();
    // One sample per tile: its bin holds the whole tile so cdf[200] = 1
    assert_eq!(buf.as_raw(), &[200, 200, 200]);
}

#[test]
fn failures_leave_buffer_untouched() {
    let original = noise(8, 8, 4, 2);
    let mut buf = original.clone();
    assert!(matches!(
        transform(&mut buf, 4, 10.0, 1.0),
        Err(ClaheError::UnsupportedChannels(4))
    ));
    assert_eq!(buf, original);

    let mut empty = PixelBuffer::from_raw(0, 5, 1, Vec::new()).unwrap();
    assert!(matches!(
        transform(&mut empty, 4, 10.0, 1.0),
        Err(ClaheError::EmptyBuffer)
    ));
}

#[test]
fn uniform_gray_without_clipping_is_unchanged() {
    let mut buf = PixelBuffer::filled(64, 64, 1, 128);
    transform(&mut buf, 32, 0.0, 1.0).unwrap();
    assert!(buf.as_raw().iter().all(|&v| v == 128));
}

#[test]
fn classic_preset_matches_unsmoothed_full_blend() {
    let original = noise(40, 40, 1, 13);
    let mut a = original.clone();
    let mut b = original.clone();
    clahe(&mut a, &ClaheParams::classic()).unwrap();
    clahe(&mut b, &ClaheParams::new(32, 10.0, 1.0).with_smoothing(0.0)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn equalization_spreads_a_narrow_range() {
    let original = low_contrast(128, 96);
    let mut buf = original.clone();
    transform(&mut buf, 32, 0.0, 1.0).unwrap();

    // cdf[i] * i never exceeds i, and the brightest level of each tile
    // keeps its value, so the output range widens downward.
    let min_in = *original.as_raw().iter().min().unwrap();
    let min_out = *buf.as_raw().iter().min().unwrap();
    let max_in = *original.as_raw().iter().max().unwrap();
    let max_out = *buf.as_raw().iter().max().unwrap();
    assert!(min_out < min_in);
    assert!(max_out <= max_in);
    assert!(max_out - min_out > max_in - min_in);
}
