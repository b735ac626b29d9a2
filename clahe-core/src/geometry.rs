//! Tile grid geometry shared by the histogram and remapping passes.
//!
//! Tiles are `tile_length x tile_length` cells laid out row-major from the
//! top-left corner. The last column/row is clipped to the image, so every
//! pixel belongs to exactly one tile.

use crate::error::{ClaheError, ClaheResult};

/// Clamp `val` into `[low, high]` for any partially ordered type.
#[inline]
pub fn clamp<T: PartialOrd>(val: T, low: T, high: T) -> T {
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Pixel extent of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl TileRect {
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// The four tiles whose centers surround a pixel, with bilinear weights.
///
/// `tiles` is ordered top-left, top-right, bottom-left, bottom-right. At the
/// image border the clamped neighbors coincide, which reduces the blend to
/// the nearest tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighborhood {
    pub tiles: [usize; 4],
    pub dx: f64,
    pub dy: f64,
}

impl Neighborhood {
    /// Bilinearly blend four samples taken in `tiles` order.
    #[inline]
    pub fn blend(&self, [tl, tr, bl, br]: [f64; 4]) -> f64 {
        let top = (1.0 - self.dx) * tl + self.dx * tr;
        let bottom = (1.0 - self.dx) * bl + self.dx * br;
        (1.0 - self.dy) * top + self.dy * bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_length: usize,
    tiles_x: usize,
    tiles_y: usize,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, tile_length: u32) -> ClaheResult<Self> {
        if tile_length == 0 {
            return Err(ClaheError::InvalidTileLength);
        }
        if width == 0 || height == 0 {
            return Err(ClaheError::EmptyBuffer);
        }
        let (w, h, t) = (width as usize, height as usize, tile_length as usize);
        Ok(Self {
            width: w,
            height: h,
            tile_length: t,
            tiles_x: w.div_ceil(t),
            tiles_y: h.div_ceil(t),
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tiles_x(&self) -> usize {
        self.tiles_x
    }

    pub fn tiles_y(&self) -> usize {
        self.tiles_y
    }

    pub fn tile_length(&self) -> usize {
        self.tile_length
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.tiles_x * self.tiles_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.tiles_x + col
    }

    /// Extent of the tile at `(col, row)`, clipped to the image.
    pub fn tile(&self, col: usize, row: usize) -> TileRect {
        let x = col * self.tile_length;
        let y = row * self.tile_length;
        TileRect {
            x,
            y,
            width: self.tile_length.min(self.width - x),
            height: self.tile_length.min(self.height - y),
        }
    }

    /// All tiles in index order.
    pub fn tiles(&self) -> impl Iterator<Item = TileRect> + '_ {
        (0..self.tiles_y)
            .flat_map(move |row| (0..self.tiles_x).map(move |col| self.tile(col, row)))
    }

    /// Neighboring tile centers for the pixel at `(x, y)`.
    ///
    /// Grid coordinates are offset by half a tile so that interpolation is
    /// anchored on tile centers rather than corners.
    pub fn neighborhood(&self, x: usize, y: usize) -> Neighborhood {
        let t = self.tile_length as f64;
        let gx = x as f64 / t - 0.5;
        let gy = y as f64 / t - 0.5;
        let fx = gx.floor();
        let fy = gy.floor();

        let last_x = self.tiles_x as i64 - 1;
        let last_y = self.tiles_y as i64 - 1;
        let x1 = clamp(fx as i64, 0, last_x) as usize;
        let x2 = clamp(fx as i64 + 1, 0, last_x) as usize;
        let y1 = clamp(fy as i64, 0, last_y) as usize;
        let y2 = clamp(fy as i64 + 1, 0, last_y) as usize;

        Neighborhood {
            tiles: [
                self.index(x1, y1),
                self.index(x2, y1),
                self.index(x1, y2),
                self.index(x2, y2),
            ],
            dx: gx - fx,
            dy: gy - fy,
        }
    }
}
