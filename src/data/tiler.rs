// ============================================================
// Layer 4 - Image Tiler
// ============================================================
// Splits a large image into overlapping tiles for inference.
//
// Why tile at all?
//   The super-resolution network keeps 64-channel feature maps
//   at full input resolution through 23 residual blocks. A
//   1000x1000 photo would need gigabytes of activations in one
//   pass. Processing tiles keeps memory bounded.
//
// Why overlap?
//   Convolutions near a tile edge only see zero padding, which
//   leaves visible seams. Each tile is therefore run on an
//   OUTER rect (grown by `pad` on every side) but only its
//   INNER rect is kept. Inner rects partition the image exactly.
//
// Example with tile_size=4, pad=1 on a 6 wide strip:
//   inner:  [0..4)      [4..6)
//   outer:  [0..5)    [3..6)
//
// Reference: Rust Book §8 (Slices)

use crate::domain::image::Rect;

/// One unit of tiled work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// The region this tile is responsible for in the output
    pub inner: Rect,
    /// `inner` grown by the pad, clipped to the image. This is what
    /// actually goes through the network.
    pub outer: Rect,
}

impl Tile {
    /// Where `inner` starts relative to the top-left of `outer`
    pub fn inner_offset(&self) -> (usize, usize) {
        (self.inner.x - self.outer.x, self.inner.y - self.outer.y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Tiler {
    /// Side length of an inner tile. 0 disables tiling.
    tile_size: usize,
    /// Extra context pixels around each tile
    pad: usize,
}

impl Tiler {
    /// Create a new Tiler.
    ///
    /// # Panics
    /// Panics if tiling is enabled and pad >= tile_size, since the
    /// context would then be larger than the tile it surrounds.
    pub fn new(tile_size: usize, pad: usize) -> Self {
        assert!(
            tile_size == 0 || pad < tile_size,
            "tile pad ({}) must be less than tile size ({})",
            pad,
            tile_size
        );
        Self { tile_size, pad }
    }

    /// A tiler that treats the whole image as one tile
    pub fn whole() -> Self {
        Self { tile_size: 0, pad: 0 }
    }

    /// Plan tiles for an image of the given size, row-major.
    pub fn plan(&self, width: usize, height: usize) -> Vec<Tile> {
        if width == 0 || height == 0 {
            return Vec::new();
        }
        if self.tile_size == 0 {
            let all = Rect::new(0, 0, width, height);
            return vec![Tile { inner: all, outer: all }];
        }

        let mut tiles = Vec::with_capacity(self.num_tiles(width, height));
        let mut y = 0;
        while y < height {
            let h = self.tile_size.min(height - y);
            let mut x = 0;
            while x < width {
                let w = self.tile_size.min(width - x);
                let inner = Rect::new(x, y, w, h);

                let ox0 = x.saturating_sub(self.pad);
                let oy0 = y.saturating_sub(self.pad);
                let ox1 = (x + w + self.pad).min(width);
                let oy1 = (y + h + self.pad).min(height);
                let outer = Rect::new(ox0, oy0, ox1 - ox0, oy1 - oy0);

                tiles.push(Tile { inner, outer });
                x += self.tile_size;
            }
            y += self.tile_size;
        }
        tiles
    }

    /// Returns how many tiles `plan` would produce
    pub fn num_tiles(&self, width: usize, height: usize) -> usize {
        if width == 0 || height == 0 {
            return 0;
        }
        if self.tile_size == 0 {
            return 1;
        }
        width.div_ceil(self.tile_size) * height.div_ceil(self.tile_size)
    }
}
