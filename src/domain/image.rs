// ============================================================
// Layer 3 - Image Domain Type
// ============================================================
// A plain, framework-free image buffer.
//
// Pixels are stored planar (CHW): all of channel 0, then all of
// channel 1, and so on. This is the same layout the tensor
// framework uses for [batch, channels, height, width] tensors,
// so converting one image to or from a tensor is a straight copy.
//
// Values are nominally in [0, 1]. Model outputs in the tanh
// range are rescaled by the data layer before landing here.
//
// Layout of a 3x2 single channel image:
//   data = [p00, p01, p02,
//           p10, p11, p12]
//
// Reference: Rust Book §5 (Structs), §8 (Vectors)

use anyhow::{bail, Result};

/// An axis-aligned region of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x:      usize,
    pub y:      usize,
    pub width:  usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Planar CHW image with f32 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
    /// Invariant: data.len() == channels * height * width
    pub data:     Vec<f32>,
}

impl Image {
    /// Create a black image of the given shape
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
            data: vec![0.0; channels * height * width],
        }
    }

    /// Wrap an existing planar buffer, checking its length
    pub fn from_chw(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        let expected = channels * height * width;
        if data.len() != expected {
            bail!(
                "pixel buffer has {} values, expected {} ({}x{}x{})",
                data.len(), expected, channels, height, width
            );
        }
        Ok(Self { channels, height, width, data })
    }

    /// Build an image from interleaved HWC bytes (the layout image files use)
    pub fn from_interleaved_u8(
        channels: usize,
        height:   usize,
        width:    usize,
        bytes:    &[u8],
    ) -> Result<Self> {
        if bytes.len() != channels * height * width {
            bail!(
                "byte buffer has {} values, expected {}",
                bytes.len(),
                channels * height * width
            );
        }
        let mut img = Self::new(channels, height, width);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    let src = (y * width + x) * channels + c;
                    let dst = img.index(c, y, x);
                    img.data[dst] = bytes[src] as f32 / 255.0;
                }
            }
        }
        Ok(img)
    }

    /// Interleaved HWC bytes, clamped to [0, 1] and rounded to 0..=255
    pub fn to_interleaved_u8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for y in 0..self.height {
            for x in 0..self.width {
                for c in 0..self.channels {
                    let v = self.data[self.index(c, y, x)];
                    out.push((v.clamp(0.0, 1.0) * 255.0).round() as u8);
                }
            }
        }
        out
    }

    #[inline]
    pub fn index(&self, c: usize, y: usize, x: usize) -> usize {
        (c * self.height + y) * self.width + x
    }

    pub fn get(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[self.index(c, y, x)]
    }

    /// Copy out a region. The rect is clipped to the image first.
    pub fn crop(&self, rect: Rect) -> Image {
        let x0 = rect.x.min(self.width);
        let y0 = rect.y.min(self.height);
        let x1 = rect.right().min(self.width);
        let y1 = rect.bottom().min(self.height);

        let mut out = Image::new(self.channels, y1 - y0, x1 - x0);
        for c in 0..self.channels {
            for y in y0..y1 {
                let src = self.index(c, y, x0);
                let dst = out.index(c, y - y0, 0);
                out.data[dst..dst + (x1 - x0)].copy_from_slice(&self.data[src..src + (x1 - x0)]);
            }
        }
        out
    }

    /// Copy `src` into this image with its top-left corner at (x, y).
    /// Anything falling outside this image is dropped.
    pub fn paste(&mut self, src: &Image, x: usize, y: usize) {
        let channels = self.channels.min(src.channels);
        let w = src.width.min(self.width.saturating_sub(x));
        let h = src.height.min(self.height.saturating_sub(y));
        if w == 0 || h == 0 {
            return;
        }
        for c in 0..channels {
            for row in 0..h {
                let s = src.index(c, row, 0);
                let d = self.index(c, y + row, x);
                self.data[d..d + w].copy_from_slice(&src.data[s..s + w]);
            }
        }
    }

    /// Tile equally sized images into a grid, row-major, with `padding`
    /// black pixels between cells and around the border.
    pub fn grid(images: &[Image], cols: usize, padding: usize) -> Result<Image> {
        let first = match images.first() {
            Some(f) => f,
            None    => bail!("cannot build a grid from zero images"),
        };
        if images.iter().any(|i| i.channels != first.channels
            || i.height != first.height
            || i.width != first.width)
        {
            bail!("all grid cells must share the same shape");
        }

        let cols = cols.clamp(1, images.len());
        let rows = images.len().div_ceil(cols);
        let width  = cols * first.width + (cols + 1) * padding;
        let height = rows * first.height + (rows + 1) * padding;

        let mut out = Image::new(first.channels, height, width);
        for (i, img) in images.iter().enumerate() {
            let (r, c) = (i / cols, i % cols);
            let x = padding + c * (first.width + padding);
            let y = padding + r * (first.height + padding);
            out.paste(img, x, y);
        }
        Ok(out)
    }

    /// Lay images out left to right. Heights and channels must match;
    /// widths may differ.
    pub fn concat_horizontal(images: &[Image], padding: usize) -> Result<Image> {
        let first = match images.first() {
            Some(f) => f,
            None    => bail!("nothing to concatenate"),
        };
        if images.iter().any(|i| i.height != first.height || i.channels != first.channels) {
            bail!("side-by-side images must share height and channel count");
        }
        let width = images.iter().map(|i| i.width).sum::<usize>()
            + padding * (images.len() - 1);

        let mut out = Image::new(first.channels, first.height, width);
        let mut x = 0;
        for img in images {
            out.paste(img, x, 0);
            x += img.width + padding;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(channels: usize, h: usize, w: usize) -> Image {
        let data = (0..channels * h * w).map(|v| v as f32).collect();
        Image::from_chw(channels, h, w, data).unwrap()
    }

    #[test]
    fn test_from_chw_rejects_wrong_length() {
        assert!(Image::from_chw(3, 2, 2, vec![0.0; 11]).is_err());
    }

    #[test]
    fn test_interleaved_roundtrip_keeps_pixel_order() {
        // 1x2 RGB: red pixel then blue pixel
        let bytes = [255u8, 0, 0, 0, 0, 255];
        let img = Image::from_interleaved_u8(3, 1, 2, &bytes).unwrap();
        assert_eq!(img.get(0, 0, 0), 1.0);
        assert_eq!(img.get(2, 0, 1), 1.0);
        assert_eq!(img.get(2, 0, 0), 0.0);
        assert_eq!(img.to_interleaved_u8(), bytes.to_vec());
    }

    #[test]
    fn test_to_u8_clamps_out_of_range() {
        let img = Image::from_chw(1, 1, 3, vec![-0.5, 0.5, 1.7]).unwrap();
        assert_eq!(img.to_interleaved_u8(), vec![0, 128, 255]);
    }

    #[test]
    fn test_crop_clips_to_bounds() {
        let img = ramp(1, 4, 4);
        let c = img.crop(Rect::new(2, 3, 10, 10));
        assert_eq!((c.width, c.height), (2, 1));
        assert_eq!(c.data, vec![14.0, 15.0]);
    }

    #[test]
    fn test_paste_drops_overflow() {
        let mut dst = Image::new(1, 3, 3);
        let src = Image::from_chw(1, 2, 2, vec![1.0; 4]).unwrap();
        dst.paste(&src, 2, 2);
        assert_eq!(dst.get(0, 2, 2), 1.0);
        assert_eq!(dst.data.iter().filter(|&&v| v == 1.0).count(), 1);
    }

    #[test]
    fn test_grid_dimensions() {
        let cells: Vec<Image> = (0..5).map(|_| Image::new(1, 28, 28)).collect();
        let g = Image::grid(&cells, 4, 2).unwrap();
        // 4 columns, 2 rows
        assert_eq!(g.width,  4 * 28 + 5 * 2);
        assert_eq!(g.height, 2 * 28 + 3 * 2);
    }

    #[test]
    fn test_grid_places_cells_row_major() {
        let a = Image::from_chw(1, 1, 1, vec![0.25]).unwrap();
        let b = Image::from_chw(1, 1, 1, vec![0.75]).unwrap();
        let g = Image::grid(&[a, b.clone(), b], 2, 0).unwrap();
        assert_eq!(g.data, vec![0.25, 0.75, 0.75, 0.0]);
    }

    #[test]
    fn test_grid_rejects_mixed_shapes() {
        let cells = vec![Image::new(1, 2, 2), Image::new(1, 3, 3)];
        assert!(Image::grid(&cells, 2, 0).is_err());
        assert!(Image::grid(&[], 2, 0).is_err());
    }

    #[test]
    fn test_concat_horizontal() {
        let a = Image::new(3, 4, 2);
        let b = Image::new(3, 4, 5);
        let s = Image::concat_horizontal(&[a, b], 1).unwrap();
        assert_eq!((s.width, s.height), (8, 4));
        assert!(Image::concat_horizontal(&[Image::new(3, 4, 2), Image::new(3, 5, 2)], 0).is_err());
    }
}
