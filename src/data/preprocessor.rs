// ============================================================
// Layer 4 - Pixel Scaler
// ============================================================
// Maps pixel values between the three ranges the demos use:
//
//   raw bytes        0 ..= 255      dataset files, image files
//   unit range       [0, 1]         domain::Image, super-resolution
//   signed range     [-1, 1]        generator tanh output / GAN input
//
// The digit GAN trains in the signed range so that real images
// and tanh outputs live in the same interval; otherwise the
// discriminator could tell them apart from the range alone.

use crate::domain::image::Image;

pub struct PixelScaler;

impl PixelScaler {
    pub fn new() -> Self {
        Self
    }

    /// 0..=255 → [-1, 1]
    #[inline]
    pub fn to_signed(&self, byte: u8) -> f32 {
        byte as f32 / 127.5 - 1.0
    }

    /// [-1, 1] → [0, 1], clamping anything the generator overshoots
    #[inline]
    pub fn to_unit(&self, value: f32) -> f32 {
        ((value + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    /// Scale a whole byte buffer into the signed range
    pub fn bytes_to_signed(&self, bytes: &[u8]) -> Vec<f32> {
        bytes.iter().map(|&b| self.to_signed(b)).collect()
    }

    /// Rescale an image produced in the signed range into unit range, in place
    pub fn signed_image_to_unit(&self, image: &mut Image) {
        for v in image.data.iter_mut() {
            *v = self.to_unit(*v);
        }
    }
}

impl Default for PixelScaler {
    fn default() -> Self {
        Self::new()
    }
}
