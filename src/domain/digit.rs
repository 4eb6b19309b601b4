// ============================================================
// Layer 3 - DigitImage Domain Type
// ============================================================
// One handwritten digit exactly as it comes out of the dataset
// files: a class label and raw 8-bit grayscale pixels.
//
// Scaling into the generator's tanh range happens later in the
// data layer, so this type stays a faithful copy of the source.

use serde::{Deserialize, Serialize};

/// Side length of a dataset digit in pixels
pub const DIGIT_SIDE: usize = 28;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitImage {
    /// The digit class 0-9 (0 when the labels file is absent)
    pub label: u8,

    /// Row-major grayscale pixels, 0 = background, 255 = ink
    pub pixels: Vec<u8>,
}

impl DigitImage {
    pub fn new(label: u8, pixels: Vec<u8>) -> Self {
        Self { label, pixels }
    }

    /// Fraction of pixels carrying any ink. A dataset with none at
    /// all means a bad parse.
    pub fn ink_ratio(&self) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        self.pixels.iter().filter(|&&p| p > 0).count() as f32 / self.pixels.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ink_ratio() {
        let d = DigitImage::new(7, vec![0, 0, 255, 12]);
        assert!((d.ink_ratio() - 0.5).abs() < 1e-6);
        assert_eq!(DigitImage::new(0, Vec::new()).ink_ratio(), 0.0);
    }
}
