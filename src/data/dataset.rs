use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::PixelScaler;
use crate::domain::digit::DigitImage;

/// One digit ready for batching: 784 values in [-1, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitItem {
    pub pixels: Vec<f32>,
    pub label:  u8,
}

/// Drop every digit whose label is not `only_digit`. `None` keeps all.
pub fn keep_class(digits: Vec<DigitImage>, only_digit: Option<u8>) -> Vec<DigitImage> {
    match only_digit {
        Some(k) => digits.into_iter().filter(|d| d.label == k).collect(),
        None    => digits,
    }
}

pub struct DigitDataset {
    items: Vec<DigitItem>,
}

impl DigitDataset {
    /// Scale every digit into the signed range. With `only_digit`
    /// set, every other class is dropped.
    pub fn new(digits: Vec<DigitImage>, only_digit: Option<u8>) -> Self {
        let scaler = PixelScaler::new();
        let items = keep_class(digits, only_digit)
            .into_iter()
            .map(|d| DigitItem {
                pixels: scaler.bytes_to_signed(&d.pixels),
                label:  d.label,
            })
            .collect();
        Self { items }
    }

    pub fn sample_count(&self) -> usize { self.items.len() }
}

impl Dataset<DigitItem> for DigitDataset {
    fn get(&self, index: usize) -> Option<DigitItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
