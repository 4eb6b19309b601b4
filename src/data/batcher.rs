// ============================================================
// Layer 4 - Digit Batcher
// ============================================================
// Implements burn's Batcher trait: stacks a Vec<DigitItem> into
// one [batch_size, 784] float tensor.
//
// The discriminator is an MLP, so digits stay flattened here.
// Each row is one digit in row-major pixel order.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::DigitItem;

/// A batch of real digits for one discriminator update.
#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// Shape: [batch_size, 784], values in [-1, 1]
    pub images: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct DigitBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> DigitBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<DigitItem, DigitBatch<B>> for DigitBatcher<B> {
    fn batch(&self, items: Vec<DigitItem>) -> DigitBatch<B> {
        let batch_size = items.len();
        let pixels     = items.first().map_or(0, |i| i.pixels.len());

        // Vec<Vec<f32>> → one flat row-major buffer
        let flat: Vec<f32> = items
            .into_iter()
            .flat_map(|item| item.pixels)
            .collect();

        let images = Tensor::<B, 2>::from_data(
            TensorData::new(flat, [batch_size, pixels]),
            &self.device,
        );

        DigitBatch { images }
    }
}
