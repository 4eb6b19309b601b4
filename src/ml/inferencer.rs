// ============================================================
// Layer 5 - Digit Sampler
// ============================================================
// Loads a trained generator and turns noise into digits.
//
// Two ways to draw:
//   sample(n)        n independent z ~ N(0, 1)
//   interpolate(k)   k points on the straight line between two
//                    random latents, endpoints included, which
//                    shows how smoothly G maps latent space
use anyhow::{bail, Result};
use burn::{
    backend::{wgpu::WgpuDevice, Wgpu},
    prelude::*,
    tensor::Distribution,
};

use crate::data::preprocessor::PixelScaler;
use crate::domain::image::Image;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::convert::flat_to_images;
use crate::ml::digit_gan::Generator;
use crate::ml::trainer::gan_config;

/// Backend used by every inference-only command
pub type InferBackend = Wgpu;

pub fn infer_device() -> WgpuDevice {
    let device = WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    device
}

pub struct DigitSampler<B: Backend> {
    generator: Generator<B>,
    device:    B::Device,
}

impl<B: Backend> DigitSampler<B> {
    pub fn new(generator: Generator<B>, device: B::Device) -> Self {
        Self { generator, device }
    }

    /// Rebuild the generator from train_config.json and load the
    /// most recent weights into it.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg       = ckpt_manager.load_config()?;
        let model_cfg = gan_config(&cfg);
        let generator = model_cfg.init_generator::<B>(&device);
        let generator = ckpt_manager.load_generator(generator, &device)?;
        tracing::info!("Generator loaded from checkpoint (latent_dim={})", model_cfg.latent_dim);
        Ok(Self { generator, device })
    }

    pub fn latent_dim(&self) -> usize {
        self.generator.latent_dim
    }

    pub fn sample(&self, n: usize, seed: u64) -> Result<Vec<Image>> {
        if n == 0 {
            bail!("sample count must be at least 1");
        }
        B::seed(seed);
        let noise = Tensor::<B, 2>::random(
            [n, self.latent_dim()],
            Distribution::Normal(0.0, 1.0),
            &self.device,
        );
        self.decode(noise)
    }

    pub fn interpolate(&self, steps: usize, seed: u64) -> Result<Vec<Image>> {
        if steps < 2 {
            bail!("interpolation needs at least 2 steps, got {steps}");
        }
        B::seed(seed);
        let shape = [1, self.latent_dim()];
        let start = Tensor::<B, 2>::random(shape, Distribution::Normal(0.0, 1.0), &self.device);
        let end   = Tensor::<B, 2>::random(shape, Distribution::Normal(0.0, 1.0), &self.device);

        let rows: Vec<Tensor<B, 2>> = (0..steps)
            .map(|i| {
                let t = i as f64 / (steps - 1) as f64;
                start.clone().mul_scalar(1.0 - t) + end.clone().mul_scalar(t)
            })
            .collect();

        self.decode(Tensor::cat(rows, 0))
    }

    fn decode(&self, noise: Tensor<B, 2>) -> Result<Vec<Image>> {
        let scaler = PixelScaler::new();
        let mut images = flat_to_images(self.generator.forward(noise), self.generator.image_size)?;
        for img in &mut images {
            scaler.signed_image_to_unit(img);
        }
        tracing::debug!("Decoded {} latent vectors", images.len());
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::digit_gan::DigitGanConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn sampler() -> DigitSampler<TestBackend> {
        let device = Default::default();
        let gen = DigitGanConfig::default()
            .with_latent_dim(6)
            .with_base_width(4)
            .init_generator::<TestBackend>(&device);
        DigitSampler::new(gen, device)
    }

    #[test]
    fn test_samples_are_unit_range_digits() {
        let imgs = sampler().sample(3, 7).unwrap();
        assert_eq!(imgs.len(), 3);
        assert_eq!((imgs[0].channels, imgs[0].height, imgs[0].width), (1, 28, 28));
        assert!(imgs.iter().flat_map(|i| &i.data).all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_interpolation_length_and_minimum() {
        let s = sampler();
        assert_eq!(s.interpolate(5, 1).unwrap().len(), 5);
        assert!(s.interpolate(1, 1).is_err());
        assert!(s.sample(0, 1).is_err());
    }

    #[test]
    fn test_from_checkpoint_uses_saved_config() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        let cfg  = TrainConfig { latent_dim: 5, base_width: 4, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();

        let device = Default::default();
        let model_cfg = gan_config(&cfg);
        let gen  = model_cfg.init_generator::<TestBackend>(&device);
        let disc = model_cfg.init_discriminator::<TestBackend>(&device);
        ckpt.save_models(&gen, &disc, 1).unwrap();

        let s = DigitSampler::<TestBackend>::from_checkpoint(&ckpt, device).unwrap();
        assert_eq!(s.latent_dim(), 5);
        assert_eq!(s.sample(2, 0).unwrap().len(), 2);
    }
}
