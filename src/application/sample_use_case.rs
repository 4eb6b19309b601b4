// ============================================================
// Layer 2 - SampleUseCase
// ============================================================
// Draws digits from the most recent training checkpoint:
//
//   Step 1: Rebuild generator from checkpoint   (Layer 5 - ml)
//   Step 2: Sample a grid or an interpolation   (Layer 5 - ml)
//   Step 3: Lay out and write the image         (Layer 3 / 6)

use std::path::{Path, PathBuf};

use anyhow::Result;
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};

use crate::domain::{image::Image, traits::ImageStore};
use crate::infra::{checkpoint::CheckpointManager, image_io::PngStore};
use crate::ml::inferencer::{infer_device, DigitSampler, InferBackend};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    pub checkpoint_dir: String,
    pub output:         String,
    pub count:          usize,
    /// Number of interpolation steps; replaces the random grid when set
    pub interpolate:    Option<usize>,
    pub seed:           u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            output:         "samples/digits.png".to_string(),
            count:          16,
            interpolate:    None,
            seed:           0,
        }
    }
}

pub struct SampleUseCase {
    config: SampleConfig,
}

impl SampleUseCase {
    pub fn new(config: SampleConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PathBuf> {
        self.run::<InferBackend>(infer_device())
    }

    pub fn run<B: Backend>(&self, device: B::Device) -> Result<PathBuf> {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        // ── Step 1: Generator ─────────────────────────────────────────────────
        let sampler = DigitSampler::<B>::from_checkpoint(&ckpt, device)?;

        // ── Step 2 + 3: Draw and lay out ──────────────────────────────────────
        let image = match cfg.interpolate {
            Some(steps) => {
                tracing::info!("Interpolating {} steps between two latents", steps);
                Image::concat_horizontal(&sampler.interpolate(steps, cfg.seed)?, 2)?
            }
            None => {
                tracing::info!("Sampling {} digits", cfg.count);
                let digits = sampler.sample(cfg.count, cfg.seed)?;
                let cols   = (digits.len() as f64).sqrt().ceil() as usize;
                Image::grid(&digits, cols, 2)?
            }
        };

        let path = Path::new(&cfg.output).to_path_buf();
        PngStore::new().save(&path, &image)?;
        Ok(path)
    }
}
