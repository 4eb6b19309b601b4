// ============================================================
// Layer 2 - SynthesizeUseCase
// ============================================================
// Generates a grid of images with a pretrained DCGAN:
//
//   Step 1: Build generator, import + remap weights  (Layer 5 / 6)
//   Step 2: Seeded noise → images                    (Layer 5 - ml)
//   Step 3: Write the grid                           (Layer 6 - infra)

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};

use crate::domain::{image::Image, traits::ImageStore};
use crate::infra::{
    image_io::PngStore,
    pretrained::{load_pretrained, WeightStatus},
};
use crate::ml::{
    dcgan::{dcgan_key_remaps, DcganConfig},
    inferencer::{infer_device, InferBackend},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizeConfig {
    pub weights:      Option<String>,
    pub weights_key:  Option<String>,
    pub output:       String,
    pub count:        usize,
    pub seed:         u64,
    pub latent_dim:   usize,
    pub feature_maps: usize,
    pub num_blocks:   usize,
}

impl Default for SynthesizeConfig {
    fn default() -> Self {
        Self {
            weights:      None,
            weights_key:  None,
            output:       "synthesized.png".to_string(),
            count:        16,
            seed:         0,
            latent_dim:   100,
            feature_maps: 64,
            num_blocks:   4,
        }
    }
}

pub struct SynthesizeUseCase {
    config: SynthesizeConfig,
}

impl SynthesizeUseCase {
    pub fn new(config: SynthesizeConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<(PathBuf, WeightStatus)> {
        self.run::<InferBackend>(infer_device())
    }

    pub fn run<B: Backend>(&self, device: B::Device) -> Result<(PathBuf, WeightStatus)> {
        let cfg = &self.config;
        if cfg.count == 0 {
            bail!("count must be at least 1");
        }

        // ── Step 1: Generator ─────────────────────────────────────────────────
        let model_cfg = DcganConfig::new()
            .with_latent_dim(cfg.latent_dim)
            .with_feature_maps(cfg.feature_maps)
            .with_num_blocks(cfg.num_blocks);
        let (generator, status) = load_pretrained::<B, _>(
            model_cfg.init::<B>(&device),
            cfg.weights.as_deref().map(Path::new),
            &dcgan_key_remaps(cfg.num_blocks),
            cfg.weights_key.as_deref(),
            &device,
        );

        // ── Step 2: Generate ──────────────────────────────────────────────────
        tracing::info!(
            "Generating {} images of {}px",
            cfg.count,
            model_cfg.output_size()
        );
        let images = generator.sample(cfg.count, cfg.latent_dim, cfg.seed, &device)?;

        // ── Step 3: Grid ──────────────────────────────────────────────────────
        let cols = (images.len() as f64).sqrt().ceil() as usize;
        let grid = Image::grid(&images, cols, 2)?;
        let path = PathBuf::from(&cfg.output);
        PngStore::new().save(&path, &grid)?;

        Ok((path, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny(dir: &Path) -> SynthesizeConfig {
        SynthesizeConfig {
            output:       dir.join("grid.png").display().to_string(),
            count:        4,
            latent_dim:   4,
            feature_maps: 2,
            num_blocks:   2,
            ..SynthesizeConfig::default()
        }
    }

    #[test]
    fn test_grid_of_random_weight_images() {
        let dir = tempfile::tempdir().unwrap();
        let (path, status) = SynthesizeUseCase::new(tiny(dir.path()))
            .run::<TestBackend>(Default::default())
            .unwrap();

        assert_eq!(status, WeightStatus::NotRequested);
        let grid = PngStore::new().load(&path).unwrap();
        // 2x2 cells of 16px with 2px padding
        assert_eq!((grid.width, grid.height), (38, 38));
    }

    #[test]
    fn test_missing_weights_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SynthesizeConfig {
            weights: Some(dir.path().join("none.pth").display().to_string()),
            ..tiny(dir.path())
        };
        let (_, status) = SynthesizeUseCase::new(cfg).run::<TestBackend>(Default::default()).unwrap();
        assert!(matches!(status, WeightStatus::Missing(_)));
    }

    #[test]
    fn test_zero_count_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SynthesizeConfig { count: 0, ..tiny(dir.path()) };
        assert!(SynthesizeUseCase::new(cfg).run::<TestBackend>(Default::default()).is_err());
    }
}
