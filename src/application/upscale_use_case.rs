// ============================================================
// Layer 2 - UpscaleUseCase
// ============================================================
// x4 super-resolution of a single image with ESRGAN:
//
//   Step 1: Read the input image              (Layer 6 - infra)
//   Step 2: Build RRDBNet, import weights     (Layer 5 / 6)
//   Step 3: Tiled upscale                     (Layer 5 - ml)
//   Step 4: Write result, optional comparison (Layer 6 - infra)
//
// Missing weights are not fatal: the network runs with random
// weights and the report says so.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};

use crate::data::tiler::Tiler;
use crate::domain::{image::Image, traits::ImageStore};
use crate::infra::{
    image_io::{resize_bicubic, PngStore},
    pretrained::{load_pretrained, WeightStatus},
};
use crate::ml::{
    esrgan::{esrgan_key_remaps, RrdbNetConfig},
    inferencer::{infer_device, InferBackend},
    upscaler::Upscaler,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpscaleConfig {
    pub input:       String,
    pub output:      String,
    pub weights:     Option<String>,
    /// Top-level key the weights are nested under (e.g. "params_ema")
    pub weights_key: Option<String>,
    /// Tile side in input pixels, 0 for a single pass
    pub tile:        usize,
    pub tile_pad:    usize,
    /// Where to write a [bicubic | esrgan] comparison, if anywhere
    pub compare:     Option<String>,
    pub num_blocks:  usize,
    pub num_feat:    usize,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            input:       "input.png".to_string(),
            output:      "upscaled.png".to_string(),
            weights:     None,
            weights_key: None,
            tile:        0,
            tile_pad:    10,
            compare:     None,
            num_blocks:  23,
            num_feat:    64,
        }
    }
}

#[derive(Debug)]
pub struct UpscaleReport {
    pub output:  PathBuf,
    pub weights: WeightStatus,
    pub compare: Option<PathBuf>,
    pub width:   usize,
    pub height:  usize,
}

pub struct UpscaleUseCase {
    config: UpscaleConfig,
}

impl UpscaleUseCase {
    pub fn new(config: UpscaleConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<UpscaleReport> {
        self.run::<InferBackend>(infer_device())
    }

    pub fn run<B: Backend>(&self, device: B::Device) -> Result<UpscaleReport> {
        let cfg = &self.config;
        if cfg.tile > 0 && cfg.tile_pad >= cfg.tile {
            bail!("tile pad ({}) must be smaller than the tile ({})", cfg.tile_pad, cfg.tile);
        }
        let tiler = if cfg.tile == 0 { Tiler::whole() } else { Tiler::new(cfg.tile, cfg.tile_pad) };
        let store = PngStore::new();

        // ── Step 1: Input ─────────────────────────────────────────────────────
        let image = store.load(Path::new(&cfg.input))?;
        tracing::info!("Read {}x{} image from '{}'", image.width, image.height, cfg.input);

        // ── Step 2: Model + weights ───────────────────────────────────────────
        let model = RrdbNetConfig::new()
            .with_num_blocks(cfg.num_blocks)
            .with_num_feat(cfg.num_feat)
            .init::<B>(&device);
        let (model, weights) = load_pretrained::<B, _>(
            model,
            cfg.weights.as_deref().map(Path::new),
            &esrgan_key_remaps(),
            cfg.weights_key.as_deref(),
            &device,
        );

        // ── Step 3: Upscale ───────────────────────────────────────────────────
        let upscaled = Upscaler::new(model, device).upscale(&image, &tiler)?;

        // ── Step 4: Write ─────────────────────────────────────────────────────
        let output = PathBuf::from(&cfg.output);
        store.save(&output, &upscaled)?;

        let compare = match &cfg.compare {
            Some(path) => {
                let baseline = resize_bicubic(&image, upscaled.width, upscaled.height)?;
                let strip    = Image::concat_horizontal(&[baseline, upscaled.clone()], 8)?;
                let path     = PathBuf::from(path);
                store.save(&path, &strip)?;
                tracing::info!("Comparison written to '{}'", path.display());
                Some(path)
            }
            None => None,
        };

        Ok(UpscaleReport {
            output,
            weights,
            compare,
            width:  upscaled.width,
            height: upscaled.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn write_input(dir: &Path) -> String {
        let path = dir.join("in.png");
        let data = (0..3 * 6 * 5).map(|v| (v % 11) as f32 / 10.0).collect();
        let img  = Image::from_chw(3, 6, 5, data).unwrap();
        PngStore::new().save(&path, &img).unwrap();
        path.display().to_string()
    }

    fn tiny(dir: &Path) -> UpscaleConfig {
        UpscaleConfig {
            input:      write_input(dir),
            output:     dir.join("out.png").display().to_string(),
            num_blocks: 1,
            num_feat:   4,
            ..UpscaleConfig::default()
        }
    }

    #[test]
    fn test_upscale_without_weights_still_runs() {
        let dir    = tempfile::tempdir().unwrap();
        let report = UpscaleUseCase::new(tiny(dir.path()))
            .run::<TestBackend>(Default::default())
            .unwrap();

        assert_eq!(report.weights, WeightStatus::NotRequested);
        assert_eq!((report.width, report.height), (20, 24));
        let out = PngStore::new().load(&report.output).unwrap();
        assert_eq!((out.width, out.height), (20, 24));
    }

    #[test]
    fn test_comparison_is_twice_as_wide() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = UpscaleConfig {
            compare: Some(dir.path().join("cmp.png").display().to_string()),
            tile:     4,
            tile_pad: 2,
            ..tiny(dir.path())
        };
        let report = UpscaleUseCase::new(cfg).run::<TestBackend>(Default::default()).unwrap();

        let cmp = PngStore::new().load(report.compare.as_ref().unwrap()).unwrap();
        assert_eq!((cmp.width, cmp.height), (20 * 2 + 8, 24));
    }

    #[test]
    fn test_bad_tiling_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = UpscaleConfig { tile: 4, tile_pad: 4, ..tiny(dir.path()) };
        assert!(UpscaleUseCase::new(cfg).run::<TestBackend>(Default::default()).is_err());
    }
}
