// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores the digit GAN with burn's CompactRecorder.
//
// What gets saved:
//   1. Generator weights      (.mpk.gz) every epoch
//   2. Discriminator weights  (.mpk.gz) every epoch
//   3. latest_epoch.json      which epoch was last written
//   4. train_config.json      the hyper-parameters of the run
//
// The config is needed at sampling time: the generator's layer
// widths and latent size must be rebuilt exactly before the
// saved weights can be loaded into it.
//
// File layout:
//   checkpoints/
//     generator_epoch_1.mpk.gz
//     discriminator_epoch_1.mpk.gz
//     ...
//     latest_epoch.json
//     train_config.json
//     metrics.csv              ← written by MetricsLogger
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::digit_gan::{Discriminator, Generator};

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save both networks for `epoch` and move the latest pointer.
    pub fn save_models<B: Backend>(
        &self,
        generator:     &Generator<B>,
        discriminator: &Discriminator<B>,
        epoch:         usize,
    ) -> Result<()> {
        let recorder = CompactRecorder::new();

        let gen_path = self.dir.join(format!("generator_epoch_{epoch}"));
        recorder
            .record(generator.clone().into_record(), gen_path.clone())
            .with_context(|| format!("Failed to save generator to '{}'", gen_path.display()))?;

        let disc_path = self.dir.join(format!("discriminator_epoch_{epoch}"));
        recorder
            .record(discriminator.clone().into_record(), disc_path.clone())
            .with_context(|| format!("Failed to save discriminator to '{}'", disc_path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load generator weights from the latest checkpoint into `model`.
    /// `model` must have the architecture the checkpoint was saved with.
    pub fn load_generator<B: Backend>(
        &self,
        model:  Generator<B>,
        device: &B::Device,
    ) -> Result<Generator<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("generator_epoch_{epoch}"));

        tracing::info!("Loading generator from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration. Called before the first epoch.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'sample'.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    /// Epoch number of the most recent checkpoint
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot find '{}'. Have you run 'train' first?", path.display())
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
