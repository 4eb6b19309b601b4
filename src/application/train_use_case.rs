// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the digit GAN training pipeline in order:
//
//   Step 1: Load IDX digit files       (Layer 4 - data)
//   Step 2: Keep one class if asked    (Layer 4 - data)
//   Step 3: Seeded subset + dataset    (Layer 4 - data)
//   Step 4: Save config                (Layer 6 - infra)
//   Step 5: Run adversarial training   (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{keep_class, DigitDataset},
    mnist::IdxLoader,
    sampler::random_subset,
};
use crate::domain::traits::DigitSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{loss_scaler::Precision, trainer::train_on_gpu};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved next to the
// checkpoints so `sample` can rebuild the same generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub samples_dir:    String,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub latent_dim:     usize,
    /// Narrowest hidden layer width of both networks
    pub base_width:     usize,
    pub real_label:     f64,
    /// Write a sample grid every N epochs, 0 disables
    pub sample_every:   usize,
    pub max_samples:    Option<usize>,
    /// Train on a single digit class only
    pub digit:          Option<u8>,
    pub seed:           u64,
    pub precision:      Precision,
    pub num_workers:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data/mnist".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            samples_dir:    "samples".to_string(),
            epochs:         50,
            batch_size:     64,
            lr:             2e-4,
            latent_dim:     100,
            base_width:     256,
            real_label:     0.9,
            sample_every:   1,
            max_samples:    None,
            digit:          None,
            seed:           42,
            precision:      Precision::Full,
            num_workers:    2,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 || self.batch_size == 0 {
            bail!("epochs and batch size must both be at least 1");
        }
        if self.latent_dim == 0 || self.base_width == 0 {
            bail!("latent_dim and base_width must both be at least 1");
        }
        if !(0.0..=1.0).contains(&self.real_label) {
            bail!("real label must be in [0, 1], got {}", self.real_label);
        }
        if let Some(d) = self.digit {
            if d > 9 {
                bail!("digit filter must be 0-9, got {d}");
            }
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Build the dataset described by the config
    pub fn prepare_dataset(&self) -> Result<DigitDataset> {
        let cfg = &self.config;

        // ── Step 1: Load digits ───────────────────────────────────────────────
        tracing::info!("Loading digits from '{}'", cfg.data_dir);
        let digits = IdxLoader::new(&cfg.data_dir).load_all()?;
        tracing::info!("Loaded {} digits", digits.len());

        // ── Step 2: Single class, before the cap ──────────────────────────────
        let digits = keep_class(digits, cfg.digit);
        if digits.is_empty() {
            bail!("no training digits left after filtering (digit = {:?})", cfg.digit);
        }

        // ── Step 3: Seeded subset ─────────────────────────────────────────────
        // max_samples counts digits of the chosen class
        let digits  = random_subset(digits, cfg.max_samples, cfg.seed);
        let dataset = DigitDataset::new(digits, None);
        tracing::info!("Training on {} digits", dataset.sample_count());
        Ok(dataset)
    }

    pub fn execute(&self) -> Result<Vec<EpochMetrics>> {
        let cfg = &self.config;
        cfg.validate()?;

        let dataset = self.prepare_dataset()?;

        // ── Step 4: Save config for sampling ──────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 5: Train (Layer 5) ───────────────────────────────────────────
        train_on_gpu(cfg, dataset, &ckpt_manager, &metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mnist::write_fixture;
    use burn::data::dataset::Dataset;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_label = TrainConfig { real_label: 1.5, ..TrainConfig::default() };
        assert!(bad_label.validate().is_err());
        let bad_digit = TrainConfig { digit: Some(10), ..TrainConfig::default() };
        assert!(bad_digit.validate().is_err());
        let no_epochs = TrainConfig { epochs: 0, ..TrainConfig::default() };
        assert!(no_epochs.validate().is_err());
    }

    #[test]
    fn test_precision_serialises_lowercase() {
        let cfg  = TrainConfig { precision: Precision::Half, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"precision\":\"half\""));
    }

    #[test]
    fn test_prepare_dataset_applies_limit_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), 20, true);
        let data_dir = dir.path().display().to_string();

        let capped = TrainUseCase::new(TrainConfig {
            data_dir:    data_dir.clone(),
            max_samples: Some(7),
            ..TrainConfig::default()
        });
        assert_eq!(capped.prepare_dataset().unwrap().sample_count(), 7);

        // labels cycle 0..9, so digit 3 appears twice in 20
        let threes = TrainUseCase::new(TrainConfig {
            data_dir,
            digit: Some(3),
            ..TrainConfig::default()
        });
        assert_eq!(threes.prepare_dataset().unwrap().sample_count(), 2);
    }

    #[test]
    fn test_limit_applies_after_class_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), 100, true);

        // ten threes in the file, a cap of five must still yield five
        let uc = TrainUseCase::new(TrainConfig {
            data_dir:    dir.path().display().to_string(),
            max_samples: Some(5),
            digit:       Some(3),
            ..TrainConfig::default()
        });
        let ds = uc.prepare_dataset().unwrap();
        assert_eq!(ds.sample_count(), 5);
        assert!((0..ds.len()).all(|i| ds.get(i).unwrap().label == 3));
    }

    #[test]
    fn test_missing_data_dir_is_an_error() {
        let uc = TrainUseCase::new(TrainConfig {
            data_dir: "/definitely/not/here".to_string(),
            ..TrainConfig::default()
        });
        assert!(uc.prepare_dataset().is_err());
    }
}
