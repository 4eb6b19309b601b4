// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one CSV row per epoch of adversarial training.
//
// Columns:
//   epoch          1, 2, 3, ...
//   d_loss         mean discriminator loss (real + fake terms)
//   g_loss         mean generator loss
//   d_real         mean D(x) on real digits, ideally drifting toward ~0.5-0.8
//   d_fake         mean D(G(z)) before the D update
//   skipped_steps  optimiser steps dropped by the loss scaler
//   loss_scale     loss scale at the end of the epoch (1 in full precision)
//
// Reading the curves:
//   - d_loss → 0 and g_loss climbing: the discriminator has won,
//     the generator gets no useful gradient
//   - d_real ≈ d_fake ≈ 0.5: the two are in balance
//   - many skipped steps: half precision is overflowing
//
// Output file: <checkpoint-dir>/metrics.csv

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: &str = "epoch,d_loss,g_loss,d_real,d_fake,skipped_steps,loss_scale";

/// One row of metrics for a single epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:         usize,
    pub d_loss:        f64,
    pub g_loss:        f64,
    pub d_real:        f64,
    pub d_fake:        f64,
    pub skipped_steps: usize,
    pub loss_scale:    f64,
}

impl EpochMetrics {
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{:.6},{},{}",
            self.epoch,
            self.d_loss,
            self.g_loss,
            self.d_real,
            self.d_fake,
            self.skipped_steps,
            self.loss_scale,
        )
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header only if the file is new.
    /// Re-running into the same directory appends to the old log.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.to_csv_row())?;

        tracing::debug!(
            "Logged epoch {} metrics: d_loss={:.4}, g_loss={:.4}",
            m.epoch, m.d_loss, m.g_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
