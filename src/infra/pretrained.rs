// ============================================================
// Layer 6 - Pretrained Weight Import
// ============================================================
// Loads PyTorch .pth checkpoints into burn modules via
// burn-import's PyTorchFileRecorder.
//
// Loading is best effort. The demos are meant to run even when
// the user has not downloaded any weights yet, so a missing or
// incompatible file only logs a warning and the randomly
// initialised model is returned untouched. The output will be
// noise, but every other part of the pipeline still runs.
//
// Key remapping: PyTorch names parameters after its own module
// tree. Each (regex, replacement) pair rewrites those names into
// the field paths of the burn module, in order.
//
// Reference: Burn Book §6 (Importing PyTorch models)

use std::path::{Path, PathBuf};

use burn::{
    module::Module,
    prelude::*,
    record::{FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};

/// How a best-effort load went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightStatus {
    /// Weights were read from this file
    Loaded(PathBuf),
    /// The file does not exist; random weights kept
    Missing(PathBuf),
    /// The file exists but could not be imported; random weights kept
    Failed { path: PathBuf, reason: String },
    /// No weights file was given
    NotRequested,
}

impl WeightStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, WeightStatus::Loaded(_))
    }
}

pub fn load_pretrained<B, M>(
    model:         M,
    path:          Option<&Path>,
    remaps:        &[(String, String)],
    top_level_key: Option<&str>,
    device:        &B::Device,
) -> (M, WeightStatus)
where
    B: Backend,
    M: Module<B>,
{
    let Some(path) = path else {
        tracing::warn!("No weights file given, using random initialisation");
        return (model, WeightStatus::NotRequested);
    };

    if !path.exists() {
        tracing::warn!(
            "Weights file '{}' not found, using random initialisation",
            path.display()
        );
        return (model, WeightStatus::Missing(path.to_path_buf()));
    }

    let mut args = LoadArgs::new(path.to_path_buf());
    for (pattern, replacement) in remaps {
        args = args.with_key_remap(pattern, replacement);
    }
    if let Some(key) = top_level_key {
        args = args.with_top_level_key(key);
    }

    let recorder = PyTorchFileRecorder::<FullPrecisionSettings>::default();
    let loaded: Result<M::Record, _> = Recorder::<B>::load(&recorder, args, device);
    match loaded {
        Ok(record) => {
            tracing::info!("Loaded pretrained weights from '{}'", path.display());
            (model.load_record(record), WeightStatus::Loaded(path.to_path_buf()))
        }
        Err(e) => {
            tracing::warn!(
                "Cannot import '{}' ({e}), using random initialisation",
                path.display()
            );
            let status = WeightStatus::Failed {
                path:   path.to_path_buf(),
                reason: e.to_string(),
            };
            (model, status)
        }
    }
}
