// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, never to
// the concrete file formats behind them:
//   - IdxLoader  implements DigitSource (raw IDX dataset files)
//   - PngStore   implements ImageStore  (image crate backed files)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use anyhow::Result;

use crate::domain::{digit::DigitImage, image::Image};

// ─── DigitSource ──────────────────────────────────────────────────────────────
/// Anything that can hand over the full set of training digits.
pub trait DigitSource {
    fn load_all(&self) -> Result<Vec<DigitImage>>;
}

// ─── ImageStore ───────────────────────────────────────────────────────────────
/// Reads and writes images on disk.
///
/// `load` always yields a 3-channel RGB image in [0, 1].
/// `save` accepts 1-channel (written as grayscale) or 3-channel images.
pub trait ImageStore {
    fn load(&self, path: &Path) -> Result<Image>;

    fn save(&self, path: &Path, image: &Image) -> Result<()>;
}
