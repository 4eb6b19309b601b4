// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between files on disk and tensors on the device.
//
// Digit GAN training flows like this:
//
//   IDX files
//       │
//       ▼
//   IdxLoader      → parses images + labels into DigitImage
//       │
//       ▼
//   random_subset  → seeded shuffle, optional size cap
//       │
//       ▼
//   DigitDataset   → scales pixels to [-1, 1], burn Dataset
//       │
//       ▼
//   DigitBatcher   → stacks items into [batch, 784] tensors
//       │
//       ▼
//   DataLoader     → feeds the adversarial training loop
//
// The super-resolution demo only needs the Tiler, which plans
// overlapping tiles so large images fit in memory.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the raw IDX digit files
pub mod mnist;

/// Converts pixel values between byte, unit and signed ranges
pub mod preprocessor;

/// Seeded shuffle + truncate
pub mod sampler;

/// burn Dataset over scaled digits
pub mod dataset;

/// burn Batcher producing flattened digit tensors
pub mod batcher;

/// Overlapping tile planner for large-image inference
pub mod tiler;
