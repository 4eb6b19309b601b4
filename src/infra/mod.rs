// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File formats and persistence shared by the demos:
//
//   checkpoint.rs  - saving / loading the digit GAN
//                    (CompactRecorder) plus its TrainConfig as
//                    JSON so sampling can rebuild the generator
//
//   metrics.rs     - one CSV row per training epoch
//
//   image_io.rs    - PNG / JPEG read and write, bicubic resize
//                    for the super-resolution comparison
//
//   pretrained.rs  - best-effort import of PyTorch .pth weights
//                    with key remapping
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Digit GAN checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Image files through the `image` crate
pub mod image_io;

/// PyTorch weight import for ESRGAN and DCGAN
pub mod pretrained;
