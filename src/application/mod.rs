// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// One use case per CLI command. Each one only coordinates the
// other layers:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No file formats here (that's Layer 4 and 6)
//
// Every inference use case has an `execute()` bound to the GPU
// backend and a generic `run::<B>()` underneath it, so tests
// drive the same workflow on the CPU backend.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Digit GAN training
pub mod train_use_case;

// Digit sampling from a trained checkpoint
pub mod sample_use_case;

// ESRGAN x4 super-resolution
pub mod upscale_use_case;

// Pretrained DCGAN synthesis
pub mod synthesize_use_case;
