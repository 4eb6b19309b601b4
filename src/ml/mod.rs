// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Every model, loss and training routine lives here.
//
// What's in this layer:
//
//   digit_gan.rs   - MLP generator + discriminator for 28x28 digits
//   loss.rs        - BCE on logits, D and G objectives
//   loss_scaler.rs - dynamic loss scaling for f16 training
//   trainer.rs     - the adversarial training loop
//   inferencer.rs  - samples digits from a trained generator
//
//   esrgan.rs      - RRDBNet x4 super-resolution network
//   upscaler.rs    - tiled inference with RRDBNet
//   dcgan.rs       - convolutional generator, pretrained weights only
//
//   convert.rs     - domain::Image ↔ tensor
//
// The digit GAN is trained here from scratch. ESRGAN and DCGAN
// are inference only; their weights are imported by
// infra::pretrained.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Fully connected digit generator and discriminator
pub mod digit_gan;

/// Adversarial BCE losses
pub mod loss;

/// Mixed-precision loss scaling
pub mod loss_scaler;

/// Adversarial training loop with checkpointing
pub mod trainer;

/// Digit sampling and latent interpolation
pub mod inferencer;

/// RRDBNet super-resolution model
pub mod esrgan;

/// Tiled ESRGAN inference
pub mod upscaler;

/// DCGAN generator and its PyTorch key remapping
pub mod dcgan;

/// Tensor ↔ Image conversion
pub mod convert;
