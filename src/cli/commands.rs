// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//
//   train       train the digit GAN from scratch
//   sample      draw digits from the latest checkpoint
//   upscale     ESRGAN x4 super-resolution of one image
//   synthesize  images from a pretrained DCGAN
//
// Each Args struct converts into its application-layer config,
// so nothing below Layer 1 ever sees a clap type.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    sample_use_case::SampleConfig,
    synthesize_use_case::SynthesizeConfig,
    train_use_case::TrainConfig,
    upscale_use_case::UpscaleConfig,
};
use crate::ml::loss_scaler::Precision;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the digit GAN on IDX handwritten-digit files
    Train(TrainArgs),

    /// Generate digits with a trained generator
    Sample(SampleArgs),

    /// Upscale an image x4 with a pretrained ESRGAN
    Upscale(UpscaleArgs),

    /// Generate images with a pretrained DCGAN
    Synthesize(SynthesizeArgs),
}

// ─── train ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding train-images-idx3-ubyte (and labels)
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    /// Where checkpoints, config and metrics.csv are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Where per-epoch sample grids are written
    #[arg(long, default_value = "samples")]
    pub samples_dir: String,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Adam learning rate for both networks
    #[arg(long, default_value_t = 2e-4)]
    pub lr: f64,

    /// Size of the generator's noise vector
    #[arg(long, default_value_t = 100)]
    pub latent_dim: usize,

    /// Narrowest hidden layer; the others are 2x and 4x this
    #[arg(long, default_value_t = 256)]
    pub base_width: usize,

    /// Discriminator target for real digits. Below 1.0 smooths labels
    #[arg(long, default_value_t = 0.9)]
    pub real_label: f64,

    /// Write a sample grid every N epochs (0 = never)
    #[arg(long, default_value_t = 1)]
    pub sample_every: usize,

    /// Train on a random subset of at most this many digits
    #[arg(long)]
    pub max_samples: Option<usize>,

    /// Train on a single digit class (0-9)
    #[arg(long)]
    pub digit: Option<u8>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// f32 training, or f16 with dynamic loss scaling
    #[arg(long, value_enum, default_value_t = Precision::Full)]
    pub precision: Precision,

    /// Data loader worker threads
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            samples_dir:    a.samples_dir,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
            latent_dim:     a.latent_dim,
            base_width:     a.base_width,
            real_label:     a.real_label,
            sample_every:   a.sample_every,
            max_samples:    a.max_samples,
            digit:          a.digit,
            seed:           a.seed,
            precision:      a.precision,
            num_workers:    a.num_workers,
        }
    }
}

// ─── sample ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Directory the `train` command wrote to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "samples/digits.png")]
    pub output: String,

    /// Number of digits in the grid
    #[arg(long, default_value_t = 16)]
    pub count: usize,

    /// Walk N steps between two latents instead of sampling a grid
    #[arg(long)]
    pub interpolate: Option<usize>,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl From<SampleArgs> for SampleConfig {
    fn from(a: SampleArgs) -> Self {
        SampleConfig {
            checkpoint_dir: a.checkpoint_dir,
            output:         a.output,
            count:          a.count,
            interpolate:    a.interpolate,
            seed:           a.seed,
        }
    }
}

// ─── upscale ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct UpscaleArgs {
    /// Image to upscale (PNG or JPEG)
    #[arg(long)]
    pub input: String,

    #[arg(long, default_value = "upscaled.png")]
    pub output: String,

    /// PyTorch RRDBNet weights (.pth). Random weights if absent
    #[arg(long)]
    pub weights: Option<String>,

    /// Key the state dict is nested under, e.g. params_ema
    #[arg(long)]
    pub weights_key: Option<String>,

    /// Tile size in input pixels (0 = whole image at once)
    #[arg(long, default_value_t = 0)]
    pub tile: usize,

    /// Overlap added around each tile
    #[arg(long, default_value_t = 10)]
    pub tile_pad: usize,

    /// Also write a [bicubic | esrgan] comparison to this path
    #[arg(long)]
    pub compare: Option<String>,

    /// RRDB blocks in the trunk; must match the weights
    #[arg(long, default_value_t = 23)]
    pub num_blocks: usize,

    /// Trunk feature maps; must match the weights
    #[arg(long, default_value_t = 64)]
    pub num_feat: usize,
}

impl From<UpscaleArgs> for UpscaleConfig {
    fn from(a: UpscaleArgs) -> Self {
        UpscaleConfig {
            input:       a.input,
            output:      a.output,
            weights:     a.weights,
            weights_key: a.weights_key,
            tile:        a.tile,
            tile_pad:    a.tile_pad,
            compare:     a.compare,
            num_blocks:  a.num_blocks,
            num_feat:    a.num_feat,
        }
    }
}

// ─── synthesize ───────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// PyTorch DCGAN generator weights (.pth). Random weights if absent
    #[arg(long)]
    pub weights: Option<String>,

    /// Key the state dict is nested under, if any
    #[arg(long)]
    pub weights_key: Option<String>,

    #[arg(long, default_value = "synthesized.png")]
    pub output: String,

    #[arg(long, default_value_t = 16)]
    pub count: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl From<SynthesizeArgs> for SynthesizeConfig {
    fn from(a: SynthesizeArgs) -> Self {
        SynthesizeConfig {
            weights:     a.weights,
            weights_key: a.weights_key,
            output:      a.output,
            count:       a.count,
            seed:        a.seed,
            ..SynthesizeConfig::default()
        }
    }
}
