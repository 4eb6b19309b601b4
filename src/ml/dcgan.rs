// ============================================================
// Layer 5 - DCGAN Generator (inference only)
// ============================================================
// The classic DCGAN generator: a stack of transposed
// convolutions that grows a 1x1 noise "image" into a picture.
//
//   z[nz,1,1]
//     → ConvT k4 s1 p0 → BN → ReLU      4x4,   ngf·8 maps
//     → ConvT k4 s2 p1 → BN → ReLU      8x8,   ngf·4
//     → ConvT k4 s2 p1 → BN → ReLU      16x16, ngf·2
//     → ConvT k4 s2 p1 → BN → ReLU      32x32, ngf
//     → ConvT k4 s2 p1 → tanh           64x64, RGB
//
// None of the transposed convolutions carry a bias; batch norm
// supplies the shift.
//
// Pretrained PyTorch weights come from an `nn.Sequential` named
// `main`, so their keys are positional (`main.3.weight`). The
// remap table below turns those into this module's field names.
// The module holds parameters only, so every record field has a
// matching tensor in the checkpoint.

use anyhow::Result;
use burn::{
    nn::{
        conv::{ConvTranspose2d, ConvTranspose2dConfig},
        BatchNorm, BatchNormConfig,
    },
    prelude::*,
    tensor::{
        activation::{relu, tanh},
        Distribution,
    },
};

use crate::data::preprocessor::PixelScaler;
use crate::domain::image::Image;
use crate::ml::convert::tensor_to_images;

#[derive(Config, Debug)]
pub struct DcganConfig {
    #[config(default = 100)]
    pub latent_dim: usize,
    /// Feature maps of the last hidden block (ngf)
    #[config(default = 64)]
    pub feature_maps: usize,
    #[config(default = 3)]
    pub channels: usize,
    /// Number of ConvT + BN + ReLU blocks before the output layer
    #[config(default = 4)]
    pub num_blocks: usize,
}

impl DcganConfig {
    /// Side length of generated images: 4 after the first block,
    /// doubled by every later block and by the output layer
    pub fn output_size(&self) -> usize {
        4 << self.num_blocks
    }

    /// Output maps of block `i`: ngf·2^(n-1-i)
    fn block_width(&self, i: usize) -> usize {
        self.feature_maps << (self.num_blocks - 1 - i)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DcganGenerator<B> {
        let mut blocks = Vec::with_capacity(self.num_blocks);
        let mut d_in = self.latent_dim;

        for i in 0..self.num_blocks {
            let d_out = self.block_width(i);
            let (stride, padding) = if i == 0 { (1, 0) } else { (2, 1) };
            blocks.push(DcganBlock {
                deconv: ConvTranspose2dConfig::new([d_in, d_out], [4, 4])
                    .with_stride([stride, stride])
                    .with_padding([padding, padding])
                    .with_bias(false)
                    .init(device),
                norm: BatchNormConfig::new(d_out).init(device),
            });
            d_in = d_out;
        }

        DcganGenerator {
            blocks,
            to_rgb: ConvTranspose2dConfig::new([d_in, self.channels], [4, 4])
                .with_stride([2, 2])
                .with_padding([1, 1])
                .with_bias(false)
                .init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct DcganBlock<B: Backend> {
    pub deconv: ConvTranspose2d<B>,
    pub norm:   BatchNorm<B, 2>,
}

impl<B: Backend> DcganBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        relu(self.norm.forward(self.deconv.forward(x)))
    }
}

#[derive(Module, Debug)]
pub struct DcganGenerator<B: Backend> {
    pub blocks: Vec<DcganBlock<B>>,
    pub to_rgb: ConvTranspose2d<B>,
}

impl<B: Backend> DcganGenerator<B> {
    /// noise: [batch, latent_dim] → images: [batch, channels, S, S] in [-1, 1]
    pub fn forward(&self, noise: Tensor<B, 2>) -> Tensor<B, 4> {
        let [n, nz] = noise.dims();
        let mut x = noise.reshape([n, nz, 1, 1]);
        for block in &self.blocks {
            x = block.forward(x);
        }
        tanh(self.to_rgb.forward(x))
    }

    /// `count` images from seeded N(0, 1) noise, rescaled to [0, 1]
    pub fn sample(
        &self,
        count:      usize,
        latent_dim: usize,
        seed:       u64,
        device:     &B::Device,
    ) -> Result<Vec<Image>> {
        B::seed(seed);
        let noise = Tensor::<B, 2>::random([count, latent_dim], Distribution::Normal(0.0, 1.0), device);

        let scaler = PixelScaler::new();
        let mut images = tensor_to_images(self.forward(noise))?;
        for img in &mut images {
            scaler.signed_image_to_unit(img);
        }
        Ok(images)
    }
}

/// Regex → replacement pairs mapping the PyTorch `main.N.` layout
/// onto this module. Applied in order, so the DataParallel prefix
/// is stripped first.
///
///   main.{3i}.    → blocks.{i}.deconv.
///   main.{3i+1}.  → blocks.{i}.norm.
///   main.{3n}.    → to_rgb.
///
/// ReLU / Tanh positions (3i+2, 3n+1) hold no parameters.
pub fn dcgan_key_remaps(num_blocks: usize) -> Vec<(String, String)> {
    let mut remaps = vec![(r"^module\.".to_string(), String::new())];
    for i in 0..num_blocks {
        remaps.push((format!(r"^main\.{}\.", 3 * i),     format!("blocks.{i}.deconv.")));
        remaps.push((format!(r"^main\.{}\.", 3 * i + 1), format!("blocks.{i}.norm.")));
    }
    remaps.push((format!(r"^main\.{}\.", 3 * num_blocks), "to_rgb.".to_string()));
    remaps
}
