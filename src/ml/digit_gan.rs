// ============================================================
// Layer 5 - Digit GAN Models
// ============================================================
// A fully connected generator / discriminator pair for 28x28
// digits, trained from scratch.
//
//   Generator      z[100] → 256 → 512 → 1024 → 784 → tanh
//   Discriminator  x[784] → 1024 → 512 → 256 → 1 (logit)
//
// Hidden layers use LeakyReLU(0.2). The discriminator also
// applies dropout after each hidden layer so it does not
// overpower the generator early in training.
//
// The discriminator returns a raw logit; the sigmoid lives in
// the loss (see loss.rs) where it can be fused into a stable
// log-sigmoid.

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{leaky_relu, tanh},
};

use crate::domain::digit::DIGIT_SIDE;

#[derive(Config, Debug)]
pub struct DigitGanConfig {
    /// Size of the noise vector fed to the generator
    #[config(default = 100)]
    pub latent_dim: usize,
    /// Side length of a square grayscale image
    #[config(default = 28)]
    pub image_size: usize,
    /// Width of the narrowest hidden layer; each further layer doubles it
    #[config(default = 256)]
    pub base_width: usize,
    /// Number of hidden layers in each network
    #[config(default = 3)]
    pub depth: usize,
    #[config(default = 0.2)]
    pub negative_slope: f64,
    /// Discriminator dropout probability
    #[config(default = 0.3)]
    pub dropout: f64,
}

impl Default for DigitGanConfig {
    fn default() -> Self {
        Self::new().with_image_size(DIGIT_SIDE)
    }
}

impl DigitGanConfig {
    pub fn pixels(&self) -> usize {
        self.image_size * self.image_size
    }

    /// Hidden widths from narrowest to widest: 256, 512, 1024
    pub fn hidden_widths(&self) -> Vec<usize> {
        (0..self.depth).map(|i| self.base_width << i).collect()
    }

    pub fn init_generator<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        let mut layers = Vec::with_capacity(self.depth);
        let mut d_in = self.latent_dim;
        for width in self.hidden_widths() {
            layers.push(LinearConfig::new(d_in, width).init(device));
            d_in = width;
        }
        Generator {
            hidden:         layers,
            output:         LinearConfig::new(d_in, self.pixels()).init(device),
            negative_slope: self.negative_slope,
            latent_dim:     self.latent_dim,
            image_size:     self.image_size,
        }
    }

    pub fn init_discriminator<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        let mut layers = Vec::with_capacity(self.depth);
        let mut d_in = self.pixels();
        for width in self.hidden_widths().into_iter().rev() {
            layers.push(LinearConfig::new(d_in, width).init(device));
            d_in = width;
        }
        Discriminator {
            hidden:         layers,
            output:         LinearConfig::new(d_in, 1).init(device),
            dropout:        DropoutConfig::new(self.dropout).init(),
            negative_slope: self.negative_slope,
        }
    }
}

#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    pub hidden:         Vec<Linear<B>>,
    pub output:         Linear<B>,
    pub negative_slope: f64,
    pub latent_dim:     usize,
    pub image_size:     usize,
}

impl<B: Backend> Generator<B> {
    /// noise: [batch, latent_dim] → images: [batch, image_size²] in [-1, 1]
    pub fn forward(&self, noise: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = noise;
        for layer in &self.hidden {
            x = leaky_relu(layer.forward(x), self.negative_slope);
        }
        tanh(self.output.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    pub hidden:         Vec<Linear<B>>,
    pub output:         Linear<B>,
    pub dropout:        Dropout,
    pub negative_slope: f64,
}

impl<B: Backend> Discriminator<B> {
    /// images: [batch, pixels] → logits: [batch, 1]
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = images;
        for layer in &self.hidden {
            x = self.dropout.forward(leaky_relu(layer.forward(x), self.negative_slope));
        }
        self.output.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_hidden_widths_double() {
        let cfg = DigitGanConfig::default();
        assert_eq!(cfg.hidden_widths(), vec![256, 512, 1024]);
        assert_eq!(cfg.pixels(), 784);
    }

    #[test]
    fn test_generator_output_shape_and_range() {
        let device = Default::default();
        let cfg = DigitGanConfig::default().with_base_width(16).with_depth(2);
        let gen = cfg.init_generator::<TestBackend>(&device);

        let z = Tensor::<TestBackend, 2>::random([4, cfg.latent_dim], Distribution::Normal(0.0, 1.0), &device);
        let out = gen.forward(z);
        assert_eq!(out.dims(), [4, 784]);

        let values = out.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_discriminator_emits_one_logit_per_image() {
        let device = Default::default();
        let cfg = DigitGanConfig::default().with_base_width(8);
        let disc = cfg.init_discriminator::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 2>::zeros([3, 784], &device);
        assert_eq!(disc.forward(x).dims(), [3, 1]);
        // widest layer first on the discriminator side
        assert_eq!(disc.hidden.len(), 3);
    }
}
