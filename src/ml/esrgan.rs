// ============================================================
// Layer 5 - ESRGAN Super-Resolution Network (RRDBNet)
// ============================================================
// Upscales an RGB image by 4 with a stack of Residual-in-
// Residual Dense Blocks. Inference only: weights come from a
// pretrained PyTorch checkpoint.
//
// Building blocks, innermost first:
//
//   ResidualDenseBlock   five 3x3 convs, each seeing the block
//                        input concatenated with every earlier
//                        output (dense connections)
//                        out = conv5(...)·0.2 + x
//
//   Rrdb                 three dense blocks in a row
//                        out = rdb3(rdb2(rdb1(x)))·0.2 + x
//
//   RrdbNet              conv_first → trunk (23 RRDBs) → trunk_conv
//                        + long skip from conv_first
//                        → [nearest x2 → conv → LReLU] twice
//                        → hr_conv → LReLU → conv_last
//
// The residual scaling by 0.2 keeps a deep stack of blocks
// stable without batch norm.
//
// Reference: Wang et al. (2018) ESRGAN

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::leaky_relu,
};

/// Fixed upscaling factor: two nearest-neighbour x2 stages
pub const SCALE: usize = 4;

const NEGATIVE_SLOPE: f64 = 0.2;
const RESIDUAL_SCALE: f64 = 0.2;

#[derive(Config, Debug)]
pub struct RrdbNetConfig {
    #[config(default = 3)]
    pub in_channels: usize,
    #[config(default = 3)]
    pub out_channels: usize,
    /// Feature maps carried along the trunk
    #[config(default = 64)]
    pub num_feat: usize,
    /// Number of RRDBs in the trunk
    #[config(default = 23)]
    pub num_blocks: usize,
    /// Feature maps added by each dense-block conv
    #[config(default = 32)]
    pub growth: usize,
}

fn conv3x3<B: Backend>(d_in: usize, d_out: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([d_in, d_out], [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

impl RrdbNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> RrdbNet<B> {
        let nf = self.num_feat;
        RrdbNet {
            conv_first: conv3x3(self.in_channels, nf, device),
            trunk:      (0..self.num_blocks).map(|_| self.init_rrdb(device)).collect(),
            trunk_conv: conv3x3(nf, nf, device),
            upconv1:    conv3x3(nf, nf, device),
            upconv2:    conv3x3(nf, nf, device),
            hr_conv:    conv3x3(nf, nf, device),
            conv_last:  conv3x3(nf, self.out_channels, device),
        }
    }

    fn init_rrdb<B: Backend>(&self, device: &B::Device) -> Rrdb<B> {
        Rrdb {
            rdb1: self.init_dense_block(device),
            rdb2: self.init_dense_block(device),
            rdb3: self.init_dense_block(device),
        }
    }

    fn init_dense_block<B: Backend>(&self, device: &B::Device) -> ResidualDenseBlock<B> {
        let (nf, gc) = (self.num_feat, self.growth);
        ResidualDenseBlock {
            conv1: conv3x3(nf, gc, device),
            conv2: conv3x3(nf + gc, gc, device),
            conv3: conv3x3(nf + 2 * gc, gc, device),
            conv4: conv3x3(nf + 3 * gc, gc, device),
            conv5: conv3x3(nf + 4 * gc, nf, device),
        }
    }
}

// ─── Residual Dense Block ─────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResidualDenseBlock<B: Backend> {
    pub conv1: Conv2d<B>,
    pub conv2: Conv2d<B>,
    pub conv3: Conv2d<B>,
    pub conv4: Conv2d<B>,
    pub conv5: Conv2d<B>,
}

impl<B: Backend> ResidualDenseBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x1 = leaky_relu(self.conv1.forward(x.clone()), NEGATIVE_SLOPE);
        let x2 = leaky_relu(
            self.conv2.forward(Tensor::cat(vec![x.clone(), x1.clone()], 1)),
            NEGATIVE_SLOPE,
        );
        let x3 = leaky_relu(
            self.conv3.forward(Tensor::cat(vec![x.clone(), x1.clone(), x2.clone()], 1)),
            NEGATIVE_SLOPE,
        );
        let x4 = leaky_relu(
            self.conv4.forward(Tensor::cat(vec![x.clone(), x1.clone(), x2.clone(), x3.clone()], 1)),
            NEGATIVE_SLOPE,
        );
        let x5 = self.conv5.forward(Tensor::cat(vec![x.clone(), x1, x2, x3, x4], 1));
        x5.mul_scalar(RESIDUAL_SCALE) + x
    }
}

// ─── RRDB ─────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Rrdb<B: Backend> {
    pub rdb1: ResidualDenseBlock<B>,
    pub rdb2: ResidualDenseBlock<B>,
    pub rdb3: ResidualDenseBlock<B>,
}

impl<B: Backend> Rrdb<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.rdb1.forward(x.clone());
        let out = self.rdb2.forward(out);
        let out = self.rdb3.forward(out);
        out.mul_scalar(RESIDUAL_SCALE) + x
    }
}

// ─── Full network ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct RrdbNet<B: Backend> {
    pub conv_first: Conv2d<B>,
    pub trunk:      Vec<Rrdb<B>>,
    pub trunk_conv: Conv2d<B>,
    pub upconv1:    Conv2d<B>,
    pub upconv2:    Conv2d<B>,
    pub hr_conv:    Conv2d<B>,
    pub conv_last:  Conv2d<B>,
}

impl<B: Backend> RrdbNet<B> {
    /// [batch, C, H, W] in [0, 1] → [batch, C, 4H, 4W] clamped to [0, 1]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let feat = self.conv_first.forward(x);

        let mut trunk = feat.clone();
        for block in &self.trunk {
            trunk = block.forward(trunk);
        }
        let feat = feat + self.trunk_conv.forward(trunk);

        let feat = leaky_relu(self.upconv1.forward(upsample_nearest2x(feat)), NEGATIVE_SLOPE);
        let feat = leaky_relu(self.upconv2.forward(upsample_nearest2x(feat)), NEGATIVE_SLOPE);
        let feat = leaky_relu(self.hr_conv.forward(feat), NEGATIVE_SLOPE);

        self.conv_last.forward(feat).clamp(0.0, 1.0)
    }
}

/// Nearest-neighbour x2: every pixel becomes a 2x2 block.
///
///   [b, c, h, w] → [b, c, h, 1, w, 1] → expand [b, c, h, 2, w, 2]
///                → [b, c, 2h, 2w]
pub fn upsample_nearest2x<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [b, c, h, w] = x.dims();
    x.reshape([b, c, h, 1, w, 1])
        .expand([b, c, h, 2, w, 2])
        .reshape([b, c, h * 2, w * 2])
}

/// Regex → replacement pairs accepting both published key layouts.
///
///   original ESRGAN        BasicSR              this module
///   RRDB_trunk.N.RDBk.     body.N.rdbk.         trunk.N.rdbk.
///   trunk_conv.            conv_body.           trunk_conv.
///   upconv1. / upconv2.    conv_up1. / 2.       upconv1. / upconv2.
///   HRconv.                conv_hr.             hr_conv.
///
/// BasicSR checkpoints usually nest the weights under `params_ema`
/// or `params`; that is a top-level key, not a remap.
pub fn esrgan_key_remaps() -> Vec<(String, String)> {
    [
        (r"^module\.",           ""),
        (r"^RRDB_trunk\.",       "trunk."),
        (r"^body\.",             "trunk."),
        (r"\.RDB([123])\.",      ".rdb$1."),
        (r"^conv_body\.",        "trunk_conv."),
        (r"^conv_up([12])\.",    "upconv$1."),
        (r"^HRconv\.",           "hr_conv."),
        (r"^conv_hr\.",          "hr_conv."),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny() -> RrdbNetConfig {
        RrdbNetConfig::new().with_num_feat(4).with_growth(2).with_num_blocks(1)
    }

    #[test]
    fn test_upsample_repeats_each_pixel() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0, 3.0, 4.0], &device)
            .reshape([1, 1, 2, 2]);
        let up = upsample_nearest2x(x);
        assert_eq!(up.dims(), [1, 1, 4, 4]);
        assert_eq!(
            up.into_data().to_vec::<f32>().unwrap(),
            vec![
                1.0, 1.0, 2.0, 2.0,
                1.0, 1.0, 2.0, 2.0,
                3.0, 3.0, 4.0, 4.0,
                3.0, 3.0, 4.0, 4.0,
            ]
        );
    }

    #[test]
    fn test_forward_scales_by_four_and_clamps() {
        let device = Default::default();
        let net = tiny().init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::ones([1, 3, 5, 7], &device).mul_scalar(0.5);
        let y = net.forward(x);
        assert_eq!(y.dims(), [1, 3, 20, 28]);

        let values = y.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_dense_block_input_widths() {
        let device = Default::default();
        let net = RrdbNetConfig::new().with_num_blocks(2).init::<TestBackend>(&device);
        assert_eq!(net.trunk.len(), 2);
        // conv5 sees 64 + 4·32 input maps and returns to 64
        assert_eq!(net.trunk[0].rdb1.conv5.weight.dims(), [64, 192, 3, 3]);
    }

    #[test]
    fn test_key_remaps_cover_both_layouts() {
        let remaps = esrgan_key_remaps();
        let targets: Vec<&str> = remaps.iter().map(|(_, to)| to.as_str()).collect();
        assert!(targets.contains(&"trunk."));
        assert!(targets.contains(&"hr_conv."));
        assert_eq!(remaps.iter().filter(|(_, to)| to == "trunk.").count(), 2);
        assert_eq!(remaps.iter().filter(|(_, to)| to == "hr_conv.").count(), 2);
    }
}
