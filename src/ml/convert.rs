// ============================================================
// Layer 5 - Tensor ↔ Image Conversion
// ============================================================
// The only place where domain::Image meets burn tensors.
//
// Both use planar CHW order, so an image becomes a [1, C, H, W]
// tensor with a single flat copy and vice versa. Data is always
// pulled back as f32, whatever the backend's float element is.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::domain::image::Image;

/// One image → [1, C, H, W]
pub fn image_to_tensor<B: Backend>(image: &Image, device: &B::Device) -> Tensor<B, 4> {
    Tensor::<B, 4>::from_data(
        TensorData::new(image.data.clone(), [1, image.channels, image.height, image.width]),
        device,
    )
}

/// [N, C, H, W] → N images
pub fn tensor_to_images<B: Backend>(tensor: Tensor<B, 4>) -> Result<Vec<Image>> {
    let [n, c, h, w] = tensor.dims();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))?;

    values
        .chunks_exact((c * h * w).max(1))
        .take(n)
        .map(|chunk| Image::from_chw(c, h, w, chunk.to_vec()))
        .collect()
}

/// [N, side²] flattened grayscale rows → N single-channel images
pub fn flat_to_images<B: Backend>(tensor: Tensor<B, 2>, side: usize) -> Result<Vec<Image>> {
    let [n, _] = tensor.dims();
    tensor_to_images(tensor.reshape([n, 1, side, side]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_image_tensor_roundtrip_preserves_layout() {
        let device = Default::default();
        let data: Vec<f32> = (0..12).map(|v| v as f32 / 12.0).collect();
        let img = Image::from_chw(3, 2, 2, data).unwrap();

        let t = image_to_tensor::<TestBackend>(&img, &device);
        assert_eq!(t.dims(), [1, 3, 2, 2]);

        let back = tensor_to_images(t).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0], img);
    }

    #[test]
    fn test_flat_rows_become_square_images() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 2>::zeros([5, 16], &device);
        let imgs = flat_to_images(t, 4).unwrap();
        assert_eq!(imgs.len(), 5);
        assert_eq!((imgs[0].channels, imgs[0].height, imgs[0].width), (1, 4, 4));
    }
}
