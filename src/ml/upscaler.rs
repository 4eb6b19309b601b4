// ============================================================
// Layer 5 - Tiled Super-Resolution
// ============================================================
// Runs RRDBNet over an image one tile at a time.
//
// A full-resolution pass over a large photo needs far more
// activation memory than one over a 256px patch, so the Tiler
// (data layer) cuts the input into tiles with an overlap margin:
//
//   ┌──────────────┐
//   │  outer       │   outer = inner + pad, fed to the network
//   │  ┌────────┐  │
//   │  │ inner  │  │   inner = the pixels this tile owns
//   │  └────────┘  │
//   └──────────────┘
//
// Only the upscaled inner region is kept. The margin gives the
// convolutions real context at tile edges, which hides seams.

use anyhow::{bail, Context, Result};
use burn::prelude::*;

use crate::data::tiler::Tiler;
use crate::domain::image::{Image, Rect};
use crate::ml::convert::{image_to_tensor, tensor_to_images};
use crate::ml::esrgan::{RrdbNet, SCALE};

pub struct Upscaler<B: Backend> {
    model:  RrdbNet<B>,
    device: B::Device,
}

impl<B: Backend> Upscaler<B> {
    pub fn new(model: RrdbNet<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Upscale `image` by 4. The result is exactly 4w x 4h.
    pub fn upscale(&self, image: &Image, tiler: &Tiler) -> Result<Image> {
        if image.width == 0 || image.height == 0 {
            bail!("cannot upscale an empty image");
        }
        if image.channels != 3 {
            bail!("super-resolution expects an RGB image, got {} channels", image.channels);
        }

        let tiles = tiler.plan(image.width, image.height);
        tracing::info!(
            "Upscaling {}x{} image in {} tile(s)",
            image.width, image.height, tiles.len()
        );

        let mut out = Image::new(image.channels, image.height * SCALE, image.width * SCALE);

        for (i, tile) in tiles.iter().enumerate() {
            let patch  = image.crop(tile.outer);
            let input  = image_to_tensor::<B>(&patch, &self.device);
            let output = self.model.forward(input);

            let upscaled = tensor_to_images(output)?
                .pop()
                .context("network returned an empty batch")?;

            let (dx, dy) = tile.inner_offset();
            let owned = upscaled.crop(Rect::new(
                dx * SCALE,
                dy * SCALE,
                tile.inner.width * SCALE,
                tile.inner.height * SCALE,
            ));
            out.paste(&owned, tile.inner.x * SCALE, tile.inner.y * SCALE);

            tracing::debug!("Tile {}/{} done: {:?}", i + 1, tiles.len(), tile.inner);
        }

        Ok(out)
    }
}
