// ============================================================
// Layer 6 - Image Files
// ============================================================
// Reads and writes images through the `image` crate.
//
// Everything is converted at the boundary:
//   file → RGB8 → domain::Image (planar, [0, 1])
//   domain::Image → GRAY8 / RGB8 → file (format from extension)
//
// Only 1- and 3-channel images can be written; these are the
// only shapes any of the demos produce.

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, GrayImage, RgbImage};

use crate::domain::{image::Image, traits::ImageStore};

#[derive(Debug, Default, Clone, Copy)]
pub struct PngStore;

impl PngStore {
    pub fn new() -> Self {
        Self
    }
}

impl ImageStore for PngStore {
    fn load(&self, path: &Path) -> Result<Image> {
        let rgb = image::open(path)
            .with_context(|| format!("Cannot open image '{}'", path.display()))?
            .to_rgb8();
        let (w, h) = rgb.dimensions();
        Image::from_interleaved_u8(3, h as usize, w as usize, rgb.as_raw())
    }

    fn save(&self, path: &Path, image: &Image) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create '{}'", parent.display()))?;
            }
        }

        let (w, h) = (image.width as u32, image.height as u32);
        let bytes  = image.to_interleaved_u8();

        match image.channels {
            1 => GrayImage::from_raw(w, h, bytes)
                .context("grayscale buffer does not match its dimensions")?
                .save(path),
            3 => RgbImage::from_raw(w, h, bytes)
                .context("RGB buffer does not match its dimensions")?
                .save(path),
            n => bail!("cannot write a {n}-channel image"),
        }
        .with_context(|| format!("Cannot write image '{}'", path.display()))?;

        tracing::debug!("Wrote {}x{} image to '{}'", w, h, path.display());
        Ok(())
    }
}

/// Bicubic (Catmull-Rom) resize of a 3-channel image. Used as the
/// classical baseline next to the network's output.
pub fn resize_bicubic(image: &Image, width: usize, height: usize) -> Result<Image> {
    if image.channels != 3 {
        bail!("bicubic resize expects an RGB image, got {} channels", image.channels);
    }
    let src = RgbImage::from_raw(image.width as u32, image.height as u32, image.to_interleaved_u8())
        .context("RGB buffer does not match its dimensions")?;
    let dst = image::imageops::resize(&src, width as u32, height as u32, FilterType::CatmullRom);
    Image::from_interleaved_u8(3, height, width, dst.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_roundtrip_rgb() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rgb.png");
        let store = PngStore::new();

        let bytes: Vec<u8> = (0..2 * 3 * 3).map(|v| (v * 10) as u8).collect();
        let img = Image::from_interleaved_u8(3, 2, 3, &bytes).unwrap();
        store.save(&path, &img).unwrap();

        let back = store.load(&path).unwrap();
        assert_eq!(back.to_interleaved_u8(), bytes);
    }

    #[test]
    fn test_grayscale_loads_back_as_rgb() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let store = PngStore::new();

        let img = Image::from_chw(1, 2, 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        store.save(&path, &img).unwrap();

        let back = store.load(&path).unwrap();
        assert_eq!(back.channels, 3);
        assert_eq!(back.get(1, 0, 1), 1.0);
    }

    #[test]
    fn test_two_channel_images_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let img = Image::new(2, 2, 2);
        assert!(PngStore::new().save(&dir.path().join("x.png"), &img).is_err());
    }

    #[test]
    fn test_bicubic_resize_dimensions() {
        let img = Image::new(3, 4, 5);
        let big = resize_bicubic(&img, 20, 16).unwrap();
        assert_eq!((big.width, big.height, big.channels), (20, 16, 3));
    }
}
