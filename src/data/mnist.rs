// ============================================================
// Layer 4 - IDX Digit Loader
// ============================================================
// Reads the handwritten-digit dataset from its raw IDX files.
//
// The IDX format is a tiny big-endian binary container:
//
//   images file (idx3):
//     u32 magic  = 0x00000803   (unsigned byte data, 3 dims)
//     u32 count
//     u32 rows
//     u32 cols
//     u8  pixels[count * rows * cols]
//
//   labels file (idx1):
//     u32 magic  = 0x00000801   (unsigned byte data, 1 dim)
//     u32 count
//     u8  labels[count]
//
// Fetching the files is left to the user; point --data-dir at
// a directory holding the decompressed files.
//
// Reference: Rust Book §9 (Error Handling)

use std::{fs, path::{Path, PathBuf}};

use anyhow::{bail, ensure, Context, Result};

use crate::domain::digit::{DigitImage, DIGIT_SIDE};
use crate::domain::traits::DigitSource;

pub const IMAGES_MAGIC: u32 = 0x0000_0803;
pub const LABELS_MAGIC: u32 = 0x0000_0801;

pub const TRAIN_IMAGES_FILE: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS_FILE: &str = "train-labels-idx1-ubyte";

/// Loads digits from an IDX images file and (optionally) its labels file.
pub struct IdxLoader {
    dir:         PathBuf,
    images_file: String,
    labels_file: String,
}

impl IdxLoader {
    /// Loader for the standard training file names inside `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir:         dir.into(),
            images_file: TRAIN_IMAGES_FILE.to_string(),
            labels_file: TRAIN_LABELS_FILE.to_string(),
        }
    }
}

impl DigitSource for IdxLoader {
    fn load_all(&self) -> Result<Vec<DigitImage>> {
        ensure!(
            self.dir.is_dir(),
            "Digit data directory '{}' does not exist",
            self.dir.display()
        );

        let images_path = self.dir.join(&self.images_file);
        let bytes = fs::read(&images_path)
            .with_context(|| format!("Cannot read '{}'", images_path.display()))?;
        let (rows, cols, pixels) = parse_images(&bytes)
            .with_context(|| format!("Bad IDX images file '{}'", images_path.display()))?;

        if rows != DIGIT_SIDE || cols != DIGIT_SIDE {
            bail!(
                "Expected {}x{} digits in '{}', found {}x{}",
                DIGIT_SIDE, DIGIT_SIDE, images_path.display(), rows, cols
            );
        }

        let labels_path = self.dir.join(&self.labels_file);
        let labels = if labels_path.exists() {
            let bytes = fs::read(&labels_path)
                .with_context(|| format!("Cannot read '{}'", labels_path.display()))?;
            let labels = parse_labels(&bytes)
                .with_context(|| format!("Bad IDX labels file '{}'", labels_path.display()))?;
            ensure!(
                labels.len() == pixels.len(),
                "'{}' has {} labels but '{}' has {} images",
                labels_path.display(), labels.len(), images_path.display(), pixels.len()
            );
            labels
        } else {
            tracing::warn!(
                "Labels file '{}' not found, every digit gets label 0",
                labels_path.display()
            );
            vec![0u8; pixels.len()]
        };

        let digits: Vec<DigitImage> = pixels
            .into_iter()
            .zip(labels)
            .map(|(p, l)| DigitImage::new(l, p))
            .collect();

        if is_blank(&digits) {
            tracing::warn!(
                "Every digit in '{}' is blank; the file is probably not MNIST pixels",
                images_path.display()
            );
        }

        tracing::info!("Loaded {} digits from '{}'", digits.len(), self.dir.display());
        Ok(digits)
    }
}

/// True when a non-empty set of digits carries no ink at all
pub fn is_blank(digits: &[DigitImage]) -> bool {
    !digits.is_empty() && digits.iter().all(|d| d.ink_ratio() == 0.0)
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let word = bytes
        .get(offset..offset + 4)
        .context("unexpected end of header")?;
    Ok(u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
}

/// Parse an idx3 images payload into (rows, cols, per-image pixels)
pub fn parse_images(bytes: &[u8]) -> Result<(usize, usize, Vec<Vec<u8>>)> {
    let magic = read_u32(bytes, 0)?;
    ensure!(magic == IMAGES_MAGIC, "magic {:#010x} is not an idx3 images file", magic);

    let count = read_u32(bytes, 4)? as usize;
    let rows  = read_u32(bytes, 8)? as usize;
    let cols  = read_u32(bytes, 12)? as usize;
    let size  = rows.checked_mul(cols).context("IDX header dimensions overflow")?;
    let total = count.checked_mul(size).context("IDX header dimensions overflow")?;

    let body = &bytes[16..];
    ensure!(
        body.len() >= total,
        "payload holds {} bytes, header promises {}",
        body.len(), total
    );

    let images = body[..total]
        .chunks_exact(size.max(1))
        .map(|c| c.to_vec())
        .collect();
    Ok((rows, cols, images))
}

/// Parse an idx1 labels payload
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    let magic = read_u32(bytes, 0)?;
    ensure!(magic == LABELS_MAGIC, "magic {:#010x} is not an idx1 labels file", magic);

    let count = read_u32(bytes, 4)? as usize;
    let body  = &bytes[8..];
    ensure!(
        body.len() >= count,
        "payload holds {} labels, header promises {}",
        body.len(), count
    );
    Ok(body[..count].to_vec())
}

/// Serialise digits back to idx3 bytes. Only used to build fixtures.
#[cfg(test)]
pub fn encode_images(images: &[Vec<u8>], rows: usize, cols: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
    out.extend_from_slice(&(images.len() as u32).to_be_bytes());
    out.extend_from_slice(&(rows as u32).to_be_bytes());
    out.extend_from_slice(&(cols as u32).to_be_bytes());
    for img in images {
        out.extend_from_slice(img);
    }
    out
}

#[cfg(test)]
pub fn encode_labels(labels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(labels);
    out
}

#[cfg(test)]
pub fn write_fixture(dir: &Path, count: usize, with_labels: bool) {
    fs::create_dir_all(dir).unwrap();
    let images: Vec<Vec<u8>> = (0..count)
        .map(|i| vec![(i * 10 % 256) as u8; DIGIT_SIDE * DIGIT_SIDE])
        .collect();
    fs::write(dir.join(TRAIN_IMAGES_FILE), encode_images(&images, DIGIT_SIDE, DIGIT_SIDE)).unwrap();
    if with_labels {
        let labels: Vec<u8> = (0..count).map(|i| (i % 10) as u8).collect();
        fs::write(dir.join(TRAIN_LABELS_FILE), encode_labels(&labels)).unwrap();
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_images_header_and_pixels() {
        let bytes = encode_images(&[vec![1, 2, 3, 4], vec![5, 6, 7, 8]], 2, 2);
        let (rows, cols, imgs) = parse_images(&bytes).unwrap();
        assert_eq!((rows, cols), (2, 2));
        assert_eq!(imgs, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
    }

    #[test]
    fn test_wrong_magic_is_rejected() {
        let bytes = encode_labels(&[1, 2, 3]);
        assert!(parse_images(&bytes).is_err());
        let bytes = encode_images(&[vec![0; 4]], 2, 2);
        assert!(parse_labels(&bytes).is_err());
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let mut bytes = encode_images(&[vec![0; 4], vec![0; 4]], 2, 2);
        bytes.truncate(bytes.len() - 1);
        assert!(parse_images(&bytes).is_err());
        assert!(parse_labels(&[0, 0]).is_err());
    }

    #[test]
    fn test_oversized_header_is_an_error_not_a_panic() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(&[0; 8]);

        let err = parse_images(&bytes).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn test_loader_reads_images_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), 12, true);
        let digits = IdxLoader::new(dir.path()).load_all().unwrap();
        assert_eq!(digits.len(), 12);
        assert_eq!(digits[3].label, 3);
        assert_eq!(digits[11].label, 1);
        assert_eq!(digits[2].pixels.len(), DIGIT_SIDE * DIGIT_SIDE);
        assert_eq!(digits[2].pixels[0], 20);
    }

    #[test]
    fn test_missing_labels_default_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), 4, false);
        let digits = IdxLoader::new(dir.path()).load_all().unwrap();
        assert!(digits.iter().all(|d| d.label == 0));
    }

    #[test]
    fn test_label_count_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), 4, false);
        fs::write(dir.path().join(TRAIN_LABELS_FILE), encode_labels(&[1, 2])).unwrap();
        assert!(IdxLoader::new(dir.path()).load_all().is_err());
    }

    #[test]
    fn test_blank_detection() {
        let blank = vec![DigitImage::new(0, vec![0; 4]), DigitImage::new(1, vec![0; 4])];
        assert!(is_blank(&blank));
        let inked = vec![DigitImage::new(0, vec![0; 4]), DigitImage::new(1, vec![0, 9, 0, 0])];
        assert!(!is_blank(&inked));
        assert!(!is_blank(&[]));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let loader = IdxLoader::new("/definitely/not/here");
        assert!(loader.load_all().is_err());
    }
}
