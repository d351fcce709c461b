//! Row sources for the simulator.

use std::path::Path;
use std::sync::Arc;

use image::GrayImage;

use crate::error::{Result, SimError};

/// Widest row the simulator will serve; wider images are cropped.
pub const MAX_WIDTH: u32 = 8192;

/// Height of the synthetic pattern when no image is configured.
pub const FALLBACK_LINES: u32 = 1200;

/// Produces scan lines one at a time, wrapping at the end.
pub trait RowSource: Send {
    /// Bytes per row.
    fn width(&self) -> u32;

    /// Next row; wraps to the first row after the last.
    fn next_row(&mut self) -> &[u8];
}

/// Deterministic moving pattern with periodic dark bands.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    height: u32,
    index: u32,
    row: Vec<u8>,
}

impl SyntheticSource {
    /// A `width × height` pattern.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            height: height.max(1),
            index: 0,
            row: vec![0; width as usize],
        }
    }

    fn fill(&mut self) {
        let y = self.index as usize;
        let width = self.row.len();
        for (x, pixel) in self.row.iter_mut().enumerate() {
            *pixel = ((x + y * 3) % 256) as u8;
        }
        // a short scratch every 97 lines
        if y % 97 < 3 && width >= 20 {
            let start = width / 3;
            self.row[start..start + width / 20].fill(0);
        }
    }
}

impl RowSource for SyntheticSource {
    fn width(&self) -> u32 {
        self.row.len() as u32
    }

    fn next_row(&mut self) -> &[u8] {
        self.fill();
        self.index = (self.index + 1) % self.height;
        &self.row
    }
}

/// Rows of a grayscale image, top to bottom.
#[derive(Debug, Clone)]
pub struct ImageSource {
    image: Arc<GrayImage>,
    index: u32,
}

impl ImageSource {
    /// Share an already decoded image.
    #[must_use]
    pub fn new(image: Arc<GrayImage>) -> Self {
        Self { image, index: 0 }
    }
}

impl RowSource for ImageSource {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn next_row(&mut self) -> &[u8] {
        let width = self.image.width() as usize;
        let start = self.index as usize * width;
        self.index = (self.index + 1) % self.image.height();
        &self.image.as_raw()[start..start + width]
    }
}

/// Recipe for a per-connection [`RowSource`].
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Generated pattern.
    Synthetic {
        /// Bytes per row.
        width: u32,
        /// Rows before wrapping.
        height: u32,
    },
    /// Decoded grayscale image.
    Image(Arc<GrayImage>),
}

impl SourceSpec {
    /// Decode `path` as grayscale, cropping to [`MAX_WIDTH`].
    pub fn load_image(path: &Path) -> Result<Self> {
        let mut gray = image::open(path)?.into_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Err(SimError::InvalidConfig(format!(
                "{} has no pixels",
                path.display()
            )));
        }
        if gray.width() > MAX_WIDTH {
            gray = image::imageops::crop_imm(&gray, 0, 0, MAX_WIDTH, gray.height()).to_image();
        }
        tracing::info!(
            path = %path.display(),
            width = gray.width(),
            height = gray.height(),
            "Loaded source image"
        );
        Ok(Self::Image(Arc::new(gray)))
    }

    /// Bytes per row.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Synthetic { width, .. } => *width,
            Self::Image(image) => image.width(),
        }
    }

    /// Fresh source starting at the first row.
    #[must_use]
    pub fn open(&self) -> Box<dyn RowSource> {
        match self {
            Self::Synthetic { width, height } => Box::new(SyntheticSource::new(*width, *height)),
            Self::Image(image) => Box::new(ImageSource::new(Arc::clone(image))),
        }
    }
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self::Synthetic {
            width: 1024,
            height: FALLBACK_LINES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_synthetic_rows_have_width_and_wrap() {
        let mut source = SyntheticSource::new(64, 3);
        let first = source.next_row().to_vec();
        assert_eq!(first.len(), 64);
        let second = source.next_row().to_vec();
        assert_ne!(first, second);
        source.next_row();
        assert_eq!(source.next_row(), first.as_slice());
    }

    #[test]
    fn test_image_rows_in_order() {
        let img = GrayImage::from_fn(4, 3, |_, y| Luma([y as u8 * 10]));
        let mut source = ImageSource::new(Arc::new(img));
        assert_eq!(source.width(), 4);
        assert_eq!(source.next_row(), &[0, 0, 0, 0]);
        assert_eq!(source.next_row(), &[10, 10, 10, 10]);
        assert_eq!(source.next_row(), &[20, 20, 20, 20]);
        assert_eq!(source.next_row(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_load_image_converts_and_crops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        GrayImage::from_pixel(MAX_WIDTH + 10, 2, Luma([200]))
            .save(&path)
            .unwrap();

        let spec = SourceSpec::load_image(&path).unwrap();
        assert_eq!(spec.width(), MAX_WIDTH);
        let mut source = spec.open();
        assert!(source.next_row().iter().all(|&p| p == 200));
    }

    #[test]
    fn test_load_missing_image_fails() {
        assert!(SourceSpec::load_image(Path::new("no/such/file.png")).is_err());
    }
}
