//! Pixel sampler: presents an ordered list of staff images as one
//! addressable strip.
//!
//! Source images are laid out left to right with no gaps. When every source
//! shares the same width the grid keeps one buffer per image and maps a
//! global column to `(x / width, x % width)`; otherwise the sources are
//! composited into a single buffer up front.

use image::{imageops, Rgba, RgbaImage};

use crate::error::{FlowscoreError, Result};

/// Decides which pixels count as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InkRule {
    /// Any pixel with non-zero alpha (transparent renderings).
    #[default]
    Alpha,
    /// Opaque scans: a visible pixel whose luminance is below the threshold.
    Luma(u8),
}

impl InkRule {
    fn is_ink(self, pixel: &Rgba<u8>) -> bool {
        let [r, g, b, a] = pixel.0;
        match self {
            InkRule::Alpha => a > 0,
            InkRule::Luma(threshold) => {
                let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
                a > 0 && luma < threshold as u32
            }
        }
    }
}

enum Layout {
    Strided { images: Vec<RgbaImage>, image_width: u32 },
    Composite(RgbaImage),
}

/// The composite ink field of one score.
pub struct PixelGrid {
    layout: Layout,
    width: u32,
    height: u32,
    rule: InkRule,
}

impl PixelGrid {
    /// Build a grid from decoded images. All images must share one height.
    pub fn new(images: Vec<RgbaImage>, rule: InkRule) -> Result<Self> {
        let Some(first) = images.first() else {
            return Err(FlowscoreError::InvalidInput("no source images".into()));
        };
        let height = first.height();
        let image_width = first.width();

        if let Some((index, img)) = images.iter().enumerate().find(|(_, img)| img.height() != height) {
            return Err(FlowscoreError::InvalidInput(format!(
                "image #{index} is {}px high, expected {height}px",
                img.height()
            )));
        }

        let width: u32 = images.iter().map(|img| img.width()).sum();
        let uniform = images.iter().all(|img| img.width() == image_width);

        let layout = if uniform && image_width > 0 {
            Layout::Strided { images, image_width }
        } else {
            let mut strip = RgbaImage::new(width, height);
            let mut offset = 0i64;
            for img in &images {
                imageops::replace(&mut strip, img, offset, 0);
                offset += img.width() as i64;
            }
            Layout::Composite(strip)
        };

        Ok(Self { layout, width, height, rule })
    }

    /// Decode encoded images (PNG or JPEG) and build a grid.
    ///
    /// Any decode failure aborts the whole grid.
    pub fn decode<B: AsRef<[u8]>>(encoded: &[B], rule: InkRule) -> Result<Self> {
        let images = encoded
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                image::load_from_memory(bytes.as_ref())
                    .map(|img| img.to_rgba8())
                    .map_err(|source| FlowscoreError::Decode { index, source })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(images, rule)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> &Rgba<u8> {
        match &self.layout {
            Layout::Strided { images, image_width } => {
                images[(x / image_width) as usize].get_pixel(x % image_width, y)
            }
            Layout::Composite(strip) => strip.get_pixel(x, y),
        }
    }

    /// True iff the pixel at `(x, y)` is ink. Out-of-range reads are blank.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.rule.is_ink(self.pixel(x, y))
    }

    pub fn column_has_ink(&self, x: u32) -> bool {
        (0..self.height).any(|y| self.is_ink(x, y))
    }

    /// The full strip as one bitmap.
    pub fn composite(&self) -> RgbaImage {
        match &self.layout {
            Layout::Composite(strip) => strip.clone(),
            Layout::Strided { .. } => self.crop(0, self.width),
        }
    }

    /// Columns `[left, right)` of the strip, spanning source boundaries.
    pub fn crop(&self, left: u32, right: u32) -> RgbaImage {
        let right = right.min(self.width);
        let left = left.min(right);
        match &self.layout {
            Layout::Composite(strip) => {
                imageops::crop_imm(strip, left, 0, right - left, self.height).to_image()
            }
            Layout::Strided { images, image_width } => {
                let mut out = RgbaImage::new(right - left, self.height);
                if left == right {
                    return out;
                }
                let first = left / image_width;
                let last = (right - 1) / image_width;
                for index in first..=last {
                    let origin = index * image_width;
                    let src_left = left.max(origin) - origin;
                    let src_right = right.min(origin + image_width) - origin;
                    let piece = imageops::crop_imm(
                        &images[index as usize],
                        src_left,
                        0,
                        src_right - src_left,
                        self.height,
                    )
                    .to_image();
                    imageops::replace(&mut out, &piece, (origin + src_left - left) as i64, 0);
                }
                out
            }
        }
    }
}

/// Anything the bitmap compositor can cut staff slices from.
pub trait StripSource {
    fn strip_height(&self) -> u32;
    /// Columns `[left, right)` as a standalone bitmap.
    fn crop_columns(&self, left: u32, right: u32) -> RgbaImage;
}

impl StripSource for PixelGrid {
    fn strip_height(&self) -> u32 {
        self.height
    }

    fn crop_columns(&self, left: u32, right: u32) -> RgbaImage {
        self.crop(left, right)
    }
}

impl StripSource for RgbaImage {
    fn strip_height(&self) -> u32 {
        self.height()
    }

    fn crop_columns(&self, left: u32, right: u32) -> RgbaImage {
        let right = right.min(self.width());
        let left = left.min(right);
        imageops::crop_imm(self, left, 0, right - left, self.height()).to_image()
    }
}
