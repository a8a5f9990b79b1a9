// SPDX-License-Identifier: GPL-3.0-only

//! Gallery preview path
//!
//! The decoded image is kept unfiltered; the kernel is applied each time it is
//! drawn, so nothing filtered is ever written back.

use super::processing::{draw_scaled, fit_size};
use crate::constants::PROCESSING_CEILING;
use crate::errors::{PipelineError, PipelineResult};
use crate::filters::Paint;
use image::{ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Decoded image ready to be drawn for display
#[derive(Debug, Clone)]
pub struct PreviewImage {
    image: RgbaImage,
}

impl PreviewImage {
    pub fn decode(bytes: &[u8]) -> PipelineResult<Self> {
        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?;
        Self::from_rgba(image.into_rgba8())
    }

    pub fn open(path: &Path) -> PipelineResult<Self> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Self::from_rgba(image.into_rgba8())
    }

    fn from_rgba(image: RgbaImage) -> PipelineResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::Decode("image has no pixels".to_string()));
        }
        Ok(Self { image })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Render into a surface fitted inside `box_width`x`box_height`
    ///
    /// The box is first clamped to the larger of the processing ceiling and
    /// the image's own longest side, so the surface stays bounded.
    pub fn draw(&self, box_width: u32, box_height: u32, paint: &Paint<'_>) -> RgbaImage {
        let (source_width, source_height) = self.image.dimensions();
        let limit = PROCESSING_CEILING.max(source_width.max(source_height));
        let (width, height) = fit_size(
            source_width,
            source_height,
            box_width.min(limit),
            box_height.min(limit),
        );
        debug!(width, height, fidelity = ?paint.fidelity(), "Drawing preview");

        let mut surface = RgbaImage::new(width, height);
        draw_scaled(&self.image, &mut surface, width, height, paint);
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::SimulationFidelity;
    use image::{ImageFormat, Rgba};

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_preview_fits_box_and_filters() {
        let source = RgbaImage::from_pixel(400, 200, Rgba([0, 0, 255, 255]));
        let preview = PreviewImage::decode(&png_bytes(&source)).unwrap();

        let surface = preview.draw(100, 100, &Paint::shared(SimulationFidelity::Brettel));
        assert_eq!(surface.dimensions(), (100, 50));
        let px = surface.get_pixel(10, 10);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_plain_paint_leaves_colors() {
        let source = RgbaImage::from_pixel(4, 4, Rgba([10, 200, 30, 128]));
        let preview = PreviewImage::decode(&png_bytes(&source)).unwrap();
        let surface = preview.draw(4, 4, &Paint::plain());
        assert_eq!(surface.get_pixel(0, 0), &Rgba([10, 200, 30, 128]));
    }

    #[test]
    fn test_unbounded_box_is_clamped() {
        let source = RgbaImage::from_pixel(400, 200, Rgba([90, 90, 90, 255]));
        let preview = PreviewImage::decode(&png_bytes(&source)).unwrap();

        let surface = preview.draw(u32::MAX, u32::MAX, &Paint::plain());
        assert_eq!(surface.dimensions(), (PROCESSING_CEILING, PROCESSING_CEILING / 2));

        let surface = preview.draw(u32::MAX, 100, &Paint::plain());
        assert_eq!(surface.dimensions(), (200, 100));
    }

    #[test]
    fn test_corrupt_preview() {
        assert!(matches!(
            PreviewImage::decode(&[0, 1, 2, 3]),
            Err(PipelineError::Decode(_))
        ));
    }
}
