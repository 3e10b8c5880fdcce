//! PNG rasterization backend for QR symbols.
//!
//! [`QrEncoder`] is the seam between the generation service and the actual
//! encoding machinery. The production implementation, [`PngEncoder`], builds
//! the symbol with the `qrcode` crate and rasterizes it with `image`. Tests
//! substitute a recording stub to observe delegation without paying for real
//! encoding.

use crate::common::error::EncodeError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Encoding capability: payload bytes plus a recovery level and target edge
/// length in, finished raster image bytes out.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, data: &[u8], level: EcLevel, size: u32) -> Result<Vec<u8>, EncodeError>;
}

/// Encoder producing grayscale PNG output at exactly `size`x`size` pixels.
///
/// The symbol is rendered at the smallest module scale that reaches the
/// requested dimensions, then resampled to the exact target with
/// nearest-neighbor filtering so modules stay crisp. Output is deterministic
/// for identical inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl PngEncoder {
    pub const fn new() -> Self {
        Self
    }
}

impl QrEncoder for PngEncoder {
    fn encode(&self, data: &[u8], level: EcLevel, size: u32) -> Result<Vec<u8>, EncodeError> {
        let code = QrCode::with_error_correction_level(data, level)?;

        let rendered = code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .min_dimensions(size, size)
            .build();

        let image = if rendered.dimensions() == (size, size) {
            rendered
        } else {
            imageops::resize(&rendered, size, size, FilterType::Nearest)
        };

        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image).write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}
