//! Generation service: domain validation plus delegation to the encoder.
//!
//! [`QrGenerator`] is the single-operation capability the transport layer
//! consumes; [`QrService`] is its production implementation. The service has
//! no transport knowledge: it validates the payload and requested size,
//! invokes the encoder with the fixed recovery policy, and passes the PNG
//! bytes back verbatim.

use crate::common::error::{Error, Result};
use crate::common::types::{DATA_PREVIEW_LIMIT, MAX_QR_SIZE, MIN_QR_SIZE, RECOVERY_LEVEL};
use crate::encoder::QrEncoder;
use tracing::{debug, error, warn};

/// Abstract generation capability with exactly one operation.
///
/// The transport layer holds this as a trait object so tests can substitute
/// an implementation that records calls without invoking the real encoder.
pub trait QrGenerator: Send + Sync {
    /// Generates a QR code PNG from `data` at `size`x`size` pixels.
    fn generate(&self, data: &[u8], size: u32) -> Result<Vec<u8>>;
}

/// Production generation service backed by a [`QrEncoder`].
pub struct QrService<E> {
    encoder: E,
}

impl<E: QrEncoder> QrService<E> {
    pub const fn new(encoder: E) -> Self {
        Self { encoder }
    }
}

impl<E: QrEncoder> QrGenerator for QrService<E> {
    /// Validates the request, then encodes with medium (~15%) recovery.
    ///
    /// Both checks run before the encoder is invoked; an invalid request
    /// never reaches the backend. Encoding is treated as deterministic and
    /// side-effect-free, so failures are surfaced immediately without
    /// retries.
    fn generate(&self, data: &[u8], size: u32) -> Result<Vec<u8>> {
        debug!(
            data_length = data.len(),
            size, "Starting QR code generation"
        );

        if data.is_empty() {
            warn!("QR code generation failed: empty data provided");
            return Err(Error::EmptyData);
        }

        if size < MIN_QR_SIZE || size > MAX_QR_SIZE {
            warn!(
                size,
                min = MIN_QR_SIZE,
                max = MAX_QR_SIZE,
                "QR code generation failed: invalid size"
            );
            return Err(Error::InvalidSize { size });
        }

        debug!(
            recovery_level = "medium",
            data_preview = %preview(data, DATA_PREVIEW_LIMIT),
            "Encoding QR code"
        );

        let png = self
            .encoder
            .encode(data, RECOVERY_LEVEL, size)
            .map_err(|err| {
                error!(
                    error = %err,
                    data_length = data.len(),
                    size,
                    "Failed to encode QR code"
                );
                Error::Encoding(err)
            })?;

        debug!(
            output_size_bytes = png.len(),
            image_dimensions = %format!("{size}x{size}"),
            "QR code generated successfully"
        );

        Ok(png)
    }
}

/// Renders a truncated, lossy-UTF-8 preview of the payload for log output.
///
/// Caps the preview at `limit` characters so large payloads never bloat the
/// log stream or leak wholesale into it.
fn preview(data: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(data);
    match text.char_indices().nth(limit) {
        None => text.into_owned(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}
