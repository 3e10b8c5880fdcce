//! Error types for the QR generation service.
//!
//! The central [`Error`] enum captures every reportable failure of the
//! generation pipeline. Validation failures (`EmptyData`, `InvalidSize`) are
//! detected before the encoder runs; `Encoding` wraps a failure of the
//! underlying encoder so the cause can be logged without leaking it to
//! clients.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the QR generation service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request payload contained no bytes. No encoding is attempted.
    #[error("data cannot be empty")]
    EmptyData,

    /// The requested pixel size fell outside the accepted range.
    #[error("invalid size: must be between 1 and 2048")]
    InvalidSize { size: u32 },

    /// The underlying encoding backend failed.
    #[error("failed to encode QR code: {0}")]
    Encoding(#[from] EncodeError),
}

/// Failure inside the encoding backend.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The payload could not be represented as a QR symbol (e.g. it exceeds
    /// the capacity of the largest version at the configured recovery level).
    #[error("QR symbol construction failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    /// The rendered matrix could not be serialized as a PNG.
    #[error("PNG serialization failed: {0}")]
    Png(#[from] image::ImageError),
}
