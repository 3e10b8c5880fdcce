//! Shared constants for the generation contract.
//!
//! These bounds form the contract between the transport layer and the
//! generation service: the transport validates the `size` query parameter
//! against the same range the service enforces, and both sides agree on the
//! default when the parameter is absent.

use qrcode::EcLevel;

/// Smallest accepted output edge length, in pixels.
pub const MIN_QR_SIZE: u32 = 1;

/// Largest accepted output edge length, in pixels.
pub const MAX_QR_SIZE: u32 = 2048;

/// Output edge length used when the client does not request one.
pub const DEFAULT_QR_SIZE: u32 = 256;

/// Error-correction level applied to every generated code (~15% recovery).
/// Not client-configurable.
pub const RECOVERY_LEVEL: EcLevel = EcLevel::M;

/// MIME type of the raster format produced by the encoder.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Upper bound on how many payload characters may appear in log output.
pub const DATA_PREVIEW_LIMIT: usize = 50;
