#![doc = include_str!("../README.md")]

mod common;
mod encoder;
mod service;

pub use common::*;
pub use encoder::{PngEncoder, QrEncoder};
pub use service::{QrGenerator, QrService};

// Public re-export so downstream crates can name the error-correction level
// without depending on `qrcode` directly.
pub use qrcode::EcLevel;
