//! PDF stream filter implementations
//!
//! This module contains implementations of the PDF stream filters
//! according to ISO 32000-1:2008 Section 7.4

pub mod ascii;
pub mod flate;
pub mod image;
pub mod lzw;
pub mod predictor;
pub mod run_length;

pub use ascii::{decode_ascii85, decode_ascii_hex, encode_ascii85, encode_ascii_hex};
pub use flate::FlateEncoder;
pub use image::{CcittParams, DctParams, Jbig2Params};
pub use lzw::LzwEncoder;
pub use predictor::PredictorParams;
pub use run_length::{decode_run_length, encode_run_length};
