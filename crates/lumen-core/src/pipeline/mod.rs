//! Image loading pipeline.
//!
//! - **discovery**: Find image files under the protected and candidate roots
//! - **validate**: Size and magic-byte checks before reading
//! - **decode**: Load and decode images with limits and a timeout
//! - **processor**: Turns files into fingerprints with bounded concurrency

pub mod decode;
pub mod discovery;
pub mod processor;
pub mod validate;

pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use processor::{FingerprintBatch, ImageProcessor, ScanInputs};
pub use validate::Validator;
