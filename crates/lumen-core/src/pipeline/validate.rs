//! Cheap checks before an image is read in full.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Validates files before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check that the file exists, is within the size limit and starts with
    /// the signature of a decodable format.
    pub fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(PipelineError::Decode {
                    path: path.to_path_buf(),
                    message: format!("Cannot read metadata: {}", e),
                });
            }
        };

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let mut header = [0u8; 12];
        let bytes_read = std::fs::File::open(path)
            .and_then(|mut f| f.read(&mut header))
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?;

        if bytes_read < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }
        if !has_image_signature(&header[..bytes_read]) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }
        Ok(())
    }
}

/// Whether `header` starts with a JPEG, PNG, GIF, WebP, BMP or TIFF signature.
fn has_image_signature(header: &[u8]) -> bool {
    match header {
        [0xFF, 0xD8, 0xFF, ..] => true,
        [0x89, b'P', b'N', b'G', ..] => true,
        [b'G', b'I', b'F', b'8', ..] => true,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => true,
        // A truncated RIFF header may still be WebP; let the decoder decide.
        [b'R', b'I', b'F', b'F', rest @ ..] => rest.len() < 8,
        [b'B', b'M', ..] => true,
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
        _ => false,
    }
}
