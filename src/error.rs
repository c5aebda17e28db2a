//! Error handling for Quadband
//!
//! Only configuration and file-level operations can fail. The block processing
//! path never returns errors: shape mismatches are programming errors and
//! numeric edge cases are recovered locally.

use thiserror::Error;

/// Result type alias for Quadband operations
pub type Result<T> = std::result::Result<T, QuadbandError>;

/// Main error type for Quadband operations
#[derive(Error, Debug)]
pub enum QuadbandError {
    // Configuration Errors
    #[error("Invalid processing spec: {reason}")]
    InvalidSpec { reason: String },

    #[error("Invalid parameter {param}: {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Band index {index} out of range (engine has 4 bands)")]
    BandOutOfRange { index: usize },

    #[error("Unsupported oversampling factor: {factor} (expected 1, 2, 4 or 8)")]
    UnsupportedOversampling { factor: usize },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio { reason: String },

    #[error("Sample rate mismatch: main input is {main} Hz, sidechain is {sidechain} Hz")]
    SampleRateMismatch { main: u32, sidechain: u32 },

    // Wrapped Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl QuadbandError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            QuadbandError::InvalidSpec { .. } => "INVALID_SPEC",
            QuadbandError::InvalidParameter { .. } => "INVALID_PARAMETER",
            QuadbandError::BandOutOfRange { .. } => "BAND_OUT_OF_RANGE",
            QuadbandError::UnsupportedOversampling { .. } => "UNSUPPORTED_OVERSAMPLING",
            QuadbandError::FileNotFound { .. } => "FILE_NOT_FOUND",
            QuadbandError::InvalidAudio { .. } => "INVALID_AUDIO",
            QuadbandError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            QuadbandError::Io(_) => "IO_ERROR",
            QuadbandError::Serialization(_) => "SERIALIZATION_ERROR",
            QuadbandError::Wav(_) => "WAV_ERROR",
        }
    }

    /// Check if this error is recoverable by changing input rather than code
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QuadbandError::InvalidParameter { .. }
                | QuadbandError::FileNotFound { .. }
                | QuadbandError::InvalidAudio { .. }
                | QuadbandError::SampleRateMismatch { .. }
                | QuadbandError::UnsupportedOversampling { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            QuadbandError::InvalidSpec { .. } => vec![
                "Sample rate, block size and channel count must all be positive",
                "Call prepare() again with the host's current settings",
            ],
            QuadbandError::InvalidParameter { .. } => vec![
                "Check the preset against the documented parameter ranges",
                "Out-of-range values are clamped when loaded through Preset::load",
            ],
            QuadbandError::UnsupportedOversampling { .. } => {
                vec!["Use an oversampling factor of 1, 2, 4 or 8"]
            }
            QuadbandError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            QuadbandError::InvalidAudio { .. } | QuadbandError::Wav(_) => vec![
                "Convert the file to 16/24/32-bit PCM or 32-bit float WAV",
                "Check if the file plays in another application",
            ],
            QuadbandError::SampleRateMismatch { .. } => {
                vec!["Resample the sidechain file to the main input's sample rate"]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = QuadbandError::InvalidSpec {
            reason: "sample rate must be positive".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_SPEC");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = QuadbandError::UnsupportedOversampling { factor: 3 };
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: QuadbandError = io.into();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
