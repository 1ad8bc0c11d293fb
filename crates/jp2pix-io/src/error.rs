//! Error types for load/save operations.
//!
//! Every failure of a load or save call is terminal and reported through one
//! [`IoError`]; no partial raster is ever returned alongside it.

use std::io;
use thiserror::Error;

/// Load/save error.
#[derive(Debug, Error)]
pub enum IoError {
    /// The input stream could not be created, read or re-positioned.
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),

    /// The header matches neither a JP2 box nor a raw codestream.
    #[error("unknown file type: no JPEG 2000 signature")]
    UnknownFormat,

    /// The codec could not be created or configured.
    #[error("codec setup failed: {0}")]
    CodecSetup(String),

    /// The codec reported a decoding failure.
    #[error("decode error: {0}")]
    DecodeFailure(String),

    /// The codec reported an encoding failure.
    #[error("encode error: {0}")]
    EncodeFailure(String),

    /// The decoded component layout is not supported.
    #[error("unsupported colorspace: {0}")]
    UnsupportedColorspace(String),

    /// The raster buffer could not be allocated.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailure {
        /// Bytes requested.
        requested: usize,
        /// Failure reason.
        reason: String,
    },

    /// The raster passed to `save` is malformed.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),
}

/// Result type for load/save operations.
pub type IoResult<T> = Result<T, IoError>;

impl From<jp2pix_core::Error> for IoError {
    fn from(err: jp2pix_core::Error) -> Self {
        use jp2pix_core::Error as E;
        match err {
            E::UnsupportedColorspace { reason } => Self::UnsupportedColorspace(reason),
            E::AllocationFailed { requested, reason } => {
                Self::AllocationFailure { requested, reason }
            }
            // The codec produced planes that break descriptor invariants.
            E::InvalidDescriptor { reason } => Self::DecodeFailure(reason),
            E::InvalidRaster { reason } => Self::InvalidRaster(reason),
            e @ E::UnsupportedBitDepth(_) => Self::InvalidRaster(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: IoError = jp2pix_core::Error::unsupported_colorspace("5 comps").into();
        assert!(matches!(err, IoError::UnsupportedColorspace(ref r) if r == "5 comps"));

        let err: IoError = jp2pix_core::Error::allocation_failed(10, "oom").into();
        assert!(matches!(err, IoError::AllocationFailure { requested: 10, .. }));

        let err: IoError = jp2pix_core::Error::UnsupportedBitDepth(16).into();
        assert!(err.to_string().contains("16"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let err: IoError = io_err.into();
        assert!(matches!(err, IoError::Stream(_)));
    }
}
