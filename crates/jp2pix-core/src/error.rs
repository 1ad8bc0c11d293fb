//! Error types for jp2pix-core operations.
//!
//! Every failure of the colorspace layer is reported through [`Error`]:
//!
//! - Descriptor construction (sample count vs. plane size, empty images)
//! - Classification (component layouts the packer cannot handle)
//! - Raster allocation and raster validation on the encode path
//!
//! # Usage
//!
//! ```rust
//! use jp2pix_core::{Error, Result};
//!
//! fn check_channels(channels: usize) -> Result<()> {
//!     if channels != 3 && channels != 4 {
//!         return Err(Error::invalid_raster(format!("{channels} channels")));
//!     }
//!     Ok(())
//! }
//! assert!(check_channels(2).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the colorspace layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The descriptor's component layout matches no supported pixel format.
    ///
    /// This is the only gate in front of the packer: a descriptor that
    /// classifies successfully is always safe to pack.
    #[error("unsupported colorspace: {reason}")]
    UnsupportedColorspace {
        /// Why the layout was rejected
        reason: String,
    },

    /// A component or descriptor violates its structural invariants.
    ///
    /// Raised at construction time, e.g. when `samples.len()` differs from
    /// `width * height` or a subsampling factor is zero.
    #[error("invalid descriptor: {reason}")]
    InvalidDescriptor {
        /// Which invariant was violated
        reason: String,
    },

    /// The packed raster buffer could not be obtained.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },

    /// An interleaved raster handed to the unpacker is malformed.
    #[error("invalid raster: {reason}")]
    InvalidRaster {
        /// What is wrong with the raster
        reason: String,
    },

    /// Bit depth other than 8 requested for a packed raster.
    #[error("unsupported bit depth: {0} (only 8-bit rasters are supported)")]
    UnsupportedBitDepth(u32),
}

impl Error {
    /// Creates an [`Error::UnsupportedColorspace`] error.
    #[inline]
    pub fn unsupported_colorspace(reason: impl Into<String>) -> Self {
        Self::UnsupportedColorspace {
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDescriptor`] error.
    #[inline]
    pub fn invalid_descriptor(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidRaster`] error.
    #[inline]
    pub fn invalid_raster(reason: impl Into<String>) -> Self {
        Self::InvalidRaster {
            reason: reason.into(),
        }
    }

    /// Returns `true` if classification rejected the descriptor.
    #[inline]
    pub fn is_classification_error(&self) -> bool {
        matches!(self, Self::UnsupportedColorspace { .. })
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_colorspace() {
        let err = Error::unsupported_colorspace("5 components");
        assert!(err.to_string().contains("5 components"));
        assert!(err.is_classification_error());
        assert!(!err.is_allocation_error());
    }

    #[test]
    fn test_allocation_failed() {
        let err = Error::allocation_failed(1 << 40, "out of memory");
        let msg = err.to_string();
        assert!(msg.contains("out of memory"));
        assert!(msg.contains(&(1usize << 40).to_string()));
        assert!(err.is_allocation_error());
    }

    #[test]
    fn test_bit_depth_message() {
        let err = Error::UnsupportedBitDepth(16);
        assert!(err.to_string().contains("16"));
    }
}
