//! Decoder and encoder settings.
//!
//! Both option sets are plain values with `with_*` builders; the defaults
//! reproduce the classic loader behaviour (single-threaded full-resolution
//! decode, lossless JP2 encode).

use crate::Format;

/// OpenJPEG's default resolution count.
pub const DEFAULT_RESOLUTIONS: u32 = 6;

/// Decoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Codec worker threads. The colorspace layer itself is single-threaded.
    pub threads: u32,
    /// Number of highest resolution levels to discard; each halves the size.
    pub reduce: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            reduce: 0,
        }
    }
}

impl DecodeOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the codec thread count (0 is treated as 1).
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Sets the resolution reduction factor.
    pub fn with_reduce(mut self, reduce: u32) -> Self {
        self.reduce = reduce;
        self
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// Output container: [`Format::Jp2`] or [`Format::J2k`].
    pub format: Format,
    /// Requested wavelet resolution count. Lowered when the image is too
    /// small for it.
    pub num_resolutions: u32,
    /// Compression ratio for the single quality layer; `None` is lossless.
    pub rate: Option<f32>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: Format::Jp2,
            num_resolutions: DEFAULT_RESOLUTIONS,
            rate: None,
        }
    }
}

impl EncodeOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output container.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Sets the requested resolution count (at least 1).
    pub fn with_resolutions(mut self, n: u32) -> Self {
        self.num_resolutions = n.max(1);
        self
    }

    /// Sets a lossy compression ratio, e.g. `20.0` for 20:1.
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = (rate > 0.0).then_some(rate);
        self
    }

    /// Whether the encode is lossless.
    pub fn is_lossless(&self) -> bool {
        self.rate.is_none()
    }

    /// Resolution count usable for a `width` x `height` image.
    ///
    /// The lowest resolution level must still hold at least one sample, so
    /// `2^(n-1)` may not exceed the smaller side. Never below 1.
    pub fn resolutions_for(&self, width: u32, height: u32) -> u32 {
        let side = width.min(height).max(1);
        let fitting = side.ilog2() + 1;
        self.num_resolutions.clamp(1, fitting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_defaults() {
        let opts = DecodeOptions::default();
        assert_eq!(opts.threads, 1);
        assert_eq!(opts.reduce, 0);
        assert_eq!(DecodeOptions::new().with_threads(0).threads, 1);
        assert_eq!(DecodeOptions::new().with_reduce(2).reduce, 2);
    }

    #[test]
    fn test_encode_defaults() {
        let opts = EncodeOptions::default();
        assert_eq!(opts.format, Format::Jp2);
        assert_eq!(opts.num_resolutions, DEFAULT_RESOLUTIONS);
        assert!(opts.is_lossless());
        assert!(EncodeOptions::new().with_rate(0.0).is_lossless());
        assert_eq!(EncodeOptions::new().with_rate(20.0).rate, Some(20.0));
    }

    #[test]
    fn test_resolutions_for() {
        let opts = EncodeOptions::default();
        assert_eq!(opts.resolutions_for(1, 1), 1);
        assert_eq!(opts.resolutions_for(10, 10), 4);
        assert_eq!(opts.resolutions_for(32, 1000), 6);
        assert_eq!(opts.resolutions_for(0, 0), 1);
        assert_eq!(EncodeOptions::new().with_resolutions(2).resolutions_for(512, 512), 2);
    }
}
