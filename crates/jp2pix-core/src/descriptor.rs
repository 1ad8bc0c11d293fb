//! Planar image descriptor as produced by a JPEG 2000 codec.
//!
//! [`ImageDescriptor`] is the normalized, codec-independent view of a decoded
//! image: an ordered list of [`Component`] planes plus the declared
//! [`ColorSpace`]. Component 0 is always the resolution reference; every other
//! plane's `dx`/`dy` factors are relative to it.
//!
//! ```text
//!  component 0 (luma / red)     component 1 (Cb, dx=2 dy=2)
//!  ┌───┬───┬───┬───┐            ┌───────┬───────┐
//!  │ 0 │ 1 │ 2 │ 3 │            │   0   │   1   │
//!  ├───┼───┼───┼───┤            │       │       │
//!  │ 4 │ 5 │ 6 │ 7 │            │       │       │
//!  └───┴───┴───┴───┘            └───────┴───────┘
//! ```
//!
//! Construction validates the plane invariants once (`samples.len() ==
//! width * height`, non-zero subsampling, sane precision) so the classifier
//! and packer can index without re-checking.
//!
//! # Usage
//!
//! ```rust
//! use jp2pix_core::{ColorSpace, Component, ImageDescriptor};
//!
//! let r = Component::new(2, 1, 8, vec![255, 0])?;
//! let g = Component::new(2, 1, 8, vec![0, 255])?;
//! let b = Component::new(2, 1, 8, vec![0, 0])?;
//! let image = ImageDescriptor::new(vec![r, g, b], ColorSpace::Srgb)?;
//! assert_eq!((image.width(), image.height()), (2, 1));
//! # Ok::<(), jp2pix_core::Error>(())
//! ```

use std::fmt;

use crate::{Error, Result};

/// Highest sample precision a component may declare.
pub const MAX_PRECISION: u32 = 31;

/// Colorspace tag declared by the codec for the whole image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// Codec could not determine the colorspace.
    #[default]
    Unknown,
    /// Codestream carries no colorspace information.
    Unspecified,
    /// Grayscale, optionally with alpha.
    Gray,
    /// sRGB red/green/blue planes, optionally with alpha.
    Srgb,
    /// sYCC luma/chroma planes, possibly chroma-subsampled.
    Sycc,
    /// e-sYCC; declared by some codestreams but not packable.
    Eycc,
    /// Cyan/magenta/yellow/key planes.
    Cmyk,
}

impl ColorSpace {
    /// Returns `true` for the tags that leave the layout to be guessed.
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Gray | Self::Unknown | Self::Unspecified)
    }

    /// Short lowercase name, used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Unspecified => "unspecified",
            Self::Gray => "gray",
            Self::Srgb => "srgb",
            Self::Sycc => "sycc",
            Self::Eycc => "e-ycc",
            Self::Cmyk => "cmyk",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One image plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    width: u32,
    height: u32,
    precision: u32,
    signed: bool,
    dx: u32,
    dy: u32,
    samples: Vec<i32>,
}

impl Component {
    /// Creates an unsigned, full-resolution plane.
    ///
    /// # Errors
    ///
    /// Fails when `samples.len() != width * height` or `precision` is not
    /// in `1..=31`.
    pub fn new(width: u32, height: u32, precision: u32, samples: Vec<i32>) -> Result<Self> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(Error::invalid_descriptor(format!(
                "precision {precision} outside 1..={MAX_PRECISION}"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_descriptor(format!("plane {width}x{height} overflows")))?;
        if samples.len() != expected {
            return Err(Error::invalid_descriptor(format!(
                "plane {width}x{height} needs {expected} samples, got {}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            precision,
            signed: false,
            dx: 1,
            dy: 1,
            samples,
        })
    }

    /// Marks the samples as signed.
    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Sets the subsampling factors relative to the reference plane.
    ///
    /// # Errors
    ///
    /// Zero factors are rejected.
    pub fn with_subsampling(mut self, dx: u32, dy: u32) -> Result<Self> {
        if dx == 0 || dy == 0 {
            return Err(Error::invalid_descriptor(format!(
                "subsampling factors must be non-zero, got {dx}x{dy}"
            )));
        }
        self.dx = dx;
        self.dy = dy;
        Ok(self)
    }

    /// Plane width in samples.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Plane height in samples.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per sample.
    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Whether samples are stored signed.
    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Horizontal subsampling factor.
    #[inline]
    pub fn dx(&self) -> u32 {
        self.dx
    }

    /// Vertical subsampling factor.
    #[inline]
    pub fn dy(&self) -> u32 {
        self.dy
    }

    /// Row-major samples, `width * height` long.
    #[inline]
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    /// Consumes the plane and returns its samples.
    pub fn into_samples(self) -> Vec<i32> {
        self.samples
    }

    /// Largest unsigned value representable at this precision.
    #[inline]
    pub fn max_value(&self) -> i32 {
        ((1i64 << self.precision) - 1) as i32
    }

    /// Offset added to signed samples to re-center them into `[0, max]`.
    #[inline]
    pub fn sign_bias(&self) -> i32 {
        if self.signed {
            1 << (self.precision - 1)
        } else {
            0
        }
    }

    /// `(width, height)` of the plane.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Decoded image: ordered planes plus the declared colorspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    components: Vec<Component>,
    colorspace: ColorSpace,
    x0: u32,
    y0: u32,
}

impl ImageDescriptor {
    /// Creates a descriptor with its origin at `(0, 0)`.
    ///
    /// # Errors
    ///
    /// An image needs at least one component.
    pub fn new(components: Vec<Component>, colorspace: ColorSpace) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::invalid_descriptor("image has no components"));
        }
        Ok(Self {
            components,
            colorspace,
            x0: 0,
            y0: 0,
        })
    }

    /// Sets the reference-grid origin. Only its parity matters to the packer.
    pub fn with_origin(mut self, x0: u32, y0: u32) -> Self {
        self.x0 = x0;
        self.y0 = y0;
        self
    }

    /// Width of the reference plane.
    #[inline]
    pub fn width(&self) -> u32 {
        self.components[0].width
    }

    /// Height of the reference plane.
    #[inline]
    pub fn height(&self) -> u32 {
        self.components[0].height
    }

    /// Number of planes.
    #[inline]
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// All planes in order.
    #[inline]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Plane at `index`, if present.
    #[inline]
    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    /// Declared colorspace.
    #[inline]
    pub fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    /// Reference-grid origin `(x0, y0)`.
    #[inline]
    pub fn origin(&self) -> (u32, u32) {
        (self.x0, self.y0)
    }

    /// Consumes the descriptor and returns its planes.
    pub fn into_components(self) -> Vec<Component> {
        self.components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_checked() {
        let err = Component::new(2, 2, 8, vec![0; 3]).unwrap_err();
        assert!(err.to_string().contains("needs 4 samples"));
        assert!(Component::new(2, 2, 8, vec![0; 4]).is_ok());
    }

    #[test]
    fn test_precision_range() {
        assert!(Component::new(1, 1, 0, vec![0]).is_err());
        assert!(Component::new(1, 1, 32, vec![0]).is_err());
        assert!(Component::new(1, 1, 31, vec![0]).is_ok());
    }

    #[test]
    fn test_sign_bias_and_max() {
        let c = Component::new(1, 1, 8, vec![0]).unwrap();
        assert_eq!(c.sign_bias(), 0);
        assert_eq!(c.max_value(), 255);

        let c = c.with_signed(true);
        assert_eq!(c.sign_bias(), 128);

        let c = Component::new(1, 1, 12, vec![0]).unwrap().with_signed(true);
        assert_eq!(c.sign_bias(), 2048);
        assert_eq!(c.max_value(), 4095);

        let c = Component::new(1, 1, 31, vec![0]).unwrap();
        assert_eq!(c.max_value(), i32::MAX);
    }

    #[test]
    fn test_zero_subsampling_rejected() {
        let c = Component::new(1, 1, 8, vec![0]).unwrap();
        assert!(c.clone().with_subsampling(0, 1).is_err());
        let c = c.with_subsampling(2, 1).unwrap();
        assert_eq!((c.dx(), c.dy()), (2, 1));
    }

    #[test]
    fn test_descriptor_reference_plane() {
        let y = Component::new(4, 2, 8, vec![0; 8]).unwrap();
        let cb = Component::new(2, 1, 8, vec![0; 2]).unwrap().with_subsampling(2, 2).unwrap();
        let img = ImageDescriptor::new(vec![y, cb], ColorSpace::Sycc)
            .unwrap()
            .with_origin(1, 0);
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 2);
        assert_eq!(img.origin(), (1, 0));
        assert_eq!(img.num_components(), 2);
        assert!(img.component(2).is_none());
    }

    #[test]
    fn test_empty_descriptor_rejected() {
        assert!(ImageDescriptor::new(Vec::new(), ColorSpace::Gray).is_err());
    }

    #[test]
    fn test_ambiguous_tags() {
        assert!(ColorSpace::Gray.is_ambiguous());
        assert!(ColorSpace::Unknown.is_ambiguous());
        assert!(ColorSpace::Unspecified.is_ambiguous());
        assert!(!ColorSpace::Srgb.is_ambiguous());
        assert_eq!(ColorSpace::Cmyk.to_string(), "cmyk");
    }
}
