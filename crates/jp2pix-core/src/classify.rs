//! Colorspace classification.
//!
//! Maps an [`ImageDescriptor`] onto exactly one [`PixelLayout`] or rejects it.
//! There is no partial match: a descriptor either classifies, and is then safe
//! to hand to [`crate::pack`], or yields [`Error::UnsupportedColorspace`].
//!
//! | Declared colorspace       | Components | Layout                      |
//! |---------------------------|------------|-----------------------------|
//! | gray / unknown / unspec.  | 1, 2       | `Gray` or `Gray12`          |
//! | gray / unknown / unspec.  | 3, 4       | `Rgb` (ambiguous policy)    |
//! | sYCC                      | 3, 4       | `Ycc420` / `Ycc422` / `Ycc444` |
//! | sRGB                      | 3, 4       | `Rgb`                       |
//! | CMYK                      | 4          | `Cmyk` (always 3 outputs)   |
//!
//! The "guess RGB from the component count" rule for untagged images is kept
//! apart from the strict rules as an [`AmbiguousPolicy`], so callers can swap
//! it through [`Classifier::with_ambiguous_policy`].

use std::fmt;

use tracing::debug;

use crate::{ColorSpace, Component, Error, ImageDescriptor, Result};

/// Pixel-format variant selected by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Red, green, blue planes (alpha optional).
    Rgb,
    /// Gray plane (alpha optional).
    Gray,
    /// 12-bit gray plane, reduced to 8 bits on packing.
    Gray12,
    /// Luma plus chroma at half resolution on both axes.
    Ycc420,
    /// Luma plus chroma at half horizontal resolution.
    Ycc422,
    /// Luma plus full-resolution chroma.
    Ycc444,
    /// Cyan, magenta, yellow, key.
    Cmyk,
}

impl PixelLayout {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Gray => "GRAY",
            Self::Gray12 => "GRAY12",
            Self::Ycc420 => "YCbCr 4:2:0",
            Self::Ycc422 => "YCbCr 4:2:2",
            Self::Ycc444 => "YCbCr 4:4:4",
            Self::Cmyk => "CMYK",
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a successful classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Selected pixel-format variant.
    pub layout: PixelLayout,
    /// Channels in the packed raster: 3 (RGB) or 4 (RGBA).
    pub output_components: usize,
}

impl Classification {
    /// Creates a classification.
    #[inline]
    pub fn new(layout: PixelLayout, output_components: usize) -> Self {
        Self {
            layout,
            output_components,
        }
    }

    /// Whether the packed raster carries an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.output_components == 4
    }
}

/// Rule applied to images whose colorspace tag is gray, unknown or
/// unspecified.
pub type AmbiguousPolicy = fn(&ImageDescriptor) -> Result<Classification>;

/// Default [`AmbiguousPolicy`].
///
/// One or two planes are gray (the second one being alpha); three or four
/// planes are taken to be RGB or RGBA. Anything else is rejected.
pub fn guess_from_component_count(image: &ImageDescriptor) -> Result<Classification> {
    let count = image.num_components();
    let first = &image.components()[0];

    if count < 3 {
        require_reference_size(image, count)?;
        let layout = if first.precision() == 12 {
            PixelLayout::Gray12
        } else {
            PixelLayout::Gray
        };
        let output_components = if count == 4 || count == 2 { 4 } else { 3 };
        return Ok(Classification::new(layout, output_components));
    }

    if count == 3 || count == 4 {
        require_reference_size(image, count)?;
        return Ok(Classification::new(PixelLayout::Rgb, count));
    }

    Err(Error::unsupported_colorspace(format!(
        "{count} components with {} colorspace",
        image.colorspace()
    )))
}

/// Colorspace classifier with a pluggable policy for untagged images.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    ambiguous: AmbiguousPolicy,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            ambiguous: guess_from_component_count,
        }
    }
}

impl Classifier {
    /// Creates a classifier using [`guess_from_component_count`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rule used for gray/unknown/unspecified images.
    pub fn with_ambiguous_policy(mut self, policy: AmbiguousPolicy) -> Self {
        self.ambiguous = policy;
        self
    }

    /// Classifies `image`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedColorspace`] when no layout applies.
    pub fn classify(&self, image: &ImageDescriptor) -> Result<Classification> {
        let result = match image.colorspace() {
            ColorSpace::Gray | ColorSpace::Unknown | ColorSpace::Unspecified => {
                (self.ambiguous)(image)
            }
            ColorSpace::Sycc => classify_sycc(image),
            ColorSpace::Srgb => classify_srgb(image),
            ColorSpace::Cmyk => classify_cmyk(image),
            other => Err(Error::unsupported_colorspace(format!(
                "{other} colorspace is not supported"
            ))),
        };

        match &result {
            Ok(c) => debug!(
                colorspace = %image.colorspace(),
                components = image.num_components(),
                layout = %c.layout,
                output_components = c.output_components,
                "classified image"
            ),
            Err(e) => debug!(colorspace = %image.colorspace(), error = %e, "classification rejected"),
        }
        result
    }
}

/// Classifies with the default [`Classifier`].
pub fn classify(image: &ImageDescriptor) -> Result<Classification> {
    Classifier::default().classify(image)
}

fn classify_srgb(image: &ImageDescriptor) -> Result<Classification> {
    let count = image.num_components();
    if count != 3 && count != 4 {
        return Err(Error::unsupported_colorspace(format!(
            "sRGB image with {count} components"
        )));
    }
    require_reference_size(image, count)?;
    Ok(Classification::new(PixelLayout::Rgb, count))
}

fn classify_sycc(image: &ImageDescriptor) -> Result<Classification> {
    let count = image.num_components();
    if count != 3 && count != 4 {
        return Err(Error::unsupported_colorspace(format!(
            "sYCC image with {count} components"
        )));
    }

    let comps = image.components();
    let factors = |c: &Component| (c.dx(), c.dy());
    if factors(&comps[0]) != (1, 1) {
        return Err(Error::unsupported_colorspace(format!(
            "subsampled luma plane ({}x{})",
            comps[0].dx(),
            comps[0].dy()
        )));
    }

    let layout = match (factors(&comps[1]), factors(&comps[2])) {
        ((2, 2), (2, 2)) => PixelLayout::Ycc420,
        ((2, 1), (2, 1)) => PixelLayout::Ycc422,
        ((1, 1), (1, 1)) => PixelLayout::Ycc444,
        (cb, cr) => {
            return Err(Error::unsupported_colorspace(format!(
                "sYCC chroma subsampling Cb {}x{}, Cr {}x{}",
                cb.0, cb.1, cr.0, cr.1
            )));
        }
    };

    let (cb, cr) = (&comps[1], &comps[2]);
    if cb.dimensions() != cr.dimensions() {
        return Err(Error::unsupported_colorspace("Cb and Cr planes differ in size"));
    }
    let luma_empty = comps[0].samples().is_empty();
    if !luma_empty && cb.samples().is_empty() {
        return Err(Error::unsupported_colorspace("empty chroma planes"));
    }
    if layout == PixelLayout::Ycc444 && cb.dimensions() != comps[0].dimensions() {
        return Err(Error::unsupported_colorspace(
            "4:4:4 chroma planes differ from luma size",
        ));
    }
    if count == 4 && comps[3].dimensions() != comps[0].dimensions() {
        return Err(Error::unsupported_colorspace(
            "alpha plane must match luma size",
        ));
    }

    Ok(Classification::new(layout, count))
}

fn classify_cmyk(image: &ImageDescriptor) -> Result<Classification> {
    let count = image.num_components();
    if count < 4 {
        return Err(Error::unsupported_colorspace(format!(
            "CMYK needs 4 components, got {count}"
        )));
    }
    if count > 4 {
        return Err(Error::unsupported_colorspace(format!(
            "CMYK with {count} components (alpha is not supported)"
        )));
    }

    let comps = image.components();
    let first = (comps[0].dx(), comps[0].dy());
    if comps[1..4].iter().any(|c| (c.dx(), c.dy()) != first) {
        return Err(Error::unsupported_colorspace(
            "CMYK planes use different subsampling",
        ));
    }
    require_reference_size(image, 4)?;

    Ok(Classification::new(PixelLayout::Cmyk, count - 1))
}

/// Every plane in `0..count` must share the reference plane's size, since the
/// one-to-one packers index all of them with the same pixel index.
fn require_reference_size(image: &ImageDescriptor, count: usize) -> Result<()> {
    let comps = image.components();
    let reference = comps[0].dimensions();
    match comps[1..count].iter().position(|c| c.dimensions() != reference) {
        Some(i) => {
            let (w, h) = comps[i + 1].dimensions();
            Err(Error::unsupported_colorspace(format!(
                "component {} is {w}x{h}, expected {}x{}",
                i + 1,
                reference.0,
                reference.1
            )))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(w: u32, h: u32, prec: u32, dx: u32, dy: u32) -> Component {
        Component::new(w, h, prec, vec![0; (w * h) as usize])
            .unwrap()
            .with_subsampling(dx, dy)
            .unwrap()
    }

    fn image(comps: Vec<Component>, cs: ColorSpace) -> ImageDescriptor {
        ImageDescriptor::new(comps, cs).unwrap()
    }

    #[test]
    fn test_gray_single_plane() {
        let c = classify(&image(vec![plane(4, 4, 8, 1, 1)], ColorSpace::Gray)).unwrap();
        assert_eq!(c.layout, PixelLayout::Gray);
        assert_eq!(c.output_components, 3);
        assert!(!c.has_alpha());
    }

    #[test]
    fn test_gray_with_alpha() {
        let comps = vec![plane(4, 4, 8, 1, 1), plane(4, 4, 8, 1, 1)];
        let c = classify(&image(comps, ColorSpace::Unspecified)).unwrap();
        assert_eq!(c.layout, PixelLayout::Gray);
        assert_eq!(c.output_components, 4);
    }

    #[test]
    fn test_gray12() {
        let c = classify(&image(vec![plane(2, 2, 12, 1, 1)], ColorSpace::Unknown)).unwrap();
        assert_eq!(c.layout, PixelLayout::Gray12);
        assert_eq!(c.output_components, 3);
    }

    #[test]
    fn test_ambiguous_falls_back_to_rgb() {
        let three = vec![plane(2, 2, 8, 1, 1); 3];
        let c = classify(&image(three, ColorSpace::Unspecified)).unwrap();
        assert_eq!(c.layout, PixelLayout::Rgb);
        assert_eq!(c.output_components, 3);

        let four = vec![plane(2, 2, 8, 1, 1); 4];
        let c = classify(&image(four, ColorSpace::Gray)).unwrap();
        assert_eq!(c.layout, PixelLayout::Rgb);
        assert_eq!(c.output_components, 4);
    }

    #[test]
    fn test_ambiguous_five_components_rejected() {
        let five = vec![plane(2, 2, 8, 1, 1); 5];
        let err = classify(&image(five, ColorSpace::Unknown)).unwrap_err();
        assert!(err.is_classification_error());
    }

    #[test]
    fn test_custom_ambiguous_policy() {
        fn always_gray(_: &ImageDescriptor) -> Result<Classification> {
            Ok(Classification::new(PixelLayout::Gray, 3))
        }
        let classifier = Classifier::new().with_ambiguous_policy(always_gray);
        let three = vec![plane(2, 2, 8, 1, 1); 3];
        let c = classifier.classify(&image(three.clone(), ColorSpace::Unknown)).unwrap();
        assert_eq!(c.layout, PixelLayout::Gray);

        // Strict branches are untouched by the policy.
        let c = classifier.classify(&image(three, ColorSpace::Srgb)).unwrap();
        assert_eq!(c.layout, PixelLayout::Rgb);
    }

    #[test]
    fn test_sycc_420() {
        let comps = vec![plane(4, 4, 8, 1, 1), plane(2, 2, 8, 2, 2), plane(2, 2, 8, 2, 2)];
        let c = classify(&image(comps, ColorSpace::Sycc)).unwrap();
        assert_eq!(c.layout, PixelLayout::Ycc420);
        assert_eq!(c.output_components, 3);
    }

    #[test]
    fn test_sycc_422_is_not_420() {
        let comps = vec![plane(4, 4, 8, 1, 1), plane(2, 4, 8, 2, 1), plane(2, 4, 8, 2, 1)];
        let c = classify(&image(comps, ColorSpace::Sycc)).unwrap();
        assert_eq!(c.layout, PixelLayout::Ycc422);
    }

    #[test]
    fn test_sycc_444_with_alpha() {
        let comps = vec![plane(3, 3, 8, 1, 1); 4];
        let c = classify(&image(comps, ColorSpace::Sycc)).unwrap();
        assert_eq!(c.layout, PixelLayout::Ycc444);
        assert_eq!(c.output_components, 4);
    }

    #[test]
    fn test_sycc_mixed_subsampling_rejected() {
        let comps = vec![plane(4, 4, 8, 1, 1), plane(2, 2, 8, 2, 2), plane(2, 4, 8, 2, 1)];
        assert!(classify(&image(comps, ColorSpace::Sycc)).is_err());

        let comps = vec![plane(2, 2, 8, 2, 2), plane(2, 2, 8, 2, 2), plane(2, 2, 8, 2, 2)];
        assert!(classify(&image(comps, ColorSpace::Sycc)).is_err());
    }

    #[test]
    fn test_srgb() {
        let c = classify(&image(vec![plane(2, 2, 8, 1, 1); 4], ColorSpace::Srgb)).unwrap();
        assert_eq!(c.layout, PixelLayout::Rgb);
        assert!(c.has_alpha());

        let err = classify(&image(vec![plane(2, 2, 8, 1, 1); 2], ColorSpace::Srgb));
        assert!(err.is_err());
    }

    #[test]
    fn test_rgb_plane_size_mismatch_rejected() {
        let comps = vec![plane(4, 4, 8, 1, 1), plane(2, 2, 8, 2, 2), plane(4, 4, 8, 1, 1)];
        let err = classify(&image(comps, ColorSpace::Srgb)).unwrap_err();
        assert!(err.to_string().contains("component 1"));
    }

    #[test]
    fn test_cmyk() {
        let c = classify(&image(vec![plane(2, 2, 8, 1, 1); 4], ColorSpace::Cmyk)).unwrap();
        assert_eq!(c.layout, PixelLayout::Cmyk);
        assert_eq!(c.output_components, 3);

        let shared = vec![plane(2, 2, 8, 2, 2); 4];
        assert!(classify(&image(shared, ColorSpace::Cmyk)).is_ok());
    }

    #[test]
    fn test_cmyk_rejections() {
        let three = vec![plane(2, 2, 8, 1, 1); 3];
        assert!(classify(&image(three, ColorSpace::Cmyk)).is_err());

        let five = vec![plane(2, 2, 8, 1, 1); 5];
        assert!(classify(&image(five, ColorSpace::Cmyk)).is_err());

        let mut mismatched = vec![plane(2, 2, 8, 1, 1); 3];
        mismatched.push(plane(2, 2, 8, 2, 1));
        let err = classify(&image(mismatched, ColorSpace::Cmyk)).unwrap_err();
        assert!(err.is_classification_error());
    }

    #[test]
    fn test_eycc_rejected() {
        let comps = vec![plane(2, 2, 8, 1, 1); 3];
        assert!(classify(&image(comps, ColorSpace::Eycc)).is_err());
    }

    #[test]
    fn test_output_components_bounds() {
        let cases = vec![
            image(vec![plane(2, 2, 8, 1, 1)], ColorSpace::Gray),
            image(vec![plane(2, 2, 8, 1, 1); 2], ColorSpace::Gray),
            image(vec![plane(2, 2, 8, 1, 1); 3], ColorSpace::Srgb),
            image(vec![plane(2, 2, 8, 1, 1); 4], ColorSpace::Srgb),
            image(vec![plane(2, 2, 8, 1, 1); 4], ColorSpace::Cmyk),
            image(vec![plane(2, 2, 8, 1, 1); 3], ColorSpace::Sycc),
        ];
        for img in &cases {
            let c = classify(img).unwrap();
            assert!(c.output_components == 3 || c.output_components == 4);
            if c.layout == PixelLayout::Cmyk {
                assert_eq!(c.output_components, 3);
            }
        }
    }
}
