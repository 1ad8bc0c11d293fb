//! Planar components to interleaved 8-bit RGB(A).
//!
//! One routine per [`PixelLayout`]. All of them walk the reference plane in
//! row-major order and append to a single output buffer, so the result is
//! always `height` rows of [`rowstride`] bytes.
//!
//! Shared primitives:
//!
//! - [`clamp`] limits a value to `[0, max]`
//! - [`Component::sign_bias`] re-centers signed samples before clamping
//! - [`to_byte`] drops the low bits of samples wider than 8 bits
//!
//! The packers trust the classifier: [`pack`] must only be called with the
//! [`Classification`] produced for the same descriptor.

mod ycc;

use tracing::{debug, trace};

use crate::classify::{classify, Classification, PixelLayout};
use crate::raster::{rowstride, PackedRaster};
use crate::{Component, Error, ImageDescriptor, Result};

/// Clamps `value` to `[0, max]`.
#[inline]
pub fn clamp(value: i64, max: i64) -> i64 {
    value.max(0).min(max)
}

/// Narrows a clamped sample of `precision` bits to one byte.
///
/// Samples of 8 bits or less are stored as-is; wider samples keep their
/// eight most significant bits.
#[inline]
pub fn to_byte(value: i64, precision: u32) -> u8 {
    if precision > 8 {
        (value >> (precision - 8)) as u8
    } else {
        value as u8
    }
}

/// Classifies `image` and packs it.
pub fn pack_image(image: &ImageDescriptor) -> Result<PackedRaster> {
    let classification = classify(image)?;
    pack(image, &classification)
}

/// Packs `image` according to `classification`.
///
/// # Errors
///
/// [`Error::AllocationFailed`] when the output buffer cannot be reserved.
pub fn pack(image: &ImageDescriptor, classification: &Classification) -> Result<PackedRaster> {
    let width = image.width();
    let height = image.height();
    let channels = classification.output_components;
    trace!(width, height, channels, layout = %classification.layout, "pack");

    let len = rowstride(width, channels)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::allocation_failed(usize::MAX, "raster size overflows"))?;
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|e| Error::allocation_failed(len, e.to_string()))?;

    let alpha = classification.has_alpha();
    match classification.layout {
        PixelLayout::Rgb => pack_rgb(image, alpha, &mut out),
        PixelLayout::Gray => pack_gray(image, alpha, &mut out),
        PixelLayout::Gray12 => pack_gray12(image, alpha, &mut out),
        PixelLayout::Cmyk => pack_cmyk(image, &mut out),
        PixelLayout::Ycc444 => ycc::pack_444(image, alpha, &mut out),
        PixelLayout::Ycc422 => ycc::pack_422(image, alpha, &mut out),
        PixelLayout::Ycc420 => ycc::pack_420(image, alpha, &mut out),
    }

    debug!(bytes = out.len(), "packed raster");
    PackedRaster::new(width, height, channels, out)
}

/// Alpha plane with its own bias and range.
struct AlphaPlane<'a> {
    samples: &'a [i32],
    bias: i64,
    max: i64,
    precision: u32,
}

impl<'a> AlphaPlane<'a> {
    fn new(component: &'a Component) -> Self {
        Self {
            samples: component.samples(),
            bias: component.sign_bias() as i64,
            max: component.max_value() as i64,
            precision: component.precision(),
        }
    }

    #[inline]
    fn byte(&self, i: usize) -> u8 {
        to_byte(clamp(self.samples[i] as i64 + self.bias, self.max), self.precision)
    }
}

fn pack_rgb(image: &ImageDescriptor, alpha: bool, out: &mut Vec<u8>) {
    let comps = image.components();
    let precision = comps[0].precision();
    let max = comps[0].max_value() as i64;
    let [r, g, b] = [&comps[0], &comps[1], &comps[2]];
    let (bias_r, bias_g, bias_b) = (
        r.sign_bias() as i64,
        g.sign_bias() as i64,
        b.sign_bias() as i64,
    );
    let alpha = alpha.then(|| AlphaPlane::new(&comps[comps.len() - 1]));

    let (rs, gs, bs) = (r.samples(), g.samples(), b.samples());
    for i in 0..rs.len() {
        out.push(to_byte(clamp(rs[i] as i64 + bias_r, max), precision));
        out.push(to_byte(clamp(gs[i] as i64 + bias_g, max), precision));
        out.push(to_byte(clamp(bs[i] as i64 + bias_b, max), precision));
        if let Some(a) = &alpha {
            out.push(a.byte(i));
        }
    }
}

/// Signed gray is re-centered the same way as RGB and alpha, so a signed plane
/// lands mid-gray rather than clamping its negative half to black.
fn pack_gray(image: &ImageDescriptor, alpha: bool, out: &mut Vec<u8>) {
    let comps = image.components();
    let gray = &comps[0];
    let precision = gray.precision();
    let max = gray.max_value() as i64;
    let bias = gray.sign_bias() as i64;
    let alpha = alpha.then(|| &comps[1]);

    for (i, &g) in gray.samples().iter().enumerate() {
        let v = to_byte(clamp(g as i64 + bias, max), precision);
        out.extend_from_slice(&[v, v, v]);
        if let Some(a) = alpha {
            let av = clamp(a.samples()[i] as i64 + a.sign_bias() as i64, max);
            out.push(to_byte(av, precision));
        }
    }
}

/// Same re-centering as [`pack_gray`], then a divide by 16.
fn pack_gray12(image: &ImageDescriptor, alpha: bool, out: &mut Vec<u8>) {
    let comps = image.components();
    let gray = &comps[0];
    let max = gray.max_value() as i64;
    let bias = gray.sign_bias() as i64;
    let alpha = alpha.then(|| &comps[1]);

    for (i, &g) in gray.samples().iter().enumerate() {
        let v = (clamp(g as i64 + bias, max) / 16) as u8;
        out.extend_from_slice(&[v, v, v]);
        if let Some(a) = alpha {
            let av = clamp(a.samples()[i] as i64 + a.sign_bias() as i64, max) / 16;
            out.push(av as u8);
        }
    }
}

fn pack_cmyk(image: &ImageDescriptor, out: &mut Vec<u8>) {
    let comps = image.components();
    let scale = |c: &Component| 1.0f32 / c.max_value() as f32;
    let (sc, sm, sy, sk) = (
        scale(&comps[0]),
        scale(&comps[1]),
        scale(&comps[2]),
        scale(&comps[3]),
    );
    let (cs, ms, ys, ks) = (
        comps[0].samples(),
        comps[1].samples(),
        comps[2].samples(),
        comps[3].samples(),
    );

    for i in 0..cs.len() {
        let c = 1.0 - cs[i] as f32 * sc;
        let m = 1.0 - ms[i] as f32 * sm;
        let y = 1.0 - ys[i] as f32 * sy;
        let k = 1.0 - ks[i] as f32 * sk;
        out.push(unit_to_byte(c * k));
        out.push(unit_to_byte(m * k));
        out.push(unit_to_byte(y * k));
    }
}

#[inline]
fn unit_to_byte(v: f32) -> u8 {
    (255.0 * v).round().clamp(0.0, 255.0) as u8
}
