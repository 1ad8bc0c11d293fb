//! Interleaved 8-bit RGB(A) to planar components (encode direction).
//!
//! The inverse of the RGB packer: every channel becomes one full-resolution,
//! unsigned plane and the image is tagged sRGB. No subsampling and no
//! colorspace transform are applied.

use tracing::trace;

use crate::raster::rowstride;
use crate::{ColorSpace, Component, Error, ImageDescriptor, PackedRaster, Result};

/// De-interleaves `raster` into one plane per channel.
///
/// `raster` holds `height` rows of `width * channels` bytes; trailing bytes
/// beyond that are ignored.
///
/// # Errors
///
/// - [`Error::InvalidRaster`] for a channel count other than 3 or 4, or a
///   buffer shorter than the declared size
/// - [`Error::UnsupportedBitDepth`] for anything but 8 bits
pub fn unpack(
    raster: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    bit_depth: u32,
) -> Result<ImageDescriptor> {
    trace!(width, height, channels, bit_depth, "unpack");
    if bit_depth != 8 {
        return Err(Error::UnsupportedBitDepth(bit_depth));
    }
    if channels != 3 && channels != 4 {
        return Err(Error::invalid_raster(format!(
            "{channels} channels, expected 3 or 4"
        )));
    }

    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::invalid_raster(format!("{width}x{height} overflows")))?;
    let needed = rowstride(width, channels)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::invalid_raster(format!("{width}x{height} overflows")))?;
    if raster.len() < needed {
        return Err(Error::invalid_raster(format!(
            "{width}x{height}x{channels} needs {needed} bytes, got {}",
            raster.len()
        )));
    }
    let raster = &raster[..needed];

    let mut planes: Vec<Vec<i32>> = Vec::with_capacity(channels);
    for _ in 0..channels {
        let mut plane = Vec::new();
        plane
            .try_reserve_exact(pixels)
            .map_err(|e| Error::allocation_failed(pixels * 4, e.to_string()))?;
        planes.push(plane);
    }
    for pixel in raster.chunks_exact(channels) {
        for (plane, &v) in planes.iter_mut().zip(pixel) {
            plane.push(v as i32);
        }
    }

    let components = planes
        .into_iter()
        .map(|samples| Component::new(width, height, bit_depth, samples))
        .collect::<Result<Vec<_>>>()?;
    ImageDescriptor::new(components, ColorSpace::Srgb)
}

/// De-interleaves a [`PackedRaster`].
pub fn unpack_raster(raster: &PackedRaster) -> Result<ImageDescriptor> {
    unpack(
        raster.data(),
        raster.width(),
        raster.height(),
        raster.channels(),
        raster.bits_per_sample(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack_image;

    #[test]
    fn test_deinterleave() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let image = unpack(&data, 2, 1, 3, 8).unwrap();
        assert_eq!(image.num_components(), 3);
        assert_eq!(image.colorspace(), ColorSpace::Srgb);
        assert_eq!(image.components()[0].samples(), &[1, 4]);
        assert_eq!(image.components()[1].samples(), &[2, 5]);
        assert_eq!(image.components()[2].samples(), &[3, 6]);
        for c in image.components() {
            assert_eq!((c.dx(), c.dy()), (1, 1));
            assert_eq!(c.precision(), 8);
            assert!(!c.is_signed());
        }
    }

    #[test]
    fn test_rgba() {
        let data = [10u8, 20, 30, 40];
        let image = unpack(&data, 1, 1, 4, 8).unwrap();
        assert_eq!(image.num_components(), 4);
        assert_eq!(image.components()[3].samples(), &[40]);
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            unpack(&[0; 6], 1, 1, 3, 16),
            Err(Error::UnsupportedBitDepth(16))
        ));
        assert!(unpack(&[0; 2], 1, 1, 2, 8).is_err());
        assert!(unpack(&[0; 5], 2, 1, 3, 8).is_err());
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        let (w, h) = (5u32, 3u32);
        let planes: Vec<Vec<i32>> = (0..3)
            .map(|c| (0..w * h).map(|i| ((i * 37 + c * 91) % 256) as i32).collect())
            .collect();
        let comps = planes
            .iter()
            .map(|p| Component::new(w, h, 8, p.clone()).unwrap())
            .collect();
        let image = ImageDescriptor::new(comps, ColorSpace::Srgb).unwrap();

        let raster = pack_image(&image).unwrap();
        let back = unpack_raster(&raster).unwrap();
        assert_eq!(back, image);
    }
}
