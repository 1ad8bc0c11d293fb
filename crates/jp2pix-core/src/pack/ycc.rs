//! sYCC to RGB with nearest-neighbour chroma upsampling.
//!
//! Luma (component 0) is visited in row-major order. Each luma sample at
//! plane position `(x, y)` sits at `(x0 + x, y0 + y)` on the reference grid;
//! its chroma sample is the one covering that grid position:
//!
//! ```text
//! cx = ((x0 + x) >> sx) - ceil(x0 / 2^sx)   sx = 1 when chroma is halved horizontally
//! cy = ((y0 + y) >> sy) - ceil(y0 / 2^sy)   sy = 1 when chroma is halved vertically
//! ```
//!
//! A halved chroma plane starts at `ceil(x0 / 2)` on its own grid, the same
//! placement the codec uses when it sizes the plane as
//! `ceil((x0 + w) / 2) - ceil(x0 / 2)`. With an odd origin the first luma
//! column (or row) has no chroma sample of its own and borrows chroma 0; the
//! pairs after it start at chroma 0 as well. With an odd far edge the last
//! luma column (row) maps alone onto the last chroma column (row). Indices
//! are capped at the chroma plane's last column and row, so an undersized
//! chroma plane repeats its edge instead of being read past its end.

use super::{clamp, to_byte, AlphaPlane};
use crate::ImageDescriptor;

pub(super) fn pack_444(image: &ImageDescriptor, alpha: bool, out: &mut Vec<u8>) {
    pack_upsampled(image, Halving { x: false, y: false }, alpha, out);
}

pub(super) fn pack_422(image: &ImageDescriptor, alpha: bool, out: &mut Vec<u8>) {
    pack_upsampled(image, Halving { x: true, y: false }, alpha, out);
}

pub(super) fn pack_420(image: &ImageDescriptor, alpha: bool, out: &mut Vec<u8>) {
    pack_upsampled(image, Halving { x: true, y: true }, alpha, out);
}

/// Which axes carry chroma at half resolution.
#[derive(Debug, Clone, Copy)]
struct Halving {
    x: bool,
    y: bool,
}

/// Integer sYCC to RGB transform at a given precision.
#[derive(Debug, Clone, Copy)]
struct YccToRgb {
    offset: i64,
    upb: i64,
    precision: u32,
}

impl YccToRgb {
    fn new(precision: u32) -> Self {
        Self {
            offset: 1i64 << (precision - 1),
            upb: (1i64 << precision) - 1,
            precision,
        }
    }

    #[inline]
    fn convert(&self, y: i32, cb: i32, cr: i32) -> [u8; 3] {
        let y = y as i64;
        let cb = (cb as i64 - self.offset) as f32;
        let cr = (cr as i64 - self.offset) as f32;

        let r = y + (1.402 * cr) as i64;
        let g = y - (0.344 * cb + 0.714 * cr) as i64;
        let b = y + (1.772 * cb) as i64;

        [
            to_byte(clamp(r, self.upb), self.precision),
            to_byte(clamp(g, self.upb), self.precision),
            to_byte(clamp(b, self.upb), self.precision),
        ]
    }
}

/// Chroma row or column index for each luma row or column.
fn chroma_index_map(luma_len: u32, origin: u32, halved: bool, chroma_len: u32) -> Vec<usize> {
    let shift = halved as u32;
    let origin = origin as u64;
    let first = origin.div_ceil(1 << shift);
    let last = chroma_len.saturating_sub(1) as u64;
    (0..luma_len as u64)
        .map(|i| ((origin + i) >> shift).saturating_sub(first).min(last) as usize)
        .collect()
}

fn pack_upsampled(image: &ImageDescriptor, halving: Halving, alpha: bool, out: &mut Vec<u8>) {
    let comps = image.components();
    let (luma, cb, cr) = (&comps[0], &comps[1], &comps[2]);
    let (width, height) = luma.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    // Validated by the classifier: Cb and Cr share one non-empty size.
    let (cw, ch) = cb.dimensions();
    debug_assert_eq!((cw, ch), cr.dimensions());
    debug_assert!(cw > 0 && ch > 0);

    let (x0, y0) = image.origin();
    let cols = chroma_index_map(width, x0, halving.x, cw);
    let rows = chroma_index_map(height, y0, halving.y, ch);

    let transform = YccToRgb::new(luma.precision());
    let alpha = alpha.then(|| AlphaPlane::new(&comps[3]));
    let (ys, cbs, crs) = (luma.samples(), cb.samples(), cr.samples());
    let (width, cw) = (width as usize, cw as usize);

    for (y, &cy) in rows.iter().enumerate() {
        let luma_row = &ys[y * width..(y + 1) * width];
        let cb_row = &cbs[cy * cw..(cy + 1) * cw];
        let cr_row = &crs[cy * cw..(cy + 1) * cw];

        for (x, (&l, &cx)) in luma_row.iter().zip(&cols).enumerate() {
            out.extend_from_slice(&transform.convert(l, cb_row[cx], cr_row[cx]));
            if let Some(a) = &alpha {
                out.push(a.byte(y * width + x));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack_image;
    use crate::{ColorSpace, Component, PackedRaster};

    const Y: i32 = 100;

    /// Expected red channel for luma 100 with neutral Cb.
    fn red_for(cr: i32) -> u8 {
        (Y + (1.402f32 * (cr - 128) as f32) as i32) as u8
    }

    fn ycc(
        (w, h): (u32, u32),
        (cw, chh): (u32, u32),
        (dx, dy): (u32, u32),
        cr: Vec<i32>,
        origin: (u32, u32),
    ) -> PackedRaster {
        let luma = Component::new(w, h, 8, vec![Y; (w * h) as usize]).unwrap();
        let cb = Component::new(cw, chh, 8, vec![128; (cw * chh) as usize])
            .unwrap()
            .with_subsampling(dx, dy)
            .unwrap();
        let cr = Component::new(cw, chh, 8, cr)
            .unwrap()
            .with_subsampling(dx, dy)
            .unwrap();
        let image = ImageDescriptor::new(vec![luma, cb, cr], ColorSpace::Sycc)
            .unwrap()
            .with_origin(origin.0, origin.1);
        pack_image(&image).unwrap()
    }

    fn reds(raster: &PackedRaster) -> Vec<u8> {
        raster.data().chunks(3).map(|p| p[0]).collect()
    }

    #[test]
    fn test_neutral_gray() {
        let t = YccToRgb::new(8);
        assert_eq!(t.convert(128, 128, 128), [128, 128, 128]);
    }

    #[test]
    fn test_transform_coefficients() {
        let t = YccToRgb::new(8);
        // cr' = 100: R = 100 + 140, G = 100 - 71, B = 100
        assert_eq!(t.convert(100, 128, 228), [240, 29, 100]);
        // cb' = -128: B clamps at 0
        assert_eq!(t.convert(100, 0, 128), [100, 144, 0]);
    }

    #[test]
    fn test_transform_12bit_reduced() {
        let t = YccToRgb::new(12);
        assert_eq!(t.convert(2048, 2048, 2048), [128, 128, 128]);
        assert_eq!(t.convert(4095, 2048, 2048), [255, 255, 255]);
    }

    #[test]
    fn test_444_neutral() {
        let raster = ycc((2, 2), (2, 2), (1, 1), vec![128; 4], (0, 0));
        assert_eq!(raster.data(), &[100; 12]);
    }

    #[test]
    fn test_444_one_to_one() {
        let raster = ycc((2, 1), (2, 1), (1, 1), vec![138, 148], (0, 0));
        assert_eq!(reds(&raster), vec![red_for(138), red_for(148)]);
    }

    #[test]
    fn test_422_pairs() {
        let raster = ycc((4, 2), (2, 2), (2, 1), vec![128, 138, 148, 158], (0, 0));
        assert_eq!(
            reds(&raster),
            vec![
                red_for(128), red_for(128), red_for(138), red_for(138),
                red_for(148), red_for(148), red_for(158), red_for(158),
            ]
        );
    }

    #[test]
    fn test_422_odd_width() {
        let raster = ycc((3, 1), (2, 1), (2, 1), vec![138, 148], (0, 0));
        assert_eq!(reds(&raster), vec![red_for(138), red_for(138), red_for(148)]);
    }

    #[test]
    fn test_422_odd_origin() {
        // Grid columns 1..=4, chroma width ceil(5/2) - ceil(1/2) = 2.
        // Column 1 borrows chroma 0, pair (2, 3) is chroma 0, column 4 is chroma 1.
        let raster = ycc((4, 1), (2, 1), (2, 1), vec![138, 148], (1, 0));
        let (a, b) = (red_for(138), red_for(148));
        assert_eq!(reds(&raster), vec![a, a, a, b]);
    }

    #[test]
    fn test_422_odd_origin_odd_width() {
        // Grid columns 1..=5, chroma width ceil(6/2) - ceil(1/2) = 2.
        let raster = ycc((5, 1), (2, 1), (2, 1), vec![138, 148], (1, 0));
        let (a, b) = (red_for(138), red_for(148));
        assert_eq!(reds(&raster), vec![a, a, a, b, b]);
    }

    #[test]
    fn test_422_odd_origin_wide() {
        // Grid columns 3..=8, chroma width ceil(9/2) - ceil(3/2) = 3.
        let raster = ycc((6, 1), (3, 1), (2, 1), vec![138, 148, 158], (3, 0));
        let (a, b, c) = (red_for(138), red_for(148), red_for(158));
        assert_eq!(reds(&raster), vec![a, a, a, b, b, c]);
    }

    #[test]
    fn test_420_blocks() {
        let raster = ycc((4, 4), (2, 2), (2, 2), vec![128, 138, 148, 158], (0, 0));
        let (a, b, c, d) = (red_for(128), red_for(138), red_for(148), red_for(158));
        assert_eq!(
            reds(&raster),
            vec![a, a, b, b, a, a, b, b, c, c, d, d, c, c, d, d]
        );
    }

    #[test]
    fn test_420_odd_size() {
        let raster = ycc((3, 3), (2, 2), (2, 2), vec![128, 138, 148, 158], (0, 0));
        let (a, b, c, d) = (red_for(128), red_for(138), red_for(148), red_for(158));
        assert_eq!(reds(&raster), vec![a, a, b, a, a, b, c, c, d]);
        assert_eq!(raster.rowstride(), 9);
    }

    #[test]
    fn test_420_odd_origin() {
        // 3x3 at (1, 1): chroma is ceil(4/2) - ceil(1/2) = 1 on each axis.
        let raster = ycc((3, 3), (1, 1), (2, 2), vec![138], (1, 1));
        assert_eq!(reds(&raster), vec![red_for(138); 9]);
    }

    #[test]
    fn test_420_odd_row_origin_odd_height() {
        // 2x5 at (0, 1): chroma is 1 wide and ceil(6/2) - ceil(1/2) = 2 tall.
        // Row 1 borrows chroma row 0, rows (2, 3) are row 0, rows (4, 5) are row 1.
        let raster = ycc((2, 5), (1, 2), (2, 2), vec![138, 148], (0, 1));
        let (a, b) = (red_for(138), red_for(148));
        assert_eq!(reds(&raster), vec![a, a, a, a, a, a, b, b, b, b]);
    }

    #[test]
    fn test_420_both_origins_odd() {
        // 4x4 at (1, 1): chroma is ceil(5/2) - ceil(1/2) = 2 on each axis.
        let raster = ycc((4, 4), (2, 2), (2, 2), vec![128, 138, 148, 158], (1, 1));
        let (a, b, c, d) = (red_for(128), red_for(138), red_for(148), red_for(158));
        assert_eq!(
            reds(&raster),
            vec![a, a, a, b, a, a, a, b, a, a, a, b, c, c, c, d]
        );
    }

    #[test]
    fn test_420_both_origins_odd_odd_size() {
        // 5x5 at (1, 1): chroma is ceil(6/2) - ceil(1/2) = 2 on each axis.
        let raster = ycc((5, 5), (2, 2), (2, 2), vec![128, 138, 148, 158], (1, 1));
        let (a, b, c, d) = (red_for(128), red_for(138), red_for(148), red_for(158));
        let top = [a, a, a, b, b];
        let bottom = [c, c, c, d, d];
        let expected: Vec<u8> = [top, top, top, bottom, bottom].concat();
        assert_eq!(reds(&raster), expected);
    }

    #[test]
    fn test_420_undersized_chroma_stays_in_bounds() {
        let raster = ycc((5, 5), (1, 1), (2, 2), vec![138], (0, 0));
        assert_eq!(reds(&raster), vec![red_for(138); 25]);
    }

    #[test]
    fn test_ycc_alpha() {
        let luma = Component::new(2, 1, 8, vec![128, 128]).unwrap();
        let cb = Component::new(1, 1, 8, vec![128]).unwrap().with_subsampling(2, 1).unwrap();
        let cr = cb.clone();
        let a = Component::new(2, 1, 8, vec![0, 255]).unwrap();
        let image = ImageDescriptor::new(vec![luma, cb, cr, a], ColorSpace::Sycc).unwrap();
        let raster = pack_image(&image).unwrap();
        assert!(raster.has_alpha());
        assert_eq!(raster.data(), &[128, 128, 128, 0, 128, 128, 128, 255]);
    }

    #[test]
    fn test_index_map() {
        assert_eq!(chroma_index_map(5, 0, true, 3), vec![0, 0, 1, 1, 2]);
        assert_eq!(chroma_index_map(4, 1, true, 2), vec![0, 0, 0, 1]);
        assert_eq!(chroma_index_map(5, 1, true, 2), vec![0, 0, 0, 1, 1]);
        assert_eq!(chroma_index_map(6, 3, true, 3), vec![0, 0, 0, 1, 1, 2]);
        assert_eq!(chroma_index_map(3, 1, false, 3), vec![0, 1, 2]);
        assert_eq!(chroma_index_map(3, 0, false, 3), vec![0, 1, 2]);
        assert_eq!(chroma_index_map(4, 0, true, 1), vec![0, 0, 0, 0]);
    }
}
