//! Interleaved 8-bit RGB(A) raster.
//!
//! [`PackedRaster`] is what a decode call hands back to its caller. It owns
//! its pixel buffer; an optional release hook lets the host learn when the
//! buffer is given back, and is run exactly once (on [`PackedRaster::release`]
//! or on drop, whichever comes first).

use std::fmt;

use crate::{Error, Result};

/// Callback receiving the pixel buffer when the raster is released.
pub type ReleaseHook = Box<dyn FnOnce(Vec<u8>) + Send>;

/// Row pitch in bytes of a packed 8-bit raster.
///
/// One byte per sample, so this is `width * output_components`. Always pass
/// the *output* channel count (3 or 4), never the source component count.
#[inline]
pub fn rowstride(width: u32, output_components: usize) -> usize {
    width as usize * output_components
}

/// Owned interleaved RGB or RGBA raster, 8 bits per sample.
pub struct PackedRaster {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
    release: Option<ReleaseHook>,
}

impl PackedRaster {
    /// Wraps an already packed buffer.
    ///
    /// # Errors
    ///
    /// `channels` must be 3 or 4 and `data` exactly `height` rows of
    /// [`rowstride`] bytes.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(Error::invalid_raster(format!(
                "{channels} channels, expected 3 or 4"
            )));
        }
        let expected = rowstride(width, channels)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_raster(format!("{width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(Error::invalid_raster(format!(
                "{width}x{height}x{channels} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
            release: None,
        })
    }

    /// Installs a hook that receives the buffer when the raster is released.
    pub fn with_release_hook(mut self, hook: impl FnOnce(Vec<u8>) + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel (3 or 4).
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Whether the fourth channel is alpha.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Always 8.
    #[inline]
    pub fn bits_per_sample(&self) -> u32 {
        8
    }

    /// Distance in bytes between row starts.
    #[inline]
    pub fn rowstride(&self) -> usize {
        rowstride(self.width, self.channels)
    }

    /// Interleaved pixel bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One row of pixel bytes.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.rowstride();
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    /// Takes the buffer out, bypassing the release hook.
    ///
    /// The caller becomes responsible for the memory.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.release = None;
        std::mem::take(&mut self.data)
    }

    /// Gives the buffer back through the release hook.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(hook) = self.release.take() {
            hook(std::mem::take(&mut self.data));
        }
    }
}

impl Drop for PackedRaster {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for PackedRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedRaster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("rowstride", &self.rowstride())
            .field("has_release_hook", &self.release.is_some())
            .finish()
    }
}
