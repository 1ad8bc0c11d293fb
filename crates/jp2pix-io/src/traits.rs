//! Seams between the loader, the codec and the host.
//!
//! [`Jp2Codec`] is the opaque wavelet/entropy coder: bytes in, planar
//! [`ImageDescriptor`] out, and back. [`ImageLoader`] is what a host image
//! library binds to: a static [`FormatInfo`] plus sniff, load and save.

use crate::registry::FormatInfo;
use crate::{DecodeOptions, EncodeOptions, Format, IoResult};
use jp2pix_core::{ImageDescriptor, PackedRaster};
use std::io::{Read, Seek};

/// Readable and seekable input stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// JPEG 2000 codec.
///
/// # Example
///
/// ```rust,ignore
/// use jp2pix_io::{Jp2Codec, Format, DecodeOptions, EncodeOptions, IoResult};
/// use jp2pix_core::ImageDescriptor;
///
/// struct MyCodec;
///
/// impl Jp2Codec for MyCodec {
///     fn name(&self) -> &'static str { "my-codec" }
///
///     fn decode(&self, data: &[u8], format: Format, opts: &DecodeOptions)
///         -> IoResult<ImageDescriptor> {
///         // Decode implementation
///     }
///
///     fn encode(&self, image: &ImageDescriptor, opts: &EncodeOptions)
///         -> IoResult<Vec<u8>> {
///         // Encode implementation
///     }
/// }
/// ```
pub trait Jp2Codec {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Decodes a complete file of the given container format.
    fn decode(
        &self,
        data: &[u8],
        format: Format,
        options: &DecodeOptions,
    ) -> IoResult<ImageDescriptor>;

    /// Encodes planar components into container bytes.
    fn encode(&self, image: &ImageDescriptor, options: &EncodeOptions) -> IoResult<Vec<u8>>;
}

impl<C: Jp2Codec + ?Sized> Jp2Codec for &C {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn decode(
        &self,
        data: &[u8],
        format: Format,
        options: &DecodeOptions,
    ) -> IoResult<ImageDescriptor> {
        (**self).decode(data, format, options)
    }

    fn encode(&self, image: &ImageDescriptor, options: &EncodeOptions) -> IoResult<Vec<u8>> {
        (**self).encode(image, options)
    }
}

/// Host-facing image loader.
pub trait ImageLoader {
    /// Static registration metadata.
    fn info(&self) -> &'static FormatInfo;

    /// Container of a stream head; see [`Format::from_bytes`].
    fn sniff(&self, header: &[u8]) -> Format {
        Format::from_bytes(header)
    }

    /// Decodes a whole stream into a packed RGB(A)8 raster.
    fn load(&self, reader: &mut dyn ReadSeek) -> IoResult<PackedRaster>;

    /// Encodes an interleaved raster into container bytes.
    fn save(
        &self,
        raster: &[u8],
        width: u32,
        height: u32,
        channels: usize,
        bit_depth: u32,
    ) -> IoResult<Vec<u8>>;
}
