//! JPEG 2000 load/save pipeline.
//!
//! ```text
//! load:  stream ─> sniff ─> codec.decode ─> classify ─> pack ─> PackedRaster
//! save:  RGB(A)8 ─> unpack ─> codec.encode ─> container bytes
//! ```
//!
//! Every stage either succeeds completely or aborts the call. Intermediate
//! buffers (file bytes, the decoded [`ImageDescriptor`]) are owned by the
//! call and dropped on every path; a raster is only returned whole.
//!
//! # Example
//!
//! ```ignore
//! use jp2pix_io::jp2;
//!
//! let raster = jp2::read("input.jp2")?;
//! println!("{}x{} rowstride {}", raster.width(), raster.height(), raster.rowstride());
//!
//! let bytes = jp2::save(raster.data(), raster.width(), raster.height(), raster.channels(), 8)?;
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use jp2pix_core::{pack, unpack, Classifier, ImageDescriptor, PackedRaster};
use tracing::{debug, trace};

use crate::registry::{FormatInfo, JP2_FORMAT};
use crate::traits::{ImageLoader, Jp2Codec, ReadSeek};
use crate::{DecodeOptions, EncodeOptions, Format, IoError, IoResult};

/// JPEG 2000 loader over a codec backend.
#[derive(Debug, Clone, Default)]
pub struct Jp2Loader<C> {
    codec: C,
    classifier: Classifier,
    decode: DecodeOptions,
    encode: EncodeOptions,
}

impl<C: Jp2Codec> Jp2Loader<C> {
    /// Creates a loader with default options.
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            classifier: Classifier::default(),
            decode: DecodeOptions::default(),
            encode: EncodeOptions::default(),
        }
    }

    /// Replaces the colorspace classifier.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the decoder settings.
    pub fn with_decode_options(mut self, options: DecodeOptions) -> Self {
        self.decode = options;
        self
    }

    /// Replaces the encoder settings.
    pub fn with_encode_options(mut self, options: EncodeOptions) -> Self {
        self.encode = options;
        self
    }

    /// The codec backend.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decodes a stream into a packed RGB(A)8 raster.
    pub fn load_from<R: ReadSeek + ?Sized>(&self, reader: &mut R) -> IoResult<PackedRaster> {
        let format = Format::sniff(reader)?;
        trace!(%format, "sniffed container");
        if !format.is_known() {
            return Err(IoError::UnknownFormat);
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let image = self.decode_as(&data, format)?;
        drop(data);
        self.pack_decoded(&image)
    }

    /// Decodes an in-memory file.
    pub fn load_bytes(&self, data: &[u8]) -> IoResult<PackedRaster> {
        let (_, image) = self.decode_planar(data)?;
        self.pack_decoded(&image)
    }

    /// Decodes a file.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<PackedRaster> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading JPEG 2000");
        let mut reader = BufReader::new(File::open(path)?);
        self.load_from(&mut reader)
    }

    /// Sniffs and decodes an in-memory file without packing it.
    ///
    /// Returns the container and the planar image as the codec produced it.
    pub fn decode_planar(&self, data: &[u8]) -> IoResult<(Format, ImageDescriptor)> {
        let format = Format::from_bytes(data);
        trace!(%format, "sniffed container");
        if !format.is_known() {
            return Err(IoError::UnknownFormat);
        }
        Ok((format, self.decode_as(data, format)?))
    }

    fn decode_as(&self, data: &[u8], format: Format) -> IoResult<ImageDescriptor> {
        trace!(
            codec = self.codec.name(),
            bytes = data.len(),
            threads = self.decode.threads,
            reduce = self.decode.reduce,
            "decoding"
        );
        self.codec.decode(data, format, &self.decode)
    }

    /// Classifies and packs a decoded image.
    pub fn pack_decoded(&self, image: &ImageDescriptor) -> IoResult<PackedRaster> {
        let classification = self.classifier.classify(image)?;
        let raster = pack(image, &classification)?;

        debug!(
            width = raster.width(),
            height = raster.height(),
            components = image.num_components(),
            colorspace = %image.colorspace(),
            layout = %classification.layout,
            has_alpha = raster.has_alpha(),
            rowstride = raster.rowstride(),
            "decoded JPEG 2000"
        );
        Ok(raster)
    }

    /// The classifier used for decoded images.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Encodes an interleaved 8-bit RGB(A) raster.
    pub fn save(
        &self,
        raster: &[u8],
        width: u32,
        height: u32,
        channels: usize,
        bit_depth: u32,
    ) -> IoResult<Vec<u8>> {
        let image = unpack(raster, width, height, channels, bit_depth)?;
        let bytes = self.codec.encode(&image, &self.encode)?;
        debug!(
            width,
            height,
            channels,
            format = %self.encode.format,
            lossless = self.encode.is_lossless(),
            bytes = bytes.len(),
            "encoded JPEG 2000"
        );
        Ok(bytes)
    }

    /// Encodes a raster into a file.
    pub fn write<P: AsRef<Path>>(&self, path: P, raster: &PackedRaster) -> IoResult<()> {
        let bytes = self.save(
            raster.data(),
            raster.width(),
            raster.height(),
            raster.channels(),
            raster.bits_per_sample(),
        )?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

impl<C: Jp2Codec> ImageLoader for Jp2Loader<C> {
    fn info(&self) -> &'static FormatInfo {
        &JP2_FORMAT
    }

    fn load(&self, reader: &mut dyn ReadSeek) -> IoResult<PackedRaster> {
        self.load_from(reader)
    }

    fn save(
        &self,
        raster: &[u8],
        width: u32,
        height: u32,
        channels: usize,
        bit_depth: u32,
    ) -> IoResult<Vec<u8>> {
        Jp2Loader::save(self, raster, width, height, channels, bit_depth)
    }
}

#[cfg(feature = "openjpeg")]
mod default_codec {
    use super::*;
    use crate::openjpeg::OpenJpeg;
    use std::io::{Cursor, Seek};

    fn loader() -> Jp2Loader<OpenJpeg> {
        Jp2Loader::new(OpenJpeg)
    }

    /// Decodes a stream with the OpenJPEG backend.
    pub fn load<R: Read + Seek>(mut reader: R) -> IoResult<PackedRaster> {
        loader().load_from(&mut reader)
    }

    /// Decodes in-memory bytes with the OpenJPEG backend.
    pub fn read_bytes(data: &[u8]) -> IoResult<PackedRaster> {
        loader().load_from(&mut Cursor::new(data))
    }

    /// Decodes a file with the OpenJPEG backend.
    pub fn read<P: AsRef<Path>>(path: P) -> IoResult<PackedRaster> {
        loader().read(path)
    }

    /// Encodes an RGB(A)8 raster as lossless JP2 with the OpenJPEG backend.
    pub fn save(
        raster: &[u8],
        width: u32,
        height: u32,
        channels: usize,
        bit_depth: u32,
    ) -> IoResult<Vec<u8>> {
        loader().save(raster, width, height, channels, bit_depth)
    }

    /// Encodes a raster into a lossless JP2 file with the OpenJPEG backend.
    pub fn write<P: AsRef<Path>>(path: P, raster: &PackedRaster) -> IoResult<()> {
        loader().write(path, raster)
    }
}

#[cfg(feature = "openjpeg")]
pub use default_codec::{load, read, read_bytes, save, write};
