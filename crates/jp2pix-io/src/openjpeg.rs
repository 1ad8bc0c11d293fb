//! OpenJPEG codec backend.
//!
//! Thin safe layer over `openjpeg-sys`. Codec, stream and image handles are
//! wrapped in guards that release them on drop, so every early return frees
//! whatever was acquired so far. Streams read from and write to in-memory
//! cursors; OpenJPEG messages are forwarded to `tracing` under the
//! `jp2pix::openjpeg` target, and the last error message is kept to enrich
//! the returned [`IoError`].

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::{mem, ptr, slice};

use jp2pix_core::{ColorSpace, Component, ImageDescriptor};
use openjpeg_sys as opj;
use tracing::{debug, error, trace, warn};

use crate::traits::Jp2Codec;
use crate::{DecodeOptions, EncodeOptions, Format, IoError, IoResult};

/// Internal buffer size of OpenJPEG streams.
const STREAM_CHUNK_SIZE: usize = 0x0010_0000;

/// OpenJPEG 2.x backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenJpeg;

impl Jp2Codec for OpenJpeg {
    fn name(&self) -> &'static str {
        "openjpeg"
    }

    fn decode(
        &self,
        data: &[u8],
        format: Format,
        options: &DecodeOptions,
    ) -> IoResult<ImageDescriptor> {
        let codec = Codec::decompressor(format)?;
        let stream = Stream::reader(data)?;

        // SAFETY: the parameter struct is plain data and is initialized by
        // OpenJPEG before use.
        let mut params: opj::opj_dparameters_t = unsafe { mem::zeroed() };
        unsafe { opj::opj_set_default_decoder_parameters(&mut params) };
        params.cp_reduce = options.reduce;

        if unsafe { opj::opj_setup_decoder(codec.raw, &mut params) } == 0 {
            return Err(IoError::CodecSetup(codec.failure("failed to set up decoder")));
        }
        // Decoders start single-threaded; only ask for a pool when needed.
        if options.threads > 1 {
            let threads = c_int::try_from(options.threads).unwrap_or(c_int::MAX);
            if unsafe { opj::opj_codec_set_threads(codec.raw, threads) } == 0 {
                return Err(IoError::CodecSetup(codec.failure("failed to set thread count")));
            }
        }

        let mut image = Image(ptr::null_mut());
        if unsafe { opj::opj_read_header(stream.raw, codec.raw, &mut image.0) } == 0 {
            return Err(IoError::DecodeFailure(codec.failure("failed to read header")));
        }
        if unsafe { opj::opj_decode(codec.raw, stream.raw, image.0) } == 0 {
            return Err(IoError::DecodeFailure(codec.failure("failed to decode the image")));
        }
        if unsafe { opj::opj_end_decompress(codec.raw, stream.raw) } == 0 {
            return Err(IoError::DecodeFailure(codec.failure("failed to end decompression")));
        }
        drop(stream);
        drop(codec);

        descriptor_from_raw(&image)
    }

    fn encode(&self, image: &ImageDescriptor, options: &EncodeOptions) -> IoResult<Vec<u8>> {
        let codec = Codec::compressor(options.format)?;
        let raw = image_to_raw(image)?;

        let (min_w, min_h) = image
            .components()
            .iter()
            .fold((u32::MAX, u32::MAX), |(w, h), c| (w.min(c.width()), h.min(c.height())));
        let resolutions = options.resolutions_for(min_w, min_h);

        // SAFETY: as for the decoder parameters.
        let mut params: opj::opj_cparameters_t = unsafe { mem::zeroed() };
        unsafe { opj::opj_set_default_encoder_parameters(&mut params) };
        params.tcp_numlayers = 1;
        params.tcp_rates[0] = options.rate.unwrap_or(0.0);
        params.cp_disto_alloc = 1;
        params.irreversible = c_int::from(options.rate.is_some());
        params.numresolution = resolutions as c_int;
        params.tcp_mct = u8::from(image.num_components() >= 3) as _;
        trace!(
            resolutions,
            rate = params.tcp_rates[0],
            irreversible = params.irreversible,
            "encoder parameters"
        );

        if unsafe { opj::opj_setup_encoder(codec.raw, &mut params, raw.0) } == 0 {
            return Err(IoError::CodecSetup(codec.failure("failed to set up encoder")));
        }

        let stream = Stream::writer()?;
        if unsafe { opj::opj_start_compress(codec.raw, raw.0, stream.raw) } == 0 {
            return Err(IoError::EncodeFailure(codec.failure("failed to start compressing")));
        }
        if unsafe { opj::opj_encode(codec.raw, stream.raw) } == 0 {
            return Err(IoError::EncodeFailure(codec.failure("failed to encode the image")));
        }
        if unsafe { opj::opj_end_compress(codec.raw, stream.raw) } == 0 {
            return Err(IoError::EncodeFailure(codec.failure("failed to end compressing")));
        }
        drop(codec);

        Ok(stream.into_bytes())
    }
}

fn codec_format(format: Format) -> IoResult<opj::CODEC_FORMAT> {
    match format {
        Format::Jp2 => Ok(opj::CODEC_FORMAT::OPJ_CODEC_JP2),
        Format::J2k => Ok(opj::CODEC_FORMAT::OPJ_CODEC_J2K),
        Format::Unknown => Err(IoError::UnknownFormat),
    }
}

fn colorspace_from_raw(cs: opj::COLOR_SPACE) -> ColorSpace {
    use opj::COLOR_SPACE::*;
    match cs {
        OPJ_CLRSPC_UNKNOWN => ColorSpace::Unknown,
        OPJ_CLRSPC_UNSPECIFIED => ColorSpace::Unspecified,
        OPJ_CLRSPC_SRGB => ColorSpace::Srgb,
        OPJ_CLRSPC_GRAY => ColorSpace::Gray,
        OPJ_CLRSPC_SYCC => ColorSpace::Sycc,
        OPJ_CLRSPC_EYCC => ColorSpace::Eycc,
        OPJ_CLRSPC_CMYK => ColorSpace::Cmyk,
    }
}

fn colorspace_to_raw(cs: ColorSpace) -> opj::COLOR_SPACE {
    use opj::COLOR_SPACE::*;
    match cs {
        ColorSpace::Unknown => OPJ_CLRSPC_UNKNOWN,
        ColorSpace::Unspecified => OPJ_CLRSPC_UNSPECIFIED,
        ColorSpace::Srgb => OPJ_CLRSPC_SRGB,
        ColorSpace::Gray => OPJ_CLRSPC_GRAY,
        ColorSpace::Sycc => OPJ_CLRSPC_SYCC,
        ColorSpace::Eycc => OPJ_CLRSPC_EYCC,
        ColorSpace::Cmyk => OPJ_CLRSPC_CMYK,
    }
}

/// Copies a decoded OpenJPEG image into an [`ImageDescriptor`].
fn descriptor_from_raw(image: &Image) -> IoResult<ImageDescriptor> {
    if image.0.is_null() {
        return Err(IoError::DecodeFailure("codec returned no image".into()));
    }
    // SAFETY: non-null image returned by a successful decode.
    let raw = unsafe { &*image.0 };
    if raw.numcomps == 0 || raw.comps.is_null() {
        return Err(IoError::DecodeFailure("image has no components".into()));
    }
    // SAFETY: `comps` holds `numcomps` entries.
    let comps = unsafe { slice::from_raw_parts(raw.comps, raw.numcomps as usize) };

    let mut components = Vec::with_capacity(comps.len());
    for (i, comp) in comps.iter().enumerate() {
        let len = (comp.w as usize)
            .checked_mul(comp.h as usize)
            .ok_or_else(|| IoError::DecodeFailure(format!("component {i} is too large")))?;
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|e| IoError::AllocationFailure {
                requested: len.saturating_mul(mem::size_of::<i32>()),
                reason: e.to_string(),
            })?;
        if len > 0 {
            if comp.data.is_null() {
                return Err(IoError::DecodeFailure(format!("component {i} has no samples")));
            }
            // SAFETY: a decoded component owns `w * h` samples.
            samples.extend_from_slice(unsafe { slice::from_raw_parts(comp.data, len) });
        }
        let component = Component::new(comp.w, comp.h, comp.prec, samples)?
            .with_signed(comp.sgnd != 0)
            .with_subsampling(comp.dx, comp.dy)?;
        components.push(component);
    }

    Ok(ImageDescriptor::new(components, colorspace_from_raw(raw.color_space))?
        .with_origin(raw.x0, raw.y0))
}

/// Builds an OpenJPEG image holding a copy of `image`'s samples.
fn image_to_raw(image: &ImageDescriptor) -> IoResult<Image> {
    let (x0, y0) = image.origin();
    let mut params: Vec<opj::opj_image_cmptparm_t> = image
        .components()
        .iter()
        .map(|c| {
            // SAFETY: plain data, every used field is set below.
            let mut p: opj::opj_image_cmptparm_t = unsafe { mem::zeroed() };
            p.dx = c.dx();
            p.dy = c.dy();
            p.w = c.width();
            p.h = c.height();
            p.x0 = x0.div_ceil(c.dx());
            p.y0 = y0.div_ceil(c.dy());
            p.prec = c.precision();
            p.sgnd = u32::from(c.is_signed());
            p
        })
        .collect();
    let numcomps = params.len() as u32;

    // SAFETY: `params` holds `numcomps` initialized entries.
    let raw = unsafe {
        opj::opj_image_create(
            numcomps,
            params.as_mut_ptr(),
            colorspace_to_raw(image.colorspace()),
        )
    };
    if raw.is_null() {
        return Err(IoError::EncodeFailure("failed to create image".into()));
    }
    let guard = Image(raw);

    let first = &image.components()[0];
    // SAFETY: `raw` is a fresh image with `numcomps` components, each with
    // `w * h` allocated samples.
    unsafe {
        (*raw).x0 = x0;
        (*raw).y0 = y0;
        (*raw).x1 = x0.saturating_add(first.width().saturating_mul(first.dx()));
        (*raw).y1 = y0.saturating_add(first.height().saturating_mul(first.dy()));

        let comps = slice::from_raw_parts_mut((*raw).comps, numcomps as usize);
        for (i, (dst, src)) in comps.iter_mut().zip(image.components()).enumerate() {
            let samples = src.samples();
            if samples.is_empty() {
                continue;
            }
            if dst.data.is_null() {
                return Err(IoError::AllocationFailure {
                    requested: samples.len() * mem::size_of::<i32>(),
                    reason: format!("no buffer for component {i}"),
                });
            }
            slice::from_raw_parts_mut(dst.data, samples.len()).copy_from_slice(samples);
        }
    }
    Ok(guard)
}

/// Owned `opj_image_t`.
struct Image(*mut opj::opj_image_t);

impl Drop for Image {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { opj::opj_image_destroy(self.0) };
        }
    }
}

/// Owned `opj_codec_t` with its message handlers installed.
struct Codec {
    raw: *mut opj::opj_codec_t,
    last_error: Box<RefCell<Option<String>>>,
}

impl Codec {
    fn decompressor(format: Format) -> IoResult<Self> {
        let raw = unsafe { opj::opj_create_decompress(codec_format(format)?) };
        Self::wrap(raw, "decompressor")
    }

    fn compressor(format: Format) -> IoResult<Self> {
        let raw = unsafe { opj::opj_create_compress(codec_format(format)?) };
        Self::wrap(raw, "compressor")
    }

    fn wrap(raw: *mut opj::opj_codec_t, what: &str) -> IoResult<Self> {
        if raw.is_null() {
            return Err(IoError::CodecSetup(format!("failed to create {what}")));
        }
        let codec = Self {
            raw,
            last_error: Box::new(RefCell::new(None)),
        };
        let sink = ptr::from_ref::<RefCell<Option<String>>>(&codec.last_error).cast_mut();
        // SAFETY: `sink` lives in a box that outlives the codec handle.
        unsafe {
            opj::opj_set_info_handler(raw, Some(info_handler), ptr::null_mut());
            opj::opj_set_warning_handler(raw, Some(warning_handler), ptr::null_mut());
            opj::opj_set_error_handler(raw, Some(error_handler), sink.cast());
        }
        Ok(codec)
    }

    /// `step`, followed by the codec's last error message if there is one.
    fn failure(&self, step: &str) -> String {
        match self.last_error.borrow().as_deref() {
            Some(msg) => format!("{step}: {msg}"),
            None => step.to_owned(),
        }
    }
}

impl Drop for Codec {
    fn drop(&mut self) {
        unsafe { opj::opj_destroy_codec(self.raw) };
    }
}

/// Owned `opj_stream_t` over a boxed cursor.
struct Stream<S> {
    raw: *mut opj::opj_stream_t,
    state: Box<S>,
}

impl<S: Seek> Stream<S> {
    fn create(state: S, input: bool) -> IoResult<Self> {
        let raw = unsafe { opj::opj_stream_create(STREAM_CHUNK_SIZE, c_int::from(input)) };
        if raw.is_null() {
            return Err(io::Error::other("failed to create codec stream").into());
        }
        let mut state = Box::new(state);
        // SAFETY: the boxed state outlives `raw`, see `Drop`.
        unsafe {
            opj::opj_stream_set_user_data(raw, ptr::from_mut::<S>(&mut state).cast(), None);
            opj::opj_stream_set_skip_function(raw, Some(skip_fn::<S>));
            opj::opj_stream_set_seek_function(raw, Some(seek_fn::<S>));
        }
        Ok(Self { raw, state })
    }
}

impl<'a> Stream<Cursor<&'a [u8]>> {
    fn reader(data: &'a [u8]) -> IoResult<Self> {
        let stream = Self::create(Cursor::new(data), true)?;
        unsafe {
            opj::opj_stream_set_user_data_length(stream.raw, data.len() as u64);
            opj::opj_stream_set_read_function(stream.raw, Some(read_fn));
        }
        Ok(stream)
    }
}

impl Stream<Cursor<Vec<u8>>> {
    fn writer() -> IoResult<Self> {
        let stream = Self::create(Cursor::new(Vec::new()), false)?;
        unsafe { opj::opj_stream_set_write_function(stream.raw, Some(write_fn)) };
        Ok(stream)
    }

    /// Closes the stream and returns everything written to it.
    fn into_bytes(mut self) -> Vec<u8> {
        unsafe { opj::opj_stream_destroy(self.raw) };
        self.raw = ptr::null_mut();
        mem::take(self.state.get_mut())
    }
}

impl<S> Drop for Stream<S> {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe { opj::opj_stream_destroy(self.raw) };
        }
    }
}

// Stream callbacks. OpenJPEG signals end of stream and write errors with
// (OPJ_SIZE_T)-1, skip errors with -1 and seek errors with OPJ_FALSE.

unsafe extern "C" fn read_fn(buffer: *mut c_void, len: usize, user: *mut c_void) -> usize {
    if len == 0 {
        return 0;
    }
    let (cursor, out) = unsafe {
        (
            &mut *user.cast::<Cursor<&[u8]>>(),
            slice::from_raw_parts_mut(buffer.cast::<u8>(), len),
        )
    };
    match cursor.read(out) {
        Ok(0) | Err(_) => usize::MAX,
        Ok(n) => n,
    }
}

unsafe extern "C" fn write_fn(buffer: *mut c_void, len: usize, user: *mut c_void) -> usize {
    if len == 0 {
        return 0;
    }
    let (cursor, input) = unsafe {
        (
            &mut *user.cast::<Cursor<Vec<u8>>>(),
            slice::from_raw_parts(buffer.cast::<u8>().cast_const(), len),
        )
    };
    match cursor.write_all(input) {
        Ok(()) => len,
        Err(_) => usize::MAX,
    }
}

unsafe extern "C" fn skip_fn<S: Seek>(offset: i64, user: *mut c_void) -> i64 {
    let cursor = unsafe { &mut *user.cast::<S>() };
    match cursor.seek(SeekFrom::Current(offset)) {
        Ok(_) => offset,
        Err(_) => -1,
    }
}

unsafe extern "C" fn seek_fn<S: Seek>(offset: i64, user: *mut c_void) -> c_int {
    let Ok(offset) = u64::try_from(offset) else {
        return 0;
    };
    let cursor = unsafe { &mut *user.cast::<S>() };
    c_int::from(cursor.seek(SeekFrom::Start(offset)).is_ok())
}

// Message callbacks.

unsafe fn message(msg: *const c_char) -> Option<String> {
    if msg.is_null() {
        return None;
    }
    let text = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
    Some(text.trim_end().to_owned())
}

unsafe extern "C" fn info_handler(msg: *const c_char, _client: *mut c_void) {
    if let Some(msg) = unsafe { message(msg) } {
        debug!(target: "jp2pix::openjpeg", "{msg}");
    }
}

unsafe extern "C" fn warning_handler(msg: *const c_char, _client: *mut c_void) {
    if let Some(msg) = unsafe { message(msg) } {
        warn!(target: "jp2pix::openjpeg", "{msg}");
    }
}

unsafe extern "C" fn error_handler(msg: *const c_char, client: *mut c_void) {
    let Some(msg) = (unsafe { message(msg) }) else {
        return;
    };
    error!(target: "jp2pix::openjpeg", "{msg}");
    if !client.is_null() {
        let sink = unsafe { &*client.cast::<RefCell<Option<String>>>() };
        if let Ok(mut last) = sink.try_borrow_mut() {
            *last = Some(msg);
        }
    }
}
