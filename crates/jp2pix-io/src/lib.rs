//! # jp2pix-io
//!
//! JPEG 2000 loading and saving for 8-bit RGB(A) consumers.
//!
//! This crate is the I/O side of `jp2pix`: it sniffs the container, drives a
//! JPEG 2000 codec and hands the decoded planes to [`jp2pix_core`] for
//! classification and packing.
//!
//! # Architecture
//!
//! - [`Format`] - JP2 box vs. raw codestream detection
//! - [`Jp2Codec`] - the codec seam (OpenJPEG behind the `openjpeg` feature)
//! - [`Jp2Loader`] - sniff, decode, classify, pack; and unpack, encode
//! - [`ImageLoader`] / [`registry::JP2_FORMAT`] - what a host library binds to
//! - [`DecodeOptions`] / [`EncodeOptions`] - codec settings
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use jp2pix_io::jp2;
//!
//! let raster = jp2::read("input.jp2")?;
//! println!("{}x{}, alpha: {}", raster.width(), raster.height(), raster.has_alpha());
//!
//! let bytes = jp2::save(raster.data(), raster.width(), raster.height(), raster.channels(), 8)?;
//! std::fs::write("output.jp2", bytes)?;
//! ```
//!
//! # Custom Codec
//!
//! ```rust,ignore
//! use jp2pix_io::{Jp2Loader, DecodeOptions};
//!
//! let loader = Jp2Loader::new(MyCodec)
//!     .with_decode_options(DecodeOptions::new().with_reduce(1));
//! let raster = loader.read("big.jp2")?;
//! ```
//!
//! # Feature Flags
//!
//! - `openjpeg` - OpenJPEG backend and the `jp2::{load, save, read, write}`
//!   convenience functions

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;
mod options;
mod traits;

pub mod jp2;
#[cfg(feature = "openjpeg")]
pub mod openjpeg;
pub mod registry;

pub use detect::{Format, J2K_CODESTREAM_MAGIC, JP2_MAGIC, JP2_RFC3745_MAGIC, SNIFF_LEN};
pub use error::{IoError, IoResult};
pub use jp2::Jp2Loader;
pub use options::{DecodeOptions, EncodeOptions, DEFAULT_RESOLUTIONS};
pub use traits::{ImageLoader, Jp2Codec, ReadSeek};

pub use jp2pix_core::PackedRaster;
