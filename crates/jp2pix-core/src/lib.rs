//! # jp2pix-core
//!
//! Colorspace normalization for JPEG 2000 images.
//!
//! A JPEG 2000 codec hands back planar components of arbitrary precision,
//! signedness and subsampling. This crate turns them into one interleaved
//! 8-bit RGB or RGBA raster, and back:
//!
//! - [`ImageDescriptor`] / [`Component`] - the planar image as decoded
//! - [`classify`] - picks the [`PixelLayout`] or rejects the image
//! - [`pack`] / [`pack_image`] - planar to interleaved [`PackedRaster`]
//! - [`unpack`] - interleaved RGB(A)8 to planar, for encoding
//! - [`rowstride`] - byte pitch of a packed row
//!
//! ## Pipeline
//!
//! ```text
//! codec ──> ImageDescriptor ──> classify ──> pack ──> PackedRaster
//!                 ^                                       │
//!                 └──────────────── unpack <──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use jp2pix_core::{pack_image, ColorSpace, Component, ImageDescriptor};
//!
//! let y = Component::new(2, 2, 8, vec![128; 4])?;
//! let cb = Component::new(1, 1, 8, vec![128])?.with_subsampling(2, 2)?;
//! let cr = Component::new(1, 1, 8, vec![128])?.with_subsampling(2, 2)?;
//! let image = ImageDescriptor::new(vec![y, cb, cr], ColorSpace::Sycc)?;
//!
//! let raster = pack_image(&image)?;
//! assert_eq!(raster.rowstride(), 6);
//! assert!(raster.data().iter().all(|&v| v == 128));
//! # Ok::<(), jp2pix_core::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! `jp2pix-core` knows nothing about codestreams or files; `jp2pix-io` sniffs
//! the container, drives the codec and calls into this crate.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod classify;
pub mod descriptor;
pub mod error;
pub mod pack;
pub mod raster;
pub mod unpack;

pub use classify::{classify, guess_from_component_count, AmbiguousPolicy, Classification, Classifier, PixelLayout};
pub use descriptor::{ColorSpace, Component, ImageDescriptor, MAX_PRECISION};
pub use error::{Error, Result};
pub use pack::{pack, pack_image};
pub use raster::{rowstride, PackedRaster, ReleaseHook};
pub use unpack::{unpack, unpack_raster};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::classify::{classify, Classification, PixelLayout};
    pub use crate::descriptor::{ColorSpace, Component, ImageDescriptor};
    pub use crate::error::{Error, Result};
    pub use crate::pack::{pack, pack_image};
    pub use crate::raster::{rowstride, PackedRaster};
    pub use crate::unpack::unpack;
}
