//! Image info command.
//!
//! Shows the container, the codec's component layout and the 8-bit layout
//! the image normalizes to (or why it can't).

use crate::InfoArgs;
use anyhow::{Context, Result};
use jp2pix_core::{rowstride, ImageDescriptor};
use jp2pix_io::Format;
use std::path::Path;
use tracing::trace;

/// Runs the info command.
pub fn run(args: InfoArgs, threads: u32, verbose: u8) -> Result<()> {
    let loader = super::loader(threads, 0);
    for path in &args.input {
        trace!(path = %path.display(), "info::run");
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
        let (format, image) = loader
            .decode_planar(&bytes)
            .with_context(|| format!("Failed to decode: {}", path.display()))?;

        print_text(path, &image, format, bytes.len() as u64, verbose);
        match loader.classifier().classify(&image) {
            Ok(c) => {
                println!("  Layout:     {}", c.layout);
                println!(
                    "  Output:     {} ({} bytes/row)",
                    if c.has_alpha() { "RGBA8" } else { "RGB8" },
                    rowstride(image.width(), c.output_components)
                );
            }
            Err(e) => println!("  Output:     unsupported ({e})"),
        }

        if args.input.len() > 1 {
            println!();
        }
    }
    Ok(())
}

fn print_text(path: &Path, image: &ImageDescriptor, format: Format, file_size: u64, verbose: u8) {
    println!("{}", path.display());
    println!("  Container:  {format} ({})", format.mime_type());
    println!("  Resolution: {}x{}", image.width(), image.height());
    println!("  Colorspace: {}", image.colorspace());
    println!("  Components: {}", image.num_components());
    println!("  File size:  {}", super::format_size(file_size));

    if verbose > 0 {
        let (x0, y0) = image.origin();
        println!("  Origin:     {x0},{y0}");
        for (i, c) in image.components().iter().enumerate() {
            println!(
                "    [{i}] {}x{} {}-bit {} dx={} dy={}",
                c.width(),
                c.height(),
                c.precision(),
                if c.is_signed() { "signed" } else { "unsigned" },
                c.dx(),
                c.dy()
            );
        }
    }
}
