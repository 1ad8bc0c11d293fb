//! PPM/PAM to JPEG 2000.

use crate::EncodeArgs;
use anyhow::{Context, Result};
use jp2pix_io::openjpeg::OpenJpeg;
use jp2pix_io::{EncodeOptions, Format, Jp2Loader};
use tracing::{info, trace};

/// Runs the encode command.
///
/// The container follows the output extension (`.j2k`, `.j2c`, `.jpc` give a
/// raw codestream, everything else JP2) unless `--codestream` is set.
pub fn run(args: EncodeArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "encode::run");

    let format = if args.codestream {
        Format::J2k
    } else {
        match Format::from_extension(&args.output) {
            Format::J2k => Format::J2k,
            _ => Format::Jp2,
        }
    };
    let mut options = EncodeOptions::new()
        .with_format(format)
        .with_resolutions(args.resolutions);
    if let Some(rate) = args.rate {
        options = options.with_rate(rate);
    }

    let pixmap = crate::pnm::read(&args.input)?;
    let bytes = Jp2Loader::new(OpenJpeg)
        .with_encode_options(options)
        .save(&pixmap.data, pixmap.width, pixmap.height, pixmap.channels, 8)
        .with_context(|| format!("Failed to encode: {}", args.input.display()))?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("Failed to save: {}", args.output.display()))?;

    info!(
        width = pixmap.width,
        height = pixmap.height,
        %format,
        bytes = bytes.len(),
        "Encoded"
    );
    if verbose > 0 {
        println!(
            "Encoded {} -> {} ({}, {})",
            args.input.display(),
            args.output.display(),
            format,
            super::format_size(bytes.len() as u64)
        );
    }
    Ok(())
}
