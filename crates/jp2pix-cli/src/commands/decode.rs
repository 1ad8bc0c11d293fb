//! JPEG 2000 to PPM/PAM.

use crate::DecodeArgs;
use anyhow::{Context, Result};
use tracing::{info, trace, warn};

/// Runs the decode command.
///
/// RGBA output goes to PAM; writing it to a `.ppm` drops the alpha channel.
pub fn run(args: DecodeArgs, threads: u32, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "decode::run");

    let raster = super::loader(threads, args.reduce)
        .read(&args.input)
        .with_context(|| format!("Failed to load: {}", args.input.display()))?;

    let is_ppm = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ppm"));

    let (width, height) = (raster.width(), raster.height());
    if raster.has_alpha() && is_ppm {
        warn!(output = %args.output.display(), "PPM has no alpha channel, dropping it");
        let rgb: Vec<u8> = raster
            .data()
            .chunks_exact(4)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect();
        crate::pnm::write(&args.output, width, height, 3, &rgb)?;
    } else {
        crate::pnm::write(&args.output, width, height, raster.channels(), raster.data())?;
    }

    info!(
        width,
        height,
        channels = raster.channels(),
        output = %args.output.display(),
        "Decoded"
    );
    if verbose > 0 {
        println!(
            "Decoded {} -> {} ({}x{}, {} channels)",
            args.input.display(),
            args.output.display(),
            width,
            height,
            raster.channels()
        );
    }
    raster.release();
    Ok(())
}
