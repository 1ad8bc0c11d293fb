//! jp2pix - JPEG 2000 to 8-bit RGB(A) and back
//!
//! Inspects JPEG 2000 files, decodes them to PPM/PAM and encodes PPM/PAM
//! rasters into JP2 or raw codestreams.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod pnm;

#[derive(Parser)]
#[command(name = "jp2pix")]
#[command(author, version, about = "JPEG 2000 to 8-bit RGB(A) converter")]
#[command(long_about = "
Decodes JPEG 2000 (JP2 boxes and raw codestreams) into interleaved 8-bit RGB
or RGBA, normalizing grayscale, sYCC 4:4:4/4:2:2/4:2:0 and CMYK sources, and
encodes 8-bit rasters back into JPEG 2000.

Examples:
  jp2pix info image.jp2                 # Show container and component layout
  jp2pix decode image.jp2 -o out.ppm    # Decode to PPM (PAM when alpha)
  jp2pix decode big.jp2 -o half.pam -r 1
  jp2pix encode in.ppm -o out.jp2       # Lossless JP2
  jp2pix encode in.pam -o out.j2k --rate 20

Set RUST_LOG (e.g. RUST_LOG=jp2pix=trace) to override the log level.
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Codec worker threads
    #[arg(short = 'j', long, global = true, default_value = "1")]
    threads: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Display container, components and output layout
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Decode JPEG 2000 to PPM/PAM
    #[command(visible_alias = "d")]
    Decode(DecodeArgs),

    /// Encode PPM/PAM to JPEG 2000
    #[command(visible_alias = "e")]
    Encode(EncodeArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,
}

#[derive(Args)]
struct DecodeArgs {
    /// Input JPEG 2000 file
    input: PathBuf,

    /// Output file (.ppm or .pam)
    #[arg(short, long)]
    output: PathBuf,

    /// Discard this many resolution levels (each halves the size)
    #[arg(short, long, default_value = "0")]
    reduce: u32,
}

#[derive(Args)]
struct EncodeArgs {
    /// Input PPM (P6) or PAM (P7) file
    input: PathBuf,

    /// Output file (.jp2, .j2k, ...)
    #[arg(short, long)]
    output: PathBuf,

    /// Compression ratio (e.g. 20 for 20:1); lossless when omitted
    #[arg(long)]
    rate: Option<f32>,

    /// Wavelet resolution levels
    #[arg(long, default_value_t = jp2pix_io::DEFAULT_RESOLUTIONS)]
    resolutions: u32,

    /// Write a raw codestream regardless of the output extension
    #[arg(long)]
    codestream: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.threads, cli.verbose),
        Commands::Decode(args) => commands::decode::run(args, cli.threads, cli.verbose),
        Commands::Encode(args) => commands::encode::run(args, cli.verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_encode_flags() {
        let cli = Cli::try_parse_from([
            "jp2pix", "-vv", "encode", "in.ppm", "-o", "out.j2k", "--rate", "20",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Encode(args) => {
                assert_eq!(args.rate, Some(20.0));
                assert_eq!(args.resolutions, jp2pix_io::DEFAULT_RESOLUTIONS);
                assert!(!args.codestream);
            }
            _ => panic!("expected encode"),
        }
    }
}
