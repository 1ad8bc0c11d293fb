//! CLI command implementations

pub mod decode;
pub mod encode;
pub mod info;

use jp2pix_io::openjpeg::OpenJpeg;
use jp2pix_io::{DecodeOptions, Jp2Loader};

/// OpenJPEG-backed loader with the given decoder settings.
pub fn loader(threads: u32, reduce: u32) -> Jp2Loader<OpenJpeg> {
    Jp2Loader::new(OpenJpeg).with_decode_options(
        DecodeOptions::new()
            .with_threads(threads)
            .with_reduce(reduce),
    )
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
