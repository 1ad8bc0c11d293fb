//! Container detection.
//!
//! Looks at the first [`SNIFF_LEN`] bytes of a stream and decides which
//! decode path applies. Rules, checked in order:
//!
//! 1. RFC 3745 signature box (12 bytes) or bare JP2 magic (4 bytes) - [`Format::Jp2`]
//! 2. Raw codestream SOC+SIZ markers (4 bytes) - [`Format::J2k`]
//! 3. Anything else - [`Format::Unknown`]
//!
//! The stream variant, [`Format::sniff`], rewinds to the start afterwards so
//! the decoder sees the whole file.

use crate::IoResult;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Bytes inspected by the sniffer.
pub const SNIFF_LEN: usize = 12;

/// RFC 3745 JP2 signature box: length 12, type `jP  `, payload `\r\n\x87\n`.
pub const JP2_RFC3745_MAGIC: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
];

/// Signature box payload seen at the start of some older JP2 writers' files.
pub const JP2_MAGIC: [u8; 4] = [0x0D, 0x0A, 0x87, 0x0A];

/// SOC marker followed by SIZ marker.
pub const J2K_CODESTREAM_MAGIC: [u8; 4] = [0xFF, 0x4F, 0xFF, 0x51];

/// JPEG 2000 container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Boxed JP2 file.
    #[default]
    Jp2,
    /// Raw codestream (J2K/J2C).
    J2k,
    /// No JPEG 2000 signature.
    Unknown,
}

impl Format {
    /// Detects the container of a file from its magic bytes.
    pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let mut file = File::open(path)?;
        Self::sniff(&mut file)
    }

    /// Detects the container from the head of a stream.
    ///
    /// Reads up to [`SNIFF_LEN`] bytes from the start of the stream, then
    /// seeks back to the start. A stream shorter than that is
    /// [`Format::Unknown`].
    pub fn sniff<R: Read + Seek + ?Sized>(reader: &mut R) -> IoResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; SNIFF_LEN];
        let mut filled = 0;
        while filled < SNIFF_LEN {
            match reader.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self::from_bytes(&header[..filled]))
    }

    /// Detects the container from raw header bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < SNIFF_LEN {
            return Format::Unknown;
        }
        if bytes[..12] == JP2_RFC3745_MAGIC || bytes[..4] == JP2_MAGIC {
            return Format::Jp2;
        }
        if bytes[..4] == J2K_CODESTREAM_MAGIC {
            return Format::J2k;
        }
        Format::Unknown
    }

    /// Detects the container from a file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("jp2") | Some("jpf") | Some("jpx") | Some("jpm") => Format::Jp2,
            Some("j2k") | Some("j2c") | Some("jpc") => Format::J2k,
            _ => Format::Unknown,
        }
    }

    /// Returns the typical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Jp2 => "jp2",
            Format::J2k => "j2k",
            Format::Unknown => "",
        }
    }

    /// Returns the MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Jp2 => "image/jp2",
            Format::J2k => "image/x-jp2-codestream",
            Format::Unknown => "application/octet-stream",
        }
    }

    /// Whether a decoder exists for this container.
    pub fn is_known(&self) -> bool {
        !matches!(self, Format::Unknown)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Format::Jp2 => "JP2",
            Format::J2k => "J2K",
            Format::Unknown => "unknown",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(Format::from_bytes(&JP2_RFC3745_MAGIC), Format::Jp2);

        let mut bare = [0xAA; 12];
        bare[..4].copy_from_slice(&JP2_MAGIC);
        assert_eq!(Format::from_bytes(&bare), Format::Jp2);

        let mut j2k = [0x5A; 12];
        j2k[..4].copy_from_slice(&J2K_CODESTREAM_MAGIC);
        assert_eq!(Format::from_bytes(&j2k), Format::J2k);

        assert_eq!(Format::from_bytes(&[0u8; 12]), Format::Unknown);
    }

    #[test]
    fn test_short_header_is_unknown() {
        assert_eq!(Format::from_bytes(&J2K_CODESTREAM_MAGIC), Format::Unknown);
        assert_eq!(Format::from_bytes(&[]), Format::Unknown);
    }

    #[test]
    fn test_sniff_rewinds() {
        let mut data = JP2_RFC3745_MAGIC.to_vec();
        data.extend_from_slice(&[1, 2, 3, 4]);
        let mut cursor = Cursor::new(data);
        cursor.set_position(5);

        assert_eq!(Format::sniff(&mut cursor).unwrap(), Format::Jp2);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_sniff_short_stream() {
        let mut cursor = Cursor::new(vec![0xFF, 0x4F, 0xFF, 0x51]);
        assert_eq!(Format::sniff(&mut cursor).unwrap(), Format::Unknown);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(Format::from_extension("a.jp2"), Format::Jp2);
        assert_eq!(Format::from_extension("a.JPX"), Format::Jp2);
        assert_eq!(Format::from_extension("a.j2c"), Format::J2k);
        assert_eq!(Format::from_extension("a.jpc"), Format::J2k);
        assert_eq!(Format::from_extension("a.png"), Format::Unknown);
    }

    #[test]
    fn test_format_properties() {
        assert_eq!(Format::Jp2.extension(), "jp2");
        assert_eq!(Format::J2k.mime_type(), "image/x-jp2-codestream");
        assert!(!Format::Unknown.is_known());
        assert_eq!(Format::default(), Format::Jp2);
    }
}
