//! Registration metadata for host image libraries.
//!
//! A host loader binds to [`JP2_FORMAT`]: name, MIME types, extensions,
//! byte-signature patterns and capability flags. Nothing here is mutable;
//! the host reads the descriptor instead of having a callback table filled
//! in for it.
//!
//! # Example
//!
//! ```rust
//! use jp2pix_io::registry::JP2_FORMAT;
//!
//! let header = [0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' ', 0x0D, 0x0A, 0x87, 0x0A];
//! assert_eq!(JP2_FORMAT.relevance(&header), 100);
//! assert!(JP2_FORMAT.supports_extension("J2K"));
//! ```

/// Capabilities a format advertises to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCapability {
    /// Can be decoded.
    Read,
    /// Can be encoded.
    Write,
    /// Calls may run concurrently on different images.
    ThreadSafe,
}

/// Byte signature with a per-byte mask.
///
/// Mask characters, one per pattern byte:
///
/// | mask | header byte must              |
/// |------|-------------------------------|
/// | `' '`| equal the pattern byte        |
/// | `'!'`| differ from the pattern byte  |
/// | `'x'`| anything                      |
/// | `'z'`| be zero                       |
/// | `'n'`| be non-zero                   |
///
/// An empty mask means every byte must match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignaturePattern {
    /// Pattern bytes, compared from offset 0.
    pub bytes: &'static [u8],
    /// Mask string; see the type docs.
    pub mask: &'static [u8],
    /// Match confidence, 0..=100.
    pub relevance: u32,
}

impl SignaturePattern {
    /// Whether `header` satisfies the pattern.
    pub fn matches(&self, header: &[u8]) -> bool {
        if header.len() < self.bytes.len() {
            return false;
        }
        self.bytes.iter().zip(header).enumerate().all(|(i, (&p, &h))| {
            match self.mask.get(i).copied().unwrap_or(b' ') {
                b'!' => h != p,
                b'x' => true,
                b'z' => h == 0,
                b'n' => h != 0,
                _ => h == p,
            }
        })
    }
}

/// Static description of a loadable format.
#[derive(Debug, Clone, Copy)]
pub struct FormatInfo {
    /// Short identifier.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// MIME types.
    pub mime_types: &'static [&'static str],
    /// File extensions without dots.
    pub extensions: &'static [&'static str],
    /// Header signatures.
    pub signatures: &'static [SignaturePattern],
    /// Advertised capabilities.
    pub capabilities: &'static [FormatCapability],
    /// License of the loader.
    pub license: &'static str,
}

impl FormatInfo {
    /// Highest relevance among matching signatures, 0 when none match.
    pub fn relevance(&self, header: &[u8]) -> u32 {
        self.signatures
            .iter()
            .filter(|s| s.matches(header))
            .map(|s| s.relevance)
            .max()
            .unwrap_or(0)
    }

    /// Whether any signature matches.
    pub fn can_read(&self, header: &[u8]) -> bool {
        self.relevance(header) > 0
    }

    /// Case-insensitive extension check.
    pub fn supports_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// MIME type check.
    pub fn supports_mime(&self, mime: &str) -> bool {
        self.mime_types.iter().any(|m| m.eq_ignore_ascii_case(mime))
    }

    /// Whether `cap` is advertised.
    pub fn has_capability(&self, cap: FormatCapability) -> bool {
        self.capabilities.contains(&cap)
    }
}

/// JPEG 2000 (JP2 box or raw codestream).
pub static JP2_FORMAT: FormatInfo = FormatInfo {
    name: "jp2",
    description: "JPEG2000",
    mime_types: &[
        "image/jp2",
        "image/jpm",
        "image/jpx",
        "image/jpeg2000",
        "image/x-jp2-codestream",
    ],
    extensions: &["j2c", "j2k", "jp2", "jpc", "jpf", "jpm", "jpx"],
    signatures: &[
        // Box header: any length except spaces, then type "jP".
        SignaturePattern {
            bytes: b"    jP",
            mask: b"!!!!  ",
            relevance: 100,
        },
        // SOC, SIZ, high byte of Lsiz.
        SignaturePattern {
            bytes: &[0xFF, 0x4F, 0xFF, 0x51, 0x00],
            mask: b"",
            relevance: 100,
        },
    ],
    capabilities: &[
        FormatCapability::Read,
        FormatCapability::Write,
        FormatCapability::ThreadSafe,
    ],
    license: "LGPL",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::JP2_RFC3745_MAGIC;

    #[test]
    fn test_jp2_box_signature() {
        assert_eq!(JP2_FORMAT.relevance(&JP2_RFC3745_MAGIC), 100);
        // Length bytes of spaces are rejected by the '!' mask.
        assert!(!JP2_FORMAT.can_read(b"    jP  \r\n\x87\n"));
    }

    #[test]
    fn test_codestream_signature() {
        assert!(JP2_FORMAT.can_read(&[0xFF, 0x4F, 0xFF, 0x51, 0x00, 0x2F]));
        assert!(!JP2_FORMAT.can_read(&[0xFF, 0x4F, 0xFF, 0x51, 0x01]));
        assert!(!JP2_FORMAT.can_read(&[0xFF, 0x4F]));
    }

    #[test]
    fn test_mask_kinds() {
        let p = SignaturePattern {
            bytes: b"ab\0\0",
            mask: b"xzn!",
            relevance: 50,
        };
        assert!(p.matches(&[b'?', 0, 7, b'c']));
        assert!(!p.matches(&[b'?', 1, 7, b'c']));
        assert!(!p.matches(&[b'?', 0, 0, b'c']));
        assert!(!p.matches(&[b'?', 0, 7, 0]));
    }

    #[test]
    fn test_metadata() {
        assert!(JP2_FORMAT.supports_extension(".jpx"));
        assert!(JP2_FORMAT.supports_extension("J2C"));
        assert!(!JP2_FORMAT.supports_extension("png"));
        assert!(JP2_FORMAT.supports_mime("image/x-jp2-codestream"));
        assert!(JP2_FORMAT.has_capability(FormatCapability::Write));
        assert_eq!(JP2_FORMAT.name, "jp2");
    }
}
