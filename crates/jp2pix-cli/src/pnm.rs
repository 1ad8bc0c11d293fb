//! Minimal 8-bit PPM (P6) and PAM (P7) reader/writer for the CLI.

use anyhow::{bail, ensure, Context, Result};
use std::path::Path;

/// Interleaved 8-bit RGB or RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub data: Vec<u8>,
}

/// Serializes pixels as P6 (RGB only) or P7.
pub fn encode(width: u32, height: u32, channels: usize, data: &[u8], pam: bool) -> Result<Vec<u8>> {
    ensure!(
        channels == 3 || channels == 4,
        "{channels} channels cannot be written as PNM"
    );
    let header = if pam {
        let tupltype = if channels == 4 { "RGB_ALPHA" } else { "RGB" };
        format!(
            "P7\nWIDTH {width}\nHEIGHT {height}\nDEPTH {channels}\nMAXVAL 255\nTUPLTYPE {tupltype}\nENDHDR\n"
        )
    } else {
        ensure!(channels == 3, "PPM cannot hold alpha");
        format!("P6\n{width} {height}\n255\n")
    };
    let mut out = Vec::with_capacity(header.len() + data.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    Ok(out)
}

/// Parses a P6 or P7 file.
pub fn decode(bytes: &[u8]) -> Result<Pixmap> {
    let mut header = Header { bytes, pos: 0 };
    let (width, height, channels) = match header.token()? {
        "P6" => {
            let width = header.number("width")?;
            let height = header.number("height")?;
            let maxval = header.number("maxval")?;
            ensure!(maxval == 255, "only 8-bit PPM is supported (maxval {maxval})");
            // Exactly one whitespace byte separates the header from the raster.
            header.pos += 1;
            (width, height, 3)
        }
        "P7" => header.pam_fields()?,
        magic => bail!("not a PPM/PAM file (magic {magic:?})"),
    };

    let len = width as usize * height as usize * channels;
    let data = bytes
        .get(header.pos..header.pos + len)
        .with_context(|| format!("raster truncated: expected {len} bytes"))?
        .to_vec();
    Ok(Pixmap {
        width,
        height,
        channels,
        data,
    })
}

/// Reads a P6 or P7 file.
pub fn read(path: &Path) -> Result<Pixmap> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    decode(&bytes).with_context(|| format!("Failed to parse: {}", path.display()))
}

/// Writes pixels, as PAM when `path` ends in `.pam`.
pub fn write(path: &Path, width: u32, height: u32, channels: usize, data: &[u8]) -> Result<()> {
    let pam = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pam"));
    let bytes = encode(width, height, channels, data, pam)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write: {}", path.display()))
}

struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    /// Next whitespace-delimited token, skipping `#` comments.
    fn token(&mut self) -> Result<&'a str> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'#') => {
                    while self.bytes.get(self.pos).is_some_and(|&b| b != b'\n') {
                        self.pos += 1;
                    }
                }
                Some(_) => break,
                None => bail!("unexpected end of header"),
            }
        }
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|b| !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).context("header is not ASCII")
    }

    fn number(&mut self, what: &str) -> Result<u32> {
        let token = self.token()?;
        token
            .parse()
            .with_context(|| format!("invalid {what}: {token:?}"))
    }

    /// Reads `KEY value` pairs up to `ENDHDR`.
    fn pam_fields(&mut self) -> Result<(u32, u32, usize)> {
        let (mut width, mut height, mut depth, mut maxval) = (None, None, None, None);
        loop {
            match self.token()? {
                "WIDTH" => width = Some(self.number("width")?),
                "HEIGHT" => height = Some(self.number("height")?),
                "DEPTH" => depth = Some(self.number("depth")?),
                "MAXVAL" => maxval = Some(self.number("maxval")?),
                "TUPLTYPE" => {
                    self.token()?;
                }
                "ENDHDR" => break,
                other => bail!("unknown PAM header field {other:?}"),
            }
        }
        self.pos += 1;

        let (Some(width), Some(height), Some(depth)) = (width, height, depth) else {
            bail!("PAM header lacks WIDTH, HEIGHT or DEPTH");
        };
        ensure!(maxval == Some(255), "only 8-bit PAM is supported");
        ensure!(
            depth == 3 || depth == 4,
            "PAM depth {depth} is not RGB or RGBA"
        );
        Ok((width, height, depth as usize))
    }
}
