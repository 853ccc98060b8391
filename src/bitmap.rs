//! P1 PBM bitmap decoding
//!
//! Weather icons ship as plain-text netpbm bitmaps: a `P1` magic token,
//! width and height, then `width * height` 0/1 tokens in row-major order.
//! Lines whose first character is `#` are comments and are skipped whole;
//! `#` has no meaning mid-line.

use crate::error::{BitmapError, BitmapResult};

/// A decoded monochrome bitmap. Immutable once decoded; `bits` holds
/// exactly `width * height` entries in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Bitmap {
    /// Build a bitmap from raw bits. Panics unless `bits` holds exactly
    /// `width * height` entries.
    pub fn from_bits(width: usize, height: usize, bits: Vec<bool>) -> Self {
        assert_eq!(
            bits.len(),
            width * height,
            "bit count must match the bitmap dimensions"
        );
        Self { width, height, bits }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bit at `(x, y)`; row 0 is the top row
    pub fn bit(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }
}

/// Decode a P1 PBM byte stream into a bitmap.
///
/// Trailing data after the final pixel token is not validated; the device
/// icons occasionally carry editor noise past the pixel section.
pub fn decode(input: &[u8]) -> BitmapResult<Bitmap> {
    let text = String::from_utf8_lossy(input);
    let mut tokens = text
        .lines()
        .filter(|line| !line.starts_with('#'))
        .flat_map(str::split_whitespace);

    match tokens.next() {
        Some("P1") => {}
        found => {
            return Err(BitmapError::BadMagic {
                found: found.map(str::to_string),
            })
        }
    }

    let width = parse_dimension(tokens.next())?;
    let height = parse_dimension(tokens.next())?;

    let expected = width * height;
    let mut bits = Vec::with_capacity(expected);
    while bits.len() < expected {
        match tokens.next() {
            Some("0") => bits.push(false),
            Some("1") => bits.push(true),
            Some(other) => {
                return Err(BitmapError::InvalidBit {
                    token: other.to_string(),
                })
            }
            None => {
                return Err(BitmapError::Truncated {
                    expected,
                    received: bits.len(),
                })
            }
        }
    }

    Ok(Bitmap { width, height, bits })
}

fn parse_dimension(token: Option<&str>) -> BitmapResult<usize> {
    let token = token.ok_or_else(|| BitmapError::InvalidHeader {
        token: String::new(),
    })?;
    match token.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(BitmapError::InvalidHeader {
            token: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple_bitmap() {
        let bitmap = decode(b"P1\n2 2\n1 0\n0 1\n").unwrap();
        assert_eq!(bitmap.width(), 2);
        assert_eq!(bitmap.height(), 2);
        assert!(bitmap.bit(0, 0));
        assert!(!bitmap.bit(1, 0));
        assert!(!bitmap.bit(0, 1));
        assert!(bitmap.bit(1, 1));
    }

    #[test]
    fn test_decode_skips_comment_lines() {
        let input = b"# created by an icon editor\nP1\n# 4 wide, 1 tall\n4 1\n1 1 0 1\n";
        let bitmap = decode(input).unwrap();
        assert_eq!(bitmap.width(), 4);
        assert_eq!(bitmap.height(), 1);
        assert!(bitmap.bit(3, 0));
    }

    #[test]
    fn test_decode_tokens_split_across_lines() {
        // The format is token-oriented; line breaks carry no meaning.
        let bitmap = decode(b"P1 3\n1 1 0\n1").unwrap();
        assert_eq!(bitmap.width(), 3);
        assert_eq!(bitmap.height(), 1);
        assert!(!bitmap.bit(1, 0));
    }

    #[test]
    fn test_decode_crlf_line_endings() {
        let bitmap = decode(b"P1\r\n2 1\r\n1 0\r\n").unwrap();
        assert!(bitmap.bit(0, 0));
        assert!(!bitmap.bit(1, 0));
    }

    #[test]
    fn test_decode_missing_magic() {
        let err = decode(b"P4\n2 2\n").unwrap_err();
        assert!(
            matches!(err, BitmapError::BadMagic { found: Some(ref t) } if t == "P4"),
            "got {err:?}"
        );

        let err = decode(b"").unwrap_err();
        assert!(matches!(err, BitmapError::BadMagic { found: None }));
    }

    #[test]
    fn test_decode_truncated_pixel_data() {
        let err = decode(b"P1\n2 2\n1 0 1\n").unwrap_err();
        assert!(
            matches!(err, BitmapError::Truncated { expected: 4, received: 3 }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_decode_rejects_bad_dimensions() {
        assert!(matches!(
            decode(b"P1\nfour 1\n").unwrap_err(),
            BitmapError::InvalidHeader { .. }
        ));
        assert!(matches!(
            decode(b"P1\n0 3\n").unwrap_err(),
            BitmapError::InvalidHeader { .. }
        ));
        assert!(matches!(
            decode(b"P1\n2\n").unwrap_err(),
            BitmapError::InvalidHeader { .. }
        ));
    }

    #[test]
    fn test_decode_rejects_bad_pixel_token() {
        let err = decode(b"P1\n2 1\n1 2\n").unwrap_err();
        assert!(
            matches!(err, BitmapError::InvalidBit { ref token } if token == "2"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_decode_ignores_trailing_data() {
        let bitmap = decode(b"P1\n1 1\n1\nstray tokens here\n").unwrap();
        assert_eq!(bitmap.width(), 1);
        assert!(bitmap.bit(0, 0));
    }
}
