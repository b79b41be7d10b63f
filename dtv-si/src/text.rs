//! DVB/ATSC text field decoding.
//!
//! DVB text fields start with an encoding selector byte (or byte pair)
//! choosing between legacy 8-bit code pages, UCS-2 and UTF-8
//! (EN 300 468 annex A). In-band control codes mark emphasis runs
//! (0x86 on, 0x87 off) and line breaks (0x8A); these are stripped from
//! the primary output, with the emphasized run surfaced separately.
//!
//! The ISO-6937 default code page has no conversion table here; text in
//! it (or in any selector we have no decoder for) falls back to a lossy
//! byte-wise copy with a warning instead of failing the table decode.

use encoding_rs::Encoding;
use log::warn;

/// Decoded text field: the full text plus any emphasized run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DvbString {
    /// Full text, control codes stripped.
    pub text: String,
    /// Concatenation of the emphasis-marked runs, if any.
    pub emphasized: Option<String>,
}

impl DvbString {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Map the leading selector byte(s) to an encoding.
///
/// Returns the encoding (None for the ISO-6937 default, which has no
/// decoder here), the number of selector bytes consumed, and whether
/// the payload is 16-bit coded.
fn select_encoding(raw: &[u8]) -> (Option<&'static Encoding>, usize, bool) {
    if raw.is_empty() || raw[0] >= 0x20 {
        return (None, 0, false);
    }
    match raw[0] {
        0x01 => (Some(encoding_rs::ISO_8859_5), 1, false),
        0x02 => (Some(encoding_rs::ISO_8859_6), 1, false),
        0x03 => (Some(encoding_rs::ISO_8859_7), 1, false),
        0x04 => (Some(encoding_rs::ISO_8859_8), 1, false),
        // 8859-9 and -11 are decoded through their windows supersets.
        0x05 => (Some(encoding_rs::WINDOWS_1254), 1, false),
        0x06 => (Some(encoding_rs::ISO_8859_10), 1, false),
        0x07 => (Some(encoding_rs::WINDOWS_874), 1, false),
        0x09 => (Some(encoding_rs::ISO_8859_13), 1, false),
        0x0A => (Some(encoding_rs::ISO_8859_14), 1, false),
        0x0B => (Some(encoding_rs::ISO_8859_15), 1, false),
        0x10 => {
            if raw.len() < 3 {
                return (None, raw.len(), false);
            }
            let enc = match (raw[1], raw[2]) {
                (0x00, 0x01) => Some(encoding_rs::WINDOWS_1252),
                (0x00, 0x02) => Some(encoding_rs::ISO_8859_2),
                (0x00, 0x03) => Some(encoding_rs::ISO_8859_3),
                (0x00, 0x04) => Some(encoding_rs::ISO_8859_4),
                (0x00, 0x05) => Some(encoding_rs::ISO_8859_5),
                (0x00, 0x06) => Some(encoding_rs::ISO_8859_6),
                (0x00, 0x07) => Some(encoding_rs::ISO_8859_7),
                (0x00, 0x08) => Some(encoding_rs::ISO_8859_8),
                (0x00, 0x09) => Some(encoding_rs::WINDOWS_1254),
                (0x00, 0x0A) => Some(encoding_rs::ISO_8859_10),
                (0x00, 0x0B) => Some(encoding_rs::WINDOWS_874),
                (0x00, 0x0D) => Some(encoding_rs::ISO_8859_13),
                (0x00, 0x0E) => Some(encoding_rs::ISO_8859_14),
                (0x00, 0x0F) => Some(encoding_rs::ISO_8859_15),
                _ => None,
            };
            (enc, 3, false)
        }
        0x11 | 0x14 => (Some(encoding_rs::UTF_16BE), 1, true),
        0x12 => (Some(encoding_rs::EUC_KR), 1, false),
        0x13 => (Some(encoding_rs::GBK), 1, false),
        0x15 => (Some(encoding_rs::UTF_8), 1, false),
        _ => (None, 1, false),
    }
}

/// Decode one DVB text field into its primary and emphasized parts.
///
/// Never fails: selectors without a decoder degrade to a lossy copy.
pub fn decode_text(raw: &[u8]) -> DvbString {
    let (encoding, skip, wide) = select_encoding(raw);
    let body = &raw[skip.min(raw.len())..];

    if wide {
        return decode_ucs2(body, encoding.unwrap_or(encoding_rs::UTF_16BE));
    }

    // EN 300 468 table A.1 single-byte control codes.
    let mut main = Vec::with_capacity(body.len());
    let mut emph = Vec::new();
    let mut emphasis = false;
    for &b in body {
        match b {
            0x86 => emphasis = true,
            0x87 if emphasis => emphasis = false,
            0x8A => main.push(b'\n'),
            0x20..=0x7F | 0xA0..=0xFF => {
                main.push(b);
                if emphasis {
                    emph.push(b);
                }
            }
            _ => {}
        }
    }

    let decode = |bytes: &[u8]| -> String {
        match encoding {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => {
                // ISO-6937 default or an unknown selector; ASCII is a
                // common subset, anything above it passes through as
                // Latin-1.
                if raw.first().copied().unwrap_or(0x20) < 0x20 {
                    warn!(
                        "text: no decoder for encoding selector 0x{:02x}, copying raw bytes",
                        raw[0]
                    );
                }
                bytes.iter().map(|&b| b as char).collect()
            }
        }
    };

    let text = decode(&main);
    let emphasized = if emph.is_empty() {
        None
    } else {
        Some(decode(&emph))
    };
    DvbString { text, emphasized }
}

/// Decode a 16-bit coded field, honoring the table A.2 control codes.
fn decode_ucs2(body: &[u8], enc: &'static Encoding) -> DvbString {
    let mut main = Vec::with_capacity(body.len());
    let mut emph = Vec::new();
    let mut emphasis = false;
    for pair in body.chunks_exact(2) {
        let code = u16::from_be_bytes([pair[0], pair[1]]);
        match code {
            0xE086 => emphasis = true,
            0xE087 if emphasis => emphasis = false,
            0xE08A => main.extend_from_slice(&[0x00, b'\n']),
            0xE080..=0xE09F => {}
            _ => {
                main.extend_from_slice(pair);
                if emphasis {
                    emph.extend_from_slice(pair);
                }
            }
        }
    }

    let text = enc.decode(&main).0.into_owned();
    let emphasized = if emph.is_empty() {
        None
    } else {
        Some(enc.decode(&emph).0.into_owned())
    };
    DvbString { text, emphasized }
}
