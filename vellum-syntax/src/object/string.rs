//! Strings.

use std::cell::OnceCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

struct Repr {
    data: Box<[u8]>,
    text: OnceCell<String>,
}

/// A PDF string.
///
/// Strings are immutable byte sequences. Their decoded text is computed on
/// first use and cached.
#[derive(Clone)]
pub struct PdfString(Rc<Repr>);

impl PdfString {
    /// Create a new string from raw bytes.
    pub fn new(data: impl Into<Box<[u8]>>) -> Self {
        Self(Rc::new(Repr {
            data: data.into(),
            text: OnceCell::new(),
        }))
    }

    /// Create a string holding the given text, encoded as PDFDocEncoding if
    /// possible and as UTF-16BE otherwise.
    pub fn from_text(text: &str) -> Self {
        let encoded = encode_pdf_doc(text).unwrap_or_else(|| {
            let mut data = vec![0xfe, 0xff];
            for unit in text.encode_utf16() {
                data.extend_from_slice(&unit.to_be_bytes());
            }
            data
        });

        Self::new(encoded)
    }

    /// The raw bytes of the string.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0.data
    }

    /// The number of bytes in the string.
    pub fn len(&self) -> usize {
        self.0.data.len()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.data.is_empty()
    }

    /// The decoded text of the string.
    pub fn to_text(&self) -> &str {
        self.0.text.get_or_init(|| decode_text(&self.0.data))
    }

    pub(crate) fn refs(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl PartialEq for PdfString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PdfString {}

impl Debug for PdfString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl From<&[u8]> for PdfString {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl From<Vec<u8>> for PdfString {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&str> for PdfString {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

/// Decode the bytes of a text string.
pub(crate) fn decode_text(data: &[u8]) -> String {
    if let Some(rest) = data.strip_prefix(&[0xfe, 0xff]) {
        decode_utf16(rest, u16::from_be_bytes)
    } else if let Some(rest) = data.strip_prefix(&[0xff, 0xfe]) {
        decode_utf16(rest, u16::from_le_bytes)
    } else if let Some(rest) = data.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        data.iter().map(|b| pdf_doc_char(*b)).collect()
    }
}

fn decode_utf16(data: &[u8], convert: fn([u8; 2]) -> u16) -> String {
    let units = data.chunks_exact(2).map(|c| convert([c[0], c[1]]));

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

// Code points of PDFDocEncoding that differ from Latin-1.
const LOW_TABLE: [u16; 8] = [
    0x02d8, 0x02c7, 0x02c6, 0x02d9, 0x02dd, 0x02db, 0x02da, 0x02dc,
];

const HIGH_TABLE: [u16; 33] = [
    0x2022, 0x2020, 0x2021, 0x2026, 0x2014, 0x2013, 0x0192, 0x2044, 0x2039, 0x203a, 0x2212,
    0x2030, 0x201e, 0x201c, 0x201d, 0x2018, 0x2019, 0x201a, 0x2122, 0xfb01, 0xfb02, 0x0141,
    0x0152, 0x0160, 0x0178, 0x017d, 0x0131, 0x0142, 0x0153, 0x0161, 0x017e, 0xfffd, 0x20ac,
];

fn pdf_doc_char(b: u8) -> char {
    let code = match b {
        0x18..=0x1f => LOW_TABLE[(b - 0x18) as usize],
        0x7f => 0xfffd,
        0x80..=0xa0 => HIGH_TABLE[(b - 0x80) as usize],
        _ => b as u16,
    };

    char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn encode_pdf_doc(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            match code {
                0x00..=0x17 | 0x20..=0x7e | 0xa1..=0xff => Some(code as u8),
                _ => (0x18..=0xa0u8).find(|b| {
                    !matches!(b, 0x20..=0x7e) && pdf_doc_char(*b) == c && c != '\u{fffd}'
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_doc_encoding() {
        let s = PdfString::new(b"Hello \x80 \xa0".to_vec());
        assert_eq!(s.to_text(), "Hello \u{2022} \u{20ac}");
    }

    #[test]
    fn utf16_be() {
        let s = PdfString::new(vec![0xfe, 0xff, 0x00, 0x48, 0x00, 0x69]);
        assert_eq!(s.to_text(), "Hi");
    }

    #[test]
    fn utf16_le() {
        let s = PdfString::new(vec![0xff, 0xfe, 0x48, 0x00, 0x69, 0x00]);
        assert_eq!(s.to_text(), "Hi");
    }

    #[test]
    fn utf8_bom() {
        let s = PdfString::new(vec![0xef, 0xbb, 0xbf, 0xc3, 0xa9]);
        assert_eq!(s.to_text(), "\u{e9}");
    }

    #[test]
    fn text_is_cached() {
        let s = PdfString::new(b"abc".to_vec());
        let first = s.to_text().as_ptr();
        assert_eq!(first, s.to_text().as_ptr());
    }

    #[test]
    fn from_text() {
        assert_eq!(PdfString::from_text("abc").as_bytes(), b"abc");
        assert_eq!(PdfString::from_text("\u{2022}").as_bytes(), &[0x80]);
        let wide = PdfString::from_text("\u{4e2d}");
        assert_eq!(wide.as_bytes(), &[0xfe, 0xff, 0x4e, 0x2d]);
        assert_eq!(wide.to_text(), "\u{4e2d}");
    }
}
