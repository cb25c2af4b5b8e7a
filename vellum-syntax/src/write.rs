//! Writing objects in their textual representation.

use crate::object::{Array, Dict, Name, ObjRef, Object, PdfString};
use crate::trivia::{is_delimiter_character, is_regular_character, is_white_space_character};

/// Serializes objects into bytes.
#[derive(Debug, Default, Clone)]
pub struct Serializer {
    buf: Vec<u8>,
    tight: bool,
    ascii: bool,
    indent: usize,
}

impl Serializer {
    /// Create a new serializer.
    ///
    /// In tight mode, white space is only written where it's needed to
    /// separate two tokens. In ASCII mode, binary strings are written in hex.
    pub fn new(tight: bool, ascii: bool) -> Self {
        Self {
            buf: vec![],
            tight,
            ascii,
            indent: 0,
        }
    }

    /// Return the serialized bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Write a direct object.
    pub fn write(&mut self, obj: &impl WriteDirect) {
        obj.write_direct(self);
    }

    /// Write an indirect object, optionally followed by stream data.
    pub fn write_indirect(&mut self, num: i32, gen_num: i32, obj: &Object, stream: Option<&[u8]>) {
        self.raw(format!("{num} {gen_num} obj\n").as_bytes());
        self.write(obj);
        self.raw(b"\n");

        if let Some(data) = stream {
            self.raw(b"stream\n");
            self.raw(data);
            self.raw(b"\nendstream\n");
        }

        self.raw(b"endobj\n");
    }

    /// Write bytes without any separation.
    pub(crate) fn raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write a token, separating it from the previous one if needed.
    fn token(&mut self, data: &[u8]) {
        // Written output only ends in `/` after an empty name.
        if let (Some(last), Some(first)) = (self.buf.last(), data.first())
            && (is_regular_character(*last) || *last == b'/')
            && is_regular_character(*first)
        {
            self.buf.push(b' ');
        }

        self.raw(data);
    }

    fn newline(&mut self) {
        self.buf.push(b'\n');
        self.buf.extend(std::iter::repeat_n(b' ', self.indent * 2));
    }
}

/// Objects that can be written directly.
pub trait WriteDirect {
    /// Write the object.
    fn write_direct(&self, s: &mut Serializer);
}

impl WriteDirect for Object {
    fn write_direct(&self, s: &mut Serializer) {
        match self {
            Self::Null => s.token(b"null"),
            Self::Boolean(true) => s.token(b"true"),
            Self::Boolean(false) => s.token(b"false"),
            Self::Integer(i) => s.token(i.to_string().as_bytes()),
            Self::Real(r) => s.token(format_real(*r).as_bytes()),
            Self::String(st) => st.write_direct(s),
            Self::Name(n) => n.write_direct(s),
            Self::Array(a) => a.write_direct(s),
            Self::Dict(d) => d.write_direct(s),
            Self::Ref(r) => r.write_direct(s),
        }
    }
}

fn format_real(r: f64) -> String {
    if !r.is_finite() {
        return "0".to_string();
    }

    r.to_string()
}

impl WriteDirect for ObjRef {
    fn write_direct(&self, s: &mut Serializer) {
        s.token(format!("{} {} R", self.num, self.gen_num).as_bytes());
    }
}

impl WriteDirect for Name {
    fn write_direct(&self, s: &mut Serializer) {
        let mut out = vec![b'/'];

        for &b in self.as_bytes() {
            if is_delimiter_character(b) || is_white_space_character(b) || b == b'#' || !(33..127).contains(&b) {
                out.extend_from_slice(format!("#{b:02X}").as_bytes());
            } else {
                out.push(b);
            }
        }

        s.raw(&out);
    }
}

fn is_binary(data: &[u8]) -> bool {
    data.iter()
        .any(|&b| !matches!(b, 0x20..=0x7e | b'\n' | b'\r' | b'\t' | 0x08 | 0x0c))
}

fn literal_len(data: &[u8]) -> usize {
    data.iter()
        .map(|&b| match b {
            b'\n' | b'\r' | b'\t' | 0x08 | 0x0c | b'(' | b')' | b'\\' => 2,
            _ if !(32..127).contains(&b) => 4,
            _ => 1,
        })
        .sum()
}

impl WriteDirect for PdfString {
    fn write_direct(&self, s: &mut Serializer) {
        let data = self.as_bytes();

        let hex = (s.ascii && is_binary(data))
            || data.starts_with(&[0xff, 0xfe])
            || (data.starts_with(&[0xfe, 0xff]) && literal_len(data) > data.len() * 2);

        if hex {
            let mut out = Vec::with_capacity(data.len() * 2 + 2);
            out.push(b'<');

            for b in data {
                out.extend_from_slice(format!("{b:02x}").as_bytes());
            }

            out.push(b'>');
            s.raw(&out);

            return;
        }

        let mut out = Vec::with_capacity(data.len() + 2);
        out.push(b'(');

        for &b in data {
            match b {
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                b'\t' => out.extend_from_slice(b"\\t"),
                0x08 => out.extend_from_slice(b"\\b"),
                0x0c => out.extend_from_slice(b"\\f"),
                b'(' => out.extend_from_slice(b"\\("),
                b')' => out.extend_from_slice(b"\\)"),
                b'\\' => out.extend_from_slice(b"\\\\"),
                _ if !(32..127).contains(&b) => {
                    out.extend_from_slice(format!("\\{b:03o}").as_bytes());
                }
                _ => out.push(b),
            }
        }

        out.push(b')');
        s.raw(&out);
    }
}

impl WriteDirect for Array {
    fn write_direct(&self, s: &mut Serializer) {
        s.raw(b"[");

        for item in self.iter() {
            if !s.tight {
                s.raw(b" ");
            }

            item.write_direct(s);
        }

        if !s.tight {
            s.raw(b" ");
        }

        s.raw(b"]");
    }
}

impl WriteDirect for Dict {
    fn write_direct(&self, s: &mut Serializer) {
        s.raw(b"<<");
        s.indent += 1;

        for (key, value) in self.iter() {
            if !s.tight {
                s.newline();
            }

            key.write_direct(s);

            if !s.tight {
                s.raw(b" ");
            }

            value.write_direct(s);
        }

        s.indent -= 1;

        if !s.tight {
            s.newline();
        }

        s.raw(b">>");
    }
}

impl Object {
    /// Serialize the object.
    pub fn to_bytes(&self, tight: bool) -> Vec<u8> {
        let mut s = Serializer::new(tight, false);
        s.write(self);
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::names;
    use crate::parse::parse_object;

    fn tight(obj: &Object) -> String {
        String::from_utf8(obj.to_bytes(true)).unwrap()
    }

    #[test]
    fn tight_separation() {
        let array: Array = [Object::Integer(1), Object::Integer(2), Object::Name(names::TYPE)]
            .into_iter()
            .collect();
        array.push(ObjRef::new(3, 0)).unwrap();
        array.push(true).unwrap();
        assert_eq!(tight(&array.into()), "[1 2/Type 3 0 R true]");
    }

    #[test]
    fn loose_dicts() {
        let dict = Dict::new();
        dict.put(names::TYPE, names::PAGE).unwrap();
        let inner = Dict::new();
        inner.put("A", 1).unwrap();
        dict.put("Inner", inner).unwrap();

        let written = String::from_utf8(Object::from(dict).to_bytes(false)).unwrap();
        assert_eq!(written, "<<\n  /Type /Page\n  /Inner <<\n    /A 1\n  >>\n>>");
    }

    #[test]
    fn string_escapes() {
        let s = Object::from(PdfString::new(b"a(b)\\\n\x01\xff".to_vec()));
        assert_eq!(tight(&s), "(a\\(b\\)\\\\\\n\\001\\377)");
    }

    #[test]
    fn hex_strings() {
        let s = Object::from(PdfString::new(vec![0xff, 0xfe, 0x41, 0x00]));
        assert_eq!(tight(&s), "<fffe4100>");

        let mut ser = Serializer::new(true, true);
        ser.write(&Object::from(PdfString::new(vec![0x00, 0x41])));
        assert_eq!(ser.finish(), b"<0041>");
    }

    #[test]
    fn name_escapes() {
        let n = Object::Name(Name::new(b"A B#(\xe9"));
        assert_eq!(tight(&n), "/A#20B#23#28#E9");
    }

    #[test]
    fn empty_names_stay_separate() {
        let array: Array = [Object::Name(Name::new(b"")), Object::Integer(1)]
            .into_iter()
            .collect();
        array.push(true).unwrap();
        array.push(Name::new(b"")).unwrap();
        array.push(names::TYPE).unwrap();

        let obj = Object::from(array);
        assert_eq!(tight(&obj), "[/ 1/ true//Type]");

        let parsed = parse_object(&obj.to_bytes(true)).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 5);
        assert_eq!(parsed.compare_deep(&obj), std::cmp::Ordering::Equal);
    }

    #[test]
    fn reals() {
        assert_eq!(tight(&Object::Real(0.5)), "0.5");
        assert_eq!(tight(&Object::Real(-3.25)), "-3.25");
    }

    #[test]
    fn indirect() {
        let mut s = Serializer::new(true, false);
        s.write_indirect(7, 1, &Object::Integer(5), Some(b"data"));
        assert_eq!(
            s.finish(),
            b"7 1 obj\n5\nstream\ndata\nendstream\nendobj\n"
        );
    }

    #[test]
    fn round_trip() {
        let dict = Dict::new();
        dict.put(names::TYPE, names::PAGE).unwrap();
        dict.put("Str", PdfString::new(b"x\ty(\x7f)".to_vec())).unwrap();
        dict.put("Name", Name::new(b"we ird#"))
            .unwrap();
        dict.put(
            "Arr",
            [Object::Real(1.5), Object::Null, Object::from(ObjRef::new(2, 0))]
                .into_iter()
                .collect::<Array>(),
        )
        .unwrap();

        let obj = Object::from(dict);

        for tight in [true, false] {
            let parsed = parse_object(&obj.to_bytes(tight)).unwrap();
            assert_eq!(parsed.compare_deep(&obj), std::cmp::Ordering::Equal);
        }
    }
}
