//! Parsing objects from their textual representation.

use crate::error::{Error, FormatError, Result};
use crate::object::name::names;
use crate::object::{Array, Dict, Name, ObjRef, Object, PdfString};
use crate::reader::Reader;
use crate::trivia::{is_digit, is_octal_digit, is_regular_character, is_white_space_character};

const MAX_NESTING_DEPTH: usize = 256;

/// An indirect object as it appears in a file.
#[derive(Debug, Clone)]
pub struct IndirectObject {
    /// The object number.
    pub num: i32,
    /// The generation number.
    pub gen_num: i32,
    /// The object.
    pub obj: Object,
    /// The raw data, if the object is a stream.
    pub stream: Option<Vec<u8>>,
}

/// A parser for the object syntax.
pub struct Parser<'a> {
    r: Reader<'a>,
    lenient: bool,
}

impl<'a> Parser<'a> {
    /// Create a new strict parser.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            r: Reader::new(data),
            lenient: false,
        }
    }

    /// Skip tokens that can't appear where they are instead of failing.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// The current byte offset.
    pub fn offset(&self) -> usize {
        self.r.offset()
    }

    /// Whether only white space and comments are left.
    pub fn at_end(&mut self) -> bool {
        self.r.skip_white_spaces_and_comments();
        self.r.at_end()
    }

    /// Parse the next object.
    pub fn parse_object(&mut self) -> Result<Object> {
        self.object(0)
    }

    /// Parse an indirect object of the form `N G obj ... endobj`.
    pub fn parse_indirect(&mut self) -> Result<IndirectObject> {
        let num = self.parse_int()? as i32;
        let gen_num = self.parse_int()? as i32;
        self.expect_keyword(b"obj")?;
        let obj = self.parse_object()?;

        self.r.skip_white_spaces_and_comments();

        let stream = if self.r.forward_keyword(b"stream").is_some() {
            Some(self.stream_data(&obj)?)
        } else {
            None
        };

        if let Err(e) = self.expect_keyword(b"endobj") {
            if !self.lenient {
                return Err(e);
            }

            lwarn!("missing endobj for object {num} {gen_num}");
        }

        Ok(IndirectObject {
            num,
            gen_num,
            obj,
            stream,
        })
    }

    /// Parse an unsigned integer token.
    pub(crate) fn parse_int(&mut self) -> Result<i64> {
        self.r.skip_white_spaces_and_comments();
        let start = self.r.offset();
        let token = self.r.forward_while(is_digit);

        parse_ascii::<i64>(token).ok_or(self.syntax_error_at(start))
    }

    /// Consume `keyword`, which must be the next token.
    pub(crate) fn expect_keyword(&mut self, keyword: &[u8]) -> Result<()> {
        self.r.skip_white_spaces_and_comments();

        self.r
            .forward_keyword(keyword)
            .ok_or_else(|| self.syntax_error())
    }

    /// Return the next regular token without consuming it.
    pub(crate) fn peek_keyword(&mut self) -> &'a [u8] {
        self.r.skip_white_spaces_and_comments();
        let start = self.r.offset();
        let token = self.r.read_token();
        self.r.jump(start);

        token
    }

    /// Read `len` raw bytes, preceded by a single end-of-line marker.
    pub(crate) fn raw_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.r.skip_eol();
        self.r.read_bytes(len).ok_or_else(|| self.syntax_error())
    }

    fn syntax_error(&self) -> Error {
        self.syntax_error_at(self.r.offset())
    }

    fn syntax_error_at(&self, offset: usize) -> Error {
        FormatError::Syntax { offset }.into()
    }

    fn object(&mut self, depth: usize) -> Result<Object> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::Limit);
        }

        self.r.skip_white_spaces_and_comments();

        let Some(b) = self.r.peek_byte() else {
            return Err(self.syntax_error());
        };

        match b {
            b'/' => self.name().map(Object::Name),
            b'(' => self.literal_string().map(Object::String),
            b'[' => self.array(depth),
            b'<' => {
                if self.r.peek_bytes(2) == Some(b"<<") {
                    self.dict(depth)
                } else {
                    self.hex_string().map(Object::String)
                }
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.number(),
            _ => {
                let start = self.r.offset();

                match self.r.read_token() {
                    b"null" => Ok(Object::Null),
                    b"true" => Ok(Object::Boolean(true)),
                    b"false" => Ok(Object::Boolean(false)),
                    _ => Err(self.syntax_error_at(start)),
                }
            }
        }
    }

    fn number(&mut self) -> Result<Object> {
        let start = self.r.offset();
        let token = self.r.read_token();

        if token.iter().all(|b| is_digit(*b)) {
            if let Some(r) = self.reference(token) {
                return Ok(Object::Ref(r));
            }
        }

        if let Some(i) = parse_ascii::<i64>(token) {
            return Ok(Object::Integer(i));
        }

        if let Some(f) = parse_ascii::<f64>(token).filter(|f| f.is_finite()) {
            return Ok(Object::Real(f));
        }

        if self.lenient {
            lwarn!("invalid number at offset {start}");

            return Ok(Object::Integer(0));
        }

        Err(self.syntax_error_at(start))
    }

    /// Try to read the rest of an `N G R` reference, where `N` was already
    /// consumed.
    fn reference(&mut self, num: &[u8]) -> Option<ObjRef> {
        let start = self.r.offset();

        let result = (|| {
            let num = parse_ascii::<i32>(num)?;
            self.r.skip_white_spaces_and_comments();
            let gen_num = parse_ascii::<i32>(self.r.forward_while(is_digit))?;

            if self.r.peek_byte().is_some_and(is_regular_character) {
                return None;
            }

            self.r.skip_white_spaces_and_comments();
            self.r.forward_keyword(b"R")?;

            Some(ObjRef::new(num, gen_num))
        })();

        if result.is_none() {
            self.r.jump(start);
        }

        result
    }

    fn name(&mut self) -> Result<Name> {
        self.r.forward();
        let raw = self.r.read_token();

        if !raw.contains(&b'#') {
            return Ok(Name::new(raw));
        }

        let mut unescaped = Vec::with_capacity(raw.len());
        let mut i = 0;

        while i < raw.len() {
            let decoded = (raw[i] == b'#')
                .then(|| raw.get(i + 1..i + 3))
                .flatten()
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());

            match decoded {
                Some(b) => {
                    unescaped.push(b);
                    i += 3;
                }
                None => {
                    unescaped.push(raw[i]);
                    i += 1;
                }
            }
        }

        Ok(Name::new(&unescaped))
    }

    fn literal_string(&mut self) -> Result<PdfString> {
        let start = self.r.offset();
        self.r.forward();

        let mut data = vec![];
        let mut depth = 1;

        loop {
            let Some(b) = self.r.read_byte() else {
                return Err(self.syntax_error_at(start));
            };

            match b {
                b'(' => {
                    depth += 1;
                    data.push(b);
                }
                b')' => {
                    depth -= 1;

                    if depth == 0 {
                        break;
                    }

                    data.push(b);
                }
                b'\\' => {
                    let Some(next) = self.r.read_byte() else {
                        return Err(self.syntax_error_at(start));
                    };

                    match next {
                        b'n' => data.push(b'\n'),
                        b'r' => data.push(b'\r'),
                        b't' => data.push(b'\t'),
                        b'b' => data.push(0x08),
                        b'f' => data.push(0x0c),
                        b'\r' => {
                            self.r.eat(|b| b == b'\n');
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut value = (next - b'0') as u32;

                            for _ in 0..2 {
                                match self.r.eat(is_octal_digit) {
                                    Some(d) => value = value * 8 + (d - b'0') as u32,
                                    None => break,
                                }
                            }

                            // Overflowing escapes keep the low byte.
                            data.push(value as u8);
                        }
                        other => data.push(other),
                    }
                }
                b'\r' => {
                    self.r.eat(|b| b == b'\n');
                    data.push(b'\n');
                }
                other => data.push(other),
            }
        }

        Ok(PdfString::new(data))
    }

    fn hex_string(&mut self) -> Result<PdfString> {
        let start = self.r.offset();
        self.r.forward();

        let mut data = vec![];
        let mut high = None;

        loop {
            let Some(b) = self.r.read_byte() else {
                return Err(self.syntax_error_at(start));
            };

            let nibble = match b {
                b'>' => break,
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ if is_white_space_character(b) => continue,
                _ if self.lenient => {
                    lwarn!("invalid character in hex string at offset {}", self.r.offset() - 1);
                    continue;
                }
                _ => return Err(self.syntax_error_at(self.r.offset() - 1)),
            };

            match high.take() {
                Some(h) => data.push((h << 4) | nibble),
                None => high = Some(nibble),
            }
        }

        // An odd number of digits behaves as if followed by a zero.
        if let Some(h) = high {
            data.push(h << 4);
        }

        Ok(PdfString::new(data))
    }

    fn array(&mut self, depth: usize) -> Result<Object> {
        self.r.forward();
        let mut items = vec![];

        loop {
            self.r.skip_white_spaces_and_comments();

            match self.r.peek_byte() {
                Some(b']') => {
                    self.r.forward();
                    break;
                }
                None => return Err(self.syntax_error()),
                _ => items.push(self.object(depth + 1)?),
            }
        }

        Ok(Object::Array(items.into_iter().collect::<Array>()))
    }

    fn dict(&mut self, depth: usize) -> Result<Object> {
        self.r.forward_tag(b"<<");
        let dict = Dict::new();

        loop {
            self.r.skip_white_spaces_and_comments();

            match self.r.peek_byte() {
                Some(b'>') => {
                    self.r
                        .forward_tag(b">>")
                        .ok_or_else(|| self.syntax_error())?;
                    break;
                }
                Some(b'/') => {
                    let key = self.name()?;
                    self.r.skip_white_spaces_and_comments();

                    let value = if self.r.peek_bytes(2) == Some(b">>") && self.lenient {
                        lwarn!("missing value for key {key:?}");
                        Object::Null
                    } else {
                        self.object(depth + 1)?
                    };

                    dict.put(key, value)?;
                }
                None => return Err(self.syntax_error()),
                _ if self.lenient => {
                    let offset = self.r.offset();
                    lwarn!("skipping garbage in dictionary at offset {offset}");

                    if self.object(depth + 1).is_err() {
                        self.r.jump(offset);

                        if self.r.read_token().is_empty() {
                            self.r.forward();
                        }
                    }
                }
                _ => return Err(self.syntax_error()),
            }
        }

        Ok(Object::Dict(dict))
    }

    fn stream_data(&mut self, obj: &Object) -> Result<Vec<u8>> {
        self.r.skip_eol();
        let start = self.r.offset();

        let declared = obj
            .as_dict()
            .and_then(|d| d.get(&names::LENGTH))
            .and_then(|l| match l {
                Object::Integer(i) => usize::try_from(i).ok(),
                _ => None,
            });

        if let Some(len) = declared
            && let Some(data) = self.r.read_bytes(len)
        {
            self.r.skip_white_spaces_and_comments();

            if self.r.forward_keyword(b"endstream").is_some() {
                return Ok(data.to_vec());
            }
        }

        // The length is missing or wrong, look for the end marker instead.
        self.r.jump(start);
        let tail = self.r.tail();

        let Some(end) = memchr::memmem::find(tail, b"endstream") else {
            return Err(self.syntax_error_at(start));
        };

        let mut data = &tail[..end];

        if let Some(stripped) = data.strip_suffix(b"\r\n") {
            data = stripped;
        } else if let Some(stripped) = data.strip_suffix(b"\n") {
            data = stripped;
        } else if let Some(stripped) = data.strip_suffix(b"\r") {
            data = stripped;
        }

        self.r.jump(start + end + b"endstream".len());

        Ok(data.to_vec())
    }
}

fn parse_ascii<T: std::str::FromStr>(token: &[u8]) -> Option<T> {
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Parse a single object, which must span all of `data`.
pub fn parse_object(data: &[u8]) -> Result<Object> {
    let mut parser = Parser::new(data);
    let obj = parser.parse_object()?;

    if !parser.at_end() {
        return Err(FormatError::Syntax {
            offset: parser.offset(),
        }
        .into());
    }

    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_objects() {
        assert_eq!(parse_object(b"null").unwrap(), Object::Null);
        assert_eq!(parse_object(b" true ").unwrap(), Object::Boolean(true));
        assert_eq!(parse_object(b"-12").unwrap(), Object::Integer(-12));
        assert_eq!(parse_object(b".5").unwrap(), Object::Real(0.5));
        assert_eq!(parse_object(b"/Type").unwrap(), Object::Name(names::TYPE));
    }

    #[test]
    fn references() {
        let obj = parse_object(b"[1 0 R 2 3]").unwrap();
        let array = obj.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(0).unwrap().to_object_number(), 1);
        assert_eq!(array.get(1), Some(Object::Integer(2)));
    }

    #[test]
    fn literal_strings() {
        let obj = parse_object(b"(a\\(b\\)\\n\\101\\\n(nested))").unwrap();
        assert_eq!(obj.to_string_bytes(), b"a(b)\nA(nested)");
    }

    #[test]
    fn hex_strings() {
        let obj = parse_object(b"<48 65 6c6C6f 7>").unwrap();
        assert_eq!(obj.to_string_bytes(), b"Hello\x70");
    }

    #[test]
    fn escaped_names() {
        let obj = parse_object(b"/A#20B#").unwrap();
        assert_eq!(obj.to_name().as_bytes(), b"A B#");
    }

    #[test]
    fn dicts() {
        let obj = parse_object(b"<</Type/Page/Kids[]/Count 0>>").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get_name(&names::TYPE), Some(names::PAGE));
        assert_eq!(dict.get_int(&names::COUNT), Some(0));
    }

    #[test]
    fn garbage_in_dicts() {
        assert!(parse_object(b"<</A 1 garbage /B 2>>").is_err());

        let obj = Parser::new(b"<</A 1 garbage /B 2>>")
            .lenient(true)
            .parse_object()
            .unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get_int(b"B"), Some(2));
    }

    #[test]
    fn indirect_stream() {
        let data = b"4 0 obj\n<</Length 5>>\nstream\nhello\nendstream\nendobj";
        let indirect = Parser::new(data).parse_indirect().unwrap();
        assert_eq!(indirect.num, 4);
        assert_eq!(indirect.stream.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn stream_with_wrong_length() {
        let data = b"4 0 obj\n<</Length 2>>\nstream\r\nhello\r\nendstream\nendobj";
        let indirect = Parser::new(data).parse_indirect().unwrap();
        assert_eq!(indirect.stream.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn trailing_garbage() {
        assert!(parse_object(b"1 2").is_err());
    }
}
