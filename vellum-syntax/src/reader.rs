//! A byte reader.

use crate::trivia::{is_eol_character, is_regular_character, is_white_space_character};

/// A cursor over a byte slice.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    #[inline]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    #[inline]
    pub(crate) fn jump(&mut self, offset: usize) {
        self.offset = offset;
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub(crate) fn tail(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }

    #[inline]
    pub(crate) fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let v = self.peek_bytes(len)?;
        self.offset += len;

        Some(v)
    }

    #[inline]
    pub(crate) fn read_byte(&mut self) -> Option<u8> {
        let v = self.peek_byte()?;
        self.offset += 1;

        Some(v)
    }

    #[inline]
    pub(crate) fn peek_bytes(&self, len: usize) -> Option<&'a [u8]> {
        self.data.get(self.offset..self.offset.checked_add(len)?)
    }

    #[inline]
    pub(crate) fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// Eat the next byte if it satisfies the condition.
    #[inline]
    pub(crate) fn eat(&mut self, f: impl Fn(u8) -> bool) -> Option<u8> {
        let val = self.peek_byte()?;

        if f(val) {
            self.forward();
            Some(val)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn forward(&mut self) {
        self.offset += 1;
    }

    /// Advance the offset if the next bytes match `tag`.
    #[inline]
    pub(crate) fn forward_tag(&mut self, tag: &[u8]) -> Option<()> {
        if self.peek_bytes(tag.len())? == tag {
            self.offset += tag.len();
            Some(())
        } else {
            None
        }
    }

    /// Advance the offset while bytes satisfy the predicate and return the
    /// skipped bytes.
    #[inline]
    pub(crate) fn forward_while(&mut self, f: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.offset;

        while self.peek_byte().is_some_and(&f) {
            self.forward();
        }

        &self.data[start..self.offset]
    }

    /// Skip white space and comments.
    pub(crate) fn skip_white_spaces_and_comments(&mut self) {
        while let Some(b) = self.peek_byte() {
            if is_white_space_character(b) {
                self.forward();
            } else if b == b'%' {
                self.forward_while(|b| !is_eol_character(b));
            } else {
                return;
            }
        }
    }

    /// Skip a single end-of-line marker, if there is one.
    pub(crate) fn skip_eol(&mut self) {
        if self.forward_tag(b"\r\n").is_none() {
            self.eat(is_eol_character);
        }
    }

    /// Read a run of regular characters, such as a keyword or a number.
    pub(crate) fn read_token(&mut self) -> &'a [u8] {
        self.forward_while(is_regular_character)
    }

    /// Read `keyword` if it's the next token.
    pub(crate) fn forward_keyword(&mut self, keyword: &[u8]) -> Option<()> {
        let start = self.offset;

        if self.read_token() == keyword {
            Some(())
        } else {
            self.offset = start;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_keywords() {
        let mut r = Reader::new(b"  % comment\r\n endobj");
        r.skip_white_spaces_and_comments();
        assert!(r.forward_keyword(b"end").is_none());
        assert!(r.forward_keyword(b"endobj").is_some());
        assert!(r.at_end());
    }

    #[test]
    fn eol() {
        let mut r = Reader::new(b"\r\nx");
        r.skip_eol();
        assert_eq!(r.peek_byte(), Some(b'x'));
    }
}
