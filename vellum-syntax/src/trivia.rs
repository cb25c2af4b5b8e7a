//! Character classes of the PDF object syntax.

#[inline(always)]
pub(crate) fn is_white_space_character(char: u8) -> bool {
    matches!(char, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
}

#[inline(always)]
pub(crate) fn is_delimiter_character(char: u8) -> bool {
    matches!(
        char,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

#[inline(always)]
pub(crate) fn is_regular_character(char: u8) -> bool {
    !is_white_space_character(char) && !is_delimiter_character(char)
}

#[inline(always)]
pub(crate) fn is_eol_character(char: u8) -> bool {
    matches!(char, 0x0a | 0x0d)
}

#[inline(always)]
pub(crate) fn is_octal_digit(char: u8) -> bool {
    matches!(char, b'0'..=b'7')
}

#[inline(always)]
pub(crate) fn is_digit(char: u8) -> bool {
    char.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert!(is_white_space_character(b' '));
        assert!(is_white_space_character(0x00));
        assert!(is_delimiter_character(b'/'));
        assert!(is_regular_character(b'#'));
        assert!(!is_regular_character(b'%'));
        assert!(is_octal_digit(b'7'));
        assert!(!is_octal_digit(b'8'));
    }
}
