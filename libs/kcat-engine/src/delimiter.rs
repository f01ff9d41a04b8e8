/// Delimiter specification that resolves to nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid delimiter: empty specification")]
pub struct DelimiterError;

/// Resolve a delimiter specification to a single byte.
///
/// Accepted forms, first match wins:
/// `\xNN` (one or two hex digits), `\n`, `\t`, otherwise the first byte of
/// `spec` as-is. Longer strings are truncated to their first byte.
pub fn parse_delimiter(spec: &str) -> Result<u8, DelimiterError> {
    let bytes = spec.as_bytes();
    let first = *bytes.first().ok_or(DelimiterError)?;

    if let Some(hex) = bytes.strip_prefix(b"\\x") {
        let digits = hex.iter().take(2).take_while(|b| b.is_ascii_hexdigit()).count();
        if digits > 0 {
            // digits are ASCII hex, so the slice is valid UTF-8 and fits a u8
            let text = std::str::from_utf8(&hex[..digits]).map_err(|_| DelimiterError)?;
            return u8::from_str_radix(text, 16).map_err(|_| DelimiterError);
        }
    }

    match spec {
        "\\n" => Ok(b'\n'),
        "\\t" => Ok(b'\t'),
        _ => Ok(first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hex_byte_round_trips() {
        for value in 0u8..=255 {
            assert_eq!(parse_delimiter(&format!("\\x{value:02x}")), Ok(value));
            assert_eq!(parse_delimiter(&format!("\\x{value:02X}")), Ok(value));
        }
    }

    #[test]
    fn single_hex_digit() {
        assert_eq!(parse_delimiter("\\x9"), Ok(0x09));
        assert_eq!(parse_delimiter("\\xa"), Ok(0x0a));
    }

    #[test]
    fn extra_hex_digits_are_ignored() {
        assert_eq!(parse_delimiter("\\x414"), Ok(0x41));
    }

    #[test]
    fn named_escapes() {
        assert_eq!(parse_delimiter("\\n"), Ok(b'\n'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
    }

    #[test]
    fn literal_first_byte() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("abc"), Ok(b'a'));
        assert_eq!(parse_delimiter("\n"), Ok(b'\n'));
        // multi-byte UTF-8 truncates to the lead byte
        assert_eq!(parse_delimiter("é"), Ok(0xc3));
    }

    #[test]
    fn backslash_x_without_digits_is_literal_backslash() {
        assert_eq!(parse_delimiter("\\x"), Ok(b'\\'));
        assert_eq!(parse_delimiter("\\xzz"), Ok(b'\\'));
    }

    #[test]
    fn empty_spec_is_rejected() {
        assert_eq!(parse_delimiter(""), Err(DelimiterError));
    }
}
