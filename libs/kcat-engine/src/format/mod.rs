//! Output format strings: compiled once into a token list, executed per message.
//!
//! | token | renders |
//! |-------|---------|
//! | `%s`  | payload |
//! | `%S`  | payload length, `-1` for null |
//! | `%k`  | key |
//! | `%K`  | key length, `-1` for null |
//! | `%t`  | topic |
//! | `%p`  | partition |
//! | `%o`  | offset |
//! | `\n` `\r` `\t` | newline, carriage return, tab |
//! | `\xN`..`\xNNN` | byte with that hex value (truncated to 8 bits) |

mod render;

pub use render::{RenderOptions, Renderer};

/// Message attribute referenced by a format token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Payload,
    PayloadLen,
    Key,
    KeyLen,
    Topic,
    Partition,
    Offset,
}

impl Field {
    fn from_specifier(c: char) -> Option<Self> {
        Some(match c {
            's' => Field::Payload,
            'S' => Field::PayloadLen,
            'k' => Field::Key,
            'K' => Field::KeyLen,
            't' => Field::Topic,
            'p' => Field::Partition,
            'o' => Field::Offset,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(Vec<u8>),
    Field(Field),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("invalid format: unsupported formatter '%{0}'")]
    UnknownSpecifier(char),

    #[error("invalid format: '%' at end of format string")]
    DanglingPercent,
}

/// Immutable, ready-to-run output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFormat {
    tokens: Vec<Token>,
}

impl CompiledFormat {
    pub fn compile(fmt: &str) -> Result<Self, FormatError> {
        let mut tokens = Vec::new();
        let mut literal = Vec::new();
        let mut chars = fmt.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '%' => {
                    let (_, spec) = chars.next().ok_or(FormatError::DanglingPercent)?;
                    let field = Field::from_specifier(spec).ok_or(FormatError::UnknownSpecifier(spec))?;
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Field(field));
                }
                '\\' => match chars.peek().map(|&(_, c)| c) {
                    Some('n') => {
                        chars.next();
                        literal.push(b'\n');
                    }
                    Some('r') => {
                        chars.next();
                        literal.push(b'\r');
                    }
                    Some('t') => {
                        chars.next();
                        literal.push(b'\t');
                    }
                    Some('x') => {
                        let hex: String = fmt[i + 2..]
                            .chars()
                            .take(3)
                            .take_while(char::is_ascii_hexdigit)
                            .collect();
                        match u16::from_str_radix(&hex, 16) {
                            Ok(value) => {
                                chars.next();
                                for _ in 0..hex.len() {
                                    chars.next();
                                }
                                literal.push((value & 0xff) as u8);
                            }
                            // no digits: keep the backslash, 'x' follows as a literal
                            Err(_) => literal.push(b'\\'),
                        }
                    }
                    _ => literal.push(b'\\'),
                },
                _ => {
                    let mut utf8 = [0u8; 4];
                    literal.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Ok(Self { tokens })
    }

    /// Format used when none is given: `[%o<K>][%k<K>]%s<D>`.
    ///
    /// `delimiter` and `key_delimiter` are delimiter specifications in
    /// format-string syntax, e.g. `\n`.
    pub fn default_for(
        delimiter: &str,
        key_delimiter: Option<&str>,
        print_offset: bool,
    ) -> Result<Self, FormatError> {
        Self::compile(&default_format_string(delimiter, key_delimiter, print_offset))
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Build the default format string. `%` inside delimiters is escaped as
/// `\x25` so it never reads as a specifier.
pub fn default_format_string(delimiter: &str, key_delimiter: Option<&str>, print_offset: bool) -> String {
    let escape = |s: &str| s.replace('%', "\\x25");
    let delimiter = escape(delimiter);
    let key_delimiter = key_delimiter.map(escape);

    let mut fmt = String::new();
    if print_offset {
        fmt.push_str("%o");
        fmt.push_str(key_delimiter.as_deref().unwrap_or(&delimiter));
    }
    if let Some(kd) = &key_delimiter {
        fmt.push_str("%k");
        fmt.push_str(kd);
    }
    fmt.push_str("%s");
    fmt.push_str(&delimiter);
    fmt
}
