//! Python string literal decoding.
//!
//! Turns the source text of a single string token (prefix, quotes and body)
//! into the value Python would see. Escapes that Python refuses to compile,
//! such as the `\U` in `"C:\Users"`, are reported as [`EscapeError`] so the
//! caller can treat the file as unparsable.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum LiteralKind {
    Text,
    Bytes,
    Formatted,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct StringLiteral {
    pub kind: LiteralKind,
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct EscapeError {
    pub message: &'static str,
}

pub(crate) fn parse_string_literal(token: &str) -> Result<StringLiteral, EscapeError> {
    let quote_at = token.find(['"', '\'']).unwrap_or(token.len());
    let (prefix, quoted) = token.split_at(quote_at);
    let prefix = prefix.to_ascii_lowercase();
    let raw = prefix.contains('r');
    let kind = if prefix.contains('b') {
        LiteralKind::Bytes
    } else if prefix.contains('f') {
        LiteralKind::Formatted
    } else {
        LiteralKind::Text
    };

    let body = strip_quotes(quoted);
    let value = if raw {
        body.to_string()
    } else {
        decode_escapes(body, kind == LiteralKind::Bytes)?
    };
    Ok(StringLiteral { kind, value })
}

/// String prefixes Python 3 still accepts, compared case-insensitively.
const PYTHON3_PREFIXES: [&str; 9] = ["", "r", "u", "b", "br", "rb", "f", "fr", "rf"];

/// False for Python 2 spellings such as `ur`.
pub(crate) fn is_python3_prefix(prefix: &str) -> bool {
    PYTHON3_PREFIXES.contains(&prefix.to_ascii_lowercase().as_str())
}

fn strip_quotes(quoted: &str) -> &str {
    for delim in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= 2 * delim.len() && quoted.starts_with(delim) && quoted.ends_with(delim)
        {
            return &quoted[delim.len()..quoted.len() - delim.len()];
        }
    }
    quoted
}

fn decode_escapes(body: &str, bytes: bool) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            // Line continuation inside the literal.
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' | '\'' | '"' => out.push(next),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            'x' => {
                let value = read_hex(&mut chars, 2).ok_or(EscapeError {
                    message: "truncated \\xXX escape",
                })?;
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            'u' if !bytes => {
                let value = read_hex(&mut chars, 4).ok_or(EscapeError {
                    message: "truncated \\uXXXX escape",
                })?;
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            'U' if !bytes => {
                let value = read_hex(&mut chars, 8).ok_or(EscapeError {
                    message: "truncated \\UXXXXXXXX escape",
                })?;
                if value > 0x10FFFF {
                    return Err(EscapeError {
                        message: "illegal Unicode character",
                    });
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            'N' if !bytes => {
                let name = read_char_name(&mut chars).ok_or(EscapeError {
                    message: "malformed \\N character escape",
                })?;
                let ch = unicode_names2::character(&name).ok_or(EscapeError {
                    message: "unknown Unicode character name",
                })?;
                out.push(ch);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn read_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, len: usize) -> Option<u32> {
    let mut value: u32 = 0;
    for _ in 0..len {
        let digit = chars.peek().and_then(|c| c.to_digit(16))?;
        chars.next();
        value = value.checked_mul(16)?.checked_add(digit)?;
    }
    Some(value)
}

fn read_char_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    if chars.next_if_eq(&'{').is_none() {
        return None;
    }
    let mut name = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            return (!name.is_empty()).then_some(name);
        }
        if !(c.is_ascii_alphanumeric() || c == ' ' || c == '-') {
            return None;
        }
        name.push(c);
    }
    None
}
