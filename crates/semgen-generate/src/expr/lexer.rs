use super::ast::Span;
use super::error::CompilationError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
    Dot,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Split equation text into tokens with byte spans.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompilationError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        if ch.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let kind = match ch {
            _ if ch.is_ascii_digit()
                || (ch == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) =>
            {
                pos = scan_number(source, pos)?;
                let literal = &source[start..pos];
                let value = literal.parse::<f64>().map_err(|_| {
                    CompilationError::new(source, start, format!("invalid number '{literal}'"))
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    span: Span::new(start, pos),
                });
                continue;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(source[start..pos].to_string()),
                    span: Span::new(start, pos),
                });
                continue;
            }
            b'*' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 1;
                TokenKind::StarStar
            }
            b'=' if bytes.get(pos + 1) == Some(&b'=') => {
                return Err(CompilationError::new(
                    source,
                    start,
                    "comparisons are not supported",
                ));
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'=' => TokenKind::Assign,
            _ => {
                let unexpected = source[start..].chars().next().unwrap_or('?');
                return Err(CompilationError::new(
                    source,
                    start,
                    format!("unexpected character '{unexpected}'"),
                ));
            }
        };
        pos += 1;
        tokens.push(Token {
            kind,
            span: Span::new(start, pos),
        });
    }

    Ok(tokens)
}

fn scan_number(source: &str, start: usize) -> Result<usize, CompilationError> {
    let bytes = source.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp >= bytes.len() || !bytes[exp].is_ascii_digit() {
            return Err(CompilationError::new(source, pos, "malformed exponent"));
        }
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        pos = exp;
    }
    Ok(pos)
}
