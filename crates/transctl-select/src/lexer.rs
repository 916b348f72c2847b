//! Tokeniser for filter expressions.

use std::fmt;

use crate::error::ExprError;

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal with any size suffix already applied.
    Number(f64),
    /// Quoted string literal.
    Str(String),
    /// Field name, `identifier`, or function name.
    Ident(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Not,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `%%`
    Glob,
    /// `%^`
    PrefixI,
}

impl fmt::Display for Token {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(formatter, "number {value}"),
            Self::Str(value) => write!(formatter, "string {value:?}"),
            Self::Ident(name) => write!(formatter, "identifier '{name}'"),
            other => write!(formatter, "'{}'", other.symbol()),
        }
    }
}

impl Token {
    const fn symbol(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Comma => ",",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Not => "!",
            Self::And => "&&",
            Self::Or => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Glob => "%%",
            Self::PrefixI => "%^",
            Self::Number(_) | Self::Str(_) | Self::Ident(_) => "",
        }
    }
}

/// A token with the byte offset it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Byte offset into the source.
    pub offset: usize,
}

/// Multiplier for a size suffix; decimal units are 1000-based, `i` units
/// 1024-based.
fn unit_scale(unit: &str) -> Option<f64> {
    let scale = match unit {
        "B" => 1.0,
        "kB" | "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        "PB" => 1e15,
        "KiB" => 1024.0,
        "MiB" => 1_048_576.0,
        "GiB" => 1_073_741_824.0,
        "TiB" => 1_099_511_627_776.0,
        "PiB" => 1_125_899_906_842_624.0,
        _ => return None,
    };
    Some(scale)
}

/// Split `source` into tokens.
///
/// # Errors
///
/// Fails on stray characters, unterminated strings, malformed numbers, and
/// unknown size suffixes.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let token = if ch.is_ascii_digit() || ch == '.' {
            let mut end = offset;
            while let Some(&(index, next)) = chars.peek() {
                if next.is_ascii_digit() || next == '.' || next == '_' {
                    end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let text = source[offset..end].replace('_', "");
            let value: f64 = text.parse().map_err(|_| ExprError::InvalidNumber {
                text: source[offset..end].to_string(),
            })?;
            let unit_start = end;
            let mut unit_end = end;
            while let Some(&(index, next)) = chars.peek() {
                if next.is_ascii_alphabetic() {
                    unit_end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            if unit_end > unit_start {
                let unit = &source[unit_start..unit_end];
                let scale = unit_scale(unit).ok_or_else(|| ExprError::UnknownUnit {
                    unit: unit.to_string(),
                })?;
                Token::Number(value * scale)
            } else {
                Token::Number(value)
            }
        } else if ch.is_alphabetic() || ch == '_' {
            let mut end = offset;
            while let Some(&(index, next)) = chars.peek() {
                if next.is_alphanumeric() || next == '_' || next == '.' {
                    end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            match &source[offset..end] {
                "true" => Token::True,
                "false" => Token::False,
                name => Token::Ident(name.to_string()),
            }
        } else if ch == '"' || ch == '\'' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, next)) = chars.next() {
                match next {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => text.push('\n'),
                        Some((_, 't')) => text.push('\t'),
                        Some((_, escaped)) => text.push(escaped),
                        None => break,
                    },
                    quote if quote == ch => {
                        closed = true;
                        break;
                    }
                    other => text.push(other),
                }
            }
            if !closed {
                return Err(ExprError::UnterminatedString { offset });
            }
            Token::Str(text)
        } else {
            chars.next();
            let mut follow = |expected: char| {
                if chars.peek().is_some_and(|&(_, next)| next == expected) {
                    chars.next();
                    true
                } else {
                    false
                }
            };
            match ch {
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' if follow('%') => Token::Glob,
                '%' if follow('^') => Token::PrefixI,
                '%' => Token::Percent,
                '!' if follow('=') => Token::Ne,
                '!' => Token::Not,
                '=' if follow('=') => Token::Eq,
                '<' if follow('=') => Token::Le,
                '<' => Token::Lt,
                '>' if follow('=') => Token::Ge,
                '>' => Token::Gt,
                '&' if follow('&') => Token::And,
                '|' if follow('|') => Token::Or,
                other => return Err(ExprError::UnexpectedChar { offset, ch: other }),
            }
        };
        tokens.push(Spanned { token, offset });
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("tokenizes")
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn operators_and_literals() {
        assert_eq!(
            kinds("name %% 'deb*' && hashString %^ \"AB\" || !x"),
            vec![
                Token::Ident("name".into()),
                Token::Glob,
                Token::Str("deb*".into()),
                Token::And,
                Token::Ident("hashString".into()),
                Token::PrefixI,
                Token::Str("AB".into()),
                Token::Or,
                Token::Not,
                Token::Ident("x".into()),
            ]
        );
    }

    #[test]
    fn size_suffixes_scale_numbers() {
        assert_eq!(kinds("1.5GB"), vec![Token::Number(1.5e9)]);
        assert_eq!(kinds("2KiB"), vec![Token::Number(2048.0)]);
        assert_eq!(kinds("1 TiB"), vec![
            Token::Number(1.0),
            Token::Ident("TiB".into())
        ]);
        assert!(matches!(
            tokenize("3XB"),
            Err(ExprError::UnknownUnit { unit }) if unit == "XB"
        ));
    }

    #[test]
    fn lone_equals_is_rejected() {
        assert!(matches!(
            tokenize("a = 1"),
            Err(ExprError::UnexpectedChar { ch: '=', offset: 2 })
        ));
        assert!(matches!(
            tokenize("'open"),
            Err(ExprError::UnterminatedString { offset: 0 })
        ));
    }
}
