//! Tokenizer for exported expressions
//!
//! Whitespace between tokens is ignored, so hand-formatted expressions read
//! the same as exporter output.

use crate::error::ReplayError;
use crate::naming::is_name_char;
use crate::syntax::{HYDRATOR_INIT, HYDRATOR_VAR, PLACEHOLDER_SIGIL};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Null,
    True,
    False,
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    /// `=>`
    Arrow,
    /// `=`
    Assign,
    Dot,
    /// `::`
    Scope,
    /// `$o<name>`
    Placeholder(String),
    /// `$h`
    Hydrator,
    /// `($h??=hydrator())`
    HydratorInit,
    /// `@dotted.type`
    TypeRef(String),
    Ident(String),
}

/// A token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, ReplayError> {
    let mut lexer = Lexer { source, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Result<Option<Token>, ReplayError> {
        self.skip_whitespace();
        let offset = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '(' if self.rest().starts_with(HYDRATOR_INIT) => {
                self.pos += HYDRATOR_INIT.len();
                TokenKind::HydratorInit
            }
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            '=' if self.rest().starts_with("=>") => {
                self.pos += 2;
                TokenKind::Arrow
            }
            '=' => self.single(TokenKind::Assign),
            ':' if self.rest().starts_with("::") => {
                self.pos += 2;
                TokenKind::Scope
            }
            '$' => self.variable(offset)?,
            '@' => {
                self.pos += 1;
                let name = self.take_while(|c| is_name_char(c) || c == '.');
                if name.is_empty() {
                    return Err(ReplayError::syntax(offset, "expected a type name after '@'"));
                }
                TokenKind::TypeRef(name.to_string())
            }
            '"' => TokenKind::Str(self.string()?),
            'b' if self.rest().starts_with("b\"") => {
                self.pos += 1;
                let hex_text = self.string()?;
                let bytes = hex::decode(&hex_text)
                    .map_err(|e| ReplayError::syntax(offset, format!("invalid byte literal: {}", e)))?;
                TokenKind::Bytes(bytes)
            }
            '-' if self.rest().starts_with("-INF") => {
                self.pos += 4;
                TokenKind::Float(f64::NEG_INFINITY)
            }
            c if c == '-' || c.is_ascii_digit() => self.number(offset)?,
            c if c.is_ascii_alphabetic() || c == '_' => {
                match self.take_while(is_name_char) {
                    "null" => TokenKind::Null,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "NAN" => TokenKind::Float(f64::NAN),
                    "INF" => TokenKind::Float(f64::INFINITY),
                    word => TokenKind::Ident(word.to_string()),
                }
            }
            other => {
                return Err(ReplayError::syntax(
                    offset,
                    format!("unexpected character '{}'", other),
                ));
            }
        };

        Ok(Some(Token { kind, offset }))
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest().len());
        self.pos += len;
        &self.source[start..self.pos]
    }

    /// `$h` or `$o<name>`
    fn variable(&mut self, offset: usize) -> Result<TokenKind, ReplayError> {
        self.pos += 1;
        let word = self.take_while(is_name_char);
        if format!("${}", word) == HYDRATOR_VAR {
            return Ok(TokenKind::Hydrator);
        }
        match word.strip_prefix(&PLACEHOLDER_SIGIL[1..]) {
            Some(name) if !name.is_empty() => Ok(TokenKind::Placeholder(name.to_string())),
            _ => Err(ReplayError::syntax(
                offset,
                format!("unknown variable '${}'", word),
            )),
        }
    }

    fn number(&mut self, offset: usize) -> Result<TokenKind, ReplayError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                }
                '+' | '-' if matches!(self.source[..self.pos].chars().last(), Some('e' | 'E')) => {
                    self.pos += 1
                }
                _ => break,
            }
        }
        let text = &self.source[start..self.pos];
        let invalid = || ReplayError::syntax(offset, format!("invalid number '{}'", text));
        if is_float {
            text.parse().map(TokenKind::Float).map_err(|_| invalid())
        } else {
            text.parse().map(TokenKind::Int).map_err(|_| invalid())
        }
    }

    /// Quoted string with escapes; `pos` is on the opening quote
    fn string(&mut self) -> Result<String, ReplayError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(ReplayError::syntax(start, "unterminated string"));
            };
            self.pos += c.len_utf8();
            match c {
                '"' => return Ok(out),
                '\\' => out.push(self.escape(start)?),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, start: usize) -> Result<char, ReplayError> {
        let Some(c) = self.peek() else {
            return Err(ReplayError::syntax(start, "unterminated string"));
        };
        self.pos += c.len_utf8();
        match c {
            '"' => Ok('"'),
            '\\' => Ok('\\'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '0' => Ok('\0'),
            'u' => {
                let rest = self.rest();
                let close = rest.find('}');
                let decoded = match (rest.strip_prefix('{'), close) {
                    (Some(_), Some(close)) => u32::from_str_radix(&rest[1..close], 16)
                        .ok()
                        .and_then(char::from_u32)
                        .map(|c| (c, close + 1)),
                    _ => None,
                };
                match decoded {
                    Some((c, len)) => {
                        self.pos += len;
                        Ok(c)
                    }
                    None => Err(ReplayError::syntax(self.pos, "invalid unicode escape")),
                }
            }
            other => Err(ReplayError::syntax(
                self.pos - other.len_utf8() - 1,
                format!("unknown escape '\\{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_hydrator_forms() {
        assert_eq!(
            kinds("($h??=hydrator()).fill($o0=$h.alloc(@app.Point))"),
            vec![
                TokenKind::HydratorInit,
                TokenKind::Dot,
                TokenKind::Ident("fill".to_string()),
                TokenKind::LParen,
                TokenKind::Placeholder("0".to_string()),
                TokenKind::Assign,
                TokenKind::Hydrator,
                TokenKind::Dot,
                TokenKind::Ident("alloc".to_string()),
                TokenKind::LParen,
                TokenKind::TypeRef("app.Point".to_string()),
                TokenKind::RParen,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("[-7,1.5,1e100,1e-7,NAN,-INF]")
                .into_iter()
                .filter(|k| !matches!(k, TokenKind::Comma | TokenKind::LBracket | TokenKind::RBracket))
                .map(|k| format!("{:?}", k))
                .collect::<Vec<_>>(),
            vec!["Int(-7)", "Float(1.5)", "Float(1e100)", "Float(1e-7)", "Float(NaN)", "Float(-inf)"]
        );
    }

    #[test]
    fn test_int_extremes() {
        assert_eq!(
            kinds("-9223372036854775808"),
            vec![TokenKind::Int(i64::MIN)]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\\c\n\u{7}\0""#),
            vec![TokenKind::Str("a\"b\\c\n\u{7}\0".to_string())]
        );
    }

    #[test]
    fn test_placeholder_text_inside_string_is_a_string() {
        assert_eq!(
            kinds(r#""$o0=""#),
            vec![TokenKind::Str("$o0=".to_string())]
        );
    }

    #[test]
    fn test_bytes_and_enum_case() {
        assert_eq!(
            kinds(r#"unserialize(b"00ff") @app.Suit::Hearts"#),
            vec![
                TokenKind::Ident("unserialize".to_string()),
                TokenKind::LParen,
                TokenKind::Bytes(vec![0x00, 0xff]),
                TokenKind::RParen,
                TokenKind::TypeRef("app.Suit".to_string()),
                TokenKind::Scope,
                TokenKind::Ident("Hearts".to_string()),
            ]
        );
    }

    #[test]
    fn test_errors_carry_offsets() {
        match tokenize("[1, #]") {
            Err(ReplayError::Syntax { offset, .. }) => assert_eq!(offset, 4),
            other => panic!("Expected syntax error, got {:?}", other),
        }
        assert!(matches!(tokenize("\"open"), Err(ReplayError::Syntax { offset: 0, .. })));
        assert!(matches!(tokenize("$x"), Err(ReplayError::Syntax { .. })));
    }
}
