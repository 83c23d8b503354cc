//! Tokenizer for golf scripts
//!
//! Produces a flat token vector terminated by [`TokenKind::Eof`]. Lexing is
//! lenient about number shapes; the only fatal condition is a character
//! outside the language's alphabet.

use crate::error::{LexError, Pos};

/// Characters that form single-character tokens
const SINGLE_CHARS: &[u8] = b"+-*/(){};=><,.[]";

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i32),
    Float(f32),
    Symbol(String),
    Str(String),
    Char(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn is_char(&self, c: char) -> bool {
        self.kind == TokenKind::Char(c)
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Symbol(s) if s == name)
    }

    pub fn symbol(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Short description used in parse diagnostics
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Int(i) => format!("'{}'", i),
            TokenKind::Float(f) => format!("'{}'", f),
            TokenKind::Symbol(s) => format!("'{}'", s),
            TokenKind::Str(s) => format!("\"{}\"", s),
            TokenKind::Char(c) => format!("'{}'", c),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    /// Whether this token can be the last token of an operand
    fn ends_operand(&self) -> bool {
        match &self.kind {
            TokenKind::Int(_) | TokenKind::Float(_) | TokenKind::Str(_) => true,
            TokenKind::Symbol(s) => !matches!(s.as_str(), "return" | "else"),
            TokenKind::Char(c) => matches!(c, ')' | ']'),
            TokenKind::Eof => false,
        }
    }
}

struct Lexer<'a> {
    bytes: &'a [u8],
    i: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
    error: Option<LexError>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            i: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            error: None,
        }
    }

    #[inline]
    fn current(&self) -> Option<u8> {
        self.bytes.get(self.i).copied()
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.i + offset).copied()
    }

    #[inline]
    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn advance(&mut self) {
        match self.current() {
            Some(b'\n') => {
                self.line += 1;
                self.col = 1;
            }
            // UTF-8 continuation bytes share their character's column
            Some(c) if c & 0xC0 == 0x80 => {}
            _ => self.col += 1,
        }
        self.i += 1;
    }

    fn push(&mut self, kind: TokenKind, pos: Pos) {
        self.tokens.push(Token::new(kind, pos));
    }

    /// Record a fatal error. Only the first one is kept.
    fn fail(&mut self, ch: char, pos: Pos) {
        if let Some(first) = &self.error {
            tracing::error!(
                "internal: second tokenize error at {} after {}",
                pos,
                first
            );
            return;
        }
        self.error = Some(LexError { ch, pos });
    }

    fn negative_number_allowed(&self) -> bool {
        self.tokens.last().is_none_or(|t| !t.ends_operand())
    }

    fn run(&mut self) {
        while self.error.is_none() {
            let Some(c) = self.current() else {
                break;
            };
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'"' => self.string(),
                b'-' if self.peek(1).is_some_and(|d| d.is_ascii_digit())
                    && self.negative_number_allowed() =>
                {
                    self.number();
                }
                b'0'..=b'9' => self.number(),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),
                _ if SINGLE_CHARS.contains(&c) => {
                    let pos = self.pos();
                    self.advance();
                    self.push(TokenKind::Char(c as char), pos);
                }
                _ => {
                    let pos = self.pos();
                    let ch = std::str::from_utf8(&self.bytes[self.i..])
                        .ok()
                        .and_then(|s| s.chars().next())
                        .unwrap_or(c as char);
                    self.fail(ch, pos);
                }
            }
        }
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.current() {
            if c == b'\n' {
                break;
            }
            self.advance();
        }
    }

    fn string(&mut self) {
        let pos = self.pos();
        self.advance();
        let start = self.i;
        while let Some(c) = self.current() {
            if c == b'"' {
                break;
            }
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.i]).into_owned();
        // Unterminated strings run to the end of input
        if self.current() == Some(b'"') {
            self.advance();
        }
        self.push(TokenKind::Str(text), pos);
    }

    fn number(&mut self) {
        let pos = self.pos();
        let negative = self.current() == Some(b'-');
        if negative {
            self.advance();
        }

        let mut int_part: i32 = 0;
        let mut float_part: f32 = 0.0;
        let mut divisor: f32 = 1.0;
        let mut is_float = false;

        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                let digit = i32::from(c - b'0');
                if is_float {
                    divisor *= 10.0;
                    float_part += digit as f32 / divisor;
                } else {
                    int_part = int_part.wrapping_mul(10).wrapping_add(digit);
                }
                self.advance();
            } else if c == b'.' && !is_float {
                is_float = true;
                self.advance();
            } else {
                break;
            }
        }

        let kind = if is_float {
            let value = int_part as f32 + float_part;
            TokenKind::Float(if negative { -value } else { value })
        } else {
            TokenKind::Int(if negative {
                int_part.wrapping_neg()
            } else {
                int_part
            })
        };
        self.push(kind, pos);
    }

    fn identifier(&mut self) {
        let pos = self.pos();
        let start = self.i;
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.i]).into_owned();
        self.push(TokenKind::Symbol(text), pos);
    }
}

/// Tokenize `source`, stopping at the first unknown character
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    lexer.run();
    if let Some(err) = lexer.error {
        return Err(err);
    }
    let eof = lexer.pos();
    lexer.push(TokenKind::Eof, eof);
    tracing::debug!("tokenized {} tokens", lexer.tokens.len());
    Ok(lexer.tokens)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn sym(s: &str) -> TokenKind {
        TokenKind::Symbol(s.to_string())
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let toks = tokenize("string s = \"é\"; int x; // ü\nx").unwrap();
        let int_tok = toks.iter().find(|t| t.is_symbol("int")).unwrap();
        assert_eq!((int_tok.pos.line, int_tok.pos.col), (1, 17));
        let err = tokenize("string s = \"→\"; @").unwrap_err();
        assert_eq!(err.pos, Pos::new(1, 17));
    }

    #[test]
    fn tracks_lines_and_columns_across_comments_and_strings() {
        let src = "int a = 1; // first\n  string s = \"hi\";\n\tfloat f;";
        let toks = tokenize(src).unwrap();
        let positions: Vec<(u32, u32)> = toks.iter().map(|t| (t.pos.line, t.pos.col)).collect();
        assert_eq!(
            positions,
            vec![
                (1, 1),
                (1, 5),
                (1, 7),
                (1, 9),
                (1, 10),
                (2, 3),
                (2, 10),
                (2, 12),
                (2, 14),
                (2, 18),
                (3, 2),
                (3, 8),
                (3, 9),
                (3, 10),
            ]
        );
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn multi_line_strings_advance_the_line_counter() {
        let toks = tokenize("\"a\nb\" x").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Str("a\nb".into()));
        assert_eq!(toks[1].pos, Pos::new(2, 4));
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Int(42), TokenKind::Eof]);
        assert_eq!(kinds("-7"), vec![TokenKind::Int(-7), TokenKind::Eof]);
        match kinds("1.25")[0] {
            TokenKind::Float(f) => approx::assert_relative_eq!(f, 1.25),
            ref other => panic!("expected float, got {:?}", other),
        }
        match kinds("-0.5")[0] {
            TokenKind::Float(f) => approx::assert_relative_eq!(f, -0.5),
            ref other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn second_dot_is_not_rejected() {
        let k = kinds("1.2.3");
        assert!(matches!(k[0], TokenKind::Float(_)));
        assert_eq!(k[1], TokenKind::Char('.'));
        assert_eq!(k[2], TokenKind::Int(3));
    }

    #[test]
    fn minus_after_operand_is_an_operator() {
        assert_eq!(
            kinds("x-1"),
            vec![sym("x"), TokenKind::Char('-'), TokenKind::Int(1), TokenKind::Eof]
        );
        assert_eq!(
            kinds("(2)-1"),
            vec![
                TokenKind::Char('('),
                TokenKind::Int(2),
                TokenKind::Char(')'),
                TokenKind::Char('-'),
                TokenKind::Int(1),
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("f(-1)"),
            vec![
                sym("f"),
                TokenKind::Char('('),
                TokenKind::Int(-1),
                TokenKind::Char(')'),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_consumes_rest_of_input() {
        assert_eq!(
            kinds("\"abc def"),
            vec![TokenKind::Str("abc def".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn identifiers_with_digits_and_underscores() {
        assert_eq!(
            kinds("_a1 b_2"),
            vec![sym("_a1"), sym("b_2"), TokenKind::Eof]
        );
    }

    #[test]
    fn unknown_character_is_fatal() {
        let err = tokenize("int a = 1;\nint b = 2 % 3;").unwrap_err();
        assert_eq!(err.ch, '%');
        assert_eq!(err.pos, Pos::new(2, 11));
    }

    #[test]
    fn comment_at_end_of_input() {
        assert_eq!(kinds("a // done"), vec![sym("a"), TokenKind::Eof]);
    }
}
