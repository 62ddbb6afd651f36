// Hand-rolled lexer. Tokens carry their leading trivia so the parser can
// rebuild the source byte-for-byte.

use super::{ParseError, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Number,
    Str,
    FStr,
    KwFn,
    KwLet,
    KwReturn,
    KwTrue,
    KwFalse,
    KwNull,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Eq,
    Plus,
    Eof,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "an identifier",
            TokenKind::Number => "a number",
            TokenKind::Str => "a string",
            TokenKind::FStr => "an f-string",
            TokenKind::KwFn => "'fn'",
            TokenKind::KwLet => "'let'",
            TokenKind::KwReturn => "'return'",
            TokenKind::KwTrue => "'true'",
            TokenKind::KwFalse => "'false'",
            TokenKind::KwNull => "'null'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Semi => "';'",
            TokenKind::Eq => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Eof => "end of input",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Lexed {
    pub kind: TokenKind,
    pub token: Token,
}

pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    base_offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_base(src, 1, 0)
    }

    /// Lex a slice cut out of a larger source, keeping the outer
    /// line numbers and byte offsets. Used for f-string interpolations.
    pub fn with_base(src: &'a str, line: u32, base_offset: usize) -> Self {
        Lexer {
            src,
            pos: 0,
            line,
            base_offset,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Lexed>, ParseError> {
        let mut out = Vec::new();
        loop {
            let leading = self.take_trivia();
            let start = self.pos;
            let line = self.line;
            let Some(ch) = self.peek() else {
                out.push(Lexed {
                    kind: TokenKind::Eof,
                    token: Token {
                        leading,
                        text: String::new(),
                        line,
                        offset: self.base_offset + start,
                    },
                });
                return Ok(out);
            };

            let kind = if ch == 'f' && self.peek_at(1) == Some('"') {
                self.scan_fstring(line)?;
                TokenKind::FStr
            } else if ch.is_alphabetic() || ch == '_' {
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                    self.bump();
                }
                match &self.src[start..self.pos] {
                    "fn" => TokenKind::KwFn,
                    "let" => TokenKind::KwLet,
                    "return" => TokenKind::KwReturn,
                    "true" => TokenKind::KwTrue,
                    "false" => TokenKind::KwFalse,
                    "null" => TokenKind::KwNull,
                    _ => TokenKind::Ident,
                }
            } else if ch.is_ascii_digit() {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
                TokenKind::Number
            } else if ch == '"' {
                self.scan_string(line)?;
                TokenKind::Str
            } else {
                self.bump();
                match ch {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semi,
                    '=' => TokenKind::Eq,
                    '+' => TokenKind::Plus,
                    _ => return Err(ParseError::UnexpectedChar { ch, line }),
                }
            };

            out.push(Lexed {
                kind,
                token: Token {
                    leading,
                    text: self.src[start..self.pos].to_string(),
                    line,
                    offset: self.base_offset + start,
                },
            });
        }
    }

    fn take_trivia(&mut self) -> String {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        self.src[start..self.pos].to_string()
    }

    /// Consume a `"..."` literal, quotes included. Raw newlines are allowed.
    fn scan_string(&mut self, start_line: u32) -> Result<(), ParseError> {
        self.bump(); // opening quote
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { line: start_line }),
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(ParseError::UnterminatedString { line: start_line });
                    }
                }
                Some('"') => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// Consume an `f"..."` literal. Interpolations may nest braces and
    /// contain string (including f-string) literals of their own; a quote
    /// inside an interpolation opens an inner string whose braces do not
    /// count toward the interpolation depth.
    fn scan_fstring(&mut self, start_line: u32) -> Result<(), ParseError> {
        self.bump(); // 'f'
        self.bump(); // opening quote
        let mut depth = 0usize;
        let mut in_str = false;
        loop {
            let Some(c) = self.bump() else {
                return Err(if depth > 0 {
                    ParseError::UnterminatedInterp { line: start_line }
                } else {
                    ParseError::UnterminatedString { line: start_line }
                });
            };
            if in_str {
                match c {
                    '\\' => {
                        self.bump();
                    }
                    '"' => in_str = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '\\' => {
                    self.bump();
                }
                '{' if depth == 0 && self.peek() == Some('{') => {
                    self.bump();
                }
                '}' if depth == 0 && self.peek() == Some('}') => {
                    self.bump();
                }
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                '"' if depth == 0 => return Ok(()),
                '"' => in_str = true,
                _ => {}
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }
}
