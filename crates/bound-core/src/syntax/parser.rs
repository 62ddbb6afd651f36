// Recursive-descent parser for the bind script.

use super::lexer::{Lexed, Lexer, TokenKind};
use super::{
    Arg, Block, CallExpr, Expr, InterpLit, Module, ParamDef, ParseError, RoutineDef, Segment,
    Stmt, StrLit, Token,
};

pub(crate) struct Parser {
    tokens: Vec<Lexed>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: Lexer::new(source).tokenize()?,
            pos: 0,
        })
    }

    fn from_slice(source: &str, line: u32, offset: usize) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: Lexer::with_base(source, line, offset).tokenize()?,
            pos: 0,
        })
    }

    pub fn parse_module(mut self) -> Result<Module, ParseError> {
        let mut routines = Vec::new();
        while self.peek() != TokenKind::Eof {
            routines.push(self.parse_routine()?);
        }
        let eof = self.advance().token;
        Ok(Module {
            header: String::new(),
            routines,
            eof,
        })
    }

    fn parse_routine(&mut self) -> Result<RoutineDef, ParseError> {
        let fn_kw = self.expect(TokenKind::KwFn)?;
        let name = self.expect(TokenKind::Ident)?;
        let lparen = self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while self.peek() != TokenKind::RParen {
            let name = self.expect(TokenKind::Ident)?;
            let default = if self.peek() == TokenKind::Eq {
                let eq = self.advance().token;
                Some((eq, self.parse_expr()?))
            } else {
                None
            };
            let comma = if self.peek() == TokenKind::Comma {
                Some(self.advance().token)
            } else {
                None
            };
            let done = comma.is_none();
            params.push(ParamDef {
                name,
                default,
                comma,
            });
            if done {
                break;
            }
        }
        let rparen = self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(RoutineDef {
            fn_kw,
            name,
            lparen,
            params,
            rparen,
            body,
        })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let lbrace = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while self.peek() != TokenKind::RBrace {
            stmts.push(self.parse_stmt()?);
        }
        let rbrace = self.advance().token;
        Ok(Block {
            lbrace,
            stmts,
            rbrace,
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            TokenKind::KwFn => Ok(Stmt::Routine(self.parse_routine()?)),
            TokenKind::KwLet => {
                let let_kw = self.advance().token;
                let name = self.expect(TokenKind::Ident)?;
                let eq = self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                let semi = self.expect(TokenKind::Semi)?;
                Ok(Stmt::Let {
                    let_kw,
                    name,
                    eq,
                    value,
                    semi,
                })
            }
            TokenKind::KwReturn => {
                let return_kw = self.advance().token;
                let value = if self.peek() == TokenKind::Semi {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let semi = self.expect(TokenKind::Semi)?;
                Ok(Stmt::Return {
                    return_kw,
                    value,
                    semi,
                })
            }
            _ => {
                let value = self.parse_expr()?;
                let semi = self.expect(TokenKind::Semi)?;
                Ok(Stmt::Expr { value, semi })
            }
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_primary()?;
        while self.peek() == TokenKind::Plus {
            let op = self.advance().token;
            let right = self.parse_primary()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            TokenKind::Str => {
                let token = self.advance().token;
                let inner = &token.text[1..token.text.len() - 1];
                let value = decode_text(inner, token.line)?;
                Ok(Expr::Str(StrLit { token, value }))
            }
            TokenKind::FStr => {
                let token = self.advance().token;
                let segments = segment_fstring(&token)?;
                Ok(Expr::Interp(InterpLit { token, segments }))
            }
            TokenKind::Number => Ok(Expr::Number(self.advance().token)),
            TokenKind::KwTrue | TokenKind::KwFalse => Ok(Expr::Bool(self.advance().token)),
            TokenKind::KwNull => Ok(Expr::Null(self.advance().token)),
            TokenKind::Ident => {
                let callee = self.advance().token;
                if self.peek() != TokenKind::LParen {
                    return Ok(Expr::Ident(callee));
                }
                let lparen = self.advance().token;
                let mut args = Vec::new();
                while self.peek() != TokenKind::RParen {
                    let value = self.parse_expr()?;
                    let comma = if self.peek() == TokenKind::Comma {
                        Some(self.advance().token)
                    } else {
                        None
                    };
                    let done = comma.is_none();
                    args.push(Arg { value, comma });
                    if done {
                        break;
                    }
                }
                let rparen = self.expect(TokenKind::RParen)?;
                Ok(Expr::Call(CallExpr {
                    callee,
                    lparen,
                    args,
                    rparen,
                }))
            }
            TokenKind::LParen => {
                let lparen = self.advance().token;
                let inner = self.parse_expr()?;
                let rparen = self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren {
                    lparen,
                    inner: Box::new(inner),
                    rparen,
                })
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_embedded_expr(mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        if self.peek() != TokenKind::Eof {
            return Err(self.unexpected("end of interpolation"));
        }
        Ok(expr)
    }

    fn peek(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn advance(&mut self) -> Lexed {
        let lexed = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        lexed
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek() == kind {
            Ok(self.advance().token)
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let at = &self.tokens[self.pos];
        let found = if at.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", at.token.text)
        };
        ParseError::Unexpected {
            expected: expected.to_string(),
            found,
            line: at.token.line,
        }
    }
}

/// Decode string-literal escapes (`\n`, `\t`, `\"`, `\\`).
fn decode_text(raw: &str, line: u32) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(ParseError::InvalidEscape { ch: other, line }),
            None => return Err(ParseError::UnterminatedString { line }),
        }
    }
    Ok(out)
}

/// Split a raw `f"..."` token into decoded text runs and parsed
/// interpolated expressions, in source order. Embedded expressions keep the
/// enclosing file's line numbers and byte offsets.
fn segment_fstring(token: &Token) -> Result<Vec<Segment>, ParseError> {
    let inner = &token.text[2..token.text.len() - 1];
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut line = token.line;
    let mut chars = inner.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                text.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                text.push('}');
            }
            '{' => {
                if !text.is_empty() {
                    segments.push(Segment::Text {
                        decoded: std::mem::take(&mut text),
                    });
                }
                let start = idx + 1;
                let end = find_embed_end(inner, start)
                    .ok_or(ParseError::UnterminatedInterp { line })?;
                let embed = &inner[start..end];
                let (expr_src, format_spec) = split_format_spec(embed);
                // 2 bytes for the `f"` prefix
                let base = token.offset + 2 + start;
                let expr =
                    Parser::from_slice(expr_src, line, base)?.parse_embedded_expr()?;
                segments.push(Segment::Expr { expr, format_spec });
                line += embed.matches('\n').count() as u32;
                while matches!(chars.peek(), Some((i, _)) if *i <= end) {
                    chars.next();
                }
            }
            '}' => return Err(ParseError::UnexpectedChar { ch: '}', line }),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, '"')) => text.push('"'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, other)) => return Err(ParseError::InvalidEscape { ch: other, line }),
                None => return Err(ParseError::UnterminatedString { line }),
            },
            '\n' => {
                line += 1;
                text.push('\n');
            }
            _ => text.push(c),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text { decoded: text });
    }
    Ok(segments)
}

/// Index of the `}` closing the interpolation that starts at `start`.
/// Mirrors the lexer's brace/quote state machine.
fn find_embed_end(inner: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_str = false;
    let mut chars = inner[start..].char_indices();
    while let Some((i, c)) = chars.next() {
        if in_str {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            '}' => return Some(start + i),
            _ => {}
        }
    }
    None
}

/// Split an interpolation body at the first top-level `:` or `!`, yielding
/// the expression source and the (unsupported) format-specifier tail.
fn split_format_spec(embed: &str) -> (&str, Option<String>) {
    let mut depth = 0usize;
    let mut in_str = false;
    let mut chars = embed.char_indices();
    while let Some((i, c)) = chars.next() {
        if in_str {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '{' | '(' => depth += 1,
            '}' | ')' if depth > 0 => depth -= 1,
            ':' | '!' if depth == 0 => {
                return (&embed[..i], Some(embed[i + 1..].to_string()));
            }
            _ => {}
        }
    }
    (embed, None)
}
