// Full-fidelity syntax tree for the bind script
// Every token keeps its exact source text plus the trivia that precedes it,
// so regenerating an unmodified tree reproduces the input byte-for-byte.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod lexer;
mod parser;
pub mod source_gen;

pub use source_gen::ToSource;



/// Errors produced while lexing or parsing bind-script source
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at line {line}")]
    UnexpectedChar { ch: char, line: u32 },

    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: u32 },

    #[error("unterminated interpolation in f-string starting at line {line}")]
    UnterminatedInterp { line: u32 },

    #[error("invalid escape '\\{ch}' at line {line}")]
    InvalidEscape { ch: char, line: u32 },

    #[error("expected {expected}, found {found} at line {line}")]
    Unexpected {
        expected: String,
        found: String,
        line: u32,
    },
}

/// A single token with its source fidelity data.
///
/// `leading` holds the whitespace and `//` comments that appeared before the
/// token text. `line` is 1-based; synthesized tokens use line 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub leading: String,
    pub text: String,
    pub line: u32,
    pub offset: usize,
}

impl Token {
    /// A token fabricated by a rewrite rather than read from source.
    pub fn synthetic(text: impl Into<String>) -> Self {
        Token {
            leading: String::new(),
            text: text.into(),
            line: 0,
            offset: 0,
        }
    }
}

/// A parsed source chunk: zero or more routine definitions.
///
/// `header` is normally empty; the bind transformer fills it with blank
/// lines so regenerated source keeps the original file's line numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub header: String,
    pub routines: Vec<RoutineDef>,
    /// Zero-width end marker carrying any trailing trivia.
    pub eof: Token,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineDef {
    pub fn_kw: Token,
    pub name: Token,
    pub lparen: Token,
    pub params: Vec<ParamDef>,
    pub rparen: Token,
    pub body: Block,
}

impl RoutineDef {
    /// Byte range of the definition text, from `fn` through the closing brace.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.fn_kw.offset..self.body.rbrace.offset + self.body.rbrace.text.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: Token,
    pub default: Option<(Token, Expr)>,
    pub comma: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub lbrace: Token,
    pub stmts: Vec<Stmt>,
    pub rbrace: Token,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Nested routine definition
    Routine(RoutineDef),
    Let {
        let_kw: Token,
        name: Token,
        eq: Token,
        value: Expr,
        semi: Token,
    },
    Return {
        return_kw: Token,
        value: Option<Expr>,
        semi: Token,
    },
    Expr {
        value: Expr,
        semi: Token,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Str(StrLit),
    Interp(InterpLit),
    Number(Token),
    Bool(Token),
    Null(Token),
    Ident(Token),
    Call(CallExpr),
    Binary {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    Paren {
        lparen: Token,
        inner: Box<Expr>,
        rparen: Token,
    },
}

impl Expr {
    /// First token in source order; rewrites retarget its leading trivia.
    pub fn first_token_mut(&mut self) -> &mut Token {
        match self {
            Expr::Str(s) => &mut s.token,
            Expr::Interp(i) => &mut i.token,
            Expr::Number(t) | Expr::Bool(t) | Expr::Null(t) | Expr::Ident(t) => t,
            Expr::Call(c) => &mut c.callee,
            Expr::Binary { left, .. } => left.first_token_mut(),
            Expr::Paren { lparen, .. } => lparen,
        }
    }
}

/// A plain string literal. `token.text` keeps the raw quoted form,
/// `value` the decoded contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrLit {
    pub token: Token,
    pub value: String,
}

/// An interpolated literal `f"... {expr} ..."`.
///
/// `token.text` keeps the raw literal so an untouched f-string regenerates
/// exactly; `segments` hold the decoded text runs and embedded expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpLit {
    pub token: Token,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Text {
        decoded: String,
    },
    Expr {
        expr: Expr,
        /// `{expr:spec}` / `{expr!flag}` tail, unsupported downstream.
        format_spec: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Token,
    pub lparen: Token,
    pub args: Vec<Arg>,
    pub rparen: Token,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub value: Expr,
    pub comma: Option<Token>,
}

/// Parse a source chunk into a full-fidelity module tree.
///
/// This is a structural step only: nothing in the chunk is executed.
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    parser::Parser::new(source)?.parse_module()
}

/// Re-escape a decoded template into literal source form.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
