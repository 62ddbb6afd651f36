// Source regeneration from the syntax tree.
// An unmodified tree writes back byte-for-byte; rewritten nodes write their
// synthesized tokens while everything around them is reproduced exactly.

use super::{Arg, Block, CallExpr, Expr, Module, ParamDef, RoutineDef, Stmt, Token};

/// Types that can write their exact source representation.
pub trait ToSource {
    fn write_source(&self, out: &mut String);

    fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }
}

impl ToSource for Token {
    fn write_source(&self, out: &mut String) {
        out.push_str(&self.leading);
        out.push_str(&self.text);
    }
}

impl ToSource for Module {
    fn write_source(&self, out: &mut String) {
        out.push_str(&self.header);
        for routine in &self.routines {
            routine.write_source(out);
        }
        self.eof.write_source(out);
    }
}

impl ToSource for RoutineDef {
    fn write_source(&self, out: &mut String) {
        self.fn_kw.write_source(out);
        self.name.write_source(out);
        self.lparen.write_source(out);
        for param in &self.params {
            param.write_source(out);
        }
        self.rparen.write_source(out);
        self.body.write_source(out);
    }
}

impl ToSource for ParamDef {
    fn write_source(&self, out: &mut String) {
        self.name.write_source(out);
        if let Some((eq, default)) = &self.default {
            eq.write_source(out);
            default.write_source(out);
        }
        if let Some(comma) = &self.comma {
            comma.write_source(out);
        }
    }
}

impl ToSource for Block {
    fn write_source(&self, out: &mut String) {
        self.lbrace.write_source(out);
        for stmt in &self.stmts {
            stmt.write_source(out);
        }
        self.rbrace.write_source(out);
    }
}

impl ToSource for Stmt {
    fn write_source(&self, out: &mut String) {
        match self {
            Stmt::Routine(def) => def.write_source(out),
            Stmt::Let {
                let_kw,
                name,
                eq,
                value,
                semi,
            } => {
                let_kw.write_source(out);
                name.write_source(out);
                eq.write_source(out);
                value.write_source(out);
                semi.write_source(out);
            }
            Stmt::Return {
                return_kw,
                value,
                semi,
            } => {
                return_kw.write_source(out);
                if let Some(value) = value {
                    value.write_source(out);
                }
                semi.write_source(out);
            }
            Stmt::Expr { value, semi } => {
                value.write_source(out);
                semi.write_source(out);
            }
        }
    }
}

impl ToSource for Expr {
    fn write_source(&self, out: &mut String) {
        match self {
            // Untouched literals keep their raw token text, decoded
            // segments notwithstanding.
            Expr::Str(s) => s.token.write_source(out),
            Expr::Interp(i) => i.token.write_source(out),
            Expr::Number(t) | Expr::Bool(t) | Expr::Null(t) | Expr::Ident(t) => {
                t.write_source(out)
            }
            Expr::Call(call) => call.write_source(out),
            Expr::Binary { left, op, right } => {
                left.write_source(out);
                op.write_source(out);
                right.write_source(out);
            }
            Expr::Paren {
                lparen,
                inner,
                rparen,
            } => {
                lparen.write_source(out);
                inner.write_source(out);
                rparen.write_source(out);
            }
        }
    }
}

impl ToSource for CallExpr {
    fn write_source(&self, out: &mut String) {
        self.callee.write_source(out);
        self.lparen.write_source(out);
        for arg in &self.args {
            arg.write_source(out);
        }
        self.rparen.write_source(out);
    }
}

impl ToSource for Arg {
    fn write_source(&self, out: &mut String) {
        self.value.write_source(out);
        if let Some(comma) = &self.comma {
            comma.write_source(out);
        }
    }
}
