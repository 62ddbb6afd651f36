//! The accumulator protocol and its example implementers.
//!
//! A `Bindable` consumes one interpolated literal's text and expression
//! segments and renders itself back into a constructor-call expression.
//! Downstream marker conventions are pluggable: `SqlQuery` numbers its
//! placeholders `$1, $2, ...` while `SqliteQuery` repeats a single `?`.

use crate::syntax::{quote, Arg, CallExpr, Expr, StrLit, Token};

/// Capability contract for rewrite targets.
///
/// One accumulator is constructed per interpolated literal; no two literals
/// ever share an instance. The nth placeholder in the template corresponds
/// to the nth captured expression, in left-to-right source order.
pub trait Bindable {
    /// Constructor identifier used in rendered expressions and in the
    /// wrapper's advisory result check.
    const TARGET: &'static str;

    fn new() -> Self;

    /// Append a literal text run (escapes already decoded) to the template.
    fn bind_text(&mut self, text: &str);

    /// Record an embedded expression and append its placeholder marker.
    ///
    /// Format specifiers and conversion flags are not part of this call:
    /// the transformer drops them with a warning before binding.
    fn bind_expression(&mut self, expr: Expr);

    /// Render a constructor call reproducing an equivalent accumulator:
    /// `Target("template", expr1, expr2, ...)`.
    fn render(&self) -> Expr;
}

/// Example implementer using sequential `$n` placeholder markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlQuery {
    pub template: String,
    pub values: Vec<Expr>,
}

impl Bindable for SqlQuery {
    const TARGET: &'static str = "SqlQuery";

    fn new() -> Self {
        Self::default()
    }

    fn bind_text(&mut self, text: &str) {
        self.template.push_str(text);
    }

    fn bind_expression(&mut self, expr: Expr) {
        self.values.push(expr);
        self.template.push('$');
        self.template.push_str(&self.values.len().to_string());
    }

    fn render(&self) -> Expr {
        render_constructor(Self::TARGET, &self.template, &self.values)
    }
}

/// Sibling implementer emitting one `?` marker per capture, for consumers
/// that take positional parameters without numbering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqliteQuery {
    pub template: String,
    pub values: Vec<Expr>,
}

impl Bindable for SqliteQuery {
    const TARGET: &'static str = "SqliteQuery";

    fn new() -> Self {
        Self::default()
    }

    fn bind_text(&mut self, text: &str) {
        self.template.push_str(text);
    }

    fn bind_expression(&mut self, expr: Expr) {
        self.values.push(expr);
        self.template.push('?');
    }

    fn render(&self) -> Expr {
        render_constructor(Self::TARGET, &self.template, &self.values)
    }
}

/// Build `target("template", v1, v2, ...)` with the finished template as the
/// first argument and the captured expressions after it, in capture order.
pub fn render_constructor(target: &str, template: &str, values: &[Expr]) -> Expr {
    let mut args = Vec::with_capacity(values.len() + 1);
    args.push(Arg {
        value: Expr::Str(StrLit {
            token: Token::synthetic(quote(template)),
            value: template.to_string(),
        }),
        comma: None,
    });
    for value in values {
        let mut value = value.clone();
        value.first_token_mut().leading = " ".to_string();
        args.push(Arg {
            value,
            comma: None,
        });
    }
    let last = args.len() - 1;
    for arg in &mut args[..last] {
        arg.comma = Some(Token::synthetic(","));
    }
    Expr::Call(CallExpr {
        callee: Token::synthetic(target),
        lparen: Token::synthetic("("),
        args,
        rparen: Token::synthetic(")"),
    })
}
