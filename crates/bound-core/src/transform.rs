//! The bind transformer: a stack-driven rewrite that replaces every
//! interpolated literal in a routine's tree with the constructor expression
//! rendered by a fresh accumulator.
//!
//! The walk is depth-first, so a literal nested inside another literal's
//! interpolation is fully accumulated and rendered before the outer
//! accumulator records it as one captured expression.

use tracing::{debug, warn};

use crate::bindable::Bindable;
use crate::syntax::{Block, Expr, Module, RoutineDef, Segment, Stmt};

pub struct BindTransformer<T: Bindable> {
    header_offset: usize,
    stack: Vec<T>,
}

impl<T: Bindable> BindTransformer<T> {
    /// `header_offset` is the routine's 1-based starting line in its
    /// defining unit; the transformed module is padded with blank lines so
    /// regenerated line numbers match the original file.
    pub fn new(header_offset: usize) -> Self {
        BindTransformer {
            header_offset,
            stack: Vec::new(),
        }
    }

    /// Current literal nesting depth. Zero outside any literal.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn transform(mut self, mut module: Module) -> Module {
        module.routines = module
            .routines
            .into_iter()
            .map(|def| self.rewrite_routine(def))
            .collect();
        debug_assert!(
            self.stack.is_empty(),
            "accumulator stack must drain after a full walk"
        );
        module.header = "\n".repeat(self.header_offset.saturating_sub(1));
        module
    }

    fn rewrite_routine(&mut self, mut def: RoutineDef) -> RoutineDef {
        def.params = def
            .params
            .into_iter()
            .map(|mut param| {
                param.default = param
                    .default
                    .map(|(eq, expr)| (eq, self.rewrite_expr(expr)));
                param
            })
            .collect();
        def.body = self.rewrite_block(def.body);
        def
    }

    fn rewrite_block(&mut self, mut block: Block) -> Block {
        block.stmts = block
            .stmts
            .into_iter()
            .map(|stmt| self.rewrite_stmt(stmt))
            .collect();
        block
    }

    fn rewrite_stmt(&mut self, stmt: Stmt) -> Stmt {
        match stmt {
            Stmt::Routine(def) => Stmt::Routine(self.rewrite_routine(def)),
            Stmt::Let {
                let_kw,
                name,
                eq,
                value,
                semi,
            } => Stmt::Let {
                let_kw,
                name,
                eq,
                value: self.rewrite_expr(value),
                semi,
            },
            Stmt::Return {
                return_kw,
                value,
                semi,
            } => Stmt::Return {
                return_kw,
                value: value.map(|v| self.rewrite_expr(v)),
                semi,
            },
            Stmt::Expr { value, semi } => Stmt::Expr {
                value: self.rewrite_expr(value),
                semi,
            },
        }
    }

    fn rewrite_expr(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::Interp(lit) => {
                debug!(
                    target_type = T::TARGET,
                    line = lit.token.line,
                    depth = self.stack.len(),
                    "entering interpolated literal"
                );
                self.stack.push(T::new());
                for segment in lit.segments {
                    match segment {
                        Segment::Text { decoded } => {
                            debug!(text = %decoded, "bind text");
                            self.top().bind_text(&decoded);
                        }
                        Segment::Expr { expr, format_spec } => {
                            let expr = self.rewrite_expr(expr);
                            if let Some(spec) = &format_spec {
                                warn!(
                                    spec = %spec,
                                    line = lit.token.line,
                                    "format specifier is unsupported and was dropped"
                                );
                            }
                            debug!("bind expression");
                            self.top().bind_expression(expr);
                        }
                    }
                }
                let accumulator = self.stack.pop().expect("accumulator stack underflow");
                let mut rendered = accumulator.render();
                // The replacement sits exactly where the literal sat.
                rendered.first_token_mut().leading = lit.token.leading;
                rendered
            }
            Expr::Call(mut call) => {
                call.args = call
                    .args
                    .into_iter()
                    .map(|mut arg| {
                        arg.value = self.rewrite_expr(arg.value);
                        arg
                    })
                    .collect();
                Expr::Call(call)
            }
            Expr::Binary { left, op, right } => Expr::Binary {
                left: Box::new(self.rewrite_expr(*left)),
                op,
                right: Box::new(self.rewrite_expr(*right)),
            },
            Expr::Paren {
                lparen,
                inner,
                rparen,
            } => Expr::Paren {
                lparen,
                inner: Box::new(self.rewrite_expr(*inner)),
                rparen,
            },
            other => other,
        }
    }

    fn top(&mut self) -> &mut T {
        self.stack.last_mut().expect("no active accumulator")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::bindable::{SqlQuery, SqliteQuery};
    use crate::syntax::{parse_module, ToSource};

    fn rewrite<T: Bindable>(source: &str, header_offset: usize) -> String {
        let module = parse_module(source).expect("parse");
        BindTransformer::<T>::new(header_offset)
            .transform(module)
            .to_source()
    }

    #[test]
    fn literal_without_interpolations_is_replaced_verbatim() {
        let out = rewrite::<SqlQuery>(
            "fn q() { return f\"SELECT 1\"; }\n",
            1,
        );
        assert_eq!(out, "fn q() { return SqlQuery(\"SELECT 1\"); }\n");
    }

    #[test]
    fn single_capture_uses_dollar_marker() {
        let out = rewrite::<SqlQuery>(
            "fn q(x) { return f\"SELECT * FROM t WHERE id = {x}\"; }\n",
            1,
        );
        assert_eq!(
            out,
            "fn q(x) { return SqlQuery(\"SELECT * FROM t WHERE id = $1\", x); }\n"
        );
    }

    #[test]
    fn question_marker_policy_is_pluggable() {
        let out = rewrite::<SqliteQuery>(
            "fn q(a, b) { return f\"x = {a} AND y = {b}\"; }\n",
            1,
        );
        assert_eq!(
            out,
            "fn q(a, b) { return SqliteQuery(\"x = ? AND y = ?\", a, b); }\n"
        );
    }

    #[test]
    fn surrounding_source_is_reproduced_exactly() {
        let source = "// lookup helper\nfn q(x) {\n    let limit = 10;\n    return f\"id = {x}\";\n}\n";
        let out = rewrite::<SqlQuery>(source, 1);
        assert_eq!(
            out,
            "// lookup helper\nfn q(x) {\n    let limit = 10;\n    return SqlQuery(\"id = $1\", x);\n}\n"
        );
    }

    #[test]
    fn nested_literal_resolves_before_outer_capture() {
        let out = rewrite::<SqlQuery>(
            "fn q(x) { return f\"outer {f\"inner {x}\"} end\"; }\n",
            1,
        );
        assert_eq!(
            out,
            "fn q(x) { return SqlQuery(\"outer $1 end\", SqlQuery(\"inner $1\", x)); }\n"
        );
    }

    #[test]
    fn header_offset_pads_blank_lines() {
        let out = rewrite::<SqlQuery>("fn q() { return f\"a\"; }\n", 5);
        assert_eq!(out, "\n\n\n\nfn q() { return SqlQuery(\"a\"); }\n");
        assert_eq!(out.lines().nth(4), Some("fn q() { return SqlQuery(\"a\"); }"));
    }

    #[test]
    fn format_spec_is_dropped_but_expression_still_captured() {
        let out = rewrite::<SqlQuery>("fn q(x) { return f\"v = {x:>8}\"; }\n", 1);
        assert_eq!(out, "fn q(x) { return SqlQuery(\"v = $1\", x); }\n");
    }

    #[test]
    fn brace_escapes_stay_text() {
        let out = rewrite::<SqlQuery>("fn q() { return f\"a {{b}} c\"; }\n", 1);
        assert_eq!(out, "fn q() { return SqlQuery(\"a {b} c\"); }\n");
    }

    #[test]
    fn stack_is_empty_before_and_after_walk() {
        let module =
            parse_module("fn q(x) { return f\"a {f\"b {x}\"}\"; }\n").expect("parse");
        let transformer = BindTransformer::<SqlQuery>::new(1);
        assert_eq!(transformer.depth(), 0);
        // transform() debug-asserts the stack drained; completing the walk
        // means every push was matched by exactly one pop.
        let _ = transformer.transform(module);
    }

    #[test]
    fn plain_strings_are_untouched() {
        let source = "fn q() { return \"no rewrite {here}\"; }\n";
        assert_eq!(rewrite::<SqlQuery>(source, 1), source);
    }
}
