//! Values, scopes, and the expression-tree interpreter.
//!
//! Rewritten routine bodies are not compiled to machine code; they are
//! syntax trees evaluated on demand. Routine values hold their captured
//! scope by reference, so a later mutation of an outer-scope variable is
//! observed identically by the original and any rebound routine.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::source::Origin;
use crate::syntax::{Block, Expr, RoutineDef, Segment, Stmt};

pub mod errors;

#[cfg(test)]
mod tests;

pub use errors::RuntimeError;

pub type SharedScope = Arc<RwLock<Scope>>;

/// One lexical scope level. Lookup walks the parent chain.
pub struct Scope {
    vars: IndexMap<String, Value>,
    parent: Option<SharedScope>,
}

impl Scope {
    pub fn root() -> SharedScope {
        Arc::new(RwLock::new(Scope {
            vars: IndexMap::new(),
            parent: None,
        }))
    }

    pub fn child(parent: &SharedScope) -> SharedScope {
        Arc::new(RwLock::new(Scope {
            vars: IndexMap::new(),
            parent: Some(parent.clone()),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.read().get(name))
    }

    /// Define or overwrite a binding in this scope level.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Str(String),
    List(Vec<Value>),
    /// A structured query accumulator produced by a rewritten literal:
    /// the template text and its captured values, kept separate.
    Query {
        target: String,
        template: String,
        values: Vec<Value>,
    },
    Routine(Arc<RoutineValue>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Query { .. } => "query",
            Value::Routine(_) => "routine",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (
                Value::Query {
                    target: ta,
                    template: a,
                    values: va,
                },
                Value::Query {
                    target: tb,
                    template: b,
                    values: vb,
                },
            ) => ta == tb && a == b && va == vb,
            (Value::Routine(a), Value::Routine(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Query {
                target,
                template,
                values,
            } => write!(f, "{target}({template:?}, {values:?})"),
            Value::Routine(r) => write!(f, "<routine {}>", r.name),
        }
    }
}

/// A callable routine: parameter list, evaluated default values, body tree,
/// and the captured scope it closes over.
pub struct RoutineValue {
    pub name: String,
    pub params: Vec<String>,
    pub defaults: Vec<Option<Value>>,
    pub body: Block,
    pub env: SharedScope,
    /// Defining unit name, used in runtime diagnostics.
    pub unit: String,
    pub origin: Option<Origin>,
}

impl fmt::Debug for RoutineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineValue")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

/// Runtime hook for constructor identifiers appearing in rewritten bodies.
pub type Constructor = Arc<dyn Fn(Vec<Value>) -> Result<Value, RuntimeError> + Send + Sync>;

enum ControlFlow {
    Next,
    Return(Value),
}

pub struct Evaluator {
    constructors: Arc<DashMap<String, Constructor>>,
}

impl Evaluator {
    pub fn new(constructors: Arc<DashMap<String, Constructor>>) -> Self {
        Evaluator { constructors }
    }

    /// Build a routine value from a definition, evaluating parameter
    /// defaults once, in the defining scope.
    pub fn define_routine(
        &self,
        def: &RoutineDef,
        env: &SharedScope,
        unit: &str,
        origin: Option<Origin>,
    ) -> Result<Arc<RoutineValue>, RuntimeError> {
        let params: Vec<String> = def.params.iter().map(|p| p.name.text.clone()).collect();
        let mut defaults = Vec::with_capacity(def.params.len());
        for param in &def.params {
            defaults.push(match &param.default {
                Some((_, expr)) => Some(self.eval_expr(expr, env, unit)?),
                None => None,
            });
        }
        Ok(Arc::new(RoutineValue {
            name: def.name.text.clone(),
            params,
            defaults,
            body: def.body.clone(),
            env: env.clone(),
            unit: unit.to_string(),
            origin,
        }))
    }

    pub fn call_routine(
        &self,
        routine: &Arc<RoutineValue>,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        if args.len() > routine.params.len() {
            return Err(RuntimeError::TooManyArguments {
                routine: routine.name.clone(),
                expected: routine.params.len(),
                got: args.len(),
            });
        }
        let scope = Scope::child(&routine.env);
        for (i, param) in routine.params.iter().enumerate() {
            let value = if let Some(arg) = args.get(i) {
                arg.clone()
            } else if let Some(Some(default)) = routine.defaults.get(i) {
                default.clone()
            } else {
                return Err(RuntimeError::MissingArgument {
                    routine: routine.name.clone(),
                    param: param.clone(),
                });
            };
            scope.write().define(param.clone(), value);
        }
        match self.exec_block(&routine.body, &scope, &routine.unit)? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Next => Ok(Value::Null),
        }
    }

    fn exec_block(
        &self,
        block: &Block,
        scope: &SharedScope,
        unit: &str,
    ) -> Result<ControlFlow, RuntimeError> {
        for stmt in &block.stmts {
            match self.exec_stmt(stmt, scope, unit)? {
                ControlFlow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(ControlFlow::Next)
    }

    fn exec_stmt(
        &self,
        stmt: &Stmt,
        scope: &SharedScope,
        unit: &str,
    ) -> Result<ControlFlow, RuntimeError> {
        match stmt {
            Stmt::Routine(def) => {
                // Defined at runtime: captures the current scope, carries
                // no extractable origin.
                let routine = self.define_routine(def, scope, unit, None)?;
                scope
                    .write()
                    .define(def.name.text.clone(), Value::Routine(routine));
                Ok(ControlFlow::Next)
            }
            Stmt::Let { name, value, .. } => {
                let value = self.eval_expr(value, scope, unit)?;
                scope.write().define(name.text.clone(), value);
                Ok(ControlFlow::Next)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope, unit)?,
                    None => Value::Null,
                };
                Ok(ControlFlow::Return(value))
            }
            Stmt::Expr { value, .. } => {
                self.eval_expr(value, scope, unit)?;
                Ok(ControlFlow::Next)
            }
        }
    }

    pub fn eval_expr(
        &self,
        expr: &Expr,
        scope: &SharedScope,
        unit: &str,
    ) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Str(s) => Ok(Value::Str(s.value.clone())),
            Expr::Number(t) => {
                t.text
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| RuntimeError::InvalidNumber {
                        text: t.text.clone(),
                        unit: unit.to_string(),
                        line: t.line,
                    })
            }
            Expr::Bool(t) => Ok(Value::Boolean(t.text == "true")),
            Expr::Null(_) => Ok(Value::Null),
            Expr::Ident(t) => scope
                .read()
                .get(&t.text)
                .ok_or_else(|| RuntimeError::variable_not_found(&t.text, unit, t.line)),
            // Direct evaluation of an interpolated literal splices values
            // into the text. This is the unsafe path the bind transform
            // replaces; it only runs in routines that were never bound.
            Expr::Interp(lit) => {
                let mut out = String::new();
                for segment in &lit.segments {
                    match segment {
                        Segment::Text { decoded } => out.push_str(decoded),
                        Segment::Expr { expr, .. } => {
                            let value = self.eval_expr(expr, scope, unit)?;
                            out.push_str(&value.to_string());
                        }
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::Binary { left, op, right } => {
                let lhs = self.eval_expr(left, scope, unit)?;
                let rhs = self.eval_expr(right, scope, unit)?;
                match (lhs, rhs) {
                    (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
                    (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                    (l, r) => Err(RuntimeError::BinaryType {
                        left: l.type_name(),
                        right: r.type_name(),
                        unit: unit.to_string(),
                        line: op.line,
                    }),
                }
            }
            Expr::Paren { inner, .. } => self.eval_expr(inner, scope, unit),
            Expr::Call(call) => {
                let name = &call.callee.text;
                let target = scope.read().get(name);
                if let Some(value) = target {
                    return match value {
                        Value::Routine(routine) => {
                            let args = self.eval_args(call, scope, unit)?;
                            self.call_routine(&routine, &args)
                        }
                        other => Err(RuntimeError::not_callable(
                            name,
                            other.type_name(),
                            unit,
                            call.callee.line,
                        )),
                    };
                }
                let constructor = self.constructors.get(name).map(|c| c.value().clone());
                if let Some(constructor) = constructor {
                    let args = self.eval_args(call, scope, unit)?;
                    return constructor(args);
                }
                Err(RuntimeError::variable_not_found(
                    name,
                    unit,
                    call.callee.line,
                ))
            }
        }
    }

    fn eval_args(
        &self,
        call: &crate::syntax::CallExpr,
        scope: &SharedScope,
        unit: &str,
    ) -> Result<Vec<Value>, RuntimeError> {
        call.args
            .iter()
            .map(|arg| self.eval_expr(&arg.value, scope, unit))
            .collect()
    }
}
