//! Runtime façade: a cheaply cloneable handle over the global scope and
//! the constructor registry.

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use tracing::debug;

use crate::eval::{Constructor, Evaluator, RoutineValue, Scope, SharedScope, Value};
use crate::source::{Origin, SourceUnit};
use crate::syntax;

#[derive(Clone)]
pub struct Runtime {
    globals: SharedScope,
    constructors: Arc<DashMap<String, Constructor>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            globals: Scope::root(),
            constructors: Arc::new(DashMap::new()),
        }
    }

    /// Parse a unit and define its top-level routines into the global
    /// scope. No statements run; parameter defaults are the only
    /// expressions evaluated, once each, at definition time.
    pub fn load(&self, unit: &Arc<SourceUnit>) -> Result<()> {
        let module = syntax::parse_module(&unit.text)?;
        let evaluator = self.evaluator();
        for def in &module.routines {
            let origin = Origin {
                unit: unit.clone(),
                span: def.span(),
                start_line: def.fn_kw.line,
            };
            let routine = evaluator.define_routine(def, &self.globals, &unit.name, Some(origin))?;
            debug!(routine = %routine.name, unit = %unit.name, "defined routine");
            self.globals
                .write()
                .define(def.name.text.clone(), Value::Routine(routine));
        }
        Ok(())
    }

    pub fn routine(&self, name: &str) -> Result<Arc<RoutineValue>> {
        match self.globals.read().get(name) {
            Some(Value::Routine(routine)) => Ok(routine),
            Some(other) => anyhow::bail!("'{name}' is not a routine (it is {})", other.type_name()),
            None => anyhow::bail!("no routine named '{name}'"),
        }
    }

    /// Call a loaded routine by name through the interpreter.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let routine = self.routine(name)?;
        Ok(self.evaluator().call_routine(&routine, args)?)
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.globals.write().define(name, value);
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.read().get(name)
    }

    pub fn register_constructor(&self, name: &str, constructor: Constructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(self.constructors.clone())
    }
}
