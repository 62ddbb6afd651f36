//! Recompilation and rebinding.
//!
//! The regenerated source is re-parsed (a structural step that executes
//! nothing) and searched for exactly one routine fragment matching the
//! original's name. That fragment is combined with the original routine's
//! captured scope and already-evaluated default values, so free-variable
//! resolution and default-argument behavior are unchanged.

use std::sync::Arc;

use thiserror::Error;

use crate::eval::RoutineValue;
use crate::syntax::{self, Module, ParseError, RoutineDef, Stmt};

#[derive(Error, Debug)]
pub enum RebindError {
    #[error("no routine named '{name}' in the recompiled chunk")]
    MissingFragment { name: String },

    #[error("found {count} routines named '{name}' in the recompiled chunk")]
    AmbiguousFragment { name: String, count: usize },
}

/// Structural compilation of regenerated source. Nothing is executed and
/// nothing is defined; the result is only searched for fragments.
pub fn recompile(source: &str) -> Result<Module, ParseError> {
    syntax::parse_module(source)
}

/// Build a new routine value from the one fragment in `module` whose name
/// matches the original, sharing the original's captured scope, defaults,
/// and unit identity. The rebound routine has no extractable origin.
pub fn rebind(
    module: &Module,
    original: &RoutineValue,
) -> Result<Arc<RoutineValue>, RebindError> {
    let mut fragments = Vec::new();
    for def in &module.routines {
        collect_fragments(def, &mut fragments);
    }
    let matches: Vec<&RoutineDef> = fragments
        .into_iter()
        .filter(|def| def.name.text == original.name)
        .collect();
    let def = match matches.len() {
        1 => matches[0],
        0 => {
            return Err(RebindError::MissingFragment {
                name: original.name.clone(),
            })
        }
        count => {
            return Err(RebindError::AmbiguousFragment {
                name: original.name.clone(),
                count,
            })
        }
    };
    Ok(Arc::new(RoutineValue {
        name: original.name.clone(),
        params: def.params.iter().map(|p| p.name.text.clone()).collect(),
        defaults: original.defaults.clone(),
        body: def.body.clone(),
        env: original.env.clone(),
        unit: original.unit.clone(),
        origin: None,
    }))
}

/// Nested routine definitions count as fragments of the chunk too.
fn collect_fragments<'a>(def: &'a RoutineDef, out: &mut Vec<&'a RoutineDef>) {
    out.push(def);
    for stmt in &def.body.stmts {
        if let Stmt::Routine(inner) = stmt {
            collect_fragments(inner, out);
        }
    }
}
