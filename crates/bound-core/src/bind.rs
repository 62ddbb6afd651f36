//! Registration entry point and invocation wrapper.
//!
//! `bind` runs the whole pipeline once, synchronously, at registration:
//! extract -> parse -> transform -> regenerate -> recompile -> rebind ->
//! wrap. Structural failures surface here; after registration every call
//! goes straight through the wrapper without re-running the pipeline.

use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bindable::Bindable;
use crate::eval::{Constructor, RoutineValue, RuntimeError, Value};
use crate::rebind::{self, RebindError};
use crate::runtime::Runtime;
use crate::source::{self, ExtractionError};
use crate::syntax::{self, ParseError, ToSource};
use crate::transform::BindTransformer;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("rebind failed: {0}")]
    Rebind(#[from] RebindError),
}

/// Rewrite every interpolated literal in `routine` into `T` constructor
/// expressions and return a wrapped, call-compatible routine.
pub fn bind<T: Bindable>(
    runtime: &Runtime,
    routine: &Arc<RoutineValue>,
) -> Result<BoundRoutine<T>, BindError> {
    let extracted = source::extract(routine)?;
    debug!(
        routine = %routine.name,
        unit = %routine.unit,
        line = extracted.start_line,
        "binding routine"
    );
    debug!(original_source = %extracted.source);

    let module = syntax::parse_module(&extracted.source)?;
    let module = BindTransformer::<T>::new(extracted.start_line as usize).transform(module);
    let modified = module.to_source();
    debug!(modified_source = %modified);

    let recompiled = rebind::recompile(&modified)?;
    let rebuilt = rebind::rebind(&recompiled, routine)?;

    runtime.register_constructor(T::TARGET, constructor_for::<T>());
    info!(routine = %routine.name, target = T::TARGET, "bound interpolated literals");

    Ok(BoundRoutine {
        routine: rebuilt,
        runtime: runtime.clone(),
        _target: PhantomData,
    })
}

/// Runtime constructor for `T`: first argument is the finished template,
/// the rest are the captured values in order.
fn constructor_for<T: Bindable>() -> Constructor {
    Arc::new(|mut args: Vec<Value>| {
        if args.is_empty() {
            return Err(RuntimeError::ConstructorTemplate {
                target: T::TARGET.to_string(),
            });
        }
        match args.remove(0) {
            Value::Str(template) => Ok(Value::Query {
                target: T::TARGET.to_string(),
                template,
                values: args,
            }),
            _ => Err(RuntimeError::ConstructorTemplate {
                target: T::TARGET.to_string(),
            }),
        }
    })
}

/// Thin wrapper over a rebuilt routine. Exposes the original call surface
/// (same name, parameters, defaults) and performs an advisory check that
/// each result is a query for the declared target.
pub struct BoundRoutine<T: Bindable> {
    routine: Arc<RoutineValue>,
    runtime: Runtime,
    _target: PhantomData<T>,
}

impl<T: Bindable> std::fmt::Debug for BoundRoutine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundRoutine")
            .field("name", &self.routine.name)
            .field("params", &self.routine.params)
            .finish_non_exhaustive()
    }
}

impl<T: Bindable> BoundRoutine<T> {
    pub fn name(&self) -> &str {
        &self.routine.name
    }

    pub fn params(&self) -> &[String] {
        &self.routine.params
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        let result = self
            .runtime
            .evaluator()
            .call_routine(&self.routine, args)?;
        match &result {
            Value::Query { target, .. } if target == T::TARGET => {}
            other => warn!(
                routine = %self.routine.name,
                expected = T::TARGET,
                actual = other.type_name(),
                "bound routine returned an unexpected result type"
            ),
        }
        Ok(result)
    }
}
