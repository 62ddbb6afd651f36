//! # Bound Core
//!
//! Rewrites interpolated string literals in routine source into structured
//! "accumulator" constructor calls before the routine ever runs, so that
//! literal text and embedded expressions stay separate all the way to the
//! consumer. The pipeline:
//!
//! - Source extraction: a loaded routine's exact definition text and
//!   starting line
//! - Full-fidelity parse: a syntax tree that regenerates byte-for-byte
//! - Bind transform: interpolated literals become `Target("tpl", v1, ...)`
//!   constructor expressions, one fresh accumulator per literal
//! - Line-preserving regeneration: blank-line padding keeps diagnostics
//!   pointing at the original file's line numbers
//! - Recompile and rebind: the regenerated chunk is re-parsed (nothing
//!   executes) and the matching fragment relinked with the original
//!   routine's captured scope and default values
//! - Invocation wrapper: same call surface, with an advisory check that
//!   each result is a query for the declared target type
//!
//! Registration runs the pipeline exactly once; every later call goes
//! straight to the wrapper.

#![warn(clippy::all)]

pub mod bind;
pub mod bindable;
pub mod eval;
pub mod rebind;
pub mod runtime;
pub mod source;
pub mod syntax;
pub mod transform;

// Re-export commonly used types
pub use bind::{bind, BindError, BoundRoutine};
pub use bindable::{Bindable, SqlQuery, SqliteQuery};
pub use eval::{Evaluator, RoutineValue, RuntimeError, Scope, Value};
pub use rebind::{rebind, recompile, RebindError};
pub use runtime::Runtime;
pub use source::{extract, ExtractionError, Extracted, SourceUnit};
pub use syntax::{parse_module, Module, ParseError, ToSource};
pub use transform::BindTransformer;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for bound-core components
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bound_core=info".parse().unwrap()),
        )
        .init();
}
