// Pipeline-level properties: registration-time failures, line-number
// preservation, shared captured scope, and the advisory result check.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;

use bound_core::{
    bind, BindError, ExtractionError, RebindError, Runtime, RuntimeError, SourceUnit, SqlQuery,
    Value,
};

const UNIT: &str = r#"// pipeline fixtures
// (padding so routines start deeper in the file)

fn broken(x) {
    let q = f"id = {x}";
    return q + missing;
}

fn greet() {
    return f"hello {who}";
}

fn page(limit = 10) {
    return f"LIMIT {limit}";
}

fn make() {
    fn inner() { return f"x"; }
    return inner;
}

fn twin(x) {
    fn twin() { return null; }
    return f"v = {x}";
}

fn plain() {
    return "just text";
}
"#;

fn loaded() -> Runtime {
    let runtime = Runtime::new();
    runtime
        .load(&SourceUnit::new("pipeline.bs", UNIT))
        .expect("load");
    runtime
}

#[test]
fn rebound_routine_reports_original_line_numbers() {
    let rt = loaded();
    let bound = bind::<SqlQuery>(&rt, &rt.routine("broken").unwrap()).expect("bind");
    let err = bound.call(&[Value::Integer(1)]).unwrap_err();
    let RuntimeError::VariableNotFound { name, unit, line } = err else {
        panic!("expected VariableNotFound, got {err:?}");
    };
    assert_eq!(name, "missing");
    assert_eq!(unit, "pipeline.bs");
    // `return q + missing;` sits on line 6 of the original unit.
    assert_eq!(line, 6);
}

#[test]
fn captured_scope_is_shared_not_copied() {
    let rt = loaded();
    let bound = bind::<SqlQuery>(&rt, &rt.routine("greet").unwrap()).expect("bind");

    rt.set_global("who", Value::Str("alice".into()));
    let Value::Query { values, .. } = bound.call(&[]).expect("call") else {
        panic!("expected query value");
    };
    assert_eq!(values, vec![Value::Str("alice".into())]);

    // Later mutation of the outer scope is observed by the rebound routine
    // and the original alike.
    rt.set_global("who", Value::Str("bob".into()));
    let Value::Query { values, .. } = bound.call(&[]).expect("call") else {
        panic!("expected query value");
    };
    assert_eq!(values, vec![Value::Str("bob".into())]);
    assert_eq!(
        rt.call("greet", &[]).unwrap(),
        Value::Str("hello bob".into())
    );
}

#[test]
fn defaults_survive_rebinding() {
    let rt = loaded();
    let bound = bind::<SqlQuery>(&rt, &rt.routine("page").unwrap()).expect("bind");
    let Value::Query {
        template, values, ..
    } = bound.call(&[]).expect("call")
    else {
        panic!("expected query value");
    };
    assert_eq!(template, "LIMIT $1");
    assert_eq!(values, vec![Value::Integer(10)]);

    let Value::Query { values, .. } = bound.call(&[Value::Integer(5)]).expect("call") else {
        panic!("expected query value");
    };
    assert_eq!(values, vec![Value::Integer(5)]);
}

#[test]
fn binding_twice_yields_equivalent_wrappers() {
    let rt = loaded();
    let first = bind::<SqlQuery>(&rt, &rt.routine("page").unwrap()).expect("bind");
    let second = bind::<SqlQuery>(&rt, &rt.routine("page").unwrap()).expect("bind");
    assert_eq!(first.name(), second.name());
    assert_eq!(first.params(), second.params());
    assert_eq!(
        first.call(&[Value::Integer(2)]).expect("call"),
        second.call(&[Value::Integer(2)]).expect("call")
    );
}

#[test]
fn synthesized_routines_cannot_be_bound() {
    let rt = loaded();
    let Value::Routine(inner) = rt.call("make", &[]).expect("call") else {
        panic!("expected routine value");
    };
    let err = bind::<SqlQuery>(&rt, &inner).unwrap_err();
    assert!(matches!(
        err,
        BindError::Extraction(ExtractionError::NoSource { .. })
    ));
}

#[test]
fn shadowing_nested_routine_is_ambiguous_at_registration() {
    let rt = loaded();
    let err = bind::<SqlQuery>(&rt, &rt.routine("twin").unwrap()).unwrap_err();
    assert!(matches!(
        err,
        BindError::Rebind(RebindError::AmbiguousFragment { count: 2, .. })
    ));
}

#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn type_mismatch_warns_but_returns_the_value() {
    let rt = loaded();
    let bound = bind::<SqlQuery>(&rt, &rt.routine("plain").unwrap()).expect("bind");

    let writer = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_max_level(Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, || bound.call(&[]))
        .expect("call");

    // Advisory only: the value still comes back.
    assert_eq!(result, Value::Str("just text".into()));
    let logs = String::from_utf8(writer.0.lock().clone()).expect("utf8 logs");
    assert!(
        logs.contains("unexpected result type"),
        "expected a warning in: {logs}"
    );
}
