use super::*;
use crate::runtime::Runtime;
use crate::source::SourceUnit;

fn loaded(source: &str) -> Runtime {
    let runtime = Runtime::new();
    runtime
        .load(&SourceUnit::new("eval_tests.bs", source))
        .expect("load");
    runtime
}

#[test]
fn returns_literal_values() {
    let rt = loaded("fn n() { return 42; }\nfn s() { return \"hi\"; }\nfn nothing() { return; }\n");
    assert_eq!(rt.call("n", &[]).unwrap(), Value::Integer(42));
    assert_eq!(rt.call("s", &[]).unwrap(), Value::Str("hi".into()));
    assert_eq!(rt.call("nothing", &[]).unwrap(), Value::Null);
}

#[test]
fn let_bindings_are_scoped_to_the_call() {
    let rt = loaded("fn f(x) { let y = x + 1; return y; }\n");
    assert_eq!(rt.call("f", &[Value::Integer(2)]).unwrap(), Value::Integer(3));
    assert!(rt.get_global("y").is_none());
}

#[test]
fn defaults_fill_missing_arguments() {
    let rt = loaded("fn page(limit = 10) { return limit; }\n");
    assert_eq!(rt.call("page", &[]).unwrap(), Value::Integer(10));
    assert_eq!(
        rt.call("page", &[Value::Integer(5)]).unwrap(),
        Value::Integer(5)
    );
}

#[test]
fn missing_argument_without_default_is_an_error() {
    let rt = loaded("fn f(x) { return x; }\n");
    let err = rt.call("f", &[]).unwrap_err();
    let err = err.downcast::<RuntimeError>().expect("runtime error");
    assert!(matches!(err, RuntimeError::MissingArgument { .. }));
}

#[test]
fn too_many_arguments_is_an_error() {
    let rt = loaded("fn f() { return 1; }\n");
    let err = rt
        .call("f", &[Value::Integer(1)])
        .unwrap_err()
        .downcast::<RuntimeError>()
        .expect("runtime error");
    assert!(matches!(err, RuntimeError::TooManyArguments { .. }));
}

#[test]
fn naive_interpolation_splices_values_into_text() {
    let rt = loaded("fn greet(who) { return f\"hello {who}!\"; }\n");
    assert_eq!(
        rt.call("greet", &[Value::Str("world".into())]).unwrap(),
        Value::Str("hello world!".into())
    );
}

#[test]
fn routines_read_globals_through_the_scope_chain() {
    let rt = loaded("fn greet() { return f\"hello {who}\"; }\n");
    rt.set_global("who", Value::Str("alice".into()));
    assert_eq!(
        rt.call("greet", &[]).unwrap(),
        Value::Str("hello alice".into())
    );
    rt.set_global("who", Value::Str("bob".into()));
    assert_eq!(
        rt.call("greet", &[]).unwrap(),
        Value::Str("hello bob".into())
    );
}

#[test]
fn undefined_variable_reports_unit_and_line() {
    let rt = loaded("fn f() {\n    return missing;\n}\n");
    let err = rt
        .call("f", &[])
        .unwrap_err()
        .downcast::<RuntimeError>()
        .expect("runtime error");
    let RuntimeError::VariableNotFound { name, unit, line } = err else {
        panic!("expected VariableNotFound, got {err:?}");
    };
    assert_eq!(name, "missing");
    assert_eq!(unit, "eval_tests.bs");
    assert_eq!(line, 2);
}

#[test]
fn nested_routines_capture_the_enclosing_call_scope() {
    let rt = loaded(
        "fn outer(x) {\n    fn inner() { return x + 1; }\n    return inner();\n}\n",
    );
    assert_eq!(
        rt.call("outer", &[Value::Integer(4)]).unwrap(),
        Value::Integer(5)
    );
}

#[test]
fn nested_routines_have_no_origin() {
    let rt = loaded("fn outer() {\n    fn inner() { return 1; }\n    return inner;\n}\n");
    let Value::Routine(inner) = rt.call("outer", &[]).unwrap() else {
        panic!("expected routine value");
    };
    assert!(inner.origin.is_none());
}

#[test]
fn calling_a_non_routine_is_an_error() {
    let rt = loaded("fn f() { return x(); }\n");
    rt.set_global("x", Value::Integer(3));
    let err = rt
        .call("f", &[])
        .unwrap_err()
        .downcast::<RuntimeError>()
        .expect("runtime error");
    assert!(matches!(err, RuntimeError::NotCallable { .. }));
}

#[test]
fn string_concatenation_with_plus() {
    let rt = loaded("fn f(a, b) { return a + b; }\n");
    assert_eq!(
        rt.call("f", &[Value::Str("ab".into()), Value::Str("cd".into())])
            .unwrap(),
        Value::Str("abcd".into())
    );
}

#[test]
fn adding_mixed_types_is_an_error() {
    let rt = loaded("fn f() { return \"a\" + 1; }\n");
    let err = rt
        .call("f", &[])
        .unwrap_err()
        .downcast::<RuntimeError>()
        .expect("runtime error");
    assert!(matches!(
        err,
        RuntimeError::BinaryType {
            left: "string",
            right: "integer",
            ..
        }
    ));
}
