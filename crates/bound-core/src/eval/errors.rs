use thiserror::Error;

/// Runtime error types for routine evaluation.
///
/// Errors raised from inside a routine body carry the defining unit name
/// and the token's line so diagnostics point at original-file line numbers
/// even for rebound routines.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("{unit}:{line}: variable '{name}' not found")]
    VariableNotFound {
        name: String,
        unit: String,
        line: u32,
    },

    #[error("{unit}:{line}: '{name}' is not callable (it is {actual})")]
    NotCallable {
        name: String,
        actual: &'static str,
        unit: String,
        line: u32,
    },

    #[error("{unit}:{line}: cannot add {left} and {right}")]
    BinaryType {
        left: &'static str,
        right: &'static str,
        unit: String,
        line: u32,
    },

    #[error("{unit}:{line}: invalid integer literal '{text}'")]
    InvalidNumber {
        text: String,
        unit: String,
        line: u32,
    },

    #[error("routine '{routine}' is missing an argument for parameter '{param}'")]
    MissingArgument { routine: String, param: String },

    #[error("routine '{routine}' takes {expected} arguments, got {got}")]
    TooManyArguments {
        routine: String,
        expected: usize,
        got: usize,
    },

    #[error("constructor '{target}' requires a string template as its first argument")]
    ConstructorTemplate { target: String },
}

impl RuntimeError {
    pub fn variable_not_found(name: &str, unit: &str, line: u32) -> Self {
        Self::VariableNotFound {
            name: name.to_string(),
            unit: unit.to_string(),
            line,
        }
    }

    pub fn not_callable(name: &str, actual: &'static str, unit: &str, line: u32) -> Self {
        Self::NotCallable {
            name: name.to_string(),
            actual,
            unit: unit.to_string(),
            line,
        }
    }
}
