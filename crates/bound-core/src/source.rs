//! Source units and routine source extraction.
//!
//! A routine loaded from a unit records its origin (unit, byte span,
//! starting line); extraction slices the exact definition text back out.
//! Routines synthesized at runtime, and routines produced by a rebind,
//! have no origin and cannot be extracted.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::eval::RoutineValue;

/// A named chunk of bind-script source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub name: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Arc<Self> {
        Arc::new(SourceUnit {
            name: name.into(),
            text: text.into(),
        })
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Arc<Self>> {
        let text = std::fs::read_to_string(path)?;
        Ok(SourceUnit::new(path.display().to_string(), text))
    }
}

/// Where a routine's definition text lives.
#[derive(Debug, Clone)]
pub struct Origin {
    pub unit: Arc<SourceUnit>,
    pub span: Range<usize>,
    /// 1-based line of the `fn` keyword in the unit.
    pub start_line: u32,
}

/// A routine's exact definition text and starting line.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub source: String,
    pub start_line: u32,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no source is recorded for routine '{name}' (synthesized or rebound)")]
    NoSource { name: String },

    #[error("recorded span for routine '{name}' is out of bounds in unit '{unit}'")]
    SpanOutOfBounds { name: String, unit: String },
}

/// Return the routine's exact source text and 1-based starting line.
pub fn extract(routine: &RoutineValue) -> Result<Extracted, ExtractionError> {
    let origin = routine
        .origin
        .as_ref()
        .ok_or_else(|| ExtractionError::NoSource {
            name: routine.name.clone(),
        })?;
    let source = origin
        .unit
        .text
        .get(origin.span.clone())
        .ok_or_else(|| ExtractionError::SpanOutOfBounds {
            name: routine.name.clone(),
            unit: origin.unit.name.clone(),
        })?;
    Ok(Extracted {
        source: source.to_string(),
        start_line: origin.start_line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    const UNIT: &str = "// seed data helpers\n\nfn first() { return 1; }\n\nfn second(x) {\n    return x;\n}\n";

    #[test]
    fn extraction_returns_exact_text_and_line() {
        let runtime = Runtime::new();
        runtime.load(&SourceUnit::new("helpers.bs", UNIT)).unwrap();

        let first = runtime.routine("first").unwrap();
        let extracted = extract(&first).unwrap();
        assert_eq!(extracted.source, "fn first() { return 1; }");
        assert_eq!(extracted.start_line, 3);

        let second = runtime.routine("second").unwrap();
        let extracted = extract(&second).unwrap();
        assert_eq!(extracted.source, "fn second(x) {\n    return x;\n}");
        assert_eq!(extracted.start_line, 5);
    }

    #[test]
    fn unit_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helpers.bs");
        std::fs::write(&path, UNIT).unwrap();

        let unit = SourceUnit::from_path(&path).unwrap();
        assert_eq!(unit.text, UNIT);

        let runtime = Runtime::new();
        runtime.load(&unit).unwrap();
        assert!(runtime.routine("second").is_ok());
    }
}
