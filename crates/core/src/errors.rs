//! Error taxonomy.
//!
//! Exception-hierarchy population is an explicit external collaborator, so
//! rather than modeling `TypeError`/`AttributeError` as `PyObject`s
//! reachable through the type system itself (and reopening the
//! `type`/`object`/`BaseException` bootstrap cycle a second time), the
//! user-visible kinds are a plain taxonomy, much like a compiler's own
//! errors are usually a `thiserror::Error` enum rather than a
//! `PyObject`-backed exception. A real interpreter's exception object
//! layer would consume `PyException::kind`/`message` to build the
//! corresponding `PyBaseException` instance; that conversion is the
//! external collaborator's job.

use std::fmt;

use crate::object::PyObjectRef;

/// The user-visible error kinds, minus the internal-only sentinels, which
/// never escape [`CoreError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    TypeError,
    AttributeError,
    StopIteration,
}

#[derive(Debug, Clone)]
pub struct PyException {
    pub kind: ErrorKind,
    pub message: String,
}

impl PyException {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AttributeError, message)
    }

    pub fn stop_iteration() -> Self {
        Self::new(ErrorKind::StopIteration, "StopIteration")
    }

    pub fn is_attribute_error(&self) -> bool {
        self.kind == ErrorKind::AttributeError
    }
}

impl fmt::Display for PyException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PyException {}

pub type PyResult<T = PyObjectRef> = Result<T, PyException>;

/// Internal sentinels: never surfaced to user code directly, always
/// translated at the nearest boundary via [`CoreError::into_pyexception`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// A special-method slot was not filled. Handled internally by the
    /// caller (e.g. `__str__` falling back to `__repr__`); if it escapes
    /// all the way to a public boundary it means no fallback applied.
    #[error("slot not filled for '{special}' on '{type_name}'")]
    EmptySlot {
        special: &'static str,
        type_name: String,
    },

    /// Argument count/kw-name mismatch while marshaling a call.
    #[error("argument mismatch calling '{callee}': {detail}")]
    ArgumentError { callee: String, detail: String },

    /// Attempt to bind a native class to two different Representations.
    #[error("class '{class_name}' is already bound to a different representation")]
    Clash { class_name: String },

    /// C3 linearization had no solution.
    #[error(
        "Cannot create a consistent method resolution order (MRO) for bases {bases:?}"
    )]
    MROConflict { bases: Vec<String> },

    /// A type-system invariant was violated; always a bug in this crate.
    #[error("type system invariant violated: {0}")]
    InternalError(String),
}

impl CoreError {
    /// Translates an internal sentinel into the user-visible taxonomy at
    /// the nearest boundary.
    pub fn into_pyexception(self) -> PyException {
        match self {
            CoreError::EmptySlot { special, type_name } => PyException::type_error(format!(
                "'{type_name}' object has no usable '{special}' implementation"
            )),
            CoreError::ArgumentError { callee, detail } => {
                PyException::type_error(format!("{callee}(): {detail}"))
            }
            CoreError::Clash { class_name } => PyException::type_error(format!(
                "internal error: class '{class_name}' clashes with an existing representation"
            )),
            CoreError::MROConflict { bases } => PyException::type_error(format!(
                "Cannot create a consistent method resolution order (MRO) for bases {}",
                bases.join(", ")
            )),
            CoreError::InternalError(detail) => {
                PyException::type_error(format!("internal error: {detail}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_translates_to_type_error() {
        let err = CoreError::EmptySlot {
            special: "__repr__",
            type_name: "Demo".into(),
        }
        .into_pyexception();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("__repr__"));
    }

    #[test]
    fn mro_conflict_translates_to_type_error() {
        let err = CoreError::MROConflict {
            bases: vec!["B".into(), "C".into()],
        }
        .into_pyexception();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("MRO"));
    }
}
