//! Call-site argument marshaling.
//!
//! `FuncArgs` bundles a call's positional and keyword arguments; `FromArgs`
//! lets a method implementation ask for them in whatever shape it needs
//! rather than unpacking the bundle by hand. Arbitrary-arity
//! keyword/default/varargs binding driven by a proc-macro is out of scope
//! here (see `pytype-derive-impl`'s doc comment) — what's kept is the shape
//! every caller in this crate actually needs.

use ahash::RandomState;
use indexmap::IndexMap;

use crate::errors::CoreError;
use crate::object::core::PyObjectRef;
use crate::vm::VirtualMachine;

/// The positional and keyword arguments of one call, already separated
/// from the callable being invoked.
#[derive(Debug, Clone, Default)]
pub struct FuncArgs {
    pub args: Vec<PyObjectRef>,
    pub kwargs: IndexMap<String, PyObjectRef, RandomState>,
}

impl FuncArgs {
    pub fn new(args: Vec<PyObjectRef>) -> Self {
        Self {
            args,
            kwargs: IndexMap::default(),
        }
    }

    pub fn with_kwargs(args: Vec<PyObjectRef>, kwargs: IndexMap<String, PyObjectRef, RandomState>) -> Self {
        Self { args, kwargs }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    pub fn kwarg(&self, name: &str) -> Option<PyObjectRef> {
        self.kwargs.get(name).cloned()
    }

    /// Fails unless exactly `n` positional arguments and no keyword
    /// arguments were given.
    pub fn expect_arity(&self, n: usize) -> Result<(), CoreError> {
        if self.args.len() == n && self.kwargs.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ArgumentError {
                callee: "<special method>".into(),
                detail: format!("expected {n} positional argument(s), got {}", self.args.len()),
            })
        }
    }

    /// Consumes and returns the single positional argument this call must
    /// carry (the right-hand operand of a binary special method).
    pub fn take_one(&mut self) -> Result<PyObjectRef, CoreError> {
        if self.args.len() != 1 || !self.kwargs.is_empty() {
            return Err(CoreError::ArgumentError {
                callee: "<special method>".into(),
                detail: format!("expected exactly 1 argument, got {}", self.args.len()),
            });
        }
        Ok(self.args.remove(0))
    }

    /// Parses this call's arguments into `T` via [`FromArgs`].
    pub fn bind<T: FromArgs>(self, vm: &VirtualMachine) -> crate::errors::PyResult<T> {
        T::from_args(self, vm)
    }
}

/// Implemented by anything that can be produced by parsing a [`FuncArgs`]
/// bundle — the seam method implementations bind their own parameters
/// through, so a method taking `(self, FuncArgs, &VirtualMachine)` reads
/// no differently than one that destructures typed parameters.
pub trait FromArgs: Sized {
    fn from_args(args: FuncArgs, vm: &VirtualMachine) -> crate::errors::PyResult<Self>;
}

impl FromArgs for FuncArgs {
    fn from_args(args: FuncArgs, _vm: &VirtualMachine) -> crate::errors::PyResult<Self> {
        Ok(args)
    }
}

/// What a generated setter receives: either the new value to assign, or a
/// request to delete the attribute (`del obj.attr` dispatches through the
/// same setter slot with `Delete`).
#[derive(Debug, Clone)]
pub enum PySetterValue {
    Assign(PyObjectRef),
    Delete,
}

impl PySetterValue {
    pub fn is_delete(&self) -> bool {
        matches!(self, PySetterValue::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_arity_rejects_wrong_count() {
        let args = FuncArgs::new(vec![]);
        assert!(args.expect_arity(0).is_ok());
        assert!(args.expect_arity(1).is_err());
    }

    #[test]
    fn take_one_requires_exactly_one_positional() {
        let mut empty = FuncArgs::new(vec![]);
        assert!(empty.take_one().is_err());
    }
}
