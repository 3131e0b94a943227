//! Native method metadata.
//!
//! `#[pyexpose]`-tagged methods are always
//! `(&PyObject, FuncArgs, &VirtualMachine) -> PyResult`, so a per-signature
//! `METH_O`/`METH_NOARGS`/`METH_FASTCALL`-style split collapses into a
//! single flags bitset that only matters for the method-descriptor's
//! documentation/introspection story.

use bitflags::bitflags;

use crate::function::argument::FuncArgs;
use crate::object::core::PyObject;
use crate::vm::VirtualMachine;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PyMethodFlags: u32 {
        /// Bound as an instance method (receives `self`).
        const METHOD = 1 << 0;
        /// Bound as a classmethod (receives the class, not an instance).
        const CLASS = 1 << 1;
        /// Bound as a staticmethod (receives neither).
        const STATIC = 1 << 2;

        const DEFAULT = Self::METHOD.bits();
    }
}

impl Default for PyMethodFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub type NativeMethodFunc = fn(&PyObject, FuncArgs, &VirtualMachine) -> crate::errors::PyResult;

/// One native method exposed on a class.
#[derive(Clone)]
pub struct PyMethodDef {
    pub name: &'static str,
    pub doc: Option<&'static str>,
    pub flags: PyMethodFlags,
    pub func: NativeMethodFunc,
}

impl PyMethodDef {
    pub fn new(name: &'static str, func: NativeMethodFunc) -> Self {
        Self {
            name,
            doc: None,
            flags: PyMethodFlags::default(),
            func,
        }
    }

    pub fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn with_flags(mut self, flags: PyMethodFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl std::fmt::Debug for PyMethodDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyMethodDef")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_zelf: &PyObject, _args: FuncArgs, vm: &VirtualMachine) -> crate::errors::PyResult {
        Ok(vm.none())
    }

    #[test]
    fn new_defaults_to_instance_method_with_no_doc() {
        let def = PyMethodDef::new("f", noop);
        assert_eq!(def.flags, PyMethodFlags::METHOD);
        assert!(def.doc.is_none());
    }

    #[test]
    fn builder_methods_override_doc_and_flags() {
        let def = PyMethodDef::new("f", noop)
            .with_doc("does a thing")
            .with_flags(PyMethodFlags::STATIC);
        assert_eq!(def.doc, Some("does a thing"));
        assert_eq!(def.flags, PyMethodFlags::STATIC);
    }

    #[test]
    fn flags_are_distinct_bits() {
        assert_ne!(PyMethodFlags::METHOD, PyMethodFlags::CLASS);
        assert_ne!(PyMethodFlags::CLASS, PyMethodFlags::STATIC);
        assert!(!PyMethodFlags::METHOD.contains(PyMethodFlags::STATIC));
    }
}
