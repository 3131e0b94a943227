//! Descriptors: the four adapters that bridge native methods/fields
//! into the Python attribute/call protocol.
//!
//! Grounded on `crates/vm/src/builtins/descriptor.rs`'s `PyMemberDescriptor`
//! / `PyMethodDescriptor` / `PyWrapper` / `PyMethodWrapper` family. Every
//! descriptor payload here is an ordinary [`PyPayload`], stored as a value
//! in a `PyType`'s dict exactly like any other attribute; what makes it a
//! *descriptor* is that its own native class's [`crate::registry::Representation`]
//! fills the `__get__` slot (and, for the two data-descriptor kinds,
//! `__set__`/`__delete__` too) — the attribute protocol (`crate::protocol`)
//! never special-cases these types by name, it just asks the registry for
//! their slot table like it would for any other object.

pub mod getset;
pub mod member;
pub mod method;
pub mod wrapper;

pub use getset::PyGetSetDescriptor;
pub use member::{MemberKind, PyMemberDescriptor, PyMemberDef};
pub use method::{MethodFunc, PyBoundMethod, PyMethodDescriptor};
pub use wrapper::{PyMethodWrapper, PyWrapperDescriptor};

use crate::builtins::type_::PyTypeRef;
use crate::intern::PyStrInterned;
use pytype_common::lock::PyRwLock;

/// Fields shared by every descriptor kind: owning type (`objclass`),
/// attribute name, and optional documentation.
#[derive(Debug)]
pub struct DescriptorCommon {
    pub objclass: PyTypeRef,
    pub name: &'static PyStrInterned,
    pub doc: Option<&'static str>,
    pub qualname: PyRwLock<Option<String>>,
}

impl DescriptorCommon {
    pub fn new(objclass: PyTypeRef, name: &'static PyStrInterned, doc: Option<&'static str>) -> Self {
        Self {
            objclass,
            name,
            doc,
            qualname: PyRwLock::new(None),
        }
    }

    pub fn qualname(&self) -> String {
        self.qualname
            .read()
            .clone()
            .unwrap_or_else(|| format!("{}.{}", self.objclass.name(), self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::VirtualMachine;

    #[test]
    fn qualname_defaults_to_objclass_dot_name() {
        let vm = VirtualMachine::new();
        let name = vm.ctx.intern_str("foo");
        let common = DescriptorCommon::new(vm.ctx.types.object_type.clone(), name, None);
        assert_eq!(common.qualname(), "object.foo");
    }

    #[test]
    fn explicit_qualname_overrides_the_default() {
        let vm = VirtualMachine::new();
        let name = vm.ctx.intern_str("foo");
        let common = DescriptorCommon::new(vm.ctx.types.object_type.clone(), name, None);
        *common.qualname.write() = Some("Outer.Inner.foo".to_string());
        assert_eq!(common.qualname(), "Outer.Inner.foo");
    }
}
