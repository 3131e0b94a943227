//! Convenience methods layered onto [`PyObjectRef`], so call sites can
//! write `obj.get_attr(name, vm)` instead of `vm.get_attr(&obj, name)`.
//!
//! Hangs ergonomic, call-site-facing methods (`downcast`, `try_downcast`,
//! `downcast_exact`) directly off the reference type rather than only off
//! `VirtualMachine`.

use super::core::{downcast, downcast_ref, PyObjectRef, PyPayload, PyRef};
use crate::errors::PyResult;
use crate::intern::PyStrInterned;
use crate::vm::VirtualMachine;

pub trait PyObjectExt {
    fn get_attr(&self, name: &'static PyStrInterned, vm: &VirtualMachine) -> PyResult;
    fn set_attr(&self, name: &'static PyStrInterned, value: PyObjectRef, vm: &VirtualMachine) -> PyResult<()>;
    fn del_attr(&self, name: &'static PyStrInterned, vm: &VirtualMachine) -> PyResult<()>;
    fn py_repr(&self, vm: &VirtualMachine) -> PyResult<String>;
    fn py_str(&self, vm: &VirtualMachine) -> PyResult<String>;
    fn is_instance_of(&self, cls: &crate::builtins::type_::PyTypeRef, vm: &VirtualMachine) -> bool;
    fn downcast_payload<T: PyPayload>(self) -> Result<PyRef<T>, PyObjectRef>;
    fn payload_ref<T: PyPayload>(&self) -> Option<&T>;
}

impl PyObjectExt for PyObjectRef {
    fn get_attr(&self, name: &'static PyStrInterned, vm: &VirtualMachine) -> PyResult {
        vm.get_attr(self, name)
    }

    fn set_attr(&self, name: &'static PyStrInterned, value: PyObjectRef, vm: &VirtualMachine) -> PyResult<()> {
        vm.set_attr(self, name, value)
    }

    fn del_attr(&self, name: &'static PyStrInterned, vm: &VirtualMachine) -> PyResult<()> {
        vm.del_attr(self, name)
    }

    fn py_repr(&self, vm: &VirtualMachine) -> PyResult<String> {
        vm.repr(self)
    }

    fn py_str(&self, vm: &VirtualMachine) -> PyResult<String> {
        vm.str(self)
    }

    fn is_instance_of(&self, cls: &crate::builtins::type_::PyTypeRef, vm: &VirtualMachine) -> bool {
        vm.is_instance(self, cls)
    }

    fn downcast_payload<T: PyPayload>(self) -> Result<PyRef<T>, PyObjectRef> {
        downcast::<T>(self)
    }

    fn payload_ref<T: PyPayload>(&self) -> Option<&T> {
        downcast_ref::<T>(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::VirtualMachine;

    #[test]
    fn repr_round_trips_through_the_extension_trait() {
        let vm = VirtualMachine::new();
        let text = vm.ctx.none.py_repr(&vm).unwrap();
        assert!(text.contains("object"));
    }

    #[test]
    fn payload_ref_recovers_the_concrete_type() {
        let vm = VirtualMachine::new();
        assert!(vm.ctx.none.payload_ref::<crate::builtins::object_::PyBaseObject>().is_some());
    }
}
