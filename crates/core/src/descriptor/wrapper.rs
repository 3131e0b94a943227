//! `WrapperDescriptor`: the unbound view of a special method installed
//! through a type's slot table, and `PyMethodWrapper`, its per-instance
//! bound form.
//!
//! `__get__` binds an instance into a `PyMethodWrapper`, whose call
//! operator marshals the call arguments through the wrapped `SlotFunc`.
//! Non-data descriptor: only `__get__` is ever registered on this type's
//! own representation.

use crate::builtins::type_::PyTypeRef;
use crate::errors::{CoreError, PyException};
use crate::function::FuncArgs;
use crate::object::core::{PyObject, PyObjectDyn, PyObjectRef, PyPayload};
use crate::registry::NativeClassKey;
use crate::types::slot::SlotFunc;
use crate::types::SpecialMethod;
use crate::vm::VirtualMachine;

use super::DescriptorCommon;

pub struct WrapperEntry {
    pub native_class: NativeClassKey,
    pub func: SlotFunc,
}

pub struct PyWrapperDescriptor {
    pub common: DescriptorCommon,
    pub special: SpecialMethod,
    per_class: Vec<WrapperEntry>,
}

impl PyPayload for PyWrapperDescriptor {
    fn class(ctx: &crate::vm::Context) -> PyTypeRef {
        ctx.types.wrapper_descriptor.clone()
    }
}

impl PyWrapperDescriptor {
    pub fn new(common: DescriptorCommon, special: SpecialMethod, per_class: Vec<WrapperEntry>) -> Self {
        Self {
            common,
            special,
            per_class,
        }
    }

    fn select(&self, obj: &PyObject) -> Option<SlotFunc> {
        let key = obj.payload_type_id();
        self.per_class
            .iter()
            .find(|e| e.native_class == key)
            .or_else(|| {
                if self.per_class.len() == 1 {
                    self.per_class.first()
                } else {
                    None
                }
            })
            .map(|e| e.func)
    }

    /// `descr.__get__(obj, owner)`: binds `obj` into a callable
    /// [`PyMethodWrapper`], or returns the descriptor itself on class
    /// access (`obj is None`).
    pub fn descr_get(
        self_obj: PyObjectRef,
        obj: Option<PyObjectRef>,
        _owner: Option<PyTypeRef>,
        vm: &VirtualMachine,
    ) -> Result<PyObjectRef, PyException> {
        let Some(obj) = obj else {
            return Ok(self_obj);
        };
        let descr = crate::object::core::downcast_ref::<PyWrapperDescriptor>(&self_obj)
            .expect("descr_get invoked on non-WrapperDescriptor");
        if !vm.is_instance(&obj, &descr.common.objclass) {
            return Err(PyException::type_error(format!(
                "descriptor '{}' for '{}' objects doesn't apply to a '{}' object",
                descr.common.name,
                descr.common.objclass.name(),
                vm.type_name_of(&obj),
            )));
        }
        let bound = PyMethodWrapper {
            wrapper: self_obj.clone(),
            obj,
        };
        Ok(PyRefExt::new_obj(bound, vm))
    }

    /// `WrapperDescriptor.__call__(self, *rest)`: the unbound calling
    /// convention, equivalent to binding then calling.
    pub fn call(&self, mut args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let zelf = args.take_one().map_err(CoreError::into_pyexception)?;
        if !vm.is_instance(&zelf, &self.common.objclass) {
            return Err(PyException::type_error(format!(
                "descriptor '{}' requires a '{}' object but received a '{}'",
                self.common.name,
                self.common.objclass.name(),
                vm.type_name_of(&zelf),
            )));
        }
        let func = self.select(&zelf).ok_or_else(|| {
            PyException::type_error(format!(
                "descriptor '{}' has no implementation for a '{}' object",
                self.common.name,
                vm.type_name_of(&zelf),
            ))
        })?;
        func.call(&zelf, args, vm)
    }

    /// Slot-table compatible wrapper matching [`crate::types::slot::CallFunc`].
    pub fn call_slot(self_obj: &PyObject, args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let descr = crate::object::core::downcast_ref::<PyWrapperDescriptor>(self_obj)
            .expect("call_slot invoked on non-WrapperDescriptor");
        descr.call(args, vm)
    }
}

/// A special method bound to a specific instance: `__get__` binds an
/// instance, producing a bound callable.
pub struct PyMethodWrapper {
    pub wrapper: PyObjectRef,
    pub obj: PyObjectRef,
}

impl PyPayload for PyMethodWrapper {
    fn class(ctx: &crate::vm::Context) -> PyTypeRef {
        ctx.types.method_wrapper.clone()
    }
}

impl PyMethodWrapper {
    pub fn call(&self, args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let descr = crate::object::core::downcast_ref::<PyWrapperDescriptor>(&self.wrapper)
            .expect("PyMethodWrapper.wrapper is always a WrapperDescriptor");
        let func = descr.select(&self.obj).ok_or_else(|| {
            PyException::type_error(format!(
                "descriptor '{}' has no implementation for a '{}' object",
                descr.common.name,
                vm.type_name_of(&self.obj),
            ))
        })?;
        func.call(&self.obj, args, vm)
    }

    /// Slot-table compatible wrapper matching [`crate::types::slot::CallFunc`].
    pub fn call_slot(self_obj: &PyObject, args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let bound = crate::object::core::downcast_ref::<PyMethodWrapper>(self_obj)
            .expect("call_slot invoked on non-PyMethodWrapper");
        bound.call(args, vm)
    }
}

/// Tiny local helper so `descr_get` doesn't need to thread a `Context`
/// through just to build a ref; `new_obj` wraps a payload using the
/// caller's own `vm.ctx` the way every other builtin constructor does.
struct PyRefExt;
impl PyRefExt {
    fn new_obj<T: PyPayload>(payload: T, vm: &VirtualMachine) -> PyObjectRef {
        let class = T::class(&vm.ctx);
        crate::object::core::PyRef::new_ref(payload, class, None).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    fn always_none(_zelf: &PyObject, _args: FuncArgs, vm: &VirtualMachine) -> crate::errors::PyResult {
        Ok(vm.none())
    }

    fn descriptor(vm: &VirtualMachine) -> PyWrapperDescriptor {
        let name = vm.ctx.intern_str("__call__");
        PyWrapperDescriptor::new(
            DescriptorCommon::new(vm.ctx.types.object_type.clone(), name, None),
            SpecialMethod::Call,
            vec![WrapperEntry {
                native_class: TypeId::of::<crate::builtins::object_::PyBaseObject>(),
                func: SlotFunc::Call(always_none),
            }],
        )
    }

    #[test]
    fn class_access_returns_the_descriptor_itself() {
        let vm = VirtualMachine::new();
        let descr_obj = PyRefExt::new_obj(descriptor(&vm), &vm);
        let result = PyWrapperDescriptor::descr_get(descr_obj.clone(), None, None, &vm).unwrap();
        assert!(std::sync::Arc::ptr_eq(&result, &descr_obj));
    }

    #[test]
    fn instance_access_binds_and_calls_through() {
        let vm = VirtualMachine::new();
        let descr_obj = PyRefExt::new_obj(descriptor(&vm), &vm);
        let instance = vm.none();
        let bound = PyWrapperDescriptor::descr_get(descr_obj, Some(instance), None, &vm).unwrap();
        let wrapper = crate::object::core::downcast_ref::<PyMethodWrapper>(&bound).unwrap();
        let result = wrapper.call(FuncArgs::new(vec![]), &vm).unwrap();
        assert!(std::sync::Arc::ptr_eq(&result, &vm.none()));
    }

    #[test]
    fn unbound_call_rejects_an_instance_of_the_wrong_class() {
        let vm = VirtualMachine::new();
        let name = vm.ctx.intern_str("__call__");
        let descr = PyWrapperDescriptor::new(
            DescriptorCommon::new(vm.ctx.types.type_type.clone(), name, None),
            SpecialMethod::Call,
            vec![WrapperEntry {
                native_class: TypeId::of::<crate::builtins::type_::PyType>(),
                func: SlotFunc::Call(always_none),
            }],
        );
        let wrong_kind = vm.none();
        let err = descr.call(FuncArgs::new(vec![wrong_kind]), &vm).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::TypeError);
    }
}
