//! `MethodDescriptor`: a native method exposed in a type's dict, and its
//! bound form `PyBoundMethod`, including the `__new__` special case.
//!
//! Non-data descriptor: only `__get__` is registered.

use crate::builtins::type_::{PyType, PyTypeRef};
use crate::errors::PyException;
use crate::function::{FuncArgs, PyMethodFlags};
use crate::object::core::{PyObject, PyObjectDyn, PyObjectRef, PyPayload, PyRef};
use crate::registry::NativeClassKey;
use crate::types::slot::NewFunc;
use crate::vm::VirtualMachine;

use super::DescriptorCommon;

pub type NativeMethodFunc = crate::function::method::NativeMethodFunc;

/// The implementation registered for one self-class: the exposer pairs
/// each implementation with each self-class of the owning type. A simple
/// (non-adoptive) type has exactly one entry.
pub struct MethodEntry {
    pub native_class: NativeClassKey,
    pub func: NativeMethodFunc,
}

/// The two native calling conventions a `MethodDescriptor` can wrap.
/// `__new__` receives the class to instantiate rather than a bound
/// instance, so it cannot share `Instance`'s per-self-class table shape.
pub enum MethodFunc {
    Instance {
        name: &'static str,
        doc: Option<&'static str>,
        flags: PyMethodFlags,
        per_class: Vec<MethodEntry>,
    },
    New { name: &'static str, doc: Option<&'static str>, func: NewFunc },
}

impl MethodFunc {
    pub fn name(&self) -> &'static str {
        match self {
            MethodFunc::Instance { name, .. } => name,
            MethodFunc::New { name, .. } => name,
        }
    }

    pub fn doc(&self) -> Option<&'static str> {
        match self {
            MethodFunc::Instance { doc, .. } => *doc,
            MethodFunc::New { doc, .. } => *doc,
        }
    }

    /// Selects the implementation registered for `obj`'s actual native
    /// class, falling back to the sole entry for a non-adoptive type, the
    /// same selection rule `PyGetSetDescriptor`/`PyWrapperDescriptor` use.
    fn select(per_class: &[MethodEntry], obj: &PyObject) -> Option<NativeMethodFunc> {
        let key = obj.payload_type_id();
        per_class
            .iter()
            .find(|e| e.native_class == key)
            .or_else(|| if per_class.len() == 1 { per_class.first() } else { None })
            .map(|e| e.func)
    }
}

pub struct PyMethodDescriptor {
    pub common: DescriptorCommon,
    pub method: MethodFunc,
}

impl PyPayload for PyMethodDescriptor {
    fn class(ctx: &crate::vm::Context) -> PyTypeRef {
        ctx.types.method_descriptor.clone()
    }
}

impl PyMethodDescriptor {
    pub fn new(common: DescriptorCommon, method: MethodFunc) -> Self {
        Self { common, method }
    }

    /// `descr.__get__(obj, owner)`: `obj is None` (class access) returns
    /// the descriptor itself; otherwise produces a bound method.
    pub fn descr_get(
        self_obj: PyObjectRef,
        obj: Option<PyObjectRef>,
        _owner: Option<PyTypeRef>,
        vm: &VirtualMachine,
    ) -> Result<PyObjectRef, PyException> {
        let Some(obj) = obj else {
            return Ok(self_obj);
        };
        let descr = crate::object::core::downcast_ref::<PyMethodDescriptor>(&self_obj)
            .expect("descr_get invoked on non-MethodDescriptor");
        if !vm.is_instance(&obj, &descr.common.objclass) {
            return Err(PyException::type_error(format!(
                "descriptor '{}' for '{}' objects doesn't apply to a '{}' object",
                descr.common.name,
                descr.common.objclass.name(),
                vm.type_name_of(&obj),
            )));
        }
        let bound = PyBoundMethod {
            descr: self_obj.clone(),
            obj,
        };
        let class = PyBoundMethod::class(&vm.ctx);
        Ok(PyRef::new_ref(bound, class, None).into())
    }

    /// `MethodDescriptor.__call__(self_or_cls, *rest)`: calling the
    /// unbound descriptor is equivalent to binding then calling.
    pub fn call(&self, mut args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        match &self.method {
            MethodFunc::Instance { per_class, .. } => {
                let zelf = args.take_one().map_err(crate::errors::CoreError::into_pyexception)?;
                if !vm.is_instance(&zelf, &self.common.objclass) {
                    return Err(PyException::type_error(format!(
                        "descriptor '{}' requires a '{}' object but received a '{}'",
                        self.common.name,
                        self.common.objclass.name(),
                        vm.type_name_of(&zelf),
                    )));
                }
                let func = MethodFunc::select(per_class, &zelf).ok_or_else(|| {
                    PyException::type_error(format!(
                        "descriptor '{}' has no implementation for a '{}' object",
                        self.common.name,
                        vm.type_name_of(&zelf),
                    ))
                })?;
                func(&zelf, args, vm)
            }
            MethodFunc::New { func, .. } => {
                let cls_obj = args.take_one().map_err(crate::errors::CoreError::into_pyexception)?;
                let cls = crate::object::core::downcast::<PyType>(cls_obj)
                    .map_err(|_| PyException::type_error("__new__'s first argument must be a type"))?;
                func(cls, args, vm)
            }
        }
    }

    /// Slot-table compatible wrapper matching [`crate::types::slot::CallFunc`].
    pub fn call_slot(self_obj: &crate::object::core::PyObject, args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let descr = crate::object::core::downcast_ref::<PyMethodDescriptor>(self_obj)
            .expect("call_slot invoked on non-MethodDescriptor");
        descr.call(args, vm)
    }
}

/// A native method bound to a specific instance, producing a bound
/// callable.
pub struct PyBoundMethod {
    pub descr: PyObjectRef,
    pub obj: PyObjectRef,
}

impl PyPayload for PyBoundMethod {
    fn class(ctx: &crate::vm::Context) -> PyTypeRef {
        ctx.types.bound_method.clone()
    }
}

impl PyBoundMethod {
    pub fn call(&self, args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let descr = crate::object::core::downcast_ref::<PyMethodDescriptor>(&self.descr)
            .expect("PyBoundMethod.descr is always a MethodDescriptor");
        match &descr.method {
            MethodFunc::Instance { per_class, .. } => {
                let func = MethodFunc::select(per_class, &self.obj).ok_or_else(|| {
                    PyException::type_error(format!(
                        "descriptor '{}' has no implementation for a '{}' object",
                        descr.common.name,
                        vm.type_name_of(&self.obj),
                    ))
                })?;
                func(&self.obj, args, vm)
            }
            MethodFunc::New { .. } => Err(PyException::type_error(
                "__new__ cannot be called through a bound instance",
            )),
        }
    }

    /// Slot-table compatible wrapper matching [`crate::types::slot::CallFunc`].
    pub fn call_slot(self_obj: &crate::object::core::PyObject, args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let bound = crate::object::core::downcast_ref::<PyBoundMethod>(self_obj)
            .expect("call_slot invoked on non-PyBoundMethod");
        bound.call(args, vm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::object_::PyBaseObject;

    fn echo(_zelf: &crate::object::core::PyObject, _args: FuncArgs, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        Ok(vm.none())
    }

    fn descriptor(vm: &VirtualMachine) -> PyMethodDescriptor {
        let name = vm.ctx.intern_str("echo");
        PyMethodDescriptor::new(
            DescriptorCommon::new(vm.ctx.types.object_type.clone(), name, None),
            MethodFunc::Instance {
                name: "echo",
                doc: None,
                flags: crate::function::PyMethodFlags::DEFAULT,
                per_class: vec![MethodEntry {
                    native_class: std::any::TypeId::of::<PyBaseObject>(),
                    func: echo,
                }],
            },
        )
    }

    #[test]
    fn class_access_returns_the_descriptor_itself() {
        let vm = VirtualMachine::new();
        let descr = descriptor(&vm);
        let class = PyMethodDescriptor::class(&vm.ctx);
        let descr_obj: PyObjectRef = PyRef::new_ref(descr, class, None).into();
        let result = PyMethodDescriptor::descr_get(descr_obj.clone(), None, None, &vm).unwrap();
        assert!(std::sync::Arc::ptr_eq(&result, &descr_obj));
    }

    #[test]
    fn instance_access_produces_a_bound_method_that_calls_through() {
        let vm = VirtualMachine::new();
        let descr = descriptor(&vm);
        let class = PyMethodDescriptor::class(&vm.ctx);
        let descr_obj: PyObjectRef = PyRef::new_ref(descr, class, None).into();
        let instance = vm.none();
        let bound = PyMethodDescriptor::descr_get(descr_obj, Some(instance), None, &vm).unwrap();
        let bound_descr = crate::object::core::downcast_ref::<PyBoundMethod>(&bound).unwrap();
        let result = bound_descr.call(FuncArgs::new(vec![]), &vm).unwrap();
        assert!(std::sync::Arc::ptr_eq(&result, &vm.none()));
    }

    #[test]
    fn new_calling_convention_rejects_a_non_type_first_argument() {
        let vm = VirtualMachine::new();
        let name = vm.ctx.intern_str("__new__");
        let descr = PyMethodDescriptor::new(
            DescriptorCommon::new(vm.ctx.types.object_type.clone(), name, None),
            MethodFunc::New {
                name: "__new__",
                doc: None,
                func: |cls, _args, _vm| Ok(PyRef::new_ref(PyBaseObject, cls, None).into()),
            },
        );
        let not_a_type = vm.none();
        let err = descr.call(FuncArgs::new(vec![not_a_type]), &vm).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::TypeError);
    }
}
