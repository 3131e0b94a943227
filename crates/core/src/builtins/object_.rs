//! `object`: the root of every type's MRO (C3's base case) and the native
//! payload backing the handful of objects this core constructs directly
//! (chiefly `None`).
//!
//! Supplies `object`'s default `__repr__`/`__hash__`/`__init__`.
//! `object.__new__`'s general instantiation path and `__reduce__`/pickling
//! support belong to collaborators this crate doesn't own.

use crate::builtins::type_::PyType;
use crate::errors::{CoreError, PyResult};
use crate::exposer::{self, ClassExposition, ExtraSlots, NativeClassExposition, NativeContribution};
use crate::function::FuncArgs;
use crate::object::core::{PyObject, PyPayload};
use crate::registry::Representation;
use crate::types::slot::PyHash;
use crate::types::PyTypeSlots;
use crate::vm::{Context, VirtualMachine};

#[derive(Debug)]
pub struct PyBaseObject;

impl PyPayload for PyBaseObject {
    fn class(ctx: &Context) -> crate::builtins::type_::PyTypeRef {
        ctx.types.object_type.clone()
    }
}

impl NativeClassExposition for PyBaseObject {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

fn object_repr(obj: &PyObject, vm: &VirtualMachine) -> PyResult<String> {
    Ok(format!("<{} object at {:p}>", vm.type_name_of(obj), obj))
}

fn object_hash(obj: &PyObject, _vm: &VirtualMachine) -> PyResult<PyHash> {
    let addr = obj as *const PyObject as *const () as usize;
    Ok(pytype_common::hash::fix_sentinel(addr as PyHash))
}

fn object_init(_zelf: &PyObject, args: FuncArgs, _vm: &VirtualMachine) -> PyResult<()> {
    args.expect_arity(0).map_err(CoreError::into_pyexception)?;
    Ok(())
}

/// Finishes wiring `object` and `type`, which [`crate::factory::TypeFactory::bootstrap`]
/// only hand-built bare. Runs once, from [`Context::new`], after the six
/// descriptor types exist so [`exposer::populate_dict`] can build real
/// `PyMethodDescriptor`/`PyWrapperDescriptor` entries in `object`'s dict
/// instead of a bare placeholder.
pub fn init(ctx: &Context) {
    let object_key = std::any::TypeId::of::<PyBaseObject>();
    let exposition = PyBaseObject::expose();
    let extra = ExtraSlots {
        repr: Some(object_repr),
        str: None,
        hash: Some(object_hash),
        init: Some(object_init),
        new: None,
    };
    let slots = exposer::populate_representation(&ctx.types.object_type, &exposition, &extra);
    exposer::populate_dict(
        ctx,
        &ctx.types.object_type,
        &[NativeContribution {
            native_class: object_key,
            exposition: &exposition,
            has_init: extra.init.is_some(),
            new: extra.new,
        }],
    );
    ctx.registry
        .register_all(vec![Representation::Simple {
            native_class: object_key,
            slots,
            type_ref: ctx.types.object_type.clone(),
        }])
        .expect("object registers exactly once, during bootstrap");

    let type_key = std::any::TypeId::of::<PyType>();
    ctx.registry
        .register_all(vec![Representation::Simple {
            native_class: type_key,
            slots: PyTypeSlots::new("type"),
            type_ref: ctx.types.type_type.clone(),
        }])
        .expect("type registers exactly once, during bootstrap");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_repr_reports_its_own_type_name() {
        let vm = VirtualMachine::new();
        let text = vm.repr(&vm.ctx.none).unwrap();
        assert!(text.starts_with("<object object at"));
    }

    #[test]
    fn object_init_rejects_extra_arguments() {
        let vm = VirtualMachine::new();
        let err = object_init(&vm.ctx.none, FuncArgs::new(vec![vm.none()]), &vm).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::TypeError);
    }

    #[test]
    fn str_falls_back_to_repr_since_object_never_sets_a_str_slot() {
        let vm = VirtualMachine::new();
        assert_eq!(vm.str(&vm.ctx.none).unwrap(), vm.repr(&vm.ctx.none).unwrap());
    }
}
