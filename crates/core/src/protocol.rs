//! The attribute and call protocol: `getattribute`/`setattr`/
//! `delattr`/`call`, plus the `repr`/`str`/`hash` entry points the rest
//! of the crate reaches through [`crate::vm::VirtualMachine`].
//!
//! `getattribute` follows the textbook CPython shape: a data descriptor
//! found on the type wins over the instance dict, which wins over a
//! non-data descriptor or plain class attribute.
//!
//! `__getattr__`'s fallback-on-miss hook is not implemented: invoking it
//! needs to pass the attribute name as a Python `str` object, and `str`
//! is an explicit external collaborator this core never constructs. A
//! miss simply raises `AttributeError`.

use crate::errors::{PyException, PyResult};
use crate::function::FuncArgs;
use crate::object::core::{PyObject, PyObjectDyn, PyObjectRef};
use crate::function::PySetterValue;
use crate::intern::PyStrInterned;
use crate::types::slot::{IterNextOutcome, PyHash, SlotFunc};
use crate::types::SpecialMethod;
use crate::vm::VirtualMachine;

fn descr_get_slot(attr: &PyObjectRef, vm: &VirtualMachine) -> Option<SlotFunc> {
    let key = attr.payload_type_id();
    vm.ctx
        .registry
        .with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::DescrGet)))
}

fn is_data_descriptor(attr: &PyObjectRef, vm: &VirtualMachine) -> bool {
    let key = attr.payload_type_id();
    vm.ctx.registry.with(key, |rep| rep.map(|r| r.is_data_descriptor()).unwrap_or(false))
}

/// `obj.name`: a data descriptor found on
/// `type(obj)` wins outright; otherwise the instance dict wins; otherwise
/// a non-data descriptor (or plain value) found on the type is returned,
/// bound if it is a descriptor.
pub fn getattribute(obj: &PyObjectRef, name: &'static PyStrInterned, vm: &VirtualMachine) -> PyResult {
    let typ = vm.type_of(obj);
    let type_attr = typ.lookup(name);

    if let Some(attr) = &type_attr {
        if is_data_descriptor(attr, vm) {
            if let Some(SlotFunc::DescrGet(f)) = descr_get_slot(attr, vm) {
                return f(attr.clone(), Some(obj.clone()), Some(typ.clone()), vm);
            }
        }
    }

    if let Some(dict) = obj.dict_of() {
        if let Some(value) = dict.get(name) {
            return Ok(value);
        }
    }

    if let Some(attr) = type_attr {
        if let Some(SlotFunc::DescrGet(f)) = descr_get_slot(&attr, vm) {
            return f(attr, Some(obj.clone()), Some(typ), vm);
        }
        return Ok(attr);
    }

    Err(vm.new_no_attribute_error(obj, name.as_str()))
}

/// `obj.name = value`: a data descriptor on `type(obj)`
/// handles the assignment; otherwise it lands in the instance dict, if
/// any.
pub fn setattr(obj: &PyObjectRef, name: &'static PyStrInterned, value: PyObjectRef, vm: &VirtualMachine) -> PyResult<()> {
    let typ = vm.type_of(obj);
    if let Some(attr) = typ.lookup(name) {
        let key = attr.payload_type_id();
        let set_slot = vm.ctx.registry.with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::DescrSet)));
        if let Some(SlotFunc::DescrSet(f)) = set_slot {
            return f(&attr, obj.clone(), PySetterValue::Assign(value), vm);
        }
    }
    if let Some(dict) = obj.dict_of() {
        dict.set(name, value);
        return Ok(());
    }
    Err(PyException::attribute_error(format!(
        "'{}' object has no attribute '{}'",
        vm.type_name_of(obj),
        name.as_str()
    )))
}

/// `del obj.name`, the same dispatch as [`setattr`] with
/// [`PySetterValue::Delete`].
pub fn delattr(obj: &PyObjectRef, name: &'static PyStrInterned, vm: &VirtualMachine) -> PyResult<()> {
    let typ = vm.type_of(obj);
    if let Some(attr) = typ.lookup(name) {
        let key = attr.payload_type_id();
        let set_slot = vm.ctx.registry.with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::DescrSet)));
        if let Some(SlotFunc::DescrSet(f)) = set_slot {
            return f(&attr, obj.clone(), PySetterValue::Delete, vm);
        }
    }
    if let Some(dict) = obj.dict_of() {
        if dict.del(name) {
            return Ok(());
        }
    }
    Err(PyException::attribute_error(format!(
        "'{}' object has no attribute '{}'",
        vm.type_name_of(obj),
        name.as_str()
    )))
}

/// `obj.__class__ = new_type`: valid only between `Replaceable` types
/// sharing the same `SharedRepresentation`; swaps the instance's own class pointer
/// rather than touching the registry, since [`crate::registry::Representation::Shared`]
/// reads an instance's type back off the instance itself.
pub fn set_class(obj: &PyObjectRef, new_type: crate::builtins::type_::PyTypeRef, vm: &VirtualMachine) -> PyResult<()> {
    let current = vm.type_of(obj);
    crate::builtins::type_::PyType::check_class_assignment(&current, &new_type)?;
    obj.set_class_of(new_type);
    Ok(())
}

/// `obj(*args, **kwargs)`: dispatches through `obj`'s own native class's
/// `Call` slot.
pub fn call(obj: &PyObjectRef, args: FuncArgs, vm: &VirtualMachine) -> PyResult {
    let key = obj.payload_type_id();
    let slot = vm.ctx.registry.with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::Call)));
    match slot {
        Some(SlotFunc::Call(f)) => f(obj, args, vm),
        _ => Err(PyException::type_error(format!("'{}' object is not callable", vm.type_name_of(obj)))),
    }
}

/// `repr(obj)`: the `Repr` slot if filled, else CPython's generic
/// `<Name object at 0x...>` fallback.
pub fn repr(obj: &PyObject, vm: &VirtualMachine) -> PyResult<String> {
    let key = obj.payload_type_id();
    let slot = vm.ctx.registry.with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::Repr)));
    match slot {
        Some(SlotFunc::Repr(f)) => f(obj, vm),
        _ => Ok(format!("<{} object at {:p}>", vm.type_name_of(obj), obj)),
    }
}

/// `str(obj)`: the `Str` slot if filled, else falls back to [`repr`]
/// (CPython's own default `object.__str__`).
pub fn str(obj: &PyObject, vm: &VirtualMachine) -> PyResult<String> {
    let key = obj.payload_type_id();
    let slot = vm.ctx.registry.with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::Str)));
    match slot {
        Some(SlotFunc::Str(f)) => f(obj, vm),
        _ => repr(obj, vm),
    }
}

/// `hash(obj)`: the `Hash` slot if filled, else identity hash on the
/// object's address (CPython's default `object.__hash__`).
pub fn hash(obj: &PyObject, vm: &VirtualMachine) -> PyResult<PyHash> {
    let key = obj.payload_type_id();
    let slot = vm.ctx.registry.with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::Hash)));
    match slot {
        Some(SlotFunc::Hash(f)) => f(obj, vm),
        _ => {
            let addr = obj as *const PyObject as *const () as usize;
            Ok(pytype_common::hash::fix_sentinel(addr as PyHash))
        }
    }
}

/// `iter(obj)`: dispatches the `Iter` slot.
/// The data model's documented fallback — `__iter__` absent, iterate via
/// repeated `__getitem__(0)`, `__getitem__(1)`, … until `IndexError` — is
/// not implemented here: building the successive integer keys needs `int`,
/// an external collaborator, so a type without `__iter__`
/// simply reports non-iterable.
pub fn iter(obj: PyObjectRef, vm: &VirtualMachine) -> PyResult {
    let key = obj.payload_type_id();
    let slot = vm
        .ctx
        .registry
        .with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::Iter)));
    match slot {
        Some(SlotFunc::Iter(f)) => f(obj, vm),
        _ => Err(PyException::type_error(format!(
            "'{}' object is not iterable",
            vm.type_name_of(&obj)
        ))),
    }
}

/// `next(iterator)`: dispatches the `IterNext` slot, translating the
/// `Exhausted` outcome into `StopIteration` — an expected condition, not
/// logged as an error.
pub fn next(iterator: &PyObjectRef, vm: &VirtualMachine) -> PyResult {
    let key = iterator.payload_type_id();
    let slot = vm
        .ctx
        .registry
        .with(key, |rep| rep.and_then(|r| r.slots().get(SpecialMethod::IterNext)));
    match slot {
        Some(SlotFunc::IterNext(f)) => match f(iterator, vm)? {
            IterNextOutcome::Value(value) => Ok(value),
            IterNextOutcome::Exhausted => Err(vm.stop_iteration()),
        },
        _ => Err(PyException::type_error(format!(
            "'{}' object is not an iterator",
            vm.type_name_of(iterator)
        ))),
    }
}

/// `id(obj)`: the object's address, the same
/// identity CPython's default `object.__hash__` (see [`hash`] above) is
/// derived from.
pub fn id(obj: &PyObject) -> usize {
    obj as *const PyObject as *const () as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::VirtualMachine;

    #[test]
    fn repr_falls_back_to_default_format() {
        let vm = VirtualMachine::new();
        let text = repr(&*vm.ctx.none, &vm).unwrap();
        assert!(text.starts_with("<object object at"));
    }

    #[test]
    fn hash_is_stable_for_the_same_object() {
        let vm = VirtualMachine::new();
        let a = hash(&*vm.ctx.none, &vm).unwrap();
        let b = hash(&*vm.ctx.none, &vm).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn calling_a_non_callable_is_a_type_error() {
        let vm = VirtualMachine::new();
        let err = call(&vm.ctx.none, FuncArgs::new(vec![]), &vm).unwrap_err();
        assert!(err.message.contains("not callable"));
    }

    #[test]
    fn iterating_a_non_iterable_is_a_type_error() {
        let vm = VirtualMachine::new();
        let err = iter(vm.none(), &vm).unwrap_err();
        assert!(err.message.contains("not iterable"));
    }

    #[test]
    fn calling_next_on_a_non_iterator_is_a_type_error() {
        let vm = VirtualMachine::new();
        let err = next(&vm.none(), &vm).unwrap_err();
        assert!(err.message.contains("not an iterator"));
    }

    #[test]
    fn id_is_stable_and_distinguishes_distinct_objects() {
        let vm = VirtualMachine::new();
        assert_eq!(id(&vm.ctx.none), id(&vm.ctx.none));
        let other: PyObjectRef =
            crate::object::PyRef::new_ref(crate::builtins::object_::PyBaseObject, vm.ctx.types.object_type.clone(), None)
                .into();
        assert_ne!(id(&vm.ctx.none), id(&other));
    }
}
