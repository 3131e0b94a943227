//! `MemberDescriptor`: a typed native field exposed as an instance
//! attribute.
//!
//! There's no struct-offset machinery to poke at here (no `#[repr(C)]`
//! payload layout is assumed anywhere else), so every member is wired up
//! through a plain getter/setter closure pair the exposer captured when it
//! introspected the native field, rather than a raw-offset descriptor.
//!
//! Like CPython's own `member_descriptor`, a `MemberDescriptor` is
//! *always* a data descriptor: a read-only member still fills the
//! `__set__` slot, it just has the set function raise `AttributeError` at
//! call time rather than omitting the slot entirely.

use crate::builtins::type_::PyTypeRef;
use crate::errors::PyException;
use crate::function::PySetterValue;
use crate::object::core::{PyObject, PyObjectRef, PyPayload};
use crate::vm::VirtualMachine;

use super::DescriptorCommon;

/// What kind of native field this member exposes, purely for error
/// messages ("can't delete numeric attribute", "attribute must be str").
/// Actual coercion between the native representation and `PyObjectRef`
/// happens inside the getter/setter closures themselves — those closures
/// are written against whatever concrete types the native class uses, so
/// this core never needs to know about `int`/`str`/`float` to define the
/// member protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Bool,
    Int,
    Float,
    Str,
    /// A nullable reference field (`Option<PyObjectRef>` in the native
    /// struct); absence surfaces as `AttributeError`, not `None`.
    Optional,
    /// A non-nullable reference field; always present once the instance
    /// exists.
    Reference,
}

pub type MemberGetterFunc = fn(&PyObject, &VirtualMachine) -> PyObjectRef;
pub type MemberOptGetterFunc = fn(&PyObject, &VirtualMachine) -> Option<PyObjectRef>;
pub type MemberSetterFunc = fn(&PyObject, PyObjectRef, &VirtualMachine) -> Result<(), PyException>;
pub type MemberDeleterFunc = fn(&PyObject, &VirtualMachine) -> Result<(), PyException>;

/// The native accessors backing one member. Exactly one of
/// [`MemberGetterFunc`]/[`MemberOptGetterFunc`] is populated depending on
/// `kind`.
pub struct PyMemberDef {
    pub name: &'static str,
    pub kind: MemberKind,
    pub doc: Option<&'static str>,
    pub getter: MemberGetterFunc,
    pub opt_getter: Option<MemberOptGetterFunc>,
    pub setter: Option<MemberSetterFunc>,
    pub deleter: Option<MemberDeleterFunc>,
}

impl PyMemberDef {
    /// A plain read/write member backed by a fixed getter/setter pair.
    pub fn new(name: &'static str, kind: MemberKind, getter: MemberGetterFunc) -> Self {
        Self {
            name,
            kind,
            doc: None,
            getter,
            opt_getter: None,
            setter: None,
            deleter: None,
        }
    }

    pub fn with_setter(mut self, setter: MemberSetterFunc) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn with_deleter(mut self, deleter: MemberDeleterFunc) -> Self {
        self.deleter = Some(deleter);
        self
    }

    pub fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    /// A nullable-reference member, whose getter reports absence rather
    /// than always returning something.
    pub fn optional(name: &'static str, opt_getter: MemberOptGetterFunc) -> Self {
        Self {
            name,
            kind: MemberKind::Optional,
            doc: None,
            getter: |_zelf, _vm| unreachable!("optional members read through opt_getter"),
            opt_getter: Some(opt_getter),
            setter: None,
            deleter: None,
        }
    }
}

pub struct PyMemberDescriptor {
    pub common: DescriptorCommon,
    pub def: PyMemberDef,
}

impl PyPayload for PyMemberDescriptor {
    fn class(ctx: &crate::vm::Context) -> PyTypeRef {
        ctx.types.member_descriptor.clone()
    }
}

impl PyMemberDescriptor {
    pub fn new(common: DescriptorCommon, def: PyMemberDef) -> Self {
        Self { common, def }
    }

    pub fn get(&self, obj: &PyObject, _vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        match self.def.opt_getter {
            Some(opt_getter) => opt_getter(obj, _vm).ok_or_else(|| {
                PyException::attribute_error(format!(
                    "'{}' object has no attribute '{}'",
                    _vm.type_name_of(obj),
                    self.common.name
                ))
            }),
            None => Ok((self.def.getter)(obj, _vm)),
        }
    }

    pub fn set(&self, obj: &PyObject, value: PySetterValue, vm: &VirtualMachine) -> Result<(), PyException> {
        match value {
            PySetterValue::Assign(value) => match self.def.setter {
                Some(setter) => setter(obj, value, vm),
                None => Err(PyException::attribute_error(format!(
                    "attribute '{}' of '{}' objects is not writable",
                    self.common.name,
                    self.common.objclass.name()
                ))),
            },
            PySetterValue::Delete => match self.def.deleter {
                Some(deleter) => deleter(obj, vm),
                None => Err(PyException::attribute_error(format!(
                    "can't delete attribute '{}' of '{}' objects",
                    self.common.name,
                    self.common.objclass.name()
                ))),
            },
        }
    }

    /// Slot-table compatible wrapper matching [`crate::types::slot::DescrGetFunc`].
    pub fn descr_get(
        self_obj: PyObjectRef,
        obj: Option<PyObjectRef>,
        _owner: Option<PyTypeRef>,
        vm: &VirtualMachine,
    ) -> Result<PyObjectRef, PyException> {
        let Some(obj) = obj else {
            return Ok(self_obj);
        };
        let descr = crate::object::core::downcast_ref::<PyMemberDescriptor>(&self_obj)
            .expect("descr_get invoked on non-MemberDescriptor");
        descr.get(&obj, vm)
    }

    /// Slot-table compatible wrapper matching [`crate::types::slot::DescrSetFunc`].
    pub fn descr_set(
        self_obj: &PyObject,
        obj: PyObjectRef,
        value: PySetterValue,
        vm: &VirtualMachine,
    ) -> Result<(), PyException> {
        let descr = crate::object::core::downcast_ref::<PyMemberDescriptor>(self_obj)
            .expect("descr_set invoked on non-MemberDescriptor");
        descr.set(&obj, value, vm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_kind_is_copy_eq() {
        assert_eq!(MemberKind::Int, MemberKind::Int);
        assert_ne!(MemberKind::Int, MemberKind::Str);
    }
}
