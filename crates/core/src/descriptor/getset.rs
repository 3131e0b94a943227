//! `GetSetDescriptor`: a computed attribute backed by native
//! getter/setter/deleter functions, with one function triple per
//! self-class for adoptive types.
//!
//! Like `MemberDescriptor`, this is always a data descriptor: even a
//! getter-only `GetSetDescriptor` fills the `__set__` slot on its own
//! native class, the underlying call just always raises.

use crate::builtins::type_::PyTypeRef;
use crate::errors::PyException;
use crate::function::PySetterValue;
use crate::object::core::{PyObject, PyObjectDyn, PyObjectRef, PyPayload};
use crate::registry::NativeClassKey;
use crate::vm::VirtualMachine;

use super::DescriptorCommon;

pub type GetterFunc = fn(&PyObject, &VirtualMachine) -> Result<PyObjectRef, PyException>;
pub type SetterFunc = fn(&PyObject, PyObjectRef, &VirtualMachine) -> Result<(), PyException>;
pub type DeleterFunc = fn(&PyObject, &VirtualMachine) -> Result<(), PyException>;

/// The accessor triple registered for one self-class. A simple
/// (non-adoptive) type has exactly one entry.
pub struct GetSetEntry {
    pub native_class: NativeClassKey,
    pub getter: Option<GetterFunc>,
    pub setter: Option<SetterFunc>,
    pub deleter: Option<DeleterFunc>,
}

pub struct PyGetSetDescriptor {
    pub common: DescriptorCommon,
    per_class: Vec<GetSetEntry>,
}

impl PyPayload for PyGetSetDescriptor {
    fn class(ctx: &crate::vm::Context) -> PyTypeRef {
        ctx.types.getset_descriptor.clone()
    }
}

impl PyGetSetDescriptor {
    pub fn new(common: DescriptorCommon, per_class: Vec<GetSetEntry>) -> Self {
        Self { common, per_class }
    }

    /// Selects the entry registered for `obj`'s actual native class: exact
    /// self-class match, falling back to the sole entry for a simple type.
    fn select(&self, obj: &PyObject) -> Option<&GetSetEntry> {
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
    }

    fn no_entry_error(&self, obj: &PyObject, vm: &VirtualMachine) -> PyException {
        PyException::type_error(format!(
            "descriptor '{}' for '{}' objects doesn't apply to a '{}' object",
            self.common.name,
            self.common.objclass.name(),
            vm.type_name_of(obj),
        ))
    }

    pub fn get(&self, obj: &PyObject, vm: &VirtualMachine) -> Result<PyObjectRef, PyException> {
        let entry = self.select(obj).ok_or_else(|| self.no_entry_error(obj, vm))?;
        match entry.getter {
            Some(getter) => getter(obj, vm),
            None => Err(PyException::attribute_error(format!(
                "unreadable attribute '{}'",
                self.common.name
            ))),
        }
    }

    pub fn set(&self, obj: &PyObject, value: PySetterValue, vm: &VirtualMachine) -> Result<(), PyException> {
        let entry = self.select(obj).ok_or_else(|| self.no_entry_error(obj, vm))?;
        match value {
            PySetterValue::Assign(value) => match entry.setter {
                Some(setter) => setter(obj, value, vm),
                None => Err(PyException::attribute_error(format!(
                    "attribute '{}' of '{}' objects is read-only",
                    self.common.name,
                    self.common.objclass.name()
                ))),
            },
            PySetterValue::Delete => match entry.deleter {
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
        let descr = crate::object::core::downcast_ref::<PyGetSetDescriptor>(&self_obj)
            .expect("descr_get invoked on non-GetSetDescriptor");
        descr.get(&obj, vm)
    }

    /// Slot-table compatible wrapper matching [`crate::types::slot::DescrSetFunc`].
    pub fn descr_set(
        self_obj: &PyObject,
        obj: PyObjectRef,
        value: PySetterValue,
        vm: &VirtualMachine,
    ) -> Result<(), PyException> {
        let descr = crate::object::core::downcast_ref::<PyGetSetDescriptor>(self_obj)
            .expect("descr_set invoked on non-GetSetDescriptor");
        descr.set(&obj, value, vm)
    }
}
