//! Hand-builds the six descriptor types themselves: `member_descriptor`,
//! `getset_descriptor`, `wrapper_descriptor`, `method_wrapper`,
//! `method_descriptor`, `bound_method`.
//!
//! These six can't be built by running the exposer over themselves:
//! the exposer builds `PyMethodDescriptor`/`PyGetSetDescriptor` instances
//! to populate *other* types' dicts, so it can't also be the thing that
//! builds the descriptor types' own dicts without a dependency cycle.
//! Each type's slot table is therefore assembled directly rather than
//! through [`crate::exposer::populate_representation`]/[`crate::exposer::populate_dict`].

use std::any::TypeId;

use crate::builtins::type_::{PyType, PyTypeRef, TypeVariant};
use crate::descriptor::getset::PyGetSetDescriptor;
use crate::descriptor::member::PyMemberDescriptor;
use crate::descriptor::method::{PyBoundMethod, PyMethodDescriptor};
use crate::descriptor::wrapper::{PyMethodWrapper, PyWrapperDescriptor};
use crate::object::core::PyRef;
use crate::registry::{Representation, TypeRegistry};
use crate::types::slot::SlotFunc;
use crate::types::{PyTypeFlags, PyTypeSlots, SpecialMethod};

pub struct DescriptorTypes {
    pub member_descriptor: PyTypeRef,
    pub getset_descriptor: PyTypeRef,
    pub wrapper_descriptor: PyTypeRef,
    pub method_wrapper: PyTypeRef,
    pub method_descriptor: PyTypeRef,
    pub bound_method: PyTypeRef,
}

/// Builds one of the six, wiring it in as a direct subclass of `object`
/// under `type`.
fn build_bare(name: &'static str, object_type: &PyTypeRef, type_type: &PyTypeRef) -> PyTypeRef {
    let payload = PyType::new_bare(name, PyTypeFlags::DEFAULT, TypeVariant::Simple);
    let type_ref = PyRef::new_ref(payload, type_type.clone(), None);
    type_ref.set_bases(vec![object_type.clone()]);
    let mro = PyType::linearise_mro(type_ref.clone(), &[object_type.clone()])
        .expect("a fresh subclass of object never conflicts");
    type_ref.set_mro(mro);
    type_ref
}

pub fn bootstrap(registry: &TypeRegistry, object_type: &PyTypeRef, type_type: &PyTypeRef) -> DescriptorTypes {
    let member_descriptor = build_bare("member_descriptor", object_type, type_type);
    let getset_descriptor = build_bare("getset_descriptor", object_type, type_type);
    let wrapper_descriptor = build_bare("wrapper_descriptor", object_type, type_type);
    let method_wrapper = build_bare("method_wrapper", object_type, type_type);
    let method_descriptor = build_bare("method_descriptor", object_type, type_type);
    let bound_method = build_bare("bound_method", object_type, type_type);

    // Member/getset descriptors are always data descriptors: both
    // `__get__` and `__set__` are filled even when a concrete instance's
    // setter always raises.
    let member_slots = PyTypeSlots::new("member_descriptor");
    member_slots.set(SpecialMethod::DescrGet, SlotFunc::DescrGet(PyMemberDescriptor::descr_get));
    member_slots.set(SpecialMethod::DescrSet, SlotFunc::DescrSet(PyMemberDescriptor::descr_set));

    let getset_slots = PyTypeSlots::new("getset_descriptor");
    getset_slots.set(SpecialMethod::DescrGet, SlotFunc::DescrGet(PyGetSetDescriptor::descr_get));
    getset_slots.set(SpecialMethod::DescrSet, SlotFunc::DescrSet(PyGetSetDescriptor::descr_set));

    // Wrapper/method descriptors and their bound forms are non-data
    // descriptors (only `__get__`) but are themselves callable.
    let wrapper_slots = PyTypeSlots::new("wrapper_descriptor");
    wrapper_slots.set(SpecialMethod::DescrGet, SlotFunc::DescrGet(PyWrapperDescriptor::descr_get));
    wrapper_slots.set(SpecialMethod::Call, SlotFunc::Call(PyWrapperDescriptor::call_slot));

    let method_wrapper_slots = PyTypeSlots::new("method_wrapper");
    method_wrapper_slots.set(SpecialMethod::Call, SlotFunc::Call(PyMethodWrapper::call_slot));

    let method_descriptor_slots = PyTypeSlots::new("method_descriptor");
    method_descriptor_slots.set(SpecialMethod::DescrGet, SlotFunc::DescrGet(PyMethodDescriptor::descr_get));
    method_descriptor_slots.set(SpecialMethod::Call, SlotFunc::Call(PyMethodDescriptor::call_slot));

    let bound_method_slots = PyTypeSlots::new("bound_method");
    bound_method_slots.set(SpecialMethod::Call, SlotFunc::Call(PyBoundMethod::call_slot));

    registry
        .register_all(vec![
            Representation::Simple {
                native_class: TypeId::of::<PyMemberDescriptor>(),
                slots: member_slots,
                type_ref: member_descriptor.clone(),
            },
            Representation::Simple {
                native_class: TypeId::of::<PyGetSetDescriptor>(),
                slots: getset_slots,
                type_ref: getset_descriptor.clone(),
            },
            Representation::Simple {
                native_class: TypeId::of::<PyWrapperDescriptor>(),
                slots: wrapper_slots,
                type_ref: wrapper_descriptor.clone(),
            },
            Representation::Simple {
                native_class: TypeId::of::<PyMethodWrapper>(),
                slots: method_wrapper_slots,
                type_ref: method_wrapper.clone(),
            },
            Representation::Simple {
                native_class: TypeId::of::<PyMethodDescriptor>(),
                slots: method_descriptor_slots,
                type_ref: method_descriptor.clone(),
            },
            Representation::Simple {
                native_class: TypeId::of::<PyBoundMethod>(),
                slots: bound_method_slots,
                type_ref: bound_method.clone(),
            },
        ])
        .expect("descriptor bootstrap registers six fresh native classes, it cannot clash");

    DescriptorTypes {
        member_descriptor,
        getset_descriptor,
        wrapper_descriptor,
        method_wrapper,
        method_descriptor,
        bound_method,
    }
}
