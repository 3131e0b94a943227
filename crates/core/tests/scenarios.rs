//! End-to-end scenarios, adapted to this crate's declared scope:
//! `int`/`bool`/`str` are external collaborators, so scenarios that rest
//! on concrete arithmetic or string equality are exercised with marker
//! native classes instead, demonstrating the same dispatch mechanics
//! without reimplementing a builtin this core never owns.
//!
//! Colocated `#[cfg(test)]` modules elsewhere cover unit-level behavior;
//! this file covers whole-crate scenarios that span several components at
//! once.

use std::sync::Arc;

use pytype_core::builtins::type_::PyTypeRef;
use pytype_core::errors::ErrorKind;
use pytype_core::exposer::{ClassExposition, GetSetSpec, MethodSpec, NativeClassExposition};
use pytype_core::function::FuncArgs;
use pytype_core::types::PyTypeFlags;
use pytype_core::{Context, PyObjectRef, PyPayload, PyRef, TypeSpec, VirtualMachine};

#[derive(Debug)]
struct Marker;

impl PyPayload for Marker {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}

impl NativeClassExposition for Marker {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

// ---------------------------------------------------------------------
// Scenario 1 — bootstrap
// ---------------------------------------------------------------------

#[test]
fn bootstrap_wires_type_and_object_correctly() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    assert!(vm.type_of(ctx.types.type_type.as_object()).is(&ctx.types.type_type));
    assert!(vm.type_of(ctx.types.object_type.as_object()).is(&ctx.types.type_type));

    let type_mro = ctx.types.type_type.mro();
    assert_eq!(type_mro.len(), 2);
    assert!(type_mro[0].is(&ctx.types.type_type));
    assert!(type_mro[1].is(&ctx.types.object_type));

    assert!(ctx.types.object_type.bases().is_empty());
}

// ---------------------------------------------------------------------
// Scenario 2 — adopted representation (generalized: no concrete int/bool)
// ---------------------------------------------------------------------

#[derive(Debug)]
struct PrimaryPayload;
impl PyPayload for PrimaryPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for PrimaryPayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

#[derive(Debug)]
struct AdoptedPayload;
impl PyPayload for AdoptedPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for AdoptedPayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

fn primary_repr(_obj: &pytype_core::PyObject, _vm: &VirtualMachine) -> pytype_core::PyResult<String> {
    Ok("<primary>".to_string())
}

fn adopted_repr(_obj: &pytype_core::PyObject, _vm: &VirtualMachine) -> pytype_core::PyResult<String> {
    Ok("<adopted>".to_string())
}

#[test]
fn adopted_native_class_reports_the_adoptive_python_type() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    let spec = TypeSpec::new("Pair")
        .with_native::<PrimaryPayload>()
        .with_repr(primary_repr)
        .with_native::<AdoptedPayload>()
        .with_repr(adopted_repr);
    let pair = ctx.define_type(spec).expect("Pair builds");

    match pair.variant() {
        pytype_core::builtins::type_::TypeVariant::Adoptive { self_classes, accepted } => {
            assert_eq!(self_classes.len(), 2);
            assert!(accepted.is_empty());
        }
        other => panic!("expected Adoptive, got {other:?}"),
    }

    let primary_obj: PyObjectRef = PyRef::new_ref(PrimaryPayload, pair.clone(), None).into();
    let adopted_obj: PyObjectRef = PyRef::new_ref(AdoptedPayload, pair.clone(), None).into();

    assert!(vm.type_of(&primary_obj).is(&pair));
    assert!(vm.type_of(&adopted_obj).is(&pair));

    // Each self-class keeps its own slot table even though both report
    // the same Python type — the same underlying mechanism behind
    // `bool.mro()` starting `[bool, int, object]` and
    // `(5).__add__(True) == 6`: per-native-class dispatch resolving to
    // different native code under one shared type.
    assert_eq!(vm.repr(&primary_obj).unwrap(), "<primary>");
    assert_eq!(vm.repr(&adopted_obj).unwrap(), "<adopted>");
}

// ---------------------------------------------------------------------
// Scenario 2b — a method/getset shared by name across two self-classes of
// one adoptive type must merge into a single descriptor that dispatches
// to each self-class's own native implementation: the canonical `int`
// adopting `HostInt`/`HostBool`, `(5).__add__(True) == 6` case.
// ---------------------------------------------------------------------

#[derive(Debug)]
struct HostIntPayload;
impl PyPayload for HostIntPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}

#[derive(Debug)]
struct HostBoolPayload;
impl PyPayload for HostBoolPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}

#[derive(Debug)]
struct IntAddResult;
impl PyPayload for IntAddResult {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}

#[derive(Debug)]
struct BoolAddResult;
impl PyPayload for BoolAddResult {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}

fn host_int_add(
    _zelf: &pytype_core::PyObject,
    _args: FuncArgs,
    vm: &VirtualMachine,
) -> pytype_core::PyResult {
    Ok(PyRef::new_ref(IntAddResult, vm.ctx.types.object_type.clone(), None).into())
}

fn host_bool_add(
    _zelf: &pytype_core::PyObject,
    _args: FuncArgs,
    vm: &VirtualMachine,
) -> pytype_core::PyResult {
    Ok(PyRef::new_ref(BoolAddResult, vm.ctx.types.object_type.clone(), None).into())
}

impl NativeClassExposition for HostIntPayload {
    fn expose() -> ClassExposition {
        ClassExposition {
            methods: vec![MethodSpec { name: "add", doc: None, func: host_int_add }],
            getsets: vec![GetSetSpec {
                name: "value",
                getter: Some(|_obj, vm| Ok(PyRef::new_ref(IntAddResult, vm.ctx.types.object_type.clone(), None).into())),
                setter: None,
            }],
            wrappers: Vec::new(),
        }
    }
}

impl NativeClassExposition for HostBoolPayload {
    fn expose() -> ClassExposition {
        ClassExposition {
            methods: vec![MethodSpec { name: "add", doc: None, func: host_bool_add }],
            getsets: vec![GetSetSpec {
                name: "value",
                getter: Some(|_obj, vm| Ok(PyRef::new_ref(BoolAddResult, vm.ctx.types.object_type.clone(), None).into())),
                setter: None,
            }],
            wrappers: Vec::new(),
        }
    }
}

#[test]
fn adopted_self_classes_sharing_a_method_name_each_dispatch_to_their_own_native_implementation() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    let spec = TypeSpec::new("Num").with_native::<HostIntPayload>().with_native::<HostBoolPayload>();
    let num = ctx.define_type(spec).expect("Num builds as Adoptive");

    let int_obj: PyObjectRef = PyRef::new_ref(HostIntPayload, num.clone(), None).into();
    let bool_obj: PyObjectRef = PyRef::new_ref(HostBoolPayload, num.clone(), None).into();
    let add_name = ctx.intern_str("add");

    let int_bound = vm.get_attr(&int_obj, add_name).expect("HostInt exposes 'add'");
    let int_result = vm.call(&int_bound, FuncArgs::new(vec![])).unwrap();
    assert!(pytype_core::downcast_ref::<IntAddResult>(&int_result).is_some());

    let bool_bound = vm.get_attr(&bool_obj, add_name).expect("HostBool exposes 'add'");
    let bool_result = vm.call(&bool_bound, FuncArgs::new(vec![])).unwrap();
    assert!(pytype_core::downcast_ref::<BoolAddResult>(&bool_result).is_some());
}

#[test]
fn adopted_self_classes_sharing_a_getset_name_each_dispatch_to_their_own_native_implementation() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    let spec = TypeSpec::new("Num2").with_native::<HostIntPayload>().with_native::<HostBoolPayload>();
    let num = ctx.define_type(spec).expect("Num2 builds as Adoptive");

    let int_obj: PyObjectRef = PyRef::new_ref(HostIntPayload, num.clone(), None).into();
    let bool_obj: PyObjectRef = PyRef::new_ref(HostBoolPayload, num.clone(), None).into();
    let value_name = ctx.intern_str("value");

    let int_result = vm.get_attr(&int_obj, value_name).expect("HostInt exposes 'value'");
    assert!(pytype_core::downcast_ref::<IntAddResult>(&int_result).is_some());

    let bool_result = vm.get_attr(&bool_obj, value_name).expect("HostBool exposes 'value'");
    assert!(pytype_core::downcast_ref::<BoolAddResult>(&bool_result).is_some());
}

// ---------------------------------------------------------------------
// Scenario 3 — getset descriptor, read-only
// ---------------------------------------------------------------------

#[derive(Debug)]
struct WidgetPayload;
impl PyPayload for WidgetPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}

fn widget_name_getter(_obj: &pytype_core::PyObject, vm: &VirtualMachine) -> Result<PyObjectRef, pytype_core::PyException> {
    Ok(vm.none())
}

impl NativeClassExposition for WidgetPayload {
    fn expose() -> ClassExposition {
        ClassExposition {
            methods: Vec::new(),
            getsets: vec![GetSetSpec {
                name: "name",
                getter: Some(widget_name_getter),
                setter: None,
            }],
            wrappers: Vec::new(),
        }
    }
}

#[test]
fn getset_descriptor_is_read_only_when_no_setter_is_registered() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    let spec = TypeSpec::new("Widget").with_native::<WidgetPayload>();
    let widget = ctx.define_type(spec).expect("Widget builds");

    let instance: PyObjectRef = PyRef::new_ref(WidgetPayload, widget.clone(), None).into();
    let name = ctx.intern_str("name");

    let value = vm.get_attr(&instance, name).expect("getter is registered");
    assert!(Arc::ptr_eq(&value, &vm.none()));

    let err = vm
        .set_attr(&instance, name, vm.none())
        .expect_err("no setter is registered");
    assert_eq!(err.kind, ErrorKind::AttributeError);
    assert!(err.message.contains("name"));
    assert!(err.message.contains("read-only"));
}

// ---------------------------------------------------------------------
// Scenario 4 — data-descriptor precedence over the instance dict
// ---------------------------------------------------------------------

fn gadget_x_getter(_obj: &pytype_core::PyObject, vm: &VirtualMachine) -> Result<PyObjectRef, pytype_core::PyException> {
    Ok(vm.none())
}

#[derive(Debug)]
struct GadgetPayload;
impl PyPayload for GadgetPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for GadgetPayload {
    fn expose() -> ClassExposition {
        ClassExposition {
            methods: Vec::new(),
            getsets: vec![GetSetSpec {
                name: "x",
                getter: Some(gadget_x_getter),
                setter: None,
            }],
            wrappers: Vec::new(),
        }
    }
}

#[test]
fn data_descriptor_wins_over_the_instance_dict() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    let spec = TypeSpec::new("Gadget").with_native::<GadgetPayload>();
    let gadget = ctx.define_type(spec).expect("Gadget builds");

    let dict = pytype_core::InstanceDict::new();
    let x_name = ctx.intern_str("x");
    let marker: PyObjectRef = PyRef::new_ref(Marker, ctx.types.object_type.clone(), None).into();
    dict.set(x_name, marker.clone());

    let instance: PyObjectRef = PyRef::new_ref(GadgetPayload, gadget.clone(), Some(dict)).into();

    let value = vm.get_attr(&instance, x_name).unwrap();
    assert!(Arc::ptr_eq(&value, &vm.none()));
    assert!(!Arc::ptr_eq(&value, &marker));
}

// ---------------------------------------------------------------------
// Scenario 5 — `__class__` replacement between Replaceable siblings
// ---------------------------------------------------------------------

#[derive(Debug)]
struct ReplaceablePayload;
impl PyPayload for ReplaceablePayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for ReplaceablePayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

#[test]
fn class_reassignment_succeeds_within_a_shared_group_and_fails_outside_it() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    let a_type = ctx
        .define_type(
            TypeSpec::new("A")
                .with_native::<ReplaceablePayload>()
                .with_flags(PyTypeFlags::DEFAULT | PyTypeFlags::REPLACEABLE),
        )
        .expect("A builds");
    let b_type = ctx
        .define_type(
            TypeSpec::new("B")
                .with_native::<ReplaceablePayload>()
                .with_flags(PyTypeFlags::DEFAULT | PyTypeFlags::REPLACEABLE),
        )
        .expect("B shares A's representation");
    let c_type = ctx
        .define_type(TypeSpec::new("C").with_native::<Marker>())
        .expect("C builds as an ordinary Simple type");

    let a = PyRef::new_ref(ReplaceablePayload, a_type.clone(), None);
    let a_ref: PyObjectRef = a.clone().into();
    assert!(vm.type_of(&a_ref).is(&a_type));

    vm.set_class(&a_ref, b_type.clone()).expect("A and B share a representation");
    assert!(vm.type_of(&a_ref).is(&b_type));

    let err = vm
        .set_class(&a_ref, c_type.clone())
        .expect_err("C does not share A/B's representation");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

// ---------------------------------------------------------------------
// Scenario 6 — MRO conflict
// ---------------------------------------------------------------------

#[derive(Debug)]
struct XPayload;
impl PyPayload for XPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for XPayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

#[derive(Debug)]
struct YPayload;
impl PyPayload for YPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for YPayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

#[derive(Debug)]
struct BPayload;
impl PyPayload for BPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for BPayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

#[derive(Debug)]
struct CPayload;
impl PyPayload for CPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for CPayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

#[derive(Debug)]
struct DPayload;
impl PyPayload for DPayload {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.object_type.clone()
    }
}
impl NativeClassExposition for DPayload {
    fn expose() -> ClassExposition {
        ClassExposition::default()
    }
}

#[test]
fn inconsistent_base_order_raises_mro_conflict_and_publishes_nothing() {
    let vm = VirtualMachine::new();
    let ctx = &vm.ctx;

    let x = ctx.define_type(TypeSpec::new("X").with_native::<XPayload>()).unwrap();
    let y = ctx.define_type(TypeSpec::new("Y").with_native::<YPayload>()).unwrap();
    let b = ctx
        .define_type(TypeSpec::new("B").with_native::<BPayload>().with_bases(vec![x.clone(), y.clone()]))
        .unwrap();
    let c = ctx
        .define_type(TypeSpec::new("C").with_native::<CPayload>().with_bases(vec![y.clone(), x.clone()]))
        .unwrap();

    assert_eq!(b.mro().iter().map(|t| t.name().to_string()).collect::<Vec<_>>(), vec!["B", "X", "Y", "object"]);
    assert_eq!(c.mro().iter().map(|t| t.name().to_string()).collect::<Vec<_>>(), vec!["C", "Y", "X", "object"]);

    let d_key = std::any::TypeId::of::<DPayload>();
    assert!(!ctx.registry.contains(d_key));

    let result = ctx.define_type(TypeSpec::new("D").with_native::<DPayload>().with_bases(vec![b, c]));
    assert!(matches!(result, Err(pytype_core::CoreError::MROConflict { .. })));

    // The failed transaction published nothing: partial state is
    // discarded on error.
    assert!(!ctx.registry.contains(d_key));

    // The factory itself is still usable afterwards — the failed
    // transaction didn't corrupt its reentrancy bookkeeping or leave
    // anything stuck in the workshop.
    let e = ctx.define_type(TypeSpec::new("E").with_native::<Marker>());
    assert!(e.is_ok());
}
