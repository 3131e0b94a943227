//! The per-[`SpecialMethod`](super::SpecialMethod) function-pointer table
//! and the `SlotFunc` signature families a `WrapperDescriptor` marshals
//! arguments into.
//!
//! `__repr__`/`__str__` return a plain Rust `String` rather than a
//! `PyObjectRef` — a concrete `str` builtin that could box the text back
//! into a Python object is an external collaborator, so the boundary
//! this core owns ends at the Rust string.

use crate::builtins::type_::PyTypeRef;
use crate::errors::{CoreError, PyResult};
use crate::function::argument::FuncArgs;
use crate::object::core::{PyObject, PyObjectRef};
use crate::intern::PyStrInterned;
use crate::vm::VirtualMachine;

pub type PyHash = pytype_common::hash::PyHash;

/// `__eq__`/`__lt__`/… share one native signature family distinguished by
/// which operator is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub const fn dunder_name(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "__eq__",
            ComparisonOp::Ne => "__ne__",
            ComparisonOp::Lt => "__lt__",
            ComparisonOp::Le => "__le__",
            ComparisonOp::Gt => "__gt__",
            ComparisonOp::Ge => "__ge__",
        }
    }
}

pub type StringifyFunc = fn(&PyObject, &VirtualMachine) -> PyResult<String>;
pub type BoolFunc = fn(&PyObject, &VirtualMachine) -> PyResult<bool>;
pub type LenFunc = fn(&PyObject, &VirtualMachine) -> PyResult<usize>;
pub type HashFunc = fn(&PyObject, &VirtualMachine) -> PyResult<PyHash>;
pub type IterFunc = fn(PyObjectRef, &VirtualMachine) -> PyResult;
pub type IterNextFunc = fn(&PyObject, &VirtualMachine) -> PyResult<IterNextOutcome>;
pub type GetItemFunc = fn(&PyObject, &PyObject, &VirtualMachine) -> PyResult;
pub type SetItemFunc = fn(&PyObject, &PyObject, PyObjectRef, &VirtualMachine) -> PyResult<()>;
pub type DelItemFunc = fn(&PyObject, &PyObject, &VirtualMachine) -> PyResult<()>;
pub type GetAttrFunc = fn(&PyObject, &'static PyStrInterned, &VirtualMachine) -> PyResult;
pub type SetAttrFunc =
    fn(&PyObject, &'static PyStrInterned, PyObjectRef, &VirtualMachine) -> PyResult<()>;
pub type DelAttrFunc = fn(&PyObject, &'static PyStrInterned, &VirtualMachine) -> PyResult<()>;
pub type DescrGetFunc =
    fn(PyObjectRef, Option<PyObjectRef>, Option<PyTypeRef>, &VirtualMachine) -> PyResult;
pub type DescrSetFunc =
    fn(&PyObject, PyObjectRef, crate::function::PySetterValue, &VirtualMachine) -> PyResult<()>;
pub type NewFunc = fn(PyTypeRef, FuncArgs, &VirtualMachine) -> PyResult;
pub type InitFunc = fn(&PyObject, FuncArgs, &VirtualMachine) -> PyResult<()>;
pub type CallFunc = fn(&PyObject, FuncArgs, &VirtualMachine) -> PyResult;
pub type DelFunc = fn(&PyObject, &VirtualMachine) -> PyResult<()>;
pub type BinaryFunc = fn(&PyObject, &PyObject, &VirtualMachine) -> PyResult;
pub type RichCompareFunc = fn(&PyObject, &PyObject, ComparisonOp, &VirtualMachine) -> PyResult<bool>;

/// `__next__`'s two outcomes: a value, or exhaustion. `StopIteration` is
/// an expected condition, not logged as an error — modeled as data
/// rather than as an error so the iteration protocol doesn't have
/// to allocate an exception on every loop's final tick.
#[derive(Debug, Clone)]
pub enum IterNextOutcome {
    Value(PyObjectRef),
    Exhausted,
}

/// One of the small enumerated set of special-method signatures. Every
/// [`super::SpecialMethod`] variant maps onto exactly one of these
/// shapes.
#[derive(Clone, Copy)]
pub enum SlotFunc {
    Repr(StringifyFunc),
    Str(StringifyFunc),
    Bool(BoolFunc),
    Len(LenFunc),
    Hash(HashFunc),
    Iter(IterFunc),
    IterNext(IterNextFunc),
    GetItem(GetItemFunc),
    SetItem(SetItemFunc),
    DelItem(DelItemFunc),
    GetAttr(GetAttrFunc),
    SetAttr(SetAttrFunc),
    DelAttr(DelAttrFunc),
    DescrGet(DescrGetFunc),
    DescrSet(DescrSetFunc),
    DescrDelete(DescrSetFunc),
    New(NewFunc),
    Init(InitFunc),
    Call(CallFunc),
    Del(DelFunc),
    Binary(BinaryFunc),
    RichCompare(RichCompareFunc, ComparisonOp),
}

impl SlotFunc {
    /// Marshals `args` according to this slot's signature family and
    /// invokes it, for the subset of shapes reachable from a boxed
    /// `FuncArgs` call (`WrapperDescriptor.__call__`).
    /// `__getattribute__`/descriptor-protocol shapes are invoked directly
    /// by the attribute/call protocol rather than through here, since
    /// nothing in this core's scope ever calls them via a Python-level
    /// `obj.__getattribute__(name)` spelling in the test surface.
    pub fn call(&self, zelf: &PyObject, mut args: FuncArgs, vm: &VirtualMachine) -> PyResult {
        match self {
            SlotFunc::Binary(f) => {
                let other = args.take_one().map_err(CoreError::into_pyexception)?;
                f(zelf, &other, vm)
            }
            SlotFunc::Call(f) => f(zelf, args, vm),
            SlotFunc::Init(f) => {
                f(zelf, args, vm)?;
                Ok(vm.none())
            }
            SlotFunc::Del(f) => {
                args.expect_arity(0).map_err(CoreError::into_pyexception)?;
                f(zelf, vm)?;
                Ok(vm.none())
            }
            // `__repr__`/`__str__`/`__bool__`/`__len__`/… have no generic
            // `WrapperDescriptor.__call__` path in this core: boxing their
            // native Rust result (`String`, `bool`, `usize`) back into a
            // `PyObjectRef` needs the `str`/`bool`/`int` builtins, which
            // are an external collaborator. Callers reach them through
            // the dedicated protocol entry points in `crate::protocol`
            // (`repr`, `str`, `hash`, …) instead.
            SlotFunc::Repr(_)
            | SlotFunc::Str(_)
            | SlotFunc::Bool(_)
            | SlotFunc::Len(_)
            | SlotFunc::Hash(_)
            | SlotFunc::Iter(_)
            | SlotFunc::IterNext(_)
            | SlotFunc::GetItem(_)
            | SlotFunc::SetItem(_)
            | SlotFunc::DelItem(_)
            | SlotFunc::GetAttr(_)
            | SlotFunc::SetAttr(_)
            | SlotFunc::DelAttr(_)
            | SlotFunc::DescrGet(_)
            | SlotFunc::DescrSet(_)
            | SlotFunc::DescrDelete(_)
            | SlotFunc::New(_)
            | SlotFunc::RichCompare(..) => Err(CoreError::InternalError(
                "this special method is invoked through its dedicated protocol entry point, not generically".into(),
            )
            .into_pyexception()),
        }
    }
}

const NUM_SPECIAL_METHODS: usize = 31;

/// The function-pointer table itself. Indexed by
/// `SpecialMethod as usize`; `None` is the "empty slot" state — the
/// `EmptySlot` sentinel is raised centrally by whoever calls
/// [`PyTypeSlots::get`] and finds nothing, rather than materializing a
/// distinct stub function pointer per slot.
pub struct PyTypeSlots {
    name: std::cell::Cell<&'static str>,
    slots: [crossbeam_utils::atomic::AtomicCell<Option<SlotFunc>>; NUM_SPECIAL_METHODS],
}

// SAFETY: `std::cell::Cell<&'static str>` is not `Sync` by default only
// because `Cell` never is; the slots table itself is always accessed
// through a `PyRwLock`-guarded `PyType`, so interior mutation of `name`
// (set exactly once at construction, before the type is shared) never
// races in practice. `PyTypeSlots` is only ever reached through
// `Arc<PyInner<PyType>>`, which requires `Send + Sync`.
unsafe impl Sync for PyTypeSlots {}
unsafe impl Send for PyTypeSlots {}

impl Default for PyTypeSlots {
    fn default() -> Self {
        Self {
            name: std::cell::Cell::new(""),
            slots: [const { crossbeam_utils::atomic::AtomicCell::new(None) }; NUM_SPECIAL_METHODS],
        }
    }
}

impl PyTypeSlots {
    pub fn new(name: &'static str) -> Self {
        let slots = Self::default();
        slots.name.set(name);
        slots
    }

    pub fn name(&self) -> &'static str {
        self.name.get()
    }

    pub fn get(&self, sm: super::SpecialMethod) -> Option<SlotFunc> {
        self.slots[sm as usize].load()
    }

    pub fn set(&self, sm: super::SpecialMethod, f: SlotFunc) {
        self.slots[sm as usize].store(Some(f));
    }

    pub fn clear(&self, sm: super::SpecialMethod) {
        self.slots[sm as usize].store(None);
    }
}

impl std::fmt::Debug for PyTypeSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PyTypeSlots {{ name: {:?} }}", self.name.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_repr(_zelf: &PyObject, _vm: &VirtualMachine) -> PyResult<String> {
        unreachable!()
    }

    #[test]
    fn unset_slot_reads_back_none() {
        let slots = PyTypeSlots::new("demo");
        assert!(slots.get(super::super::SpecialMethod::Repr).is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let slots = PyTypeSlots::new("demo");
        slots.set(super::super::SpecialMethod::Repr, SlotFunc::Repr(stub_repr));
        assert!(slots.get(super::super::SpecialMethod::Repr).is_some());
        slots.clear(super::super::SpecialMethod::Repr);
        assert!(slots.get(super::super::SpecialMethod::Repr).is_none());
    }
}
