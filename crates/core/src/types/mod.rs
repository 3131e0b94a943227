//! Special-method enumeration, feature flags, and the small set of traits
//! a native payload implements to participate in the slot table.
//!
//! Numeric/sequence/mapping sub-protocols are represented by a handful of
//! illustrative variants rather than CPython's full ~35-entry
//! `PyNumberMethods`/`PySequenceMethods`/`PyMappingMethods` tables, since
//! concrete arithmetic types (`int`, `float`, …) are an external
//! collaborator and never populate the rest.

pub mod slot;

use bitflags::bitflags;

pub use slot::{PyTypeSlots, SlotFunc};

/// One entry per dunder method the attribute/call protocol and the
/// descriptor machinery know how to dispatch through. Every
/// `Representation` holds one function-pointer slot per variant;
/// unfilled slots resolve to the shared "empty" stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum SpecialMethod {
    Repr,
    Str,
    Hash,
    Call,
    GetAttribute,
    GetAttr,
    SetAttr,
    DelAttr,
    Init,
    New,
    Del,
    Iter,
    IterNext,
    GetItem,
    SetItem,
    DelItem,
    Len,
    Bool,
    DescrGet,
    DescrSet,
    DescrDelete,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Radd,
    Sub,
    Mul,
}

impl SpecialMethod {
    /// The canonical dunder name, used for `find_name_in_mro`-style
    /// lookups and for error messages that must name the missing method.
    pub const fn dunder_name(self) -> &'static str {
        use SpecialMethod::*;
        match self {
            Repr => "__repr__",
            Str => "__str__",
            Hash => "__hash__",
            Call => "__call__",
            GetAttribute => "__getattribute__",
            GetAttr => "__getattr__",
            SetAttr => "__setattr__",
            DelAttr => "__delattr__",
            Init => "__init__",
            New => "__new__",
            Del => "__del__",
            Iter => "__iter__",
            IterNext => "__next__",
            GetItem => "__getitem__",
            SetItem => "__setitem__",
            DelItem => "__delitem__",
            Len => "__len__",
            Bool => "__bool__",
            DescrGet => "__get__",
            DescrSet => "__set__",
            DescrDelete => "__delete__",
            Eq => "__eq__",
            Ne => "__ne__",
            Lt => "__lt__",
            Le => "__le__",
            Gt => "__gt__",
            Ge => "__ge__",
            Add => "__add__",
            Radd => "__radd__",
            Sub => "__sub__",
            Mul => "__mul__",
        }
    }

    pub fn from_dunder_name(name: &str) -> Option<Self> {
        use SpecialMethod::*;
        Some(match name {
            "__repr__" => Repr,
            "__str__" => Str,
            "__hash__" => Hash,
            "__call__" => Call,
            "__getattribute__" => GetAttribute,
            "__getattr__" => GetAttr,
            "__setattr__" => SetAttr,
            "__delattr__" => DelAttr,
            "__init__" => Init,
            "__new__" => New,
            "__del__" => Del,
            "__iter__" => Iter,
            "__next__" => IterNext,
            "__getitem__" => GetItem,
            "__setitem__" => SetItem,
            "__delitem__" => DelItem,
            "__len__" => Len,
            "__bool__" => Bool,
            "__get__" => DescrGet,
            "__set__" => DescrSet,
            "__delete__" => DescrDelete,
            "__eq__" => Eq,
            "__ne__" => Ne,
            "__lt__" => Lt,
            "__le__" => Le,
            "__gt__" => Gt,
            "__ge__" => Ge,
            "__add__" => Add,
            "__radd__" => Radd,
            "__sub__" => Sub,
            "__mul__" => Mul,
            _ => return None,
        })
    }

    /// True for the descriptor protocol's own special methods, used by
    /// `is_data_descriptor`.
    pub const fn is_descriptor_set_or_delete(self) -> bool {
        matches!(self, SpecialMethod::DescrSet | SpecialMethod::DescrDelete)
    }
}

bitflags! {
    /// Feature bitset. Derived flags (`HAS_SET`,
    /// `HAS_DELETE`, …) are computed from the populated dictionary at
    /// population time rather than stored redundantly here; only the
    /// flags a `TypeSpec` actually declares or that MRO inheritance
    /// propagates are bits in this set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PyTypeFlags: u32 {
        const BASETYPE        = 1 << 0;
        const IMMUTABLE       = 1 << 1;
        const REPLACEABLE     = 1 << 2;
        const INSTANTIABLE    = 1 << 3;
        const SEQUENCE        = 1 << 4;
        const MAPPING         = 1 << 5;
        const METHOD_DESCR    = 1 << 6;
        const HAS_DICT        = 1 << 7;
        const INT_SUBCLASS    = 1 << 8;
        const STR_SUBCLASS    = 1 << 9;
        const TYPE_SUBCLASS   = 1 << 10;

        const DEFAULT = Self::BASETYPE.bits() | Self::INSTANTIABLE.bits();
    }
}

impl Default for PyTypeFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PyTypeFlags {
    pub fn has_feature(self, flag: Self) -> bool {
        self.contains(flag)
    }

    pub fn heap_type_flags() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dunder_name_round_trips() {
        for sm in [
            SpecialMethod::Repr,
            SpecialMethod::GetAttribute,
            SpecialMethod::DescrSet,
            SpecialMethod::Add,
        ] {
            let name = sm.dunder_name();
            assert_eq!(SpecialMethod::from_dunder_name(name), Some(sm));
        }
    }

    #[test]
    fn default_flags_are_basetype_and_instantiable() {
        let flags = PyTypeFlags::default();
        assert!(flags.has_feature(PyTypeFlags::BASETYPE));
        assert!(flags.has_feature(PyTypeFlags::INSTANTIABLE));
        assert!(!flags.has_feature(PyTypeFlags::IMMUTABLE));
    }
}
