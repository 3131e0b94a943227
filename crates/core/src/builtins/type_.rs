//! The `type` object itself: name, bases, MRO, attribute dictionary,
//! feature flags, and (for adoptive types) the self-class list.
//!
//! Holds the C3 linearization algorithm and base/metaclass resolution
//! (`linearise_mro`, `best_base`, `calculate_meta_class`). The explicit
//! `TypeVariant::Adoptive` self-class list is tracked directly as
//! type-object state, since self-classes are registered dynamically
//! through `TypeSpec` rather than baked into a payload hierarchy at
//! compile time.

use std::fmt;

use ahash::RandomState;
use indexmap::IndexMap;
use itertools::Itertools;
use pytype_common::lock::PyRwLock;

use crate::errors::{CoreError, PyException};
use crate::intern::PyStrInterned;
use crate::object::core::{PyObjectRef, PyPayload, PyRef};
use crate::registry::{NativeClassKey, SelfClassIndex};
use crate::types::{PyTypeFlags, PyTypeSlots};
use crate::vm::Context;

/// Which of the three C3 shapes a `PyType` takes.
#[derive(Debug, Clone)]
pub enum TypeVariant {
    /// One native class represents every instance.
    Simple,
    /// A primary native class plus adopted classes, each with its own
    /// [`SelfClassIndex`], and optionally classes merely *accepted* as
    /// `self` without owning a Representation of their own.
    Adoptive {
        self_classes: Vec<SelfClassIndex>,
        accepted: Vec<NativeClassKey>,
    },
    /// Shares a `SharedRepresentation` with sibling types so `__class__`
    /// may move an instance between them.
    Replaceable { representation_key: u64 },
}

pub struct PyType {
    name: String,
    bases: PyRwLock<Vec<PyTypeRef>>,
    base: PyRwLock<Option<PyTypeRef>>,
    mro: PyRwLock<Vec<PyTypeRef>>,
    dict: PyRwLock<IndexMap<&'static PyStrInterned, PyObjectRef, RandomState>>,
    flags: PyRwLock<PyTypeFlags>,
    slots: PyTypeSlots,
    variant: PyRwLock<TypeVariant>,
}

pub type PyTypeRef = PyRef<PyType>;

/// The sentinel `subclass_index` returns for a native class that is
/// accepted as `self` but owns no Representation of its own.
pub const ACCEPTED_SENTINEL: usize = usize::MAX;

impl fmt::Debug for PyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PyType").field("name", &self.name).finish()
    }
}

impl PyPayload for PyType {
    fn class(ctx: &Context) -> PyTypeRef {
        ctx.types.type_type.clone()
    }
}

impl PyType {
    /// Builds a type with no bases, no MRO, and an empty dict. Used only
    /// by the factory while hand-constructing `type`/`object` during
    /// bootstrap and by [`crate::factory::TypeFactory::from_spec`], which
    /// fills `bases`/`mro`/`dict` immediately after.
    pub fn new_bare(name: impl Into<String>, flags: PyTypeFlags, variant: TypeVariant) -> Self {
        let name = name.into();
        let static_name: &'static str = Box::leak(name.clone().into_boxed_str());
        Self {
            name,
            bases: PyRwLock::new(Vec::new()),
            base: PyRwLock::new(None),
            mro: PyRwLock::new(Vec::new()),
            dict: PyRwLock::new(IndexMap::default()),
            flags: PyRwLock::new(flags),
            slots: PyTypeSlots::new(static_name),
            variant: PyRwLock::new(variant),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &PyTypeSlots {
        &self.slots
    }

    pub fn flags(&self) -> PyTypeFlags {
        *self.flags.read()
    }

    pub fn set_flags(&self, flags: PyTypeFlags) {
        *self.flags.write() = flags;
    }

    pub fn has_feature(&self, flag: PyTypeFlags) -> bool {
        self.flags().has_feature(flag)
    }

    pub fn bases(&self) -> Vec<PyTypeRef> {
        self.bases.read().clone()
    }

    pub fn set_bases(&self, bases: Vec<PyTypeRef>) {
        if let Some(first) = bases.first() {
            *self.base.write() = Some(first.clone());
        }
        *self.bases.write() = bases;
    }

    pub fn base(&self) -> Option<PyTypeRef> {
        self.base.read().clone()
    }

    pub fn mro(&self) -> Vec<PyTypeRef> {
        self.mro.read().clone()
    }

    pub fn variant(&self) -> TypeVariant {
        self.variant.read().clone()
    }

    /// The matching self-class's index,
    /// or [`ACCEPTED_SENTINEL`] if `key` is merely accepted rather than
    /// adopted — distinguishing "no applicable per-class implementation,
    /// fall back" from "not a self-class at all" (`None`).
    pub fn self_class_index(&self, key: NativeClassKey) -> Option<usize> {
        match &*self.variant.read() {
            TypeVariant::Adoptive { self_classes, accepted } => self_classes
                .iter()
                .position(|sc| sc.native_class == key)
                .or_else(|| accepted.contains(&key).then_some(ACCEPTED_SENTINEL)),
            _ => None,
        }
    }

    /// MRO-ordered dictionary search across `self` and every base.
    pub fn lookup(&self, name: &PyStrInterned) -> Option<PyObjectRef> {
        for klass in self.mro() {
            if let Some(value) = klass.dict.read().get(name).cloned() {
                return Some(value);
            }
        }
        None
    }

    /// Direct, non-inherited dictionary access (used while populating the
    /// type during exposition, and by `__dict__`-style introspection).
    pub fn get_own_attr(&self, name: &PyStrInterned) -> Option<PyObjectRef> {
        self.dict.read().get(name).cloned()
    }

    pub fn set_attr(&self, name: &'static PyStrInterned, value: PyObjectRef) {
        self.dict.write().insert(name, value);
    }

    pub fn del_attr(&self, name: &PyStrInterned) -> bool {
        self.dict.write().shift_remove(name).is_some()
    }

    pub fn is_subtype_of(&self, other: &PyTypeRef, myself: &PyTypeRef) -> bool {
        self.mro().iter().any(|t| t.is(other)) || myself.is(other)
    }

    /// C3 linearization: `MRO(T) = [T] + merge(MRO(B1), …,
    /// MRO(Bn), [B1, …, Bn])`.
    pub fn linearise_mro(this: PyTypeRef, bases: &[PyTypeRef]) -> Result<Vec<PyTypeRef>, CoreError> {
        let this_name = this.name().to_string();
        log::trace!(
            "linearise_mro({this_name}): bases = [{}]",
            bases.iter().map(|b| b.name()).format(", ")
        );
        if bases.is_empty() {
            return Ok(vec![this]);
        }
        let mut seqs: Vec<Vec<PyTypeRef>> = bases.iter().map(|b| b.mro()).collect();
        seqs.push(bases.to_vec());

        let mut result = vec![this];
        loop {
            seqs.retain(|seq| !seq.is_empty());
            if seqs.is_empty() {
                break;
            }
            let head = seqs.iter().find_map(|seq| {
                let candidate = &seq[0];
                let appears_in_tail = seqs
                    .iter()
                    .any(|other| other[1..].iter().any(|t| t.is(candidate)));
                if appears_in_tail {
                    None
                } else {
                    Some(candidate.clone())
                }
            });
            let head = head.ok_or_else(|| {
                log::warn!(
                    "MRO conflict linearising '{this_name}': no consistent order for [{}]",
                    bases.iter().map(|b| b.name()).format(", ")
                );
                CoreError::MROConflict {
                    bases: bases.iter().map(|b| b.name().to_string()).collect(),
                }
            })?;
            result.push(head.clone());
            for seq in seqs.iter_mut() {
                if !seq.is_empty() && seq[0].is(&head) {
                    seq.remove(0);
                }
            }
        }
        Ok(result)
    }

    pub fn set_mro(&self, mro: Vec<PyTypeRef>) {
        *self.mro.write() = mro;
    }

    /// `best_base`: the single base whose native layout the others must be
    /// compatible with. Here this reduces to: of the given bases, the most
    /// derived one that is itself `Simple`/`Adoptive` (i.e. actually owns
    /// layout), since plain mixins contribute no native representation.
    pub fn best_base(bases: &[PyTypeRef]) -> Option<PyTypeRef> {
        bases
            .iter()
            .max_by_key(|b| b.mro().len())
            .cloned()
    }

    /// `calculate_meta_class`: the most derived type among the explicit
    /// metaclass request and each base's own type, or an error if no
    /// single candidate dominates (CPython's metaclass conflict rule).
    pub fn calculate_meta_class(
        explicit: Option<PyTypeRef>,
        bases: &[PyTypeRef],
        type_of: impl Fn(&PyTypeRef) -> PyTypeRef,
    ) -> Result<PyTypeRef, CoreError> {
        let mut winner = explicit;
        for base in bases {
            let base_meta = type_of(base);
            winner = Some(match &winner {
                None => base_meta,
                Some(w) if w.is_subtype_of(&base_meta, w) => w.clone(),
                Some(w) if base_meta.is_subtype_of(w, &base_meta) => base_meta,
                Some(w) => {
                    return Err(CoreError::InternalError(format!(
                        "metaclass conflict: {} is not a subclass of {}",
                        w.name(),
                        base_meta.name()
                    )))
                }
            });
        }
        winner.ok_or_else(|| CoreError::InternalError("no metaclass candidate".into()))
    }

    /// `a.__class__ = candidate` validity check: both the instance's
    /// current type and the candidate must be `Replaceable` members of the
    /// *same* group — i.e. share a `SharedRepresentation`, this core's
    /// stand-in for "compatible slots, `__dict__` presence, and
    /// immutability" between two layout-compatible types.
    pub fn check_class_assignment(current: &PyTypeRef, candidate: &PyTypeRef) -> Result<(), PyException> {
        match (&*current.variant.read(), &*candidate.variant.read()) {
            (
                TypeVariant::Replaceable { representation_key: a },
                TypeVariant::Replaceable { representation_key: b },
            ) if a == b => Ok(()),
            _ => Err(PyException::type_error(format!(
                "__class__ assignment: '{}' object layout differs from '{}'",
                current.name(),
                candidate.name()
            ))),
        }
    }
}

/// CPython's leading-double-underscore name mangling for attribute access
/// written inside a class body (`__x` → `_ClassName__x`), ported from
/// `PyType::mangle_name`. Applied by the compiler-facing boundary that
/// resolves identifiers inside class bodies; the core just provides the
/// transform.
pub fn mangle_name(class_name: &str, attr: &str) -> String {
    if !attr.starts_with("__") || attr.ends_with("__") {
        return attr.to_string();
    }
    let stripped = class_name.trim_start_matches('_');
    if stripped.is_empty() {
        return attr.to_string();
    }
    format!("_{stripped}{attr}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangle_name_rewrites_leading_dunder() {
        assert_eq!(mangle_name("Foo", "__bar"), "_Foo__bar");
        assert_eq!(mangle_name("Foo", "__bar__"), "__bar__");
        assert_eq!(mangle_name("Foo", "bar"), "bar");
        assert_eq!(mangle_name("_Foo", "__bar"), "_Foo__bar");
    }
}
