//! The process-wide native-class → Representation map.
//!
//! A concurrent map from native Rust payload type to the
//! [`Representation`] dispatch table for its instances, published
//! atomically and read lock-free once built. Native classes here are
//! identified by [`std::any::TypeId`], since this core's classes are
//! registered dynamically through [`crate::spec::TypeSpec`] rather than
//! declared once at compile time.

use std::any::TypeId;
use std::collections::HashMap;

use pytype_common::lock::PyRwLock;

use crate::errors::CoreError;
use crate::object::core::{PyObject, PyObjectDyn};
use crate::types::{PyTypeSlots, SpecialMethod};

/// Identifies a native Rust payload type as a registry key.
pub type NativeClassKey = TypeId;

/// One entry in an adoptive type's self-class list: a native class paired
/// with its position among the type's primary/adopted classes.
#[derive(Debug, Clone)]
pub struct SelfClassIndex {
    pub native_class: NativeClassKey,
    pub index: usize,
}

/// The three representation flavors.
pub enum Representation {
    /// The representation *is* the type; one native class, one fixed
    /// Python type.
    Simple {
        native_class: NativeClassKey,
        slots: PyTypeSlots,
        type_ref: crate::builtins::type_::PyTypeRef,
    },
    /// A native class adopted by an adoptive type, not its primary.
    Adopted {
        native_class: NativeClassKey,
        slots: PyTypeSlots,
        index: usize,
        type_ref: crate::builtins::type_::PyTypeRef,
    },
    /// Shared by several mutually-replaceable Python types; every
    /// instance carries its own current `__class__`.
    Shared {
        native_class: NativeClassKey,
        slots: PyTypeSlots,
        index: usize,
    },
}

impl Representation {
    pub fn native_class(&self) -> NativeClassKey {
        match self {
            Representation::Simple { native_class, .. }
            | Representation::Adopted { native_class, .. }
            | Representation::Shared { native_class, .. } => *native_class,
        }
    }

    pub fn slots(&self) -> &PyTypeSlots {
        match self {
            Representation::Simple { slots, .. }
            | Representation::Adopted { slots, .. }
            | Representation::Shared { slots, .. } => slots,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Representation::Simple { .. } => 0,
            Representation::Adopted { index, .. } | Representation::Shared { index, .. } => *index,
        }
    }

    /// Returns the instance's Python type.
    /// `Simple`/`Adopted` are fixed at registration; `Shared` consults the
    /// instance's own current class, since it may have been reassigned.
    pub fn python_type(&self, instance: &PyObject) -> crate::builtins::type_::PyTypeRef {
        match self {
            Representation::Simple { type_ref, .. } | Representation::Adopted { type_ref, .. } => {
                type_ref.clone()
            }
            Representation::Shared { .. } => instance.class_of(),
        }
    }

    pub fn has_feature(&self, instance: &PyObject, flag: crate::types::PyTypeFlags) -> bool {
        self.python_type(instance).has_feature(flag)
    }

    /// True iff the slot table offers `__set__` or `__delete__`.
    pub fn is_data_descriptor(&self) -> bool {
        self.slots().get(SpecialMethod::DescrSet).is_some()
            || self.slots().get(SpecialMethod::DescrDelete).is_some()
    }
}

#[derive(Default)]
pub struct TypeRegistry {
    map: PyRwLock<HashMap<NativeClassKey, Representation>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes the backing map; the one embedding-useful knob this
    /// registry exposes, threaded through as a constructor parameter
    /// rather than global state.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: PyRwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Lookup rule: exact match, else fabricate a default `object`-backed
    /// representation. Walking a native class's own superclasses to
    /// inherit a registered representation has no analogue here: this
    /// core has no notion of one native Rust payload type extending
    /// another outside the Python-level class graph the factory already
    /// tracks, so an unregistered class always falls straight to the
    /// default.
    pub fn lookup_result(&self, key: NativeClassKey) -> LookupResult {
        if self.map.read().contains_key(&key) {
            LookupResult::Found
        } else {
            LookupResult::Fabricated
        }
    }

    /// Runs `f` with the bound representation for `key`, if any. The
    /// borrow is scoped to the closure since `Representation` is not
    /// `Clone` (its slot table holds non-`Clone` atomics).
    pub fn with<R>(&self, key: NativeClassKey, f: impl FnOnce(Option<&Representation>) -> R) -> R {
        f(self.map.read().get(&key))
    }

    pub fn contains(&self, key: NativeClassKey) -> bool {
        self.map.read().contains_key(&key)
    }

    /// Installs many bindings atomically; fails the whole batch if any
    /// class is already bound to a *different* representation.
    pub fn register_all(&self, reps: Vec<Representation>) -> Result<(), CoreError> {
        let mut guard = self.map.write();
        for rep in &reps {
            if guard.contains_key(&rep.native_class()) {
                let class_name = rep.slots().name().to_string();
                log::warn!("representation clash publishing '{class_name}'");
                return Err(CoreError::Clash { class_name });
            }
        }
        log::debug!("publishing {} representation(s)", reps.len());
        for rep in reps {
            log::trace!("registering representation for '{}'", rep.slots().name());
            guard.insert(rep.native_class(), rep);
        }
        Ok(())
    }
}

pub enum LookupResult {
    Found,
    Fabricated,
}
