//! The object representation: an instance holds a weak logical reference
//! to its Representation via its native class.
//!
//! `PyInner<T>` / `PyObjectRef` / `Py<T>` / `PyRef<T>` are built on
//! `std::sync::Arc` rather than a hand-rolled refcount plus a custom
//! type-erasure trick — `Arc`'s built-in `downcast`-style erasure is both
//! safe and idiomatic, and garbage collection is out of scope. The
//! `PyInner<T>` field layout (current class, instance dict) covers what's
//! needed; weak-reference and `__slots__`-array machinery is dropped since
//! neither is a tracked component here — typed fields are served directly
//! by `MemberDescriptor` closures over the native struct, not a generic
//! boxed slot array.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use indexmap::IndexMap;
use pytype_common::lock::PyRwLock;

use crate::builtins::type_::{PyType, PyTypeRef};
use crate::intern::PyStrInterned;
use crate::vm::Context;

/// Implemented by every native Rust type that can back a Python instance.
pub trait PyPayload: fmt::Debug + Send + Sync + 'static {
    /// The statically-known Python type for instances of this payload when
    /// it isn't a [`SharedRepresentation`](crate::registry::Representation)
    /// member (simple/adopted classes have one fixed type; replaceable
    /// classes override `class` dynamically through the object's own
    /// current `typ`).
    fn class(ctx: &Context) -> PyTypeRef;
}

/// Per-instance attribute dictionary. Cheaply clonable (shares the backing
/// map): mutated by the owning thread, read by whoever holds a clone.
#[derive(Clone, Default)]
pub struct InstanceDict {
    entries: Arc<PyRwLock<IndexMap<&'static PyStrInterned, PyObjectRef, RandomState>>>,
}

impl InstanceDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &PyStrInterned) -> Option<PyObjectRef> {
        self.entries.read().get(name).cloned()
    }

    pub fn set(&self, name: &'static PyStrInterned, value: PyObjectRef) {
        self.entries.write().insert(name, value);
    }

    pub fn del(&self, name: &PyStrInterned) -> bool {
        self.entries.write().shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &PyStrInterned) -> bool {
        self.entries.read().contains_key(name)
    }
}

pub(crate) struct PyInner<T> {
    // `None` only during the narrow bootstrap window between constructing
    // `type_type` and wiring its self-referential class (constructed with
    // internal back-references nulled, wired after both exist, under the
    // factory lock); every object reachable outside
    // `TypeFactory::bootstrap` has `Some`.
    typ: PyRwLock<Option<PyTypeRef>>,
    dict: PyRwLock<Option<InstanceDict>>,
    payload: T,
}

/// Object-safe, type-erased facet every [`PyInner<T>`] implements; the
/// erasure boundary `PyObjectRef` is built on.
pub trait PyObjectDyn: Any + fmt::Debug + Send + Sync {
    /// Panics if called during the bootstrap window before a type's class
    /// has been wired; no code outside `TypeFactory::bootstrap` ever
    /// observes such an object.
    fn class_of(&self) -> PyTypeRef;
    fn set_class_of(&self, typ: PyTypeRef);
    fn dict_of(&self) -> Option<InstanceDict>;
    fn set_dict_of(&self, dict: Option<InstanceDict>);
    fn as_any(&self) -> &dyn Any;
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    /// The native payload's own [`TypeId`](std::any::TypeId) — `T`'s, not
    /// `PyInner<T>`'s. This is the id every [`Representation`](crate::registry::Representation)
    /// is registered under ([`crate::spec::NativeClassSpec::native_class`],
    /// the six hand-built descriptor types, `object`/`type` themselves), so
    /// it is the id every registry lookup must key on too — `Any::type_id`
    /// applied to [`PyObjectDyn::as_any`] would instead yield
    /// `TypeId::of::<PyInner<T>>()`, which the registry never binds
    /// anything under.
    fn payload_type_id(&self) -> std::any::TypeId;
}

impl<T: PyPayload> fmt::Debug for PyInner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PyInner").field("payload", &self.payload).finish()
    }
}

impl<T: PyPayload> PyObjectDyn for PyInner<T> {
    fn class_of(&self) -> PyTypeRef {
        self.typ
            .read()
            .clone()
            .expect("object's class read before bootstrap finished wiring it")
    }
    fn set_class_of(&self, typ: PyTypeRef) {
        *self.typ.write() = Some(typ);
    }
    fn dict_of(&self) -> Option<InstanceDict> {
        self.dict.read().clone()
    }
    fn set_dict_of(&self, dict: Option<InstanceDict>) {
        *self.dict.write() = dict;
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
    fn payload_type_id(&self) -> std::any::TypeId {
        std::any::TypeId::of::<T>()
    }
}

/// A dynamically typed Python object. Always accessed behind a reference
/// or [`PyObjectRef`]; never constructed directly.
pub type PyObject = dyn PyObjectDyn;

/// Shared ownership of a type-erased object, the pervasive currency type
/// of the runtime.
pub type PyObjectRef = Arc<PyObject>;

/// A statically- or dynamically-typed, shared-ownership handle to an
/// object known to carry payload `T`. `Py<T>` and `PyRef<T>` are the same
/// type; callers that need a non-owning borrow simply use `&Py<T>`.
pub struct PyRef<T> {
    inner: Arc<PyInner<T>>,
}

pub type Py<T> = PyRef<T>;

impl<T> Clone for PyRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: PyPayload> fmt::Debug for PyRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl<T: PyPayload> std::ops::Deref for PyRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.inner.payload
    }
}

impl<T: PyPayload> PyRef<T> {
    pub fn new_ref(payload: T, typ: PyTypeRef, dict: Option<InstanceDict>) -> Self {
        Self {
            inner: Arc::new(PyInner {
                typ: PyRwLock::new(Some(typ)),
                dict: PyRwLock::new(dict),
                payload,
            }),
        }
    }

    /// Builds a type whose class cannot be supplied yet (only `type_type`
    /// itself needs this: its class is itself, which doesn't exist until
    /// after this call returns). Callers must invoke [`PyRef::set_class`]
    /// with the finished type before the object is published to any
    /// other thread.
    pub fn new_ref_bootstrap(payload: T, dict: Option<InstanceDict>) -> Self {
        Self {
            inner: Arc::new(PyInner {
                typ: PyRwLock::new(None),
                dict: PyRwLock::new(dict),
                payload,
            }),
        }
    }

    pub fn class(&self) -> PyTypeRef {
        self.inner.class_of()
    }

    pub fn set_class(&self, typ: PyTypeRef) {
        self.inner.set_class_of(typ)
    }

    pub fn dict(&self) -> Option<InstanceDict> {
        self.inner.dict_of()
    }

    pub fn set_dict(&self, dict: Option<InstanceDict>) {
        self.inner.set_dict_of(dict)
    }

    pub fn is(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn as_object(&self) -> &PyObject {
        &*self.inner
    }

    pub fn into_ref(self) -> PyObjectRef {
        self.inner
    }

    /// Attempts to recover a typed handle from an erased [`PyObjectRef`].
    pub fn try_from_object(obj: &PyObjectRef) -> Option<Self> {
        obj.clone()
            .as_any_arc()
            .downcast::<PyInner<T>>()
            .ok()
            .map(|inner| Self { inner })
    }

    pub fn try_from_ref(obj: &PyObject) -> Option<&PyInner<T>>
    where
        T: 'static,
    {
        obj.as_any().downcast_ref::<PyInner<T>>()
    }
}

impl<T: PyPayload> From<PyRef<T>> for PyObjectRef {
    fn from(value: PyRef<T>) -> Self {
        value.inner
    }
}

/// Downcasts a borrowed, erased object reference to a typed payload
/// reference without cloning the `Arc`.
pub fn downcast_ref<T: PyPayload>(obj: &PyObject) -> Option<&T> {
    obj.as_any().downcast_ref::<PyInner<T>>().map(|inner| &inner.payload)
}

/// Downcasts an owned, erased object reference to a typed handle, keeping
/// the original reference available on mismatch (callers that don't need
/// it back can simply drop the `Err` arm).
pub fn downcast<T: PyPayload>(obj: PyObjectRef) -> Result<PyRef<T>, PyObjectRef> {
    match PyRef::<T>::try_from_object(&obj) {
        Some(typed) => Ok(typed),
        None => Err(obj),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_dict_starts_empty_and_round_trips() {
        use crate::intern::StringPool;
        let pool = StringPool::new();
        let name = pool.intern("x");
        let dict = InstanceDict::new();
        assert!(!dict.contains(name));
    }
}
