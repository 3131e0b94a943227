//! The process-wide bootstrap context (`Context`) and the thin per-call
//! facade (`VirtualMachine`) that special-method implementations receive.
//!
//! The bytecode interpreter itself is an external collaborator; what
//! lives here is only the handful of things the type system core needs
//! threaded through every call site: the registry, the intern pool, the
//! factory, the two bootstrap types, and the `None` singleton.

use crate::builtins::object_::PyBaseObject;
use crate::builtins::type_::PyTypeRef;
use crate::errors::{ErrorKind, PyException, PyResult};
use crate::factory::TypeFactory;
use crate::intern::{PyStrInterned, StringPool};
use crate::object::core::{PyObject, PyObjectDyn, PyObjectRef, PyPayload, PyRef};
use crate::registry::TypeRegistry;

/// The two bootstrap types plus anything else the core itself needs a
/// fixed handle to. The six descriptor
/// types are hand-built alongside `object`/`type` rather than
/// through `TypeFactory::from_spec`, since nothing in this core ever
/// needs to subclass them from Python-level code.
pub struct BuiltinTypes {
    pub type_type: PyTypeRef,
    pub object_type: PyTypeRef,
    pub member_descriptor: PyTypeRef,
    pub getset_descriptor: PyTypeRef,
    pub wrapper_descriptor: PyTypeRef,
    pub method_wrapper: PyTypeRef,
    pub method_descriptor: PyTypeRef,
    pub bound_method: PyTypeRef,
}

/// The core has no environment variables or CLI surface, so the only
/// thing worth exposing to an embedder is a constructor parameter for
/// the registry's initial capacity, rather than a global or an env
/// lookup.
#[derive(Debug, Clone, Copy)]
pub struct FactoryConfig {
    pub registry_capacity: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self { registry_capacity: 0 }
    }
}

/// Process-lifetime state: the registry, the intern pool, the
/// factory, and the bootstrap types. Built once by [`Context::new`]
/// and then shared by reference everywhere.
pub struct Context {
    pub registry: TypeRegistry,
    pub strings: StringPool,
    pub factory: TypeFactory,
    pub types: BuiltinTypes,
    pub none: PyObjectRef,
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        let registry = TypeRegistry::with_capacity(config.registry_capacity);
        let strings = StringPool::new();
        let factory = TypeFactory::new();

        let (type_type, object_type) = factory.bootstrap(&registry);
        let descriptor_types =
            crate::builtins::descriptor_types::bootstrap(&registry, &object_type, &type_type);
        let types = BuiltinTypes {
            type_type,
            object_type: object_type.clone(),
            member_descriptor: descriptor_types.member_descriptor,
            getset_descriptor: descriptor_types.getset_descriptor,
            wrapper_descriptor: descriptor_types.wrapper_descriptor,
            method_wrapper: descriptor_types.method_wrapper,
            method_descriptor: descriptor_types.method_descriptor,
            bound_method: descriptor_types.bound_method,
        };

        let none = PyRef::new_ref(PyBaseObject, object_type, None).into();

        let ctx = Self {
            registry,
            strings,
            factory,
            types,
            none,
        };
        crate::builtins::object_::init(&ctx);
        ctx
    }

    pub fn intern_str(&self, s: impl AsRef<str>) -> &'static PyStrInterned {
        self.strings.intern(s)
    }

    pub fn none(&self) -> PyObjectRef {
        self.none.clone()
    }

    /// `from_spec(spec) → type`.
    pub fn define_type(&self, spec: crate::spec::TypeSpec) -> Result<PyTypeRef, crate::errors::CoreError> {
        self.factory.from_spec(self, spec)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call facade threaded through every special-method and descriptor
/// invocation. Exists mainly to give call sites a stable place to build
/// exceptions from; every slot function takes `&VirtualMachine` rather
/// than the bare context.
pub struct VirtualMachine {
    pub ctx: Context,
}

impl VirtualMachine {
    pub fn new() -> Self {
        Self { ctx: Context::new() }
    }

    pub fn none(&self) -> PyObjectRef {
        self.ctx.none()
    }

    pub fn is_none(&self, obj: &PyObject) -> bool {
        std::ptr::eq(obj, &*self.ctx.none as *const PyObject)
    }

    pub fn new_type_error(&self, message: impl Into<String>) -> PyException {
        PyException::type_error(message)
    }

    pub fn new_attribute_error(&self, message: impl Into<String>) -> PyException {
        PyException::attribute_error(message)
    }

    pub fn new_no_attribute_error(&self, obj: &PyObject, name: &str) -> PyException {
        PyException::attribute_error(format!(
            "'{}' object has no attribute '{}'",
            self.type_name_of(obj),
            name
        ))
    }

    pub fn stop_iteration(&self) -> PyException {
        PyException::stop_iteration()
    }

    /// `type(obj)`, resolved through the registry rather than a
    /// field on the object itself, via the registry's `python_type`.
    pub fn type_of(&self, obj: &PyObject) -> PyTypeRef {
        let key = obj.payload_type_id();
        self.ctx.registry.with(key, |rep| match rep {
            Some(rep) => rep.python_type(obj),
            None => self.ctx.types.object_type.clone(),
        })
    }

    pub fn type_name_of(&self, obj: &PyObject) -> String {
        self.type_of(obj).name().to_string()
    }

    pub fn is_instance(&self, obj: &PyObject, cls: &PyTypeRef) -> bool {
        let ty = self.type_of(obj);
        ty.is(cls) || ty.is_subtype_of(cls, &ty)
    }

    pub fn is_subclass(&self, derived: &PyTypeRef, base: &PyTypeRef) -> bool {
        derived.is(base) || derived.is_subtype_of(base, derived)
    }

    pub fn repr(&self, obj: &PyObject) -> PyResult<String> {
        crate::protocol::repr(obj, self)
    }

    pub fn str(&self, obj: &PyObject) -> PyResult<String> {
        crate::protocol::str(obj, self)
    }

    pub fn hash(&self, obj: &PyObject) -> PyResult<crate::types::slot::PyHash> {
        crate::protocol::hash(obj, self)
    }

    pub fn get_attr(&self, obj: &PyObjectRef, name: &'static PyStrInterned) -> PyResult {
        crate::protocol::getattribute(obj, name, self)
    }

    pub fn lookup_attr(&self, obj: &PyObjectRef, name: &'static PyStrInterned) -> PyResult<Option<PyObjectRef>> {
        match crate::protocol::getattribute(obj, name, self) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind == ErrorKind::AttributeError => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set_attr(&self, obj: &PyObjectRef, name: &'static PyStrInterned, value: PyObjectRef) -> PyResult<()> {
        crate::protocol::setattr(obj, name, value, self)
    }

    pub fn del_attr(&self, obj: &PyObjectRef, name: &'static PyStrInterned) -> PyResult<()> {
        crate::protocol::delattr(obj, name, self)
    }

    pub fn call(&self, obj: &PyObjectRef, args: crate::function::FuncArgs) -> PyResult {
        crate::protocol::call(obj, args, self)
    }

    /// `obj.__class__ = new_type`.
    pub fn set_class(&self, obj: &PyObjectRef, new_type: PyTypeRef) -> PyResult<()> {
        crate::protocol::set_class(obj, new_type, self)
    }

    /// `iter(obj)`.
    pub fn iter(&self, obj: PyObjectRef) -> PyResult {
        crate::protocol::iter(obj, self)
    }

    /// `next(iterator)`.
    pub fn next(&self, iterator: &PyObjectRef) -> PyResult {
        crate::protocol::next(iterator, self)
    }

    /// `id(obj)`.
    pub fn id(&self, obj: &PyObject) -> usize {
        crate::protocol::id(obj)
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}
