//! Core type system and object dispatch runtime: representations, the
//! type registry, `PyType`, descriptors, the type factory, and the
//! attribute/call protocol.
//!
//! This crate owns the type-system core of a Python-compatible
//! interpreter: representations, the type registry, `PyType`, descriptors,
//! the type factory, and the generic attribute/call protocol built on top
//! of them. Concrete built-in types (`int`, `str`, `list`, `dict`,
//! `float`), the bytecode compiler/interpreter, and the exception
//! hierarchy are external collaborators this crate depends on nothing
//! from.

pub mod builtins;
pub mod descriptor;
pub mod errors;
pub mod exposer;
pub mod factory;
pub mod function;
pub mod intern;
pub mod object;
pub mod protocol;
pub mod registry;
pub mod spec;
pub mod types;
pub mod vm;

pub use errors::{CoreError, PyException, PyResult};
pub use object::{downcast, downcast_ref, InstanceDict, Py, PyObject, PyObjectRef, PyPayload, PyRef};
pub use registry::{NativeClassKey, Representation, TypeRegistry};
pub use spec::{FrozenTypeSpec, TypeSpec};
pub use vm::{Context, FactoryConfig, VirtualMachine};
