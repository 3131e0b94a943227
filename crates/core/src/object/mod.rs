//! The object representation layer: the erased
//! `PyObjectRef` currency type and the attribute/call protocol built on
//! top of it.

pub mod core;
pub mod ext;

pub use self::core::{downcast, downcast_ref, InstanceDict, Py, PyObject, PyObjectDyn, PyPayload, PyRef};

/// Re-exported at the module root so the rest of the crate can write
/// `crate::object::PyObjectRef` uniformly instead of reaching into the
/// `core` submodule by name.
pub type PyObjectRef = self::core::PyObjectRef;
