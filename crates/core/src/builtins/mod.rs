//! The hand-written native classes the factory bootstraps or that this
//! core ships as a minimal demonstration of the attribute/call protocol
//! riding on top of real descriptors. Concrete numeric/text/
//! container built-ins (`int`, `str`, `list`, `dict`, `float`) are an
//! external collaborator and are not here.

pub mod descriptor_types;
pub mod object_;
pub mod type_;

pub use object_::PyBaseObject;
pub use type_::{PyType, PyTypeRef, TypeVariant};
