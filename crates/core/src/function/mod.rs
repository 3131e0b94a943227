//! Call-site argument and native-method metadata (C4, C8).

pub mod argument;
pub mod method;

pub use argument::{FromArgs, FuncArgs, PySetterValue};
pub use method::{PyMethodDef, PyMethodFlags};
