//! Small, dependency-light primitives shared by the type system core.
//!
//! Mirrors the split the wider interpreter ecosystem uses: a `common` crate
//! that the core depends on for locking and process-lifetime statics, kept
//! free of anything Python-specific so it can be unit tested in isolation.

pub mod hash;
pub mod lock;
pub mod static_cell;
