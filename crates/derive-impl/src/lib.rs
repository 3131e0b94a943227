//! Logic shared by the `pytype-derive` proc-macro crate: this half does
//! the actual `syn`/`quote` work and is unit-testable on its own; the thin
//! proc-macro crate just forwards `TokenStream`s into it.

pub mod pyexpose;
pub mod util;
