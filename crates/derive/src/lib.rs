//! Proc-macro entry points. Kept as a thin forwarding layer over
//! `pytype-derive-impl`, the way `rustpython-derive` forwards into
//! `rustpython-derive-impl`.

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemImpl};

/// Tags an `impl NativeClass { ... }` block whose `#[pymethod]`,
/// `#[pygetset]` and `#[pyslot]` functions should be collected into a
/// [`NativeClassExposition`](pytype_core::exposer::NativeClassExposition).
#[proc_macro_attribute]
pub fn pyexpose(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemImpl);
    match pytype_derive_impl::pyexpose::expand_pyexpose(item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
