//! Expands `#[pyexpose] impl SomeNativeClass { ... }` into a clean inherent
//! `impl` block plus a `NativeClassExposition` implementation collecting
//! every `#[pymethod]`/`#[pygetset]`/`#[pyslot]`-tagged function into the
//! static description the type exposer walks at population time.
//!
//! No struct-level payload/flags parsing (the handful of built-in classes
//! this core ships wire `PyClassDef`/`PyClassImpl` by hand), and every
//! tagged function must already use one of the core's fixed calling
//! conventions rather than an arbitrary argument-clinic signature.

use std::collections::BTreeMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{ImplItem, ItemImpl, Type};

use crate::util::{
    parse_getset_attr, parse_method_attr, parse_slot_attr, setter_implied_name, take_attr,
};

struct GetSetEntry {
    getter: Option<syn::Ident>,
    setter: Option<syn::Ident>,
}

pub fn expand_pyexpose(mut item: ItemImpl) -> syn::Result<TokenStream> {
    let self_ty = (*item.self_ty).clone();

    let mut methods = Vec::new();
    let mut wrappers = Vec::new();
    let mut getsets: BTreeMap<String, GetSetEntry> = BTreeMap::new();

    for impl_item in item.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        if let Some(attr) = take_attr(&mut method.attrs, "pymethod") {
            let parsed = parse_method_attr(&attr)?;
            let ident = method.sig.ident.clone();
            let name = parsed.name.unwrap_or_else(|| ident.to_string());
            methods.push((name, ident));
            continue;
        }

        if let Some(attr) = take_attr(&mut method.attrs, "pygetset") {
            let parsed = parse_getset_attr(&attr)?;
            let ident = method.sig.ident.clone();
            let name = parsed.name.unwrap_or_else(|| {
                if parsed.is_setter {
                    setter_implied_name(&ident)
                } else {
                    ident.to_string()
                }
            });
            let entry = getsets.entry(name).or_insert(GetSetEntry {
                getter: None,
                setter: None,
            });
            if parsed.is_setter {
                entry.setter = Some(ident);
            } else {
                entry.getter = Some(ident);
            }
            continue;
        }

        if let Some(attr) = take_attr(&mut method.attrs, "pyslot") {
            let parsed = parse_slot_attr(&attr)?;
            let ident = method.sig.ident.clone();
            let special = format_ident!("{}", parsed.special);
            wrappers.push((special, ident));
        }
    }

    let method_entries = methods.iter().map(|(name, ident)| {
        quote! {
            ::pytype_core::exposer::MethodSpec {
                name: #name,
                doc: None,
                func: <#self_ty>::#ident,
            }
        }
    });

    let getset_entries = getsets.iter().map(|(name, entry)| {
        let getter = match &entry.getter {
            Some(ident) => quote! { Some(<#self_ty>::#ident) },
            None => quote! { None },
        };
        let setter = match &entry.setter {
            Some(ident) => quote! { Some(<#self_ty>::#ident) },
            None => quote! { None },
        };
        quote! {
            ::pytype_core::exposer::GetSetSpec {
                name: #name,
                getter: #getter,
                setter: #setter,
            }
        }
    });

    let wrapper_entries = wrappers.iter().map(|(special, ident)| {
        quote! {
            ::pytype_core::exposer::WrapperSpec {
                special: ::pytype_core::types::SpecialMethod::#special,
                func: <#self_ty>::#ident,
            }
        }
    });

    let expanded = quote! {
        #item

        impl ::pytype_core::exposer::NativeClassExposition for #self_ty {
            fn expose() -> ::pytype_core::exposer::ClassExposition {
                ::pytype_core::exposer::ClassExposition {
                    methods: ::std::vec![ #(#method_entries),* ],
                    getsets: ::std::vec![ #(#getset_entries),* ],
                    wrappers: ::std::vec![ #(#wrapper_entries),* ],
                }
            }
        }
    };
    Ok(expanded)
}

#[allow(dead_code)]
fn assert_is_impl(ty: &Type) -> bool {
    matches!(ty, Type::Path(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn collects_method_and_getset() {
        let item: ItemImpl = parse_quote! {
            impl Demo {
                #[pymethod]
                fn __repr__(zelf: &PyObject, args: FuncArgs, vm: &VirtualMachine) -> PyResult {
                    todo!()
                }

                #[pygetset]
                fn name(zelf: &PyObject, vm: &VirtualMachine) -> PyResult {
                    todo!()
                }

                #[pygetset(setter)]
                fn set_name(zelf: &PyObject, value: PyObjectRef, vm: &VirtualMachine) -> PyResult<()> {
                    todo!()
                }
            }
        };
        let expanded = expand_pyexpose(item).unwrap().to_string();
        assert!(expanded.contains("NativeClassExposition"));
        assert!(expanded.contains("\"__repr__\""));
        assert!(expanded.contains("\"name\""));
    }
}
