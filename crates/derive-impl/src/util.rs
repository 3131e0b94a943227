//! Small helpers for picking attribute-tagged items out of an `impl` block
//! and turning them into descriptor specs. Kept deliberately narrow: this
//! crate does not attempt to re-derive CPython's full argument-clinic
//! signature language (that lives behind [`FromArgs`]/`FuncArgs` and stays
//! an external collaborator per the core's scope) — every tagged function
//! must already match one of a handful of fixed calling conventions, and
//! the macro's only job is bookkeeping: strip the marker attribute, collect
//! the function's path, and record what kind of descriptor it feeds.

use syn::{Attribute, Ident, LitStr, Meta};

pub struct GetSetAttr {
    pub is_setter: bool,
    pub name: Option<String>,
}

pub struct SlotAttr {
    pub special: String,
}

pub struct MethodAttr {
    pub name: Option<String>,
}

/// Returns `Some` and removes the first attribute on `attrs` whose path is
/// `ident` (e.g. `pymethod`, `pygetset`, `pyslot`).
pub fn take_attr(attrs: &mut Vec<Attribute>, ident: &str) -> Option<Attribute> {
    let pos = attrs.iter().position(|a| a.path().is_ident(ident))?;
    Some(attrs.remove(pos))
}

pub fn parse_method_attr(attr: &Attribute) -> syn::Result<MethodAttr> {
    let name = match &attr.meta {
        Meta::Path(_) => None,
        Meta::List(_) => {
            let mut name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported pymethod argument"))
                }
            })?;
            name
        }
        Meta::NameValue(_) => None,
    };
    Ok(MethodAttr { name })
}

pub fn parse_getset_attr(attr: &Attribute) -> syn::Result<GetSetAttr> {
    let mut is_setter = false;
    let mut name = None;
    if let Meta::List(_) = &attr.meta {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("setter") {
                is_setter = true;
                Ok(())
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported pygetset argument"))
            }
        })?;
    }
    Ok(GetSetAttr { is_setter, name })
}

pub fn parse_slot_attr(attr: &Attribute) -> syn::Result<SlotAttr> {
    let mut special = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("special") {
            let value: LitStr = meta.value()?.parse()?;
            special = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("unsupported pyslot argument"))
        }
    })?;
    let special = special.ok_or_else(|| {
        syn::Error::new_spanned(attr, "#[pyslot] requires `special = \"SlotName\"`")
    })?;
    Ok(SlotAttr { special })
}

/// Python-attribute name implied by a setter function's Rust identifier:
/// `set_foo` -> `foo`, otherwise the identifier itself.
pub fn setter_implied_name(ident: &Ident) -> String {
    let s = ident.to_string();
    s.strip_prefix("set_").unwrap_or(&s).to_string()
}
