//! TypeExposer: walks a native class's static description and
//! installs descriptors into a freshly built [`PyType`](crate::builtins::type_::PyType)'s
//! dict, while also filling the fast per-native-class slot table that
//! ends up in the [`Representation`](crate::registry::Representation)
//! the factory registers.
//!
//! Split in two because a type can have more than one self-class native
//! (adopted/accepted classes): [`populate_representation`] builds one
//! native's own slot table, while [`populate_dict`] walks every
//! self-class of the type *together* and merges same-named methods,
//! getsets, and wrappers into one descriptor per name before installing
//! it — so `(5).__add__(True)` and the canonical `int`-adopting-`bool`
//! case both dispatch through a single shared descriptor instead of the
//! last-populated native's install() call silently discarding the
//! others.

use ahash::RandomState;
use indexmap::IndexMap;

use crate::builtins::type_::PyTypeRef;
use crate::descriptor::getset::{GetSetEntry, GetterFunc, SetterFunc};
use crate::descriptor::method::{MethodEntry, MethodFunc};
use crate::descriptor::wrapper::WrapperEntry;
use crate::descriptor::{DescriptorCommon, PyGetSetDescriptor, PyMethodDescriptor, PyWrapperDescriptor};
use crate::function::method::NativeMethodFunc;
use crate::function::PyMethodFlags;
use crate::object::core::{PyObjectDyn, PyObjectRef, PyPayload, PyRef};
use crate::registry::NativeClassKey;
use crate::types::slot::{CallFunc, SlotFunc};
use crate::types::{PyTypeSlots, SpecialMethod};
use crate::vm::Context;

/// Implemented by every native payload that carries a static description
/// of its Python-visible surface (installed by `#[pyexpose]`).
pub trait NativeClassExposition: PyPayload {
    fn expose() -> ClassExposition;
}

/// `#[pyslot]`-tagged functions all share this call-compatible shape —
/// the same one `__call__`/binary operators use. Special methods with a
/// genuinely different native return type (`__repr__`, `__hash__`,
/// `__init__`, `__new__`, …) are attached directly through
/// [`crate::spec::TypeSpec`]'s dedicated builder methods instead of
/// through `#[pyslot]`, since one field can't hold heterogeneous
/// function-pointer types.
pub type SlotWrapperFunc = CallFunc;

pub struct MethodSpec {
    pub name: &'static str,
    pub doc: Option<&'static str>,
    pub func: NativeMethodFunc,
}

pub struct GetSetSpec {
    pub name: &'static str,
    pub getter: Option<GetterFunc>,
    pub setter: Option<SetterFunc>,
}

pub struct WrapperSpec {
    pub special: SpecialMethod,
    pub func: SlotWrapperFunc,
}

#[derive(Default)]
pub struct ClassExposition {
    pub methods: Vec<MethodSpec>,
    pub getsets: Vec<GetSetSpec>,
    pub wrappers: Vec<WrapperSpec>,
}

/// Covers the special methods `#[pyslot]` can't express uniformly
/// (`__repr__`/`__str__`/`__hash__`/`__init__`/`__new__`); the factory
/// passes these straight from [`crate::spec::NativeClassSpec`].
pub struct ExtraSlots {
    pub repr: Option<crate::types::slot::StringifyFunc>,
    pub str: Option<crate::types::slot::StringifyFunc>,
    pub hash: Option<crate::types::slot::HashFunc>,
    pub init: Option<crate::types::slot::InitFunc>,
    pub new: Option<(&'static str, Option<&'static str>, crate::types::slot::NewFunc)>,
}

/// Builds one self-class native's `Representation` slot table. Dict
/// installation is handled separately, once per type across every
/// self-class, by [`populate_dict`] — splitting the two is what lets a
/// name shared by more than one self-class end up as a single merged
/// descriptor instead of N descriptors each overwriting the last.
pub fn populate_representation(type_ref: &PyTypeRef, exposition: &ClassExposition, extra: &ExtraSlots) -> PyTypeSlots {
    let slots = PyTypeSlots::new(Box::leak(type_ref.name().to_string().into_boxed_str()));

    for wrapper in &exposition.wrappers {
        slots.set(wrapper.special, SlotFunc::Call(wrapper.func));
    }
    if let Some(f) = extra.repr {
        slots.set(SpecialMethod::Repr, SlotFunc::Repr(f));
    }
    if let Some(f) = extra.str {
        slots.set(SpecialMethod::Str, SlotFunc::Str(f));
    }
    if let Some(f) = extra.hash {
        slots.set(SpecialMethod::Hash, SlotFunc::Hash(f));
    }
    if let Some(f) = extra.init {
        slots.set(SpecialMethod::Init, SlotFunc::Init(f));
    }
    if let Some((_, _, f)) = extra.new {
        slots.set(SpecialMethod::New, SlotFunc::New(f));
    }
    slots
}

/// One self-class's contribution to a type's shared dict, as handed to
/// [`populate_dict`]. Carries only what the dict pass needs — the
/// per-native slot table itself is built separately by
/// [`populate_representation`].
pub struct NativeContribution<'a> {
    pub native_class: NativeClassKey,
    pub exposition: &'a ClassExposition,
    pub has_init: bool,
    pub new: Option<(&'static str, Option<&'static str>, crate::types::slot::NewFunc)>,
}

/// Installs the merged, type-wide dict entries for every self-class
/// native of one type in a single pass: multiple definitions of the same
/// name across self-classes accumulate into one descriptor. A method,
/// getset, or wrapper exposed under the same name by more than one
/// self-class (an adopted `HostBool` alongside its adopting `HostInt`
/// primary, for example) ends up as one descriptor whose per-self-class
/// table dispatches on the instance's actual native class, rather than as
/// several separately installed descriptors where the last `install()`
/// call silently wins.
pub fn populate_dict(ctx: &Context, type_ref: &PyTypeRef, natives: &[NativeContribution<'_>]) {
    let mut methods: IndexMap<&'static str, (Option<&'static str>, Vec<MethodEntry>), RandomState> =
        IndexMap::default();
    let mut getsets: IndexMap<&'static str, Vec<GetSetEntry>, RandomState> = IndexMap::default();
    let mut wrappers: IndexMap<SpecialMethod, Vec<WrapperEntry>, RandomState> = IndexMap::default();

    for native in natives {
        for method in &native.exposition.methods {
            let entry = methods.entry(method.name).or_insert_with(|| (method.doc, Vec::new()));
            if entry.0.is_none() {
                entry.0 = method.doc;
            }
            entry.1.push(MethodEntry {
                native_class: native.native_class,
                func: method.func,
            });
        }
        for getset in &native.exposition.getsets {
            getsets.entry(getset.name).or_default().push(GetSetEntry {
                native_class: native.native_class,
                getter: getset.getter,
                setter: getset.setter,
                deleter: None,
            });
        }
        for wrapper in &native.exposition.wrappers {
            wrappers.entry(wrapper.special).or_default().push(WrapperEntry {
                native_class: native.native_class,
                func: SlotFunc::Call(wrapper.func),
            });
        }
    }

    for (name, (doc, per_class)) in methods {
        let interned = ctx.intern_str(name);
        let descr = PyMethodDescriptor::new(
            DescriptorCommon::new(type_ref.clone(), interned, doc),
            MethodFunc::Instance {
                name,
                doc,
                flags: PyMethodFlags::DEFAULT,
                per_class,
            },
        );
        install(ctx, type_ref, interned, descr);
    }
    for (name, per_class) in getsets {
        let interned = ctx.intern_str(name);
        let descr = PyGetSetDescriptor::new(DescriptorCommon::new(type_ref.clone(), interned, None), per_class);
        install(ctx, type_ref, interned, descr);
    }
    for (special, per_class) in wrappers {
        let interned = ctx.intern_str(special.dunder_name());
        let descr = PyWrapperDescriptor::new(
            DescriptorCommon::new(type_ref.clone(), interned, None),
            special,
            per_class,
        );
        install(ctx, type_ref, interned, descr);
    }

    if natives.iter().any(|n| n.has_init) {
        let name = ctx.intern_str("__init__");
        let descr = PyMethodDescriptor::new(
            DescriptorCommon::new(type_ref.clone(), name, None),
            MethodFunc::Instance {
                name: "__init__",
                doc: None,
                flags: PyMethodFlags::DEFAULT,
                per_class: vec![MethodEntry {
                    // `__init__` is resolved dynamically from `zelf`'s own
                    // native class's own slot table rather than bound to
                    // one native here, since distinct self-classes can set
                    // distinct `__init__` slots; one shared proxy entry
                    // dispatches through the registry instead of needing
                    // its own per-class table.
                    native_class: natives[0].native_class,
                    func: |zelf, args, vm| {
                        let key = zelf.payload_type_id();
                        let f = vm
                            .ctx
                            .registry
                            .with(key, |rep| {
                                rep.and_then(|r| match r.slots().get(SpecialMethod::Init) {
                                    Some(SlotFunc::Init(f)) => Some(f),
                                    _ => None,
                                })
                            })
                            .expect("__init__ slot set by the factory that populated this class");
                        SlotFunc::Init(f).call(zelf, args, vm)
                    },
                }],
            },
        );
        install(ctx, type_ref, name, descr);
    }

    for native in natives {
        if let Some((name, doc, func)) = native.new {
            let interned = ctx.intern_str(name);
            let descr = PyMethodDescriptor::new(
                DescriptorCommon::new(type_ref.clone(), interned, doc),
                MethodFunc::New { name, doc, func },
            );
            install(ctx, type_ref, interned, descr);
        }
    }
}

fn install<T: PyPayload>(ctx: &Context, type_ref: &PyTypeRef, name: &'static crate::intern::PyStrInterned, payload: T) {
    let class = T::class(ctx);
    let obj: PyObjectRef = PyRef::new_ref(payload, class, None).into();
    type_ref.set_attr(name, obj);
}
