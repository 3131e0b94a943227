//! TypeFactory: the single choke point through which every `PyType`
//! is built and every `Representation` is published.
//!
//! `bootstrap` builds `object`/`type` by hand before anything else can
//! exist, under the same "bootstrap everything once, under one lock"
//! sequencing the rest of the factory follows. The reentrant publication
//! lock and deferred workshop queue exist because a native class's
//! exposer can recursively call back into `from_spec` (for example to
//! intern a nested class) while its own type is mid-construction, and
//! that must not deadlock the thread already holding the lock.

use std::collections::VecDeque;

use pytype_common::lock::{PyMutex, ReentrantLock};

use crate::builtins::type_::{PyType, PyTypeRef, TypeVariant};
use crate::errors::CoreError;
use crate::exposer::{self, ExtraSlots, NativeContribution};
use crate::object::core::{PyObjectDyn, PyRef};
use crate::registry::{Representation, SelfClassIndex, TypeRegistry};
use crate::spec::FrozenTypeSpec;
use crate::types::PyTypeFlags;
use crate::vm::Context;

pub struct TypeFactory {
    lock: ReentrantLock,
    depth: PyMutex<u32>,
    workshop: PyMutex<VecDeque<Representation>>,
    next_representation_key: PyMutex<u64>,
}

impl Default for TypeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeFactory {
    pub fn new() -> Self {
        Self {
            lock: ReentrantLock::new(),
            depth: PyMutex::new(0),
            workshop: PyMutex::new(VecDeque::new()),
            next_representation_key: PyMutex::new(0),
        }
    }

    /// Hand-builds `type` and `object`, the two types every other type
    /// eventually rests on: `type(type) is type`, `type(object) is type`,
    /// `object` has no bases. Must run exactly once, before any call to
    /// [`TypeFactory::from_spec`].
    ///
    /// Deliberately does not touch `registry`: their
    /// [`Representation`]s are registered once by
    /// `crate::builtins::object_::init`, after the six descriptor types
    /// exist and [`crate::exposer::populate_dict`]/[`crate::exposer::populate_representation`]
    /// can build real method/slot tables for them instead of the
    /// placeholder-then-patch approach a two-phase registration would need.
    pub fn bootstrap(&self, _registry: &TypeRegistry) -> (PyTypeRef, PyTypeRef) {
        let _guard = self.lock.acquire();
        log::debug!("bootstrapping 'type' and 'object'");

        let type_flags = PyTypeFlags::DEFAULT | PyTypeFlags::BASETYPE | PyTypeFlags::TYPE_SUBCLASS;
        let type_payload = PyType::new_bare("type", type_flags, TypeVariant::Simple);
        let type_ref: PyTypeRef = PyRef::new_ref_bootstrap(type_payload, None);
        type_ref.set_class(type_ref.clone());

        let object_flags = PyTypeFlags::DEFAULT | PyTypeFlags::BASETYPE;
        let object_payload = PyType::new_bare("object", object_flags, TypeVariant::Simple);
        let object_ref = PyRef::new_ref(object_payload, type_ref.clone(), None);

        type_ref.set_bases(vec![object_ref.clone()]);
        object_ref.set_bases(vec![]);
        type_ref.set_mro(
            PyType::linearise_mro(type_ref.clone(), &[object_ref.clone()])
                .expect("type/object bootstrap MRO never conflicts"),
        );
        object_ref.set_mro(
            PyType::linearise_mro(object_ref.clone(), &[]).expect("object's own MRO is always just itself"),
        );

        (type_ref, object_ref)
    }

    /// `from_spec(spec) -> type`. Reentrant: a
    /// nested call from within an exposer's own population logic is safe
    /// and simply defers its Representation to the same batch the
    /// outermost call publishes.
    pub fn from_spec(&self, ctx: &Context, spec: crate::spec::TypeSpec) -> Result<PyTypeRef, CoreError> {
        let frozen = spec.freeze()?;
        self.from_frozen_spec(ctx, frozen)
    }

    pub fn from_frozen_spec(&self, ctx: &Context, spec: FrozenTypeSpec) -> Result<PyTypeRef, CoreError> {
        let _guard = self.lock.acquire();
        log::trace!("from_frozen_spec('{}')", spec.name());
        let is_outermost = {
            let mut depth = self.depth.lock();
            let was_zero = *depth == 0;
            *depth += 1;
            was_zero
        };

        let built = self.build(ctx, spec);

        {
            let mut depth = self.depth.lock();
            *depth -= 1;
        }

        if is_outermost {
            if built.is_ok() {
                self.finish(&ctx.registry)?;
            } else {
                self.discard();
            }
        }
        built
    }

    fn build(&self, ctx: &Context, spec: FrozenTypeSpec) -> Result<PyTypeRef, CoreError> {
        let (name, bases, explicit_metaclass, flags, natives, accepted) = spec.into_parts();

        let metaclass = PyType::calculate_meta_class(explicit_metaclass, &bases, |b| ctx.registry.with(
            b.as_object().payload_type_id(),
            |rep| rep.map(|r| r.python_type(b.as_object())).unwrap_or_else(|| ctx.types.type_type.clone()),
        ))
        .unwrap_or_else(|_| ctx.types.type_type.clone());

        let is_replaceable = flags.has_feature(PyTypeFlags::REPLACEABLE);
        if is_replaceable && natives.len() != 1 {
            return Err(CoreError::InternalError(format!(
                "type '{name}' is REPLACEABLE but declares {} native self-classes (exactly one expected)",
                natives.len()
            )));
        }
        let is_adoptive = !is_replaceable && (natives.len() > 1 || !accepted.is_empty());

        // REPLACEABLE: build or reuse the SharedRepresentation for this
        // native class. The first type in a
        // mutually-replaceable group publishes it; every later sibling
        // that names the same native class just reads the key back off
        // the already-published Representation rather than clashing with
        // it (registry.register_all would otherwise reject a second
        // binding for the same native class).
        let shared_key = is_replaceable.then(|| {
            let native_class = natives[0].native_class;
            ctx.registry
                .with(native_class, |rep| rep.map(|r| r.index() as u64))
                .unwrap_or_else(|| self.next_representation_key())
        });

        let variant = if let Some(key) = shared_key {
            TypeVariant::Replaceable { representation_key: key }
        } else if is_adoptive {
            TypeVariant::Adoptive {
                self_classes: natives
                    .iter()
                    .enumerate()
                    .map(|(index, n)| SelfClassIndex {
                        native_class: n.native_class,
                        index,
                    })
                    .collect(),
                accepted: accepted.clone(),
            }
        } else {
            TypeVariant::Simple
        };

        let payload = PyType::new_bare(name, flags, variant);
        let type_ref = PyRef::new_ref(payload, metaclass, None);

        let effective_bases = if bases.is_empty() {
            vec![ctx.types.object_type.clone()]
        } else {
            bases
        };
        type_ref.set_bases(effective_bases.clone());
        let mro = PyType::linearise_mro(type_ref.clone(), &effective_bases)?;
        type_ref.set_mro(mro);

        let already_shared = is_replaceable && ctx.registry.contains(natives[0].native_class);

        // Merge same-named methods/getsets/wrappers across every self-class
        // native before installing anything, so a name shared by more than
        // one self-class ends up as one descriptor with a
        // per-self-class dispatch table instead of each native's install()
        // overwriting the last.
        let contributions: Vec<NativeContribution> = natives
            .iter()
            .map(|native| NativeContribution {
                native_class: native.native_class,
                exposition: &native.exposition,
                has_init: native.init.is_some(),
                new: native.new,
            })
            .collect();
        exposer::populate_dict(ctx, &type_ref, &contributions);

        for (index, native) in natives.into_iter().enumerate() {
            let extra = ExtraSlots {
                repr: native.repr,
                str: native.str,
                hash: native.hash,
                init: native.init,
                new: native.new,
            };
            let slots = exposer::populate_representation(&type_ref, &native.exposition, &extra);

            if is_replaceable {
                if !already_shared {
                    self.workshop.lock().push_back(Representation::Shared {
                        native_class: native.native_class,
                        slots,
                        index: shared_key.expect("is_replaceable implies shared_key is Some") as usize,
                    });
                }
                continue;
            }

            let rep = if is_adoptive {
                Representation::Adopted {
                    native_class: native.native_class,
                    slots,
                    index,
                    type_ref: type_ref.clone(),
                }
            } else {
                Representation::Simple {
                    native_class: native.native_class,
                    slots,
                    type_ref: type_ref.clone(),
                }
            };
            self.workshop.lock().push_back(rep);
        }

        Ok(type_ref)
    }

    /// Allocates the shared key two or more [`TypeSpec`](crate::spec::TypeSpec)s
    /// register under when they're meant to be mutually replaceable
    /// (`__class__` reassignment between them).
    pub fn next_representation_key(&self) -> u64 {
        let mut key = self.next_representation_key.lock();
        let value = *key;
        *key += 1;
        value
    }

    /// Drains the workshop and publishes everything accumulated during
    /// this (possibly reentrant) call tree atomically, as one batch.
    fn finish(&self, registry: &TypeRegistry) -> Result<(), CoreError> {
        let batch: Vec<Representation> = {
            let mut workshop = self.workshop.lock();
            workshop.drain(..).collect()
        };
        if batch.is_empty() {
            return Ok(());
        }
        registry.register_all(batch)
    }

    /// Drops everything queued during a top-level transaction that failed:
    /// a reentrant nested `from_spec` call may have already pushed its
    /// representations onto the workshop before the outer build errored
    /// out, and none of that partial state may survive.
    fn discard(&self) {
        self.workshop.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_factory_starts_at_depth_zero() {
        let factory = TypeFactory::new();
        assert_eq!(*factory.depth.lock(), 0);
    }

    #[test]
    fn representation_keys_are_distinct_and_increasing() {
        let factory = TypeFactory::new();
        let a = factory.next_representation_key();
        let b = factory.next_representation_key();
        assert!(b > a);
    }
}
