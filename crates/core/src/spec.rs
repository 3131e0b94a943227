//! `TypeSpec`: the mutable builder a caller assembles before handing
//! it to [`crate::factory::TypeFactory::from_spec`], and `FrozenTypeSpec`,
//! its immutable, validated form.
//!
//! This core defines types dynamically at runtime rather than once per
//! `static` at link time, so the builder is a runtime value rather than a
//! compile-time declaration.
//!
//! `freeze()` is deliberately *not* a runtime flag check: it consumes
//! `self`, so no mutator method can be called again afterwards — the
//! "frozen" invariant is enforced by the borrow checker rather than by an
//! `is_frozen` bool inspected on every setter.

use crate::builtins::type_::PyTypeRef;
use crate::errors::CoreError;
use crate::exposer::{ClassExposition, NativeClassExposition};
use crate::object::core::PyPayload;
use crate::registry::NativeClassKey;
use crate::types::slot::{HashFunc, InitFunc, NewFunc, StringifyFunc};
use crate::types::PyTypeFlags;

/// Capability granting a [`TypeSpec`] reflective access to a native
/// class's private members. This core's native classes declare their
/// exposed surface statically through [`NativeClassExposition`] rather
/// than through runtime reflection, so the credential carries no
/// capability of its own here — it exists so a caller states, in the
/// type system, that it is the trusted definer of this spec.
#[derive(Debug, Clone, Copy)]
pub struct LookupCredential(());

impl LookupCredential {
    /// Only a spec's own trusted definer should call this.
    pub fn grant() -> Self {
        Self(())
    }
}

/// One native Rust payload backing (part of) the type being defined.
/// The first pushed onto a [`TypeSpec`] is the primary self-class; any
/// further ones make the type adoptive.
pub struct NativeClassSpec {
    pub native_class: NativeClassKey,
    pub exposition: ClassExposition,
    pub repr: Option<StringifyFunc>,
    pub str: Option<StringifyFunc>,
    pub hash: Option<HashFunc>,
    pub init: Option<InitFunc>,
    pub new: Option<(&'static str, Option<&'static str>, NewFunc)>,
}

impl NativeClassSpec {
    fn new<T: NativeClassExposition>() -> Self {
        Self {
            native_class: std::any::TypeId::of::<T>(),
            exposition: T::expose(),
            repr: None,
            str: None,
            hash: None,
            init: None,
            new: None,
        }
    }
}

pub struct TypeSpec {
    name: String,
    lookup_credential: Option<LookupCredential>,
    canonical_base: Option<PyTypeRef>,
    bases: Vec<PyTypeRef>,
    metaclass: Option<PyTypeRef>,
    flags: PyTypeFlags,
    natives: Vec<NativeClassSpec>,
    /// Classes accepted as `self` for method dispatch without owning a
    /// `Representation`/per-self-class slot table of their own. Distinct
    /// from `natives`, whose entries are each adopted and do own a
    /// Representation.
    accepted: Vec<NativeClassKey>,
    slots: Vec<&'static str>,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lookup_credential: None,
            canonical_base: None,
            bases: Vec::new(),
            metaclass: None,
            flags: PyTypeFlags::DEFAULT,
            natives: Vec::new(),
            accepted: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Vouches that the caller is the spec's trusted definer.
    pub fn with_lookup_credential(mut self, credential: LookupCredential) -> Self {
        self.lookup_credential = Some(credential);
        self
    }

    /// The native class from which subclass representations inherit in
    /// the host runtime.
    pub fn with_canonical_base(mut self, base: PyTypeRef) -> Self {
        self.canonical_base = Some(base);
        self
    }

    pub fn with_base(mut self, base: PyTypeRef) -> Self {
        self.bases.push(base);
        self
    }

    pub fn with_bases(mut self, bases: Vec<PyTypeRef>) -> Self {
        self.bases = bases;
        self
    }

    pub fn with_metaclass(mut self, metaclass: PyTypeRef) -> Self {
        self.metaclass = Some(metaclass);
        self
    }

    pub fn with_flags(mut self, flags: PyTypeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// `__slots__`: named instance fields the type reserves in lieu of,
    /// or alongside, a `__dict__`. This core stores the declared names
    /// for introspection; actual per-instance storage is the host
    /// representation's concern.
    pub fn with_slots(mut self, slots: Vec<&'static str>) -> Self {
        self.slots = slots;
        self
    }

    /// Registers `T` as a primary or adopted self-class. The first call
    /// makes the type `Simple`; a second or later call makes it
    /// `Adoptive`, with the self-class list ordered primary first, then
    /// adopted classes.
    pub fn with_native<T: NativeClassExposition>(mut self) -> Self {
        self.natives.push(NativeClassSpec::new::<T>());
        self
    }

    /// Registers `T` as an *accepted* self-class: `T` is a valid `self`
    /// for this type's methods, but — unlike an adopted class — doesn't
    /// own its own `Representation`; method/getset/wrapper selection
    /// falls back to the sole applicable implementation rather than
    /// indexing a per-class table entry for it.
    pub fn accept<T: PyPayload>(mut self) -> Self {
        self.accepted.push(std::any::TypeId::of::<T>());
        self
    }

    /// Attaches `__repr__`/`__str__`/`__hash__`/`__init__`/`__new__` to
    /// the most-recently-added native class. These special methods have
    /// native return types (`String`, `PyHash`, `()`, a fresh instance)
    /// that can't be expressed in `#[pyslot]`'s uniform
    /// `FuncArgs → PyObjectRef` shape, so they're attached directly
    /// rather than discovered through `NativeClassExposition`.
    pub fn with_repr(mut self, f: StringifyFunc) -> Self {
        self.last_native_mut().repr = Some(f);
        self
    }

    pub fn with_str(mut self, f: StringifyFunc) -> Self {
        self.last_native_mut().str = Some(f);
        self
    }

    pub fn with_hash(mut self, f: HashFunc) -> Self {
        self.last_native_mut().hash = Some(f);
        self
    }

    pub fn with_init(mut self, f: InitFunc) -> Self {
        self.last_native_mut().init = Some(f);
        self
    }

    pub fn with_new(mut self, name: &'static str, doc: Option<&'static str>, f: NewFunc) -> Self {
        self.last_native_mut().new = Some((name, doc, f));
        self
    }

    fn last_native_mut(&mut self) -> &mut NativeClassSpec {
        self.natives
            .last_mut()
            .expect("with_repr/with_str/with_hash/with_init/with_new called before with_native")
    }

    /// Validates and locks the spec. Consumes `self`: once frozen, no
    /// mutator above can be invoked again, because there is no longer a
    /// `TypeSpec` to call them on.
    ///
    /// Checks, in order: name non-empty; at least one native self-class; no native class
    /// adopted or accepted twice; if `BASETYPE` then a canonical base is
    /// given; a given canonical base must itself allow subclassing
    /// (`BASETYPE`) — this core's reading of "canonical base assignable
    /// from primary", since primary/canonical-base compatibility in the
    /// source is a host-runtime native-inheritance check this core has
    /// no native-runtime model of.
    pub fn freeze(self) -> Result<FrozenTypeSpec, CoreError> {
        if self.name.is_empty() {
            return Err(CoreError::InternalError("type name must not be empty".into()));
        }
        if self.natives.is_empty() {
            return Err(CoreError::InternalError(format!(
                "type '{}' declares no native self-class",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.natives.len() + self.accepted.len());
        for native in &self.natives {
            if !seen.insert(native.native_class) {
                return Err(CoreError::InternalError(format!(
                    "type '{}' adopts the same native class twice",
                    self.name
                )));
            }
        }
        for accepted in &self.accepted {
            if !seen.insert(*accepted) {
                return Err(CoreError::InternalError(format!(
                    "type '{}' accepts a native class already adopted or accepted",
                    self.name
                )));
            }
        }

        if self.flags.has_feature(PyTypeFlags::BASETYPE) && self.canonical_base.is_none() {
            return Err(CoreError::InternalError(format!(
                "type '{}' is BASETYPE but declares no canonical base",
                self.name
            )));
        }
        if let Some(canonical_base) = &self.canonical_base {
            if !canonical_base.has_feature(PyTypeFlags::BASETYPE) {
                return Err(CoreError::InternalError(format!(
                    "type '{}' canonical base '{}' does not allow subclassing",
                    self.name,
                    canonical_base.name()
                )));
            }
        }

        Ok(FrozenTypeSpec(self))
    }
}

/// An already-validated [`TypeSpec`]. `freeze` is idempotent: freezing a
/// frozen spec again just hands the same value back.
pub struct FrozenTypeSpec(TypeSpec);

impl FrozenTypeSpec {
    pub fn freeze(self) -> Result<Self, CoreError> {
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn bases(&self) -> &[PyTypeRef] {
        &self.0.bases
    }

    pub fn metaclass(&self) -> Option<&PyTypeRef> {
        self.0.metaclass.as_ref()
    }

    pub fn flags(&self) -> PyTypeFlags {
        self.0.flags
    }

    pub fn natives(&self) -> &[NativeClassSpec] {
        &self.0.natives
    }

    pub fn accepted(&self) -> &[NativeClassKey] {
        &self.0.accepted
    }

    pub fn canonical_base(&self) -> Option<&PyTypeRef> {
        self.0.canonical_base.as_ref()
    }

    pub fn lookup_credential(&self) -> Option<LookupCredential> {
        self.0.lookup_credential
    }

    pub fn slots(&self) -> &[&'static str] {
        &self.0.slots
    }

    /// The classes whose method implementations actually populate the
    /// type's dict — every adopted/primary native, since accepted classes
    /// (`accepted()`) contribute no implementation of their own.
    pub fn method_impl(&self) -> Vec<NativeClassKey> {
        self.0.natives.iter().map(|n| n.native_class).collect()
    }

    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        String,
        Vec<PyTypeRef>,
        Option<PyTypeRef>,
        PyTypeFlags,
        Vec<NativeClassSpec>,
        Vec<NativeClassKey>,
    ) {
        (
            self.0.name,
            self.0.bases,
            self.0.metaclass,
            self.0.flags,
            self.0.natives,
            self.0.accepted,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy;

    impl PyPayload for Dummy {
        fn class(ctx: &crate::vm::Context) -> PyTypeRef {
            ctx.types.object_type.clone()
        }
    }

    impl NativeClassExposition for Dummy {
        fn expose() -> ClassExposition {
            ClassExposition {
                methods: Vec::new(),
                getsets: Vec::new(),
                wrappers: Vec::new(),
            }
        }
    }

    #[test]
    fn freeze_rejects_empty_name() {
        let spec = TypeSpec::new("").with_native::<Dummy>();
        assert!(spec.freeze().is_err());
    }

    #[test]
    fn freeze_rejects_no_native_class() {
        let spec = TypeSpec::new("Empty");
        assert!(spec.freeze().is_err());
    }

    #[test]
    fn freeze_is_idempotent() {
        let spec = TypeSpec::new("Demo").with_native::<Dummy>();
        let frozen = spec.freeze().unwrap();
        let frozen_again = frozen.freeze().unwrap();
        assert_eq!(frozen_again.name(), "Demo");
    }
}
