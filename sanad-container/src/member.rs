//! Member discovery: which constructor and which members a type exposes
//! for injection.
//!
//! A type describes itself by implementing [`Injectable`], usually through
//! `#[derive(Injectable)]`. The injector never calls that trait directly.
//! It asks a [`MemberResolver`], and the default resolver, [`TypeTable`],
//! answers from explicit registrations plus the registrations the derive
//! submits at link time.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::error::{BoxError, Result, SanadError};
use crate::instance::{Dependency, Instance, extract};
use crate::key::{Key, ResolvableKey};

/// A type the container knows how to build and inject.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sanad_container::member::{Injectable, InjectableConstructor};
/// use sanad_container::key::ResolvableKey;
///
/// struct Config;
/// struct Server {
///     config: Arc<Config>,
/// }
///
/// impl Injectable for Server {
///     fn constructor() -> Option<InjectableConstructor> {
///         Some(InjectableConstructor::of::<Self, _>(
///             vec![ResolvableKey::of::<Arc<Config>>(None)],
///             |args| Ok(Server { config: args.next()? }),
///         ))
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The constructor to use, or `None` if the type cannot be built by
    /// the container.
    fn constructor() -> Option<InjectableConstructor> {
        None
    }

    /// Members injected after construction, in declaration order.
    fn members() -> Vec<InjectableMember> {
        Vec::new()
    }
}

type ConstructFn =
    dyn Fn(&mut Arguments) -> std::result::Result<Box<dyn Any + Send + Sync>, BoxError> + Send + Sync;

/// A discovered injectable constructor: its ordered parameter keys plus the
/// construction primitive.
pub struct InjectableConstructor {
    declaring: TypeId,
    declaring_name: &'static str,
    params: Vec<ResolvableKey>,
    construct: Box<ConstructFn>,
    seal: fn(Box<dyn Any + Send + Sync>) -> Option<Instance>,
}

impl InjectableConstructor {
    /// Declares a constructor for `T`.
    ///
    /// `construct` reads its arguments from [`Arguments`] in the order of
    /// `params`, followed by any caller-supplied extras.
    pub fn of<T, F>(params: Vec<ResolvableKey>, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Arguments) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            declaring: TypeId::of::<T>(),
            declaring_name: type_name::<T>(),
            params,
            construct: Box::new(move |args: &mut Arguments| {
                construct(args).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
            seal: |raw: Box<dyn Any + Send + Sync>| {
                raw.downcast::<T>()
                    .ok()
                    .map(|value| Instance::new::<T>(Arc::from(value)))
            },
        }
    }

    #[inline]
    pub fn declaring_type(&self) -> TypeId {
        self.declaring
    }

    #[inline]
    pub fn declaring_name(&self) -> &'static str {
        self.declaring_name
    }

    /// Declared parameters, excluding caller-supplied extras.
    #[inline]
    pub fn params(&self) -> &[ResolvableKey] {
        &self.params
    }

    pub(crate) fn construct(
        &self,
        args: &mut Arguments,
    ) -> std::result::Result<Box<dyn Any + Send + Sync>, BoxError> {
        (self.construct)(args)
    }

    pub(crate) fn seal(&self, raw: Box<dyn Any + Send + Sync>) -> Option<Instance> {
        (self.seal)(raw)
    }
}

impl fmt::Debug for InjectableConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableConstructor")
            .field("declaring", &self.declaring_name)
            .field("params", &self.params)
            .finish()
    }
}

struct Slot {
    key: Option<Key>,
    value: Option<Instance>,
}

/// The populated parameter list handed to a construction primitive.
///
/// Declared parameters come first, in declaration order, then the extras.
/// An optional parameter that resolved to nothing reads as `None`.
pub struct Arguments {
    declaring: &'static str,
    slots: std::vec::IntoIter<Slot>,
}

impl Arguments {
    pub(crate) fn new(
        declaring: &'static str,
        resolved: Vec<(Key, Option<Instance>)>,
        extra: Vec<Instance>,
    ) -> Self {
        let slots: Vec<Slot> = resolved
            .into_iter()
            .map(|(key, value)| Slot {
                key: Some(key),
                value,
            })
            .chain(extra.into_iter().map(|value| Slot {
                key: None,
                value: Some(value),
            }))
            .collect();

        Self {
            declaring,
            slots: slots.into_iter(),
        }
    }

    /// Takes the next argument, converted to the declared type.
    pub fn next<D: Dependency>(&mut self) -> Result<D> {
        // Extras are the caller's contract, so running out is a failure of
        // this construction rather than of the type.
        let Some(slot) = self.slots.next() else {
            return Err(SanadError::InstantiationFailure {
                declaring: self.declaring,
                source: format!(
                    "constructor asked for a {} argument beyond the ones supplied",
                    type_name::<D>()
                )
                .into(),
            });
        };

        let key = slot.key.unwrap_or_else(|| D::key(None));
        extract(slot.value, &key, self.declaring)
    }

    /// Number of arguments not read yet.
    pub fn remaining(&self) -> usize {
        self.slots.len()
    }
}

type AssignFn = dyn Fn(&mut dyn Any, &Instance) -> Result<()> + Send + Sync;

/// A discovered injectable member: a field or setter that receives one
/// resolved value after construction.
pub struct InjectableMember {
    declaring: TypeId,
    declaring_name: &'static str,
    name: &'static str,
    key: ResolvableKey,
    assign: Box<AssignFn>,
}

impl InjectableMember {
    /// Declares a member of `T` that receives a `D`.
    ///
    /// When `optional` is set and the key resolves to nothing, `assign` is
    /// not called and the member keeps its current value.
    pub fn of<T, D>(
        name: &'static str,
        qualifier: Option<&'static str>,
        optional: bool,
        assign: impl Fn(&mut T, D) + Send + Sync + 'static,
    ) -> Self
    where
        T: Send + Sync + 'static,
        D: Dependency,
    {
        let key = D::key(qualifier);
        Self {
            declaring: TypeId::of::<T>(),
            declaring_name: type_name::<T>(),
            name,
            key: ResolvableKey::new(key, optional),
            assign: Box::new(move |target: &mut dyn Any, instance: &Instance| {
                let target = target.downcast_mut::<T>().ok_or_else(|| {
                    SanadError::Misconfiguration {
                        declaring: type_name::<T>(),
                        message: format!("member `{name}` applied to a different type"),
                    }
                })?;
                let value = extract::<D>(Some(instance.clone()), &key, type_name::<T>())?;
                assign(target, value);
                Ok(())
            }),
        }
    }

    #[inline]
    pub fn declaring_type(&self) -> TypeId {
        self.declaring
    }

    #[inline]
    pub fn declaring_name(&self) -> &'static str {
        self.declaring_name
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn key(&self) -> &ResolvableKey {
        &self.key
    }

    pub(crate) fn assign(&self, target: &mut dyn Any, instance: &Instance) -> Result<()> {
        (self.assign)(target, instance)
    }
}

impl fmt::Debug for InjectableMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableMember")
            .field("declaring", &self.declaring_name)
            .field("name", &self.name)
            .field("key", &self.key)
            .finish()
    }
}

/// Discovers the injectable constructor and members of a type.
///
/// Implementations must be deterministic: the same type yields the same
/// answer for the whole run of the process.
pub trait MemberResolver: Send + Sync {
    fn resolve_constructor(&self, type_id: TypeId) -> Option<Arc<InjectableConstructor>>;

    fn resolve_members(&self, type_id: TypeId) -> Arc<[InjectableMember]>;
}

struct Entry {
    type_name: &'static str,
    constructor: Option<Arc<InjectableConstructor>>,
    members: Arc<[InjectableMember]>,
}

/// Link-time registration emitted by `#[derive(Injectable)]`.
pub struct InjectableRegistration {
    type_id: fn() -> TypeId,
    register: fn(&TypeTable),
}

impl InjectableRegistration {
    pub const fn of<T: Injectable>() -> Self {
        Self {
            type_id: TypeId::of::<T>,
            register: TypeTable::register::<T>,
        }
    }
}

inventory::collect!(InjectableRegistration);

static SUBMITTED: Lazy<HashMap<TypeId, &'static InjectableRegistration>> = Lazy::new(|| {
    inventory::iter::<InjectableRegistration>
        .into_iter()
        .map(|registration| ((registration.type_id)(), registration))
        .collect()
});

/// The default [`MemberResolver`]: a concurrent table of registered types.
///
/// A type is known once it was registered explicitly or derived with
/// `#[derive(Injectable)]`. Unknown types are passed to the fallback
/// resolver, if one is set.
///
/// An overlay table (see [`overlay`](Self::overlay)) keeps its own
/// registrations and answers everything else from its parent table, which
/// never sees what the overlay registers.
#[derive(Default)]
pub struct TypeTable {
    entries: DashMap<TypeId, Arc<Entry>>,
    parent: Option<Arc<TypeTable>>,
    fallback: Option<Arc<dyn MemberResolver>>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consults `fallback` for types this table does not know.
    pub fn with_fallback(fallback: Arc<dyn MemberResolver>) -> Self {
        Self {
            fallback: Some(fallback),
            ..Self::default()
        }
    }

    /// Creates an empty table layered over `parent`.
    pub fn overlay(parent: Arc<TypeTable>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Registers `T`. Registering a type again keeps the first entry.
    pub fn register<T: Injectable>(&self) {
        self.register_raw(
            TypeId::of::<T>(),
            type_name::<T>(),
            T::constructor(),
            T::members(),
        );
    }

    /// Registers discovery results for an arbitrary type id.
    ///
    /// Nothing is checked here. A constructor or member that belongs to a
    /// different type is reported when its injector is built.
    pub fn register_raw(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        constructor: Option<InjectableConstructor>,
        members: Vec<InjectableMember>,
    ) {
        if self.parent.as_ref().is_some_and(|parent| parent.contains(type_id)) {
            return;
        }

        self.entries.entry(type_id).or_insert_with(|| {
            trace!(
                type_name,
                constructible = constructor.is_some(),
                members = members.len(),
                "Registered injectable type"
            );
            Arc::new(Entry {
                type_name,
                constructor: constructor.map(Arc::new),
                members: Arc::from(members),
            })
        });
    }

    /// Name of a known type.
    pub fn type_name(&self, type_id: TypeId) -> Option<&'static str> {
        self.lookup(type_id).map(|entry| entry.type_name)
    }

    /// All explicitly registered types, plus the submitted ones already
    /// looked up. An overlay lists its parent's types as well.
    pub fn registered_types(&self) -> Vec<(TypeId, &'static str)> {
        let mut types: Vec<(TypeId, &'static str)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().type_name))
            .collect();
        if let Some(parent) = &self.parent {
            types.extend(parent.registered_types());
        }
        types
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.lookup(type_id).is_some()
    }

    fn lookup(&self, type_id: TypeId) -> Option<Arc<Entry>> {
        if let Some(entry) = self.entries.get(&type_id) {
            return Some(entry.value().clone());
        }
        if let Some(parent) = &self.parent {
            return parent.lookup(type_id);
        }

        let registration = SUBMITTED.get(&type_id)?;
        (registration.register)(self);
        self.entries.get(&type_id).map(|entry| entry.value().clone())
    }
}

impl TypeTable {
    /// The resolver asked about unknown types: the fallback of the root of
    /// the overlay chain.
    fn unknown_type_resolver(&self) -> Option<&Arc<dyn MemberResolver>> {
        match &self.parent {
            Some(parent) => parent.unknown_type_resolver(),
            None => self.fallback.as_ref(),
        }
    }
}

impl MemberResolver for TypeTable {
    fn resolve_constructor(&self, type_id: TypeId) -> Option<Arc<InjectableConstructor>> {
        match self.lookup(type_id) {
            Some(entry) => entry.constructor.clone(),
            None => self
                .unknown_type_resolver()
                .and_then(|fallback| fallback.resolve_constructor(type_id)),
        }
    }

    fn resolve_members(&self, type_id: TypeId) -> Arc<[InjectableMember]> {
        match self.lookup(type_id) {
            Some(entry) => entry.members.clone(),
            None => match self.unknown_type_resolver() {
                Some(fallback) => fallback.resolve_members(type_id),
                None => Arc::from(Vec::new()),
            },
        }
    }
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable")
            .field("registered", &self.entries.len())
            .field("overlay", &self.parent.is_some())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
