//! # The Injector: heart of Sanad
//!
//! Turns keys into instances. Each request is answered in this order:
//!
//! 1. the injector itself, for `Injector`
//! 2. the bound provider, for a provider-form key (never an instance)
//! 3. the binding's scoped provider, found locally or in a parent and
//!    always invoked through the injector that owns the binding
//! 4. direct construction through the type's injectable constructor,
//!    followed by members injection
//!
//! # Architecture
//! ```text
//! InjectorBuilder ──build()──> Injector ──create_child_injector()──> Injector
//!                                 │                                     │
//!                           BindingStore  <──────── parent ──────  BindingStore
//!                                 │                                     │
//!                           InjectionFactory                     InjectionFactory
//!                                 │                                     │
//!                             TypeTable  <──────── overlay ─────── TypeTable
//! ```
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use sanad_container::prelude::*;
//!
//! struct Config {
//!     url: &'static str,
//! }
//!
//! struct Repository {
//!     config: Arc<Config>,
//! }
//!
//! impl Injectable for Repository {
//!     fn constructor() -> Option<InjectableConstructor> {
//!         Some(InjectableConstructor::of::<Self, _>(
//!             vec![ResolvableKey::of::<Arc<Config>>(None)],
//!             |args| Ok(Repository { config: args.next()? }),
//!         ))
//!     }
//! }
//!
//! let injector = Injector::builder()
//!     .register::<Repository>()
//!     .install(from_fn(|binder| {
//!         binder.bind::<Config>().to_instance(Arc::new(Config { url: "postgres://localhost" }));
//!     }))
//!     .build()
//!     .expect("Failed to build injector");
//!
//! let repository = injector.resolve::<Repository>().expect("Failed to resolve");
//! assert_eq!(repository.config.url, "postgres://localhost");
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use sanad_support::any::AsAny;
use sanad_support::rendering::suggest_similar;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::binder::Binder;
use crate::binding::Binding;
use crate::error::{CircularDependencyError, NotResolvableError, Result, SanadError};
use crate::factory::InjectionFactory;
use crate::instance::{Dependency, Instance};
use crate::key::Key;
use crate::member::{Injectable, MemberResolver, TypeTable};
use crate::module::Module;
use crate::path::{PathGuard, Stage};
use crate::provider::{Provider, ProviderHandle, ProviderRef};
use crate::store::BindingStore;

// ============================================================
// Settings
// ============================================================

/// Behavior switches shared by an injector and all of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectorSettings {
    /// Let a later binding of the same key replace an earlier one in the
    /// same injector instead of failing the build.
    pub allow_override: bool,
    /// Build the constructor and members injectors of every registered type
    /// while the injector is created, so misconfigured types fail early.
    pub eager_validation: bool,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            allow_override: false,
            eager_validation: true,
        }
    }
}

// ============================================================
// InjectorBuilder
// ============================================================

/// Builds a root [`Injector`].
///
/// ```rust,ignore
/// let injector = Injector::builder()
///     .install(DatabaseModule)
///     .install(WebModule)
///     .register::<Scheduler>()
///     .build()?;
/// ```
pub struct InjectorBuilder {
    modules: Vec<Box<dyn Module>>,
    registrations: Vec<fn(&TypeTable)>,
    resolver: Option<Arc<dyn MemberResolver>>,
    settings: InjectorSettings,
}

impl InjectorBuilder {
    fn new() -> Self {
        Self {
            modules: Vec::new(),
            registrations: Vec::new(),
            resolver: None,
            settings: InjectorSettings::default(),
        }
    }

    /// Adds a module. Modules are configured in the order they were added.
    pub fn install(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Makes `T` known to the member resolver.
    pub fn register<T: Injectable>(mut self) -> Self {
        self.registrations.push(TypeTable::register::<T>);
        self
    }

    /// Consults `resolver` for types that were neither registered nor derived.
    pub fn member_resolver(mut self, resolver: impl MemberResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn allow_override(mut self, allow: bool) -> Self {
        self.settings.allow_override = allow;
        self
    }

    pub fn eager_validation(mut self, enabled: bool) -> Self {
        self.settings.eager_validation = enabled;
        self
    }

    pub fn settings(mut self, settings: InjectorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the injector.
    ///
    /// # Errors
    /// - [`SanadError::AlreadyBound`] if a key was bound twice
    /// - [`SanadError::Misconfiguration`] if eager validation found a
    ///   misconfigured type
    pub fn build(self) -> Result<Injector> {
        self.build_with(&[])
    }

    /// Builds the injector, configuring `modules` after the installed ones.
    #[instrument(skip_all, name = "injector_build")]
    pub fn build_with(self, modules: &[&dyn Module]) -> Result<Injector> {
        info!(
            modules = self.modules.len() + modules.len(),
            "Building injector"
        );

        let table = Arc::new(match self.resolver {
            Some(resolver) => TypeTable::with_fallback(resolver),
            None => TypeTable::new(),
        });
        for register in &self.registrations {
            register(&table);
        }

        let store = Arc::new(BindingStore::root());
        let mut binder = Binder::new(store.clone(), table.clone(), self.settings.allow_override);
        for module in &self.modules {
            binder.install(&**module);
        }
        for &module in modules {
            binder.install(module);
        }
        binder.finish()?;

        let factory = InjectionFactory::new(table);
        if self.settings.eager_validation {
            factory.validate()?;
        }

        info!(bindings = store.len(), "Injector built successfully ✓");
        Ok(Injector {
            store,
            shared: Arc::new(Shared {
                factory,
                settings: self.settings,
                parent: None,
            }),
        })
    }
}

impl fmt::Debug for InjectorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorBuilder")
            .field("modules", &self.modules.len())
            .field("registrations", &self.registrations.len())
            .field("settings", &self.settings)
            .finish()
    }
}

// ============================================================
// Injector
// ============================================================

/// State shared by an injector and its clones.
struct Shared {
    factory: InjectionFactory,
    settings: InjectorSettings,
    parent: Option<Injector>,
}

/// Thread-safe resolution engine.
///
/// Cloning is cheap; clones are the same injector.
#[derive(Clone)]
pub struct Injector {
    store: Arc<BindingStore>,
    shared: Arc<Shared>,
}

impl Injector {
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    /// Builds an injector from `modules` with default settings.
    pub fn create(modules: &[&dyn Module]) -> Result<Injector> {
        Self::builder().build_with(modules)
    }

    // ── Typed lookups ──

    /// Returns an instance of `T`, or `None` if `T` is neither bound nor
    /// constructible.
    ///
    /// ```rust,ignore
    /// let db: Option<Arc<Database>> = injector.get_instance()?;
    /// ```
    pub fn get_instance<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
        self.get_typed(Key::of::<T>())
    }

    /// Returns the instance bound to `T` under `qualifier`.
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: &'static str,
    ) -> Result<Option<Arc<T>>> {
        self.get_typed(Key::named::<T>(qualifier))
    }

    /// Like [`get_instance`](Self::get_instance), but an absent result is
    /// an error.
    ///
    /// # Errors
    /// Returns [`SanadError::NotResolvable`], listing bound types with
    /// similar names, if nothing could be resolved.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = Key::of::<T>();
        self.get_typed(key)?
            .ok_or_else(|| SanadError::NotResolvable(NotResolvableError {
                requested: key,
                suggestions: self.suggestions_for(&key),
            }))
    }

    /// Returns the provider bound to `T`, or `None` if `T` has no binding.
    pub fn get_provider<T: ?Sized + Send + Sync + 'static>(&self) -> Option<ProviderRef<T>> {
        self.typed_provider(Key::of::<T>())
    }

    pub fn get_provider_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: &'static str,
    ) -> Option<ProviderRef<T>> {
        self.typed_provider(Key::named::<T>(qualifier))
    }

    // ── Keyed lookups ──

    /// Returns an instance for `key`, honoring explicit bindings.
    pub fn get_instance_by_key(&self, key: &Key) -> Result<Option<Instance>> {
        self.get_instance_with(key, false)
    }

    /// Returns an instance for `key`.
    ///
    /// With `ignore_explicit_bindings`, the binding store is skipped and the
    /// type is built directly; the injector and provider-form keys are
    /// still answered first.
    pub fn get_instance_with(
        &self,
        key: &Key,
        ignore_explicit_bindings: bool,
    ) -> Result<Option<Instance>> {
        trace!(key = %key, ignore_explicit_bindings, "Resolving");

        if key.is::<Injector>() {
            return Ok(Some(Instance::from_value(self.clone())));
        }

        if let Some(element) = key.unwrap_provider() {
            return Ok(self
                .get_provider_by_key(&element)
                .map(|handle| Instance::new(Arc::new(handle))));
        }

        if !ignore_explicit_bindings {
            if let Some((owner, binding)) = self.locate(key) {
                return owner.invoke_binding(key, &binding);
            }
        }

        self.construct_with(key, Vec::new())
    }

    /// Returns a handle to the provider bound to `key`, or `None` if there
    /// is no binding.
    ///
    /// The first call for a binding members-injects its raw provider. A
    /// handle obtained while that injection is still running (from the
    /// provider's own members) is valid, and usable once it completes.
    pub fn get_provider_by_key(&self, key: &Key) -> Option<ProviderHandle> {
        let (owner, binding) = self.locate(key)?;
        owner.scoped_provider(&binding);
        Some(ProviderHandle::new(*key, binding, owner))
    }

    /// Builds `key`'s type through its injectable constructor, passing
    /// `extra` as trailing arguments, then injects its members. Bindings
    /// are not consulted for `key` itself.
    ///
    /// Returns `None` if the type has no injectable constructor.
    pub fn construct_with(&self, key: &Key, extra: Vec<Instance>) -> Result<Option<Instance>> {
        let factory = &self.shared.factory;

        let Some(constructor) = factory.constructor_injector(key.type_id(), key.type_name())? else {
            trace!(key = %key, "Not constructible");
            return Ok(None);
        };

        let _frame = PathGuard::enter(key.with_qualifier(None), Stage::Construct)?;

        let mut constructed = constructor.create_instance(self, extra)?;
        factory
            .members_injector(key.type_id(), key.type_name())?
            .inject(self, constructed.as_any_mut())?;

        constructed.seal().map(Some)
    }

    // ── Members injection ──

    /// Injects the members of an object created outside the injector.
    ///
    /// Failures are logged, never returned. Use
    /// [`try_inject_members`](Self::try_inject_members) to observe them.
    pub fn inject_members(&self, target: &mut dyn Any) {
        if let Err(err) = self.try_inject_members(target) {
            error!(error = %err, "Members injection failed");
        }
    }

    /// Injects the members of an object created outside the injector.
    ///
    /// # Errors
    /// Returns [`SanadError::UnsupportedInjection`] wrapping the cause.
    pub fn try_inject_members(&self, target: &mut dyn Any) -> Result<()> {
        let type_id = (*target).type_id();
        let type_name = self
            .shared
            .factory
            .table()
            .type_name(type_id)
            .unwrap_or("<unregistered type>");

        self.inject_members_of(type_id, type_name, target)
            .map_err(|source| SanadError::UnsupportedInjection {
                target: type_name,
                source: Box::new(source),
            })
    }

    // ── Hierarchy ──

    /// Creates a child injector whose bindings shadow this injector's.
    ///
    /// The child resolves everything it does not bind itself through this
    /// injector's bindings, which keep resolving their own dependencies
    /// here. Types the child's modules register are known to the child
    /// only. This injector is left untouched.
    ///
    /// ```rust,ignore
    /// let request = root.create_child_injector(&[&RequestModule])?;
    /// ```
    #[instrument(skip_all, name = "create_child_injector")]
    pub fn create_child_injector(&self, modules: &[&dyn Module]) -> Result<Injector> {
        let store = Arc::new(BindingStore::child(self.store.clone()));
        let table = Arc::new(TypeTable::overlay(self.shared.factory.table().clone()));

        let mut binder = Binder::new(
            store.clone(),
            table.clone(),
            self.shared.settings.allow_override,
        );
        for &module in modules {
            binder.install(module);
        }
        binder.finish()?;

        let factory = InjectionFactory::new(table);
        if self.shared.settings.eager_validation {
            factory.validate()?;
        }

        debug!(
            modules = modules.len(),
            bindings = store.len(),
            "Created child injector"
        );
        Ok(Injector {
            store,
            shared: Arc::new(Shared {
                factory,
                settings: self.shared.settings,
                parent: Some(self.clone()),
            }),
        })
    }

    /// Returns the injector this one was created from.
    pub fn parent(&self) -> Option<Injector> {
        self.shared.parent.clone()
    }

    /// Bindings declared directly in this injector, excluding the parent's.
    pub fn get_bindings(&self) -> Vec<Arc<Binding>> {
        self.store.get_bindings()
    }

    pub fn store(&self) -> &Arc<BindingStore> {
        &self.store
    }

    pub fn settings(&self) -> InjectorSettings {
        self.shared.settings
    }

    // ── Internal ──

    /// Finds the binding for `key` along with the injector whose store
    /// declares it.
    fn locate(&self, key: &Key) -> Option<(Injector, Arc<Binding>)> {
        let mut current = self;
        loop {
            if let Some(binding) = current.store.local_binding(key) {
                return Some((current.clone(), binding));
            }
            current = current.shared.parent.as_ref()?;
        }
    }

    /// Invokes `binding`, which must be declared in this injector's store.
    pub(crate) fn invoke_binding(&self, key: &Key, binding: &Binding) -> Result<Option<Instance>> {
        let _frame = PathGuard::enter(*key, Stage::provide(binding))?;

        // Only the thread injecting the provider can observe it unfinished,
        // and only by asking for its instance from the provider's members.
        let provider = self.scoped_provider(binding).ok_or_else(|| {
            warn!(key = %key, "Provider used while its members are being injected");
            SanadError::CircularDependency(CircularDependencyError {
                chain: vec![*key, *key],
            })
        })?;

        trace!(key = %key, scope = %binding.scope(), "Invoking provider");
        provider.get(self)
    }

    fn scoped_provider(&self, binding: &Binding) -> Option<Arc<dyn Provider>> {
        binding.injected_provider(|raw| {
            let type_name = <dyn Provider as AsAny>::concrete_type_name(raw);
            let target = <dyn Provider as AsAny>::as_any_mut(raw);
            let type_id = (*target).type_id();

            if let Err(err) = self.inject_members_of(type_id, type_name, target) {
                warn!(key = %binding.key(), error = %err, "Provider members injection failed");
            }
        })
    }

    fn inject_members_of(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        target: &mut dyn Any,
    ) -> Result<()> {
        let members = self.shared.factory.members_injector(type_id, type_name)?;
        if members.is_empty() {
            return Ok(());
        }
        trace!(type_name, members = members.members().len(), "Injecting members");
        members.inject(self, target)
    }

    fn get_typed<T: ?Sized + Send + Sync + 'static>(&self, key: Key) -> Result<Option<Arc<T>>> {
        let Some(instance) = self.get_instance_by_key(&key)? else {
            return Ok(None);
        };

        instance
            .downcast::<T>()
            .map(Some)
            .ok_or_else(|| SanadError::TypeMismatch {
                key,
                expected: type_name::<T>(),
                found: instance.type_name(),
            })
    }

    fn typed_provider<T: ?Sized + Send + Sync + 'static>(&self, key: Key) -> Option<ProviderRef<T>> {
        let handle = self.get_provider_by_key(&key)?;
        ProviderRef::from_handle(Arc::new(handle))
    }

    fn suggestions_for(&self, key: &Key) -> Vec<&'static str> {
        let mut available: Vec<&'static str> = Vec::new();
        let mut store = Some(&self.store);
        while let Some(current) = store {
            available.extend(current.get_bindings().iter().map(|b| b.key().type_name()));
            store = current.parent();
        }
        available.extend(
            self.shared
                .factory
                .table()
                .registered_types()
                .into_iter()
                .map(|(_, name)| name),
        );
        available.sort_unstable();
        available.dedup();

        suggest_similar(key.type_name(), &available, 3)
    }
}

impl Dependency for Injector {
    fn key(_qualifier: Option<&'static str>) -> Key {
        Key::of::<Injector>()
    }

    fn from_instance(instance: &Instance) -> Option<Self> {
        instance.downcast::<Injector>().map(|injector| (*injector).clone())
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("bindings", &self.store.len())
            .field("child", &self.store.parent().is_some())
            .field("settings", &self.shared.settings)
            .finish()
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ResolvableKey;
    use crate::member::{InjectableConstructor, InjectableMember};
    use crate::module::from_fn;
    use crate::scope::Scope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    impl Injectable for English {
        fn constructor() -> Option<InjectableConstructor> {
            Some(InjectableConstructor::of::<Self, _>(Vec::new(), |_| Ok(English)))
        }
    }

    struct Service {
        greeter: Arc<dyn Greeter>,
        injector: Injector,
    }

    impl Injectable for Service {
        fn constructor() -> Option<InjectableConstructor> {
            Some(InjectableConstructor::of::<Self, _>(
                vec![
                    ResolvableKey::of::<Arc<dyn Greeter>>(None),
                    ResolvableKey::of::<Injector>(None),
                ],
                |args| {
                    Ok(Service {
                        greeter: args.next()?,
                        injector: args.next()?,
                    })
                },
            ))
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sanad_container=trace")
            .with_test_writer()
            .try_init();
    }

    fn greeter_module(binder: &mut Binder) {
        binder.bind::<dyn Greeter>().to::<English>(|e| e);
    }

    #[test]
    fn resolves_linked_binding() {
        init_tracing();
        let injector = Injector::create(&[&from_fn(greeter_module)]).unwrap();

        let greeter = injector.resolve::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn constructs_unbound_registered_type() {
        let injector = Injector::builder()
            .register::<Service>()
            .install(from_fn(greeter_module))
            .build()
            .unwrap();

        let service = injector.resolve::<Service>().unwrap();
        assert_eq!(service.greeter.greet(), "hello");
        assert_eq!(service.injector.store().len(), injector.store().len());
    }

    #[test]
    fn injector_resolves_to_itself() {
        let injector = Injector::builder().build().unwrap();
        let resolved = injector.resolve::<Injector>().unwrap();
        assert!(Arc::ptr_eq(&resolved.store, &injector.store));
    }

    #[test]
    fn ignoring_explicit_bindings_constructs_directly() {
        let injector = Injector::create(&[&from_fn(|binder| {
            binder.register::<English>();
            binder
                .bind::<English>()
                .to_fn(|_| Err(SanadError::provider_failed(Key::of::<English>(), "bound")));
        })])
        .unwrap();

        assert!(injector.get_instance::<English>().is_err());
        let direct = injector
            .get_instance_with(&Key::of::<English>(), true)
            .unwrap()
            .unwrap();
        assert!(direct.downcast::<English>().is_some());
    }

    #[test]
    fn unknown_type_is_absent_and_not_resolvable() {
        struct Unknown;
        let injector = Injector::builder().build().unwrap();

        assert!(injector.get_instance::<Unknown>().unwrap().is_none());
        assert!(matches!(
            injector.resolve::<Unknown>(),
            Err(SanadError::NotResolvable(_))
        ));
    }

    #[test]
    fn resolve_suggests_similar_bindings() {
        struct EnglishGreeter;
        let injector = Injector::create(&[&from_fn(|binder| {
            binder.bind::<EnglishGreeter>().to_instance(Arc::new(EnglishGreeter));
        })])
        .unwrap();

        struct Englis;
        let Err(SanadError::NotResolvable(err)) = injector.resolve::<Englis>() else {
            panic!("Expected NotResolvable");
        };
        assert!(err.suggestions.iter().any(|s| s.ends_with("EnglishGreeter")));
    }

    #[test]
    fn provider_key_yields_provider_not_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let injector = Injector::create(&[&from_fn(move |binder| {
            let counter = counter.clone();
            binder.bind::<u32>().to_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(5))
            });
        })])
        .unwrap();

        let instance = injector
            .get_instance_by_key(&Key::provider_of::<u32>())
            .unwrap()
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let provider = ProviderRef::<u32>::from_instance(&instance).unwrap();
        assert_eq!(provider.get().unwrap().as_deref(), Some(&5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn provider_key_without_binding_is_absent() {
        let injector = Injector::builder().build().unwrap();
        assert!(injector
            .get_instance_by_key(&Key::provider_of::<u32>())
            .unwrap()
            .is_none());
        assert!(injector.get_provider::<u32>().is_none());
    }

    #[test]
    fn type_mismatch_from_provider_is_reported() {
        let injector = Injector::create(&[&from_fn(|binder| {
            binder.bind::<u32>().to_provider(crate::provider::InstanceProvider::new(
                Instance::from_value(String::from("not a number")),
            ));
        })])
        .unwrap();

        assert!(matches!(
            injector.get_instance::<u32>(),
            Err(SanadError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn self_dependent_type_is_a_cycle() {
        struct Ouroboros;

        impl Injectable for Ouroboros {
            fn constructor() -> Option<InjectableConstructor> {
                Some(InjectableConstructor::of::<Self, _>(
                    vec![ResolvableKey::of::<Arc<Ouroboros>>(None)],
                    |args| {
                        let _tail: Arc<Ouroboros> = args.next()?;
                        Ok(Ouroboros)
                    },
                ))
            }
        }

        let injector = Injector::builder().register::<Ouroboros>().build().unwrap();
        assert!(matches!(
            injector.get_instance::<Ouroboros>(),
            Err(SanadError::CircularDependency(_))
        ));
    }

    #[test]
    fn singleton_cycle_fails_instead_of_deadlocking() {
        init_tracing();
        let injector = Injector::create(&[&from_fn(|binder| {
            binder
                .bind::<u32>()
                .singleton()
                .to_fn(|injector| injector.resolve::<u32>());
        })])
        .unwrap();

        assert!(matches!(
            injector.get_instance::<u32>(),
            Err(SanadError::CircularDependency(_))
        ));
    }

    #[test]
    fn construct_with_appends_extras() {
        struct Tagged {
            greeter: Arc<dyn Greeter>,
            tag: Arc<&'static str>,
        }

        impl Injectable for Tagged {
            fn constructor() -> Option<InjectableConstructor> {
                Some(InjectableConstructor::of::<Self, _>(
                    vec![ResolvableKey::of::<Arc<dyn Greeter>>(None)],
                    |args| {
                        Ok(Tagged {
                            greeter: args.next()?,
                            tag: args.next()?,
                        })
                    },
                ))
            }
        }

        let injector = Injector::builder()
            .register::<Tagged>()
            .install(from_fn(greeter_module))
            .build()
            .unwrap();

        let tagged = injector
            .construct_with(&Key::of::<Tagged>(), vec![Instance::from_value("blue")])
            .unwrap()
            .unwrap()
            .downcast::<Tagged>()
            .unwrap();
        assert_eq!(*tagged.tag, "blue");
        assert_eq!(tagged.greeter.greet(), "hello");
    }

    #[derive(Default)]
    struct Dashboard {
        greeter: Option<Arc<dyn Greeter>>,
    }

    impl Injectable for Dashboard {
        fn members() -> Vec<InjectableMember> {
            vec![InjectableMember::of::<Self, Arc<dyn Greeter>>(
                "greeter",
                None,
                false,
                |d, g| d.greeter = Some(g),
            )]
        }
    }

    #[test]
    fn inject_members_fills_external_object() {
        let injector = Injector::builder()
            .register::<Dashboard>()
            .install(from_fn(greeter_module))
            .build()
            .unwrap();

        let mut dashboard = Dashboard::default();
        injector.inject_members(&mut dashboard);
        assert!(dashboard.greeter.is_some());
    }

    #[test]
    fn inject_members_swallows_failures_and_strict_variant_reports() {
        init_tracing();
        let injector = Injector::builder().register::<Dashboard>().build().unwrap();

        let mut dashboard = Dashboard::default();
        injector.inject_members(&mut dashboard);
        assert!(dashboard.greeter.is_none());

        match injector.try_inject_members(&mut dashboard) {
            Err(SanadError::UnsupportedInjection { source, .. }) => {
                assert!(matches!(*source, SanadError::UnsatisfiedDependency(_)));
            }
            other => panic!("Expected UnsupportedInjection, got: {other:?}"),
        }
    }

    #[test]
    fn child_shadows_and_parent_is_untouched() {
        let parent = Injector::create(&[&from_fn(|binder| {
            binder.bind::<u32>().to_instance(Arc::new(1));
            binder.bind::<u64>().to_instance(Arc::new(10));
        })])
        .unwrap();

        let child = parent
            .create_child_injector(&[&from_fn(|binder| {
                binder.bind::<u32>().to_instance(Arc::new(2));
            })])
            .unwrap();

        assert_eq!(*child.resolve::<u32>().unwrap(), 2);
        assert_eq!(*parent.resolve::<u32>().unwrap(), 1);
        assert_eq!(*child.resolve::<u64>().unwrap(), 10);
        assert_eq!(child.get_bindings().len(), 1);
        assert_eq!(parent.get_bindings().len(), 2);
        assert!(child.parent().is_some());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn child_duplicate_in_same_child_is_rejected() {
        let parent = Injector::builder().build().unwrap();
        let result = parent.create_child_injector(&[&from_fn(|binder| {
            binder.bind::<u32>().to_instance(Arc::new(1));
            binder.bind::<u32>().to_instance(Arc::new(2));
        })]);

        assert!(matches!(result, Err(SanadError::AlreadyBound(_))));
        assert!(parent.get_bindings().is_empty());
    }

    #[test]
    fn child_registrations_stay_in_the_child() {
        let parent = Injector::builder().build().unwrap();
        let child = parent
            .create_child_injector(&[&from_fn(|binder| {
                binder.register::<English>();
            })])
            .unwrap();

        assert!(child.get_instance::<English>().unwrap().is_some());
        assert!(parent.get_instance::<English>().unwrap().is_none());

        let sibling = parent.create_child_injector(&[]).unwrap();
        assert!(sibling.get_instance::<English>().unwrap().is_none());
    }

    #[test]
    fn eager_validation_rejects_misconfigured_type() {
        struct Impostor;

        impl Injectable for Impostor {
            fn constructor() -> Option<InjectableConstructor> {
                English::constructor()
            }
        }

        let build = |eager: bool| {
            Injector::builder()
                .eager_validation(eager)
                .register::<Impostor>()
                .build()
        };

        assert!(matches!(build(true), Err(SanadError::Misconfiguration { .. })));

        let lazy = build(false).unwrap();
        assert!(matches!(
            lazy.get_instance::<Impostor>(),
            Err(SanadError::Misconfiguration { .. })
        ));
    }

    #[test]
    fn member_resolver_answers_unregistered_types() {
        struct Lamp;

        struct LampResolver;

        impl MemberResolver for LampResolver {
            fn resolve_constructor(&self, type_id: TypeId) -> Option<Arc<InjectableConstructor>> {
                (type_id == TypeId::of::<Lamp>()).then(|| {
                    Arc::new(InjectableConstructor::of::<Lamp, _>(Vec::new(), |_| Ok(Lamp)))
                })
            }

            fn resolve_members(&self, _type_id: TypeId) -> Arc<[InjectableMember]> {
                Arc::from(Vec::new())
            }
        }

        let injector = Injector::builder()
            .member_resolver(LampResolver)
            .build()
            .unwrap();
        assert!(injector.get_instance::<Lamp>().unwrap().is_some());
    }

    #[test]
    fn allow_override_keeps_last_binding() {
        let injector = Injector::builder()
            .allow_override(true)
            .install(from_fn(|binder| {
                binder.bind::<u32>().to_instance(Arc::new(1));
            }))
            .install(from_fn(|binder| {
                binder.bind::<u32>().in_scope(Scope::Singleton).to_instance(Arc::new(2));
            }))
            .build()
            .unwrap();

        assert_eq!(*injector.resolve::<u32>().unwrap(), 2);
        assert!(injector.settings().allow_override);
    }
}
