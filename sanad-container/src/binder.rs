//! The binding declaration surface handed to modules.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use sanad_container::prelude::*;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".into()
//!     }
//! }
//!
//! impl Injectable for English {
//!     fn constructor() -> Option<InjectableConstructor> {
//!         Some(InjectableConstructor::of::<Self, _>(Vec::new(), |_| Ok(English)))
//!     }
//! }
//!
//! let injector = Injector::create(&[&from_fn(|binder| {
//!     binder.bind::<dyn Greeter>().singleton().to::<English>(|e| e);
//!     binder.bind::<u16>().named("port").to_instance(Arc::new(8080));
//! })])
//! .unwrap();
//!
//! let greeter = injector.resolve::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "hello");
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::binding::Binding;
use crate::error::{AlreadyBoundError, Result, SanadError};
use crate::injector::Injector;
use crate::instance::Instance;
use crate::key::Key;
use crate::member::{Injectable, TypeTable};
use crate::module::Module;
use crate::provider::{
    FnProvider, InstanceProvider, LinkedProvider, Provider, UntargettedProvider,
};
use crate::scope::Scope;
use crate::store::BindingStore;

/// Collects the bindings of one injector while its modules are configured.
///
/// Problems found while binding (such as a key declared twice) are
/// collected and reported when the injector is built.
pub struct Binder {
    store: Arc<BindingStore>,
    table: Arc<TypeTable>,
    allow_override: bool,
    errors: Vec<SanadError>,
}

impl Binder {
    pub(crate) fn new(
        store: Arc<BindingStore>,
        table: Arc<TypeTable>,
        allow_override: bool,
    ) -> Self {
        Self {
            store,
            table,
            allow_override,
            errors: Vec::new(),
        }
    }

    /// Starts a binding for `T`.
    pub fn bind<T: ?Sized + Send + Sync + 'static>(&mut self) -> BindingBuilder<'_, T> {
        BindingBuilder {
            binder: self,
            qualifier: None,
            scope: Scope::default(),
            _marker: PhantomData,
        }
    }

    /// Makes `T` known to the injector's member resolver without binding it.
    ///
    /// Types derived with `#[derive(Injectable)]` are known without this.
    pub fn register<T: Injectable>(&mut self) -> &mut Self {
        self.table.register::<T>();
        self
    }

    /// Applies another module's configuration to this binder.
    pub fn install(&mut self, module: &dyn Module) -> &mut Self {
        debug!(module = module.name(), "Configuring module");
        module.configure(self);
        self
    }

    /// Adds a binding to this injector's own store.
    ///
    /// Binding a key that a parent injector binds shadows it. Binding a key
    /// twice in the same injector is an error unless overrides are allowed.
    pub fn set_binding(&mut self, binding: Binding) -> &mut Self {
        let key = *binding.key();

        if !self.allow_override && self.store.contains_local(&key) {
            self.errors
                .push(SanadError::AlreadyBound(AlreadyBoundError { key }));
            return self;
        }

        debug!(
            key = %key,
            scope = %binding.scope(),
            provider = binding.provider_type(),
            "Bound"
        );
        self.store.set_binding(Arc::new(binding));
        self
    }

    /// Returns the first configuration error, if any.
    pub(crate) fn finish(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Fluent declaration of one binding. Nothing is bound until one of the
/// `to*` methods is called.
#[must_use = "a binding is only installed by one of the `to*` methods"]
pub struct BindingBuilder<'a, T: ?Sized> {
    binder: &'a mut Binder,
    qualifier: Option<&'static str>,
    scope: Scope,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> BindingBuilder<'_, T> {
    /// Qualifies the key, so that several bindings of `T` can coexist.
    pub fn named(mut self, qualifier: &'static str) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    pub fn in_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Shorthand for `in_scope(Scope::Singleton)`.
    pub fn singleton(self) -> Self {
        self.in_scope(Scope::Singleton)
    }

    /// Links `T` to the injectable type `B`, converting each `B` with `cast`
    /// (usually an unsizing coercion such as `|b| b`).
    pub fn to<B: Injectable>(self, cast: fn(Arc<B>) -> Arc<T>) {
        self.binder.table.register::<B>();
        self.install(Box::new(LinkedProvider::to::<T, B>(cast)));
    }

    /// Links `T` to whatever `B` resolves to, without registering `B`.
    pub fn to_linked<B: ?Sized + Send + Sync + 'static>(self, cast: fn(Arc<B>) -> Arc<T>) {
        self.install(Box::new(LinkedProvider::to::<T, B>(cast)));
    }

    /// Binds `T` to itself: the injector builds it through its injectable
    /// constructor.
    pub fn to_self(self)
    where
        T: Injectable,
    {
        self.binder.table.register::<T>();
        let key = Key::of::<T>();
        self.install(Box::new(UntargettedProvider::new(key)));
    }

    /// Binds `T` to an existing instance.
    pub fn to_instance(self, instance: Arc<T>) {
        self.install(Box::new(InstanceProvider::new(Instance::new(instance))));
    }

    /// Binds `T` to a custom provider.
    ///
    /// If the provider type has injectable members, they are injected once,
    /// before the provider is first used.
    pub fn to_provider<P: Provider>(self, provider: P) {
        self.install(Box::new(provider));
    }

    /// Binds `T` to a closure.
    pub fn to_fn<F>(self, factory: F)
    where
        F: Fn(&Injector) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.install(Box::new(FnProvider::<T, F>::new(factory)));
    }

    fn install(self, provider: Box<dyn Provider>) {
        let key = Key::of::<T>().with_qualifier(self.qualifier);
        self.binder.set_binding(Binding::new(key, self.scope, provider));
    }
}
