//! Providers: the factories behind bindings.
//!
//! A [`Provider`] produces instances for one binding. The injector is
//! handed to it on every call, so providers never keep a back-pointer to
//! the container that owns them.
//!
//! Providers are injectable objects themselves. A provider type that
//! implements [`Injectable`](crate::member::Injectable) and is registered
//! with the injector receives member injection once, before its first use.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use sanad_container::prelude::*;
//!
//! struct Port;
//!
//! impl Provider for Port {
//!     fn get(&self, _injector: &Injector) -> Result<Option<Instance>> {
//!         Ok(Some(Instance::from_value(8080u16)))
//!     }
//! }
//!
//! let injector = Injector::create(&[&from_fn(|binder| {
//!     binder.bind::<u16>().to_provider(Port);
//! })])
//! .unwrap();
//!
//! assert_eq!(injector.get_instance::<u16>().unwrap().as_deref(), Some(&8080));
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use sanad_support::any::AsAny;

use crate::binding::Binding;
use crate::error::{Result, SanadError};
use crate::injector::Injector;
use crate::instance::{Dependency, Instance};
use crate::key::Key;

/// A factory for the instances of one binding.
///
/// Returning `Ok(None)` means the provider has nothing to offer; callers
/// treat that exactly like a missing binding value.
pub trait Provider: AsAny + Send + Sync {
    fn get(&self, injector: &Injector) -> Result<Option<Instance>>;
}

/// Always hands out the same pre-built instance.
pub struct InstanceProvider {
    instance: Instance,
}

impl InstanceProvider {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }
}

impl Provider for InstanceProvider {
    fn get(&self, _injector: &Injector) -> Result<Option<Instance>> {
        Ok(Some(self.instance.clone()))
    }
}

/// Resolves another key and converts the result, e.g. to upcast a concrete
/// type to the trait object it was bound under.
pub struct LinkedProvider {
    target: Key,
    expected: &'static str,
    convert: Box<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>,
}

impl LinkedProvider {
    /// Links to `B`, converting each resolved `Arc<B>` with `cast`.
    pub fn to<T, B>(cast: fn(Arc<B>) -> Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
    {
        Self {
            target: Key::of::<B>(),
            expected: type_name::<B>(),
            convert: Box::new(move |instance: &Instance| {
                instance.downcast::<B>().map(|target| Instance::new(cast(target)))
            }),
        }
    }

    /// The key this provider delegates to.
    pub fn target(&self) -> &Key {
        &self.target
    }
}

impl Provider for LinkedProvider {
    fn get(&self, injector: &Injector) -> Result<Option<Instance>> {
        let Some(resolved) = injector.get_instance_by_key(&self.target)? else {
            return Ok(None);
        };

        (self.convert)(&resolved)
            .map(Some)
            .ok_or_else(|| SanadError::TypeMismatch {
                key: self.target,
                expected: self.expected,
                found: resolved.type_name(),
            })
    }
}

/// Builds the bound type itself through constructor injection, skipping
/// explicit bindings so that the binding does not resolve to itself.
pub struct UntargettedProvider {
    key: Key,
}

impl UntargettedProvider {
    pub fn new(key: Key) -> Self {
        Self { key }
    }
}

impl Provider for UntargettedProvider {
    fn get(&self, injector: &Injector) -> Result<Option<Instance>> {
        injector.get_instance_with(&self.key, true)
    }
}

/// Adapts a closure into a provider.
pub struct FnProvider<T: ?Sized, F> {
    factory: F,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T, F> FnProvider<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Injector) -> Result<Arc<T>> + Send + Sync + 'static,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Provider for FnProvider<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Injector) -> Result<Arc<T>> + Send + Sync + 'static,
{
    fn get(&self, injector: &Injector) -> Result<Option<Instance>> {
        (self.factory)(injector).map(|value| Some(Instance::new(value)))
    }
}

/// A binding's provider as seen from one injector.
///
/// Calling [`get`](Self::get) goes through the binding's scope, so a
/// handle to a singleton binding always yields the same instance.
pub struct ProviderHandle {
    key: Key,
    binding: Arc<Binding>,
    injector: Injector,
}

impl ProviderHandle {
    pub(crate) fn new(key: Key, binding: Arc<Binding>, injector: Injector) -> Self {
        Self {
            key,
            binding,
            injector,
        }
    }

    /// Invokes the scoped provider.
    pub fn get(&self) -> Result<Option<Instance>> {
        self.injector.invoke_binding(&self.key, &self.binding)
    }

    /// Key of the provided element (not the provider-form key).
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn binding(&self) -> &Arc<Binding> {
        &self.binding
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("key", &self.key)
            .field("scope", &self.binding.scope())
            .finish()
    }
}

/// Typed view of a [`ProviderHandle`].
///
/// Declare a `ProviderRef<T>` parameter to defer resolution of `T` until
/// [`get`](Self::get) is called, for example to break a construction cycle.
pub struct ProviderRef<T: ?Sized + 'static> {
    handle: Arc<ProviderHandle>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ProviderRef<T> {
    /// Wraps a handle, checking that it provides `T`.
    pub fn from_handle(handle: Arc<ProviderHandle>) -> Option<Self> {
        (handle.key().type_id() == TypeId::of::<T>()).then(|| Self {
            handle,
            _marker: PhantomData,
        })
    }

    pub fn get(&self) -> Result<Option<Arc<T>>> {
        let Some(instance) = self.handle.get()? else {
            return Ok(None);
        };

        instance
            .downcast::<T>()
            .map(Some)
            .ok_or_else(|| SanadError::TypeMismatch {
                key: *self.handle.key(),
                expected: type_name::<T>(),
                found: instance.type_name(),
            })
    }

    pub fn handle(&self) -> &Arc<ProviderHandle> {
        &self.handle
    }
}

impl<T: ?Sized + 'static> Clone for ProviderRef<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for ProviderRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderRef<{}>({})", type_name::<T>(), self.handle.key())
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for ProviderRef<T> {
    fn key(qualifier: Option<&'static str>) -> Key {
        Key::provider_of::<T>().with_qualifier(qualifier)
    }

    fn from_instance(instance: &Instance) -> Option<Self> {
        instance
            .downcast::<ProviderHandle>()
            .and_then(Self::from_handle)
    }
}
