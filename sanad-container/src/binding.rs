//! Bindings and their provider-injection lifecycle.
//!
//! A [`Binding`] pairs a key with a raw provider and a scope. The raw
//! provider is members-injected the first time anyone asks for it, then
//! wrapped with its scope and published. That transition happens once per
//! binding and is serialized by a lock owned by the binding alone.
//!
//! ```text
//! NotInjected(raw) ──first lookup──> Injecting ──> Injected(scoped)
//! ```

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use sanad_support::any::AsAny;
use serde::Serialize;
use tracing::debug;

use crate::key::Key;
use crate::provider::Provider;
use crate::scope::Scope;

enum ProviderState {
    NotInjected(Box<dyn Provider>),
    /// The owning thread is injecting the raw provider right now.
    Injecting,
    Injected(Arc<dyn Provider>),
}

/// Observable provider-injection state of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProviderInjection {
    NotInjected,
    Injected,
}

/// A registered rule mapping a key to a provider and a scope.
pub struct Binding {
    key: Key,
    scope: Scope,
    provider_type: &'static str,
    state: ReentrantMutex<RefCell<ProviderState>>,
}

impl Binding {
    pub fn new(key: Key, scope: Scope, provider: Box<dyn Provider>) -> Self {
        let provider_type = <dyn Provider as AsAny>::concrete_type_name(&*provider);
        Self {
            key,
            scope,
            provider_type,
            state: ReentrantMutex::new(RefCell::new(ProviderState::NotInjected(provider))),
        }
    }

    #[inline]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Name of the raw provider type.
    #[inline]
    pub fn provider_type(&self) -> &'static str {
        self.provider_type
    }

    pub fn provider_injection(&self) -> ProviderInjection {
        let guard = self.state.lock();
        let state = guard.borrow();
        match &*state {
            ProviderState::Injected(_) => ProviderInjection::Injected,
            ProviderState::NotInjected(_) | ProviderState::Injecting => {
                ProviderInjection::NotInjected
            }
        }
    }

    /// Returns the scoped provider, running `inject` on the raw provider
    /// first if this is the first request.
    ///
    /// Other threads block until the transition is complete. A re-entrant
    /// call from the injecting thread gets `None`, since the provider is
    /// not ready yet.
    pub(crate) fn injected_provider(
        &self,
        inject: impl FnOnce(&mut dyn Provider),
    ) -> Option<Arc<dyn Provider>> {
        let guard = self.state.lock();

        let mut raw = {
            let mut state = guard.borrow_mut();
            match mem::replace(&mut *state, ProviderState::Injecting) {
                ProviderState::NotInjected(raw) => raw,
                ProviderState::Injected(scoped) => {
                    *state = ProviderState::Injected(scoped.clone());
                    return Some(scoped);
                }
                ProviderState::Injecting => return None,
            }
        };

        // The RefCell borrow is released here, the lock is not.
        inject(&mut *raw);

        let scoped = self.scope.scope(raw);
        *guard.borrow_mut() = ProviderState::Injected(scoped.clone());
        debug!(key = %self.key, scope = %self.scope, "Provider injected");

        Some(scoped)
    }

    /// Snapshot for diagnostics.
    pub fn info(&self) -> BindingInfo {
        BindingInfo {
            key: self.key.type_name(),
            qualifier: self.key.qualifier(),
            scope: self.scope,
            provider: self.provider_type,
            injection: self.provider_injection(),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("provider", &self.provider_type)
            .finish()
    }
}

/// Serializable description of a [`Binding`].
#[derive(Debug, Clone, Serialize)]
pub struct BindingInfo {
    pub key: &'static str,
    pub qualifier: Option<&'static str>,
    pub scope: Scope,
    pub provider: &'static str,
    pub injection: ProviderInjection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::injector::Injector;
    use crate::instance::Instance;
    use crate::provider::InstanceProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    fn binding(scope: Scope) -> Binding {
        Binding::new(
            Key::of::<u8>(),
            scope,
            Box::new(InstanceProvider::new(Instance::from_value(1u8))),
        )
    }

    #[test]
    fn starts_not_injected() {
        let binding = binding(Scope::Unscoped);
        assert_eq!(binding.provider_injection(), ProviderInjection::NotInjected);
        assert!(binding.provider_type().ends_with("InstanceProvider"));
    }

    #[test]
    fn injects_once() {
        let binding = binding(Scope::Singleton);
        let calls = AtomicUsize::new(0);

        let first = binding.injected_provider(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        let second = binding.injected_provider(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(binding.provider_injection(), ProviderInjection::Injected);
    }

    #[test]
    fn reentrant_request_sees_provider_in_flight() {
        let binding = binding(Scope::Unscoped);
        let mut nested = Some(());

        let outer = binding.injected_provider(|_| {
            nested = binding.injected_provider(|_| {}).map(|_| ());
        });

        assert!(outer.is_some());
        assert!(nested.is_none());
    }

    #[test]
    fn concurrent_first_requests_inject_once() {
        let binding = Arc::new(binding(Scope::Unscoped));
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(6));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let binding = binding.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    binding
                        .injected_provider(|_| {
                            calls.fetch_add(1, Ordering::SeqCst);
                        })
                        .is_some()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inject_sees_the_raw_provider_type() {
        struct Tagged {
            tag: u8,
        }

        impl Provider for Tagged {
            fn get(&self, _injector: &Injector) -> Result<Option<Instance>> {
                Ok(Some(Instance::from_value(self.tag)))
            }
        }

        let binding = Binding::new(Key::of::<u8>(), Scope::Unscoped, Box::new(Tagged { tag: 0 }));
        let scoped = binding
            .injected_provider(|raw| {
                if let Some(tagged) = <dyn Provider as AsAny>::as_any_mut(raw).downcast_mut::<Tagged>() {
                    tagged.tag = 9;
                }
            })
            .unwrap();

        let injector = Injector::builder().build().unwrap();
        let value = scoped.get(&injector).unwrap().unwrap();
        assert_eq!(*value.downcast::<u8>().unwrap(), 9);
    }

    #[test]
    fn info_is_serializable_snapshot() {
        let binding = binding(Scope::Singleton);
        let info = binding.info();
        assert_eq!(info.key, "u8");
        assert_eq!(info.scope, Scope::Singleton);
        assert_eq!(info.injection, ProviderInjection::NotInjected);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["key"], "u8");
        assert_eq!(json["qualifier"], serde_json::Value::Null);
        assert_eq!(json["scope"], "Singleton");
        assert_eq!(json["injection"], "NotInjected");
        assert!(json["provider"].as_str().unwrap().ends_with("InstanceProvider"));

        binding.injected_provider(|_| {});
        let json = serde_json::to_value(binding.info()).unwrap();
        assert_eq!(json["injection"], "Injected");
    }
}
