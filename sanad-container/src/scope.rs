//! Provider lifecycle scopes.
//!
//! A scope decorates a raw provider when its binding is first used:
//! - [`Scope::Singleton`]: the provider runs at most once per binding,
//!   every later lookup gets the cached result
//! - [`Scope::Unscoped`]: the provider runs on every lookup

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::error::Result;
use crate::injector::Injector;
use crate::instance::Instance;
use crate::provider::Provider;

/// Defines how often a binding's provider is invoked.
///
/// # Examples
/// ```
/// use sanad_container::scope::Scope;
///
/// assert!(Scope::Singleton.is_cached());
/// assert_eq!(Scope::default(), Scope::Unscoped);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scope {
    /// One instance per binding, created on first lookup.
    ///
    /// Concurrent first lookups are serialized, so the underlying provider
    /// never runs twice. The instance lives as long as the binding.
    ///
    /// # When to use
    /// - Connection pools
    /// - Configuration objects
    /// - Shared caches
    Singleton,

    /// The provider is called on every lookup. Nothing is cached.
    #[default]
    Unscoped,
}

impl Scope {
    /// Returns `true` if this scope caches instances.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Scope::Singleton)
    }

    /// Wraps a raw provider with this scope's policy.
    pub fn scope(self, provider: Box<dyn Provider>) -> Arc<dyn Provider> {
        match self {
            Scope::Singleton => Arc::new(SingletonProvider {
                inner: provider,
                cell: OnceCell::new(),
            }),
            Scope::Unscoped => Arc::from(provider),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "Singleton"),
            Scope::Unscoped => write!(f, "Unscoped"),
        }
    }
}

/// Memoizes the first successful result of its inner provider.
///
/// A failed first call leaves the cell empty, so the next lookup retries.
/// An absent result is cached like any other.
struct SingletonProvider {
    inner: Box<dyn Provider>,
    cell: OnceCell<Option<Instance>>,
}

impl Provider for SingletonProvider {
    fn get(&self, injector: &Injector) -> Result<Option<Instance>> {
        self.cell
            .get_or_try_init(|| self.inner.get(injector))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::thread;

    use crate::error::SanadError;
    use crate::key::Key;

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Provider for Counting {
        fn get(&self, _injector: &Injector) -> Result<Option<Instance>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Instance::from_value(n)))
        }
    }

    fn counting() -> (Box<dyn Provider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Box::new(Counting {
            calls: calls.clone(),
        });
        (provider, calls)
    }

    #[test]
    fn singleton_returns_identical_instance() {
        let injector = Injector::builder().build().unwrap();
        let (raw, calls) = counting();
        let scoped = Scope::Singleton.scope(raw);

        let a = scoped.get(&injector).unwrap().unwrap();
        let b = scoped.get(&injector).unwrap().unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unscoped_calls_through_every_time() {
        let injector = Injector::builder().build().unwrap();
        let (raw, calls) = counting();
        let scoped = Scope::Unscoped.scope(raw);

        let a = scoped.get(&injector).unwrap().unwrap();
        let b = scoped.get(&injector).unwrap().unwrap();

        assert!(!a.ptr_eq(&b));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn singleton_serializes_concurrent_first_access() {
        let injector = Injector::builder().build().unwrap();
        let (raw, calls) = counting();
        let scoped = Scope::Singleton.scope(raw);

        let barrier = Arc::new(Barrier::new(8));
        let results = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scoped = scoped.clone();
                let injector = injector.clone();
                let barrier = barrier.clone();
                let results = results.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let instance = scoped.get(&injector).unwrap().unwrap();
                    results.lock().unwrap().push(instance);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let results = results.lock().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|i| i.ptr_eq(&results[0])));
    }

    #[test]
    fn singleton_retries_after_failure() {
        struct FailsOnce {
            calls: AtomicUsize,
        }

        impl Provider for FailsOnce {
            fn get(&self, _injector: &Injector) -> Result<Option<Instance>> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(SanadError::provider_failed(Key::of::<u8>(), "not yet"));
                }
                Ok(Some(Instance::from_value(1u8)))
            }
        }

        let injector = Injector::builder().build().unwrap();
        let scoped = Scope::Singleton.scope(Box::new(FailsOnce {
            calls: AtomicUsize::new(0),
        }));

        assert!(scoped.get(&injector).is_err());
        assert!(scoped.get(&injector).unwrap().is_some());
    }

    #[test]
    fn scope_display() {
        assert_eq!(Scope::Singleton.to_string(), "Singleton");
        assert_eq!(Scope::Unscoped.to_string(), "Unscoped");
    }
}
