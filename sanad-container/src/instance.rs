//! Type-erased instances and the [`Dependency`] conversion trait.
//!
//! Everything the container hands out is shared: an [`Instance`] wraps an
//! `Arc<T>` (where `T` may be a trait object) behind `dyn Any`, so cloning
//! it never copies the value and identity survives every lookup.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SanadError, UnsatisfiedDependencyError};
use crate::key::Key;

/// A shared, type-erased value produced by the container.
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps a shared value.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use sanad_container::instance::Instance;
    ///
    /// trait Greeter: Send + Sync {}
    /// struct English;
    /// impl Greeter for English {}
    ///
    /// let instance = Instance::new(Arc::new(English) as Arc<dyn Greeter>);
    /// assert!(instance.downcast::<dyn Greeter>().is_some());
    /// assert!(instance.downcast::<English>().is_none());
    /// ```
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Moves `value` into a fresh allocation and wraps it.
    pub fn from_value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new(Arc::new(value))
    }

    /// Returns the shared value if this instance holds an `Arc<T>`.
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        (*self.value).downcast_ref::<Arc<T>>().cloned()
    }

    /// Name of the type this instance was created for.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both instances refer to the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.type_name)
    }
}

/// A type that can be declared as a constructor parameter or an injectable
/// member.
///
/// The implementation decides which [`Key`] is requested for the declared
/// type and how the resolved [`Instance`] turns into a value of that type.
///
/// | declared type      | requested key                  | absent value |
/// |--------------------|--------------------------------|--------------|
/// | `Arc<T>`           | `Key::of::<T>()`               | error        |
/// | `Option<D>`        | `D`'s key                      | `None`       |
/// | `Injector`         | `Key::of::<Injector>()`        | error        |
/// | `ProviderRef<T>`   | `Key::provider_of::<T>()`      | error        |
pub trait Dependency: Sized + Send + Sync + 'static {
    /// Whether the declaration site tolerates an absent value.
    const OPTIONAL: bool = false;

    fn key(qualifier: Option<&'static str>) -> Key;

    /// Converts a resolved instance. `None` means it has the wrong type.
    fn from_instance(instance: &Instance) -> Option<Self>;

    /// The value used when resolution produced nothing, if tolerated.
    fn absent() -> Option<Self> {
        None
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for Arc<T> {
    fn key(qualifier: Option<&'static str>) -> Key {
        Key::of::<T>().with_qualifier(qualifier)
    }

    fn from_instance(instance: &Instance) -> Option<Self> {
        instance.downcast::<T>()
    }
}

impl<D: Dependency> Dependency for Option<D> {
    const OPTIONAL: bool = true;

    fn key(qualifier: Option<&'static str>) -> Key {
        D::key(qualifier)
    }

    fn from_instance(instance: &Instance) -> Option<Self> {
        D::from_instance(instance).map(Some)
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

/// Converts a resolution result into a declared dependency value.
pub(crate) fn extract<D: Dependency>(
    value: Option<Instance>,
    key: &Key,
    declaring: &'static str,
) -> Result<D> {
    match value {
        Some(instance) => D::from_instance(&instance).ok_or_else(|| SanadError::TypeMismatch {
            key: *key,
            expected: type_name::<D>(),
            found: instance.type_name(),
        }),
        None => D::absent().ok_or_else(|| {
            SanadError::UnsatisfiedDependency(UnsatisfiedDependencyError {
                declaring,
                key: *key,
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[test]
    fn clones_share_the_value() {
        let instance = Instance::from_value(Config { port: 80 });
        let copy = instance.clone();
        assert!(instance.ptr_eq(&copy));

        let a = instance.downcast::<Config>().unwrap();
        let b = copy.downcast::<Config>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.port, 80);
    }

    #[test]
    fn separately_built_instances_differ() {
        let a = Instance::from_value(1u8);
        let b = Instance::from_value(1u8);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn optional_dependency_tolerates_absence() {
        let key = <Option<Arc<Config>>>::key(None);
        let value: Option<Arc<Config>> = extract(None, &key, "Consumer").unwrap();
        assert!(value.is_none());
        assert!(<Option<Arc<Config>> as Dependency>::OPTIONAL);
    }

    #[test]
    fn required_dependency_reports_declaring_type() {
        let key = <Arc<Config>>::key(None);
        let err = extract::<Arc<Config>>(None, &key, "Consumer").unwrap_err();
        match err {
            SanadError::UnsatisfiedDependency(e) => {
                assert_eq!(e.declaring, "Consumer");
                assert_eq!(e.key, Key::of::<Config>());
            }
            other => panic!("Expected UnsatisfiedDependency, got: {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_a_mismatch() {
        let key = <Arc<Config>>::key(None);
        let err = extract::<Arc<Config>>(Some(Instance::from_value(7u32)), &key, "Consumer")
            .unwrap_err();
        assert!(matches!(err, SanadError::TypeMismatch { found: "u32", .. }));
    }
}
