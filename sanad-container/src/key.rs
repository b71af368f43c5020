//! Injection request identities.
//!
//! A [`Key`] names what is being asked for: a Rust type plus an optional
//! qualifier for cases where several bindings share one type. A
//! [`ResolvableKey`] additionally records whether an absent value is
//! tolerated at the place where the key was declared.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::provider::ProviderRef;

/// Identifies a binding target in the container.
///
/// Two keys are equal when their [`TypeId`] and qualifier match.
///
/// # Examples
/// ```
/// use sanad_container::key::Key;
///
/// let plain = Key::of::<String>();
/// assert_eq!(plain.qualifier(), None);
///
/// let primary = Key::named::<String>("primary_db");
/// let replica = Key::named::<String>("replica_db");
/// assert_ne!(primary, replica);
/// assert_ne!(plain, primary);
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<&'static str>,
    provided: Option<Element>,
}

/// The element type of a provider-form key.
#[derive(Clone, Copy)]
struct Element {
    type_id: TypeId,
    type_name: &'static str,
}

impl Key {
    /// Creates a key for type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            qualifier: None,
            provided: None,
        }
    }

    /// Creates a qualified key for type `T`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(qualifier: &'static str) -> Self {
        Self::of::<T>().with_qualifier(Some(qualifier))
    }

    /// Creates the key under which the provider of `T` is requested.
    ///
    /// Resolving it yields the bound provider, never a `T`.
    ///
    /// ```
    /// use sanad_container::key::Key;
    ///
    /// let key = Key::provider_of::<u32>();
    /// assert!(key.is_provider());
    /// assert_eq!(key.unwrap_provider(), Some(Key::of::<u32>()));
    /// ```
    #[inline]
    pub fn provider_of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<ProviderRef<T>>(),
            type_name: type_name::<ProviderRef<T>>(),
            qualifier: None,
            provided: Some(Element {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
            }),
        }
    }

    /// Creates the provider-form key for a qualified `T`.
    #[inline]
    pub fn provider_named<T: ?Sized + 'static>(qualifier: &'static str) -> Self {
        Self::provider_of::<T>().with_qualifier(Some(qualifier))
    }

    /// Returns a copy of this key with the given qualifier.
    #[inline]
    pub fn with_qualifier(mut self, qualifier: Option<&'static str>) -> Self {
        self.qualifier = qualifier;
        self
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the human-readable type name, used in diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn qualifier(&self) -> Option<&'static str> {
        self.qualifier
    }

    /// Returns `true` if this key asks for a provider rather than an instance.
    #[inline]
    pub fn is_provider(&self) -> bool {
        self.provided.is_some()
    }

    /// For a provider-form key, returns the key of the provided element,
    /// keeping the qualifier.
    pub fn unwrap_provider(&self) -> Option<Key> {
        self.provided.map(|element| Key {
            type_id: element.type_id,
            type_name: element.type_name,
            qualifier: self.qualifier,
            provided: None,
        })
    }

    /// Returns `true` if the raw type of this key is `T`, ignoring the qualifier.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(qualifier) => write!(f, "Key({}, qualifier={:?})", self.type_name, qualifier),
            None => write!(f, "Key({})", self.type_name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(qualifier) => write!(f, "{} @{qualifier}", self.type_name),
            None => write!(f, "{}", self.type_name),
        }
    }
}

/// A [`Key`] declared by a constructor parameter or an injectable member,
/// together with whether an absent value is acceptable there.
///
/// The flag is fixed when the member is discovered and never recomputed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvableKey {
    key: Key,
    optional: bool,
}

impl ResolvableKey {
    #[inline]
    pub fn new(key: Key, optional: bool) -> Self {
        Self { key, optional }
    }

    /// A key whose absence is fatal.
    #[inline]
    pub fn required(key: Key) -> Self {
        Self::new(key, false)
    }

    /// A key whose absence leaves the slot empty.
    #[inline]
    pub fn optional(key: Key) -> Self {
        Self::new(key, true)
    }

    /// Builds the resolvable key for a declared dependency type, taking
    /// optionality from the type itself (`Option<_>` is optional).
    ///
    /// ```
    /// use std::sync::Arc;
    /// use sanad_container::key::{Key, ResolvableKey};
    ///
    /// let required = ResolvableKey::of::<Arc<String>>(None);
    /// assert!(!required.is_optional());
    /// assert_eq!(*required.key(), Key::of::<String>());
    ///
    /// let optional = ResolvableKey::of::<Option<Arc<String>>>(Some("motd"));
    /// assert!(optional.is_optional());
    /// assert_eq!(*optional.key(), Key::named::<String>("motd"));
    /// ```
    #[inline]
    pub fn of<D: crate::instance::Dependency>(qualifier: Option<&'static str>) -> Self {
        Self::new(D::key(qualifier), D::OPTIONAL)
    }

    #[inline]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Debug for ResolvableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvableKey")
            .field("key", &self.key)
            .field("optional", &self.optional)
            .finish()
    }
}

impl fmt::Display for ResolvableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "{} (optional)", self.key)
        } else {
            fmt::Display::fmt(&self.key, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Database;

    #[test]
    fn key_of_type() {
        let key = Key::of::<Database>();
        assert!(key.type_name().contains("Database"));
        assert_eq!(key.qualifier(), None);
        assert!(key.is::<Database>());
        assert!(!key.is_provider());
    }

    #[test]
    fn structurally_equal_keys_are_interchangeable() {
        let mut map = HashMap::new();
        map.insert(Key::named::<Database>("main"), "main");
        map.insert(Key::of::<Database>(), "plain");

        assert_eq!(map.get(&Key::named::<Database>("main")), Some(&"main"));
        assert_eq!(map.get(&Key::of::<Database>()), Some(&"plain"));
        assert_eq!(map.get(&Key::named::<Database>("other")), None);
    }

    #[test]
    fn provider_key_differs_from_element_key() {
        let provider = Key::provider_of::<Database>();
        assert_ne!(provider, Key::of::<Database>());
        assert_eq!(provider, Key::of::<ProviderRef<Database>>());
    }

    #[test]
    fn unwrap_provider_keeps_qualifier() {
        let provider = Key::provider_named::<Database>("replica");
        let element = provider.unwrap_provider().unwrap();
        assert_eq!(element, Key::named::<Database>("replica"));
        assert!(!element.is_provider());
        assert!(Key::of::<Database>().unwrap_provider().is_none());
    }

    #[test]
    fn trait_object_keys() {
        trait Greeter {}
        let key = Key::of::<dyn Greeter>();
        assert!(key.type_name().contains("Greeter"));
    }

    #[test]
    fn display_includes_qualifier() {
        let rendered = Key::named::<u32>("port").to_string();
        assert_eq!(rendered, "u32 @port");
        assert_eq!(ResolvableKey::optional(Key::of::<u32>()).to_string(), "u32 (optional)");
    }
}
