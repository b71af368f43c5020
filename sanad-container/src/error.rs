//! Error types for Sanad container operations.
//!
//! Every failure names the key or type involved and, where it helps,
//! a hint about how to fix the configuration.

use std::fmt;

use sanad_support::rendering::{render_path, shorten_type_name};

use crate::key::Key;

/// Boxed error produced by user code (constructors, closure providers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Sanad operations.
#[derive(Debug, thiserror::Error)]
pub enum SanadError {
    /// A required constructor parameter or member resolved to nothing.
    #[error("{}", .0)]
    UnsatisfiedDependency(UnsatisfiedDependencyError),

    /// The construction primitive failed to produce an instance.
    #[error("Cannot instantiate {declaring}: {source}")]
    InstantiationFailure {
        declaring: &'static str,
        #[source]
        source: BoxError,
    },

    /// Member injection of an object handed to the injector failed.
    #[error("Cannot inject members of {target}: {source}")]
    UnsupportedInjection {
        target: &'static str,
        #[source]
        source: Box<SanadError>,
    },

    /// A discovered constructor or member does not belong to the type it
    /// was registered for.
    #[error("Misconfigured injectable {declaring}: {message}")]
    Misconfiguration {
        declaring: &'static str,
        message: String,
    },

    /// Resolution re-entered a key that is still being resolved on this thread.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A module declared the same key twice in one container.
    #[error("{}", .0)]
    AlreadyBound(AlreadyBoundError),

    /// A provider produced an instance of a different type than its key.
    #[error("Type mismatch for {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: Key,
        expected: &'static str,
        found: &'static str,
    },

    /// A strict lookup found neither a binding nor a constructible type.
    #[error("{}", .0)]
    NotResolvable(NotResolvableError),

    /// A closure provider returned an error.
    #[error("Provider for {key} failed: {source}")]
    ProviderFailed {
        key: Key,
        #[source]
        source: BoxError,
    },
}

impl SanadError {
    /// Wraps an arbitrary error raised by a provider for `key`.
    pub fn provider_failed(key: Key, source: impl Into<BoxError>) -> Self {
        Self::ProviderFailed {
            key,
            source: source.into(),
        }
    }
}

/// Error when a non-optional key could not be satisfied.
#[derive(Debug)]
pub struct UnsatisfiedDependencyError {
    /// The type whose constructor or member declared the key
    pub declaring: &'static str,
    /// The key that resolved to nothing
    pub key: Key,
}

impl fmt::Display for UnsatisfiedDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot inject {}: no instance could be obtained for {}",
            self.declaring, self.key
        )?;
        write!(
            f,
            "\n  Hint: bind {} in a module, make it constructible, or declare it as Option<_>",
            shorten_type_name(self.key.type_name())
        )
    }
}

/// Error when resolution loops back onto itself.
///
/// The chain lists every key from the first occurrence of the repeated
/// key to the request that repeated it.
#[derive(Debug)]
pub struct CircularDependencyError {
    pub chain: Vec<Key>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .chain
            .iter()
            .map(|key| shorten_type_name(key.type_name()))
            .collect();
        write!(f, "Circular dependency detected:\n  {}", render_path(&names))?;
        write!(
            f,
            "\n  Hint: inject ProviderRef<_> instead and call get() lazily"
        )
    }
}

/// Error when a key is declared twice in the same binding store.
#[derive(Debug)]
pub struct AlreadyBoundError {
    pub key: Key,
}

impl fmt::Display for AlreadyBoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key already bound in this injector: {}", self.key)?;
        write!(
            f,
            "\n  Hint: enable allow_override, or bind it in a child injector to shadow it"
        )
    }
}

/// Error when a strict typed lookup came back empty.
#[derive(Debug)]
pub struct NotResolvableError {
    pub requested: Key,
    /// Bound types with similar names
    pub suggestions: Vec<&'static str>,
}

impl fmt::Display for NotResolvableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nothing could be resolved for {}", self.requested)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: bind it with binder.bind::<{}>() or register an Injectable type",
            shorten_type_name(self.requested.type_name())
        )
    }
}

/// Convenient Result type for Sanad operations.
pub type Result<T> = std::result::Result<T, SanadError>;
