//! Constructor injection.
//!
//! A [`ConstructorInjector`] resolves the declared parameters of one
//! injectable constructor through the injector, appends caller-supplied
//! extras and runs the construction primitive.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, SanadError, UnsatisfiedDependencyError};
use crate::injector::Injector;
use crate::instance::Instance;
use crate::member::{Arguments, InjectableConstructor};

/// Builds instances of one type.
pub struct ConstructorInjector {
    type_name: &'static str,
    constructor: Arc<InjectableConstructor>,
}

impl ConstructorInjector {
    /// # Errors
    /// Returns [`SanadError::Misconfiguration`] if `constructor` was
    /// declared by a type other than `type_id`.
    pub fn new(
        type_id: TypeId,
        type_name: &'static str,
        constructor: Arc<InjectableConstructor>,
    ) -> Result<Self> {
        if constructor.declaring_type() != type_id {
            return Err(SanadError::Misconfiguration {
                declaring: type_name,
                message: format!(
                    "its constructor is declared by {}",
                    constructor.declaring_name()
                ),
            });
        }

        Ok(Self {
            type_name,
            constructor,
        })
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn constructor(&self) -> &InjectableConstructor {
        &self.constructor
    }

    /// Resolves every declared parameter in order, appends `extra` and
    /// invokes the constructor.
    ///
    /// # Errors
    /// - [`SanadError::UnsatisfiedDependency`] if a required parameter
    ///   resolved to nothing
    /// - [`SanadError::InstantiationFailure`] if the constructor itself failed
    /// - any error raised while resolving a parameter, unchanged
    pub fn create_instance(
        &self,
        injector: &Injector,
        extra: Vec<Instance>,
    ) -> Result<Constructed<'_>> {
        let params = self.constructor.params();
        let mut resolved = Vec::with_capacity(params.len());

        for param in params {
            let value = injector.get_instance_by_key(param.key())?;

            if value.is_none() && !param.is_optional() {
                return Err(SanadError::UnsatisfiedDependency(UnsatisfiedDependencyError {
                    declaring: self.type_name,
                    key: *param.key(),
                }));
            }

            trace!(
                declaring = self.type_name,
                param = %param,
                present = value.is_some(),
                "Resolved parameter"
            );
            resolved.push((*param.key(), value));
        }

        let mut args = Arguments::new(self.type_name, resolved, extra);
        let raw = self
            .constructor
            .construct(&mut args)
            .map_err(|source| match source.downcast::<SanadError>() {
                Ok(inner) => *inner,
                Err(source) => SanadError::InstantiationFailure {
                    declaring: self.type_name,
                    source,
                },
            })?;

        trace!(type_name = self.type_name, "Constructed");
        Ok(Constructed {
            raw,
            origin: self,
        })
    }
}

impl fmt::Debug for ConstructorInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInjector")
            .field("type_name", &self.type_name)
            .field("params", &self.constructor.params())
            .finish()
    }
}

/// A freshly built value, still exclusively owned so that its members can
/// be injected before it is shared.
pub struct Constructed<'a> {
    raw: Box<dyn Any + Send + Sync>,
    origin: &'a ConstructorInjector,
}

impl Constructed<'_> {
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut *self.raw
    }

    /// Turns the value into a shared [`Instance`].
    pub fn seal(self) -> Result<Instance> {
        let type_name = self.origin.type_name;
        self.origin
            .constructor
            .seal(self.raw)
            .ok_or_else(|| SanadError::InstantiationFailure {
                declaring: type_name,
                source: "constructor produced a value of another type".into(),
            })
    }
}
