//! Members injection: assigning resolved values onto an existing object.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, SanadError, UnsatisfiedDependencyError};
use crate::injector::Injector;
use crate::member::InjectableMember;

/// Injects the discovered members of one type.
pub struct MembersInjector {
    type_name: &'static str,
    members: Arc<[InjectableMember]>,
}

impl MembersInjector {
    /// # Errors
    /// Returns [`SanadError::Misconfiguration`] if any member was declared
    /// by a type other than `type_id`.
    pub fn new(
        type_id: TypeId,
        type_name: &'static str,
        members: Arc<[InjectableMember]>,
    ) -> Result<Self> {
        if let Some(foreign) = members.iter().find(|m| m.declaring_type() != type_id) {
            return Err(SanadError::Misconfiguration {
                declaring: type_name,
                message: format!(
                    "member `{}` is declared by {}",
                    foreign.name(),
                    foreign.declaring_name()
                ),
            });
        }

        Ok(Self { type_name, members })
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn members(&self) -> &[InjectableMember] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolves each member in declaration order and assigns it to `target`.
    ///
    /// Stops at the first failure; members assigned before it keep their
    /// new values.
    pub fn inject(&self, injector: &Injector, target: &mut dyn Any) -> Result<()> {
        for member in self.members.iter() {
            let key = member.key();

            match injector.get_instance_by_key(key.key())? {
                Some(instance) => member.assign(target, &instance)?,
                None if key.is_optional() => {
                    trace!(
                        declaring = self.type_name,
                        member = member.name(),
                        "Optional member left unset"
                    );
                }
                None => {
                    return Err(SanadError::UnsatisfiedDependency(UnsatisfiedDependencyError {
                        declaring: self.type_name,
                        key: *key.key(),
                    }));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MembersInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MembersInjector")
            .field("type_name", &self.type_name)
            .field("members", &self.members.len())
            .finish()
    }
}
