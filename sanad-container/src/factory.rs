//! Construction machinery.
//!
//! Every injector owns one [`InjectionFactory`] over its type table. A
//! child's table is an overlay of its parent's, so discovery is shared
//! while each factory keeps its own per-type cache of constructor and
//! members injectors.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::constructor::ConstructorInjector;
use crate::error::Result;
use crate::member::{MemberResolver, TypeTable};
use crate::members::MembersInjector;

/// Builds and caches per-type injectors.
pub struct InjectionFactory {
    table: Arc<TypeTable>,
    constructors: DashMap<TypeId, Arc<ConstructorInjector>>,
    members: DashMap<TypeId, Arc<MembersInjector>>,
}

impl InjectionFactory {
    pub fn new(table: Arc<TypeTable>) -> Self {
        Self {
            table,
            constructors: DashMap::new(),
            members: DashMap::new(),
        }
    }

    pub fn table(&self) -> &Arc<TypeTable> {
        &self.table
    }

    /// Returns the constructor injector for a type, or `None` if the type
    /// has no injectable constructor.
    ///
    /// Only successful lookups are cached, since a type may be registered
    /// after it was first asked for.
    pub fn constructor_injector(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Option<Arc<ConstructorInjector>>> {
        if let Some(cached) = self.constructors.get(&type_id) {
            return Ok(Some(cached.value().clone()));
        }

        let Some(constructor) = self.table.resolve_constructor(type_id) else {
            trace!(type_name, "No injectable constructor");
            return Ok(None);
        };

        let injector = Arc::new(ConstructorInjector::new(type_id, type_name, constructor)?);
        Ok(Some(
            self.constructors
                .entry(type_id)
                .or_insert(injector)
                .value()
                .clone(),
        ))
    }

    /// Returns the members injector for a type. Unknown types get one with
    /// no members.
    pub fn members_injector(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Arc<MembersInjector>> {
        if let Some(cached) = self.members.get(&type_id) {
            return Ok(cached.value().clone());
        }

        let members = self.table.resolve_members(type_id);
        let known = !members.is_empty();
        let injector = Arc::new(MembersInjector::new(type_id, type_name, members)?);

        if !known {
            return Ok(injector);
        }
        Ok(self
            .members
            .entry(type_id)
            .or_insert(injector)
            .value()
            .clone())
    }

    /// Builds the injectors of every registered type, so that a
    /// misconfigured type fails now instead of on first use.
    pub fn validate(&self) -> Result<()> {
        let types = self.table.registered_types();
        for &(type_id, type_name) in &types {
            self.constructor_injector(type_id, type_name)?;
            self.members_injector(type_id, type_name)?;
        }
        debug!(types = types.len(), "Validated injectable types");
        Ok(())
    }
}

impl fmt::Debug for InjectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionFactory")
            .field("table", &self.table)
            .field("constructors", &self.constructors.len())
            .field("members", &self.members.len())
            .finish()
    }
}
