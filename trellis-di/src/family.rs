//! Families: every registration of one service plus its current default

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::{DefaultClaim, DescriptorId, ImplementationDescriptor};
use crate::error::{DiError, DiResult};
use crate::service::TypeKey;

/// How competing explicit default claims are settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultConflictPolicy {
    /// The latest explicit claim wins
    #[default]
    LastWriteWins,
    /// Two explicit claims in the same configuration batch leave the default
    /// contested until a later batch claims it again
    Reject,
}

/// All registrations for one service
#[derive(Debug, Clone)]
pub struct Family {
    service: TypeKey,
    descriptors: Vec<ImplementationDescriptor>,
    default: Option<DescriptorId>,
    /// Batch and descriptor of the latest explicit default claim
    explicit_claim: Option<(u64, DescriptorId)>,
    contested: Vec<DescriptorId>,
}

impl Family {
    pub(crate) fn new(service: TypeKey) -> Self {
        Self {
            service,
            descriptors: Vec::new(),
            default: None,
            explicit_claim: None,
            contested: Vec::new(),
        }
    }

    pub fn service(&self) -> TypeKey {
        self.service
    }

    /// Registrations in the order they were added
    pub fn descriptors(&self) -> &[ImplementationDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&ImplementationDescriptor> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    pub fn is_contested(&self) -> bool {
        !self.contested.is_empty()
    }

    /// The current default registration
    pub fn default_descriptor(&self) -> DiResult<&ImplementationDescriptor> {
        if self.is_contested() {
            let candidates = self
                .contested
                .iter()
                .filter_map(|id| self.by_id(*id))
                .map(|d| d.name().to_string())
                .collect();
            return Err(DiError::AmbiguousDefault {
                service: self.service.type_name().to_string(),
                candidates,
            });
        }
        self.default
            .and_then(|id| self.by_id(id))
            .ok_or_else(|| DiError::MissingRegistration {
                service: self.service.type_name().to_string(),
                name: None,
            })
    }

    /// Add a registration. A registration reusing an existing name replaces
    /// that descriptor in place and takes over its default status.
    pub(crate) fn add(
        &mut self,
        descriptor: ImplementationDescriptor,
        claim: DefaultClaim,
        batch: u64,
        policy: DefaultConflictPolicy,
    ) -> DescriptorId {
        let id = descriptor.id();
        match self
            .descriptors
            .iter()
            .position(|d| d.name() == descriptor.name())
        {
            Some(index) => {
                let replaced = self.descriptors[index].id();
                debug!(
                    "Replacing {} registration {} ({} -> {})",
                    self.service,
                    descriptor.name(),
                    self.descriptors[index].concrete_type(),
                    descriptor.concrete_type()
                );
                self.descriptors[index] = descriptor;
                self.transfer(replaced, id);
            }
            None => self.descriptors.push(descriptor),
        }

        match claim {
            DefaultClaim::Explicit => self.claim_default(id, batch, policy),
            DefaultClaim::IfFirst => {
                if self.default.is_none() {
                    self.default = Some(id);
                }
            }
        }

        self.sync_default_flags();
        id
    }

    fn claim_default(&mut self, id: DescriptorId, batch: u64, policy: DefaultConflictPolicy) {
        match (policy, self.explicit_claim) {
            (DefaultConflictPolicy::Reject, Some((claim_batch, claimant)))
                if claim_batch == batch && claimant != id =>
            {
                if !self.contested.contains(&claimant) {
                    self.contested.push(claimant);
                }
                if !self.contested.contains(&id) {
                    self.contested.push(id);
                }
            }
            _ => self.contested.clear(),
        }
        self.default = Some(id);
        self.explicit_claim = Some((batch, id));
    }

    /// Point every reference to `from` at `to`
    fn transfer(&mut self, from: DescriptorId, to: DescriptorId) {
        if self.default == Some(from) {
            self.default = Some(to);
        }
        if let Some((batch, claimant)) = self.explicit_claim {
            if claimant == from {
                self.explicit_claim = Some((batch, to));
            }
        }
        if let Some(index) = self.contested.iter().position(|id| *id == from) {
            if self.contested.contains(&to) {
                self.contested.remove(index);
            } else {
                self.contested[index] = to;
            }
        }
    }

    fn sync_default_flags(&mut self) {
        let default = self.default;
        for descriptor in &mut self.descriptors {
            descriptor.set_default(Some(descriptor.id()) == default);
        }
    }

    fn by_id(&self, id: DescriptorId) -> Option<&ImplementationDescriptor> {
        self.descriptors.iter().find(|d| d.id() == id)
    }
}

/// Every family known to a registry
#[derive(Debug, Clone, Default)]
pub struct FamilyRegistry {
    families: FxHashMap<TypeKey, Family>,
}

impl FamilyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        &mut self,
        descriptor: ImplementationDescriptor,
        claim: DefaultClaim,
        batch: u64,
        policy: DefaultConflictPolicy,
    ) -> DescriptorId {
        let service = descriptor.service();
        self.families
            .entry(service)
            .or_insert_with(|| Family::new(service))
            .add(descriptor, claim, batch, policy)
    }

    pub fn get(&self, service: &TypeKey) -> Option<&Family> {
        self.families.get(service)
    }

    pub fn contains(&self, service: &TypeKey) -> bool {
        self.families.contains_key(service)
    }

    /// Registered descriptor for `service`; `None` selects the default
    pub fn lookup(
        &self,
        service: &TypeKey,
        name: Option<&str>,
    ) -> DiResult<&ImplementationDescriptor> {
        let missing = || DiError::MissingRegistration {
            service: service.type_name().to_string(),
            name: name.map(str::to_string),
        };
        let family = self.families.get(service).ok_or_else(missing)?;
        match name {
            None => family.default_descriptor(),
            Some(name) => family.find(name).ok_or_else(missing),
        }
    }

    pub fn services(&self) -> impl Iterator<Item = &TypeKey> {
        self.families.keys()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
