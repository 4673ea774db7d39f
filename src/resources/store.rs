use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::source::{InlineSource, Resource, ResourceSource};
use crate::errors::{Error, Result};
use crate::observability::enter_resource;
use crate::pipeline::panic_message;

/// Outcome of loading one declared resource.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceState {
    Present(Resource),
    Absent { reason: String },
}

/// Read-only map from resource name to its loaded state.
///
/// Built once per profile; lookups never touch the filesystem.
#[derive(Debug, Default)]
pub struct ResourceStore {
    entries: BTreeMap<String, ResourceState>,
}

impl ResourceStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every declaration once. A name declared twice keeps its first
    /// declaration; later ones are ignored without being loaded. A source
    /// that errors or panics leaves its resource absent.
    pub fn load<I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (String, Box<dyn ResourceSource>)>,
    {
        let mut entries = BTreeMap::new();
        for (name, source) in declarations {
            if entries.contains_key(&name) {
                log::warn!("Resource '{}' declared more than once; keeping the first", name);
                continue;
            }
            let loaded = {
                let _resource = enter_resource(name.as_str());
                catch_unwind(AssertUnwindSafe(|| source.load()))
            };
            let state = match loaded {
                Ok(Ok(resource)) => {
                    log::debug!(
                        "Loaded resource '{}' from {} ({} entries)",
                        name,
                        source.describe(),
                        resource.len()
                    );
                    ResourceState::Present(resource)
                }
                Ok(Err(e)) => {
                    log::warn!("Resource '{}' unavailable: {}", name, e);
                    ResourceState::Absent {
                        reason: e.to_string(),
                    }
                }
                Err(payload) => {
                    let reason = format!("loader panicked: {}", panic_message(payload.as_ref()));
                    log::warn!("Resource '{}' unavailable: {}", name, reason);
                    ResourceState::Absent { reason }
                }
            };
            entries.insert(name, state);
        }
        Self { entries }
    }

    /// Store built from resources already in memory.
    pub fn from_resources<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = (S, Resource)>,
        S: Into<String>,
    {
        Self::load(resources.into_iter().map(|(name, resource)| {
            (
                name.into(),
                Box::new(InlineSource::new(resource)) as Box<dyn ResourceSource>,
            )
        }))
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        match self.entries.get(name) {
            Some(ResourceState::Present(resource)) => Some(resource),
            _ => None,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Like [`get`](Self::get), but explains why the resource is missing.
    pub fn require(&self, name: &str) -> Result<&Resource> {
        match self.entries.get(name) {
            Some(ResourceState::Present(resource)) => Ok(resource),
            Some(ResourceState::Absent { reason }) => Err(Error::ResourceUnavailable {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(Error::ResourceUnavailable {
                name: name.to_string(),
                reason: "not declared by the profile".to_string(),
            }),
        }
    }

    pub fn state(&self, name: &str) -> Option<&ResourceState> {
        self.entries.get(name)
    }

    /// Reason a declared resource failed to load; `None` when present or undeclared.
    pub fn absence_reason(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(ResourceState::Absent { reason }) => Some(reason),
            _ => None,
        }
    }

    /// All declared names, present or not.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn present_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(name, state)| match state {
            ResourceState::Present(_) => Some(name.as_str()),
            ResourceState::Absent { .. } => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
