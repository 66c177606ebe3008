//! Resource pool owned by a process.

use crate::error::{Error, Result};
use crate::resource::Resource;
use serde::Serialize;

/// Index of a resource inside the pool that handed it out.
///
/// Handles are only meaningful against the pool they came from, and only for
/// the duration of one execute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceHandle(usize);

impl ResourceHandle {
    /// Position in the pool.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered, append-only collection of resources.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ResourcePool {
    resources: Vec<Resource>,
}

impl ResourcePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource. Duplicate names are allowed.
    pub fn add(&mut self, resource: impl Into<Resource>) -> ResourceHandle {
        self.resources.push(resource.into());
        ResourceHandle(self.resources.len() - 1)
    }

    /// Number of resources in the pool.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the pool holds no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up a resource.
    pub fn get(&self, handle: ResourceHandle) -> Option<&Resource> {
        self.resources.get(handle.0)
    }

    /// Look up a resource for mutation.
    pub fn get_mut(&mut self, handle: ResourceHandle) -> Option<&mut Resource> {
        self.resources.get_mut(handle.0)
    }

    /// Like [`get`](Self::get) but fails with [`Error::StaleHandle`].
    pub fn resolve(&self, handle: ResourceHandle) -> Result<&Resource> {
        self.get(handle).ok_or(Error::StaleHandle(handle.0))
    }

    /// Mutable counterpart of [`resolve`](Self::resolve).
    pub fn resolve_mut(&mut self, handle: ResourceHandle) -> Result<&mut Resource> {
        self.get_mut(handle).ok_or(Error::StaleHandle(handle.0))
    }

    /// First resource, in pool order, with this name that is free right now.
    pub fn find_available(&self, name: &str) -> Option<ResourceHandle> {
        self.resources
            .iter()
            .position(|r| r.name() == name && r.is_available_for_use())
            .map(ResourceHandle)
    }

    /// Whether any resource with this name is free right now.
    pub fn has_available(&self, name: &str) -> bool {
        self.find_available(name).is_some()
    }

    /// Iterate resources in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }
}
