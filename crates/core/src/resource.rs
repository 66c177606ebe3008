//! Resource model - the things executables lock or consume.
//!
//! Two variants share one capability surface:
//! - [`UsableResource`] is a binary lock: one holder at a time, fully
//!   returned on release.
//! - [`ConsumableResource`] is a depleting counter: each allocation takes one
//!   unit for good, release never gives it back.

use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Resource variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    /// Exclusive lock
    Usable,
    /// Depleting counter
    Consumable,
}

impl ResourceKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Usable => "Usable",
            ResourceKind::Consumable => "Consumable",
        }
    }
}

/// What happened when a resource was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseStatus {
    /// Resource returned to the free state
    Released,
    /// Usable resource was already free
    AlreadyAvailable,
    /// Consumable resource has nothing left to hand out
    Depleted,
}

/// Exclusively-usable resource (binary lock).
#[derive(Debug, Clone, Serialize)]
pub struct UsableResource {
    name: String,
    capacity: f64,
    available: bool,
}

impl UsableResource {
    /// Create a new usable resource. `capacity` is an informational rate.
    pub fn new(name: impl Into<String>, capacity: f64) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        if capacity.is_nan() || capacity <= 0.0 {
            return Err(Error::InvalidCapacity { name });
        }
        Ok(Self {
            name,
            capacity,
            available: true,
        })
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Informational capacity rate.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// True when nobody holds the lock.
    pub fn is_available_for_use(&self) -> bool {
        self.available
    }

    /// Take the lock.
    pub fn allocate(&mut self) -> Result<()> {
        if !self.available {
            return Err(Error::ResourceUnavailable(self.name.clone()));
        }
        self.available = false;
        Ok(())
    }

    /// Return the lock. Releasing a free resource only warns.
    pub fn release(&mut self) -> ReleaseStatus {
        let status = if self.available {
            warn!(resource = %self.name, "Resource is already available");
            ReleaseStatus::AlreadyAvailable
        } else {
            ReleaseStatus::Released
        };
        self.available = true;
        status
    }

    /// Perform work with this resource.
    pub fn use_resource(&self) {
        info!(
            resource = %self.name,
            capacity = self.capacity,
            "Using resource '{}' (capacity: {} GHz)",
            self.name,
            self.capacity
        );
    }
}

/// Consumable resource (depleting counter).
#[derive(Debug, Clone, Serialize)]
pub struct ConsumableResource {
    name: String,
    total_capacity: u64,
    remaining_capacity: u64,
    available: bool,
}

impl ConsumableResource {
    /// Create a new consumable resource with `capacity` units.
    pub fn new(name: impl Into<String>, capacity: i64) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        let total = match u64::try_from(capacity) {
            Ok(total) if total > 0 => total,
            _ => return Err(Error::InvalidCapacity { name }),
        };
        Ok(Self {
            name,
            total_capacity: total,
            remaining_capacity: total,
            available: true,
        })
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capacity fixed at construction.
    pub fn total_capacity(&self) -> u64 {
        self.total_capacity
    }

    /// Units left.
    pub fn remaining_capacity(&self) -> u64 {
        self.remaining_capacity
    }

    /// True while at least one unit remains.
    pub fn is_available_for_use(&self) -> bool {
        self.remaining_capacity > 0
    }

    /// Consume exactly one unit.
    pub fn allocate(&mut self) -> Result<()> {
        if self.remaining_capacity == 0 {
            return Err(Error::ResourceExhausted(self.name.clone()));
        }
        self.remaining_capacity -= 1;
        self.available = self.remaining_capacity > 0;
        Ok(())
    }

    /// Recompute availability. Capacity is never replenished.
    pub fn release(&mut self) -> ReleaseStatus {
        let status = if self.remaining_capacity == 0 && !self.available {
            warn!(
                resource = %self.name,
                "Consumable resource is depleted and cannot be used without replenishment"
            );
            ReleaseStatus::Depleted
        } else {
            ReleaseStatus::Released
        };
        self.available = self.remaining_capacity > 0;
        status
    }

    /// Perform work with this resource.
    pub fn use_resource(&self) {
        info!(
            resource = %self.name,
            remaining = self.remaining_capacity,
            total = self.total_capacity,
            "Using consumable resource '{}' (remaining: {}/{})",
            self.name,
            self.remaining_capacity,
            self.total_capacity
        );
    }
}

/// A pool resource of either variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    /// Binary lock
    Usable(UsableResource),
    /// Depleting counter
    Consumable(ConsumableResource),
}

impl Resource {
    /// Shorthand for a usable resource.
    pub fn usable(name: impl Into<String>, capacity: f64) -> Result<Self> {
        UsableResource::new(name, capacity).map(Resource::Usable)
    }

    /// Shorthand for a consumable resource.
    pub fn consumable(name: impl Into<String>, capacity: i64) -> Result<Self> {
        ConsumableResource::new(name, capacity).map(Resource::Consumable)
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        match self {
            Resource::Usable(r) => r.name(),
            Resource::Consumable(r) => r.name(),
        }
    }

    /// Variant tag.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Usable(_) => ResourceKind::Usable,
            Resource::Consumable(_) => ResourceKind::Consumable,
        }
    }

    /// Pure availability query.
    pub fn is_available_for_use(&self) -> bool {
        match self {
            Resource::Usable(r) => r.is_available_for_use(),
            Resource::Consumable(r) => r.is_available_for_use(),
        }
    }

    /// Lock or consume one unit.
    pub fn allocate(&mut self) -> Result<()> {
        match self {
            Resource::Usable(r) => r.allocate(),
            Resource::Consumable(r) => r.allocate(),
        }
    }

    /// Give the resource back (see the variant docs for what that means).
    pub fn release(&mut self) -> ReleaseStatus {
        match self {
            Resource::Usable(r) => r.release(),
            Resource::Consumable(r) => r.release(),
        }
    }

    /// Perform work with this resource. No state changes.
    pub fn use_resource(&self) {
        match self {
            Resource::Usable(r) => r.use_resource(),
            Resource::Consumable(r) => r.use_resource(),
        }
    }
}

impl From<UsableResource> for Resource {
    fn from(resource: UsableResource) -> Self {
        Resource::Usable(resource)
    }
}

impl From<ConsumableResource> for Resource {
    fn from(resource: ConsumableResource) -> Self {
        Resource::Consumable(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_allocate_locks() {
        let mut cpu = UsableResource::new("CPU", 3.0).unwrap();
        assert!(cpu.is_available_for_use());

        cpu.allocate().unwrap();
        assert!(!cpu.is_available_for_use());
        assert_eq!(
            cpu.allocate(),
            Err(Error::ResourceUnavailable("CPU".to_string()))
        );

        assert_eq!(cpu.release(), ReleaseStatus::Released);
        assert!(cpu.is_available_for_use());
        cpu.allocate().unwrap();
    }

    #[test]
    fn test_usable_double_release_warns() {
        let mut cpu = UsableResource::new("CPU", 1.0).unwrap();
        assert_eq!(cpu.release(), ReleaseStatus::AlreadyAvailable);
        assert!(cpu.is_available_for_use());
    }

    #[test]
    fn test_consumable_exact_capacity() {
        let mut mem = ConsumableResource::new("Mem", 3).unwrap();
        for _ in 0..3 {
            mem.allocate().unwrap();
        }
        assert_eq!(mem.remaining_capacity(), 0);
        assert!(!mem.is_available_for_use());
        assert_eq!(
            mem.allocate(),
            Err(Error::ResourceExhausted("Mem".to_string()))
        );
    }

    #[test]
    fn test_consumable_release_never_replenishes() {
        let mut mem = ConsumableResource::new("Mem", 2).unwrap();
        mem.allocate().unwrap();
        assert_eq!(mem.release(), ReleaseStatus::Released);
        assert_eq!(mem.remaining_capacity(), 1);
        assert!(mem.is_available_for_use());

        mem.allocate().unwrap();
        assert_eq!(mem.release(), ReleaseStatus::Depleted);
        assert_eq!(mem.remaining_capacity(), 0);
        assert!(!mem.is_available_for_use());
        assert_eq!(mem.total_capacity(), 2);
    }

    #[test]
    fn test_invalid_capacity() {
        for capacity in [0, -1, -4096] {
            assert_eq!(
                Resource::consumable("Mem", capacity).unwrap_err(),
                Error::InvalidCapacity { name: "Mem".to_string() }
            );
            assert_eq!(
                Resource::usable("CPU", capacity as f64).unwrap_err(),
                Error::InvalidCapacity { name: "CPU".to_string() }
            );
        }
        assert!(Resource::usable("CPU", f64::NAN).is_err());
    }

    #[test]
    fn test_invalid_name() {
        assert_eq!(Resource::usable("", 1.0).unwrap_err(), Error::InvalidName);
        assert_eq!(Resource::consumable("", 1).unwrap_err(), Error::InvalidName);
    }

    #[test]
    fn test_use_does_not_mutate() {
        let mut mem = Resource::consumable("Mem", 1).unwrap();
        mem.use_resource();
        mem.use_resource();
        assert!(mem.is_available_for_use());
        mem.allocate().unwrap();
        assert_eq!(mem.kind(), ResourceKind::Consumable);
        assert_eq!(mem.name(), "Mem");
    }
}
