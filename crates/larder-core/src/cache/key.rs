//! Structured cache keys.
//!
//! A key always names both the resource and the account that owns it, so a
//! lookup after an account switch cannot return the previous user's data.

use std::fmt;

use crate::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Inventory,
    InventoryNames,
    Preferences,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Inventory => "inventory",
            Resource::InventoryNames => "inventory_names",
            Resource::Preferences => "preferences",
        }
    }

    /// Resources whose cached result an inventory add/edit/delete can change.
    pub fn affected_by_inventory_change() -> &'static [Resource] {
        &[Resource::Inventory, Resource::InventoryNames]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: Resource,
    pub owner: UserId,
}

impl CacheKey {
    pub fn new(resource: Resource, owner: UserId) -> Self {
        Self { resource, owner }
    }

    pub fn inventory(owner: UserId) -> Self {
        Self::new(Resource::Inventory, owner)
    }

    pub fn inventory_names(owner: UserId) -> Self {
        Self::new(Resource::InventoryNames, owner)
    }

    pub fn preferences(owner: UserId) -> Self {
        Self::new(Resource::Preferences, owner)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.resource.as_str(), self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_differ_by_owner() {
        assert_ne!(CacheKey::inventory(UserId(1)), CacheKey::inventory(UserId(2)));
        assert_ne!(CacheKey::inventory(UserId(1)), CacheKey::inventory_names(UserId(1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(CacheKey::inventory(UserId(7)).to_string(), "inventory_7");
        assert_eq!(CacheKey::inventory_names(UserId(7)).to_string(), "inventory_names_7");
    }
}
