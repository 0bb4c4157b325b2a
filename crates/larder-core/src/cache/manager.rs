use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::models::{InventoryItem, Preferences, UserId};
use crate::utils::format::age_display;

use super::key::{CacheKey, Resource};
use super::ttl::TtlCache;

/// Anything a screen may cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Inventory(Vec<InventoryItem>),
    InventoryNames(Vec<String>),
    Preferences(Preferences),
}

/// Typed view over one shared TTL cache.
///
/// Screens never build keys or payloads by hand; each resource has a
/// load/save pair that pins the key to its payload variant.
#[derive(Debug)]
pub struct CacheManager {
    cache: TtlCache<CacheKey, CachedPayload>,
}

impl CacheManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    fn load(&self, key: CacheKey) -> Option<CachedPayload> {
        let hit = self.cache.get(&key);
        debug!(key = %key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    fn save(&self, key: CacheKey, payload: CachedPayload) {
        debug!(key = %key, "Cache write");
        self.cache.set(key, payload);
    }

    // ===== Inventory =====

    pub fn inventory(&self, user: UserId) -> Option<Vec<InventoryItem>> {
        match self.load(CacheKey::inventory(user))? {
            CachedPayload::Inventory(items) => Some(items),
            _ => None,
        }
    }

    pub fn set_inventory(&self, user: UserId, items: Vec<InventoryItem>) {
        self.save(CacheKey::inventory(user), CachedPayload::Inventory(items));
    }

    // ===== Inventory Names =====

    pub fn inventory_names(&self, user: UserId) -> Option<Vec<String>> {
        match self.load(CacheKey::inventory_names(user))? {
            CachedPayload::InventoryNames(names) => Some(names),
            _ => None,
        }
    }

    pub fn set_inventory_names(&self, user: UserId, names: Vec<String>) {
        self.save(CacheKey::inventory_names(user), CachedPayload::InventoryNames(names));
    }

    // ===== Preferences =====

    pub fn preferences(&self, user: UserId) -> Option<Preferences> {
        match self.load(CacheKey::preferences(user))? {
            CachedPayload::Preferences(prefs) => Some(prefs),
            _ => None,
        }
    }

    pub fn set_preferences(&self, user: UserId, prefs: Preferences) {
        self.save(CacheKey::preferences(user), CachedPayload::Preferences(prefs));
    }

    // ===== Invalidation =====

    pub fn invalidate(&self, key: CacheKey) {
        debug!(key = %key, "Cache invalidate");
        self.cache.invalidate(&key);
    }

    /// Drop every key an inventory add/edit/delete could make wrong.
    pub fn invalidate_inventory(&self, user: UserId) {
        for resource in Resource::affected_by_inventory_change() {
            self.invalidate(CacheKey::new(*resource, user));
        }
    }

    pub fn invalidate_preferences(&self, user: UserId) {
        self.invalidate(CacheKey::preferences(user));
    }

    /// Drop everything cached for one account.
    pub fn invalidate_user(&self, user: UserId) {
        let dropped = self.cache.invalidate_where(|key| key.owner == user);
        debug!(user = %user, dropped, "Cache invalidated for user");
    }

    /// Drop everything. Used on logout so the next account starts cold.
    pub fn clear(&self) {
        debug!("Cache cleared");
        self.cache.invalidate_all();
    }

    // ===== Cache Age Information =====

    pub fn ages(&self, user: UserId) -> CacheAges {
        let age = |key: CacheKey| self.cache.age(&key).map(age_display);
        CacheAges {
            inventory: age(CacheKey::inventory(user)),
            preferences: age(CacheKey::preferences(user)),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct CacheAges {
    pub inventory: Option<String>,
    pub preferences: Option<String>,
}

impl CacheAges {
    pub fn inventory_age(&self) -> String {
        self.inventory.clone().unwrap_or_else(|| "never".to_string())
    }

    pub fn preferences_age(&self) -> String {
        self.preferences.clone().unwrap_or_else(|| "never".to_string())
    }
}
