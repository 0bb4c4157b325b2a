use std::sync::Arc;

use tracing::{info, warn};

use crate::api::PantryApi;
use crate::cache::CacheManager;
use crate::models::{InventoryItem, NewItem, UserId};
use crate::request::{ActiveScreen, RequestCoordinator, ScreenScope};

use super::{Loaded, ScreenError, ScreenResult};

/// The pantry list: load, add, edit and delete items for one account.
pub struct InventoryScreen {
    scope: ScreenScope,
    api: Arc<dyn PantryApi>,
    user: UserId,
    items: Vec<InventoryItem>,
    processing: bool,
}

impl InventoryScreen {
    pub const NAME: &'static str = "inventory";

    pub fn new(api: Arc<dyn PantryApi>, cache: Arc<CacheManager>, user: UserId) -> Self {
        Self {
            scope: ScreenScope::new(Self::NAME, cache),
            api,
            user,
            items: Vec::new(),
            processing: false,
        }
    }

    pub fn with_coordinator(mut self, coordinator: RequestCoordinator) -> Self {
        self.scope = self.scope.with_coordinator(coordinator);
        self
    }

    pub fn activate(&self) -> ActiveScreen {
        self.scope.activate()
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        self.scope.coordinator()
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn item(&self, id: i64) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Expired items can be thrown out without asking.
    pub fn requires_delete_confirmation(item: &InventoryItem) -> bool {
        !item.is_expired
    }

    fn require_user(&self) -> ScreenResult<UserId> {
        if self.user.is_valid() {
            Ok(self.user)
        } else {
            Err(ScreenError::NotSignedIn)
        }
    }

    /// Show the cached list if it is still fresh, otherwise fetch it.
    pub async fn load(&mut self) -> ScreenResult<Loaded> {
        let user = self.require_user()?;
        let cache = self.scope.cache();

        if let Some(items) = cache.inventory(user) {
            self.items = items;
            return Ok(Loaded::FromCache);
        }

        self.processing = true;
        let api = Arc::clone(&self.api);
        let fetched = self
            .scope
            .coordinator()
            .run(move || async move { api.list_inventory(user).await })
            .await;
        self.processing = false;

        match fetched {
            Ok(Some(items)) => {
                cache.set_inventory(user, items.clone());
                self.items = items;
                Ok(Loaded::FromNetwork)
            }
            Ok(None) => Ok(Loaded::Cancelled),
            Err(e) => {
                warn!(user = %user, error = %e, "Failed to load inventory");
                Err(e.into())
            }
        }
    }

    /// Drop the cached list and fetch it again.
    pub async fn reload(&mut self) -> ScreenResult<Loaded> {
        let user = self.require_user()?;
        self.scope.cache().invalidate_inventory(user);
        self.load().await
    }

    /// Distinct item names, sorted, for pickers and recipe suggestions.
    /// `None` when the fetch was cancelled before it settled.
    pub async fn item_names(&mut self) -> ScreenResult<Option<Vec<String>>> {
        let user = self.require_user()?;
        if let Some(names) = self.scope.cache().inventory_names(user) {
            return Ok(Some(names));
        }

        if self.load().await? == Loaded::Cancelled {
            return Ok(None);
        }

        let mut names: Vec<String> = self.items.iter().map(|item| item.name.clone()).collect();
        names.sort_by_cached_key(|name| name.to_lowercase());
        names.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());
        self.scope.cache().set_inventory_names(user, names.clone());
        Ok(Some(names))
    }

    pub async fn add(&mut self, form: &NewItem) -> ScreenResult<Loaded> {
        let user = self.require_user()?;
        let payload = Self::validate(form)?.to_payload();

        self.processing = true;
        let result = self.api.add_item(user, &payload).await;
        self.processing = false;
        if let Err(e) = result {
            warn!(user = %user, error = %e, "Failed to add item");
            return Err(e.into());
        }

        info!(user = %user, name = %payload.name, "Item added");
        self.refresh_after_mutation(user).await
    }

    pub async fn edit(&mut self, item_id: i64, form: &NewItem) -> ScreenResult<Loaded> {
        let user = self.require_user()?;
        let payload = Self::validate(form)?.to_payload();

        self.processing = true;
        let result = self.api.edit_item(user, item_id, &payload).await;
        self.processing = false;
        if let Err(e) = result {
            warn!(user = %user, item_id, error = %e, "Failed to update item");
            return Err(e.into());
        }

        info!(user = %user, item_id, "Item updated");
        self.refresh_after_mutation(user).await
    }

    /// Delete an item. It disappears from the list immediately; the list is
    /// then refetched so server-side changes show up too.
    pub async fn delete(&mut self, item_id: i64) -> ScreenResult<Loaded> {
        let user = self.require_user()?;

        if let Err(e) = self.api.delete_item(user, item_id).await {
            warn!(user = %user, item_id, error = %e, "Failed to delete item");
            return Err(e.into());
        }

        self.items.retain(|item| item.id != item_id);
        info!(user = %user, item_id, "Item deleted");
        self.refresh_after_mutation(user).await
    }

    /// Invalidate and refetch once a mutation has been accepted. A failed
    /// refetch does not undo the mutation, so it is reported as
    /// `Loaded::RefreshFailed` rather than as an error.
    async fn refresh_after_mutation(&mut self, user: UserId) -> ScreenResult<Loaded> {
        self.scope.cache().invalidate_inventory(user);
        match self.load().await {
            Ok(loaded) => Ok(loaded),
            Err(e) => {
                warn!(user = %user, error = %e, "Change saved but inventory refresh failed");
                Ok(Loaded::RefreshFailed)
            }
        }
    }

    fn validate(form: &NewItem) -> ScreenResult<&NewItem> {
        match form.trimmed_name() {
            Some(_) => Ok(form),
            None => Err(ScreenError::Validation("Please enter an item name".to_string())),
        }
    }
}
