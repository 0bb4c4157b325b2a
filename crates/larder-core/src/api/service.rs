use anyhow::Result;
use async_trait::async_trait;

use crate::auth::SessionData;
use crate::models::inventory::ItemPayload;
use crate::models::{ImageAnalysis, InventoryItem, Preferences, UserId};

/// Every remote call a screen can make.
///
/// Each method is one HTTP round trip, so cancelling a coordinated call
/// maps cleanly onto "this response no longer matters".
#[async_trait]
pub trait PantryApi: Send + Sync {
    async fn list_inventory(&self, user: UserId) -> Result<Vec<InventoryItem>>;

    async fn add_item(&self, user: UserId, item: &ItemPayload) -> Result<()>;

    async fn edit_item(&self, user: UserId, item_id: i64, item: &ItemPayload) -> Result<()>;

    async fn delete_item(&self, user: UserId, item_id: i64) -> Result<()>;

    async fn get_preferences(&self, user: UserId) -> Result<Preferences>;

    async fn update_preferences(&self, user: UserId, prefs: &Preferences) -> Result<()>;

    /// Send a base64-encoded photo to the recognition service.
    async fn analyse_image(&self, image_base64: &str) -> Result<ImageAnalysis>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<()>;

    async fn verify_email(&self, code: &str) -> Result<()>;

    async fn resend_verification(&self, user: UserId) -> Result<()>;

    async fn logout(&self, all_devices: bool) -> Result<()>;
}
