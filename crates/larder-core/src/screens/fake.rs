//! In-memory `PantryApi` used by screen tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::api::PantryApi;
use crate::auth::SessionData;
use crate::models::inventory::ItemPayload;
use crate::models::{DetectedItem, ImageAnalysis, InventoryItem, Preferences, SegmentationResult, User, UserId};

#[derive(Default)]
pub(crate) struct FakeApi {
    pub inventory: Mutex<HashMap<UserId, Vec<InventoryItem>>>,
    pub preferences: Mutex<HashMap<UserId, Preferences>>,
    pub detections: Mutex<Vec<String>>,
    pub list_delay: Mutex<Option<Duration>>,
    pub fail_lists: Mutex<bool>,
    pub fail_adds_after: Mutex<Option<usize>>,
    pub list_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(100),
            ..Default::default()
        }
    }

    pub fn with_items(self, user: UserId, names: &[&str]) -> Self {
        let items = names.iter().map(|name| self.make_item(name)).collect();
        self.inventory.lock().unwrap().insert(user, items);
        self
    }

    pub fn with_list_delay(self, delay: Duration) -> Self {
        *self.list_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn item_names(&self, user: UserId) -> Vec<String> {
        self.inventory
            .lock()
            .unwrap()
            .get(&user)
            .map(|items| items.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn item_id(&self, user: UserId, name: &str) -> i64 {
        self.inventory.lock().unwrap()[&user]
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.id)
            .unwrap()
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn make_item(&self, name: &str) -> InventoryItem {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        serde_json::from_value(serde_json::json!({"id": id, "name": name})).unwrap()
    }
}

#[async_trait]
impl PantryApi for FakeApi {
    async fn list_inventory(&self, user: UserId) -> Result<Vec<InventoryItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        // Snapshot before the delay, like a response already in flight.
        let items = self.inventory.lock().unwrap().get(&user).cloned().unwrap_or_default();
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_lists.lock().unwrap() {
            return Err(anyhow!("inventory service unavailable"));
        }
        Ok(items)
    }

    async fn add_item(&self, user: UserId, item: &ItemPayload) -> Result<()> {
        let calls = self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.fail_adds_after.lock().unwrap() {
            if calls >= limit {
                return Err(anyhow!("add failed"));
            }
        }
        let mut new_item = self.make_item(&item.name);
        new_item.quantity = item.quantity.clone();
        new_item.barcode = item.barcode.clone();
        new_item.formatted_expiry_date = item.expiry_date.clone();
        self.inventory.lock().unwrap().entry(user).or_default().push(new_item);
        Ok(())
    }

    async fn edit_item(&self, user: UserId, item_id: i64, item: &ItemPayload) -> Result<()> {
        let mut inventory = self.inventory.lock().unwrap();
        let existing = inventory
            .get_mut(&user)
            .and_then(|items| items.iter_mut().find(|i| i.id == item_id))
            .ok_or_else(|| anyhow!("no item {}", item_id))?;
        existing.name = item.name.clone();
        existing.quantity = item.quantity.clone();
        existing.barcode = item.barcode.clone();
        existing.formatted_expiry_date = item.expiry_date.clone();
        Ok(())
    }

    async fn delete_item(&self, user: UserId, item_id: i64) -> Result<()> {
        let mut inventory = self.inventory.lock().unwrap();
        let items = inventory.entry(user).or_default();
        let before = items.len();
        items.retain(|i| i.id != item_id);
        if items.len() == before {
            return Err(anyhow!("no item {}", item_id));
        }
        Ok(())
    }

    async fn get_preferences(&self, user: UserId) -> Result<Preferences> {
        self.preferences
            .lock()
            .unwrap()
            .get(&user)
            .cloned()
            .ok_or_else(|| anyhow!("no preferences stored"))
    }

    async fn update_preferences(&self, user: UserId, prefs: &Preferences) -> Result<()> {
        self.preferences.lock().unwrap().insert(user, prefs.clone());
        Ok(())
    }

    async fn analyse_image(&self, _image_base64: &str) -> Result<ImageAnalysis> {
        let names = self.detections.lock().unwrap().clone();
        if names.is_empty() {
            return Ok(ImageAnalysis::default());
        }
        Ok(ImageAnalysis {
            segmentation_results: vec![SegmentationResult {
                recognition_results: names
                    .into_iter()
                    .map(|name| DetectedItem { name, prob: None })
                    .collect(),
            }],
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData> {
        if password != "Secret1!" {
            return Err(anyhow!("Invalid credentials"));
        }
        let id = if email.starts_with("second") { 2 } else { 1 };
        Ok(SessionData {
            token: format!("token-{}", id),
            user: User {
                id: UserId(id),
                email: email.to_string(),
                email_verified: false,
            },
            created_at: Utc::now(),
        })
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<()> {
        Ok(())
    }

    async fn verify_email(&self, code: &str) -> Result<()> {
        if code == "123456" {
            Ok(())
        } else {
            Err(anyhow!("Invalid or expired verification code"))
        }
    }

    async fn resend_verification(&self, _user: UserId) -> Result<()> {
        Ok(())
    }

    async fn logout(&self, _all_devices: bool) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
