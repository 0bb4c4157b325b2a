use std::sync::Arc;

use tracing::{info, warn};

use crate::api::PantryApi;
use crate::cache::CacheManager;
use crate::models::{DetectedItem, NewItem, UserId};
use crate::request::{ActiveScreen, RequestCoordinator, ScreenScope};

use super::{ScreenError, ScreenResult};

/// Photo capture: recognise groceries in an image and add them in one go.
pub struct CameraScreen {
    scope: ScreenScope,
    api: Arc<dyn PantryApi>,
    user: UserId,
    processing: bool,
}

impl CameraScreen {
    pub const NAME: &'static str = "camera";

    pub fn new(api: Arc<dyn PantryApi>, cache: Arc<CacheManager>, user: UserId) -> Self {
        Self {
            scope: ScreenScope::new(Self::NAME, cache),
            api,
            user,
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

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Run recognition on a base64 photo.
    ///
    /// `Ok(None)` means the screen was left before the result came back.
    /// An image with nothing recognisable yields an empty list.
    pub async fn analyse(&mut self, image_base64: &str) -> ScreenResult<Option<Vec<DetectedItem>>> {
        if image_base64.trim().is_empty() {
            return Err(ScreenError::Validation("No image data available".to_string()));
        }

        self.processing = true;
        let api = Arc::clone(&self.api);
        let image = image_base64.to_string();
        let analysis = self
            .scope
            .coordinator()
            .run(move || async move { api.analyse_image(&image).await })
            .await;
        self.processing = false;

        match analysis {
            Ok(Some(analysis)) => {
                let items = analysis.detected_items().to_vec();
                info!(count = items.len(), "Image analysed");
                Ok(Some(items))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "Failed to analyse image");
                Err(e.into())
            }
        }
    }

    /// Add each detected item with quantity 1. Returns how many were added.
    ///
    /// The inventory keys are invalidated whenever anything was added, even
    /// if a later item fails.
    pub async fn add_detected(&mut self, items: &[DetectedItem]) -> ScreenResult<usize> {
        if !self.user.is_valid() {
            return Err(ScreenError::NotSignedIn);
        }
        let user = self.user;

        let mut added = 0;
        let mut failure = None;
        for item in items {
            let payload = NewItem::named(item.name.as_str()).with_quantity("1").to_payload();
            match self.api.add_item(user, &payload).await {
                Ok(()) => added += 1,
                Err(e) => {
                    warn!(user = %user, name = %item.name, error = %e, "Failed to add detected item");
                    failure = Some(e);
                    break;
                }
            }
        }

        if added > 0 {
            self.scope.cache().invalidate_inventory(user);
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(added),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::fake::FakeApi;
    use std::time::Duration;

    const USER: UserId = UserId(5);

    fn setup(api: FakeApi) -> (Arc<FakeApi>, Arc<CacheManager>, CameraScreen) {
        let api = Arc::new(api);
        let cache = Arc::new(CacheManager::new(Duration::from_secs(180)));
        let screen = CameraScreen::new(api.clone(), cache.clone(), USER);
        (api, cache, screen)
    }

    #[tokio::test]
    async fn test_empty_image_rejected() {
        let (_api, _cache, mut screen) = setup(FakeApi::new());
        assert!(matches!(screen.analyse("  ").await, Err(ScreenError::Validation(_))));
    }

    #[tokio::test]
    async fn test_analyse_and_add_detected() {
        let api = FakeApi::new().with_items(USER, &["bread"]);
        *api.detections.lock().unwrap() = vec!["apple".to_string(), "banana".to_string()];
        let (api, cache, mut screen) = setup(api);
        cache.set_inventory(USER, Vec::new());

        let detected = screen.analyse("aGVsbG8=").await.unwrap().unwrap();
        assert_eq!(detected.len(), 2);

        assert_eq!(screen.add_detected(&detected).await.unwrap(), 2);
        assert_eq!(api.item_names(USER), vec!["bread", "apple", "banana"]);
        assert_eq!(cache.inventory(USER), None);
    }

    #[tokio::test]
    async fn test_nothing_detected() {
        let (_api, _cache, mut screen) = setup(FakeApi::new());
        assert_eq!(screen.analyse("aGVsbG8=").await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_partial_add_failure_still_invalidates() {
        let api = FakeApi::new();
        *api.fail_adds_after.lock().unwrap() = Some(1);
        let (api, cache, mut screen) = setup(api);
        cache.set_inventory(USER, Vec::new());

        let items = vec![
            DetectedItem { name: "apple".to_string(), prob: None },
            DetectedItem { name: "kiwi".to_string(), prob: None },
        ];
        assert!(screen.add_detected(&items).await.is_err());
        assert_eq!(api.item_names(USER), vec!["apple"]);
        assert_eq!(cache.inventory(USER), None);
    }

    #[tokio::test]
    async fn test_left_screen_drops_analysis() {
        let api = FakeApi::new();
        *api.detections.lock().unwrap() = vec!["apple".to_string()];
        let (_api, _cache, mut screen) = setup(api);

        screen.activate().deactivate();
        assert_eq!(screen.analyse("aGVsbG8=").await.unwrap(), None);
    }
}
