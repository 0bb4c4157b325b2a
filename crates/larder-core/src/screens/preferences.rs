use std::sync::Arc;

use tracing::{info, warn};

use crate::api::PantryApi;
use crate::cache::CacheManager;
use crate::models::{DietaryFlag, Preferences, UserId};
use crate::request::{ActiveScreen, RequestCoordinator, ScreenScope};

use super::{Loaded, ScreenError, ScreenResult};

/// Dietary preference toggles for one account.
pub struct PreferencesScreen {
    scope: ScreenScope,
    api: Arc<dyn PantryApi>,
    user: UserId,
    preferences: Preferences,
    loading: bool,
}

impl PreferencesScreen {
    pub const NAME: &'static str = "preferences";

    pub fn new(api: Arc<dyn PantryApi>, cache: Arc<CacheManager>, user: UserId) -> Self {
        Self {
            scope: ScreenScope::new(Self::NAME, cache),
            api,
            user,
            preferences: Preferences::default(),
            loading: false,
        }
    }

    pub fn with_coordinator(mut self, coordinator: RequestCoordinator) -> Self {
        self.scope = self.scope.with_coordinator(coordinator);
        self
    }

    pub fn activate(&self) -> ActiveScreen {
        self.scope.activate()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set(&mut self, flag: DietaryFlag, value: bool) {
        self.preferences.set(flag, value);
    }

    pub fn toggle_custom(&mut self) {
        self.preferences.toggle_custom();
    }

    /// Custom text is only editable while the custom toggle is on.
    pub fn set_custom_text(&mut self, text: impl Into<String>) {
        if self.preferences.is_custom {
            self.preferences.custom_text = text.into();
        }
    }

    /// Load preferences. A failed fetch leaves every toggle off rather than
    /// blocking the screen.
    pub async fn load(&mut self) -> ScreenResult<Loaded> {
        if !self.user.is_valid() {
            return Err(ScreenError::NotSignedIn);
        }
        let user = self.user;
        let cache = self.scope.cache();

        if let Some(prefs) = cache.preferences(user) {
            self.preferences = prefs;
            return Ok(Loaded::FromCache);
        }

        self.loading = true;
        let api = Arc::clone(&self.api);
        let fetched = self
            .scope
            .coordinator()
            .run(move || async move { api.get_preferences(user).await })
            .await;
        self.loading = false;

        match fetched {
            Ok(Some(prefs)) => {
                cache.set_preferences(user, prefs.clone());
                self.preferences = prefs;
                Ok(Loaded::FromNetwork)
            }
            Ok(None) => Ok(Loaded::Cancelled),
            Err(e) => {
                warn!(user = %user, error = %e, "Failed to load preferences, using defaults");
                self.preferences = Preferences::default();
                Ok(Loaded::Fallback)
            }
        }
    }

    pub async fn save(&mut self) -> ScreenResult<()> {
        if !self.user.is_valid() {
            return Err(ScreenError::NotSignedIn);
        }
        let user = self.user;
        let to_save = self.preferences.for_save();

        self.loading = true;
        let result = self.api.update_preferences(user, &to_save).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.scope.cache().invalidate_preferences(user);
                self.preferences = to_save;
                info!(user = %user, "Preferences saved");
                Ok(())
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Failed to save preferences");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::fake::FakeApi;
    use std::time::Duration;

    const USER: UserId = UserId(4);

    fn setup(api: FakeApi) -> (Arc<FakeApi>, Arc<CacheManager>, PreferencesScreen) {
        let api = Arc::new(api);
        let cache = Arc::new(CacheManager::new(Duration::from_secs(180)));
        let screen = PreferencesScreen::new(api.clone(), cache.clone(), USER);
        (api, cache, screen)
    }

    #[tokio::test]
    async fn test_missing_preferences_fall_back_to_defaults() {
        let (_api, cache, mut screen) = setup(FakeApi::new());
        screen.set(DietaryFlag::Vegan, true);

        assert_eq!(screen.load().await.unwrap(), Loaded::Fallback);
        assert_eq!(screen.preferences(), &Preferences::default());
        assert_eq!(cache.preferences(USER), None);
    }

    #[tokio::test]
    async fn test_load_caches_result() {
        let api = FakeApi::new();
        api.preferences.lock().unwrap().insert(
            USER,
            Preferences {
                is_gluten_free: true,
                ..Default::default()
            },
        );
        let (_api, cache, mut screen) = setup(api);

        assert_eq!(screen.load().await.unwrap(), Loaded::FromNetwork);
        assert!(screen.preferences().is_gluten_free);
        assert!(cache.preferences(USER).unwrap().is_gluten_free);
        assert_eq!(screen.load().await.unwrap(), Loaded::FromCache);
    }

    #[tokio::test]
    async fn test_save_strips_custom_text_and_invalidates() {
        let (api, cache, mut screen) = setup(FakeApi::new());
        cache.set_preferences(USER, Preferences::default());
        screen.load().await.unwrap();

        screen.toggle_custom();
        screen.set_custom_text("no coriander");
        screen.toggle_custom();
        screen.set_custom_text("ignored while custom is off");
        screen.set(DietaryFlag::LowCarb, true);
        screen.save().await.unwrap();

        let stored = api.preferences.lock().unwrap()[&USER].clone();
        assert!(stored.is_low_carb);
        assert!(!stored.is_custom);
        assert_eq!(stored.custom_text, "");
        assert_eq!(cache.preferences(USER), None);

        assert_eq!(screen.load().await.unwrap(), Loaded::FromNetwork);
        assert!(screen.preferences().is_low_carb);
    }

    #[tokio::test]
    async fn test_custom_text_kept_when_custom_on() {
        let (api, _cache, mut screen) = setup(FakeApi::new());
        screen.toggle_custom();
        screen.set_custom_text("halal");
        screen.save().await.unwrap();
        assert_eq!(api.preferences.lock().unwrap()[&USER].custom_text, "halal");
    }
}
