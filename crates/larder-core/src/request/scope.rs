use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheManager;

use super::coordinator::RequestCoordinator;

/// The cache and coordinator a single screen works with.
///
/// The cache is shared across screens; the coordinator belongs to this
/// screen alone, so tearing the screen down cancels only its own requests.
#[derive(Debug, Clone)]
pub struct ScreenScope {
    name: &'static str,
    cache: Arc<CacheManager>,
    coordinator: RequestCoordinator,
}

impl ScreenScope {
    pub fn new(name: &'static str, cache: Arc<CacheManager>) -> Self {
        Self {
            name,
            cache,
            coordinator: RequestCoordinator::new(),
        }
    }

    pub fn with_coordinator(mut self, coordinator: RequestCoordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    /// Mark the screen active. Guards may overlap; outstanding requests are
    /// cancelled once the last of them is dropped or deactivated.
    #[must_use = "dropping the guard deactivates the screen immediately"]
    pub fn activate(&self) -> ActiveScreen {
        self.coordinator.acquire();
        debug!(screen = self.name, holders = self.coordinator.holders(), "Screen activated");
        ActiveScreen {
            name: self.name,
            coordinator: self.coordinator.clone(),
        }
    }
}

/// Guard for a screen's active period.
///
/// Holds its own handle on the coordinator rather than borrowing the scope,
/// so the screen stays free to mutate itself while active.
#[derive(Debug)]
pub struct ActiveScreen {
    name: &'static str,
    coordinator: RequestCoordinator,
}

impl ActiveScreen {
    pub fn deactivate(self) {
        // Drop does the work.
    }
}

impl Drop for ActiveScreen {
    fn drop(&mut self) {
        let pending = self.coordinator.pending_count();
        if self.coordinator.release() {
            debug!(screen = self.name, pending, "Screen deactivated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    fn scope() -> ScreenScope {
        ScreenScope::new("test", Arc::new(CacheManager::new(Duration::from_secs(180))))
    }

    async fn slow_fetch() -> Result<u32, String> {
        sleep(Duration::from_secs(2)).await;
        Ok(42)
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_cancels_in_flight() {
        let scope = scope();
        let active = scope.activate();

        let worker = scope.coordinator().clone();
        let handle = tokio::spawn(async move { worker.run(slow_fetch).await });
        sleep(Duration::from_secs(1)).await;

        active.deactivate();
        assert_eq!(scope.coordinator().pending_count(), 0);
        assert_eq!(handle.await.unwrap(), Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_exit_path_still_cancels() {
        fn validate() -> Result<(), String> {
            Err("validation failed".to_string())
        }

        async fn load(scope: &ScreenScope) -> Result<u32, String> {
            let _active = scope.activate();
            let worker = scope.coordinator().clone();
            tokio::spawn(async move { worker.run(slow_fetch).await });
            sleep(Duration::from_millis(10)).await;
            validate()?;
            Ok(0)
        }

        let scope = scope();
        assert!(load(&scope).await.is_err());
        assert_eq!(scope.coordinator().pending_count(), 0);
        assert!(scope.coordinator().is_closed());
    }

    #[tokio::test]
    async fn test_reactivation_accepts_new_requests() {
        let scope = scope();
        scope.activate().deactivate();

        let skipped = scope.coordinator().run(|| async { Ok::<_, String>(1) }).await;
        assert_eq!(skipped, Ok(None));

        let _active = scope.activate();
        let delivered = scope.coordinator().run(|| async { Ok::<_, String>(1) }).await;
        assert_eq!(delivered, Ok(Some(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_guards_keep_screen_active() {
        let scope = scope();
        let first = scope.activate();
        let second = scope.activate();

        drop(first);
        assert!(!scope.coordinator().is_closed());
        let delivered = scope.coordinator().run(slow_fetch).await;
        assert_eq!(delivered, Ok(Some(42)));

        drop(second);
        assert!(scope.coordinator().is_closed());
        let skipped = scope.coordinator().run(slow_fetch).await;
        assert_eq!(skipped, Ok(None));
    }
}
