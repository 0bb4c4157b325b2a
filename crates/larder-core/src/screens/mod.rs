//! Screen view-models.
//!
//! Each screen owns a `ScreenScope` and follows the same protocol: look in
//! the shared cache first, fetch through its coordinator on a miss and write
//! the result through, invalidate affected keys after every mutation, and
//! cancel outstanding fetches when deactivated.

pub mod account;
pub mod camera;
pub mod inventory;
pub mod preferences;

#[cfg(test)]
pub(crate) mod fake;

pub use account::{AccountScreen, SignUpForm};
pub use camera::CameraScreen;
pub use inventory::InventoryScreen;
pub use preferences::PreferencesScreen;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] anyhow::Error),
}

impl ScreenError {
    /// Whether the user has to sign in (again) before retrying.
    pub fn requires_login(&self) -> bool {
        match self {
            ScreenError::NotSignedIn => true,
            ScreenError::Validation(_) => false,
            ScreenError::Api(e) => e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<ApiError>())
                .any(ApiError::requires_login),
        }
    }
}

pub type ScreenResult<T> = std::result::Result<T, ScreenError>;

/// Where a screen's data came from on its last load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loaded {
    FromCache,
    FromNetwork,
    /// The fetch was cancelled before it settled; nothing was changed.
    Cancelled,
    /// The fetch failed and the screen fell back to defaults.
    Fallback,
    /// A change was saved, but the list could not be fetched again
    /// afterwards and may be out of date.
    RefreshFailed,
}
