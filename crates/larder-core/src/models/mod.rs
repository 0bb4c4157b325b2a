//! Data models for the grocery inventory API.
//!
//! - `InventoryItem`, `NewItem`: pantry entries and the form used to create them
//! - `Preferences`, `DietaryFlag`: dietary preference toggles
//! - `ImageAnalysis`: vision API response for a captured photo
//! - `User`, `UserId`: the signed-in account

pub mod inventory;
pub mod preferences;
pub mod recognition;
pub mod user;

pub use inventory::{ExpiryStatus, InventoryItem, NewItem};
pub use preferences::{DietaryFlag, Preferences};
pub use recognition::{DetectedItem, ImageAnalysis, SegmentationResult};
pub use user::{User, UserId};
