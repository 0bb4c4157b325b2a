//! Cancellation-aware request coordination for screens.
//!
//! This module provides:
//! - `RequestCoordinator`: runs fetches and suppresses results that arrive
//!   after the screen stopped caring about them
//! - `ScreenScope` / `ActiveScreen`: ties a coordinator to a screen's active
//!   lifetime so every exit path cancels outstanding work

pub mod coordinator;
pub mod scope;

pub use coordinator::{PendingRequest, RequestCoordinator, RequestId};
pub use scope::{ActiveScreen, ScreenScope};
