//! REST API client module for the grocery inventory service.
//!
//! This module provides the `PantryApi` trait that screens depend on and
//! `ApiClient`, its reqwest implementation. Requests are authenticated with
//! the bearer token returned by `/auth/login`.

pub mod client;
pub mod error;
pub mod service;

pub use client::ApiClient;
pub use error::ApiError;
pub use service::PantryApi;
