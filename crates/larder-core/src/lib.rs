//! Larder core library.
//!
//! Shared pieces of the larder grocery-inventory client: the REST API
//! client, models, session handling, the per-user TTL cache and the
//! cancellable request coordinator the screens fetch through.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod request;
pub mod screens;
pub mod utils;
