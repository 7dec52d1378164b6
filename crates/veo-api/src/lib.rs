//! Axum HTTP gateway for Veo3 text-to-video generation.
//!
//! This crate provides:
//! - Bearer API key authentication
//! - An in-memory task store with admission control
//! - Background orchestration of generation jobs
//! - Direct and webhook-tolerant endpoints
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
pub mod store;

pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use store::TaskStore;
