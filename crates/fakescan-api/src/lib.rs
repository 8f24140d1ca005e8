//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /predict` and `POST /predict_video` over a shared detection service
//! - Liveness and readiness probes
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
