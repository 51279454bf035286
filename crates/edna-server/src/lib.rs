// SPDX-License-Identifier: Apache-2.0
//! HTTP service for the EDNA marine biodiversity platform.
//!
//! Every data-producing endpoint is backed by [`store::PlatformStore`], an
//! in-memory registry seeded with demo fixtures, and by a deterministic
//! mock synthesizer for analysis numbers. The service exists to exercise
//! the dashboard's API contract, not to run a real pipeline.

#![forbid(unsafe_code)]

pub mod config;
pub mod http;
pub(crate) mod mock;
pub mod store;
pub mod telemetry;

use crate::config::ApiConfig;
use crate::mock::MockRng;
use crate::store::PlatformStore;
use crate::telemetry::rate_limiter::RateLimiter;
use crate::telemetry::RequestMetrics;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn now_plus_minutes_iso(minutes: i64) -> String {
    (Utc::now() + ChronoDuration::minutes(minutes)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Audit-log timestamp form: `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn now_audit() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlatformStore>,
    pub api: ApiConfig,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) ip_limiter: Arc<RateLimiter>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
    pub(crate) mock: Arc<Mutex<MockRng>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn PlatformStore>) -> Self {
        Self::with_config(store, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<dyn PlatformStore>, api: ApiConfig) -> Self {
        let mock = Arc::new(Mutex::new(MockRng::seeded(api.mock_seed)));
        Self {
            store,
            ready: Arc::new(AtomicBool::new(true)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            ip_limiter: Arc::new(RateLimiter::new()),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            mock,
            api,
        }
    }

    /// The synthesizer mutex is only poisoned if a holder panicked; recover
    /// the stream rather than propagating the poison.
    pub(crate) fn lock_mock(&self) -> MutexGuard<'_, MockRng> {
        match self.mock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::ops::healthz_handler))
        .route("/readyz", get(http::ops::readyz_handler))
        .route("/metrics", get(http::ops::metrics_handler))
        .route("/v1/version", get(http::ops::version_handler))
        .route("/v1/openapi.json", get(http::ops::openapi_handler))
        .route(
            "/api/samples",
            get(http::samples::list_samples_handler).post(http::samples::create_sample_handler),
        )
        .route(
            "/api/upload",
            post(http::upload::upload_handler)
                .layer(DefaultBodyLimit::max(state.api.max_upload_bytes)),
        )
        .route(
            "/api/ml-pipeline",
            get(http::pipeline::run_status_handler).post(http::pipeline::start_run_handler),
        )
        .route("/api/taxonomy", get(http::taxonomy::taxonomy_handler))
        .route(
            "/api/credentials",
            get(http::vault::list_credentials_handler)
                .post(http::vault::create_credential_handler)
                .delete(http::vault::delete_credential_handler),
        )
        .route(
            "/api/security/logs",
            get(http::vault::list_logs_handler).post(http::vault::record_log_handler),
        )
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}

pub use store::InMemoryStore;
