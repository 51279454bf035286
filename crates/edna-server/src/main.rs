// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use edna_server::config::{validate_startup_config_contract, ApiConfig, RateLimitConfig};
use edna_server::{build_router, AppState, InMemoryStore};
use std::env;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("EDNA_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn config_from_env() -> ApiConfig {
    let defaults = ApiConfig::default();
    ApiConfig {
        max_body_bytes: env_usize("EDNA_MAX_BODY_BYTES", defaults.max_body_bytes),
        max_upload_bytes: env_usize("EDNA_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        discovery_ttl: Duration::from_secs(env_u64(
            "EDNA_DISCOVERY_TTL_SECS",
            defaults.discovery_ttl.as_secs(),
        )),
        enable_metrics: env_bool("EDNA_ENABLE_METRICS", defaults.enable_metrics),
        enable_rate_limit: env_bool("EDNA_ENABLE_RATE_LIMIT", defaults.enable_rate_limit),
        rate_limit_per_ip: RateLimitConfig {
            capacity: env_f64(
                "EDNA_RATE_LIMIT_CAPACITY",
                defaults.rate_limit_per_ip.capacity,
            ),
            refill_per_sec: env_f64(
                "EDNA_RATE_LIMIT_REFILL_PER_SEC",
                defaults.rate_limit_per_ip.refill_per_sec,
            ),
        },
        mock_seed: env_u64("EDNA_MOCK_SEED", defaults.mock_seed),
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();
    let api = config_from_env();
    validate_startup_config_contract(&api)?;

    let store =
        InMemoryStore::seeded().map_err(|e| format!("fixture seed failed: {e}"))?;
    let state = AppState::with_config(Arc::new(store), api);
    let app = build_router(state.clone());

    let bind_addr = env::var("EDNA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket
        .set_keepalive(env_bool("EDNA_TCP_KEEPALIVE_ENABLED", true))
        .map_err(|e| format!("set_keepalive failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("edna-server listening on {bind_addr}");

    let accepting = state.accepting_requests.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            accepting.store(false, Ordering::Relaxed);
            let drain_ms = env_u64("EDNA_SHUTDOWN_DRAIN_MS", 5000);
            tokio::time::sleep(Duration::from_millis(drain_ms)).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
