use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 30.0,
            refill_per_sec: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// Body cap for JSON endpoints.
    pub max_body_bytes: usize,
    /// Body cap for the multipart upload endpoint. Uploads are validated by
    /// name and size only, so this bounds transfer, not storage.
    pub max_upload_bytes: usize,
    pub discovery_ttl: Duration,
    pub enable_metrics: bool,
    pub enable_rate_limit: bool,
    pub rate_limit_per_ip: RateLimitConfig,
    /// Seed for the deterministic mock synthesizer. Same seed, same request
    /// order, same synthesized numbers.
    pub mock_seed: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 256 * 1024,
            max_upload_bytes: 600 * 1024 * 1024,
            discovery_ttl: Duration::from_secs(30),
            enable_metrics: true,
            enable_rate_limit: false,
            rate_limit_per_ip: RateLimitConfig::default(),
            mock_seed: 0x00ed_0a00,
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 || api.max_upload_bytes == 0 {
        return Err("api size limits must be > 0".to_string());
    }
    if api.max_upload_bytes < api.max_body_bytes {
        return Err("upload body cap must not be below the json body cap".to_string());
    }
    if api.discovery_ttl.is_zero() {
        return Err("discovery ttl must be > 0".to_string());
    }
    if api.enable_rate_limit
        && (api.rate_limit_per_ip.capacity < 1.0 || api.rate_limit_per_ip.refill_per_sec <= 0.0)
    {
        return Err("rate limiting requires capacity >= 1 and refill > 0".to_string());
    }
    Ok(())
}
