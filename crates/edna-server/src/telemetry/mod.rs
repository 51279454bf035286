pub(crate) mod rate_limiter;

use axum::http::StatusCode;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_default()
            .push(latency.as_nanos() as u64);
    }

    /// Prometheus exposition text: per-route/status counters plus latency
    /// quantiles in seconds.
    pub(crate) async fn render_prometheus(&self) -> String {
        let mut out = String::new();
        out.push_str("# TYPE edna_http_requests_total counter\n");
        let counts = self.counts.lock().await;
        let mut rows: Vec<(&(String, u16), &u64)> = counts.iter().collect();
        rows.sort();
        for ((route, status), count) in rows {
            out.push_str(&format!(
                "edna_http_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
            ));
        }
        drop(counts);

        out.push_str("# TYPE edna_http_request_duration_seconds summary\n");
        let latency = self.latency_ns.lock().await;
        let mut routes: Vec<(&String, &Vec<u64>)> = latency.iter().collect();
        routes.sort_by(|a, b| a.0.cmp(b.0));
        for (route, samples) in routes {
            let mut sorted = samples.clone();
            sorted.sort_unstable();
            for (label, q) in [("0.5", 0.50_f64), ("0.95", 0.95), ("0.99", 0.99)] {
                let secs = percentile_ns(&sorted, q) as f64 / 1e9;
                out.push_str(&format!(
                    "edna_http_request_duration_seconds{{route=\"{route}\",quantile=\"{label}\"}} {secs}\n"
                ));
            }
        }
        out
    }
}

fn percentile_ns(sorted: &[u64], q: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() as f64) * q).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}
