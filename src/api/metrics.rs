//! API Metrics
//!
//! Prometheus collectors owned by the API state and exposed on `/metrics`.

use crate::error::{Error, Result};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Outcome label of a served view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Failed => "failed",
        }
    }
}

/// Request metrics for the console API
pub struct ApiMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
    warnings: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("console_requests_total", "Served view requests by view and outcome"),
            &["view", "outcome"],
        )
        .map_err(metrics_error)?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "console_request_duration_seconds",
                "Time to assemble a view, including remote fetches",
            ),
            &["view"],
        )
        .map_err(metrics_error)?;
        let warnings = IntCounterVec::new(
            Opts::new(
                "console_non_critical_errors_total",
                "Non-critical errors reported alongside served views",
            ),
            &["view"],
        )
        .map_err(metrics_error)?;

        registry.register(Box::new(requests.clone())).map_err(metrics_error)?;
        registry.register(Box::new(duration.clone())).map_err(metrics_error)?;
        registry.register(Box::new(warnings.clone())).map_err(metrics_error)?;

        Ok(Self {
            registry,
            requests,
            duration,
            warnings,
        })
    }

    /// Record one served request
    pub fn observe(&self, view: &str, outcome: Outcome, elapsed: Duration, warnings: usize) {
        self.requests.with_label_values(&[view, outcome.as_str()]).inc();
        self.duration.with_label_values(&[view]).observe(elapsed.as_secs_f64());
        if warnings > 0 {
            self.warnings.with_label_values(&[view]).inc_by(warnings as u64);
        }
    }

    /// Text exposition of every collector
    pub fn render(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

fn metrics_error(err: prometheus::Error) -> Error {
    Error::Internal(format!("metrics: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_and_render() {
        let metrics = ApiMetrics::new().unwrap();
        metrics.observe("overview", Outcome::Ok, Duration::from_millis(12), 2);
        metrics.observe("overview", Outcome::Failed, Duration::from_millis(3), 0);

        let (content_type, body) = metrics.render().unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains(r#"console_requests_total{outcome="ok",view="overview"} 1"#));
        assert!(text.contains(r#"console_requests_total{outcome="failed",view="overview"} 1"#));
        assert!(text.contains(r#"console_non_critical_errors_total{view="overview"} 2"#));
        assert!(text.contains("console_request_duration_seconds_count"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = ApiMetrics::new().unwrap();
        let b = ApiMetrics::new().unwrap();
        a.observe("config", Outcome::Ok, Duration::ZERO, 0);

        let (_, body) = b.render().unwrap();
        assert!(!String::from_utf8(body).unwrap().contains("view=\"config\""));
    }
}
