//! Probe logic — one bounded-time HTTP GET, classified.
//!
//! The prober never fails visibly: every network outcome, including
//! timeouts and malformed URLs, is converted into a `ProbeReport`.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::debug;
use upwatch_state::ServiceStatus;

/// Classified outcome of a single probe attempt.
///
/// Exactly one shape per failure class, so a report can never carry both a
/// response code and an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A response arrived before the deadline, with this status code.
    Responded(u16),
    /// The deadline expired with no response.
    TimedOut,
    /// Connection-level failure (DNS, refused, TLS) before any response.
    ConnectFailed(String),
    /// Any other failure, including unparseable target URLs.
    Failed(String),
}

impl ProbeOutcome {
    /// Fold the outcome and measured latency into record-shaped fields.
    ///
    /// A 5xx response classifies as down but keeps its response code and
    /// carries no error message.
    pub fn into_report(self, latency_ms: f64) -> ProbeReport {
        match self {
            Self::Responded(code) => ProbeReport {
                status: if code < 500 {
                    ServiceStatus::Up
                } else {
                    ServiceStatus::Down
                },
                latency_ms,
                response_code: Some(code),
                error_message: None,
            },
            Self::TimedOut => ProbeReport {
                status: ServiceStatus::Down,
                latency_ms,
                response_code: None,
                error_message: Some("Request timeout".to_string()),
            },
            Self::ConnectFailed(detail) => ProbeReport {
                status: ServiceStatus::Down,
                latency_ms,
                response_code: None,
                error_message: Some(format!("Connection error: {detail}")),
            },
            Self::Failed(detail) => ProbeReport {
                status: ServiceStatus::Down,
                latency_ms,
                response_code: None,
                error_message: Some(format!("Error: {detail}")),
            },
        }
    }
}

/// Result of one probe, ready to be recorded against a service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub status: ServiceStatus,
    /// Elapsed wall-clock milliseconds, present in every branch.
    pub latency_ms: f64,
    pub response_code: Option<u16>,
    pub error_message: Option<String>,
}

/// Perform a single HTTP GET against `url` with the given timeout.
///
/// One outbound request, no retries, the client's default redirect policy,
/// no state between calls. The URL is not validated up front; a malformed
/// one surfaces through the failure classification like any other error.
pub async fn probe(client: &Client, url: &str, timeout: Duration) -> ProbeReport {
    let start = Instant::now();

    let outcome = match client.get(url).timeout(timeout).send().await {
        Ok(response) => ProbeOutcome::Responded(response.status().as_u16()),
        // A timed-out connect sets both flags; timeout classification wins.
        Err(e) if e.is_timeout() => {
            debug!(%url, "probe timed out");
            ProbeOutcome::TimedOut
        }
        Err(e) if e.is_connect() => {
            debug!(%url, error = %e, "probe connection failed");
            ProbeOutcome::ConnectFailed(e.to_string())
        }
        Err(e) => {
            debug!(%url, error = %e, "probe failed");
            ProbeOutcome::Failed(e.to_string())
        }
    };

    let latency_ms = round2(start.elapsed().as_secs_f64() * 1000.0);
    outcome.into_report(latency_ms)
}

/// Round to two decimal places for recorded latencies.
fn round2(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
