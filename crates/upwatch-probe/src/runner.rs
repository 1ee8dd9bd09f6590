//! Check-all runner — probes every registered service and records results.
//!
//! The runner takes one registry snapshot per run, fans probes out with
//! bounded concurrency, and appends one status record per service. Probe
//! failures are recorded as `down`; only an empty registry or a storage
//! failure aborts a run.

use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use upwatch_state::{ServiceStatus, StateError, StateStore, StatusRecord};

use crate::checker::{probe, ProbeReport};

/// Errors a check-all run can surface to its caller.
///
/// Network failures of individual probes are deliberately absent: they are
/// converted into `down` records inside the run.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("no services registered")]
    NoServices,

    #[error(transparent)]
    State(#[from] StateError),

    #[error("probe task failed: {0}")]
    Task(String),
}

/// Aggregate result of one check-all run.
#[derive(Debug)]
pub struct CheckAllReport {
    /// Number of services in the registry snapshot, successful or not.
    pub checked_count: usize,
    /// One record per service, in registry snapshot order.
    pub results: Vec<StatusRecord>,
}

/// Build a status record from a probe report and append it durably.
///
/// The timestamp is stamped here, at record time, not at probe start. The
/// service id is taken as-is — a service deleted mid-run still gets its
/// record.
pub fn record_status(
    store: &StateStore,
    service_id: &str,
    report: ProbeReport,
) -> Result<StatusRecord, StateError> {
    let record = StatusRecord {
        id: Uuid::new_v4().to_string(),
        service_id: service_id.to_string(),
        status: report.status,
        latency_ms: report.latency_ms,
        response_code: report.response_code,
        error_message: report.error_message,
        timestamp: Utc::now(),
    };
    store.append_status(&record)?;
    debug!(
        service_id = %record.service_id,
        status = ?record.status,
        latency_ms = record.latency_ms,
        "status recorded"
    );
    Ok(record)
}

/// Probes the full registry and records every outcome.
pub struct CheckRunner {
    store: StateStore,
    client: Client,
    timeout: Duration,
    concurrency: usize,
}

impl CheckRunner {
    /// Create a runner sharing the given store and HTTP client.
    pub fn new(store: StateStore, client: Client, timeout: Duration, concurrency: usize) -> Self {
        Self {
            store,
            client,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// The state store this runner records into.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Probe every registered service once and persist each result.
    ///
    /// The registry is snapshotted once at the start; services added during
    /// the run are not probed. At most `concurrency` probes are in flight at
    /// a time, each in its own spawned task so an in-flight probe runs to
    /// completion even if this future is dropped, while no further probes
    /// start. Result order matches the snapshot, not completion order.
    pub async fn check_all(&self) -> Result<CheckAllReport, CheckError> {
        let services = self.store.list_services()?;
        if services.is_empty() {
            return Err(CheckError::NoServices);
        }
        let checked_count = services.len();
        info!(services = checked_count, "check-all starting");

        let joined: Vec<_> = futures::stream::iter(services.into_iter().map(|service| {
            let client = self.client.clone();
            let store = self.store.clone();
            let timeout = self.timeout;
            async move {
                tokio::spawn(async move {
                    let report = probe(&client, &service.url, timeout).await;
                    record_status(&store, &service.id, report)
                })
                .await
            }
        }))
        .buffered(self.concurrency)
        .collect()
        .await;

        let mut results = Vec::with_capacity(checked_count);
        for handle in joined {
            let record = handle.map_err(|e| CheckError::Task(e.to_string()))??;
            results.push(record);
        }

        let up = results
            .iter()
            .filter(|r| r.status == ServiceStatus::Up)
            .count();
        info!(checked = checked_count, up, down = checked_count - up, "check-all finished");

        Ok(CheckAllReport {
            checked_count,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use upwatch_state::ServiceSpec;

    fn register(store: &StateStore, id: &str, url: &str) {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        store
            .put_service(&ServiceSpec {
                id: id.to_string(),
                name: id.to_string(),
                url: url.to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    fn runner(store: &StateStore) -> CheckRunner {
        CheckRunner::new(
            store.clone(),
            Client::new(),
            Duration::from_secs(2),
            4,
        )
    }

    #[tokio::test]
    async fn check_all_empty_registry_is_an_error() {
        let store = StateStore::open_in_memory().unwrap();

        let result = runner(&store).check_all().await;

        assert!(matches!(result, Err(CheckError::NoServices)));
        // The precondition failure must not leave records behind.
        assert_eq!(store.count_statuses(None).unwrap(), 0);
    }

    #[tokio::test]
    async fn check_all_yields_one_record_per_service() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;

        let store = StateStore::open_in_memory().unwrap();
        register(&store, "svc-up", &server.url());
        register(&store, "svc-down", "http://127.0.0.1:1/");

        let report = runner(&store).check_all().await.unwrap();

        assert_eq!(report.checked_count, 2);
        assert_eq!(report.results.len(), 2);
        assert_eq!(store.count_statuses(None).unwrap(), 2);
    }

    #[tokio::test]
    async fn check_all_results_follow_registry_order() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;

        let store = StateStore::open_in_memory().unwrap();
        register(&store, "svc-c", "http://127.0.0.1:1/");
        register(&store, "svc-a", &server.url());
        register(&store, "svc-b", "http://127.0.0.1:1/");

        let report = runner(&store).check_all().await.unwrap();

        let snapshot: Vec<String> = store
            .list_services()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        let result_order: Vec<&str> = report
            .results
            .iter()
            .map(|r| r.service_id.as_str())
            .collect();
        assert_eq!(
            result_order,
            snapshot.iter().map(String::as_str).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn check_all_classifies_up_and_down_fields() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;

        let store = StateStore::open_in_memory().unwrap();
        register(&store, "svc-up", &server.url());
        register(&store, "svc-down", "http://127.0.0.1:1/");

        let report = runner(&store).check_all().await.unwrap();

        let up = report
            .results
            .iter()
            .find(|r| r.service_id == "svc-up")
            .unwrap();
        assert_eq!(up.status, ServiceStatus::Up);
        assert_eq!(up.response_code, Some(200));
        assert_eq!(up.error_message, None);

        let down = report
            .results
            .iter()
            .find(|r| r.service_id == "svc-down")
            .unwrap();
        assert_eq!(down.status, ServiceStatus::Down);
        assert_eq!(down.response_code, None);
        assert!(
            down.error_message
                .as_deref()
                .unwrap()
                .starts_with("Connection error: ")
        );
    }

    #[tokio::test]
    async fn check_all_survives_an_all_down_batch() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "svc-1", "http://127.0.0.1:1/");
        register(&store, "svc-2", "http://127.0.0.1:1/");
        register(&store, "svc-3", "not a url");

        let report = runner(&store).check_all().await.unwrap();

        assert_eq!(report.checked_count, 3);
        assert!(report
            .results
            .iter()
            .all(|r| r.status == ServiceStatus::Down));
        assert_eq!(store.count_statuses(None).unwrap(), 3);
    }

    #[tokio::test]
    async fn record_status_stamps_fresh_identity() {
        let store = StateStore::open_in_memory().unwrap();
        let report = ProbeReport {
            status: ServiceStatus::Up,
            latency_ms: 12.34,
            response_code: Some(200),
            error_message: None,
        };

        let first = record_status(&store, "svc-1", report.clone()).unwrap();
        let second = record_status(&store, "svc-1", report).unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.timestamp >= first.timestamp);
        assert_eq!(store.count_statuses(Some("svc-1")).unwrap(), 2);
    }
}
