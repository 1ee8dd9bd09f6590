//! Domain types for the upwatch state store.
//!
//! These types represent the persisted state: registered services and the
//! append-only status records written after each probe. All types are
//! serializable to/from JSON for storage in redb tables; timestamps go over
//! the wire as ISO-8601 strings via chrono's serde support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a registered service (uuid string).
pub type ServiceId = String;

/// Unique identifier for a status record (uuid string).
pub type RecordId = String;

// ── Service registry ──────────────────────────────────────────────

/// A service registered for monitoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSpec {
    pub id: ServiceId,
    pub name: String,
    /// Probe target. Stored as given; malformed URLs surface as failed probes.
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Status history ────────────────────────────────────────────────

/// Reachability classification of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Up,
    Down,
}

/// Immutable outcome of one probe against one service.
///
/// Records are append-only: never updated or deleted once written, and a
/// record may outlive the service it refers to. Exactly one of
/// `response_code` / `error_message` is set for a failed probe; both are
/// absent only when the probe succeeded, and a down-via-5xx probe carries
/// the response code with no error message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusRecord {
    pub id: RecordId,
    pub service_id: ServiceId,
    pub status: ServiceStatus,
    /// Probe duration in milliseconds, recorded for failures too.
    pub latency_ms: f64,
    /// HTTP status code, when a response was received.
    pub response_code: Option<u16>,
    /// Failure description, when no usable response was received.
    pub error_message: Option<String>,
    /// Stamped once at record time; the sole ordering key for queries.
    pub timestamp: DateTime<Utc>,
}

impl StatusRecord {
    /// Build the composite key for the statuses table.
    ///
    /// Pre-epoch and post-2262 timestamps are not representable in the
    /// nanosecond prefix; they clamp to the key-space boundaries.
    pub fn table_key(&self) -> String {
        let nanos = self.timestamp.timestamp_nanos_opt().unwrap_or(i64::MAX).max(0);
        format!("{nanos:020}:{}", self.id)
    }
}
