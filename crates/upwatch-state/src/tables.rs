//! redb table definitions for the upwatch state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).

use redb::TableDefinition;

/// Registered services keyed by `{service_id}`.
pub const SERVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("services");

/// Status records keyed by `{timestamp_nanos:020}:{record_id}`.
///
/// The zero-padded nanosecond prefix makes key order chronological; the
/// record id suffix breaks ties between records stamped in the same
/// nanosecond.
pub const STATUSES: TableDefinition<&str, &[u8]> = TableDefinition::new("statuses");
