//! upwatch-state — embedded store for the upwatch monitor.
//!
//! Backed by [redb](https://docs.rs/redb), holds the service registry and
//! the append-only status history produced by probe runs.
//!
//! # Architecture
//!
//! Domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Status records are keyed by `{timestamp_nanos:020}:{record_id}` so that
//! lexicographic key order is chronological order; a reverse scan yields
//! records newest-first without sorting in memory.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks. Status reads run inside a single
//! read transaction, so a paginated query sees a consistent snapshot even
//! while probe runs append concurrently.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
