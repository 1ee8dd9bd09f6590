//! upwatch-probe — reachability checking for upwatch.
//!
//! Probes registered services over HTTP, classifies each outcome, and
//! appends an immutable status record per probe to the state store.
//!
//! # Architecture
//!
//! ```text
//! CheckRunner
//!   ├── registry snapshot (read once per run)
//!   ├── bounded fan-out: probe() → ProbeReport, per service
//!   ├── record_status() → StatusRecord appended to StateStore
//!   └── CheckAllReport (results in registry order)
//! run_check_loop
//!   └── periodic check-all with watch-channel shutdown
//! ```
//!
//! # Failure model
//!
//! Probe failure is data, not an error: a timeout, refused connection, or
//! 5xx response becomes a `down` record and never aborts a batch. Only an
//! empty registry and storage failures surface as `CheckError`.

pub mod checker;
pub mod monitor;
pub mod runner;

pub use checker::{probe, ProbeOutcome, ProbeReport};
pub use monitor::run_check_loop;
pub use runner::{record_status, CheckAllReport, CheckError, CheckRunner};
