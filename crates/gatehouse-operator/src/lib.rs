//! gatehouse operator: wiring between configuration, snapshots, the
//! translator, and the infra manager

#![deny(missing_docs)]

pub mod snapshot;

pub use snapshot::{translator_config, Snapshot};
