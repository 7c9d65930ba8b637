//! Observability ecosystem dependencies, to ensure consistent versions and
//! unified updates across every crate in this workspace.
//!
//! Crates should use the `tracing` crate for all logging/tracing needs,
//! via `use observability_deps::tracing::{debug, info, ...}`, rather than
//! depending on `tracing` directly. This allows for a single place to
//! control the versions of these dependencies.

pub use tracing;
pub use tracing_core;
