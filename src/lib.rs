//! # pipeline-topology
//!
//! Client-side engine for streaming pipelines built from a SQL program and
//! attached input/output connectors.
//!
//! ## Architecture
//!
//! - [`schema_matcher`]: can an attachment be wired to a program relation?
//! - [`TopologyStore`]: owns the node/edge graph and keeps it valid.
//! - [`LayoutEngine`]: deterministic column layout, rerun after every change.
//! - [`Reconciler`]: start/pause/shutdown with optimistic status, corrected by polling.
//!
//! Rendering, connector forms and the HTTP client live elsewhere; the engine
//! talks to them through snapshots and the traits in [`lifecycle`].

pub mod config;
pub mod error;
pub mod layout;
pub mod lifecycle;
pub mod schema_matcher;
pub mod session;
pub mod topology_store;
#[cfg(test)]
mod topology_store_test;
pub mod types;

pub use config::EngineConfig;
pub use error::{CommandError, ConfigError, TopologyError};
pub use layout::{LayoutConfig, LayoutEngine};
pub use lifecycle::{CommandOutcome, PollHandle, Reconciler};
pub use topology_store::TopologyStore;
pub use types::{
  AttachedConnector, ConnectorDescriptor, PipelineId, PipelineStatus, ProgramSchema,
  TopologySnapshot,
};
