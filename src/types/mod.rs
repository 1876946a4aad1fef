//! Data model of the pipeline topology engine.
//!
//! Relations come from the compiled program, connectors from the registry;
//! the topology graph references both by name and id.

mod connector;
mod descriptors;
mod pipeline_status;
mod relation;
mod snapshot;
mod topology_edge;
mod topology_node;

pub use connector::{AttachedConnector, ConnectorDescriptor, Direction};
pub use descriptors::{PipelineDescr, ProgramDescr, ProgramStatus, UpdatePipelineRequest};
pub use pipeline_status::{BackendPipelineStatus, PipelineId, PipelineStatus};
pub use relation::{ColumnType, Field, ProgramSchema, Relation};
pub use snapshot::TopologySnapshot;
pub use topology_edge::TopologyEdge;
pub use topology_node::{
  INPUT_PLACEHOLDER_ID, NodeKind, OUTPUT_PLACEHOLDER_ID, PROGRAM_NODE_ID, Position, TopologyNode,
  is_protected_id, placeholder_id,
};
