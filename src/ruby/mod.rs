pub mod channel;
pub mod controller;
pub mod factory;
pub mod geometry;
pub mod multicast;
pub mod network;
pub mod peripheral;
pub mod registrar;
pub mod topology;
pub mod wiring;

pub use channel::{
    BufferPolicy, CoalescingConfig, Direction, Endpoint, LlcRequestBuffer, MessageBuffer,
    SharerProfiling,
};
pub use controller::{
    ClockDomain, Controller, ControllerId, ControllerKind, ControllerRole, ControllerTable,
    SequencerHandle, SequencerKind,
};
pub use factory::{ControllerFactory, TBE_POOL_SIZE};
pub use geometry::{resolve_geometry, CacheGeometry, ClusterPlan, Geometry};
pub use multicast::{multicast_profile, MulticastProfile, Workload, WILDCARD_PC};
pub use network::{
    CoherenceConstraint, MulticastMode, NetworkParams, NocOrdering, OrderedConstraint,
    PrepushFilter,
};
pub use peripheral::{Directories, DmaPort};
pub use registrar::{CacheRecord, CpuRecord, RecordingRegistrar, TopologyRegistrar};
pub use topology::{
    create_system, Pt2PtNetwork, Pt2PtTopology, RubySystem, SystemHandles, Topology,
    TopologyConstructor, TopologySummary,
};
pub use wiring::{BufferDefaults, ChannelWirer};

#[cfg(test)]
mod unit_tests;
