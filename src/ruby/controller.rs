use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smallvec::{smallvec, SmallVec};

use crate::ruby::channel::{LlcRequestBuffer, MessageBuffer};
use crate::ruby::geometry::CacheGeometry;
use crate::ruby::multicast::MulticastProfile;
use crate::sim::config::{PrefetchConfig, ProtocolConfig};
use crate::sim::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ControllerKind {
    PrivateInstr,
    PrivateData,
    UnifiedL1,
    L2Bank,
    Directory,
    Dma,
    Io,
}

impl ControllerKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ControllerKind::PrivateInstr => "l0i_cntrl",
            ControllerKind::PrivateData => "l0d_cntrl",
            ControllerKind::UnifiedL1 => "l1_cntrl",
            ControllerKind::L2Bank => "l2_cntrl",
            ControllerKind::Directory => "dir_cntrl",
            ControllerKind::Dma => "dma_cntrl",
            ControllerKind::Io => "io_controller",
        }
    }
}

/// Controllers are numbered densely from 0 within each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControllerId {
    pub kind: ControllerKind,
    pub id: usize,
}

impl ControllerId {
    pub const fn new(kind: ControllerKind, id: usize) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ControllerKind::Io => write!(f, "{}", self.kind.prefix()),
            _ => write!(f, "{}{}", self.kind.prefix(), self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockDomain {
    pub name: String,
    pub divider: u32,
}

impl ClockDomain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            divider: 1,
        }
    }

    /// A domain ticking once every `divider` cycles of `self`.
    pub fn derived(&self, name: impl Into<String>, divider: u32) -> Self {
        Self {
            name: name.into(),
            divider: self.divider * divider,
        }
    }
}

/// Controller-side view of one core's L0 pair. The I and D controllers hold
/// clones of the same handles.
#[derive(Debug, Clone)]
pub struct L0Ports {
    pub mandatory_queue: Arc<MessageBuffer>,
    pub prefetch_queue: Arc<MessageBuffer>,
    pub to_l1: Arc<MessageBuffer>,
    pub from_l1: Arc<MessageBuffer>,
}

#[derive(Debug, Clone)]
pub struct L1Ports {
    pub from_l0: Arc<MessageBuffer>,
    pub to_l0: Arc<MessageBuffer>,
    pub request_to_l2: Arc<MessageBuffer>,
    pub response_to_l2: Arc<MessageBuffer>,
    pub unblock_to_l2: Arc<MessageBuffer>,
    pub request_from_l2: Arc<MessageBuffer>,
    pub response_from_l2: Arc<MessageBuffer>,
    pub prefetch_queue: Arc<MessageBuffer>,
}

#[derive(Debug, Clone)]
pub struct L2Ports {
    pub dir_request_out: Arc<MessageBuffer>,
    pub l1_request_out: Arc<MessageBuffer>,
    pub response_out: Arc<MessageBuffer>,
    pub unblock_in: Arc<MessageBuffer>,
    pub l1_request_in: LlcRequestBuffer,
    pub response_in: Arc<MessageBuffer>,
}

#[derive(Debug, Clone)]
pub struct DirectoryPorts {
    pub request_in: Arc<MessageBuffer>,
    pub response_in: Arc<MessageBuffer>,
    pub response_out: Arc<MessageBuffer>,
    pub request_to_memory: Arc<MessageBuffer>,
    pub response_from_memory: Arc<MessageBuffer>,
}

#[derive(Debug, Clone)]
pub struct DmaPorts {
    pub mandatory_queue: Arc<MessageBuffer>,
    pub response_from_dir: Arc<MessageBuffer>,
    pub request_to_dir: Arc<MessageBuffer>,
}

pub type BufferList<'a> = SmallVec<[&'a MessageBuffer; 8]>;

impl L0Ports {
    pub fn buffers(&self) -> BufferList<'_> {
        smallvec![
            &*self.mandatory_queue,
            &*self.prefetch_queue,
            &*self.to_l1,
            &*self.from_l1,
        ]
    }
}

impl L1Ports {
    pub fn buffers(&self) -> BufferList<'_> {
        smallvec![
            &*self.from_l0,
            &*self.to_l0,
            &*self.request_to_l2,
            &*self.response_to_l2,
            &*self.unblock_to_l2,
            &*self.request_from_l2,
            &*self.response_from_l2,
            &*self.prefetch_queue,
        ]
    }
}

impl L2Ports {
    pub fn buffers(&self) -> BufferList<'_> {
        smallvec![
            &*self.dir_request_out,
            &*self.l1_request_out,
            &*self.response_out,
            &*self.unblock_in,
            &**self.l1_request_in.buffer(),
            &*self.response_in,
        ]
    }
}

impl DirectoryPorts {
    pub fn buffers(&self) -> BufferList<'_> {
        smallvec![
            &*self.request_in,
            &*self.response_in,
            &*self.response_out,
            &*self.request_to_memory,
            &*self.response_from_memory,
        ]
    }
}

impl DmaPorts {
    pub fn buffers(&self) -> BufferList<'_> {
        smallvec![
            &*self.mandatory_queue,
            &*self.response_from_dir,
            &*self.request_to_dir,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefetcherKind {
    Stride,
    Bingo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrefetcherDescriptor {
    pub kind: PrefetcherKind,
    pub enabled: bool,
    pub num_streams: usize,
    pub unit_filter: usize,
    pub nonunit_filter: usize,
    pub train_misses: usize,
    pub num_startup_pfs: usize,
    pub cross_page: bool,
}

impl PrefetcherDescriptor {
    pub fn new(kind: PrefetcherKind, enabled: bool, config: &PrefetchConfig) -> Self {
        Self {
            kind,
            enabled,
            num_streams: config.num_streams,
            unit_filter: config.unit_filter,
            nonunit_filter: config.nonunit_filter,
            train_misses: config.train_misses,
            num_startup_pfs: config.num_startup_pfs,
            cross_page: config.cross_page,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrivateCache {
    pub geometry: CacheGeometry,
    pub core: usize,
    pub l1: ControllerId,
    pub sibling: ControllerId,
    /// Built but switched off; L0 never prefetches on its own.
    pub prefetcher: PrefetcherDescriptor,
    pub bingo: PrefetcherDescriptor,
    pub prefetch_l2_only: bool,
    pub multicast: Arc<MulticastProfile>,
    pub protocol: Arc<ProtocolConfig>,
    pub print_evict_dist: bool,
    pub ports: L0Ports,
}

#[derive(Debug, Clone)]
pub struct L1Cache {
    pub geometry: CacheGeometry,
    pub core: usize,
    pub l0i: ControllerId,
    pub l0d: ControllerId,
    pub l2_select_bits: u32,
    pub num_cores: usize,
    pub prefetcher: PrefetcherDescriptor,
    pub multicast: Arc<MulticastProfile>,
    pub protocol: Arc<ProtocolConfig>,
    pub print_evict_dist: bool,
    pub ports: L1Ports,
}

#[derive(Debug, Clone)]
pub struct L2Bank {
    pub geometry: CacheGeometry,
    pub num_cores: usize,
    pub group_count: u32,
    pub window_cycles: u64,
    pub profile_llc_sharers: bool,
    pub protocol: Arc<ProtocolConfig>,
    pub print_evict_dist: bool,
    pub ports: L2Ports,
}

#[derive(Debug, Clone)]
pub struct Directory {
    /// Serves the boot ROM rather than main memory.
    pub rom: bool,
    pub ports: DirectoryPorts,
}

#[derive(Debug, Clone)]
pub struct DmaEngine {
    pub port: String,
    pub sequencer_version: usize,
    pub ports: DmaPorts,
}

#[derive(Debug, Clone)]
pub enum ControllerRole {
    Private(PrivateCache),
    L1(L1Cache),
    L2(L2Bank),
    Directory(Directory),
    Dma(DmaEngine),
}

#[derive(Debug, Clone)]
pub struct Controller {
    id: ControllerId,
    cluster: Option<usize>,
    tbe_capacity: usize,
    transitions_per_cycle: usize,
    clock_domain: ClockDomain,
    role: ControllerRole,
}

impl Controller {
    pub fn new(
        id: ControllerId,
        cluster: Option<usize>,
        tbe_capacity: usize,
        transitions_per_cycle: usize,
        clock_domain: ClockDomain,
        role: ControllerRole,
    ) -> Self {
        Self {
            id,
            cluster,
            tbe_capacity,
            transitions_per_cycle,
            clock_domain,
            role,
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn kind(&self) -> ControllerKind {
        self.id.kind
    }

    pub fn cluster(&self) -> Option<usize> {
        self.cluster
    }

    pub fn tbe_capacity(&self) -> usize {
        self.tbe_capacity
    }

    pub fn transitions_per_cycle(&self) -> usize {
        self.transitions_per_cycle
    }

    pub fn clock_domain(&self) -> &ClockDomain {
        &self.clock_domain
    }

    pub fn role(&self) -> &ControllerRole {
        &self.role
    }

    pub fn cache_geometry(&self) -> Option<&CacheGeometry> {
        match &self.role {
            ControllerRole::Private(c) => Some(&c.geometry),
            ControllerRole::L1(c) => Some(&c.geometry),
            ControllerRole::L2(c) => Some(&c.geometry),
            ControllerRole::Directory(_) | ControllerRole::Dma(_) => None,
        }
    }

    pub fn buffers(&self) -> BufferList<'_> {
        match &self.role {
            ControllerRole::Private(c) => c.ports.buffers(),
            ControllerRole::L1(c) => c.ports.buffers(),
            ControllerRole::L2(c) => c.ports.buffers(),
            ControllerRole::Directory(c) => c.ports.buffers(),
            ControllerRole::Dma(c) => c.ports.buffers(),
        }
    }
}

/// Every controller built for one system, keyed by (kind, id).
#[derive(Debug, Default)]
pub struct ControllerTable {
    controllers: BTreeMap<ControllerId, Controller>,
}

impl ControllerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, controller: Controller) -> Result<(), ConfigError> {
        match self.controllers.entry(controller.id()) {
            btree_map::Entry::Occupied(entry) => {
                Err(ConfigError::DuplicateController(*entry.key()))
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(controller);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: ControllerId) -> Option<&Controller> {
        self.controllers.get(&id)
    }

    pub fn lookup(&self, kind: ControllerKind, id: usize) -> Option<&Controller> {
        self.get(ControllerId::new(kind, id))
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn count(&self, kind: ControllerKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Controllers of one kind in ascending id order.
    pub fn of_kind(&self, kind: ControllerKind) -> impl Iterator<Item = &Controller> + '_ {
        self.controllers
            .range(ControllerId::new(kind, 0)..=ControllerId::new(kind, usize::MAX))
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Controller> + '_ {
        self.controllers.values()
    }
}

pub const SEQUENCER_MAX_OUTSTANDING: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SequencerKind {
    Cpu,
    Dma,
    Io,
}

/// The request port a core or DMA engine issues into the protocol through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencerHandle {
    pub kind: SequencerKind,
    pub version: usize,
    /// Controller the sequencer feeds; for a core, its L0 data cache.
    pub controller: ControllerId,
    pub max_outstanding_requests: usize,
    pub clock_domain: ClockDomain,
    pub port: Option<String>,
}
