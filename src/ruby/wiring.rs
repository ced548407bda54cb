use std::sync::Arc;

use log::trace;

use crate::ruby::channel::{
    BufferPolicy, CoalescingConfig, Direction, Endpoint, LlcRequestBuffer, MessageBuffer,
    SharerProfiling,
};
use crate::ruby::controller::{
    ControllerId, DirectoryPorts, DmaPorts, L0Ports, L1Ports, L2Ports,
};
use crate::ruby::network::NetworkPorts;
use crate::sim::config::RubyConfig;

/// Settings every buffer inherits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDefaults {
    pub capacity: usize,
    pub filter_drop: bool,
}

impl From<&RubyConfig> for BufferDefaults {
    fn from(config: &RubyConfig) -> Self {
        Self {
            capacity: config.message_buffer_size,
            filter_drop: config.filter_drop,
        }
    }
}

/// The two halves of a core's private L0<->L1 link.
#[derive(Debug, Clone)]
pub struct CoreLink {
    pub l0_to_l1: Arc<MessageBuffer>,
    pub l1_to_l0: Arc<MessageBuffer>,
}

/// Creates message buffers and attaches the network-facing ones to the NoC
/// as each controller's ports are built.
pub struct ChannelWirer<'a> {
    defaults: BufferDefaults,
    coalescing: Option<CoalescingConfig>,
    sharer_profiling: Option<SharerProfiling>,
    network: &'a mut NetworkPorts,
}

impl<'a> ChannelWirer<'a> {
    pub fn new(config: &RubyConfig, network: &'a mut NetworkPorts) -> Self {
        let coalescing = config.coalescing.then_some(CoalescingConfig {
            line_bytes: config.cacheline_size,
        });
        let sharer_profiling = config.profile_llc_sharers.then_some(SharerProfiling {
            pc_low: config.profile_pc_low,
            pc_high: config.profile_pc_high,
            window_cycles: config.window_cycles,
        });
        Self {
            defaults: BufferDefaults::from(config),
            coalescing,
            sharer_profiling,
            network,
        }
    }

    fn make(
        &self,
        owner: impl std::fmt::Display,
        port: &str,
        source: Endpoint,
        sink: Endpoint,
        direction: Direction,
        ordered: bool,
    ) -> MessageBuffer {
        let policy = BufferPolicy {
            ordered: ordered || direction.requires_order(),
            capacity: self.defaults.capacity,
            filter_drop: self.defaults.filter_drop,
        };
        let name = format!("{owner}.{port}");
        trace!("buffer {name}: {source} -> {sink} {direction:?} ordered={}", policy.ordered);
        MessageBuffer::new(name, source, sink, direction, policy)
    }

    /// Controller-internal queue, never seen by the network.
    fn internal(
        &self,
        owner: impl std::fmt::Display,
        port: &str,
        source: Endpoint,
        sink: Endpoint,
        direction: Direction,
    ) -> Arc<MessageBuffer> {
        Arc::new(self.make(owner, port, source, sink, direction, false))
    }

    fn to_network(&mut self, owner: ControllerId, port: &str, direction: Direction) -> Arc<MessageBuffer> {
        let buffer = Arc::new(self.make(
            owner,
            port,
            Endpoint::Controller(owner),
            Endpoint::Network,
            direction,
            false,
        ));
        self.network.attach(&buffer);
        buffer
    }

    fn from_network(&mut self, owner: ControllerId, port: &str, direction: Direction) -> Arc<MessageBuffer> {
        let buffer = Arc::new(self.make(
            owner,
            port,
            Endpoint::Network,
            Endpoint::Controller(owner),
            direction,
            false,
        ));
        self.network.attach(&buffer);
        buffer
    }

    /// The L0 side of a core: sequencer and prefetcher queues plus the
    /// ordered link to the core's L1, shared by the I and D controllers.
    pub fn wire_core(&mut self, core: usize, l1: ControllerId) -> (L0Ports, CoreLink) {
        let l0 = Endpoint::Core(core);
        let owner = format!("core{core}.l0");
        let l1 = Endpoint::Controller(l1);

        let link = CoreLink {
            l0_to_l1: Arc::new(self.make(&owner, "bufferToL1", l0, l1, Direction::Request, true)),
            l1_to_l0: Arc::new(self.make(&owner, "bufferFromL1", l1, l0, Direction::Response, true)),
        };
        let ports = L0Ports {
            mandatory_queue: self.internal(&owner, "mandatoryQueue", Endpoint::Sequencer, l0, Direction::Request),
            prefetch_queue: self.internal(&owner, "prefetchQueue", Endpoint::Prefetcher, l0, Direction::Request),
            to_l1: Arc::clone(&link.l0_to_l1),
            from_l1: Arc::clone(&link.l1_to_l0),
        };
        (ports, link)
    }

    pub fn wire_l1(&mut self, l1: ControllerId, link: &CoreLink) -> L1Ports {
        L1Ports {
            from_l0: Arc::clone(&link.l0_to_l1),
            to_l0: Arc::clone(&link.l1_to_l0),
            request_to_l2: self.to_network(l1, "requestToL2", Direction::Request),
            response_to_l2: self.to_network(l1, "responseToL2", Direction::Response),
            unblock_to_l2: self.to_network(l1, "unblockToL2", Direction::Unblock),
            request_from_l2: self.from_network(l1, "requestFromL2", Direction::ForwardedRequest),
            response_from_l2: self.from_network(l1, "responseFromL2", Direction::Response),
            prefetch_queue: self.internal(
                l1,
                "prefetchQueue",
                Endpoint::Prefetcher,
                Endpoint::Controller(l1),
                Direction::Request,
            ),
        }
    }

    pub fn wire_l2(&mut self, l2: ControllerId) -> L2Ports {
        let l1_request_in = self.from_network(l2, "L1RequestToL2Cache", Direction::Request);
        L2Ports {
            dir_request_out: self.to_network(l2, "DirRequestFromL2Cache", Direction::Request),
            l1_request_out: self.to_network(l2, "L1RequestFromL2Cache", Direction::ForwardedRequest),
            response_out: self.to_network(l2, "responseFromL2Cache", Direction::Response),
            unblock_in: self.from_network(l2, "unblockToL2Cache", Direction::Unblock),
            l1_request_in: LlcRequestBuffer::new(l1_request_in, self.coalescing, self.sharer_profiling),
            response_in: self.from_network(l2, "responseToL2Cache", Direction::Response),
        }
    }

    pub fn wire_directory(&mut self, dir: ControllerId) -> DirectoryPorts {
        let endpoint = Endpoint::Controller(dir);
        DirectoryPorts {
            request_in: self.from_network(dir, "requestToDir", Direction::Request),
            response_in: self.from_network(dir, "responseToDir", Direction::Response),
            response_out: self.to_network(dir, "responseFromDir", Direction::Response),
            request_to_memory: self.internal(dir, "requestToMemory", endpoint, Endpoint::Memory, Direction::Request),
            response_from_memory: self.internal(
                dir,
                "responseFromMemory",
                Endpoint::Memory,
                endpoint,
                Direction::Response,
            ),
        }
    }

    /// Used for both DMA and IO controllers.
    pub fn wire_dma(&mut self, ctrl: ControllerId) -> DmaPorts {
        DmaPorts {
            mandatory_queue: self.internal(
                ctrl,
                "mandatoryQueue",
                Endpoint::Sequencer,
                Endpoint::Controller(ctrl),
                Direction::Request,
            ),
            response_from_dir: self.from_network(ctrl, "responseFromDir", Direction::Response),
            request_to_dir: self.to_network(ctrl, "requestToDir", Direction::Request),
        }
    }
}
