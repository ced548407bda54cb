use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;

use crate::ruby::controller::ControllerId;
use crate::ruby::network::{VNET_REQUEST, VNET_RESPONSE, VNET_UNBLOCK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Request,
    Response,
    Unblock,
    ForwardedRequest,
}

impl Direction {
    /// Responses and unblocks are delivered in order whatever the NoC mode.
    pub fn requires_order(self) -> bool {
        matches!(self, Direction::Response | Direction::Unblock)
    }

    pub fn vnet(self) -> u8 {
        match self {
            Direction::Request => VNET_REQUEST,
            Direction::Response => VNET_RESPONSE,
            Direction::Unblock | Direction::ForwardedRequest => VNET_UNBLOCK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Endpoint {
    Controller(ControllerId),
    /// The L0 instruction/data pair of a core, which share one link to L1.
    Core(usize),
    Network,
    Sequencer,
    Prefetcher,
    Memory,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Controller(id) => write!(f, "{id}"),
            Endpoint::Core(core) => write!(f, "core{core}.l0"),
            Endpoint::Network => write!(f, "network"),
            Endpoint::Sequencer => write!(f, "sequencer"),
            Endpoint::Prefetcher => write!(f, "prefetcher"),
            Endpoint::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferPolicy {
    pub ordered: bool,
    /// 0 means unbounded.
    pub capacity: usize,
    pub filter_drop: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageBuffer {
    name: String,
    source: Endpoint,
    sink: Endpoint,
    direction: Direction,
    policy: BufferPolicy,
}

impl MessageBuffer {
    pub(crate) fn new(
        name: String,
        source: Endpoint,
        sink: Endpoint,
        direction: Direction,
        policy: BufferPolicy,
    ) -> Self {
        Self {
            name,
            source,
            sink,
            direction,
            policy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Endpoint {
        self.source
    }

    pub fn sink(&self) -> Endpoint {
        self.sink
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn policy(&self) -> BufferPolicy {
        self.policy
    }

    pub fn is_ordered(&self) -> bool {
        self.policy.ordered
    }

    pub fn is_unbounded(&self) -> bool {
        self.policy.capacity == 0
    }

    pub fn crosses_network(&self) -> bool {
        self.source == Endpoint::Network || self.sink == Endpoint::Network
    }

    /// Virtual network the buffer is attached to, if it touches the NoC.
    pub fn vnet(&self) -> Option<u8> {
        self.crosses_network().then(|| self.direction.vnet())
    }
}

/// Merge concurrent reads of one line before they leave for the LLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoalescingConfig {
    pub line_bytes: u64,
}

/// Records which PCs touch which LLC lines over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SharerProfiling {
    pub pc_low: u64,
    pub pc_high: u64,
    pub window_cycles: u64,
}

impl SharerProfiling {
    /// A zero range means every PC.
    pub fn profiles_all_pcs(&self) -> bool {
        self.pc_low == 0 && self.pc_high == 0
    }

    pub fn covers_pc(&self, pc: u64) -> bool {
        self.profiles_all_pcs() || (pc > 0 && pc >= self.pc_low && pc <= self.pc_high)
    }
}

/// The L1-request-into-L2 buffer. It is the only buffer that can carry
/// coalescing or sharer profiling; no other buffer type has the fields.
/// The network holds the inner buffer, the L2 bank holds this wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlcRequestBuffer {
    buffer: Arc<MessageBuffer>,
    coalescing: Option<CoalescingConfig>,
    sharer_profiling: Option<SharerProfiling>,
}

impl LlcRequestBuffer {
    pub(crate) fn new(
        buffer: Arc<MessageBuffer>,
        coalescing: Option<CoalescingConfig>,
        sharer_profiling: Option<SharerProfiling>,
    ) -> Self {
        debug_assert_eq!(buffer.direction(), Direction::Request);
        Self {
            buffer,
            coalescing,
            sharer_profiling,
        }
    }

    pub fn coalescing(&self) -> Option<&CoalescingConfig> {
        self.coalescing.as_ref()
    }

    pub fn sharer_profiling(&self) -> Option<&SharerProfiling> {
        self.sharer_profiling.as_ref()
    }

    pub fn buffer(&self) -> &Arc<MessageBuffer> {
        &self.buffer
    }
}

impl Deref for LlcRequestBuffer {
    type Target = MessageBuffer;

    fn deref(&self) -> &MessageBuffer {
        &self.buffer
    }
}
