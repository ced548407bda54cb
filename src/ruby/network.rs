use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::ruby::channel::{Endpoint, MessageBuffer};
use crate::sim::config::NetworkConfig;
use crate::sim::error::ConfigError;

pub const VNET_REQUEST: u8 = 0;
pub const VNET_RESPONSE: u8 = 1;
/// Forwarded requests share this one with unblocks.
pub const VNET_UNBLOCK: u8 = 2;
pub const NUM_VIRTUAL_NETWORKS: u8 = 3;

/// Header bytes a data packet carries ahead of the cacheline.
pub const CONTROL_MESSAGE_BYTES: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VnetType {
    Control,
    Data,
}

/// Only the response vnet carries cachelines.
pub fn vnet_type(vnet: u8) -> VnetType {
    if vnet == VNET_RESPONSE {
        VnetType::Data
    } else {
        VnetType::Control
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoherenceConstraint {
    Unordered,
    OrderedVnet,
    OrderedPrepushInv,
}

impl FromStr for CoherenceConstraint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unordered" => Ok(Self::Unordered),
            "ordered-vnet" => Ok(Self::OrderedVnet),
            "ordered-prepush-inv" => Ok(Self::OrderedPrepushInv),
            other => Err(ConfigError::UnknownCoherenceConstraint(other.to_owned())),
        }
    }
}

impl fmt::Display for CoherenceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unordered => "unordered",
            Self::OrderedVnet => "ordered-vnet",
            Self::OrderedPrepushInv => "ordered-prepush-inv",
        })
    }
}

/// The ordered subset of `CoherenceConstraint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderedConstraint {
    Vnet,
    PrepushInv,
}

impl From<OrderedConstraint> for CoherenceConstraint {
    fn from(value: OrderedConstraint) -> Self {
        match value {
            OrderedConstraint::Vnet => Self::OrderedVnet,
            OrderedConstraint::PrepushInv => Self::OrderedPrepushInv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PrepushFilter {
    pub enabled: bool,
    /// Filtered prepushes are held back instead of dropped.
    pub no_drop: bool,
}

/// How the NoC orders coherence traffic. Prepush only exists alongside an
/// ordered constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NocOrdering {
    Plain(CoherenceConstraint),
    Prepush {
        constraint: OrderedConstraint,
        filter: PrepushFilter,
    },
}

impl NocOrdering {
    pub fn resolve(config: &NetworkConfig) -> Result<Self, ConfigError> {
        let constraint: CoherenceConstraint = config.coherence_constraint.parse()?;
        if !config.prepush {
            return Ok(Self::Plain(constraint));
        }
        let constraint = match constraint {
            CoherenceConstraint::Unordered => return Err(ConfigError::PrepushOnUnorderedNoc),
            CoherenceConstraint::OrderedVnet => OrderedConstraint::Vnet,
            CoherenceConstraint::OrderedPrepushInv => OrderedConstraint::PrepushInv,
        };
        Ok(Self::Prepush {
            constraint,
            filter: PrepushFilter {
                enabled: config.prepush_filter,
                no_drop: config.prepush_filter_nodrop,
            },
        })
    }

    pub fn constraint(&self) -> CoherenceConstraint {
        match *self {
            Self::Plain(c) => c,
            Self::Prepush { constraint, .. } => constraint.into(),
        }
    }

    pub fn prepush_enabled(&self) -> bool {
        matches!(self, Self::Prepush { .. })
    }
}

/// Multicast needs at least one deadlock-avoidance mode; both may be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MulticastMode {
    Disabled,
    Enabled {
        /// Separate channels for multicast and unicast traffic.
        double_channel: bool,
        /// A data packet must fit a single VC so a fork never waits on a peer.
        asynchronous: bool,
    },
}

impl MulticastMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// Data VC depth: one buffer per flit of a cacheline plus one for the header.
pub fn buffers_per_data_vc(line_bytes: u64, link_width_bits: u32) -> Result<u32, ConfigError> {
    let line_bits = line_bytes
        .checked_mul(8)
        .ok_or(ConfigError::LineSizeTooLarge(line_bytes))?;
    if link_width_bits == 0 || line_bits % u64::from(link_width_bits) != 0 {
        return Err(ConfigError::LinkWidthMisaligned {
            link_width_bits,
            line_bits,
        });
    }
    u32::try_from(line_bits / u64::from(link_width_bits))
        .ok()
        .and_then(|flits| flits.checked_add(1))
        .ok_or(ConfigError::LineSizeTooLarge(line_bytes))
}

/// Flits a data message occupies, header included. Saturates at `u32::MAX`.
pub fn data_packet_flits(line_bytes: u64, flit_bytes: u32) -> u32 {
    let flits = CONTROL_MESSAGE_BYTES
        .saturating_add(line_bytes)
        .div_ceil(u64::from(flit_bytes.max(1)));
    u32::try_from(flits).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkParams {
    pub link_width_bits: u32,
    pub ni_flit_size_bytes: u32,
    pub buffers_per_data_vc: u32,
    pub buffers_per_ctrl_vc: u32,
    pub virtual_networks: u8,
    pub ordering: NocOrdering,
    pub multicast: MulticastMode,
}

impl NetworkParams {
    pub fn resolve(config: &NetworkConfig, line_bytes: u64) -> Result<Self, ConfigError> {
        let link_width_bits = config.link_width_bits;
        let buffers_per_data_vc = buffers_per_data_vc(line_bytes, link_width_bits)?;
        if link_width_bits % 8 != 0 {
            return Err(ConfigError::LinkWidthNotByteMultiple(link_width_bits));
        }
        let ni_flit_size_bytes = link_width_bits / 8;

        let ordering = NocOrdering::resolve(config)?;

        let multicast = if config.enable_multicast {
            let double_channel = config.double_channel_multicast;
            let asynchronous = config.asynchronous_multicast;
            if !double_channel && !asynchronous {
                return Err(ConfigError::MulticastWithoutDeadlockAvoidance);
            }
            if asynchronous {
                let flits = data_packet_flits(line_bytes, ni_flit_size_bytes);
                if flits > buffers_per_data_vc {
                    return Err(ConfigError::DataPacketExceedsVc {
                        flits,
                        buffers_per_data_vc,
                    });
                }
            }
            MulticastMode::Enabled {
                double_channel,
                asynchronous,
            }
        } else {
            MulticastMode::Disabled
        };

        debug!(
            "noc: {link_width_bits}-bit links, {buffers_per_data_vc} buffers per data vc, {} ordering, multicast {multicast:?}",
            ordering.constraint()
        );

        Ok(Self {
            link_width_bits,
            ni_flit_size_bytes,
            buffers_per_data_vc,
            buffers_per_ctrl_vc: 1,
            virtual_networks: NUM_VIRTUAL_NETWORKS,
            ordering,
            multicast,
        })
    }
}

/// The network side of every controller-to-NoC buffer.
#[derive(Debug, Default)]
pub struct NetworkPorts {
    /// Buffers the network drains (controller output ports).
    inbound: Vec<Arc<MessageBuffer>>,
    /// Buffers the network fills (controller input ports).
    outbound: Vec<Arc<MessageBuffer>>,
}

impl NetworkPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&mut self, buffer: &Arc<MessageBuffer>) {
        if buffer.sink() == Endpoint::Network {
            self.inbound.push(Arc::clone(buffer));
        } else if buffer.source() == Endpoint::Network {
            self.outbound.push(Arc::clone(buffer));
        }
    }

    pub fn inbound(&self) -> &[Arc<MessageBuffer>] {
        &self.inbound
    }

    pub fn outbound(&self) -> &[Arc<MessageBuffer>] {
        &self.outbound
    }

    pub fn on_vnet(&self, vnet: u8) -> impl Iterator<Item = &Arc<MessageBuffer>> + '_ {
        self.inbound
            .iter()
            .chain(self.outbound.iter())
            .filter(move |b| b.vnet() == Some(vnet))
    }
}
