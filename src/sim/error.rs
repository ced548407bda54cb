use thiserror::Error;

use crate::ruby::controller::ControllerId;

/// Every way a topology configuration can be rejected. All of these are
/// fatal: construction stops at the first one and nothing is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{what} must be > 0")]
    ZeroCount { what: &'static str },

    #[error("num_cpus ({num_cpus}) must be divisible by num_clusters ({num_clusters})")]
    CoresNotDivisible { num_cpus: usize, num_clusters: usize },

    #[error("num_l2caches ({num_l2caches}) must be divisible by num_clusters ({num_clusters})")]
    BanksNotDivisible {
        num_l2caches: usize,
        num_clusters: usize,
    },

    #[error("cacheline_size ({0}) must be a power of two")]
    LineSizeNotPowerOfTwo(u64),

    #[error("link width of {link_width_bits} bits does not evenly divide a {line_bits}-bit cacheline")]
    LinkWidthMisaligned { link_width_bits: u32, line_bits: u64 },

    #[error("cacheline_size ({0}) is too large to size network buffers for")]
    LineSizeTooLarge(u64),

    #[error("link width of {0} bits is not a whole number of bytes")]
    LinkWidthNotByteMultiple(u32),

    #[error("multicast needs double-channel or asynchronous multicast enabled for deadlock freedom")]
    MulticastWithoutDeadlockAvoidance,

    #[error(
        "asynchronous multicast needs a whole data packet in one vc: \
         {flits} flits per data packet but {buffers_per_data_vc} buffers per data vc"
    )]
    DataPacketExceedsVc {
        flits: u32,
        buffers_per_data_vc: u32,
    },

    #[error("prepush requires an ordered NoC, got coherence constraint 'unordered'")]
    PrepushOnUnorderedNoc,

    #[error("unknown coherence order constraint for NoC: '{0}'")]
    UnknownCoherenceConstraint(String),

    #[error("no clock domain for core {core} ({available} domains supplied)")]
    MissingClockDomain { core: usize, available: usize },

    #[error("controller {0} registered twice")]
    DuplicateController(ControllerId),

    #[error("invalid memory size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },
}
