use std::str::FromStr;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::{Table, Value};

use crate::base::size::deserialize_mem_size;

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Result<Self, toml::de::Error> {
        match section {
            Some(value) => value.clone().try_into(),
            None => {
                warn!("config section not found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Core, cluster and LLC-bank counts plus the knobs every message buffer
/// inherits.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RubyConfig {
    pub num_cpus: usize,
    pub num_clusters: usize,
    pub num_l2caches: usize,
    pub cacheline_size: u64,
    /// 0 means unbounded.
    pub message_buffer_size: usize,
    pub filter_drop: bool,
    pub coalescing: bool,
    pub profile_llc_sharers: bool,
    pub profile_pc_low: u64,
    pub profile_pc_high: u64,
    pub window_cycles: u64,
    pub print_all_cache_evict_dist: bool,
    pub print_l0_cache_evict_dist: bool,
    pub print_l1_cache_evict_dist: bool,
    pub print_l2_cache_evict_dist: bool,
}

impl Config for RubyConfig {}

impl Default for RubyConfig {
    fn default() -> Self {
        Self {
            num_cpus: 1,
            num_clusters: 1,
            num_l2caches: 1,
            cacheline_size: 64,
            message_buffer_size: 0,
            filter_drop: false,
            coalescing: false,
            profile_llc_sharers: false,
            profile_pc_low: 0,
            profile_pc_high: 0,
            window_cycles: 100_000,
            print_all_cache_evict_dist: false,
            print_l0_cache_evict_dist: false,
            print_l1_cache_evict_dist: false,
            print_l2_cache_evict_dist: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLevel {
    L0,
    L1,
    L2,
}

impl RubyConfig {
    /// `print_all_cache_evict_dist` switches the flag on for every level.
    pub fn print_evict_dist(&self, level: CacheLevel) -> bool {
        self.print_all_cache_evict_dist
            || match level {
                CacheLevel::L0 => self.print_l0_cache_evict_dist,
                CacheLevel::L1 => self.print_l1_cache_evict_dist,
                CacheLevel::L2 => self.print_l2_cache_evict_dist,
            }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CacheLevelConfig {
    #[serde(deserialize_with = "deserialize_mem_size")]
    pub size: u64,
    pub assoc: usize,
    pub transitions_per_cycle: usize,
}

impl CacheLevelConfig {
    const fn new(size: u64, assoc: usize, transitions_per_cycle: usize) -> Self {
        Self {
            size,
            assoc,
            transitions_per_cycle,
        }
    }
}

impl Default for CacheLevelConfig {
    fn default() -> Self {
        Self::new(4096, 1, 32)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Bingo on L1, stride on L2.
    pub l1_bingo_l2_stride: bool,
    pub prefetch_l2_only: bool,
    pub num_streams: usize,
    pub unit_filter: usize,
    pub nonunit_filter: usize,
    pub train_misses: usize,
    pub num_startup_pfs: usize,
    pub cross_page: bool,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            l1_bingo_l2_stride: false,
            prefetch_l2_only: true,
            num_streams: 16,
            unit_filter: 256,
            nonunit_filter: 256,
            train_misses: 5,
            num_startup_pfs: 4,
            cross_page: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CachesConfig {
    pub l0i: CacheLevelConfig,
    pub l0d: CacheLevelConfig,
    pub l1: CacheLevelConfig,
    pub l2: CacheLevelConfig,
    pub prefetch: PrefetchConfig,
}

impl Config for CachesConfig {}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            l0i: CacheLevelConfig::new(4096, 1, 32),
            l0d: CacheLevelConfig::new(4096, 1, 32),
            l1: CacheLevelConfig::new(64 << 10, 2, 32),
            l2: CacheLevelConfig::new(2 << 20, 8, 4),
            prefetch: PrefetchConfig::default(),
        }
    }
}

/// Raw NoC options. The ordering/prepush combination is checked when this is
/// turned into a `NocOrdering`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub link_width_bits: u32,
    pub coherence_constraint: String,
    pub prepush: bool,
    pub prepush_filter: bool,
    pub prepush_filter_nodrop: bool,
    pub enable_multicast: bool,
    pub double_channel_multicast: bool,
    pub asynchronous_multicast: bool,
}

impl Config for NetworkConfig {}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            link_width_bits: 128,
            coherence_constraint: "unordered".to_owned(),
            prepush: false,
            prepush_filter: false,
            prepush_filter_nodrop: false,
            enable_multicast: false,
            double_channel_multicast: false,
            asynchronous_multicast: false,
        }
    }
}

/// Software-prepush and timeout-multicast knobs. The builder does not
/// interpret these; they are handed to the L1/L2 controllers as-is.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProtocolConfig {
    pub en_softprepush: bool,
    pub en_timeout_multicast: bool,
    pub en_hostswitch: bool,
    pub timeout_threshold: u64,
    pub en_adaptive_timeout_threshold: bool,
    pub en_adaptive_timeout_division: u32,
    pub timeout_threshold_upper_bound: u64,
    pub timeout_switch_threshold: u64,
    pub en_dir_prepush: bool,
    pub en_prepushfilter: bool,
    pub pass_config: bool,
    /// Only one host per group when set, any core may host otherwise.
    pub determine_host: bool,
    pub en_sync: bool,
    pub do_not_replace_pushed: bool,
    pub select_new_victim: bool,
    pub recognize_push_entry: bool,
    pub donot_observe_prefetch: bool,
    pub load_to_timeout: bool,
    pub en_center_level: bool,
    pub en_dont_response: bool,
    pub dont_response_threshold: u64,
    pub always_prepush: bool,
    pub send_evictions: bool,
}

impl Config for ProtocolConfig {}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            en_softprepush: true,
            en_timeout_multicast: true,
            en_hostswitch: true,
            timeout_threshold: 512,
            en_adaptive_timeout_threshold: false,
            en_adaptive_timeout_division: 1,
            timeout_threshold_upper_bound: 256,
            timeout_switch_threshold: 16384,
            en_dir_prepush: false,
            en_prepushfilter: true,
            pass_config: false,
            determine_host: true,
            en_sync: false,
            do_not_replace_pushed: false,
            select_new_victim: false,
            recognize_push_entry: false,
            donot_observe_prefetch: true,
            load_to_timeout: false,
            en_center_level: false,
            en_dont_response: false,
            dont_response_threshold: 250,
            always_prepush: false,
            send_evictions: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SystemConfig {
    pub full_system: bool,
    pub num_dirs: usize,
    pub rom_directory: bool,
    pub num_dma_ports: usize,
    pub dma_transitions_per_cycle: usize,
    pub memctrl_clock_divider: u32,
}

impl Config for SystemConfig {}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            full_system: false,
            num_dirs: 1,
            rom_directory: false,
            num_dma_ports: 0,
            dma_transitions_per_cycle: 4,
            memctrl_clock_divider: 3,
        }
    }
}

/// A workload is picked either by name ("mlp") or by the launcher's
/// benchmark number (5).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum WorkloadSelector {
    Numbered(u32),
    Named(String),
}

impl FromStr for WorkloadSelector {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err("empty workload selector".to_owned());
        }
        Ok(match value.parse::<u32>() {
            Ok(n) => Self::Numbered(n),
            Err(_) => Self::Named(value.to_owned()),
        })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WorkloadConfig {
    pub benchmark: Option<WorkloadSelector>,
}

impl Config for WorkloadConfig {}

/// Everything the topology builder reads, one field per TOML table.
#[derive(Debug, Clone, Default)]
pub struct TopologyConfig {
    pub ruby: RubyConfig,
    pub caches: CachesConfig,
    pub network: NetworkConfig,
    pub protocol: ProtocolConfig,
    pub system: SystemConfig,
    pub workload: WorkloadConfig,
}

impl TopologyConfig {
    pub fn from_table(table: &Table) -> Result<Self, toml::de::Error> {
        Ok(Self {
            ruby: RubyConfig::from_section(table.get("ruby"))?,
            caches: CachesConfig::from_section(table.get("caches"))?,
            network: NetworkConfig::from_section(table.get("network"))?,
            protocol: ProtocolConfig::from_section(table.get("protocol"))?,
            system: SystemConfig::from_section(table.get("system"))?,
            workload: WorkloadConfig::from_section(table.get("workload"))?,
        })
    }
}

#[cfg(test)]
mod tests;
