use std::ops::Range;

use log::warn;
use serde::Serialize;

use crate::sim::config::{CacheLevelConfig, RubyConfig};
use crate::sim::error::ConfigError;

/// How cores and LLC banks are partitioned across clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterPlan {
    num_clusters: usize,
    cores_per_cluster: usize,
    banks_per_cluster: usize,
}

impl ClusterPlan {
    pub fn new(num_cpus: usize, num_clusters: usize, num_l2caches: usize) -> Result<Self, ConfigError> {
        if num_cpus == 0 {
            return Err(ConfigError::ZeroCount { what: "num_cpus" });
        }
        if num_clusters == 0 {
            return Err(ConfigError::ZeroCount { what: "num_clusters" });
        }
        if num_l2caches == 0 {
            return Err(ConfigError::ZeroCount { what: "num_l2caches" });
        }
        if num_cpus % num_clusters != 0 {
            return Err(ConfigError::CoresNotDivisible {
                num_cpus,
                num_clusters,
            });
        }
        if num_l2caches % num_clusters != 0 {
            return Err(ConfigError::BanksNotDivisible {
                num_l2caches,
                num_clusters,
            });
        }
        Ok(Self {
            num_clusters,
            cores_per_cluster: num_cpus / num_clusters,
            banks_per_cluster: num_l2caches / num_clusters,
        })
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn cores_per_cluster(&self) -> usize {
        self.cores_per_cluster
    }

    pub fn banks_per_cluster(&self) -> usize {
        self.banks_per_cluster
    }

    pub fn num_cores(&self) -> usize {
        self.num_clusters * self.cores_per_cluster
    }

    pub fn num_banks(&self) -> usize {
        self.num_clusters * self.banks_per_cluster
    }

    /// Dense core id; independent of the order cores are visited in.
    pub fn core_id(&self, cluster: usize, core_in_cluster: usize) -> usize {
        debug_assert!(cluster < self.num_clusters && core_in_cluster < self.cores_per_cluster);
        cluster * self.cores_per_cluster + core_in_cluster
    }

    pub fn bank_id(&self, cluster: usize, bank_in_cluster: usize) -> usize {
        debug_assert!(cluster < self.num_clusters && bank_in_cluster < self.banks_per_cluster);
        cluster * self.banks_per_cluster + bank_in_cluster
    }

    pub fn cluster_of_core(&self, core: usize) -> usize {
        core / self.cores_per_cluster
    }

    pub fn cores_in_cluster(&self, cluster: usize) -> Range<usize> {
        let start = cluster * self.cores_per_cluster;
        start..start + self.cores_per_cluster
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    pub size: u64,
    pub assoc: usize,
    pub start_index_bit: u32,
    pub is_icache: bool,
}

impl CacheGeometry {
    pub fn new(level: &CacheLevelConfig, start_index_bit: u32, is_icache: bool) -> Self {
        Self {
            size: level.size,
            assoc: level.assoc,
            start_index_bit,
            is_icache,
        }
    }
}

/// Output of the resolver: the cluster partition plus the index bits each
/// cache level starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub plan: ClusterPlan,
    pub block_size_bits: u32,
    /// log2 of banks per cluster; also how many bits the L1 uses to pick a bank.
    pub l2_select_bits: u32,
}

impl Geometry {
    /// L0 and L1 index right above the block offset.
    pub fn private_index_start(&self) -> u32 {
        self.block_size_bits
    }

    /// The bank-select bits sit between the block offset and the L2 index,
    /// so an address selects its bank without a modulo.
    pub fn l2_index_start(&self) -> u32 {
        self.block_size_bits + self.l2_select_bits
    }
}

pub fn resolve_geometry(config: &RubyConfig) -> Result<Geometry, ConfigError> {
    let plan = ClusterPlan::new(config.num_cpus, config.num_clusters, config.num_l2caches)?;

    if config.cacheline_size == 0 || !config.cacheline_size.is_power_of_two() {
        return Err(ConfigError::LineSizeNotPowerOfTwo(config.cacheline_size));
    }
    let block_size_bits = config.cacheline_size.ilog2();

    let banks = plan.banks_per_cluster();
    if !banks.is_power_of_two() {
        warn!(
            "{banks} l2 banks per cluster is not a power of two, bank select uses {} bits",
            banks.ilog2()
        );
    }
    let l2_select_bits = banks.ilog2();

    Ok(Geometry {
        plan,
        block_size_bits,
        l2_select_bits,
    })
}
