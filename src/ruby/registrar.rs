use std::ops::Range;

use serde::Serialize;

use crate::ruby::geometry::ClusterPlan;
use crate::sim::config::TopologyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheUnitType {
    Instruction,
    Data,
    Unified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuRecord {
    pub physical_package_id: usize,
    pub core_id: usize,
    pub core_siblings: Range<usize>,
    pub thread_siblings: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheRecord {
    pub level: u8,
    pub unit: CacheUnitType,
    pub size: u64,
    pub line_size: u64,
    pub assoc: usize,
    pub cpus: Vec<usize>,
}

/// Where the cpu/cache hierarchy is published for the guest to read back
/// (sysfs-style). Only used outside full-system mode.
pub trait TopologyRegistrar {
    fn register_cpu(&mut self, cpu: CpuRecord);
    fn register_cache(&mut self, cache: CacheRecord);
}

/// Keeps every record in registration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingRegistrar {
    pub cpus: Vec<CpuRecord>,
    pub caches: Vec<CacheRecord>,
}

impl TopologyRegistrar for RecordingRegistrar {
    fn register_cpu(&mut self, cpu: CpuRecord) {
        self.cpus.push(cpu);
    }

    fn register_cache(&mut self, cache: CacheRecord) {
        self.caches.push(cache);
    }
}

/// L0 caches are published as direct-mapped whatever their configured
/// associativity.
pub const L0_REGISTERED_ASSOC: usize = 1;

/// Per core: the cpu, then its L0I, L0D and L1. Per cluster, after its cores:
/// one L2 record covering all of the cluster's banks.
pub fn register_cpu_topology(
    registrar: &mut dyn TopologyRegistrar,
    plan: &ClusterPlan,
    config: &TopologyConfig,
) {
    let caches = &config.caches;
    let line_size = config.ruby.cacheline_size;
    let all_cores = 0..plan.num_cores();

    for cluster in 0..plan.num_clusters() {
        for core in plan.cores_in_cluster(cluster) {
            registrar.register_cpu(CpuRecord {
                physical_package_id: 0,
                core_id: core,
                core_siblings: all_cores.clone(),
                thread_siblings: Vec::new(),
            });
            let private = [
                (0, CacheUnitType::Instruction, caches.l0i.size, L0_REGISTERED_ASSOC),
                (0, CacheUnitType::Data, caches.l0d.size, L0_REGISTERED_ASSOC),
                (1, CacheUnitType::Unified, caches.l1.size, caches.l1.assoc),
            ];
            for (level, unit, size, assoc) in private {
                registrar.register_cache(CacheRecord {
                    level,
                    unit,
                    size,
                    line_size,
                    assoc,
                    cpus: vec![core],
                });
            }
        }

        registrar.register_cache(CacheRecord {
            level: 2,
            unit: CacheUnitType::Unified,
            size: caches.l2.size * plan.banks_per_cluster() as u64,
            line_size,
            assoc: caches.l2.assoc,
            cpus: plan.cores_in_cluster(cluster).collect(),
        });
    }
}
