#[cfg(test)]
mod geometry_tests;
#[cfg(test)]
mod multicast_tests;
#[cfg(test)]
mod network_tests;

use crate::ruby::controller::ClockDomain;
use crate::ruby::peripheral::DmaPort;
use crate::ruby::registrar::RecordingRegistrar;
use crate::ruby::topology::{create_system, Pt2PtNetwork, Pt2PtTopology, RubySystem, SystemHandles};
use crate::sim::config::TopologyConfig;
use crate::sim::error::ConfigError;

pub(crate) fn config(num_cpus: usize, num_clusters: usize, num_l2caches: usize) -> TopologyConfig {
    let mut config = TopologyConfig::default();
    config.ruby.num_cpus = num_cpus;
    config.ruby.num_clusters = num_clusters;
    config.ruby.num_l2caches = num_l2caches;
    config
}

pub(crate) fn clock_domains(n: usize) -> Vec<ClockDomain> {
    (0..n).map(|i| ClockDomain::new(format!("cpu{i}_clk"))).collect()
}

pub(crate) fn dma_ports(n: usize) -> Vec<DmaPort> {
    (0..n).map(|i| DmaPort::new(format!("dma{i}"))).collect()
}

pub(crate) fn build_with(
    config: &TopologyConfig,
    num_dma: usize,
    registrar: &mut RecordingRegistrar,
) -> Result<SystemHandles<Pt2PtNetwork>, ConfigError> {
    create_system(
        config,
        &clock_domains(config.ruby.num_cpus),
        &dma_ports(num_dma),
        RubySystem::new(ClockDomain::new("ruby_clk")),
        registrar,
        Pt2PtTopology,
    )
}

pub(crate) fn build(config: &TopologyConfig) -> Result<SystemHandles<Pt2PtNetwork>, ConfigError> {
    build_with(config, 0, &mut RecordingRegistrar::default())
}
