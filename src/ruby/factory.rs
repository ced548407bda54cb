use std::sync::Arc;

use log::{debug, warn};

use crate::ruby::controller::{
    ClockDomain, Controller, ControllerId, ControllerKind, ControllerRole, ControllerTable, L1Cache,
    L2Bank, PrefetcherDescriptor, PrefetcherKind, PrivateCache, SequencerHandle, SequencerKind,
    SEQUENCER_MAX_OUTSTANDING,
};
use crate::ruby::geometry::{CacheGeometry, Geometry};
use crate::ruby::multicast::MulticastProfile;
use crate::ruby::wiring::ChannelWirer;
use crate::sim::config::{CacheLevel, ProtocolConfig, TopologyConfig};
use crate::sim::error::ConfigError;

pub const TBE_POOL_SIZE: usize = 256;

/// Builds the per-core (L0 pair + L1) and per-bank (L2) controllers of one
/// system. Ids follow `cluster * per_cluster + index` so they do not depend on
/// visiting order.
pub struct ControllerFactory<'a> {
    geometry: &'a Geometry,
    config: &'a TopologyConfig,
    cpu_clock_domains: &'a [ClockDomain],
    ruby_clock: &'a ClockDomain,
    profile: Arc<MulticastProfile>,
    protocol: Arc<ProtocolConfig>,
}

impl<'a> ControllerFactory<'a> {
    pub fn new(
        geometry: &'a Geometry,
        config: &'a TopologyConfig,
        cpu_clock_domains: &'a [ClockDomain],
        ruby_clock: &'a ClockDomain,
        profile: MulticastProfile,
    ) -> Self {
        Self {
            geometry,
            config,
            cpu_clock_domains,
            ruby_clock,
            profile: Arc::new(profile),
            protocol: Arc::new(config.protocol.clone()),
        }
    }

    /// A single supplied domain clocks every core (e.g. one tester driving
    /// many ports); otherwise core `n` uses domain `n`.
    pub fn core_clock_domain(&self, core: usize) -> Result<&'a ClockDomain, ConfigError> {
        let domains = self.cpu_clock_domains;
        let missing = ConfigError::MissingClockDomain {
            core,
            available: domains.len(),
        };
        match domains {
            [] => Err(missing),
            [only] => Ok(only),
            _ => domains.get(core).ok_or(missing),
        }
    }

    pub fn validate_clock_domains(&self) -> Result<(), ConfigError> {
        let cores = self.geometry.plan.num_cores();
        if self.cpu_clock_domains.len() == 1 && cores > 1 {
            warn!("one clock domain supplied for {cores} cores, sharing it");
        }
        self.core_clock_domain(cores - 1).map(|_| ())
    }

    fn stride_prefetcher(&self, enabled: bool) -> PrefetcherDescriptor {
        PrefetcherDescriptor::new(PrefetcherKind::Stride, enabled, &self.config.caches.prefetch)
    }

    pub fn build_core(
        &self,
        cluster: usize,
        core_in_cluster: usize,
        wirer: &mut ChannelWirer<'_>,
        table: &mut ControllerTable,
    ) -> Result<SequencerHandle, ConfigError> {
        let geometry = self.geometry;
        let caches = &self.config.caches;
        let ruby = &self.config.ruby;
        let core = geometry.plan.core_id(cluster, core_in_cluster);
        let clock = self.core_clock_domain(core)?;
        let bingo_l2_stride = caches.prefetch.l1_bingo_l2_stride;

        let l0i = ControllerId::new(ControllerKind::PrivateInstr, core);
        let l0d = ControllerId::new(ControllerKind::PrivateData, core);
        let l1 = ControllerId::new(ControllerKind::UnifiedL1, core);

        let (l0_ports, link) = wirer.wire_core(core, l1);
        let l1_ports = wirer.wire_l1(l1, &link);

        let private = |this: ControllerId, sibling: ControllerId, is_icache: bool| {
            let level = if is_icache { &caches.l0i } else { &caches.l0d };
            let role = ControllerRole::Private(PrivateCache {
                geometry: CacheGeometry::new(level, geometry.private_index_start(), is_icache),
                core,
                l1,
                sibling,
                prefetcher: self.stride_prefetcher(false),
                bingo: PrefetcherDescriptor::new(
                    PrefetcherKind::Bingo,
                    bingo_l2_stride,
                    &caches.prefetch,
                ),
                prefetch_l2_only: caches.prefetch.prefetch_l2_only,
                multicast: Arc::clone(&self.profile),
                protocol: Arc::clone(&self.protocol),
                // Only the data side reports evictions.
                print_evict_dist: !is_icache && ruby.print_evict_dist(CacheLevel::L0),
                ports: l0_ports.clone(),
            });
            Controller::new(
                this,
                Some(cluster),
                TBE_POOL_SIZE,
                level.transitions_per_cycle,
                clock.clone(),
                role,
            )
        };
        table.register(private(l0i, l0d, true))?;
        table.register(private(l0d, l0i, false))?;

        table.register(Controller::new(
            l1,
            Some(cluster),
            TBE_POOL_SIZE,
            caches.l1.transitions_per_cycle,
            clock.clone(),
            ControllerRole::L1(L1Cache {
                geometry: CacheGeometry::new(&caches.l1, geometry.private_index_start(), false),
                core,
                l0i,
                l0d,
                l2_select_bits: geometry.l2_select_bits,
                num_cores: geometry.plan.num_cores(),
                prefetcher: self.stride_prefetcher(bingo_l2_stride),
                multicast: Arc::clone(&self.profile),
                protocol: Arc::clone(&self.protocol),
                print_evict_dist: ruby.print_evict_dist(CacheLevel::L1),
                ports: l1_ports,
            }),
        ))?;

        debug!("core {core} (cluster {cluster}): {l0i}, {l0d}, {l1} on {}", clock.name);

        Ok(SequencerHandle {
            kind: SequencerKind::Cpu,
            version: core,
            controller: l0d,
            max_outstanding_requests: SEQUENCER_MAX_OUTSTANDING,
            clock_domain: clock.clone(),
            port: None,
        })
    }

    pub fn build_bank(
        &self,
        cluster: usize,
        bank_in_cluster: usize,
        wirer: &mut ChannelWirer<'_>,
        table: &mut ControllerTable,
    ) -> Result<ControllerId, ConfigError> {
        let geometry = self.geometry;
        let caches = &self.config.caches;
        let ruby = &self.config.ruby;
        let bank = geometry.plan.bank_id(cluster, bank_in_cluster);
        let l2 = ControllerId::new(ControllerKind::L2Bank, bank);

        let ports = wirer.wire_l2(l2);
        table.register(Controller::new(
            l2,
            Some(cluster),
            TBE_POOL_SIZE,
            caches.l2.transitions_per_cycle,
            self.ruby_clock.clone(),
            ControllerRole::L2(L2Bank {
                geometry: CacheGeometry::new(&caches.l2, geometry.l2_index_start(), false),
                num_cores: geometry.plan.num_cores(),
                group_count: self.profile.group_count(),
                window_cycles: ruby.window_cycles,
                profile_llc_sharers: ruby.profile_llc_sharers,
                protocol: Arc::clone(&self.protocol),
                print_evict_dist: ruby.print_evict_dist(CacheLevel::L2),
                ports,
            }),
        ))?;

        debug!("bank {bank} (cluster {cluster}): {l2}, index from bit {}", geometry.l2_index_start());
        Ok(l2)
    }
}
