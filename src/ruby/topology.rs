use std::collections::{BTreeMap, BTreeSet};

use log::info;
use serde::Serialize;

use crate::ruby::controller::{
    ClockDomain, Controller, ControllerId, ControllerKind, ControllerTable, SequencerHandle,
};
use crate::ruby::factory::ControllerFactory;
use crate::ruby::geometry::{resolve_geometry, Geometry};
use crate::ruby::multicast::{multicast_profile, resolve_workload, MulticastProfile};
use crate::ruby::network::{NetworkParams, NetworkPorts};
use crate::ruby::peripheral::{
    build_directories, build_dma_controllers, build_io_controller, DmaPort,
};
use crate::ruby::registrar::{register_cpu_topology, TopologyRegistrar};
use crate::ruby::wiring::ChannelWirer;
use crate::sim::config::TopologyConfig;
use crate::sim::error::ConfigError;

/// Kinds in the order the network numbers its endpoints. L0 controllers
/// talk only to their L1 and are not network endpoints.
pub const NETDEST_ORDER: [ControllerKind; 5] = [
    ControllerKind::UnifiedL1,
    ControllerKind::L2Bank,
    ControllerKind::Directory,
    ControllerKind::Dma,
    ControllerKind::Io,
];

/// The aggregate every controller is registered into.
#[derive(Debug)]
pub struct RubySystem {
    clock_domain: ClockDomain,
    memctrl_clock_domain: Option<ClockDomain>,
    controllers: ControllerTable,
    network: NetworkPorts,
    io_port: Option<SequencerHandle>,
}

impl RubySystem {
    pub fn new(clock_domain: ClockDomain) -> Self {
        Self {
            clock_domain,
            memctrl_clock_domain: None,
            controllers: ControllerTable::new(),
            network: NetworkPorts::new(),
            io_port: None,
        }
    }

    pub fn clock_domain(&self) -> &ClockDomain {
        &self.clock_domain
    }

    pub fn memctrl_clock_domain(&self) -> Option<&ClockDomain> {
        self.memctrl_clock_domain.as_ref()
    }

    pub fn controllers(&self) -> &ControllerTable {
        &self.controllers
    }

    pub fn network(&self) -> &NetworkPorts {
        &self.network
    }

    pub fn io_port(&self) -> Option<&SequencerHandle> {
        self.io_port.as_ref()
    }
}

/// A fully wired system plus the order the network must number its
/// endpoints in. Handed to a `TopologyConstructor` by value.
#[derive(Debug)]
pub struct Topology {
    netdest: Vec<ControllerId>,
    system: RubySystem,
    geometry: Geometry,
    params: NetworkParams,
    profile: MulticastProfile,
}

impl Topology {
    pub fn netdest_order(&self) -> &[ControllerId] {
        &self.netdest
    }

    pub fn system(&self) -> &RubySystem {
        &self.system
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn network_params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn multicast_profile(&self) -> &MulticastProfile {
        &self.profile
    }

    pub fn controller(&self, id: ControllerId) -> Option<&Controller> {
        self.system.controllers.get(id)
    }

    /// Network endpoints in netdest order.
    pub fn nodes(&self) -> impl Iterator<Item = &Controller> + '_ {
        self.netdest
            .iter()
            .filter_map(move |id| self.system.controllers.get(*id))
    }

    pub fn summary(&self) -> TopologySummary {
        let table = &self.system.controllers;
        let controllers = [
            ControllerKind::PrivateInstr,
            ControllerKind::PrivateData,
            ControllerKind::UnifiedL1,
            ControllerKind::L2Bank,
            ControllerKind::Directory,
            ControllerKind::Dma,
            ControllerKind::Io,
        ]
        .into_iter()
        .map(|kind| (kind.prefix(), table.count(kind)))
        .filter(|(_, n)| *n > 0)
        .collect();

        // the L0 pair shares its buffers, so count by name
        let mut buffers = BTreeSet::new();
        let mut ordered = BTreeSet::new();
        for buffer in table.iter().flat_map(|c| c.buffers()) {
            buffers.insert(buffer.name());
            if buffer.is_ordered() {
                ordered.insert(buffer.name());
            }
        }

        TopologySummary {
            num_cores: self.geometry.plan.num_cores(),
            num_clusters: self.geometry.plan.num_clusters(),
            num_banks: self.geometry.plan.num_banks(),
            block_size_bits: self.geometry.block_size_bits,
            l2_index_start: self.geometry.l2_index_start(),
            controllers,
            netdest: self.netdest.iter().map(ToString::to_string).collect(),
            buffers: buffers.len(),
            ordered_buffers: ordered.len(),
            network_buffers: self.system.network.inbound().len()
                + self.system.network.outbound().len(),
            network: self.params,
            multicast: self.profile.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopologySummary {
    pub num_cores: usize,
    pub num_clusters: usize,
    pub num_banks: usize,
    pub block_size_bits: u32,
    pub l2_index_start: u32,
    pub controllers: BTreeMap<&'static str, usize>,
    pub netdest: Vec<String>,
    pub buffers: usize,
    pub ordered_buffers: usize,
    pub network_buffers: usize,
    pub network: NetworkParams,
    pub multicast: MulticastProfile,
}

/// Builds the router graph over a finished topology.
pub trait TopologyConstructor {
    type Output;

    fn create_topology(self, topology: Topology) -> Result<Self::Output, ConfigError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtLink {
    pub link_id: usize,
    pub node: ControllerId,
    pub router: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntLink {
    pub link_id: usize,
    pub src_router: usize,
    pub dst_router: usize,
}

/// One router per network endpoint, every router linked to every other.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pt2PtTopology;

#[derive(Debug)]
pub struct Pt2PtNetwork {
    pub num_routers: usize,
    pub ext_links: Vec<ExtLink>,
    pub int_links: Vec<IntLink>,
    pub topology: Topology,
}

impl TopologyConstructor for Pt2PtTopology {
    type Output = Pt2PtNetwork;

    fn create_topology(self, topology: Topology) -> Result<Pt2PtNetwork, ConfigError> {
        let ext_links: Vec<ExtLink> = topology
            .netdest_order()
            .iter()
            .enumerate()
            .map(|(i, node)| ExtLink {
                link_id: i,
                node: *node,
                router: i,
            })
            .collect();
        let num_routers = ext_links.len();

        let mut link_id = num_routers;
        let mut int_links = Vec::with_capacity(num_routers * num_routers.saturating_sub(1));
        for src in 0..num_routers {
            for dst in (0..num_routers).filter(|&dst| dst != src) {
                int_links.push(IntLink {
                    link_id,
                    src_router: src,
                    dst_router: dst,
                });
                link_id += 1;
            }
        }

        Ok(Pt2PtNetwork {
            num_routers,
            ext_links,
            int_links,
            topology,
        })
    }
}

#[derive(Debug)]
pub struct SystemHandles<T> {
    /// One per core, indexed by core id.
    pub sequencers: Vec<SequencerHandle>,
    pub dma_sequencers: Vec<SequencerHandle>,
    /// Memory directories only; a ROM directory is in the topology but not here.
    pub directories: Vec<ControllerId>,
    pub topology: T,
}

/// Builds every controller and buffer of a three-level system, registers
/// them into `ruby`, and hands the result to `constructor`. Nothing is
/// returned on error.
pub fn create_system<C: TopologyConstructor>(
    config: &TopologyConfig,
    cpu_clock_domains: &[ClockDomain],
    dma_ports: &[DmaPort],
    mut ruby: RubySystem,
    registrar: &mut dyn TopologyRegistrar,
    constructor: C,
) -> Result<SystemHandles<C::Output>, ConfigError> {
    let geometry = resolve_geometry(&config.ruby)?;
    let params = NetworkParams::resolve(&config.network, config.ruby.cacheline_size)?;
    let plan = geometry.plan;
    if config.system.memctrl_clock_divider == 0 {
        return Err(ConfigError::ZeroCount {
            what: "memctrl_clock_divider",
        });
    }

    let workload = config.workload.benchmark.as_ref().and_then(resolve_workload);
    let profile = multicast_profile(workload, config.ruby.num_cpus);

    let RubySystem {
        clock_domain,
        controllers: table,
        network,
        ..
    } = &mut ruby;
    let ruby_clock: &ClockDomain = clock_domain;
    let mut wirer = ChannelWirer::new(&config.ruby, network);

    let factory = ControllerFactory::new(
        &geometry,
        config,
        cpu_clock_domains,
        ruby_clock,
        profile.clone(),
    );
    factory.validate_clock_domains()?;

    let mut sequencers = Vec::with_capacity(plan.num_cores());
    for cluster in 0..plan.num_clusters() {
        for core in 0..plan.cores_per_cluster() {
            sequencers.push(factory.build_core(cluster, core, &mut wirer, table)?);
        }
        for bank in 0..plan.banks_per_cluster() {
            factory.build_bank(cluster, bank, &mut wirer, table)?;
        }
    }

    let memctrl_clock =
        ruby_clock.derived("memctrl_clk_domain", config.system.memctrl_clock_divider);
    let directories = build_directories(&config.system, &memctrl_clock, &mut wirer, table)?;
    let dma_sequencers =
        build_dma_controllers(dma_ports, &config.system, ruby_clock, &mut wirer, table)?;

    let io_port = if config.system.full_system {
        Some(build_io_controller(
            dma_ports.len(),
            &config.system,
            ruby_clock,
            &mut wirer,
            table,
        )?)
    } else {
        register_cpu_topology(registrar, &plan, config);
        None
    };

    let controllers: &ControllerTable = table;
    let netdest: Vec<ControllerId> = NETDEST_ORDER
        .iter()
        .flat_map(|&kind| controllers.of_kind(kind).map(Controller::id))
        .collect();

    ruby.memctrl_clock_domain = Some(memctrl_clock);
    ruby.io_port = io_port;

    let topology = Topology {
        netdest,
        system: ruby,
        geometry,
        params,
        profile,
    };
    info!(
        "ruby: {} cores in {} clusters, {} l2 banks, {} directories, {} dma, {} network endpoints ({})",
        plan.num_cores(),
        plan.num_clusters(),
        plan.num_banks(),
        directories.memory.len(),
        dma_sequencers.len(),
        topology.netdest.len(),
        topology.params.ordering.constraint(),
    );

    Ok(SystemHandles {
        sequencers,
        dma_sequencers,
        directories: directories.memory,
        topology: constructor.create_topology(topology)?,
    })
}
