use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use toml::Table;

use ruby_topology::ruby::{
    create_system, ClockDomain, DmaPort, Pt2PtTopology, RecordingRegistrar, RubySystem,
};
use ruby_topology::sim::config::{TopologyConfig, WorkloadSelector};

#[derive(Parser)]
#[command(version, about)]
struct TopologyArgs {
    #[arg(help="Path to config.toml")]
    config_path: PathBuf,
    #[arg(long, help="Override number of cores")]
    num_cpus: Option<usize>,
    #[arg(long, help="Override number of clusters")]
    num_clusters: Option<usize>,
    #[arg(long, help="Override number of L2 banks")]
    num_l2caches: Option<usize>,
    #[arg(long, help="Override workload (name or benchmark number)")]
    workload: Option<WorkloadSelector>,
    #[arg(long, help="Build an IO controller instead of registering cpu topology")]
    full_system: bool,
    #[arg(long, help="Override number of DMA ports")]
    num_dma_ports: Option<usize>,
    #[arg(long, help="Print a JSON summary of the topology")]
    json: bool,
}

pub fn main() -> Result<()> {
    env_logger::init();

    let argv = TopologyArgs::parse();
    let text = fs::read_to_string(&argv.config_path)
        .with_context(|| format!("failed to read config file {}", argv.config_path.display()))?;
    let table: Table = toml::from_str(&text).context("cannot parse config toml")?;
    let mut config = TopologyConfig::from_table(&table).context("invalid config")?;

    // override toml configs with argv
    config.ruby.num_cpus = argv.num_cpus.unwrap_or(config.ruby.num_cpus);
    config.ruby.num_clusters = argv.num_clusters.unwrap_or(config.ruby.num_clusters);
    config.ruby.num_l2caches = argv.num_l2caches.unwrap_or(config.ruby.num_l2caches);
    config.system.full_system |= argv.full_system;
    config.system.num_dma_ports = argv.num_dma_ports.unwrap_or(config.system.num_dma_ports);
    if let Some(workload) = argv.workload {
        config.workload.benchmark = Some(workload);
    }

    let clock_domains: Vec<ClockDomain> = (0..config.ruby.num_cpus)
        .map(|i| ClockDomain::new(format!("cpu{i}_clk_domain")))
        .collect();
    let dma_ports: Vec<DmaPort> = (0..config.system.num_dma_ports)
        .map(|i| DmaPort::new(format!("dma{i}.port")))
        .collect();
    let ruby = RubySystem::new(ClockDomain::new("ruby_clk_domain"));
    let mut registrar = RecordingRegistrar::default();

    let handles = create_system(
        &config,
        &clock_domains,
        &dma_ports,
        ruby,
        &mut registrar,
        Pt2PtTopology,
    )
    .context("topology construction failed")?;

    let network = &handles.topology;
    let summary = network.topology.summary();
    info!(
        "{} routers, {} external links, {} internal links, {} cpu/cache records",
        network.num_routers,
        network.ext_links.len(),
        network.int_links.len(),
        registrar.cpus.len() + registrar.caches.len(),
    );

    if argv.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} cores / {} clusters / {} l2 banks, {} sequencers, {} directories",
            summary.num_cores,
            summary.num_clusters,
            summary.num_banks,
            handles.sequencers.len(),
            handles.directories.len(),
        );
        for (i, node) in summary.netdest.iter().enumerate() {
            println!("  [{i:3}] {node}");
        }
    }
    Ok(())
}
