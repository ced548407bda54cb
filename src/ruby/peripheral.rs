use log::debug;

use crate::ruby::controller::{
    ClockDomain, Controller, ControllerId, ControllerKind, ControllerRole, ControllerTable,
    Directory, DmaEngine, SequencerHandle, SequencerKind, SEQUENCER_MAX_OUTSTANDING,
};
use crate::ruby::factory::TBE_POOL_SIZE;
use crate::ruby::wiring::ChannelWirer;
use crate::sim::config::SystemConfig;
use crate::sim::error::ConfigError;

const DIRECTORY_TRANSITIONS_PER_CYCLE: usize = 32;

/// A device-side port a DMA sequencer is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmaPort {
    pub name: String,
}

impl DmaPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Memory directories followed by the boot-ROM directory, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directories {
    pub memory: Vec<ControllerId>,
    pub rom: Option<ControllerId>,
}

/// Memory directories take ids `0..num_dirs`; the ROM directory, when
/// present, takes the next id.
pub fn build_directories(
    system: &SystemConfig,
    memctrl_clock: &ClockDomain,
    wirer: &mut ChannelWirer<'_>,
    table: &mut ControllerTable,
) -> Result<Directories, ConfigError> {
    if system.num_dirs == 0 {
        return Err(ConfigError::ZeroCount { what: "num_dirs" });
    }

    let mut build = |id: usize, rom: bool| -> Result<ControllerId, ConfigError> {
        let dir = ControllerId::new(ControllerKind::Directory, id);
        let ports = wirer.wire_directory(dir);
        table.register(Controller::new(
            dir,
            None,
            TBE_POOL_SIZE,
            DIRECTORY_TRANSITIONS_PER_CYCLE,
            memctrl_clock.clone(),
            ControllerRole::Directory(Directory { rom, ports }),
        ))?;
        Ok(dir)
    };

    let memory = (0..system.num_dirs)
        .map(|id| build(id, false))
        .collect::<Result<Vec<_>, _>>()?;
    let rom = if system.rom_directory {
        Some(build(system.num_dirs, true)?)
    } else {
        None
    };

    debug!("{} memory directories, rom directory: {}", memory.len(), rom.is_some());
    Ok(Directories { memory, rom })
}

#[allow(clippy::too_many_arguments)]
fn build_dma_engine(
    id: ControllerId,
    sequencer_kind: SequencerKind,
    sequencer_version: usize,
    port: Option<&DmaPort>,
    system: &SystemConfig,
    ruby_clock: &ClockDomain,
    wirer: &mut ChannelWirer<'_>,
    table: &mut ControllerTable,
) -> Result<SequencerHandle, ConfigError> {
    let ports = wirer.wire_dma(id);
    let port_name = port.map(|p| p.name.clone());
    table.register(Controller::new(
        id,
        None,
        TBE_POOL_SIZE,
        system.dma_transitions_per_cycle,
        ruby_clock.clone(),
        ControllerRole::Dma(DmaEngine {
            port: port_name.clone().unwrap_or_else(|| "io".to_owned()),
            sequencer_version,
            ports,
        }),
    ))?;
    Ok(SequencerHandle {
        kind: sequencer_kind,
        version: sequencer_version,
        controller: id,
        max_outstanding_requests: SEQUENCER_MAX_OUTSTANDING,
        clock_domain: ruby_clock.clone(),
        port: port_name,
    })
}

/// One DMA controller and sequencer per port, both numbered by port index.
pub fn build_dma_controllers(
    dma_ports: &[DmaPort],
    system: &SystemConfig,
    ruby_clock: &ClockDomain,
    wirer: &mut ChannelWirer<'_>,
    table: &mut ControllerTable,
) -> Result<Vec<SequencerHandle>, ConfigError> {
    dma_ports
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let id = ControllerId::new(ControllerKind::Dma, i);
            debug!("{id} bound to {}", port.name);
            build_dma_engine(id, SequencerKind::Dma, i, Some(port), system, ruby_clock, wirer, table)
        })
        .collect()
}

/// Full-system only. Its sequencer is numbered after the DMA sequencers.
pub fn build_io_controller(
    num_dma_ports: usize,
    system: &SystemConfig,
    ruby_clock: &ClockDomain,
    wirer: &mut ChannelWirer<'_>,
    table: &mut ControllerTable,
) -> Result<SequencerHandle, ConfigError> {
    let id = ControllerId::new(ControllerKind::Io, 0);
    build_dma_engine(id, SequencerKind::Io, num_dma_ports, None, system, ruby_clock, wirer, table)
}
