use log::{debug, warn};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use phf::phf_map;
use serde::Serialize;

use crate::sim::config::WorkloadSelector;

/// Fills every PC slot and window bound nobody targeted; matches anything.
pub const WILDCARD_PC: u64 = 1;
pub const MAX_TARGET_PCS: usize = 32;

/// Benchmarks with a hand-tuned multicast profile, numbered the way the
/// experiment launcher numbers them.
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Workload {
    CacheBw        = 1,
    Multilevel     = 2,
    Mv             = 3,
    Conv3d         = 4,
    Mlp            = 5,
    Backprop       = 6,
    ParticleFilter = 7,
}

impl Workload {
    pub fn name(self) -> &'static str {
        match self {
            Workload::CacheBw => "cachebw",
            Workload::Multilevel => "multilevel",
            Workload::Mv => "mv",
            Workload::Conv3d => "conv3d",
            Workload::Mlp => "mlp",
            Workload::Backprop => "backprop",
            Workload::ParticleFilter => "particlefilter",
        }
    }

    pub fn from_benchmark(num: u32) -> Option<Self> {
        FromPrimitive::from_u32(num)
    }

    /// Accepts the short name and the binary names the launcher uses.
    pub fn from_name(name: &str) -> Option<Self> {
        WORKLOADS.get(name).map(|def| def.workload)
    }
}

/// Unknown selectors fall back to no workload, which gets the default profile.
pub fn resolve_workload(selector: &WorkloadSelector) -> Option<Workload> {
    let workload = match selector {
        WorkloadSelector::Numbered(n) => Workload::from_benchmark(*n),
        WorkloadSelector::Named(name) => Workload::from_name(name),
    };
    if workload.is_none() {
        warn!("no multicast profile for workload {selector:?}, using the default");
    }
    workload
}

struct ProfileDef {
    pcs: &'static [u64],
    start_pc: u64,
    end_pc: u64,
    group_count: u32,
}

const DEFAULT_DEF: ProfileDef = ProfileDef {
    pcs: &[],
    start_pc: WILDCARD_PC,
    end_pc: WILDCARD_PC,
    group_count: 1,
};

struct WorkloadDef {
    workload: Workload,
    base: ProfileDef,
    /// Replaces `base` outright when the core count matches.
    by_core_count: &'static [(usize, ProfileDef)],
}

const MV_PCS: &[u64] = &[0x4021f0];
const CONV3D_PCS: &[u64] = &[0x40231b];
const MLP_PCS: &[u64] = &[
    0x403f54, 0x403f62, 0x403f6f, 0x403f7c, 0x403f89, 0x403f96, 0x403fa0, 0x403faa,
    0x403fb4, 0x403fbe, 0x403fc8, 0x403fd2, 0x403fdc, 0x403fe6, 0x403ff0, 0x403ff5,
];
const BACKPROP_PCS: &[u64] = &[0x402ec0, 0x402ede, 0x402f22, 0x4033a0];
const PARTICLEFILTER_PCS: &[u64] = &[0x403530, 0x403c60, 0x403c65, 0x404d60];

const CACHEBW: WorkloadDef = WorkloadDef {
    workload: Workload::CacheBw,
    base: ProfileDef { start_pc: 0x4072c0, end_pc: 0x4072f1, ..DEFAULT_DEF },
    by_core_count: &[],
};

const MULTILEVEL: WorkloadDef = WorkloadDef {
    workload: Workload::Multilevel,
    base: ProfileDef { start_pc: 0x404b5d, end_pc: 0x404b8e, group_count: 4, ..DEFAULT_DEF },
    by_core_count: &[],
};

const MV: WorkloadDef = WorkloadDef {
    workload: Workload::Mv,
    base: ProfileDef { pcs: MV_PCS, ..DEFAULT_DEF },
    by_core_count: &[(64, ProfileDef { pcs: MV_PCS, group_count: 4, ..DEFAULT_DEF })],
};

const CONV3D: WorkloadDef = WorkloadDef {
    workload: Workload::Conv3d,
    base: ProfileDef { pcs: CONV3D_PCS, ..DEFAULT_DEF },
    by_core_count: &[],
};

const MLP: WorkloadDef = WorkloadDef {
    workload: Workload::Mlp,
    base: ProfileDef { pcs: MLP_PCS, ..DEFAULT_DEF },
    by_core_count: &[],
};

// Only tuned at 16 and 64 cores.
const BACKPROP: WorkloadDef = WorkloadDef {
    workload: Workload::Backprop,
    base: DEFAULT_DEF,
    by_core_count: &[
        (16, ProfileDef { pcs: BACKPROP_PCS, ..DEFAULT_DEF }),
        (64, ProfileDef { pcs: BACKPROP_PCS, group_count: 4, ..DEFAULT_DEF }),
    ],
};

const PARTICLEFILTER: WorkloadDef = WorkloadDef {
    workload: Workload::ParticleFilter,
    base: ProfileDef { pcs: PARTICLEFILTER_PCS, ..DEFAULT_DEF },
    by_core_count: &[],
};

static WORKLOADS: phf::Map<&'static str, WorkloadDef> = phf_map! {
    "cachebw"           => CACHEBW,
    "multilevel"        => MULTILEVEL,
    "readbw_multilevel" => MULTILEVEL,
    "mv"                => MV,
    "conv3d"            => CONV3D,
    "conv3dfoowarm"     => CONV3D,
    "mlp"               => MLP,
    "backprop"          => BACKPROP,
    "particlefilter"    => PARTICLEFILTER,
};

/// PCs and address window whose accesses may be multicast, plus how many
/// host groups the cores split into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MulticastProfile {
    workload: Option<Workload>,
    pcs: [u64; MAX_TARGET_PCS],
    start_pc: u64,
    end_pc: u64,
    group_count: u32,
}

impl Default for MulticastProfile {
    fn default() -> Self {
        Self::from_def(None, &DEFAULT_DEF)
    }
}

impl MulticastProfile {
    fn from_def(workload: Option<Workload>, def: &ProfileDef) -> Self {
        debug_assert!(def.pcs.len() <= MAX_TARGET_PCS);
        let mut pcs = [WILDCARD_PC; MAX_TARGET_PCS];
        pcs[..def.pcs.len()].copy_from_slice(def.pcs);
        Self {
            workload,
            pcs,
            start_pc: def.start_pc,
            end_pc: def.end_pc,
            group_count: def.group_count,
        }
    }

    pub fn workload(&self) -> Option<Workload> {
        self.workload
    }

    /// All 32 slots in order, wildcards included.
    pub fn pc_slots(&self) -> &[u64; MAX_TARGET_PCS] {
        &self.pcs
    }

    pub fn targeted_pcs(&self) -> impl Iterator<Item = u64> + '_ {
        self.pcs.iter().copied().filter(|&pc| pc != WILDCARD_PC)
    }

    pub fn start_pc(&self) -> u64 {
        self.start_pc
    }

    pub fn end_pc(&self) -> u64 {
        self.end_pc
    }

    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    /// Nothing targeted means every PC is.
    pub fn targets_pc(&self, pc: u64) -> bool {
        let mut targeted = self.targeted_pcs().peekable();
        targeted.peek().is_none() || targeted.any(|t| t == pc)
    }

    /// A wildcard bound leaves that side of the window open.
    pub fn in_window(&self, pc: u64) -> bool {
        let low = if self.start_pc == WILDCARD_PC { 0 } else { self.start_pc };
        let high = if self.end_pc == WILDCARD_PC { u64::MAX } else { self.end_pc };
        (low..=high).contains(&pc)
    }

    pub fn is_default(&self) -> bool {
        self.targeted_pcs().next().is_none()
            && self.start_pc == WILDCARD_PC
            && self.end_pc == WILDCARD_PC
            && self.group_count == 1
    }
}

pub fn multicast_profile(workload: Option<Workload>, num_cpus: usize) -> MulticastProfile {
    let Some(workload) = workload else {
        return MulticastProfile::default();
    };
    let Some(def) = WORKLOADS.get(workload.name()) else {
        return MulticastProfile::default();
    };
    let profile = def
        .by_core_count
        .iter()
        .find(|(cores, _)| *cores == num_cpus)
        .map(|(_, p)| p)
        .unwrap_or(&def.base);

    debug!(
        "multicast profile for {} at {num_cpus} cores: {} pcs, {} groups",
        workload.name(),
        profile.pcs.len(),
        profile.group_count
    );
    MulticastProfile::from_def(Some(workload), profile)
}
