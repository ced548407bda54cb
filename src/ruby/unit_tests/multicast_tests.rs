use crate::ruby::multicast::{
    multicast_profile, resolve_workload, MulticastProfile, Workload, MAX_TARGET_PCS, WILDCARD_PC,
};
use crate::sim::config::WorkloadSelector;

#[test]
fn unknown_workload_gets_wildcard_profile() {
    for selector in [
        WorkloadSelector::Named("not-a-benchmark".to_owned()),
        WorkloadSelector::Numbered(0),
        WorkloadSelector::Numbered(42),
    ] {
        let profile = multicast_profile(resolve_workload(&selector), 16);
        assert_eq!(profile.group_count(), 1);
        assert!(profile.pc_slots().iter().all(|&pc| pc == WILDCARD_PC));
        assert_eq!(profile.start_pc(), WILDCARD_PC);
        assert_eq!(profile.end_pc(), WILDCARD_PC);
        assert!(profile.is_default());
        assert_eq!(profile, MulticastProfile::default());
    }
}

#[test]
fn benchmark_numbers_match_names() {
    let expected = [
        (1, "cachebw"),
        (2, "multilevel"),
        (3, "mv"),
        (4, "conv3d"),
        (5, "mlp"),
        (6, "backprop"),
        (7, "particlefilter"),
    ];
    for (num, name) in expected {
        let workload = Workload::from_benchmark(num).unwrap();
        assert_eq!(workload.name(), name);
        assert_eq!(Workload::from_name(name), Some(workload));
    }
    assert_eq!(Workload::from_name("readbw_multilevel"), Some(Workload::Multilevel));
    assert_eq!(Workload::from_name("conv3dfoowarm"), Some(Workload::Conv3d));
}

#[test]
fn mlp_targets_sixteen_pcs() {
    let profile = multicast_profile(Some(Workload::Mlp), 16);
    let pcs: Vec<u64> = profile.targeted_pcs().collect();
    assert_eq!(pcs.len(), 16);
    assert_eq!(pcs[0], 0x403f54);
    assert_eq!(pcs[15], 0x403ff5);
    assert!(profile.pc_slots()[16..MAX_TARGET_PCS].iter().all(|&pc| pc == WILDCARD_PC));
    assert!(profile.targets_pc(0x403f89));
    assert!(!profile.targets_pc(0x403f88));
    // no address window
    assert!(profile.in_window(0x1234));
}

#[test]
fn cachebw_uses_an_address_window() {
    let profile = multicast_profile(Some(Workload::CacheBw), 4);
    assert_eq!(profile.targeted_pcs().count(), 0);
    assert!(profile.targets_pc(0xdead));
    assert!(profile.in_window(0x4072c0));
    assert!(profile.in_window(0x4072f1));
    assert!(!profile.in_window(0x4072f2));
    assert!(!profile.in_window(0x4072bf));
    assert_eq!(profile.group_count(), 1);
}

#[test]
fn group_count_depends_on_core_count() {
    assert_eq!(multicast_profile(Some(Workload::Mv), 16).group_count(), 1);
    assert_eq!(multicast_profile(Some(Workload::Mv), 64).group_count(), 4);
    assert_eq!(multicast_profile(Some(Workload::Multilevel), 16).group_count(), 4);

    let backprop_16 = multicast_profile(Some(Workload::Backprop), 16);
    assert_eq!(backprop_16.targeted_pcs().count(), 4);
    assert_eq!(backprop_16.group_count(), 1);

    let backprop_64 = multicast_profile(Some(Workload::Backprop), 64);
    assert_eq!(backprop_64.targeted_pcs().count(), 4);
    assert_eq!(backprop_64.group_count(), 4);

    // only tuned at 16 and 64 cores
    let backprop_8 = multicast_profile(Some(Workload::Backprop), 8);
    assert_eq!(backprop_8.targeted_pcs().count(), 0);
    assert_eq!(backprop_8.group_count(), 1);
    assert_eq!(backprop_8.workload(), Some(Workload::Backprop));
}
