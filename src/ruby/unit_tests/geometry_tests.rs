use crate::ruby::geometry::{resolve_geometry, ClusterPlan};
use crate::sim::config::RubyConfig;
use crate::sim::error::ConfigError;

fn ruby(num_cpus: usize, num_clusters: usize, num_l2caches: usize) -> RubyConfig {
    RubyConfig {
        num_cpus,
        num_clusters,
        num_l2caches,
        ..RubyConfig::default()
    }
}

#[test]
fn core_ids_are_dense_for_every_divisible_split() {
    for cores in 1..=16 {
        for clusters in (1..=cores).filter(|c| cores % c == 0) {
            let plan = ClusterPlan::new(cores, clusters, clusters).unwrap();
            let mut seen = vec![false; cores];
            for cluster in 0..clusters {
                for idx in 0..plan.cores_per_cluster() {
                    let id = plan.core_id(cluster, idx);
                    assert!(!seen[id], "core id {id} assigned twice");
                    seen[id] = true;
                    assert_eq!(plan.cluster_of_core(id), cluster);
                }
            }
            assert!(seen.into_iter().all(|s| s));
        }
    }
}

#[test]
fn indivisible_counts_are_rejected() {
    assert_eq!(
        ClusterPlan::new(6, 4, 4),
        Err(ConfigError::CoresNotDivisible {
            num_cpus: 6,
            num_clusters: 4
        })
    );
    assert_eq!(
        ClusterPlan::new(8, 4, 6),
        Err(ConfigError::BanksNotDivisible {
            num_l2caches: 6,
            num_clusters: 4
        })
    );
    assert_eq!(
        ClusterPlan::new(8, 0, 4),
        Err(ConfigError::ZeroCount { what: "num_clusters" })
    );
}

#[test]
fn l2_index_starts_above_bank_select_bits() {
    for log_banks in 0..5u32 {
        let banks_per_cluster = 1usize << log_banks;
        for clusters in [1, 2, 4] {
            let geometry =
                resolve_geometry(&ruby(clusters * 4, clusters, clusters * banks_per_cluster)).unwrap();
            assert_eq!(geometry.block_size_bits, 6);
            assert_eq!(geometry.l2_select_bits, log_banks);
            assert_eq!(geometry.l2_index_start(), 6 + log_banks);
            assert_eq!(geometry.private_index_start(), 6);
        }
    }
}

#[test]
fn line_size_sets_block_bits() {
    let mut config = ruby(4, 1, 4);
    config.cacheline_size = 128;
    let geometry = resolve_geometry(&config).unwrap();
    assert_eq!(geometry.block_size_bits, 7);
    assert_eq!(geometry.l2_index_start(), 9);

    config.cacheline_size = 96;
    assert_eq!(
        resolve_geometry(&config),
        Err(ConfigError::LineSizeNotPowerOfTwo(96))
    );
}

#[test]
fn odd_bank_count_rounds_select_bits_down() {
    let geometry = resolve_geometry(&ruby(3, 1, 3)).unwrap();
    assert_eq!(geometry.l2_select_bits, 1);
    assert_eq!(geometry.plan.banks_per_cluster(), 3);
}
