use super::*;

fn table(text: &str) -> Table {
    toml::from_str(text).expect("test toml should parse")
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let config = TopologyConfig::from_table(&Table::new()).unwrap();
    assert_eq!(config.ruby.num_cpus, 1);
    assert_eq!(config.ruby.cacheline_size, 64);
    assert_eq!(config.ruby.message_buffer_size, 0);
    assert_eq!(config.caches.l1.size, 64 * 1024);
    assert_eq!(config.caches.l2.assoc, 8);
    assert_eq!(config.network.coherence_constraint, "unordered");
    assert_eq!(config.protocol, ProtocolConfig::default());
    assert_eq!(config.system.memctrl_clock_divider, 3);
    assert!(config.workload.benchmark.is_none());
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = TopologyConfig::from_table(&table(
        r#"
        [ruby]
        num_cpus = 16
        num_clusters = 4
        coalescing = true

        [protocol]
        timeout_threshold = 1024
        "#,
    ))
    .unwrap();
    assert_eq!(config.ruby.num_cpus, 16);
    assert_eq!(config.ruby.num_clusters, 4);
    assert_eq!(config.ruby.num_l2caches, 1);
    assert!(config.ruby.coalescing);
    assert!(!config.ruby.filter_drop);
    assert_eq!(config.protocol.timeout_threshold, 1024);
    assert!(config.protocol.en_softprepush);
}

#[test]
fn cache_sizes_accept_strings_and_integers() {
    let config = TopologyConfig::from_table(&table(
        r#"
        [caches.l0d]
        size = "32kB"
        assoc = 4

        [caches.l1]
        size = 131072

        [caches.l2]
        size = "1MB"
        "#,
    ))
    .unwrap();
    assert_eq!(config.caches.l0d.size, 32 * 1024);
    assert_eq!(config.caches.l0d.assoc, 4);
    assert_eq!(config.caches.l0d.transitions_per_cycle, 32);
    assert_eq!(config.caches.l1.size, 128 * 1024);
    assert_eq!(config.caches.l2.size, 1 << 20);
    // untouched levels keep their defaults
    assert_eq!(config.caches.l0i, CacheLevelConfig::default());
}

#[test]
fn bad_size_string_is_rejected() {
    let result = TopologyConfig::from_table(&table(
        r#"
        [caches.l2]
        size = "two megs"
        "#,
    ));
    assert!(result.is_err());
}

#[test]
fn workload_by_name_or_number() {
    let named = TopologyConfig::from_table(&table("[workload]\nbenchmark = \"mlp\"\n")).unwrap();
    assert_eq!(
        named.workload.benchmark,
        Some(WorkloadSelector::Named("mlp".to_owned()))
    );

    let numbered = TopologyConfig::from_table(&table("[workload]\nbenchmark = 6\n")).unwrap();
    assert_eq!(numbered.workload.benchmark, Some(WorkloadSelector::Numbered(6)));

    assert_eq!("3".parse::<WorkloadSelector>(), Ok(WorkloadSelector::Numbered(3)));
    assert_eq!(
        "conv3d".parse::<WorkloadSelector>(),
        Ok(WorkloadSelector::Named("conv3d".to_owned()))
    );
    assert!("".parse::<WorkloadSelector>().is_err());
}

#[test]
fn print_all_turns_on_every_level() {
    let mut ruby = RubyConfig {
        print_l1_cache_evict_dist: true,
        ..RubyConfig::default()
    };
    assert!(!ruby.print_evict_dist(CacheLevel::L0));
    assert!(ruby.print_evict_dist(CacheLevel::L1));
    assert!(!ruby.print_evict_dist(CacheLevel::L2));

    ruby.print_all_cache_evict_dist = true;
    for level in [CacheLevel::L0, CacheLevel::L1, CacheLevel::L2] {
        assert!(ruby.print_evict_dist(level));
    }
}
