use crate::ruby::network::{
    buffers_per_data_vc, data_packet_flits, vnet_type, CoherenceConstraint, MulticastMode,
    NetworkParams, NocOrdering, OrderedConstraint, VnetType, NUM_VIRTUAL_NETWORKS,
};
use crate::sim::config::NetworkConfig;
use crate::sim::error::ConfigError;

fn network(constraint: &str, prepush: bool) -> NetworkConfig {
    NetworkConfig {
        coherence_constraint: constraint.to_owned(),
        prepush,
        ..NetworkConfig::default()
    }
}

#[test]
fn data_vc_depth_follows_link_width() {
    assert_eq!(buffers_per_data_vc(64, 128), Ok(5));
    assert_eq!(buffers_per_data_vc(64, 64), Ok(9));
    for shift in 0..=9 {
        let width = 1u32 << shift;
        assert_eq!(buffers_per_data_vc(64, width), Ok(512 / width + 1));
    }
}

#[test]
fn misaligned_link_width_is_rejected() {
    assert_eq!(
        buffers_per_data_vc(64, 96),
        Err(ConfigError::LinkWidthMisaligned {
            link_width_bits: 96,
            line_bits: 512
        })
    );
    assert!(buffers_per_data_vc(64, 1024).is_err());
    assert!(buffers_per_data_vc(64, 0).is_err());
}

#[test]
fn constraint_strings_parse() {
    assert_eq!("unordered".parse::<CoherenceConstraint>(), Ok(CoherenceConstraint::Unordered));
    assert_eq!("ordered-vnet".parse::<CoherenceConstraint>(), Ok(CoherenceConstraint::OrderedVnet));
    assert_eq!(
        "ordered-prepush-inv".parse::<CoherenceConstraint>(),
        Ok(CoherenceConstraint::OrderedPrepushInv)
    );
    assert_eq!(
        "ordered".parse::<CoherenceConstraint>(),
        Err(ConfigError::UnknownCoherenceConstraint("ordered".to_owned()))
    );
}

#[test]
fn prepush_needs_an_ordered_noc() {
    assert_eq!(
        NocOrdering::resolve(&network("unordered", true)),
        Err(ConfigError::PrepushOnUnorderedNoc)
    );

    let vnet = NocOrdering::resolve(&network("ordered-vnet", true)).unwrap();
    assert!(vnet.prepush_enabled());
    assert_eq!(vnet.constraint(), CoherenceConstraint::OrderedVnet);

    let inv = NocOrdering::resolve(&network("ordered-prepush-inv", true)).unwrap();
    assert!(matches!(
        inv,
        NocOrdering::Prepush {
            constraint: OrderedConstraint::PrepushInv,
            ..
        }
    ));

    let plain = NocOrdering::resolve(&network("unordered", false)).unwrap();
    assert_eq!(plain, NocOrdering::Plain(CoherenceConstraint::Unordered));
    assert!(!plain.prepush_enabled());
}

#[test]
fn prepush_filter_is_carried() {
    let mut config = network("ordered-vnet", true);
    config.prepush_filter = true;
    config.prepush_filter_nodrop = true;
    match NocOrdering::resolve(&config).unwrap() {
        NocOrdering::Prepush { filter, .. } => {
            assert!(filter.enabled);
            assert!(filter.no_drop);
        }
        other => panic!("expected prepush ordering, got {other:?}"),
    }
}

#[test]
fn multicast_needs_deadlock_avoidance() {
    let mut config = NetworkConfig {
        enable_multicast: true,
        ..NetworkConfig::default()
    };
    assert_eq!(
        NetworkParams::resolve(&config, 64),
        Err(ConfigError::MulticastWithoutDeadlockAvoidance)
    );

    config.double_channel_multicast = true;
    assert_eq!(
        NetworkParams::resolve(&config, 64).unwrap().multicast,
        MulticastMode::Enabled {
            double_channel: true,
            asynchronous: false
        }
    );
}

#[test]
fn asynchronous_multicast_needs_a_packet_to_fit_one_vc() {
    let mut config = NetworkConfig {
        enable_multicast: true,
        asynchronous_multicast: true,
        ..NetworkConfig::default()
    };
    let params = NetworkParams::resolve(&config, 64).unwrap();
    assert_eq!(
        params.multicast,
        MulticastMode::Enabled {
            double_channel: false,
            asynchronous: true
        }
    );
    assert_eq!(data_packet_flits(64, 16), 5);

    // 4-byte flits: 18 flits against 17 buffers
    config.link_width_bits = 32;
    assert_eq!(
        NetworkParams::resolve(&config, 64),
        Err(ConfigError::DataPacketExceedsVc {
            flits: 18,
            buffers_per_data_vc: 17
        })
    );
}

#[test]
fn default_params() {
    let params = NetworkParams::resolve(&NetworkConfig::default(), 64).unwrap();
    assert_eq!(params.link_width_bits, 128);
    assert_eq!(params.ni_flit_size_bytes, 16);
    assert_eq!(params.buffers_per_data_vc, 5);
    assert_eq!(params.virtual_networks, NUM_VIRTUAL_NETWORKS);
    assert_eq!(params.multicast, MulticastMode::Disabled);
    assert!(!params.multicast.is_enabled());
    assert_eq!(vnet_type(1), VnetType::Data);
    assert_eq!(vnet_type(0), VnetType::Control);
    assert_eq!(vnet_type(2), VnetType::Control);
}

#[test]
fn sub_byte_link_width_is_rejected() {
    let config = NetworkConfig {
        link_width_bits: 4,
        ..NetworkConfig::default()
    };
    assert_eq!(
        NetworkParams::resolve(&config, 64),
        Err(ConfigError::LinkWidthNotByteMultiple(4))
    );
}

#[test]
fn asynchronous_vc_fit_applies_alongside_double_channel() {
    let mut config = NetworkConfig {
        enable_multicast: true,
        double_channel_multicast: true,
        asynchronous_multicast: true,
        ..NetworkConfig::default()
    };
    let params = NetworkParams::resolve(&config, 64).unwrap();
    assert_eq!(
        params.multicast,
        MulticastMode::Enabled {
            double_channel: true,
            asynchronous: true
        }
    );

    config.link_width_bits = 32;
    assert_eq!(
        NetworkParams::resolve(&config, 64),
        Err(ConfigError::DataPacketExceedsVc {
            flits: 18,
            buffers_per_data_vc: 17
        })
    );

    // double channel alone has no vc fit requirement
    config.asynchronous_multicast = false;
    assert!(NetworkParams::resolve(&config, 64).is_ok());
}

#[test]
fn oversized_cacheline_is_rejected() {
    let huge = 1u64 << 61;
    assert_eq!(
        buffers_per_data_vc(huge, 128),
        Err(ConfigError::LineSizeTooLarge(huge))
    );
    // vc depth no longer fits 32 bits
    assert_eq!(
        buffers_per_data_vc(1 << 40, 8),
        Err(ConfigError::LineSizeTooLarge(1 << 40))
    );
    assert_eq!(data_packet_flits(u64::MAX, 16), u32::MAX);
}
