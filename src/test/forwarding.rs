use std::collections::HashSet;
use std::net::Ipv4Addr;

use super::support::FakeNode;
use crate::net::PacketTags;
use crate::routing::{
    Command, GbrRouting, GossipDatagram, GossipMessage, InputVerdict, Nse, RouteSelectMode,
    RoutingConfig, RoutingError, remaining_budget,
};
use crate::sim::SimTime;

const DEST: Ipv4Addr = Ipv4Addr::new(10, 0, 9, 2);
const GW1: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
const GW2: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 6);

/// 两个出接口：接口 1 (10.0.0.1) 和接口 2 (10.0.0.5)
fn two_port_node() -> FakeNode {
    FakeNode::new()
        .with_p2p(Ipv4Addr::new(10, 0, 0, 1))
        .with_p2p(Ipv4Addr::new(10, 0, 0, 5))
}

fn routing(mode: RouteSelectMode) -> (GbrRouting, FakeNode) {
    let mut node = two_port_node();
    let mut r = GbrRouting::new(RoutingConfig::with_mode(mode));
    r.initialize(&mut node);
    (r, node)
}

fn budget(us: u32) -> PacketTags {
    PacketTags::with_budget(us, SimTime::ZERO)
}

#[test]
fn packets_without_budget_take_the_shortest_route() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, None, 3);
    r.add_host_route_to(DEST, GW2, 2, None, 2);

    let mut tags = PacketTags::default();
    let route = r
        .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
        .expect("route");
    assert_eq!(route.out_if, 2);
    assert_eq!(route.gateway, GW2);
    assert_eq!(route.source, Ipv4Addr::new(10, 0, 0, 5));
    assert_eq!(tags.distance, None, "ECMP never writes the distance tag");
}

#[test]
fn ecmp_ties_resolve_to_first_entry_unless_randomized() {
    let (mut r, _node) = routing(RouteSelectMode::Ecmp);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    r.add_host_route_to(DEST, GW2, 2, None, 2);
    for _ in 0..20 {
        assert_eq!(r.lookup_ecmp(DEST, None).expect("route").interface(), 1);
    }
    assert_eq!(r.lookup_ecmp(DEST, Some(2)).expect("route").interface(), 2);
    assert!(r.lookup_ecmp(Ipv4Addr::new(10, 9, 9, 9), None).is_none());

    let mut cfg = RoutingConfig::with_mode(RouteSelectMode::Ecmp);
    cfg.random_ecmp_routing = true;
    let mut r = GbrRouting::new(cfg);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    r.add_host_route_to(DEST, GW2, 2, None, 2);
    r.add_host_route_to(DEST, GW2, 2, None, 5);
    let seen: HashSet<u32> = (0..200)
        .map(|_| r.lookup_ecmp(DEST, None).expect("route").interface())
        .collect();
    assert_eq!(seen, HashSet::from([1, 2]));
}

#[test]
fn dgr_forwards_when_estimate_fits_budget() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, Some(2), 2);

    let mut tags = budget(5_000);
    let route = r
        .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
        .expect("route within budget");
    assert_eq!(route.out_if, 1);
    assert_eq!(tags.distance, Some(2));
}

#[test]
fn dgr_rejects_when_no_candidate_fits_budget() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, Some(2), 2);

    let mut tags = budget(500);
    let err = r
        .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
        .expect_err("2000us estimate exceeds 500us budget");
    assert_eq!(err, RoutingError::NoRouteToHost(DEST));
    assert_eq!(tags.distance, None);
}

#[test]
fn ddr_falls_back_to_shortest_route_when_budget_is_exhausted() {
    let (mut r, node) = routing(RouteSelectMode::Ddr);
    r.add_host_route_to(DEST, GW1, 1, Some(2), 2);
    r.add_host_route_to(DEST, GW2, 2, Some(1), 4);

    let mut tags = budget(500);
    let route = r
        .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
        .expect("fallback route");
    assert_eq!(route.out_if, 1);
    assert_eq!(tags.distance, Some(2));
}

#[test]
fn ddr_counts_one_extra_hop() {
    let (mut r, node) = routing(RouteSelectMode::Ddr);
    r.add_host_route_to(DEST, GW1, 1, Some(2), 2);
    assert_eq!(r.estimate_delay(&node, r.get_route(0).expect("entry"), false), 2_000);
    assert_eq!(r.estimate_delay(&node, r.get_route(0).expect("entry"), true), 3_000);
}

#[test]
fn ddr_greedily_picks_the_shortest_survivor() {
    let (mut r, node) = routing(RouteSelectMode::Ddr);
    r.add_host_route_to(DEST, GW2, 2, None, 3);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    for _ in 0..20 {
        let mut tags = budget(10_000);
        let route = r
            .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .expect("route");
        assert_eq!(route.out_if, 1);
    }
}

#[test]
fn dgr_spreads_over_all_survivors() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    r.add_host_route_to(DEST, GW2, 2, None, 3);
    let mut seen = HashSet::new();
    for _ in 0..200 {
        let mut tags = budget(10_000);
        let route = r
            .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .expect("route");
        assert_eq!(tags.distance, Some(if route.out_if == 1 { 2 } else { 3 }));
        seen.insert(route.out_if);
    }
    assert_eq!(seen, HashSet::from([1, 2]));
}

#[test]
fn distance_tag_prevents_longer_detours() {
    let (mut r, node) = routing(RouteSelectMode::KShort);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    r.add_host_route_to(DEST, GW2, 2, None, 3);
    for _ in 0..50 {
        let mut tags = budget(10_000);
        tags.distance = Some(2);
        let route = r
            .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .expect("route");
        assert_eq!(route.out_if, 1);
    }

    let mut tags = budget(10_000);
    tags.distance = Some(1);
    assert!(
        r.route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .is_err()
    );
}

#[test]
fn kshort_never_sends_back_out_the_incoming_interface() {
    let (mut r, node) = routing(RouteSelectMode::KShort);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    r.add_host_route_to(DEST, GW2, 2, None, 2);
    for _ in 0..50 {
        let mut tags = budget(10_000);
        match r.route_input(&node, DEST, &mut tags, 1, SimTime::ZERO) {
            InputVerdict::Forward(route) => assert_eq!(route.out_if, 2),
            other => panic!("unexpected verdict {other:?}"),
        }
    }
}

#[test]
fn down_interfaces_are_not_budget_candidates() {
    let (mut r, mut node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    r.add_host_route_to(DEST, GW2, 2, None, 2);
    node.ifaces[1].up = false;
    for _ in 0..20 {
        let mut tags = budget(10_000);
        let route = r
            .route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .expect("route");
        assert_eq!(route.out_if, 2);
    }
}

#[test]
fn local_queue_occupancy_counts_against_budget() {
    let (mut r, mut node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, None, 2);
    node.set_occupancy(1, 2);

    let mut tags = budget(5_000);
    assert!(
        r.route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .is_err(),
        "2000us path + 4000us local queue exceeds 5000us"
    );
    let mut tags = budget(6_000);
    assert!(
        r.route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .is_ok()
    );
}

#[test]
fn remaining_budget_shrinks_with_elapsed_time() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, None, 2);

    let tags = PacketTags::with_budget(5_000, SimTime::from_millis(1));
    assert_eq!(remaining_budget(&tags, SimTime::from_millis(3)), 3_000);
    assert_eq!(remaining_budget(&tags, SimTime::from_millis(10)), 0);
    assert_eq!(remaining_budget(&PacketTags::default(), SimTime::ZERO), 0);

    let mut late = tags;
    assert!(
        r.route_output(&node, DEST, &mut late, None, SimTime::from_millis(5))
            .is_err()
    );
}

#[test]
fn gossiped_neighbor_congestion_excludes_route() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    r.add_host_route_to(DEST, GW1, 1, Some(2), 2);

    let payload = GossipMessage::response(vec![Nse {
        interface: 2,
        state: 5,
    }])
    .encode()
    .expect("encode");
    r.receive(
        &node,
        GossipDatagram {
            sender: GW1,
            recv_if: Some(1),
            ttl: Some(1),
            payload,
        },
    );
    assert_eq!(r.nsdb().delay_dgr(1, 2), 10_000);

    let mut tags = budget(5_000);
    assert!(
        r.route_output(&node, DEST, &mut tags, None, SimTime::ZERO)
            .is_err()
    );

    // 邻居状态不影响没有预算的流量
    let mut plain = PacketTags::default();
    assert!(
        r.route_output(&node, DEST, &mut plain, None, SimTime::ZERO)
            .is_ok()
    );
}

#[test]
fn multicast_destinations_are_not_routed() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    let group = Ipv4Addr::new(224, 0, 0, 13);
    let mut tags = budget(5_000);
    assert_eq!(
        r.route_output(&node, group, &mut tags, None, SimTime::ZERO),
        Err(RoutingError::MulticastNotHandled(group))
    );
}

#[test]
fn route_input_checks_local_delivery_then_forwarding_flag() {
    let mut node = two_port_node();
    let mut r = GbrRouting::new(RoutingConfig::with_mode(RouteSelectMode::Dgr));
    r.add_host_route_to(DEST, GW2, 2, None, 1);

    let mut tags = budget(5_000);
    assert_eq!(
        r.route_input(&node, Ipv4Addr::new(10, 0, 0, 5), &mut tags, 1, SimTime::ZERO),
        InputVerdict::LocalDeliver { iif: 1 }
    );
    assert_eq!(
        r.route_input(&node, DEST, &mut tags, 1, SimTime::ZERO),
        InputVerdict::Error(RoutingError::ForwardingDisabled(1))
    );

    r.initialize(&mut node);
    assert!(matches!(
        r.route_input(&node, DEST, &mut tags, 1, SimTime::ZERO),
        InputVerdict::Forward(route) if route.out_if == 2
    ));
    assert_eq!(
        r.route_input(&node, Ipv4Addr::new(10, 7, 7, 7), &mut tags, 1, SimTime::ZERO),
        InputVerdict::NotHandled
    );
}

#[test]
fn initialize_skips_excluded_interfaces() {
    let mut node = two_port_node();
    let mut cfg = RoutingConfig::with_mode(RouteSelectMode::Dgr);
    cfg.interface_exclusions.insert(2);
    let mut r = GbrRouting::new(cfg);
    r.initialize(&mut node);

    assert!(r.is_initialized());
    assert_eq!(r.gossip_interfaces().collect::<Vec<_>>(), vec![1]);
    assert!(node.ifaces[1].forwarding);
    assert!(!node.ifaces[2].forwarding);
    assert!(!node.ifaces[0].forwarding, "loopback never forwards");
}

#[test]
fn build_updates_reports_every_up_interface_on_each_gossip_interface() {
    let (r, mut node) = routing(RouteSelectMode::Dgr);
    node.set_occupancy(2, 3);

    let updates = r.build_updates(&node);
    assert_eq!(updates.len(), 2);
    for u in &updates {
        let msg = GossipMessage::decode(&u.payload).expect("decode");
        assert_eq!(msg.command, Command::Response);
        assert_eq!(
            msg.nses,
            vec![
                Nse {
                    interface: 1,
                    state: 0
                },
                Nse {
                    interface: 2,
                    state: 3
                },
            ]
        );
    }
    assert_eq!(updates[0].out_if, 1);
    assert_eq!(updates[0].source, Ipv4Addr::new(10, 0, 0, 1));
}

fn response_from(sender: Ipv4Addr, recv_if: u32) -> GossipDatagram {
    GossipDatagram {
        sender,
        recv_if: Some(recv_if),
        ttl: Some(1),
        payload: GossipMessage::response(vec![Nse {
            interface: 1,
            state: 4,
        }])
        .encode()
        .expect("encode"),
    }
}

#[test]
fn receive_ignores_own_messages_and_excluded_interfaces() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    r.receive(&node, response_from(Ipv4Addr::new(10, 0, 0, 1), 1));
    assert!(r.nsdb().is_empty());

    let mut node = two_port_node();
    let mut cfg = RoutingConfig::with_mode(RouteSelectMode::Dgr);
    cfg.interface_exclusions.insert(1);
    let mut r = GbrRouting::new(cfg);
    r.initialize(&mut node);
    r.receive(&node, response_from(GW1, 1));
    assert!(r.nsdb().is_empty());

    r.receive(&node, response_from(GW2, 2));
    assert_eq!(r.nsdb().len(), 1);
    assert_eq!(r.nsdb().delay_ddr(2, 1), 8_000);
}

#[test]
fn receive_drops_undecodable_and_non_response_messages() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    let mut dgram = response_from(GW1, 1);
    dgram.payload = bytes::Bytes::from_static(&[2, 1, 0]);
    r.receive(&node, dgram);

    let mut dgram = response_from(GW1, 1);
    dgram.payload = GossipMessage {
        command: Command::Request,
        nses: Vec::new(),
    }
    .encode()
    .expect("encode");
    r.receive(&node, dgram);
    assert!(r.nsdb().is_empty());
}

#[test]
#[should_panic(expected = "no incoming interface")]
fn receive_without_incoming_interface_panics() {
    let (mut r, node) = routing(RouteSelectMode::Dgr);
    let mut dgram = response_from(GW1, 1);
    dgram.recv_if = None;
    r.receive(&node, dgram);
}

#[test]
fn interface_events_request_recompute_only_when_enabled_and_running() {
    let r = GbrRouting::new(RoutingConfig::default());
    assert!(!r.notify_interface_down(1, SimTime::from_millis(1)));

    let mut cfg = RoutingConfig::default();
    cfg.respond_to_interface_events = true;
    let r = GbrRouting::new(cfg);
    assert!(!r.notify_interface_up(1, SimTime::ZERO));
    assert!(r.notify_interface_down(1, SimTime::from_millis(1)));
    assert!(r.notify_add_address(1, GW1, SimTime::from_millis(1)));
    assert!(r.notify_remove_address(1, GW1, SimTime::from_millis(1)));
}

#[test]
fn route_table_helpers_and_printing() {
    let mut r = GbrRouting::new(RoutingConfig::default());
    r.add_host_route_to(DEST, GW1, 1, Some(2), 2);
    r.add_network_route_to(
        Ipv4Addr::new(10, 1, 0, 0),
        Ipv4Addr::new(255, 255, 0, 0),
        GW2,
        2,
    );
    r.add_external_route_to(
        Ipv4Addr::new(192, 168, 0, 0),
        Ipv4Addr::new(255, 255, 255, 0),
        GW2,
        2,
    );
    assert_eq!(r.n_routes(), 3);
    assert_eq!(r.assign_streams(7), 1);

    let out = r.print_routing_table("n0", SimTime::from_millis(1500));
    assert!(out.starts_with("Node: n0, Time: 1.500000s, GBR routing table"));
    assert!(out.contains("10.0.9.2"));
    assert!(out.contains("192.168.0.0"));

    let removed = r.remove_route(0).expect("host route");
    assert_eq!(removed.dest(), DEST);
    assert_eq!(r.n_routes(), 2);
    assert!(r.get_route(5).is_none());
}
