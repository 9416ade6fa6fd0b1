use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::net::{NetWorld, NodeId, PacketTags, Payload};
use crate::routing::{GOSSIP_GROUP, GOSSIP_PORT};
use crate::sim::SimTime;

#[test]
fn packet_ids_are_unique_and_ttl_starts_at_default() {
    let mut world = NetWorld::default();
    let dst = Ipv4Addr::new(10, 0, 0, 2);
    let a = world
        .net
        .make_packet(7, 1000, Ipv4Addr::UNSPECIFIED, dst, PacketTags::default());
    let b = world
        .net
        .make_packet(7, 1000, Ipv4Addr::UNSPECIFIED, dst, PacketTags::default());
    assert_ne!(a.id, b.id);
    assert_eq!(a.ttl, crate::net::DEFAULT_TTL);
    assert!(!a.is_gossip());
    assert_eq!(a.age(SimTime::from_millis(1)), None);
}

#[test]
fn packet_age_counts_from_origin_timestamp() {
    let mut world = NetWorld::default();
    let tags = PacketTags::with_budget(5_000, SimTime::from_micros(300));
    let pkt = world.net.make_packet(
        1,
        100,
        Ipv4Addr::UNSPECIFIED,
        Ipv4Addr::new(10, 0, 0, 2),
        tags,
    );
    assert_eq!(pkt.tags.budget_us, Some(5_000));
    assert_eq!(pkt.tags.distance, None);
    assert_eq!(pkt.age(SimTime::from_micros(1_300)), Some(SimTime::from_millis(1)));
}

#[test]
fn router_ids_never_collide_with_unspecified() {
    assert_eq!(NodeId(0).router_id(), Ipv4Addr::new(0, 0, 0, 1));
    assert_eq!(NodeId(255).router_id(), Ipv4Addr::new(0, 0, 1, 0));
    assert_eq!(NodeId(3).to_string(), "n3");
}

#[test]
fn gossip_packets_go_to_the_well_known_endpoint_one_hop_away() {
    let mut world = NetWorld::default();
    let payload = Bytes::from_static(&[2, 1, 0, 0]);
    let pkt = world
        .net
        .make_gossip_packet(Ipv4Addr::new(10, 0, 0, 1), payload.clone());
    assert!(pkt.is_gossip());
    assert_eq!(pkt.dst, GOSSIP_GROUP);
    assert_eq!(pkt.ttl, 1);
    assert_eq!(pkt.size_bytes, 4 + 28);
    assert_eq!(
        pkt.payload,
        Payload::Gossip {
            port: GOSSIP_PORT,
            payload
        }
    );
}
