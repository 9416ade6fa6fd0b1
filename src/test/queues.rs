use std::net::Ipv4Addr;

use crate::net::{Packet, PacketTags, Payload};
use crate::queue::{
    CongestionQueue, CongestionSignal, DropTailQueue, PacketQueue, QueueConfig,
};

fn pkt(id: u64, size_bytes: u32, priority: bool) -> Packet {
    Packet {
        id,
        flow_id: 0,
        size_bytes,
        src: Ipv4Addr::new(10, 0, 0, 1),
        dst: Ipv4Addr::new(10, 0, 0, 2),
        ttl: 64,
        tags: PacketTags {
            priority,
            ..PacketTags::default()
        },
        payload: Payload::Data,
        hops_taken: 0,
    }
}

#[test]
fn droptail_queue_enforces_capacity_and_preserves_order() {
    let mut q = DropTailQueue::new(100);
    assert_eq!(q.capacity_bytes(), 100);
    assert!(q.is_empty());

    assert!(q.enqueue(pkt(1, 60, false)).is_ok());
    assert_eq!(q.headroom(), 40);

    let dropped = q.enqueue(pkt(2, 50, false)).expect_err("should drop");
    assert_eq!(dropped.id, 2);
    assert_eq!(q.len(), 1);
    assert_eq!(q.bytes(), 60);
    assert_eq!(q.peek().map(|p| p.id), Some(1));

    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.bytes(), 0);
    assert!(q.dequeue().is_none());
}

#[test]
fn droptail_queue_zero_sized_packets_do_not_consume_capacity() {
    let mut q = DropTailQueue::new(10);
    assert!(q.enqueue(pkt(1, 0, false)).is_ok());
    assert!(q.enqueue(pkt(2, 0, false)).is_ok());
    assert_eq!(q.len(), 2);
    assert_eq!(q.bytes(), 0);
    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 2);
}

#[test]
fn congestion_queue_serves_delay_sensitive_band_first() {
    let mut q = CongestionQueue::new(1_000, 1_000);
    assert!(q.enqueue(pkt(1, 100, false)).is_ok());
    assert!(q.enqueue(pkt(2, 100, true)).is_ok());
    assert!(q.enqueue(pkt(3, 100, false)).is_ok());
    assert!(q.enqueue(pkt(4, 100, true)).is_ok());
    assert_eq!(q.len(), 4);
    assert_eq!(q.bytes(), 400);
    assert_eq!(q.capacity_bytes(), 2_000);

    let order: Vec<u64> = std::iter::from_fn(|| q.dequeue()).map(|p| p.id).collect();
    assert_eq!(order, vec![2, 4, 1, 3]);
}

#[test]
fn congestion_queue_bands_drop_independently() {
    let mut q = CongestionQueue::new(100, 1_000);
    assert!(q.enqueue(pkt(1, 100, true)).is_ok());
    assert!(q.enqueue(pkt(2, 1, true)).is_err());
    assert!(q.enqueue(pkt(3, 500, false)).is_ok());
    assert_eq!(q.band(0).len(), 1);
    assert_eq!(q.band(1).len(), 1);
}

#[test]
fn occupancy_tracks_delay_sensitive_band_only() {
    let cfg = QueueConfig {
        delay_sensitive_bytes: 1_000,
        best_effort_bytes: 10_000,
    };
    let mut q = CongestionQueue::from_config(&cfg);
    assert_eq!(q.occupancy_ratio(), 0);
    assert_eq!(q.estimated_delay(), 0);

    assert!(q.enqueue(pkt(1, 5_000, false)).is_ok());
    assert_eq!(q.occupancy_ratio(), 0);

    assert!(q.enqueue(pkt(2, 250, true)).is_ok());
    assert_eq!(q.occupancy_ratio(), 2);
    assert_eq!(q.estimated_delay(), 4_000);

    assert!(q.enqueue(pkt(3, 750, true)).is_ok());
    assert_eq!(q.occupancy_ratio(), 10);
    assert_eq!(q.estimated_delay(), 20_000);

    let signal = q.congestion_signal().expect("congestion queue signals");
    assert_eq!(signal.occupancy_ratio(), 10);
}

#[test]
fn plain_droptail_has_no_congestion_signal() {
    let q = DropTailQueue::new(10);
    assert!(q.congestion_signal().is_none());
    assert!(CongestionQueue::new(0, 10).occupancy_ratio() == 0);
}
