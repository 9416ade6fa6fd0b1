//! 双 band 拥塞信号队列
//!
//! 带优先级标签的时延敏感包进入 band 0，总是先于 band 1 的尽力而为流量出队。
//! 每个 band 是一个有独立字节容量的 DropTail FIFO。band 0 的占用率即拥塞信号：
//! 量化为 0..=10，并线性映射为估计时延。

use crate::net::Packet;

use super::{CongestionSignal, DropTailQueue, PacketQueue, QueueConfig};

/// 每个占用等级对应的估计时延（微秒）
pub const DELAY_PER_OCCUPANCY_US: u32 = 2_000;

#[derive(Debug)]
pub struct CongestionQueue {
    bands: [DropTailQueue; 2],
}

impl CongestionQueue {
    pub fn new(delay_sensitive_bytes: u64, best_effort_bytes: u64) -> Self {
        Self {
            bands: [
                DropTailQueue::new(delay_sensitive_bytes),
                DropTailQueue::new(best_effort_bytes),
            ],
        }
    }

    pub fn from_config(cfg: &QueueConfig) -> Self {
        Self::new(cfg.delay_sensitive_bytes, cfg.best_effort_bytes)
    }

    fn classify(pkt: &Packet) -> usize {
        if pkt.tags.priority { 0 } else { 1 }
    }

    pub fn band(&self, idx: usize) -> &DropTailQueue {
        &self.bands[idx]
    }
}

impl PacketQueue for CongestionQueue {
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        let band = Self::classify(&pkt);
        self.bands[band].enqueue(pkt)
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let [hi, lo] = &mut self.bands;
        hi.dequeue().or_else(|| lo.dequeue())
    }

    fn len(&self) -> usize {
        self.bands[0].len().saturating_add(self.bands[1].len())
    }

    fn bytes(&self) -> u64 {
        self.bands[0].bytes().saturating_add(self.bands[1].bytes())
    }

    fn capacity_bytes(&self) -> u64 {
        self.bands[0]
            .capacity_bytes()
            .saturating_add(self.bands[1].capacity_bytes())
    }

    fn congestion_signal(&self) -> Option<&dyn CongestionSignal> {
        Some(self)
    }
}

impl CongestionSignal for CongestionQueue {
    fn occupancy_ratio(&self) -> u8 {
        let band = &self.bands[0];
        let cap = band.capacity_bytes();
        if cap == 0 {
            return 0;
        }
        let ratio = band.bytes().saturating_mul(10) / cap;
        ratio.min(10) as u8
    }

    fn estimated_delay(&self) -> u32 {
        u32::from(self.occupancy_ratio()) * DELAY_PER_OCCUPANCY_US
    }
}
