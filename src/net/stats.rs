//! 统计信息
//!
//! 定义网络仿真统计数据结构。

use serde::Serialize;

use super::packet::Packet;
use crate::sim::SimTime;

/// 网络统计信息
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    /// 携带预算且在预算内送达
    pub within_budget: u64,
    /// 携带预算但超时送达
    pub budget_missed: u64,
    pub latency_sum_us: u64,
    pub latency_max_us: u64,
    pub dropped_queue: u64,
    pub dropped_no_route: u64,
    pub dropped_ttl: u64,
    pub dropped_if_down: u64,
    pub gossip_sent: u64,
    pub gossip_received: u64,
}

impl Stats {
    pub(crate) fn record_delivery(&mut self, pkt: &Packet, now: SimTime) {
        self.delivered_pkts += 1;
        self.delivered_bytes += pkt.size_bytes as u64;
        let Some(age) = pkt.age(now) else {
            return;
        };
        let latency_us = age.as_micros();
        self.latency_sum_us += latency_us;
        self.latency_max_us = self.latency_max_us.max(latency_us);
        if let Some(budget) = pkt.tags.budget_us {
            if latency_us <= u64::from(budget) {
                self.within_budget += 1;
            } else {
                self.budget_missed += 1;
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_queue + self.dropped_no_route + self.dropped_ttl + self.dropped_if_down
    }

    /// 平均时延（微秒）；没有送达时为 0
    pub fn mean_latency_us(&self) -> f64 {
        if self.delivered_pkts == 0 {
            return 0.0;
        }
        self.latency_sum_us as f64 / self.delivered_pkts as f64
    }
}
