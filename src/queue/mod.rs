//! 队列策略（Queue disciplines）
//!
//! DropTail（尾丢弃）是最基础的单 FIFO 队列；`CongestionQueue` 在其之上
//! 组合出两个优先级 band，并通过 [`CongestionSignal`] 对外暴露基于占用率的时延估计，
//! 供路由决策与邻居 gossip 使用。

use serde::{Deserialize, Serialize};

use crate::net::Packet;

mod congestion;
mod drop_tail;

pub use congestion::{CongestionQueue, DELAY_PER_OCCUPANCY_US};
pub use drop_tail::DropTailQueue;

/// Packet 队列抽象
pub trait PacketQueue: std::fmt::Debug {
    /// 入队：成功返回 Ok；若被丢弃则返回 Err(pkt)
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet>;
    /// 出队：按队列策略返回下一个 packet
    fn dequeue(&mut self) -> Option<Packet>;

    fn len(&self) -> usize;
    fn bytes(&self) -> u64;
    fn capacity_bytes(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 拥塞信号能力：只有能给出时延估计的队列才返回 Some
    fn congestion_signal(&self) -> Option<&dyn CongestionSignal> {
        None
    }
}

/// 拥塞信号：把队列占用转换为离散等级和估计时延。
pub trait CongestionSignal {
    /// 占用率等级 0..=10
    fn occupancy_ratio(&self) -> u8;
    /// 估计排队时延（微秒）
    fn estimated_delay(&self) -> u32;
}

/// 每个接口出口队列的容量配置（bytes）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// band 0：时延敏感流量
    pub delay_sensitive_bytes: u64,
    /// band 1：尽力而为流量
    pub best_effort_bytes: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            delay_sensitive_bytes: 250_000,
            best_effort_bytes: 2_500_000,
        }
    }
}
