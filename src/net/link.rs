//! 链路类型
//!
//! 定义单向链路及其传输时延计算。出方向的拥塞队列挂在链路上。

use super::id::NodeId;
use crate::queue::{CongestionQueue, PacketQueue, QueueConfig};
use crate::sim::SimTime;

/// 网络链路（单向）
#[derive(Debug)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    /// 发送端接口下标
    pub from_if: u32,
    /// 接收端接口下标
    pub to_if: u32,
    pub latency: SimTime,
    pub bandwidth_bps: u64,
    pub busy_until: SimTime,
    /// 是否有 packet 正在序列化
    pub busy: bool,
    pub queue: Box<dyn PacketQueue>,
}

impl Link {
    /// 创建新链路
    pub fn new(
        from: (NodeId, u32),
        to: (NodeId, u32),
        latency: SimTime,
        bandwidth_bps: u64,
        queue: &QueueConfig,
    ) -> Self {
        Self {
            from: from.0,
            to: to.0,
            from_if: from.1,
            to_if: to.1,
            latency,
            bandwidth_bps,
            busy_until: SimTime::ZERO,
            busy: false,
            queue: Box::new(CongestionQueue::from_config(queue)),
        }
    }

    /// 计算传输指定字节数所需的时间
    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        // ceil(bytes*8 / bps) 秒 -> 纳秒
        if self.bandwidth_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.bandwidth_bps as u128 - 1))
            / self.bandwidth_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}
