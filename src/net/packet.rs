//! 数据包类型
//!
//! packet 按目的 IPv4 地址逐跳选路；路由协议只读写 `tags`。

use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::sim::SimTime;

pub const DEFAULT_TTL: u8 = 64;

/// 随 packet 携带的标签；源端设置，路由协议消费
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketTags {
    /// 端到端时延预算（微秒），源端设置一次
    pub budget_us: Option<u32>,
    /// 发出时刻
    pub timestamp: Option<SimTime>,
    /// 已选路径的剩余跳数，仅用于防环
    pub distance: Option<u32>,
    /// 时延敏感：进入拥塞队列的 band 0
    pub priority: bool,
}

impl PacketTags {
    pub fn with_budget(budget_us: u32, timestamp: SimTime) -> Self {
        Self {
            budget_us: Some(budget_us),
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Data,
    /// 邻居状态 gossip（已编码），发往 `port`
    Gossip { port: u16, payload: Bytes },
}

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub flow_id: u64,
    pub size_bytes: u32,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub ttl: u8,
    pub tags: PacketTags,
    pub payload: Payload,
    /// 已经过的跳数（统计用）
    pub hops_taken: u32,
}

impl Packet {
    pub fn is_gossip(&self) -> bool {
        matches!(self.payload, Payload::Gossip { .. })
    }

    /// 从发出到 `now` 经过的时间；没有时间戳时为 None
    pub fn age(&self, now: SimTime) -> Option<SimTime> {
        self.tags.timestamp.map(|t| now.saturating_sub(t))
    }
}
