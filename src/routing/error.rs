//! 路由错误类型

use std::net::Ipv4Addr;

use thiserror::Error;

/// 选路返回给数据包层的错误
///
/// 被防环或预算过滤掉的候选不会单独报告，全部被过滤时才表现为 `NoRouteToHost`。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no route to host {0}")]
    NoRouteToHost(Ipv4Addr),

    #[error("multicast destination {0} is left to another routing protocol")]
    MulticastNotHandled(Ipv4Addr),

    #[error("no route to host: forwarding disabled on interface {0}")]
    ForwardingDisabled(u32),
}

/// gossip 报文解码错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("insufficient data: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("unsupported gossip version {0}")]
    UnsupportedVersion(u8),

    #[error("message too large: {count} entries (max: {max})")]
    TooManyEntries { count: usize, max: usize },
}
