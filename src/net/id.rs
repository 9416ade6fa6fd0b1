//! 标识符类型
//!
//! 定义节点和链路的唯一标识符。

use std::fmt;
use std::net::Ipv4Addr;

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// 路由器 ID（LSA 中使用）：0.0.0.(id + 1)，避免与 0.0.0.0 冲突
    pub fn router_id(self) -> Ipv4Addr {
        Ipv4Addr::from(self.0 as u32 + 1)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// 链路标识符（单向）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);
