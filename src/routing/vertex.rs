//! SPF 顶点
//!
//! 一次计算的整棵树存放在 `Vec<Vertex>` 里，父子关系用下标表示，计算结束后整体丢弃。

use std::net::Ipv4Addr;

use super::entry::DIST_INFINITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Router,
    Network,
}

impl VertexKind {
    /// 候选队列中等距时 network 先出队
    pub(crate) fn rank(self) -> u8 {
        match self {
            VertexKind::Network => 0,
            VertexKind::Router => 1,
        }
    }
}

/// 从根出发的一个方向：网关、根的出接口、以及（若已知）第一跳节点的出接口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootExit {
    pub next_hop: Ipv4Addr,
    pub iface: u32,
    pub next_iface: Option<u32>,
}

impl RootExit {
    pub fn new(next_hop: Ipv4Addr, iface: u32) -> Self {
        Self {
            next_hop,
            iface,
            next_iface: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: Ipv4Addr,
    pub kind: VertexKind,
    pub distance: u32,
    /// 对应 LSA 在 LSDB 中的键
    pub lsa: Ipv4Addr,
    pub parents: Vec<VertexId>,
    pub children: Vec<VertexId>,
    pub exits: Vec<RootExit>,
    pub processed: bool,
}

impl Vertex {
    pub fn new(id: Ipv4Addr, kind: VertexKind, lsa: Ipv4Addr) -> Self {
        Self {
            id,
            kind,
            distance: DIST_INFINITY,
            lsa,
            parents: Vec::new(),
            children: Vec::new(),
            exits: Vec::new(),
            processed: false,
        }
    }

    /// 合并等价路径的出口方向（去重，保持先到先得的顺序）
    pub fn merge_exits(&mut self, exits: &[RootExit]) {
        for e in exits {
            if !self.exits.contains(e) {
                self.exits.push(*e);
            }
        }
    }

    /// 严格更短的路径：丢弃旧的出口和父节点
    pub fn replace_exits(&mut self, exits: Vec<RootExit>, parent: VertexId) {
        self.exits = exits;
        self.parents.clear();
        self.parents.push(parent);
    }

    pub fn merge_parent(&mut self, parent: VertexId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub fn add_child(&mut self, child: VertexId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// 根直连的网络：出口没有网关
    pub(crate) fn is_root_attached_network(&self) -> bool {
        self.kind == VertexKind::Network
            && !self.exits.is_empty()
            && self.exits.iter().all(|e| e.next_hop == Ipv4Addr::UNSPECIFIED)
    }

    /// 第一跳路由器：出口里还没有记录它自己的出接口
    pub(crate) fn is_first_hop_router(&self) -> bool {
        self.kind == VertexKind::Router
            && !self.exits.is_empty()
            && self.exits.iter().all(|e| e.next_iface.is_none())
    }
}
