//! 链路状态数据库（LSDB）
//!
//! router / network LSA 以 link-state id 为键，external LSA 单独放一个列表。
//! 每次全量重算都会清空重建。

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// `link_id` = 邻居 router id，`link_data` = 本地接口地址
    PointToPoint,
    /// `link_id` = network LSA id，`link_data` = 本地接口地址
    TransitNetwork,
    /// `link_id` = 网络地址，`link_data` = 掩码
    StubNetwork,
    VirtualLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub kind: LinkKind,
    pub link_id: Ipv4Addr,
    pub link_data: Ipv4Addr,
    /// 宣告路由器上的接口编号
    pub local_if: u32,
    pub metric: u32,
}

impl LinkRecord {
    pub fn point_to_point(neighbor: Ipv4Addr, local: Ipv4Addr, local_if: u32) -> Self {
        Self {
            kind: LinkKind::PointToPoint,
            link_id: neighbor,
            link_data: local,
            local_if,
            metric: 1,
        }
    }

    pub fn transit(network_lsa: Ipv4Addr, local: Ipv4Addr, local_if: u32) -> Self {
        Self {
            kind: LinkKind::TransitNetwork,
            link_id: network_lsa,
            link_data: local,
            local_if,
            metric: 1,
        }
    }

    pub fn stub(network: Ipv4Addr, mask: Ipv4Addr, local_if: u32) -> Self {
        Self {
            kind: LinkKind::StubNetwork,
            link_id: Ipv4Addr::from(u32::from(network) & u32::from(mask)),
            link_data: mask,
            local_if,
            metric: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LsaKind {
    Router,
    Network,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lsa {
    pub kind: LsaKind,
    pub link_state_id: Ipv4Addr,
    pub advertising_router: Ipv4Addr,
    pub links: Vec<LinkRecord>,
    /// 仅 network / external LSA 使用
    pub network_mask: Ipv4Addr,
    /// 仅 network LSA 使用
    pub attached_routers: Vec<Ipv4Addr>,
}

impl Lsa {
    pub fn router(router_id: Ipv4Addr, links: Vec<LinkRecord>) -> Self {
        Self {
            kind: LsaKind::Router,
            link_state_id: router_id,
            advertising_router: router_id,
            links,
            network_mask: Ipv4Addr::UNSPECIFIED,
            attached_routers: Vec::new(),
        }
    }

    /// `id` 是该网络上 DR 的接口地址
    pub fn network(
        id: Ipv4Addr,
        advertising_router: Ipv4Addr,
        mask: Ipv4Addr,
        attached_routers: Vec<Ipv4Addr>,
    ) -> Self {
        Self {
            kind: LsaKind::Network,
            link_state_id: id,
            advertising_router,
            links: Vec::new(),
            network_mask: mask,
            attached_routers,
        }
    }

    pub fn external(network: Ipv4Addr, mask: Ipv4Addr, advertising_router: Ipv4Addr) -> Self {
        Self {
            kind: LsaKind::External,
            link_state_id: Ipv4Addr::from(u32::from(network) & u32::from(mask)),
            advertising_router,
            links: Vec::new(),
            network_mask: mask,
            attached_routers: Vec::new(),
        }
    }

    /// 指向 `id` 的指定类型链路
    pub fn links_to(&self, kind: LinkKind, id: Ipv4Addr) -> impl Iterator<Item = &LinkRecord> {
        self.links
            .iter()
            .filter(move |l| l.kind == kind && l.link_id == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lsdb {
    database: BTreeMap<Ipv4Addr, Lsa>,
    external: Vec<Lsa>,
}

impl Lsdb {
    pub fn new() -> Self {
        Self::default()
    }

    /// router / network LSA 进键表，external LSA 进单独列表
    pub fn insert(&mut self, lsa: Lsa) {
        match lsa.kind {
            LsaKind::External => self.external.push(lsa),
            _ => {
                self.database.insert(lsa.link_state_id, lsa);
            }
        }
    }

    pub fn get_lsa(&self, id: Ipv4Addr) -> Option<&Lsa> {
        self.database.get(&id)
    }

    /// 拥有接口地址 `addr` 的 router LSA
    pub fn get_lsa_by_link_data(&self, addr: Ipv4Addr) -> Option<&Lsa> {
        self.database.values().find(|lsa| {
            lsa.kind == LsaKind::Router
                && lsa.links.iter().any(|l| {
                    matches!(l.kind, LinkKind::PointToPoint | LinkKind::TransitNetwork)
                        && l.link_data == addr
                })
        })
    }

    pub fn n_external(&self) -> usize {
        self.external.len()
    }

    pub fn external(&self, i: usize) -> Option<&Lsa> {
        self.external.get(i)
    }

    pub fn externals(&self) -> &[Lsa] {
        &self.external
    }

    pub fn len(&self) -> usize {
        self.database.len()
    }

    pub fn is_empty(&self) -> bool {
        self.database.is_empty() && self.external.is_empty()
    }

    pub fn clear(&mut self) {
        self.database.clear();
        self.external.clear();
    }
}
