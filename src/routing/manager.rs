//! 路由管理器
//!
//! 收集所有路由器的 LSA 构建 LSDB，然后以每个路由器为根计算 SPF，
//! 把结果写入该路由器自己的路由表。由 `Network` 持有，不存在全局单例。

use std::net::Ipv4Addr;

use tracing::{debug, info, trace};

use super::config::CandidateSet;
use super::entry::RouteEntry;
use super::lsdb::{LinkKind, Lsa, Lsdb};
use super::spf::{SpfTree, check_for_stub_node};
use super::table::RouteTable;

#[derive(Debug, Default)]
pub struct RouteManager {
    lsdb: Lsdb,
    candidate_set: CandidateSet,
}

impl RouteManager {
    pub fn new(candidate_set: CandidateSet) -> Self {
        Self {
            lsdb: Lsdb::new(),
            candidate_set,
        }
    }

    pub fn candidate_set(&self) -> CandidateSet {
        self.candidate_set
    }

    pub fn lsdb(&self) -> &Lsdb {
        &self.lsdb
    }

    /// 清空并重建 LSDB
    pub fn build_database(&mut self, lsas: impl IntoIterator<Item = Lsa>) {
        self.lsdb.clear();
        for lsa in lsas {
            trace!(id = %lsa.link_state_id, kind = ?lsa.kind, links = lsa.links.len(), "插入 LSA");
            self.lsdb.insert(lsa);
        }
        info!(
            lsas = self.lsdb.len(),
            externals = self.lsdb.n_external(),
            "🗺️ LSDB 构建完成"
        );
    }

    pub fn delete_routes<'a>(&self, tables: impl IntoIterator<Item = &'a mut RouteTable>) {
        let mut n = 0usize;
        for t in tables {
            n += t.n_routes();
            t.clear();
        }
        debug!(removed = n, "删除全部路由");
    }

    /// 依次以每个路由器为根计算路由并安装
    pub fn initialize_routes<'a>(
        &self,
        roots: impl IntoIterator<Item = (Ipv4Addr, &'a mut RouteTable)>,
    ) {
        for (root, table) in roots {
            table.clear();
            self.install(root, table);
            debug!(%root, routes = table.n_routes(), "路由表已安装");
        }
    }

    pub fn routes_for(&self, root: Ipv4Addr) -> RouteTable {
        let mut table = RouteTable::new();
        self.install(root, &mut table);
        table
    }

    /// 单根 SPF（调试 / 测试用）
    pub fn calculate(&self, root: Ipv4Addr) -> Option<SpfTree> {
        SpfTree::calculate(&self.lsdb, root, None)
    }

    fn install(&self, root: Ipv4Addr, table: &mut RouteTable) {
        if let Some(default) = check_for_stub_node(&self.lsdb, root) {
            debug!(%root, "stub 节点，仅安装默认路由");
            table.add_network_route(default);
            return;
        }
        match self.candidate_set {
            CandidateSet::Shortest => {
                if let Some(tree) = SpfTree::calculate(&self.lsdb, root, None) {
                    tree.install_routes(&self.lsdb, table);
                }
            }
            CandidateSet::NeighborRooted => self.install_neighbor_rooted(root, table),
        }
    }

    /// 对根的每条点到点链路，以对端邻居为根（去掉本节点）计算 SPF，
    /// 得到经由该邻居的全部候选；距离 = 1 + 邻居到目的的跳数。
    fn install_neighbor_rooted(&self, root: Ipv4Addr, table: &mut RouteTable) {
        let Some(root_lsa) = self.lsdb.get_lsa(root) else {
            return;
        };
        for l in root_lsa
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::PointToPoint)
        {
            let Some(n_lsa) = self.lsdb.get_lsa(l.link_id) else {
                continue;
            };
            let Some(back) = n_lsa.links_to(LinkKind::PointToPoint, root).next() else {
                continue;
            };
            let gw = back.link_data;

            for nl in n_lsa
                .links
                .iter()
                .filter(|nl| matches!(nl.kind, LinkKind::PointToPoint | LinkKind::TransitNetwork))
            {
                table.add_host_route(RouteEntry::host_route_to(
                    nl.link_data,
                    gw,
                    l.local_if,
                    None,
                    l.metric,
                ));
            }

            let Some(tree) = SpfTree::calculate(&self.lsdb, l.link_id, Some(root)) else {
                continue;
            };
            let mut via = RouteTable::new();
            tree.install_routes(&self.lsdb, &mut via);
            let shift = |e: &RouteEntry| {
                if e.is_host() {
                    RouteEntry::host_route_to(
                        e.dest(),
                        gw,
                        l.local_if,
                        Some(e.interface()),
                        e.distance().saturating_add(l.metric),
                    )
                } else {
                    RouteEntry::network_route_to(
                        e.dest(),
                        e.mask(),
                        gw,
                        l.local_if,
                        Some(e.interface()),
                        e.distance().saturating_add(l.metric),
                    )
                }
            };
            for e in via.host_routes() {
                table.add_host_route(shift(e));
            }
            for e in via.network_routes() {
                table.add_network_route(shift(e));
            }
            for e in via.external_routes() {
                table.add_external_route(shift(e));
            }
            trace!(%root, neighbor = %l.link_id, routes = via.n_routes(), "邻居为根的候选已合并");
        }
    }
}
