//! 最短路树的构建，以及树到路由表的转换
//!
//! 每个计算根建一棵 `SpfTree`。顶点放在一个平坦的 arena 里，互相用下标引用，
//! 用完后整棵树一起释放。

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use tracing::{debug, trace};

use super::candidate::CandidateQueue;
use super::entry::RouteEntry;
use super::lsdb::{LinkKind, LinkRecord, Lsa, LsaKind, Lsdb};
use super::table::RouteTable;
use super::vertex::{RootExit, Vertex, VertexId, VertexKind};

#[derive(Debug)]
pub struct SpfTree {
    vertices: Vec<Vertex>,
    root: VertexId,
    index: HashMap<(VertexKind, Ipv4Addr), VertexId>,
    /// 按出队顺序排列的顶点（距离不减）
    order: Vec<VertexId>,
}

impl SpfTree {
    /// 从 `root` 开始探索；根没有 router LSA 时返回 `None`。
    /// `excluded` 是不能出现在树中的路由器（邻居为根的候选集使用）。
    pub fn calculate(lsdb: &Lsdb, root: Ipv4Addr, excluded: Option<Ipv4Addr>) -> Option<Self> {
        let root_lsa = lsdb.get_lsa(root)?;
        if root_lsa.kind != LsaKind::Router {
            return None;
        }

        let mut tree = SpfTree {
            vertices: Vec::new(),
            root: VertexId(0),
            index: HashMap::new(),
            order: Vec::new(),
        };
        let r = tree.add_vertex(root, VertexKind::Router);
        tree.vertices[r.0].distance = 0;
        tree.root = r;

        let mut candidates = CandidateQueue::new();
        candidates.push(&tree.vertices, r);

        while let Some(v) = candidates.pop() {
            tree.vertices[v.0].processed = true;
            let parents = tree.vertices[v.0].parents.clone();
            for p in parents {
                tree.vertices[p.0].add_child(v);
            }
            tree.order.push(v);
            trace!(
                vertex = %tree.vertices[v.0].id,
                distance = tree.vertices[v.0].distance,
                "vertex added to tree"
            );
            tree.spf_next(lsdb, v, excluded, &mut candidates);
        }

        debug!(%root, vertices = tree.order.len(), "SPF done");
        Some(tree)
    }

    fn add_vertex(&mut self, id: Ipv4Addr, kind: VertexKind) -> VertexId {
        let vid = VertexId(self.vertices.len());
        self.vertices.push(Vertex::new(id, kind, id));
        self.index.insert((kind, id), vid);
        vid
    }

    fn spf_next(
        &mut self,
        lsdb: &Lsdb,
        v: VertexId,
        excluded: Option<Ipv4Addr>,
        candidates: &mut CandidateQueue,
    ) {
        let is_root = v == self.root;
        let vx = &self.vertices[v.0];
        let Some(v_lsa) = lsdb.get_lsa(vx.lsa) else {
            return;
        };
        let v_dist = vx.distance;

        let mut discovered: Vec<(VertexKind, &Lsa, u32, Vec<RootExit>)> = Vec::new();
        match vx.kind {
            VertexKind::Router => {
                for l in &v_lsa.links {
                    let (kind, w_lsa) = match l.kind {
                        LinkKind::PointToPoint => {
                            let Some(w) = lsdb.get_lsa(l.link_id) else {
                                continue;
                            };
                            if w.kind != LsaKind::Router
                                || Some(w.link_state_id) == excluded
                                || w.links_to(LinkKind::PointToPoint, vx.id).next().is_none()
                            {
                                continue;
                            }
                            (VertexKind::Router, w)
                        }
                        LinkKind::TransitNetwork => {
                            let Some(w) = lsdb.get_lsa(l.link_id) else {
                                continue;
                            };
                            if w.kind != LsaKind::Network || !w.attached_routers.contains(&vx.id) {
                                continue;
                            }
                            (VertexKind::Network, w)
                        }
                        LinkKind::StubNetwork | LinkKind::VirtualLink => continue,
                    };
                    let exits = exits_toward(vx, is_root, Some(l), kind, w_lsa);
                    if !exits.is_empty() {
                        discovered.push((kind, w_lsa, l.metric, exits));
                    }
                }
            }
            VertexKind::Network => {
                for &rid in &v_lsa.attached_routers {
                    if Some(rid) == excluded {
                        continue;
                    }
                    let Some(w) = lsdb.get_lsa(rid) else {
                        continue;
                    };
                    if w.kind != LsaKind::Router
                        || w.links_to(LinkKind::TransitNetwork, vx.id).next().is_none()
                    {
                        continue;
                    }
                    let exits = exits_toward(vx, is_root, None, VertexKind::Router, w);
                    if !exits.is_empty() {
                        discovered.push((VertexKind::Router, w, 0, exits));
                    }
                }
            }
        }

        for (kind, w_lsa, cost, exits) in discovered {
            let dist = v_dist.saturating_add(cost);
            let id = w_lsa.link_state_id;
            if let Some(&w) = self.index.get(&(kind, id))
                && self.vertices[w.0].processed
            {
                continue;
            }
            match candidates.find(&self.vertices, id) {
                Some(w) => {
                    let wx = &mut self.vertices[w.0];
                    if dist < wx.distance {
                        wx.distance = dist;
                        wx.replace_exits(exits, v);
                        candidates.reorder(&self.vertices);
                    } else if dist == wx.distance {
                        wx.merge_exits(&exits);
                        wx.merge_parent(v);
                    }
                }
                None => {
                    let w = self.add_vertex(id, kind);
                    let wx = &mut self.vertices[w.0];
                    wx.distance = dist;
                    wx.replace_exits(exits, v);
                    candidates.push(&self.vertices, w);
                }
            }
        }
    }

    pub fn root(&self) -> &Vertex {
        &self.vertices[self.root.0]
    }

    /// 树中的顶点，按加入顺序
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.order.iter().map(|v| &self.vertices[v.0])
    }

    pub fn router(&self, id: Ipv4Addr) -> Option<&Vertex> {
        self.index
            .get(&(VertexKind::Router, id))
            .map(|v| &self.vertices[v.0])
            .filter(|v| v.processed)
    }

    /// 根到路由器 `id` 的跳数，不可达为 None
    pub fn distance_to(&self, id: Ipv4Addr) -> Option<u32> {
        self.router(id).map(|v| v.distance)
    }

    /// 把每个非根顶点转换成 `table` 中的路由条目
    pub fn install_routes(&self, lsdb: &Lsdb, table: &mut RouteTable) {
        let root = self.root();
        let mut seen_nets: HashSet<(Ipv4Addr, Ipv4Addr)> = lsdb
            .get_lsa(root.lsa)
            .map(|lsa| {
                lsa.links
                    .iter()
                    .filter(|l| l.kind == LinkKind::StubNetwork)
                    .map(|l| (l.link_id, l.link_data))
                    .collect()
            })
            .unwrap_or_default();

        for &v in self.order.iter().filter(|&&v| v != self.root) {
            let vx = &self.vertices[v.0];
            let Some(lsa) = lsdb.get_lsa(vx.lsa) else {
                continue;
            };
            match vx.kind {
                VertexKind::Router => {
                    for l in &lsa.links {
                        match l.kind {
                            LinkKind::PointToPoint | LinkKind::TransitNetwork => {
                                for e in &vx.exits {
                                    table.add_host_route(RouteEntry::host_route_to(
                                        l.link_data,
                                        e.next_hop,
                                        e.iface,
                                        e.next_iface,
                                        vx.distance,
                                    ));
                                }
                            }
                            LinkKind::StubNetwork => {
                                if !seen_nets.insert((l.link_id, l.link_data)) {
                                    continue;
                                }
                                for e in &vx.exits {
                                    table.add_network_route(RouteEntry::network_route_to(
                                        l.link_id,
                                        l.link_data,
                                        e.next_hop,
                                        e.iface,
                                        e.next_iface,
                                        vx.distance.saturating_add(l.metric),
                                    ));
                                }
                            }
                            LinkKind::VirtualLink => {}
                        }
                    }
                }
                VertexKind::Network => {
                    if vx.is_root_attached_network() {
                        continue;
                    }
                    let mask = lsa.network_mask;
                    let net = Ipv4Addr::from(u32::from(vx.id) & u32::from(mask));
                    if !seen_nets.insert((net, mask)) {
                        continue;
                    }
                    for e in &vx.exits {
                        table.add_network_route(RouteEntry::network_route_to(
                            net,
                            mask,
                            e.next_hop,
                            e.iface,
                            e.next_iface,
                            vx.distance,
                        ));
                    }
                }
            }
        }

        for ext in lsdb.externals() {
            let Some(vx) = self.router(ext.advertising_router) else {
                continue;
            };
            if vx.id == root.id {
                continue;
            }
            for e in &vx.exits {
                table.add_external_route(RouteEntry::network_route_to(
                    ext.link_state_id,
                    ext.network_mask,
                    e.next_hop,
                    e.iface,
                    e.next_iface,
                    vx.distance,
                ));
            }
        }
    }
}

/// 从 `v` 到达 `w` 时 `w` 的出口方向
fn exits_toward(
    v: &Vertex,
    v_is_root: bool,
    link: Option<&LinkRecord>,
    w_kind: VertexKind,
    w_lsa: &Lsa,
) -> Vec<RootExit> {
    if v_is_root {
        let Some(l) = link else {
            return Vec::new();
        };
        return match w_kind {
            VertexKind::Router => w_lsa
                .links_to(LinkKind::PointToPoint, v.id)
                .next()
                .map(|back| vec![RootExit::new(back.link_data, l.local_if)])
                .unwrap_or_default(),
            VertexKind::Network => vec![RootExit::new(Ipv4Addr::UNSPECIFIED, l.local_if)],
        };
    }
    if v.is_root_attached_network() {
        let Some(back) = w_lsa.links_to(LinkKind::TransitNetwork, v.id).next() else {
            return Vec::new();
        };
        return v
            .exits
            .iter()
            .map(|e| RootExit::new(back.link_data, e.iface))
            .collect();
    }
    if v.is_first_hop_router()
        && let Some(l) = link
    {
        return v
            .exits
            .iter()
            .map(|e| RootExit {
                next_iface: Some(l.local_if),
                ..*e
            })
            .collect();
    }
    v.exits.clone()
}

/// 只有一条 stub 链路的根无处可探索，直接给它一条走该接口的默认路由
pub fn check_for_stub_node(lsdb: &Lsdb, root: Ipv4Addr) -> Option<RouteEntry> {
    let lsa = lsdb.get_lsa(root)?;
    match lsa.links.as_slice() {
        [only] if only.kind == LinkKind::StubNetwork => Some(RouteEntry::default_route(
            Ipv4Addr::UNSPECIFIED,
            only.local_if,
        )),
        _ => None,
    }
}
