//! 网络拓扑管理
//!
//! 定义网络拓扑结构，包含路由器、链路、数据包转发、路由表计算和统计信息。

use std::net::Ipv4Addr;

use bytes::Bytes;

use super::deliver_packet::DeliverPacket;
use super::gossip_timer::GossipTimer;
use super::id::{LinkId, NodeId};
use super::interface::Interface;
use super::link::Link;
use super::link_ready::LinkReady;
use super::packet::{DEFAULT_TTL, Packet, PacketTags, Payload};
use super::router::Router;
use super::stats::Stats;
use crate::queue::QueueConfig;
use crate::routing::{
    CandidateSet, GOSSIP_GROUP, GOSSIP_PORT, InterfaceAddress, LinkRecord, Lsa, RouteManager,
    RoutingConfig,
};
use crate::sim::{SimTime, Simulator};
use tracing::{debug, info, trace, warn};

const P2P_MASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 252);
const SUBNET_BASE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 0);
/// IPv4 + UDP 头
const GOSSIP_OVERHEAD_BYTES: u32 = 28;

/// 网络拓扑
#[derive(Debug, Default)]
pub struct Network {
    nodes: Vec<Option<Router>>,
    links: Vec<Link>,
    route_manager: RouteManager,
    routing_config: RoutingConfig,
    queue_config: QueueConfig,
    next_pkt_id: u64,
    next_subnet: u32,
    pub stats: Stats,
}

impl Network {
    pub fn new(
        routing_config: RoutingConfig,
        queue_config: QueueConfig,
        candidate_set: CandidateSet,
    ) -> Self {
        Self {
            route_manager: RouteManager::new(candidate_set),
            routing_config,
            queue_config,
            ..Self::default()
        }
    }

    pub fn routing_config(&self) -> &RoutingConfig {
        &self.routing_config
    }

    pub fn route_manager(&self) -> &RouteManager {
        &self.route_manager
    }

    /// 添加路由器节点；每个路由器的随机种子在全局种子上按节点编号偏移
    pub fn add_router(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut cfg = self.routing_config.clone();
        cfg.rng_seed = cfg.rng_seed.wrapping_add(id.0 as u64);
        self.nodes.push(Some(Router::new(id, name, cfg)));
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn router(&self, id: NodeId) -> &Router {
        self.nodes[id.0].as_ref().expect("node exists")
    }

    pub fn router_mut(&mut self, id: NodeId) -> &mut Router {
        self.nodes[id.0].as_mut().expect("node exists")
    }

    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.nodes.iter().flatten()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    /// 节点的第一个非 loopback 地址（流量的目的地址）
    pub fn addr_of(&self, id: NodeId) -> Option<Ipv4Addr> {
        self.router(id).primary_address()
    }

    /// 用一条全双工点到点链路连接两个节点，分配一个 /30 子网。
    /// 返回 (a->b, b->a) 两个方向的链路。
    pub fn connect(
        &mut self,
        a: NodeId,
        b: NodeId,
        latency: SimTime,
        bandwidth_bps: u64,
    ) -> (LinkId, LinkId) {
        let base = u32::from(SUBNET_BASE).wrapping_add(self.next_subnet.wrapping_mul(4));
        self.next_subnet += 1;
        let addr_a = InterfaceAddress::new(Ipv4Addr::from(base + 1), P2P_MASK);
        let addr_b = InterfaceAddress::new(Ipv4Addr::from(base + 2), P2P_MASK);

        let ab = LinkId(self.links.len());
        let ba = LinkId(self.links.len() + 1);
        let if_a = self.router_mut(a).add_interface(Interface::point_to_point(addr_a, ab));
        let if_b = self.router_mut(b).add_interface(Interface::point_to_point(addr_b, ba));

        self.links.push(Link::new(
            (a, if_a),
            (b, if_b),
            latency,
            bandwidth_bps,
            &self.queue_config,
        ));
        self.links.push(Link::new(
            (b, if_b),
            (a, if_a),
            latency,
            bandwidth_bps,
            &self.queue_config,
        ));
        debug!(%a, %b, addr_a = %addr_a.local, addr_b = %addr_b.local, "🔗 连接链路");
        (ab, ba)
    }

    /// 让路由器宣告一个外部网络
    pub fn add_external_route(&mut self, node: NodeId, network: Ipv4Addr, mask: Ipv4Addr) {
        self.router_mut(node).externals.push((network, mask));
    }

    // ---------------------------------------------------------------------
    // 路由计算
    // ---------------------------------------------------------------------

    /// 路由器的 LSA：每个 up 且对端也 up 的点到点接口贡献一条 p2p 记录和一条 stub 记录
    fn router_lsa(&self, r: &Router) -> Lsa {
        let mut links = Vec::new();
        for (i, iface) in r.ifaces.iter().enumerate() {
            if iface.loopback || !iface.up {
                continue;
            }
            let (Some(addr), Some(link)) = (iface.primary(), iface.link) else {
                continue;
            };
            let peer = self.links[link.0].to;
            let Some(peer_router) = self.nodes[peer.0].as_ref() else {
                continue;
            };
            links.push(LinkRecord::point_to_point(
                peer_router.router_id(),
                addr.local,
                i as u32,
            ));
            links.push(LinkRecord::stub(addr.network(), addr.mask, i as u32));
        }
        Lsa::router(r.router_id(), links)
    }

    fn collect_lsas(&self) -> Vec<Lsa> {
        let mut lsas = Vec::new();
        for r in self.routers() {
            lsas.push(self.router_lsa(r));
            for &(net, mask) in &r.externals {
                lsas.push(Lsa::external(net, mask, r.router_id()));
            }
        }
        lsas
    }

    /// 构建 LSDB 并为每个路由器安装路由
    #[tracing::instrument(skip(self))]
    pub fn populate_routing_tables(&mut self) {
        let lsas = self.collect_lsas();
        self.route_manager.build_database(lsas);
        self.route_manager.initialize_routes(
            self.nodes
                .iter_mut()
                .flatten()
                .map(|r| (r.id().router_id(), r.routing.table_mut())),
        );
        info!(routers = self.nodes.len(), "🧭 路由表计算完成");
    }

    /// 删除全部路由后重新计算
    pub fn recompute_routing_tables(&mut self) {
        self.route_manager
            .delete_routes(self.nodes.iter_mut().flatten().map(|r| r.routing.table_mut()));
        self.populate_routing_tables();
    }

    pub fn print_routing_tables(&self, now: SimTime) -> String {
        self.routers()
            .map(|r| r.print_routing_table(now))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ---------------------------------------------------------------------
    // 生命周期
    // ---------------------------------------------------------------------

    /// 初始化各路由器的协议实例并启动周期性 gossip
    pub fn start(&mut self, sim: &mut Simulator) {
        let links = &self.links;
        for r in self.nodes.iter_mut().flatten() {
            r.initialize(links);
            let at = sim.now().saturating_add(r.routing.config().sample_period());
            let id = sim.schedule(at, GossipTimer { node: r.id() });
            r.routing.set_gossip_timer(id);
        }
        info!(routers = self.nodes.len(), "▶️ 路由协议已启动");
    }

    /// 取消所有 gossip 定时器
    pub fn shutdown(&mut self, sim: &mut Simulator) {
        for r in self.nodes.iter_mut().flatten() {
            if let Some(id) = r.routing.take_gossip_timer() {
                sim.cancel(id);
            }
        }
        debug!("gossip 定时器已取消");
    }

    // ---------------------------------------------------------------------
    // 接口事件
    // ---------------------------------------------------------------------

    pub fn set_interface_up(&mut self, node: NodeId, iface: u32, up: bool, now: SimTime) {
        let r = self.router_mut(node);
        let Some(i) = r.ifaces.get_mut(iface as usize) else {
            warn!(%node, iface, "接口不存在");
            return;
        };
        i.up = up;
        let recompute = if up {
            r.routing.notify_interface_up(iface, now)
        } else {
            r.routing.notify_interface_down(iface, now)
        };
        if recompute {
            self.recompute_routing_tables();
        }
    }

    pub fn add_address(&mut self, node: NodeId, iface: u32, addr: InterfaceAddress, now: SimTime) {
        let r = self.router_mut(node);
        let Some(i) = r.ifaces.get_mut(iface as usize) else {
            warn!(%node, iface, "接口不存在");
            return;
        };
        i.addresses.push(addr);
        if r.routing.notify_add_address(iface, addr.local, now) {
            self.recompute_routing_tables();
        }
    }

    pub fn remove_address(&mut self, node: NodeId, iface: u32, addr: Ipv4Addr, now: SimTime) {
        let r = self.router_mut(node);
        let Some(i) = r.ifaces.get_mut(iface as usize) else {
            warn!(%node, iface, "接口不存在");
            return;
        };
        let before = i.addresses.len();
        i.addresses.retain(|a| a.local != addr);
        if i.addresses.len() == before {
            return;
        }
        if r.routing.notify_remove_address(iface, addr, now) {
            self.recompute_routing_tables();
        }
    }

    // ---------------------------------------------------------------------
    // 数据面
    // ---------------------------------------------------------------------

    /// 创建数据包
    pub fn make_packet(
        &mut self,
        flow_id: u64,
        size_bytes: u32,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        tags: PacketTags,
    ) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet {
            id,
            flow_id,
            size_bytes,
            src,
            dst,
            ttl: DEFAULT_TTL,
            tags,
            payload: Payload::Data,
            hops_taken: 0,
        }
    }

    pub(crate) fn make_gossip_packet(&mut self, src: Ipv4Addr, payload: Bytes) -> Packet {
        let size = payload.len() as u32 + GOSSIP_OVERHEAD_BYTES;
        let mut pkt = self.make_packet(0, size, src, GOSSIP_GROUP, PacketTags::default());
        pkt.ttl = 1;
        pkt.payload = Payload::Gossip {
            port: GOSSIP_PORT,
            payload,
        };
        pkt
    }

    /// 由节点本地发出
    pub fn send(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        let mut node = self.nodes[from.0].take().expect("node exists");
        node.send(pkt, sim, self);
        self.nodes[from.0] = Some(node);
    }

    /// 将数据包交付给节点处理
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id))]
    pub fn deliver(&mut self, to: NodeId, in_if: u32, pkt: Packet, sim: &mut Simulator) {
        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let mut node = self.nodes[to.0].take().expect("node exists");
        trace!(node_name = %node.name(), "取出节点");
        node.on_packet(in_if, pkt, sim, self);
        self.nodes[to.0] = Some(node);
    }

    pub(crate) fn on_gossip_timer(&mut self, node: NodeId, sim: &mut Simulator) {
        let mut r = self.nodes[node.0].take().expect("node exists");
        r.on_gossip_timer(sim, self);
        self.nodes[node.0] = Some(r);
    }

    /// 从节点的某个接口发出：入队，链路空闲时立即开始序列化
    ///
    /// 调用方此时已把路由器从 `nodes` 中取出，所以出接口状态由调用方传入。
    #[tracing::instrument(skip(self, iface, pkt, sim), fields(pkt_id = pkt.id))]
    pub(crate) fn transmit(
        &mut self,
        from: NodeId,
        out_if: u32,
        iface: Option<&Interface>,
        pkt: Packet,
        sim: &mut Simulator,
    ) {
        let Some(iface) = iface else {
            warn!("出接口不存在，丢弃");
            self.on_dropped_no_route(pkt);
            return;
        };
        if !iface.up {
            debug!("出接口 down，丢弃");
            self.stats.dropped_if_down += 1;
            return;
        }
        let Some(link_id) = iface.link else {
            debug!("出接口没有链路，丢弃");
            self.on_dropped_no_route(pkt);
            return;
        };

        let link = &mut self.links[link_id.0];
        if let Err(pkt) = link.queue.enqueue(pkt) {
            debug!(
                pkt_id = pkt.id,
                queued_bytes = link.queue.bytes(),
                "🗑️ 队列已满，丢弃"
            );
            self.stats.dropped_queue += 1;
            return;
        }
        trace!(?link_id, queued = link.queue.len(), "入队");
        if !link.busy {
            self.start_tx(link_id, sim);
        }
    }

    fn start_tx(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let link = &mut self.links[link_id.0];
        let Some(pkt) = link.queue.dequeue() else {
            link.busy = false;
            return;
        };
        let now = sim.now();
        let start = now.max(link.busy_until);
        let tx_time = link.tx_time(pkt.size_bytes);
        let depart = start.saturating_add(tx_time);
        let arrive = depart.saturating_add(link.latency);
        link.busy = true;
        link.busy_until = depart;

        trace!(
            ?link_id,
            ?start,
            ?tx_time,
            ?depart,
            ?arrive,
            "计算传输时间"
        );

        let (to, in_if) = (link.to, link.to_if);
        sim.schedule(depart, LinkReady { link_id });
        sim.schedule(arrive, DeliverPacket { to, in_if, pkt });
    }

    /// 链路完成一次序列化，继续发送队列中的下一个 packet
    pub fn on_link_ready(&mut self, link_id: LinkId, sim: &mut Simulator) {
        self.links[link_id.0].busy = false;
        self.start_tx(link_id, sim);
    }

    /// 数据包送达目的地时的处理
    #[tracing::instrument(skip(self, pkt), fields(pkt_id = pkt.id, flow_id = pkt.flow_id))]
    pub(crate) fn on_delivered(&mut self, at: NodeId, pkt: Packet, now: SimTime) {
        info!("✅ 数据包送达目的地");
        self.stats.record_delivery(&pkt, now);
        debug!(
            size_bytes = pkt.size_bytes,
            hops = pkt.hops_taken,
            delivered_pkts = self.stats.delivered_pkts,
            "更新统计信息"
        );
    }

    pub(crate) fn on_dropped_no_route(&mut self, pkt: Packet) {
        trace!(pkt_id = pkt.id, dst = %pkt.dst, "无路由丢弃");
        self.stats.dropped_no_route += 1;
    }
}
