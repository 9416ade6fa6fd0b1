//! 路由器节点
//!
//! 每个路由器持有自己的接口列表和一个 `GbrRouting` 实例。处理 packet 时，
//! `Network` 先把路由器取出来（避免 &mut self 与 &mut node 的重叠借用），
//! 路由器再通过 `NodeView` 把接口和出口队列暴露给路由协议。

use std::net::Ipv4Addr;

use tracing::{debug, info, trace, warn};

use super::gossip_timer::GossipTimer;
use super::id::NodeId;
use super::interface::Interface;
use super::link::Link;
use super::network::Network;
use super::packet::{Packet, Payload};
use crate::queue::CongestionSignal;
use crate::routing::{
    GOSSIP_GROUP, GOSSIP_PORT, GbrRouting, GossipDatagram, InputVerdict, InterfaceAddress,
    NodeContext, RoutingConfig,
};
use crate::sim::Simulator;

/// 路由协议看到的节点视图
pub struct NodeView<'a> {
    pub ifaces: &'a mut [Interface],
    pub links: &'a [Link],
}

impl NodeContext for NodeView<'_> {
    fn n_interfaces(&self) -> u32 {
        self.ifaces.len() as u32
    }

    fn is_up(&self, iface: u32) -> bool {
        self.ifaces.get(iface as usize).is_some_and(|i| i.up)
    }

    fn is_forwarding(&self, iface: u32) -> bool {
        self.ifaces.get(iface as usize).is_some_and(|i| i.forwarding)
    }

    fn set_forwarding(&mut self, iface: u32, enabled: bool) {
        if let Some(i) = self.ifaces.get_mut(iface as usize) {
            i.forwarding = enabled;
        }
    }

    fn is_loopback(&self, iface: u32) -> bool {
        self.ifaces.get(iface as usize).is_some_and(|i| i.loopback)
    }

    fn mtu(&self, iface: u32) -> u16 {
        self.ifaces.get(iface as usize).map(|i| i.mtu).unwrap_or(0)
    }

    fn addresses(&self, iface: u32) -> Vec<InterfaceAddress> {
        self.ifaces
            .get(iface as usize)
            .map(|i| i.addresses.clone())
            .unwrap_or_default()
    }

    fn congestion(&self, iface: u32) -> Option<&dyn CongestionSignal> {
        let link = self.ifaces.get(iface as usize)?.link?;
        self.links.get(link.0)?.queue.congestion_signal()
    }
}

#[derive(Debug)]
pub struct Router {
    id: NodeId,
    name: String,
    pub(crate) ifaces: Vec<Interface>,
    pub(crate) routing: GbrRouting,
    /// 本路由器向外宣告的外部网络 (network, mask)
    pub(crate) externals: Vec<(Ipv4Addr, Ipv4Addr)>,
}

impl Router {
    pub fn new(id: NodeId, name: impl Into<String>, config: RoutingConfig) -> Self {
        Self {
            id,
            name: name.into(),
            ifaces: vec![Interface::loopback()],
            routing: GbrRouting::new(config),
            externals: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn router_id(&self) -> Ipv4Addr {
        self.id.router_id()
    }

    pub fn routing(&self) -> &GbrRouting {
        &self.routing
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.ifaces
    }

    pub fn interface(&self, i: u32) -> Option<&Interface> {
        self.ifaces.get(i as usize)
    }

    /// 第一个非 loopback 地址
    pub fn primary_address(&self) -> Option<Ipv4Addr> {
        self.ifaces
            .iter()
            .filter(|i| !i.loopback)
            .find_map(|i| i.primary())
            .map(|a| a.local)
    }

    pub fn owns_address(&self, addr: Ipv4Addr) -> bool {
        self.ifaces
            .iter()
            .any(|i| i.addresses.iter().any(|a| a.local == addr))
    }

    pub(crate) fn add_interface(&mut self, iface: Interface) -> u32 {
        self.ifaces.push(iface);
        (self.ifaces.len() - 1) as u32
    }

    pub(crate) fn initialize(&mut self, links: &[Link]) {
        let mut view = NodeView {
            ifaces: &mut self.ifaces,
            links,
        };
        self.routing.initialize(&mut view);
    }

    /// 本地发出一个 packet
    #[tracing::instrument(skip(self, sim, net), fields(node = %self.name, pkt_id = pkt.id, dst = %pkt.dst))]
    pub fn send(&mut self, mut pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        let now = sim.now();
        let view = NodeView {
            ifaces: &mut self.ifaces,
            links: net.links(),
        };
        match self
            .routing
            .route_output(&view, pkt.dst, &mut pkt.tags, None, now)
        {
            Ok(route) => {
                if pkt.src.is_unspecified() {
                    pkt.src = route.source;
                }
                debug!(out_if = route.out_if, gateway = %route.gateway, distance = ?pkt.tags.distance, "🚀 发出数据包");
                net.transmit(self.id, route.out_if, self.interface(route.out_if), pkt, sim);
            }
            Err(e) => {
                info!(error = %e, "❌ 无路由，丢弃");
                net.on_dropped_no_route(pkt);
            }
        }
    }

    /// 处理到达的数据包
    #[tracing::instrument(skip(self, sim, net), fields(node = %self.name, pkt_id = pkt.id))]
    pub fn on_packet(&mut self, in_if: u32, mut pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        let now = sim.now();
        pkt.hops_taken += 1;

        if let Payload::Gossip { port, payload } = &pkt.payload {
            if pkt.dst != GOSSIP_GROUP || *port != GOSSIP_PORT {
                warn!(dst = %pkt.dst, port, "gossip 目的地址或端口不对，忽略");
                return;
            }
            let view = NodeView {
                ifaces: &mut self.ifaces,
                links: net.links(),
            };
            let dgram = GossipDatagram {
                sender: pkt.src,
                recv_if: Some(in_if),
                ttl: Some(pkt.ttl),
                payload: payload.clone(),
            };
            self.routing.receive(&view, dgram);
            net.stats.gossip_received += 1;
            return;
        }

        trace!(dst = %pkt.dst, ttl = pkt.ttl, distance = ?pkt.tags.distance, "数据包信息");
        let view = NodeView {
            ifaces: &mut self.ifaces,
            links: net.links(),
        };
        let verdict = self
            .routing
            .route_input(&view, pkt.dst, &mut pkt.tags, in_if, now);
        match verdict {
            InputVerdict::LocalDeliver { .. } => {
                info!("已到达目的地，标记为已送达");
                net.on_delivered(self.id, pkt, now);
            }
            InputVerdict::Forward(route) => {
                if pkt.ttl <= 1 {
                    debug!("TTL 耗尽，丢弃");
                    net.stats.dropped_ttl += 1;
                    return;
                }
                pkt.ttl -= 1;
                debug!(out_if = route.out_if, gateway = %route.gateway, "未到达目的地，继续转发");
                net.transmit(self.id, route.out_if, self.interface(route.out_if), pkt, sim);
            }
            InputVerdict::Error(e) => {
                debug!(error = %e, "转发失败");
                net.on_dropped_no_route(pkt);
            }
            InputVerdict::NotHandled => {
                debug!("没有可用路由");
                net.on_dropped_no_route(pkt);
            }
        }
    }

    /// 周期性 gossip：发送本地队列占用，然后重新调度下一次
    #[tracing::instrument(skip(self, sim, net), fields(node = %self.name))]
    pub fn on_gossip_timer(&mut self, sim: &mut Simulator, net: &mut Network) {
        let view = NodeView {
            ifaces: &mut self.ifaces,
            links: net.links(),
        };
        let updates = self.routing.build_updates(&view);
        trace!(messages = updates.len(), "发送邻居状态更新");
        for g in updates {
            let pkt = net.make_gossip_packet(g.source, g.payload);
            net.stats.gossip_sent += 1;
            net.transmit(self.id, g.out_if, self.interface(g.out_if), pkt, sim);
        }
        let id = sim.schedule_in(
            self.routing.config().sample_period(),
            GossipTimer { node: self.id },
        );
        self.routing.set_gossip_timer(id);
    }

    pub fn print_routing_table(&self, now: crate::sim::SimTime) -> String {
        self.routing.print_routing_table(&self.name, now)
    }
}
