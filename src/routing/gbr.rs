//! 逐包转发决策引擎
//!
//! 每个路由器持有一个 `GbrRouting`：它读取本节点的路由表、邻居状态库（NSDB）
//! 和本地出口队列的拥塞信号，为每个 packet 在多条候选下一跳中选出一条；
//! 同时负责周期性地把本地队列占用 gossip 给直连邻居。
//!
//! 所有候选都先经过防环过滤：表项距离不得超过 packet 携带的 Distance 标签。
//! DGR / DDR 还要求估计时延不超过剩余预算。

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::net::PacketTags;
use crate::sim::{EventId, SimTime};

use super::config::{RouteSelectMode, RoutingConfig};
use super::context::NodeContext;
use super::entry::{DIST_INFINITY, RouteEntry};
use super::error::RoutingError;
use super::nsdb::{NeighborStatusDatabase, NeighborStatusEntry};
use super::table::RouteTable;
use super::wire::{Command, GossipMessage, Nse, split_responses};

/// 每跳的固定传输时延估计（微秒）
pub const PER_HOP_DELAY_US: u64 = 1_000;

/// 没有 Distance 标签时的防环上限
const DEFAULT_DISTANCE_CEILING: u32 = DIST_INFINITY - 1;

/// 选路结果：交给转发层的下一跳信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Route {
    pub destination: Ipv4Addr,
    pub source: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub out_if: u32,
}

/// 转发路径上的处理结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputVerdict {
    /// 目的地址属于本节点
    LocalDeliver { iif: u32 },
    Forward(Ipv4Route),
    Error(RoutingError),
    /// 没有可用路由，交给其他协议或丢弃
    NotHandled,
}

/// 收到的一个 gossip 报文；`recv_if` / `ttl` 由传输层保证一定存在
#[derive(Debug, Clone)]
pub struct GossipDatagram {
    pub sender: Ipv4Addr,
    pub recv_if: Option<u32>,
    pub ttl: Option<u8>,
    pub payload: Bytes,
}

/// 待发送的 gossip：出接口 + 编码后的报文
#[derive(Debug, Clone)]
pub struct OutgoingGossip {
    pub out_if: u32,
    pub source: Ipv4Addr,
    pub payload: Bytes,
}

#[derive(Debug)]
pub struct GbrRouting {
    config: RoutingConfig,
    table: RouteTable,
    nsdb: NeighborStatusDatabase,
    rng: StdRng,
    gossip_timer: Option<EventId>,
    /// 绑定了 gossip "socket" 的接口
    gossip_ifaces: BTreeSet<u32>,
    initialized: bool,
}

impl GbrRouting {
    pub fn new(config: RoutingConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.rng_seed);
        Self {
            config,
            table: RouteTable::new(),
            nsdb: NeighborStatusDatabase::new(),
            rng,
            gossip_timer: None,
            gossip_ifaces: BTreeSet::new(),
            initialized: false,
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn mode(&self) -> RouteSelectMode {
        self.config.route_select_mode
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut RouteTable {
        &mut self.table
    }

    pub fn nsdb(&self) -> &NeighborStatusDatabase {
        &self.nsdb
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn gossip_interfaces(&self) -> impl Iterator<Item = u32> + '_ {
        self.gossip_ifaces.iter().copied()
    }

    pub fn add_host_route_to(
        &mut self,
        dest: Ipv4Addr,
        gateway: Ipv4Addr,
        interface: u32,
        next_iface: Option<u32>,
        distance: u32,
    ) {
        self.table.add_host_route(RouteEntry::host_route_to(
            dest, gateway, interface, next_iface, distance,
        ));
    }

    pub fn add_network_route_to(
        &mut self,
        network: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Ipv4Addr,
        interface: u32,
    ) {
        self.table.add_network_route(RouteEntry::network_route_to(
            network,
            mask,
            gateway,
            interface,
            None,
            DIST_INFINITY,
        ));
    }

    pub fn add_external_route_to(
        &mut self,
        network: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Ipv4Addr,
        interface: u32,
    ) {
        self.table.add_external_route(RouteEntry::network_route_to(
            network,
            mask,
            gateway,
            interface,
            None,
            DIST_INFINITY,
        ));
    }

    pub fn n_routes(&self) -> usize {
        self.table.n_routes()
    }

    pub fn get_route(&self, index: usize) -> Option<&RouteEntry> {
        self.table.get(index)
    }

    pub fn remove_route(&mut self, index: usize) -> Option<RouteEntry> {
        self.table.remove(index)
    }

    /// 重新设定随机流，返回占用的流数量
    pub fn assign_streams(&mut self, seed: u64) -> u64 {
        self.rng = StdRng::seed_from_u64(seed);
        1
    }

    // ---------------------------------------------------------------------
    // 生命周期
    // ---------------------------------------------------------------------

    /// 在非排除接口上开启转发，并为每个有非 host-scope 地址的接口打开 gossip。
    pub fn initialize(&mut self, ctx: &mut dyn NodeContext) {
        self.gossip_ifaces.clear();
        for i in 0..ctx.n_interfaces() {
            if ctx.is_loopback(i) {
                continue;
            }
            let active = !self.config.is_excluded(i);
            if active {
                ctx.set_forwarding(i, true);
            }
            if active && ctx.addresses(i).iter().any(|a| !a.is_host_scope()) {
                trace!(iface = i, "gossip 接口就绪");
                self.gossip_ifaces.insert(i);
            }
        }
        self.initialized = true;
        debug!(gossip_ifaces = ?self.gossip_ifaces, "GBR 初始化完成");
    }

    pub fn set_gossip_timer(&mut self, id: EventId) {
        self.gossip_timer = Some(id);
    }

    pub fn take_gossip_timer(&mut self) -> Option<EventId> {
        self.gossip_timer.take()
    }

    pub fn gossip_timer(&self) -> Option<EventId> {
        self.gossip_timer
    }

    // ---------------------------------------------------------------------
    // 选路
    // ---------------------------------------------------------------------

    /// 逐包选路入口。没有 Budget 标签的 packet 一律按 ECMP 处理。
    #[tracing::instrument(skip(self, ctx, tags), fields(mode = ?self.config.route_select_mode))]
    pub fn route(
        &mut self,
        ctx: &dyn NodeContext,
        dest: Ipv4Addr,
        tags: &mut PacketTags,
        iif: Option<u32>,
        oif: Option<u32>,
        now: SimTime,
    ) -> Option<RouteEntry> {
        if tags.budget_us.is_none() {
            return self.lookup_ecmp(dest, oif);
        }
        match self.config.route_select_mode {
            RouteSelectMode::None | RouteSelectMode::Ecmp => self.lookup_ecmp(dest, oif),
            RouteSelectMode::KShort => self.lookup_kshort(dest, tags, iif),
            RouteSelectMode::Dgr => self.lookup_dgr(ctx, dest, tags, iif, now),
            RouteSelectMode::Ddr => self.lookup_ddr(ctx, dest, tags, iif, now),
        }
    }

    /// 最短距离；等距时取第一条，或在开启 `random_ecmp_routing` 时随机取一条
    pub fn lookup_ecmp(&mut self, dest: Ipv4Addr, oif: Option<u32>) -> Option<RouteEntry> {
        let all: Vec<RouteEntry> = self
            .table
            .host_routes_to(dest)
            .filter(|e| oif.is_none_or(|o| e.interface() == o))
            .copied()
            .collect();
        let shortest = all.iter().map(RouteEntry::distance).min()?;
        let chosen = if self.config.random_ecmp_routing {
            let ties: Vec<&RouteEntry> = all.iter().filter(|e| e.distance() == shortest).collect();
            *ties[self.rng.random_range(0..ties.len())]
        } else {
            *all.iter().find(|e| e.distance() == shortest)?
        };
        trace!(route = %chosen, candidates = all.len(), "ECMP 选路");
        Some(chosen)
    }

    /// 所有防环安全的候选中均匀随机
    pub fn lookup_kshort(
        &mut self,
        dest: Ipv4Addr,
        tags: &mut PacketTags,
        iif: Option<u32>,
    ) -> Option<RouteEntry> {
        let ceiling = tags.distance.unwrap_or(DEFAULT_DISTANCE_CEILING);
        let all: Vec<RouteEntry> = self
            .table
            .host_routes_to(dest)
            .filter(|e| iif != Some(e.interface()))
            .filter(|e| e.distance() <= ceiling)
            .copied()
            .collect();
        if all.is_empty() {
            debug!(%dest, ceiling, "KSHORT 无可用候选");
            return None;
        }
        let chosen = all[self.rng.random_range(0..all.len())];
        tags.distance = Some(chosen.distance());
        trace!(route = %chosen, candidates = all.len(), "KSHORT 选路");
        Some(chosen)
    }

    /// 预算与防环过滤后均匀随机；估计时延 = 距离×1000 + 本地排队 + 邻居排队（平滑值）
    pub fn lookup_dgr(
        &mut self,
        ctx: &dyn NodeContext,
        dest: Ipv4Addr,
        tags: &mut PacketTags,
        iif: Option<u32>,
        now: SimTime,
    ) -> Option<RouteEntry> {
        let all = self.budget_candidates(ctx, dest, tags, iif, now, false);
        if all.is_empty() {
            debug!(%dest, budget = remaining_budget(tags, now), "DGR 无满足预算的候选");
            return None;
        }
        let chosen = all[self.rng.random_range(0..all.len())];
        tags.distance = Some(chosen.distance());
        trace!(route = %chosen, candidates = all.len(), "DGR 选路");
        Some(chosen)
    }

    /// 与 DGR 相同的过滤（多算一跳），但贪心取最短距离；无候选时回退 ECMP
    pub fn lookup_ddr(
        &mut self,
        ctx: &dyn NodeContext,
        dest: Ipv4Addr,
        tags: &mut PacketTags,
        iif: Option<u32>,
        now: SimTime,
    ) -> Option<RouteEntry> {
        let all = self.budget_candidates(ctx, dest, tags, iif, now, true);
        let chosen = match all.iter().map(RouteEntry::distance).min() {
            Some(shortest) => all.iter().find(|e| e.distance() == shortest).copied(),
            None => {
                debug!(%dest, budget = remaining_budget(tags, now), "DDR 无满足预算的候选，回退 ECMP");
                self.lookup_ecmp(dest, None)
            }
        }?;
        tags.distance = Some(chosen.distance());
        trace!(route = %chosen, candidates = all.len(), "DDR 选路");
        Some(chosen)
    }

    fn budget_candidates(
        &self,
        ctx: &dyn NodeContext,
        dest: Ipv4Addr,
        tags: &PacketTags,
        iif: Option<u32>,
        now: SimTime,
        extra_hop: bool,
    ) -> Vec<RouteEntry> {
        let ceiling = tags.distance.unwrap_or(DEFAULT_DISTANCE_CEILING);
        let budget = remaining_budget(tags, now);
        self.table
            .host_routes_to(dest)
            .filter(|e| iif != Some(e.interface()))
            .filter(|e| ctx.is_up(e.interface()))
            .filter(|e| {
                let est = self.estimate_delay(ctx, e, extra_hop);
                if est > budget {
                    trace!(route = %e, est, budget, "超出预算，跳过");
                    return false;
                }
                true
            })
            .filter(|e| e.distance() <= ceiling)
            .copied()
            .collect()
    }

    /// 候选表项的估计端到端时延（微秒）
    pub fn estimate_delay(&self, ctx: &dyn NodeContext, e: &RouteEntry, extra_hop: bool) -> u64 {
        let hops = u64::from(e.distance()) + u64::from(extra_hop);
        let local = u64::from(ctx.local_delay(e.interface()));
        let neighbor = e
            .next_iface()
            .map(|n| {
                if extra_hop {
                    self.nsdb.delay_ddr(e.interface(), n)
                } else {
                    self.nsdb.delay_dgr(e.interface(), n)
                }
            })
            .map(u64::from)
            .unwrap_or(0);
        hops.saturating_mul(PER_HOP_DELAY_US)
            .saturating_add(local)
            .saturating_add(neighbor)
    }

    fn to_ipv4_route(ctx: &dyn NodeContext, e: &RouteEntry) -> Ipv4Route {
        Ipv4Route {
            destination: e.dest(),
            source: ctx.source_address(e.interface()),
            gateway: e.gateway(),
            out_if: e.interface(),
        }
    }

    /// 本地发出的 packet
    pub fn route_output(
        &mut self,
        ctx: &dyn NodeContext,
        dest: Ipv4Addr,
        tags: &mut PacketTags,
        oif: Option<u32>,
        now: SimTime,
    ) -> Result<Ipv4Route, RoutingError> {
        if dest.is_multicast() {
            debug!(%dest, "组播目的，交给其他协议");
            return Err(RoutingError::MulticastNotHandled(dest));
        }
        self.route(ctx, dest, tags, None, oif, now)
            .map(|e| Self::to_ipv4_route(ctx, &e))
            .ok_or(RoutingError::NoRouteToHost(dest))
    }

    /// 转发路径上的 packet
    pub fn route_input(
        &mut self,
        ctx: &dyn NodeContext,
        dest: Ipv4Addr,
        tags: &mut PacketTags,
        iif: u32,
        now: SimTime,
    ) -> InputVerdict {
        if ctx.is_destination_address(dest, iif) {
            trace!(%dest, iif, "本地交付");
            return InputVerdict::LocalDeliver { iif };
        }
        if !ctx.is_forwarding(iif) {
            debug!(iif, "该接口未开启转发");
            return InputVerdict::Error(RoutingError::ForwardingDisabled(iif));
        }
        match self.route(ctx, dest, tags, Some(iif), None, now) {
            Some(e) => InputVerdict::Forward(Self::to_ipv4_route(ctx, &e)),
            None => InputVerdict::NotHandled,
        }
    }

    // ---------------------------------------------------------------------
    // 接口事件
    // ---------------------------------------------------------------------

    fn wants_recompute(&self, now: SimTime) -> bool {
        // 启动阶段的接口事件不触发重算
        self.config.respond_to_interface_events && now > SimTime::ZERO
    }

    /// 返回 true 表示需要全局重算路由
    pub fn notify_interface_up(&self, iface: u32, now: SimTime) -> bool {
        debug!(iface, "接口 up");
        self.wants_recompute(now)
    }

    pub fn notify_interface_down(&self, iface: u32, now: SimTime) -> bool {
        debug!(iface, "接口 down");
        self.wants_recompute(now)
    }

    pub fn notify_add_address(&self, iface: u32, addr: Ipv4Addr, now: SimTime) -> bool {
        debug!(iface, %addr, "接口新增地址");
        self.wants_recompute(now)
    }

    pub fn notify_remove_address(&self, iface: u32, addr: Ipv4Addr, now: SimTime) -> bool {
        debug!(iface, %addr, "接口移除地址");
        self.wants_recompute(now)
    }

    // ---------------------------------------------------------------------
    // gossip
    // ---------------------------------------------------------------------

    /// 本节点所有 up、非 loopback 接口的占用率快照，按 MTU 切分后从每个 up 的 gossip 接口发出
    #[tracing::instrument(skip(self, ctx))]
    pub fn build_updates(&self, ctx: &dyn NodeContext) -> Vec<OutgoingGossip> {
        let nses: Vec<Nse> = (0..ctx.n_interfaces())
            .filter(|&i| ctx.is_up(i) && !ctx.is_loopback(i))
            .map(|i| Nse {
                interface: i,
                state: ctx.congestion(i).map(|s| s.occupancy_ratio()).unwrap_or(0),
            })
            .collect();

        let mut out = Vec::new();
        for &iface in &self.gossip_ifaces {
            if self.config.is_excluded(iface) || !ctx.is_up(iface) {
                continue;
            }
            for msg in split_responses(&nses, ctx.mtu(iface)) {
                match msg.encode() {
                    Ok(payload) => out.push(OutgoingGossip {
                        out_if: iface,
                        source: ctx.source_address(iface),
                        payload,
                    }),
                    Err(e) => warn!(iface, error = %e, "gossip 编码失败"),
                }
            }
        }
        trace!(nses = nses.len(), messages = out.len(), "生成邻居状态更新");
        out
    }

    /// 处理收到的 gossip。缺少接收接口或 TTL 信息说明传输层违约，直接 panic。
    #[tracing::instrument(skip(self, ctx, dgram), fields(sender = %dgram.sender))]
    pub fn receive(&mut self, ctx: &dyn NodeContext, dgram: GossipDatagram) {
        let recv_if = dgram
            .recv_if
            .unwrap_or_else(|| panic!("no incoming interface on gossip message, aborting"));
        let ttl = dgram
            .ttl
            .unwrap_or_else(|| panic!("no incoming hop count on gossip message, aborting"));

        if ctx.interface_for_address(dgram.sender).is_some() {
            trace!("忽略自己发出的 gossip");
            return;
        }

        let msg = match GossipMessage::decode(&dgram.payload) {
            Ok(m) => m,
            Err(e) => {
                warn!(recv_if, error = %e, "无法解析 gossip 报文");
                return;
            }
        };

        match msg.command {
            Command::Response => self.handle_responses(msg, recv_if, ttl),
            other => debug!(command = ?other, "忽略未知命令"),
        }
    }

    fn handle_responses(&mut self, msg: GossipMessage, recv_if: u32, ttl: u8) {
        if self.config.is_excluded(recv_if) {
            debug!(recv_if, "忽略来自排除接口的更新");
            return;
        }
        if msg.nses.is_empty() {
            debug!(recv_if, "更新中没有邻居状态条目");
        }
        if self.nsdb.handle_neighbor_status_entry(recv_if).is_none() {
            self.nsdb.insert(recv_if, NeighborStatusEntry::new());
        }
        for nse in &msg.nses {
            self.nsdb.record(recv_if, nse.interface, nse.state);
        }
        trace!(recv_if, ttl, nses = msg.nses.len(), "NSDB 已更新");
    }

    /// `route -n` 风格的路由表
    pub fn print_routing_table(&self, node: &str, now: SimTime) -> String {
        info!(node, routes = self.table.n_routes(), "🧭 打印路由表");
        let mut s = format!(
            "Node: {node}, Time: {:.6}s, GBR routing table\n",
            now.as_secs_f64()
        );
        s.push_str(&self.table.to_string());
        s
    }
}

/// 剩余预算（微秒）：max(0, Budget + Timestamp − now)
pub fn remaining_budget(tags: &PacketTags, now: SimTime) -> u64 {
    let Some(budget) = tags.budget_us else {
        return 0;
    };
    let origin = tags.timestamp.map(|t| t.as_micros()).unwrap_or(0);
    (u64::from(budget) + origin).saturating_sub(now.as_micros())
}
