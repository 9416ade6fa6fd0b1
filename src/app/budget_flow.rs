//! 预算流：周期性注入数据包的事件

use std::net::Ipv4Addr;

use tracing::{debug, trace};

use crate::net::{NetWorld, NodeId, PacketTags};
use crate::sim::{Event, FlowSpec, SimTime, Simulator, World};

/// 流量注入事件
///
/// 每次执行发出一个 packet，然后在 `gap` 之后调度自己，直到 `remaining` 用完。
#[derive(Debug, Clone)]
pub struct BudgetFlow {
    pub flow_id: u64,
    pub src: NodeId,
    pub dst: Ipv4Addr,
    pub pkt_bytes: u32,
    pub remaining: u64,
    pub gap: SimTime,
    /// 端到端时延预算（微秒）；None 表示普通流量，按最短路转发
    pub budget_us: Option<u32>,
    pub priority: bool,
}

impl BudgetFlow {
    /// 从场景里的流描述构造；目的地址为目的节点的第一个非 loopback 地址
    pub fn from_spec(flow_id: u64, spec: &FlowSpec, dst: Ipv4Addr) -> Self {
        Self {
            flow_id,
            src: NodeId(spec.src),
            dst,
            pkt_bytes: spec.pkt_bytes,
            remaining: spec.pkts,
            gap: SimTime::from_micros(spec.gap_us),
            budget_us: spec.budget_us,
            priority: spec.priority,
        }
    }

    fn tags(&self, now: SimTime) -> PacketTags {
        PacketTags {
            budget_us: self.budget_us,
            timestamp: Some(now),
            distance: None,
            priority: self.priority,
        }
    }
}

impl Event for BudgetFlow {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let mut me = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");

        if me.remaining == 0 {
            return;
        }

        let now = sim.now();
        let tags = me.tags(now);
        let pkt = w.net.make_packet(
            me.flow_id,
            me.pkt_bytes,
            Ipv4Addr::UNSPECIFIED,
            me.dst,
            tags,
        );
        trace!(flow_id = me.flow_id, pkt_id = pkt.id, remaining = me.remaining, "注入数据包");
        w.net.send(me.src, pkt, sim);

        me.remaining -= 1;
        if me.remaining > 0 {
            sim.schedule_in(me.gap, me);
        } else {
            debug!(flow_id = me.flow_id, "流注入完成");
        }
    }
}
