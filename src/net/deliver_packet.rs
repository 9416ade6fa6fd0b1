//! 数据包交付事件
//!
//! 定义网络模拟中的数据包交付事件。

use super::id::NodeId;
use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::{debug, trace};

/// 事件：packet 经链路到达某个节点的某个接口。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: NodeId,
    pub in_if: u32,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.pkt.id, flow_id = self.pkt.flow_id, to = %self.to))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, in_if, pkt } = *self;

        debug!(
            size_bytes = pkt.size_bytes,
            dst = %pkt.dst,
            hops_taken = pkt.hops_taken,
            in_if,
            now = ?sim.now(),
            "📨 数据包到达节点"
        );

        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.deliver(to, in_if, pkt, sim);

        trace!("DeliverPacket::execute 完成");
    }
}
