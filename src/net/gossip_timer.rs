//! gossip 定时器事件
//!
//! 每个路由器一个；触发时发送邻居状态更新并重新调度自己。关停时通过 `EventId` 取消。

use super::id::NodeId;
use super::net_world::NetWorld;
use crate::sim::{Event, Simulator, World};

#[derive(Debug)]
pub struct GossipTimer {
    pub node: NodeId,
}

impl Event for GossipTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let GossipTimer { node } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.on_gossip_timer(node, sim);
    }
}
