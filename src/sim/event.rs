//! 事件 trait
//!
//! 包交付、链路空闲、gossip 定时器和流量源都实现它。

use super::simulator::Simulator;
use super::world::World;

/// 可被调度的事件。执行时按值消费自身，事件携带的 packet 可以直接移交给网络层。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);

    /// 日志中使用的事件名
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("event")
    }
}
