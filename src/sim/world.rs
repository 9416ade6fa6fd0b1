//! 世界 trait
//!
//! 事件通过 `as_any_mut` 向下转型拿到具体的世界（这里是 `NetWorld`）。

use super::simulator::Simulator;
use std::any::Any;

pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每执行完一个事件调用一次；被取消的事件不会触发
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
