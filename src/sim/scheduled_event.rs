//! 队列中的事件
//!
//! 按（时间，句柄）排序；句柄单调递增，同一时刻的事件按调度先后执行。

use super::event::Event;
use super::simulator::EventId;
use super::time::SimTime;
use std::cmp::Ordering;

pub(crate) struct ScheduledEvent {
    pub(crate) at: SimTime,
    pub(crate) id: EventId,
    pub(crate) ev: Box<dyn Event>,
}

// BinaryHeap 是 max-heap，反向比较得到最早的事件
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.id).cmp(&(other.at, other.id)).reverse()
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScheduledEvent {}
