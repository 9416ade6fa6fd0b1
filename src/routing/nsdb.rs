//! 邻居状态数据库（NSDB）
//!
//! 以本地接口为键；每个条目把邻居自己的出接口编号映射到一个由 gossip 更新的
//! `StatusUnit`。条目在第一次收到时创建，不会过期。

use std::collections::BTreeMap;

use crate::queue::DELAY_PER_OCCUPANCY_US;

/// 邻居能上报的最高占用等级
pub const MAX_OCCUPANCY: u8 = 10;

/// 平滑估计中最新样本的权重 1/N
const EMA_DIVISOR: u32 = 4;

/// 某个邻居接口的时延状态
///
/// 平滑估计是指数移动平均，最新样本权重 1/4，以整数微秒计算：
/// `est = (3 * est + sample_delay) / 4`。第一个样本直接作为初值。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusUnit {
    last_sample: u8,
    estimate_us: u32,
    initialized: bool,
}

impl StatusUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: u8) {
        let sample = sample.min(MAX_OCCUPANCY);
        let delay = u32::from(sample) * DELAY_PER_OCCUPANCY_US;
        self.estimate_us = if self.initialized {
            ((EMA_DIVISOR - 1) * self.estimate_us + delay) / EMA_DIVISOR
        } else {
            delay
        };
        self.last_sample = sample;
        self.initialized = true;
    }

    pub fn last_sample(&self) -> u8 {
        self.last_sample
    }

    /// 平滑后的时延（EMA）
    pub fn estimated_delay_dgr(&self) -> u32 {
        self.estimate_us
    }

    /// 仅由最新样本得到的时延
    pub fn estimated_delay_ddr(&self) -> u32 {
        u32::from(self.last_sample) * DELAY_PER_OCCUPANCY_US
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborStatusEntry {
    units: BTreeMap<u32, StatusUnit>,
}

impl NeighborStatusEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_unit(&self, neighbor_if: u32) -> Option<&StatusUnit> {
        self.units.get(&neighbor_if)
    }

    pub fn status_unit_mut(&mut self, neighbor_if: u32) -> &mut StatusUnit {
        self.units.entry(neighbor_if).or_default()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NeighborStatusDatabase {
    entries: BTreeMap<u32, NeighborStatusEntry>,
}

impl NeighborStatusDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_neighbor_status_entry(&self, local_if: u32) -> Option<&NeighborStatusEntry> {
        self.entries.get(&local_if)
    }

    pub fn insert(&mut self, local_if: u32, entry: NeighborStatusEntry) {
        self.entries.insert(local_if, entry);
    }

    /// 写入一个 gossip 样本，首次使用时创建条目
    pub fn record(&mut self, local_if: u32, neighbor_if: u32, sample: u8) {
        self.entries
            .entry(local_if)
            .or_default()
            .status_unit_mut(neighbor_if)
            .update(sample);
    }

    fn unit(&self, local_if: u32, neighbor_if: u32) -> Option<&StatusUnit> {
        self.entries.get(&local_if)?.status_unit(neighbor_if)
    }

    /// 还没收到过该对接口的样本时为 0
    pub fn delay_dgr(&self, local_if: u32, neighbor_if: u32) -> u32 {
        self.unit(local_if, neighbor_if)
            .map(StatusUnit::estimated_delay_dgr)
            .unwrap_or(0)
    }

    pub fn delay_ddr(&self, local_if: u32, neighbor_if: u32) -> u32 {
        self.unit(local_if, neighbor_if)
            .map(StatusUnit::estimated_delay_ddr)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
