//! 路由协议配置
//!
//! 取代属性反射式配置：一个普通的 serde 结构即可从 scenario.json 读入。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sim::SimTime;

/// 逐包选路模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSelectMode {
    /// 未指定模式，按 ECMP 处理
    #[default]
    None,
    /// 最短路（等价多路径中取第一条或随机一条）
    Ecmp,
    /// 在所有无环候选中均匀随机
    #[serde(rename = "kshort")]
    KShort,
    /// 时延保证路由：预算过滤后均匀随机
    Dgr,
    /// 截止期驱动路由：预算过滤后贪心取最短，失败回退 ECMP
    Ddr,
}

/// 路由管理器为每个节点安装哪些候选路由
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSet {
    /// 单次 SPF：每个目的只保留等价最短路（ECMP）
    #[default]
    Shortest,
    /// 对每条出链路，以邻居为根（去掉本节点）再做一次 SPF，得到经由每个邻居的候选
    NeighborRooted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub route_select_mode: RouteSelectMode,
    /// 两次主动邻居状态更新之间的间隔（微秒）
    pub sample_period_us: u64,
    /// 不参与本协议的接口（不开启转发、不发送也不接收 gossip）
    pub interface_exclusions: BTreeSet<u32>,
    /// 接口 up/down 或地址增删时是否重新计算全局路由
    pub respond_to_interface_events: bool,
    /// ECMP 模式下是否在等价路由中随机选择
    pub random_ecmp_routing: bool,
    /// 随机选路使用的种子；每个节点在此基础上偏移
    pub rng_seed: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            route_select_mode: RouteSelectMode::None,
            sample_period_us: 10_000,
            interface_exclusions: BTreeSet::new(),
            respond_to_interface_events: false,
            random_ecmp_routing: false,
            rng_seed: 1,
        }
    }
}

impl RoutingConfig {
    pub fn with_mode(mode: RouteSelectMode) -> Self {
        Self {
            route_select_mode: mode,
            ..Self::default()
        }
    }

    pub fn sample_period(&self) -> SimTime {
        SimTime::from_micros(self.sample_period_us)
    }

    pub fn is_excluded(&self, iface: u32) -> bool {
        self.interface_exclusions.contains(&iface)
    }
}
