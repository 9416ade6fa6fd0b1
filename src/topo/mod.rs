//! 拓扑构建
//!
//! 所有节点都是运行同一路由协议的路由器；链路为全双工点到点链路。

pub mod fat_tree;
pub mod simple;

use crate::net::{NetWorld, NodeId};
use crate::sim::{LinkSpec, SimTime, TopologySpec};

/// 所有链路共用的参数
#[derive(Debug, Clone, Copy)]
pub struct LinkOpts {
    pub bandwidth_bps: u64,
    pub latency: SimTime,
}

impl Default for LinkOpts {
    fn default() -> Self {
        Self::from(&LinkSpec::default())
    }
}

impl From<&LinkSpec> for LinkOpts {
    fn from(spec: &LinkSpec) -> Self {
        Self {
            bandwidth_bps: spec.bandwidth_mbps.saturating_mul(1_000_000),
            latency: SimTime::from_micros(spec.latency_us),
        }
    }
}

/// 按场景描述构建拓扑，返回按创建顺序排列的节点
pub fn build(world: &mut NetWorld, topo: &TopologySpec, link: LinkOpts) -> Vec<NodeId> {
    match *topo {
        TopologySpec::Chain { nodes } => simple::build_chain(world, nodes, link),
        TopologySpec::Diamond => simple::build_diamond(world, link).nodes(),
        TopologySpec::Grid { rows, cols } => simple::build_grid(world, rows, cols, link),
        TopologySpec::FatTree { k } => {
            fat_tree::build_fat_tree(world, &fat_tree::FatTreeOpts { k, link }).all_nodes()
        }
    }
}
