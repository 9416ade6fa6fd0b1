//! Fat-tree 拓扑构建
//!
//! 所有层都是路由器；主机也是一个只有一个上行接口的路由器，
//! 因此 SPF 会给它装一条默认路由。

use crate::net::{NetWorld, NodeId};

use super::LinkOpts;

#[derive(Debug, Clone)]
pub struct FatTreeOpts {
    pub k: usize,
    pub link: LinkOpts,
}

impl Default for FatTreeOpts {
    fn default() -> Self {
        Self {
            k: 4,
            link: LinkOpts::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FatTreeTopology {
    pub k: usize,
    pub hosts: Vec<NodeId>,
    pub edge_switches: Vec<NodeId>,
    pub agg_switches: Vec<NodeId>,
    pub core_switches: Vec<NodeId>,
    /// 按创建顺序排列的全部节点
    created: Vec<NodeId>,
}

impl FatTreeTopology {
    fn half(&self) -> usize {
        self.k / 2
    }

    pub fn host(&self, pod: usize, edge: usize, host: usize) -> NodeId {
        let half = self.half();
        let idx = (pod * half + edge) * half + host;
        self.hosts[idx]
    }

    pub fn edge(&self, pod: usize, edge: usize) -> NodeId {
        let half = self.half();
        self.edge_switches[pod * half + edge]
    }

    pub fn agg(&self, pod: usize, agg: usize) -> NodeId {
        let half = self.half();
        self.agg_switches[pod * half + agg]
    }

    pub fn core(&self, group: usize, index: usize) -> NodeId {
        let half = self.half();
        self.core_switches[group * half + index]
    }

    /// 创建顺序：core，然后每个 pod 依次是 edge、agg、该 pod 的主机
    pub fn all_nodes(&self) -> Vec<NodeId> {
        self.created.clone()
    }
}

pub fn build_fat_tree(world: &mut NetWorld, opts: &FatTreeOpts) -> FatTreeTopology {
    let k = opts.k;
    assert!(k >= 2 && k % 2 == 0, "fat-tree k must be even and >= 2");

    let half = k / 2;
    let LinkOpts {
        bandwidth_bps,
        latency,
    } = opts.link;
    let mut created = Vec::new();

    let mut core_switches = Vec::with_capacity(half * half);
    for group in 0..half {
        for index in 0..half {
            let id = world.net.add_router(format!("c{group}_{index}"));
            core_switches.push(id);
            created.push(id);
        }
    }

    let mut hosts = Vec::with_capacity(k * half * half);
    let mut edge_switches = Vec::with_capacity(k * half);
    let mut agg_switches = Vec::with_capacity(k * half);

    for pod in 0..k {
        let edges: Vec<NodeId> = (0..half)
            .map(|e| world.net.add_router(format!("p{pod}_e{e}")))
            .collect();
        let aggs: Vec<NodeId> = (0..half)
            .map(|a| world.net.add_router(format!("p{pod}_a{a}")))
            .collect();
        created.extend(&edges);
        created.extend(&aggs);

        for (edge_idx, &edge_id) in edges.iter().enumerate() {
            for host in 0..half {
                let host_id = world.net.add_router(format!("h{pod}_{edge_idx}_{host}"));
                world.net.connect(host_id, edge_id, latency, bandwidth_bps);
                hosts.push(host_id);
                created.push(host_id);
            }
        }

        for &edge_id in &edges {
            for &agg_id in &aggs {
                world.net.connect(edge_id, agg_id, latency, bandwidth_bps);
            }
        }

        // 第 a 个 agg 连到第 a 组 core
        for (agg_idx, &agg_id) in aggs.iter().enumerate() {
            for index in 0..half {
                let core_id = core_switches[agg_idx * half + index];
                world.net.connect(agg_id, core_id, latency, bandwidth_bps);
            }
        }

        edge_switches.extend(edges);
        agg_switches.extend(aggs);
    }

    FatTreeTopology {
        k,
        hosts,
        edge_switches,
        agg_switches,
        core_switches,
        created,
    }
}
