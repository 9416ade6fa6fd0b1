//! 链状、菱形和网格拓扑

use crate::net::{NetWorld, NodeId};

use super::LinkOpts;

/// 链状拓扑：n0 <-> n1 <-> ... <-> n{k-1}
pub fn build_chain(world: &mut NetWorld, nodes: usize, link: LinkOpts) -> Vec<NodeId> {
    let ids: Vec<NodeId> = (0..nodes)
        .map(|i| world.net.add_router(format!("n{i}")))
        .collect();
    for pair in ids.windows(2) {
        world
            .net
            .connect(pair[0], pair[1], link.latency, link.bandwidth_bps);
    }
    ids
}

/// 菱形拓扑的四个节点
#[derive(Debug, Clone, Copy)]
pub struct Diamond {
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub d: NodeId,
}

impl Diamond {
    pub fn nodes(&self) -> Vec<NodeId> {
        vec![self.a, self.b, self.c, self.d]
    }
}

/// 菱形拓扑：两条等价路径 a->b->d 与 a->c->d
///
/// a 的接口 1 连 b，接口 2 连 c。
pub fn build_diamond(world: &mut NetWorld, link: LinkOpts) -> Diamond {
    let a = world.net.add_router("a");
    let b = world.net.add_router("b");
    let c = world.net.add_router("c");
    let d = world.net.add_router("d");
    for (x, y) in [(a, b), (a, c), (b, d), (c, d)] {
        world.net.connect(x, y, link.latency, link.bandwidth_bps);
    }
    Diamond { a, b, c, d }
}

/// rows x cols 网格，节点按行优先编号
pub fn build_grid(world: &mut NetWorld, rows: usize, cols: usize, link: LinkOpts) -> Vec<NodeId> {
    let mut ids = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            ids.push(world.net.add_router(format!("g{r}_{c}")));
        }
    }
    for r in 0..rows {
        for c in 0..cols {
            let here = ids[r * cols + c];
            if c + 1 < cols {
                world
                    .net
                    .connect(here, ids[r * cols + c + 1], link.latency, link.bandwidth_bps);
            }
            if r + 1 < rows {
                world
                    .net
                    .connect(here, ids[(r + 1) * cols + c], link.latency, link.bandwidth_bps);
            }
        }
    }
    ids
}
