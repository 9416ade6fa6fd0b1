//! 场景运行
//!
//! 把 `ScenarioSpec` 变成一次完整的仿真：建拓扑、算路由、启动 gossip、注入流量，
//! 跑到截止时间后停掉所有定时器并汇总统计。

use serde::Serialize;
use tracing::{debug, info};

use crate::app::BudgetFlow;
use crate::net::{NetWorld, Network, NodeId, Stats};
use crate::sim::{ScenarioError, ScenarioSpec, SimTime, Simulator};
use crate::topo::{self, LinkOpts};

/// 没有指定截止时间时，在最后一个包注入之后再留出的排空时间
const DRAIN_SLACK_MS: u64 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub end_time_us: u64,
    pub nodes: usize,
    pub routes: usize,
    pub stats: Stats,
}

/// 一次场景运行
pub struct Runner {
    pub sim: Simulator,
    pub world: NetWorld,
    pub nodes: Vec<NodeId>,
    until: SimTime,
}

impl Runner {
    /// 构建网络并调度所有流；返回前路由表已经装好，gossip 已经启动
    pub fn new(spec: &ScenarioSpec) -> Result<Self, ScenarioError> {
        spec.validate()?;

        let net = Network::new(spec.routing.clone(), spec.queue, spec.candidate_set);
        let mut world = NetWorld::new(net);
        let mut sim = Simulator::default();

        let nodes = topo::build(&mut world, &spec.topology, LinkOpts::from(&spec.link));
        world.net.populate_routing_tables();
        world.net.start(&mut sim);

        for (idx, flow) in spec.flows.iter().enumerate() {
            let dst = world.net.addr_of(nodes[flow.dst]).ok_or_else(|| {
                ScenarioError::Invalid(format!("flow {idx}: node {} has no address", flow.dst))
            })?;
            let mut ev = BudgetFlow::from_spec(idx as u64, flow, dst);
            ev.src = nodes[flow.src];
            debug!(flow_id = idx, src = %ev.src, %dst, budget_us = ?ev.budget_us, "调度流");
            sim.schedule(SimTime::from_micros(flow.start_us), ev);
        }

        let until = match spec.until_ms {
            Some(ms) => SimTime::from_millis(ms),
            None => Self::drain_time(spec),
        };

        Ok(Self {
            sim,
            world,
            nodes,
            until,
        })
    }

    /// 最后一个包的注入时间加上排空余量
    fn drain_time(spec: &ScenarioSpec) -> SimTime {
        let last_us = spec
            .flows
            .iter()
            .map(|f| {
                f.pkts
                    .saturating_sub(1)
                    .saturating_mul(f.gap_us)
                    .saturating_add(f.start_us)
            })
            .max()
            .unwrap_or(0);
        SimTime::from_micros(last_us).saturating_add(SimTime::from_millis(DRAIN_SLACK_MS))
    }

    pub fn until(&self) -> SimTime {
        self.until
    }

    pub fn run(mut self) -> RunReport {
        info!(until = ?self.until, "🏁 开始仿真");
        self.sim.run_until(self.until, &mut self.world);
        self.world.net.shutdown(&mut self.sim);
        let report = RunReport {
            end_time_us: self.sim.now().as_micros(),
            nodes: self.world.net.node_count(),
            routes: self.world.net.routers().map(|r| r.routing().n_routes()).sum(),
            stats: self.world.net.stats.clone(),
        };
        info!(
            delivered = report.stats.delivered_pkts,
            dropped = report.stats.dropped(),
            "仿真结束"
        );
        report
    }
}
