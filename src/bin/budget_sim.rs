//! 时延预算路由仿真
//!
//! 从 scenario.json 读取拓扑、路由模式和流量；没有给出场景文件时，
//! 在一条链上跑一个带预算的流。

use clap::{Parser, ValueEnum};
use dgrsim_rs::routing::{RouteSelectMode, RoutingConfig};
use dgrsim_rs::runner::Runner;
use dgrsim_rs::sim::{FlowSpec, LinkSpec, ScenarioSpec, TopologySpec};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "budget-sim", about = "时延预算感知的逐包路由仿真")]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// 没有场景文件时使用的链长度
    #[arg(long, default_value_t = 3)]
    nodes: usize,

    /// Override route select mode
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Override every flow's latency budget (microseconds)
    #[arg(long)]
    budget_us: Option<u32>,

    /// Override the rng seed
    #[arg(long)]
    seed: Option<u64>,

    /// Run until this time (ms)
    #[arg(long)]
    until_ms: Option<u64>,

    /// Print every router's routing table before running
    #[arg(long)]
    print_routes: bool,

    /// Write run statistics as JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    None,
    Ecmp,
    Kshort,
    Dgr,
    Ddr,
}

impl From<Mode> for RouteSelectMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::None => RouteSelectMode::None,
            Mode::Ecmp => RouteSelectMode::Ecmp,
            Mode::Kshort => RouteSelectMode::KShort,
            Mode::Dgr => RouteSelectMode::Dgr,
            Mode::Ddr => RouteSelectMode::Ddr,
        }
    }
}

fn default_scenario(nodes: usize) -> ScenarioSpec {
    ScenarioSpec {
        schema_version: 1,
        topology: TopologySpec::Chain { nodes },
        link: LinkSpec::default(),
        routing: RoutingConfig::with_mode(RouteSelectMode::Dgr),
        candidate_set: Default::default(),
        queue: Default::default(),
        flows: vec![FlowSpec {
            src: 0,
            dst: nodes.saturating_sub(1),
            pkts: 100,
            pkt_bytes: 1000,
            gap_us: 1000,
            start_us: 0,
            budget_us: Some(5000),
            priority: false,
        }],
        until_ms: None,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut spec = match &args.scenario {
        Some(path) => ScenarioSpec::from_path(path).expect("load scenario.json"),
        None => default_scenario(args.nodes),
    };
    if let Some(mode) = args.mode {
        spec.routing.route_select_mode = mode.into();
    }
    if let Some(budget) = args.budget_us {
        for flow in &mut spec.flows {
            flow.budget_us = Some(budget);
        }
    }
    if let Some(seed) = args.seed {
        spec.routing.rng_seed = seed;
    }
    if args.until_ms.is_some() {
        spec.until_ms = args.until_ms;
    }

    let runner = Runner::new(&spec).expect("build scenario");
    if args.print_routes {
        println!("{}", runner.world.net.print_routing_tables(runner.sim.now()));
    }
    let report = runner.run();

    let s = &report.stats;
    println!(
        "mode={:?} nodes={} routes={} end_us={}",
        spec.routing.route_select_mode, report.nodes, report.routes, report.end_time_us
    );
    println!(
        "delivered={} within_budget={} budget_missed={} mean_latency_us={:.1} max_latency_us={}",
        s.delivered_pkts,
        s.within_budget,
        s.budget_missed,
        s.mean_latency_us(),
        s.latency_max_us
    );
    println!(
        "dropped={} (queue={} no_route={} ttl={} if_down={}) gossip_sent={} gossip_received={}",
        s.dropped(),
        s.dropped_queue,
        s.dropped_no_route,
        s.dropped_ttl,
        s.dropped_if_down,
        s.gossip_sent,
        s.gossip_received
    );

    if let Some(path) = &args.stats_json {
        let json = serde_json::to_string_pretty(&report).expect("serialize stats");
        fs::write(path, json).expect("write stats json");
    }
}
