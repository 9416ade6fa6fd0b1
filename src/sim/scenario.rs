//! 场景描述（scenario.json）
//!
//! 一次仿真运行由拓扑、链路参数、路由/队列配置和若干带预算的流组成。

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::QueueConfig;
use crate::routing::{CandidateSet, RoutingConfig};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub topology: TopologySpec,
    #[serde(default)]
    pub link: LinkSpec,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub candidate_set: CandidateSet,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    /// 仿真运行到多少毫秒；缺省时运行到最后一个流结束后再留一段排空时间
    #[serde(default)]
    pub until_ms: Option<u64>,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    Chain { nodes: usize },
    Diamond,
    Grid { rows: usize, cols: usize },
    FatTree { k: usize },
}

impl TopologySpec {
    /// 拓扑中的节点数（与 topo 模块的构建顺序一致）
    pub fn node_count(&self) -> usize {
        match *self {
            TopologySpec::Chain { nodes } => nodes,
            TopologySpec::Diamond => 4,
            TopologySpec::Grid { rows, cols } => rows.saturating_mul(cols),
            TopologySpec::FatTree { k } => {
                let half = k / 2;
                // core + (edge + agg) + hosts
                half * half + k * k + k * half * half
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    #[serde(default = "default_bandwidth_mbps")]
    pub bandwidth_mbps: u64,
    /// 单向链路传播时延（微秒）
    #[serde(default = "default_latency_us")]
    pub latency_us: u64,
}

fn default_bandwidth_mbps() -> u64 {
    10
}

fn default_latency_us() -> u64 {
    100
}

impl Default for LinkSpec {
    fn default() -> Self {
        Self {
            bandwidth_mbps: default_bandwidth_mbps(),
            latency_us: default_latency_us(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSpec {
    pub src: usize,
    pub dst: usize,
    #[serde(default = "default_pkts")]
    pub pkts: u64,
    #[serde(default = "default_pkt_bytes")]
    pub pkt_bytes: u32,
    #[serde(default = "default_gap_us")]
    pub gap_us: u64,
    #[serde(default)]
    pub start_us: u64,
    /// 端到端时延预算（微秒）；缺省时按最短路转发
    #[serde(default)]
    pub budget_us: Option<u32>,
    /// 标记为时延敏感流量（进入拥塞队列的 band 0）
    #[serde(default)]
    pub priority: bool,
}

fn default_pkts() -> u64 {
    100
}

fn default_pkt_bytes() -> u32 {
    1000
}

fn default_gap_us() -> u64 {
    1000
}

impl ScenarioSpec {
    pub fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        match self.topology {
            TopologySpec::Chain { nodes } if nodes < 2 => {
                return Err(ScenarioError::Invalid(format!(
                    "chain needs at least 2 nodes, got {nodes}"
                )));
            }
            TopologySpec::Grid { rows, cols } if rows == 0 || cols == 0 => {
                return Err(ScenarioError::Invalid(format!(
                    "grid dimensions must be non-zero, got {rows}x{cols}"
                )));
            }
            TopologySpec::FatTree { k } if k < 2 || k % 2 != 0 => {
                return Err(ScenarioError::Invalid(format!(
                    "fat-tree k must be even and >= 2, got {k}"
                )));
            }
            _ => {}
        }
        if self.link.bandwidth_mbps == 0 {
            return Err(ScenarioError::Invalid("link bandwidth must be non-zero".into()));
        }
        if self.routing.sample_period_us == 0 {
            return Err(ScenarioError::Invalid("sample period must be non-zero".into()));
        }
        let n = self.topology.node_count();
        for (idx, flow) in self.flows.iter().enumerate() {
            if flow.src >= n || flow.dst >= n {
                return Err(ScenarioError::Invalid(format!(
                    "flow {idx} references node outside 0..{n} (src={}, dst={})",
                    flow.src, flow.dst
                )));
            }
            if flow.src == flow.dst {
                return Err(ScenarioError::Invalid(format!(
                    "flow {idx} has identical src and dst {}",
                    flow.src
                )));
            }
        }
        Ok(())
    }
}
