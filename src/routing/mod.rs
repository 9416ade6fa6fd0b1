//! 时延预算感知的单播路由
//!
//! - `lsdb` / `spf` / `manager`：链路状态库与最短路树，生成每个节点的候选路由表
//! - `nsdb` / `wire`：邻居拥塞状态 gossip 及其报文格式
//! - `gbr`：逐包选路（ECMP / KSHORT / DGR / DDR）

mod candidate;
mod config;
mod context;
mod entry;
mod error;
mod gbr;
mod lsdb;
mod manager;
mod nsdb;
mod spf;
mod table;
mod vertex;
mod wire;

pub use candidate::CandidateQueue;
pub use config::{CandidateSet, RouteSelectMode, RoutingConfig};
pub use context::{InterfaceAddress, NodeContext};
pub use entry::{DIST_INFINITY, RouteEntry};
pub use error::{RoutingError, WireError};
pub use gbr::{
    GbrRouting, GossipDatagram, InputVerdict, Ipv4Route, OutgoingGossip, PER_HOP_DELAY_US,
    remaining_budget,
};
pub use lsdb::{LinkKind, LinkRecord, Lsa, LsaKind, Lsdb};
pub use manager::RouteManager;
pub use nsdb::{MAX_OCCUPANCY, NeighborStatusDatabase, NeighborStatusEntry, StatusUnit};
pub use spf::{SpfTree, check_for_stub_node};
pub use table::RouteTable;
pub use vertex::{RootExit, Vertex, VertexId, VertexKind};
pub use wire::{
    Command, GOSSIP_GROUP, GOSSIP_PORT, GossipMessage, HEADER_SIZE, NSE_SIZE, Nse, max_nse,
    split_responses,
};
