//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：路由器、接口、链路、数据包和网络拓扑，
//! 以及驱动它们的仿真事件（到达、链路就绪、gossip 定时器）。

// 子模块声明
mod deliver_packet;
mod gossip_timer;
mod id;
mod interface;
mod link;
mod link_ready;
mod net_world;
mod network;
mod packet;
mod router;
mod stats;

// 重新导出公共接口
pub use deliver_packet::DeliverPacket;
pub use gossip_timer::GossipTimer;
pub use id::{LinkId, NodeId};
pub use interface::{Interface, LOOPBACK_MTU, P2P_MTU};
pub use link::Link;
pub use link_ready::LinkReady;
pub use net_world::NetWorld;
pub use network::Network;
pub use packet::{DEFAULT_TTL, Packet, PacketTags, Payload};
pub use router::{NodeView, Router};
pub use stats::Stats;
