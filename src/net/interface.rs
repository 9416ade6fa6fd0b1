//! 路由器接口
//!
//! 接口 0 固定为 loopback；其余接口各自对应一条出方向链路。

use std::net::Ipv4Addr;

use super::id::LinkId;
use crate::routing::InterfaceAddress;

pub const LOOPBACK_MTU: u16 = 16_436;
pub const P2P_MTU: u16 = 1_500;

#[derive(Debug, Clone)]
pub struct Interface {
    pub addresses: Vec<InterfaceAddress>,
    pub up: bool,
    pub forwarding: bool,
    pub mtu: u16,
    pub loopback: bool,
    /// 出方向链路
    pub link: Option<LinkId>,
}

impl Interface {
    pub fn loopback() -> Self {
        Self {
            addresses: vec![InterfaceAddress::new(
                Ipv4Addr::LOCALHOST,
                Ipv4Addr::new(255, 0, 0, 0),
            )],
            up: true,
            forwarding: false,
            mtu: LOOPBACK_MTU,
            loopback: true,
            link: None,
        }
    }

    pub fn point_to_point(addr: InterfaceAddress, link: LinkId) -> Self {
        Self {
            addresses: vec![addr],
            up: true,
            forwarding: false,
            mtu: P2P_MTU,
            loopback: false,
            link: Some(link),
        }
    }

    pub fn primary(&self) -> Option<InterfaceAddress> {
        self.addresses.first().copied()
    }
}
