//! 路由表项
//!
//! 表项创建后不可修改；更新通过删除再插入完成。

use std::fmt;
use std::net::Ipv4Addr;

/// "未知 / 不可达" 距离
pub const DIST_INFINITY: u32 = u32::MAX;

const HOST_MASK: Ipv4Addr = Ipv4Addr::BROADCAST;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteEntry {
    dest: Ipv4Addr,
    mask: Ipv4Addr,
    gateway: Ipv4Addr,
    interface: u32,
    /// 下一跳节点自己的出接口；直连的一跳目的地没有，为 None
    next_iface: Option<u32>,
    distance: u32,
}

impl RouteEntry {
    pub fn host_route_to(
        dest: Ipv4Addr,
        gateway: Ipv4Addr,
        interface: u32,
        next_iface: Option<u32>,
        distance: u32,
    ) -> Self {
        Self {
            dest,
            mask: HOST_MASK,
            gateway,
            interface,
            next_iface,
            distance,
        }
    }

    pub fn network_route_to(
        network: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Ipv4Addr,
        interface: u32,
        next_iface: Option<u32>,
        distance: u32,
    ) -> Self {
        let network = Ipv4Addr::from(u32::from(network) & u32::from(mask));
        Self {
            dest: network,
            mask,
            gateway,
            interface,
            next_iface,
            distance,
        }
    }

    pub fn default_route(gateway: Ipv4Addr, interface: u32) -> Self {
        Self::network_route_to(
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::UNSPECIFIED,
            gateway,
            interface,
            None,
            DIST_INFINITY,
        )
    }

    pub fn dest(&self) -> Ipv4Addr {
        self.dest
    }

    pub fn mask(&self) -> Ipv4Addr {
        self.mask
    }

    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway
    }

    pub fn interface(&self) -> u32 {
        self.interface
    }

    pub fn next_iface(&self) -> Option<u32> {
        self.next_iface
    }

    pub fn distance(&self) -> u32 {
        self.distance
    }

    pub fn is_host(&self) -> bool {
        self.mask == HOST_MASK
    }

    pub fn is_default(&self) -> bool {
        self.dest == Ipv4Addr::UNSPECIFIED && self.mask == Ipv4Addr::UNSPECIFIED
    }

    pub fn is_network(&self) -> bool {
        !self.is_host()
    }

    pub fn is_gateway(&self) -> bool {
        self.gateway != Ipv4Addr::UNSPECIFIED
    }

    /// 目的地址是否落在本表项覆盖范围内
    pub fn matches(&self, addr: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(addr) & mask == u32::from(self.dest)
    }

    /// U / H / G 标志位
    pub fn flags(&self) -> String {
        let mut f = String::from("U");
        if self.is_host() {
            f.push('H');
        }
        if self.is_gateway() {
            f.push('G');
        }
        f
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "default")?;
        } else if self.is_host() {
            write!(f, "host={}", self.dest)?;
        } else {
            write!(f, "network={}/{}", self.dest, self.mask)?;
        }
        if self.is_gateway() {
            write!(f, " via {}", self.gateway)?;
        }
        write!(f, " out={}", self.interface)?;
        if let Some(n) = self.next_iface {
            write!(f, " next_if={n}")?;
        }
        if self.distance != DIST_INFINITY {
            write!(f, " dist={}", self.distance)?;
        }
        Ok(())
    }
}
