//! 路由协议从所在节点获取的服务
//!
//! 协议本身不持有接口和队列，只通过这个 trait 访问；网络层在路由器的接口列表
//! 和链路出口队列之上实现它。

use std::net::Ipv4Addr;

use crate::queue::CongestionSignal;

/// 绑定在接口上的地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub local: Ipv4Addr,
    pub mask: Ipv4Addr,
}

impl InterfaceAddress {
    pub fn new(local: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Self { local, mask }
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.local) & u32::from(self.mask))
    }

    /// host 作用域地址（loopback）
    pub fn is_host_scope(&self) -> bool {
        self.local.is_loopback()
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(addr) & mask == u32::from(self.local) & mask
    }
}

pub trait NodeContext {
    fn n_interfaces(&self) -> u32;

    fn is_up(&self, iface: u32) -> bool;

    fn is_forwarding(&self, iface: u32) -> bool;

    fn set_forwarding(&mut self, iface: u32, enabled: bool);

    fn is_loopback(&self, iface: u32) -> bool;

    fn mtu(&self, iface: u32) -> u16;

    fn addresses(&self, iface: u32) -> Vec<InterfaceAddress>;

    /// 接口出口队列的拥塞信号（如果有）
    fn congestion(&self, iface: u32) -> Option<&dyn CongestionSignal>;

    fn interface_for_address(&self, addr: Ipv4Addr) -> Option<u32> {
        (0..self.n_interfaces())
            .find(|&i| self.addresses(i).iter().any(|a| a.local == addr))
    }

    /// 从 `iif` 收到发往 `addr` 的包是否本地交付
    fn is_destination_address(&self, addr: Ipv4Addr, _iif: u32) -> bool {
        self.interface_for_address(addr).is_some()
    }

    /// 接口的第一个地址，作为转发包的源地址
    fn source_address(&self, iface: u32) -> Ipv4Addr {
        self.addresses(iface)
            .first()
            .map(|a| a.local)
            .unwrap_or(Ipv4Addr::UNSPECIFIED)
    }

    /// 本地排队时延估计（微秒）；没有拥塞信号的接口为 0
    fn local_delay(&self, iface: u32) -> u32 {
        self.congestion(iface)
            .map(|s| s.estimated_delay())
            .unwrap_or(0)
    }
}
