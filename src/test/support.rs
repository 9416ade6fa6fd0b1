//! 路由协议测试用的节点桩

use std::net::Ipv4Addr;

use crate::queue::{CongestionSignal, DELAY_PER_OCCUPANCY_US};
use crate::routing::{InterfaceAddress, NodeContext};

pub const P2P_MASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 252);

/// 固定占用率的拥塞信号
#[derive(Debug, Clone, Copy)]
pub struct FixedSignal(pub u8);

impl CongestionSignal for FixedSignal {
    fn occupancy_ratio(&self) -> u8 {
        self.0
    }

    fn estimated_delay(&self) -> u32 {
        u32::from(self.0) * DELAY_PER_OCCUPANCY_US
    }
}

#[derive(Debug, Clone)]
pub struct FakeIface {
    pub addresses: Vec<InterfaceAddress>,
    pub up: bool,
    pub forwarding: bool,
    pub loopback: bool,
    pub mtu: u16,
    pub signal: Option<FixedSignal>,
}

/// 接口 0 是 loopback，之后每个接口一个 /30 地址
#[derive(Debug, Clone)]
pub struct FakeNode {
    pub ifaces: Vec<FakeIface>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self {
            ifaces: vec![FakeIface {
                addresses: vec![InterfaceAddress::new(
                    Ipv4Addr::LOCALHOST,
                    Ipv4Addr::new(255, 0, 0, 0),
                )],
                up: true,
                forwarding: false,
                loopback: true,
                mtu: 16_436,
                signal: None,
            }],
        }
    }

    pub fn with_p2p(mut self, addr: Ipv4Addr) -> Self {
        self.ifaces.push(FakeIface {
            addresses: vec![InterfaceAddress::new(addr, P2P_MASK)],
            up: true,
            forwarding: false,
            loopback: false,
            mtu: 1_500,
            signal: Some(FixedSignal(0)),
        });
        self
    }

    pub fn set_occupancy(&mut self, iface: u32, ratio: u8) {
        self.ifaces[iface as usize].signal = Some(FixedSignal(ratio));
    }
}

impl NodeContext for FakeNode {
    fn n_interfaces(&self) -> u32 {
        self.ifaces.len() as u32
    }

    fn is_up(&self, iface: u32) -> bool {
        self.ifaces.get(iface as usize).is_some_and(|i| i.up)
    }

    fn is_forwarding(&self, iface: u32) -> bool {
        self.ifaces.get(iface as usize).is_some_and(|i| i.forwarding)
    }

    fn set_forwarding(&mut self, iface: u32, enabled: bool) {
        if let Some(i) = self.ifaces.get_mut(iface as usize) {
            i.forwarding = enabled;
        }
    }

    fn is_loopback(&self, iface: u32) -> bool {
        self.ifaces.get(iface as usize).is_some_and(|i| i.loopback)
    }

    fn mtu(&self, iface: u32) -> u16 {
        self.ifaces.get(iface as usize).map(|i| i.mtu).unwrap_or(0)
    }

    fn addresses(&self, iface: u32) -> Vec<InterfaceAddress> {
        self.ifaces
            .get(iface as usize)
            .map(|i| i.addresses.clone())
            .unwrap_or_default()
    }

    fn congestion(&self, iface: u32) -> Option<&dyn CongestionSignal> {
        self.ifaces
            .get(iface as usize)?
            .signal
            .as_ref()
            .map(|s| s as &dyn CongestionSignal)
    }
}
