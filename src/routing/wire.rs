//! gossip 报文格式
//!
//! ```text
//! +---------+---------+-------------------+
//! | command | version |  NSE count (BE)   |   4 字节头部
//! +---------+---------+-------------------+
//! |       interface index (u32, BE)       |
//! +---------+-----------------------------+   每个 NSE 8 字节
//! |  state  |        reserved (0)         |
//! +---------+-----------------------------+
//! ```

use std::net::Ipv4Addr;

use bytes::Bytes;

use super::error::WireError;

/// gossip 固定端口
pub const GOSSIP_PORT: u16 = 666;
/// gossip 组播组
pub const GOSSIP_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 13);

pub const GOSSIP_VERSION: u8 = 1;
pub const HEADER_SIZE: usize = 4;
pub const NSE_SIZE: usize = 8;

const IPV4_HEADER: usize = 20;
const UDP_HEADER: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 保留：不发送，收到时忽略
    Request,
    Response,
    Unknown(u8),
}

impl From<u8> for Command {
    fn from(v: u8) -> Self {
        match v {
            1 => Command::Request,
            2 => Command::Response,
            other => Command::Unknown(other),
        }
    }
}

impl From<Command> for u8 {
    fn from(c: Command) -> u8 {
        match c {
            Command::Request => 1,
            Command::Response => 2,
            Command::Unknown(v) => v,
        }
    }
}

/// 网络状态条目：发送方某个接口的占用等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nse {
    pub interface: u32,
    pub state: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipMessage {
    pub command: Command,
    pub nses: Vec<Nse>,
}

impl GossipMessage {
    pub fn response(nses: Vec<Nse>) -> Self {
        Self {
            command: Command::Response,
            nses,
        }
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.nses.len() * NSE_SIZE
    }

    pub fn encode(&self) -> Result<Bytes, WireError> {
        let count = u16::try_from(self.nses.len()).map_err(|_| WireError::TooManyEntries {
            count: self.nses.len(),
            max: u16::MAX as usize,
        })?;
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(u8::from(self.command));
        buf.push(GOSSIP_VERSION);
        buf.extend_from_slice(&count.to_be_bytes());
        for nse in &self.nses {
            buf.extend_from_slice(&nse.interface.to_be_bytes());
            buf.push(nse.state);
            buf.extend_from_slice(&[0, 0, 0]);
        }
        Ok(Bytes::from(buf))
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < HEADER_SIZE {
            return Err(WireError::Truncated {
                needed: HEADER_SIZE,
                available: data.len(),
            });
        }
        let command = Command::from(data[0]);
        if data[1] != GOSSIP_VERSION {
            return Err(WireError::UnsupportedVersion(data[1]));
        }
        let count = u16::from_be_bytes([data[2], data[3]]) as usize;
        let needed = HEADER_SIZE + count * NSE_SIZE;
        if data.len() < needed {
            return Err(WireError::Truncated {
                needed,
                available: data.len(),
            });
        }
        let nses = data[HEADER_SIZE..needed]
            .chunks_exact(NSE_SIZE)
            .map(|c| Nse {
                interface: u32::from_be_bytes([c[0], c[1], c[2], c[3]]),
                state: c[4],
            })
            .collect();
        Ok(Self { command, nses })
    }
}

/// 给定 MTU 下一个报文能放多少条 NSE
pub fn max_nse(mtu: u16) -> usize {
    (mtu as usize).saturating_sub(IPV4_HEADER + UDP_HEADER + HEADER_SIZE) / NSE_SIZE
}

/// 按 MTU 把 `nses` 切成若干 RESPONSE 报文
pub fn split_responses(nses: &[Nse], mtu: u16) -> Vec<GossipMessage> {
    let per_msg = max_nse(mtu).max(1);
    nses.chunks(per_msg)
        .map(|c| GossipMessage::response(c.to_vec()))
        .collect()
}
