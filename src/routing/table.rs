//! 路由表
//!
//! 按 host / network / external 三类存放表项，对外提供一个跨三类的扁平下标。
//! 按目的查找是线性扫描，中等规模拓扑下足够。

use std::fmt;
use std::net::Ipv4Addr;

use super::entry::{DIST_INFINITY, RouteEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    host_routes: Vec<RouteEntry>,
    network_routes: Vec<RouteEntry>,
    external_routes: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host_route(&mut self, e: RouteEntry) {
        debug_assert!(e.is_host());
        self.host_routes.push(e);
    }

    pub fn add_network_route(&mut self, e: RouteEntry) {
        self.network_routes.push(e);
    }

    pub fn add_external_route(&mut self, e: RouteEntry) {
        self.external_routes.push(e);
    }

    pub fn n_routes(&self) -> usize {
        self.host_routes.len() + self.network_routes.len() + self.external_routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_routes() == 0
    }

    /// 扁平下标：先 host，再 network，最后 external
    pub fn get(&self, mut index: usize) -> Option<&RouteEntry> {
        for part in [&self.host_routes, &self.network_routes, &self.external_routes] {
            if index < part.len() {
                return part.get(index);
            }
            index -= part.len();
        }
        None
    }

    pub fn remove(&mut self, mut index: usize) -> Option<RouteEntry> {
        for part in [
            &mut self.host_routes,
            &mut self.network_routes,
            &mut self.external_routes,
        ] {
            if index < part.len() {
                return Some(part.remove(index));
            }
            index -= part.len();
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.host_routes
            .iter()
            .chain(self.network_routes.iter())
            .chain(self.external_routes.iter())
    }

    pub fn host_routes(&self) -> &[RouteEntry] {
        &self.host_routes
    }

    pub fn network_routes(&self) -> &[RouteEntry] {
        &self.network_routes
    }

    pub fn external_routes(&self) -> &[RouteEntry] {
        &self.external_routes
    }

    /// 指向 `dest` 的所有 host 表项（选路模式在此之上过滤）
    pub fn host_routes_to(&self, dest: Ipv4Addr) -> impl Iterator<Item = &RouteEntry> {
        self.host_routes.iter().filter(move |e| e.dest() == dest)
    }

    pub fn clear(&mut self) {
        self.host_routes.clear();
        self.network_routes.clear();
        self.external_routes.clear();
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        writeln!(
            f,
            "{:<16}{:<16}{:<6}{:<8}{:<6}{}",
            "Destination", "Gateway", "Flags", "Metric", "Iface", "NextIface"
        )?;
        for e in self.iter() {
            let metric = if e.distance() == DIST_INFINITY {
                "-".to_string()
            } else {
                e.distance().to_string()
            };
            let next = e
                .next_iface()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<16}{:<16}{:<6}{:<8}{:<6}{}",
                e.dest().to_string(),
                e.gateway().to_string(),
                e.flags(),
                metric,
                e.interface(),
                next
            )?;
        }
        Ok(())
    }
}
