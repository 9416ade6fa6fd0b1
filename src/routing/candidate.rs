//! SPF 候选队列
//!
//! 与二叉堆不同，可以按顶点查找条目，并在原地降低距离后整体重排。
//! 排序键为（距离，network 先于 router，插入顺序），出队顺序是确定的。

use std::net::Ipv4Addr;

use super::vertex::{Vertex, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    distance: u32,
    rank: u8,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct CandidateQueue {
    // 按键升序
    entries: Vec<(Key, VertexId)>,
    next_seq: u64,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, arena: &[Vertex], v: VertexId) {
        let vx = &arena[v.0];
        let key = Key {
            distance: vx.distance,
            rank: vx.kind.rank(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let pos = self.entries.partition_point(|(k, _)| *k < key);
        self.entries.insert(pos, (key, v));
    }

    pub fn pop(&mut self) -> Option<VertexId> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries.remove(0).1)
    }

    pub fn top(&self) -> Option<VertexId> {
        self.entries.first().map(|(_, v)| *v)
    }

    pub fn find(&self, arena: &[Vertex], addr: Ipv4Addr) -> Option<VertexId> {
        self.entries
            .iter()
            .map(|(_, v)| *v)
            .find(|v| arena[v.0].id == addr)
    }

    /// 距离在 arena 中被修改后，刷新键并重排
    pub fn reorder(&mut self, arena: &[Vertex]) {
        for (key, v) in self.entries.iter_mut() {
            key.distance = arena[v.0].distance;
        }
        self.entries.sort_by_key(|(k, _)| *k);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
