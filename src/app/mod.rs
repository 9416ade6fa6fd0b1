//! 流量源
//!
//! 源端只负责按固定间隔注入携带 Budget / Timestamp / Priority 标签的 packet；
//! 汇端的统计由 `Network::on_delivered` 完成。

mod budget_flow;

pub use budget_flow::BudgetFlow;
