// ==========================================
// 甘蔗收获损失估算系统 - 计算历史与分析
// ==========================================
// 职责: 追加式计算历史、按地块的最新结果缓存、
//       汇总统计、内存分析表、附近农场查询
// 红线: 历史只追加；分析表按需重建，不单独维护
// ==========================================
// 输入: (生产记录, 损失结果) 对
// 输出: 统计 / 分析表 / 报表
// ==========================================

mod core;
mod locations;
mod report;
mod table;

#[cfg(test)]
mod tests;

pub use core::{HistoryManager, SummaryStatistics, SYSTEM_VERSION};
pub use locations::{default_locations, find_nearby, NearbyLocation, RegisteredLocation};
pub use report::{FullReport, MemoryTableReport, NumericTotals, TableAnalysis, TableSummary};
pub use table::{AnalyticsRow, AnalyticsTable, ColumnSpec, ColumnType, NumericColumn};
