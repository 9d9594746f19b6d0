// ==========================================
// 历史报表
// ==========================================
// full_report          - 系统信息 + 汇总 + 分析表概要（空历史也可生成）
// memory_table_report  - 分析表详细报表（空历史返回 EmptyHistory）
// ==========================================

use crate::config::EngineSettings;
use crate::domain::types::HarvestType;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use super::core::{HistoryManager, SummaryStatistics, SYSTEM_VERSION};
use super::table::{AnalyticsTable, ColumnType, NumericColumn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// ==========================================
// FullReport
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullReport {
    pub system_version: (u32, u32, u32),
    pub settings: EngineSettings,
    /// 历史为空时为 None
    pub statistics: Option<SummaryStatistics>,
    pub registered_locations: usize,
    pub history_len: usize,
    /// 历史为空时为 None
    pub table_analysis: Option<TableAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableAnalysis {
    pub columns: Vec<String>,
    pub harvest_type_counts: BTreeMap<HarvestType, usize>,
    pub mean_efficiency_pct: f64,
    pub mean_productivity_per_ha: f64,
    pub period: (NaiveDateTime, NaiveDateTime),
}

// ==========================================
// MemoryTableReport
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryTableReport {
    pub summary: TableSummary,
    pub totals: NumericTotals,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    /// 月份 (1~12) → 行数
    pub rows_per_month: BTreeMap<u32, usize>,
    pub distinct_locations: usize,
    pub rows_per_location: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub total_rows: usize,
    pub columns: Vec<String>,
    pub column_types: BTreeMap<String, ColumnType>,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericTotals {
    pub total_production_tons: f64,
    pub total_loss_tons: f64,
    pub total_area_ha: f64,
    pub mean_efficiency_pct: f64,
    pub mean_productivity_per_ha: f64,
}

impl HistoryManager {
    /// 综合报表
    pub fn full_report(&self) -> FullReport {
        let table = self.build_analytics_table();

        FullReport {
            system_version: SYSTEM_VERSION,
            settings: self.settings().clone(),
            statistics: self.summary_statistics().ok(),
            registered_locations: self.registered_locations().len(),
            history_len: self.len(),
            table_analysis: table_analysis(&table),
        }
    }

    /// 内存分析表报表
    ///
    /// # 错误
    /// 历史为空时返回 `EngineError::EmptyHistory`
    pub fn memory_table_report(&self) -> EngineResult<MemoryTableReport> {
        let table = self.build_analytics_table();
        let (period_start, period_end) = table
            .timestamp_range()
            .ok_or_else(|| EngineError::EmptyHistory("分析表中没有数据".to_string()))?;

        let column_types = AnalyticsTable::columns()
            .iter()
            .map(|c| (c.name.to_string(), c.column_type))
            .collect();

        Ok(MemoryTableReport {
            summary: TableSummary {
                total_rows: table.len(),
                columns: AnalyticsTable::column_names(),
                column_types,
                memory_mb: table.estimated_memory_bytes() as f64 / BYTES_PER_MB,
            },
            totals: NumericTotals {
                total_production_tons: table.sum(NumericColumn::ProductionTons),
                total_loss_tons: table.sum(NumericColumn::LossTons),
                total_area_ha: table.sum(NumericColumn::AreaHa),
                mean_efficiency_pct: table
                    .mean(NumericColumn::HarvestEfficiencyPct)
                    .unwrap_or_default(),
                mean_productivity_per_ha: table
                    .mean(NumericColumn::ProductivityPerHa)
                    .unwrap_or_default(),
            },
            period_start,
            period_end,
            rows_per_month: table.count_by_month(),
            distinct_locations: table.distinct_locations(),
            rows_per_location: table.count_by_location(),
        })
    }
}

fn table_analysis(table: &AnalyticsTable) -> Option<TableAnalysis> {
    let period = table.timestamp_range()?;
    Some(TableAnalysis {
        columns: AnalyticsTable::column_names(),
        harvest_type_counts: table.count_by_harvest_type(),
        mean_efficiency_pct: table.mean(NumericColumn::HarvestEfficiencyPct)?,
        mean_productivity_per_ha: table.mean(NumericColumn::ProductivityPerHa)?,
        period,
    })
}
