// ==========================================
// 内存分析表
// ==========================================
// 历史条目的表格投影 + 两个派生列:
// - harvest_efficiency_pct = 产量 / (产量 + 损失) × 100
// - productivity_per_ha    = 产量 / 面积
// 分母为 0 时派生值记为 0
// ==========================================

use crate::domain::history::HistoryEntry;
use crate::domain::production::GpsCoordinates;
use crate::domain::types::HarvestType;
use crate::engine::stats::{mean, ratio_or_zero};
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::mem::size_of;

// ==========================================
// 列定义
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Timestamp,
    Text,
    Float,
    Category,
    Coordinates,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Timestamp => "timestamp",
            ColumnType::Text => "text",
            ColumnType::Float => "float",
            ColumnType::Category => "category",
            ColumnType::Coordinates => "coordinates",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const COLUMNS: [ColumnSpec; 10] = [
    ColumnSpec { name: "timestamp", column_type: ColumnType::Timestamp },
    ColumnSpec { name: "location", column_type: ColumnType::Text },
    ColumnSpec { name: "area_ha", column_type: ColumnType::Float },
    ColumnSpec { name: "production_tons", column_type: ColumnType::Float },
    ColumnSpec { name: "loss_tons", column_type: ColumnType::Float },
    ColumnSpec { name: "loss_percentage", column_type: ColumnType::Float },
    ColumnSpec { name: "harvest_type", column_type: ColumnType::Category },
    ColumnSpec { name: "coordinates", column_type: ColumnType::Coordinates },
    ColumnSpec { name: "harvest_efficiency_pct", column_type: ColumnType::Float },
    ColumnSpec { name: "productivity_per_ha", column_type: ColumnType::Float },
];

/// 可聚合的数值列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    AreaHa,
    ProductionTons,
    LossTons,
    LossPercentage,
    HarvestEfficiencyPct,
    ProductivityPerHa,
}

// ==========================================
// AnalyticsRow
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsRow {
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub area_ha: f64,
    pub production_tons: f64,
    pub loss_tons: f64,
    pub loss_percentage: f64,
    pub harvest_type: HarvestType,
    pub coordinates: Option<GpsCoordinates>,
    pub harvest_efficiency_pct: f64,
    pub productivity_per_ha: f64,
}

impl AnalyticsRow {
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            location: entry.location.clone(),
            area_ha: entry.area_ha,
            production_tons: entry.production_tons,
            loss_tons: entry.loss_tons,
            loss_percentage: entry.loss_percentage,
            harvest_type: entry.harvest_type,
            coordinates: entry.coordinates,
            harvest_efficiency_pct: ratio_or_zero(
                entry.production_tons,
                entry.production_tons + entry.loss_tons,
            ) * 100.0,
            productivity_per_ha: ratio_or_zero(entry.production_tons, entry.area_ha),
        }
    }

    pub fn value(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::AreaHa => self.area_ha,
            NumericColumn::ProductionTons => self.production_tons,
            NumericColumn::LossTons => self.loss_tons,
            NumericColumn::LossPercentage => self.loss_percentage,
            NumericColumn::HarvestEfficiencyPct => self.harvest_efficiency_pct,
            NumericColumn::ProductivityPerHa => self.productivity_per_ha,
        }
    }
}

// ==========================================
// AnalyticsTable
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalyticsTable {
    rows: Vec<AnalyticsRow>,
}

impl AnalyticsTable {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        Self {
            rows: entries.iter().map(AnalyticsRow::from_entry).collect(),
        }
    }

    pub fn columns() -> &'static [ColumnSpec] {
        &COLUMNS
    }

    pub fn column_names() -> Vec<String> {
        COLUMNS.iter().map(|c| c.name.to_string()).collect()
    }

    pub fn rows(&self) -> &[AnalyticsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sum(&self, column: NumericColumn) -> f64 {
        self.rows.iter().map(|r| r.value(column)).sum()
    }

    /// 列均值，空表返回 None
    pub fn mean(&self, column: NumericColumn) -> Option<f64> {
        let values: Vec<f64> = self.rows.iter().map(|r| r.value(column)).collect();
        mean(&values)
    }

    /// (最早, 最晚) 时间戳
    pub fn timestamp_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let earliest = self.rows.iter().map(|r| r.timestamp).min()?;
        let latest = self.rows.iter().map(|r| r.timestamp).max()?;
        Some((earliest, latest))
    }

    pub fn count_by_harvest_type(&self) -> BTreeMap<HarvestType, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.harvest_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_by_location(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.location.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// 按月份 (1~12) 统计行数，不区分年份
    pub fn count_by_month(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.timestamp.month()).or_insert(0) += 1;
        }
        counts
    }

    pub fn distinct_locations(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.location.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// 估算内存占用（字节）：行结构体大小 + 地块名称堆内存
    pub fn estimated_memory_bytes(&self) -> usize {
        self.rows
            .iter()
            .map(|r| size_of::<AnalyticsRow>() + r.location.capacity())
            .sum()
    }
}
