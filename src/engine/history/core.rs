// ==========================================
// 甘蔗收获损失估算系统 - 计算历史管理器
// ==========================================
// 职责: 追加历史、刷新地块缓存、汇总统计
// 红线: 历史只追加；空历史必须显式返回 EmptyHistory
// ==========================================

use crate::config::EngineSettings;
use crate::domain::history::HistoryEntry;
use crate::domain::loss::LossResult;
use crate::domain::production::ProductionRecord;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::{mean, min_max};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::locations::{default_locations, find_nearby, NearbyLocation, RegisteredLocation};
use super::table::AnalyticsTable;

/// 系统版本 (major, minor, patch)
pub const SYSTEM_VERSION: (u32, u32, u32) = (1, 0, 0);

// ==========================================
// SummaryStatistics - 历史汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_count: usize,
    pub mean_loss_tons: f64,
    pub max_loss_tons: f64,
    pub min_loss_tons: f64,
    pub mean_loss_percentage: f64,
    pub total_production_tons: f64,
    pub distinct_locations: usize,
}

// ==========================================
// HistoryManager
// ==========================================
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    latest_by_location: HashMap<String, LossResult>,
    settings: EngineSettings,
    registered_locations: Vec<RegisteredLocation>,
}

impl HistoryManager {
    /// 使用内置参考农场
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_locations(settings, default_locations())
    }

    pub fn with_locations(settings: EngineSettings, locations: Vec<RegisteredLocation>) -> Self {
        Self {
            entries: Vec::new(),
            latest_by_location: HashMap::new(),
            settings,
            registered_locations: locations,
        }
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 以当前本地时间记录一次计算
    pub fn record(&mut self, production: &ProductionRecord, result: &LossResult) {
        self.record_at(Local::now().naive_local(), production, result);
    }

    /// 以指定时间记录一次计算
    pub fn record_at(
        &mut self,
        timestamp: NaiveDateTime,
        production: &ProductionRecord,
        result: &LossResult,
    ) {
        self.entries
            .push(HistoryEntry::from_calculation(timestamp, production, result));
        self.latest_by_location
            .insert(production.location.clone(), result.clone());

        info!(
            location = %production.location,
            total = self.entries.len(),
            "计算已加入历史"
        );
    }

    /// 追加已持久化的历史条目（如从数据库恢复），不刷新地块缓存
    pub fn replay(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 某地块最近一次计算结果
    pub fn latest_result(&self, location: &str) -> Option<&LossResult> {
        self.latest_by_location.get(location)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registered_locations(&self) -> &[RegisteredLocation] {
        &self.registered_locations
    }

    /// 查找半径内的登记农场（按距离升序）
    pub fn find_nearby(&self, latitude: f64, longitude: f64, radius_km: f64) -> Vec<NearbyLocation> {
        let nearby = find_nearby(&self.registered_locations, latitude, longitude, radius_km);
        debug!(
            latitude,
            longitude,
            radius_km,
            found = nearby.len(),
            "附近农场查询"
        );
        nearby
    }

    // ==========================================
    // 统计
    // ==========================================

    /// 历史汇总统计
    ///
    /// # 错误
    /// 历史为空时返回 `EngineError::EmptyHistory`
    pub fn summary_statistics(&self) -> EngineResult<SummaryStatistics> {
        let losses: Vec<f64> = self.entries.iter().map(|e| e.loss_tons).collect();
        let percentages: Vec<f64> = self.entries.iter().map(|e| e.loss_percentage).collect();

        let (min_loss_tons, max_loss_tons) = min_max(&losses)
            .ok_or_else(|| EngineError::EmptyHistory("暂无计算记录".to_string()))?;

        let distinct_locations = self
            .entries
            .iter()
            .map(|e| e.location.as_str())
            .collect::<HashSet<_>>()
            .len();

        Ok(SummaryStatistics {
            total_count: self.entries.len(),
            mean_loss_tons: mean(&losses).unwrap_or_default(),
            max_loss_tons,
            min_loss_tons,
            mean_loss_percentage: mean(&percentages).unwrap_or_default(),
            total_production_tons: self.entries.iter().map(|e| e.production_tons).sum(),
            distinct_locations,
        })
    }

    /// 重建内存分析表（空历史得到空表）
    pub fn build_analytics_table(&self) -> AnalyticsTable {
        let table = AnalyticsTable::from_entries(&self.entries);
        debug!(rows = table.len(), "分析表已重建");
        table
    }
}
