// ==========================================
// 甘蔗收获损失估算系统 - 计算历史条目
// ==========================================
// 职责: 追加式历史日志中的单条记录
// 红线: 只追加，不修改，不删除
// ==========================================

use crate::domain::loss::LossResult;
use crate::domain::production::{GpsCoordinates, ProductionRecord};
use crate::domain::types::HarvestType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub area_ha: f64,
    pub production_tons: f64,
    pub loss_tons: f64,
    pub loss_percentage: f64,
    pub harvest_type: HarvestType,
    pub coordinates: Option<GpsCoordinates>,
}

impl HistoryEntry {
    pub fn from_calculation(
        timestamp: NaiveDateTime,
        production: &ProductionRecord,
        result: &LossResult,
    ) -> Self {
        Self {
            timestamp,
            location: production.location.clone(),
            area_ha: production.planted_area_ha,
            production_tons: production.harvested_qty_tons,
            loss_tons: result.estimated_loss_tons,
            loss_percentage: result.loss_percentage,
            harvest_type: production.harvest_type,
            coordinates: production.gps_coordinates,
        }
    }
}
