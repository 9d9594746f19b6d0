// ==========================================
// 甘蔗收获损失估算系统 - 损失报表行
// ==========================================
// 职责: 数据库报表视图 (v_loss_report) 的行结构及合计
// ==========================================

use crate::domain::loss::LossResult;
use crate::domain::types::{CalculationMethod, HarvestType};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 报表中的一行（一次损失计算）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossReportRow {
    pub production_id: i64,
    pub location: String,
    pub harvest_date: NaiveDate,
    pub harvest_type: HarvestType,
    pub harvested_qty_tons: f64,
    pub planted_area_ha: f64,
    pub productivity_t_ha: Option<f64>,
    pub estimated_loss_tons: f64,
    pub loss_percentage: f64,
    pub calculation_method: CalculationMethod,
    pub calculated_at: NaiveDateTime,
}

/// 已保存的损失计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLoss {
    pub id: i64,
    pub production_id: i64,
    #[serde(flatten)]
    pub result: LossResult,
    pub calculated_at: NaiveDateTime,
}

/// 报表合计
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LossReportTotals {
    pub rows: usize,
    pub total_production_tons: f64,
    pub total_loss_tons: f64,
    pub mean_loss_percentage: f64,
}

impl LossReportTotals {
    pub fn from_rows(rows: &[LossReportRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }

        Self {
            rows: rows.len(),
            total_production_tons: rows.iter().map(|r| r.harvested_qty_tons).sum(),
            total_loss_tons: rows.iter().map(|r| r.estimated_loss_tons).sum(),
            mean_loss_percentage: rows.iter().map(|r| r.loss_percentage).sum::<f64>()
                / rows.len() as f64,
        }
    }
}
