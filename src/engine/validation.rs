// ==========================================
// 甘蔗收获损失估算系统 - 生产记录校验
// ==========================================
// 职责: 收集生产记录的全部违规项（不止第一个）
// 说明: 收获方式为强类型枚举，非法取值在解析阶段即被拒绝
// ==========================================

use crate::domain::production::ProductionRecord;
use crate::engine::error::{EngineError, EngineResult};

/// 校验生产记录
///
/// # 返回
/// 违规描述列表（为空表示合法）
pub fn validate_production(record: &ProductionRecord) -> Vec<String> {
    let mut violations = Vec::new();

    if record.location.trim().is_empty() {
        violations.push("地块位置不能为空".to_string());
    }

    if !(record.planted_area_ha.is_finite() && record.planted_area_ha > 0.0) {
        violations.push(format!(
            "种植面积必须大于 0，实际为 {}",
            record.planted_area_ha
        ));
    }

    if !(record.harvested_qty_tons.is_finite() && record.harvested_qty_tons >= 0.0) {
        violations.push(format!(
            "收获量不能为负数，实际为 {}",
            record.harvested_qty_tons
        ));
    }

    if let Some(m) = record.soil_moisture_pct {
        if !(0.0..=100.0).contains(&m) {
            violations.push(format!("土壤湿度必须在 0~100% 之间，实际为 {}", m));
        }
    }

    if record.cane_age_months == Some(0) {
        violations.push("蔗龄必须大于 0".to_string());
    }

    if let Some(t) = record.avg_temperature_c {
        if !t.is_finite() {
            violations.push("平均温度不是有效数值".to_string());
        }
    }

    if let Some(p) = record.precipitation_mm {
        if !(p.is_finite() && p >= 0.0) {
            violations.push(format!("降水量不能为负数，实际为 {}", p));
        }
    }

    violations
}

/// 校验生产记录，存在违规时返回 InvalidInput
pub fn ensure_valid_production(record: &ProductionRecord) -> EngineResult<()> {
    let violations = validate_production(record);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(violations.join("; ")))
    }
}
