// ==========================================
// 甘蔗收获损失估算系统 - 生产记录
// ==========================================
// 职责: 定义地块生产数据及其环境条件
// 红线: 计算过程中不修改记录（GPS/湿度历史只在计算前赋值）
// ==========================================

use crate::domain::types::HarvestType;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// GpsCoordinates - GPS 坐标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64, // 海拔（米）
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

// ==========================================
// ClimateReading - 气候读数
// ==========================================
// 温度与降水必须成对出现才参与气候修正
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    pub temperature_c: f64,
    pub precipitation_mm: f64,
}

// ==========================================
// SiteConditions - 地块条件
// ==========================================
/// 高级计算的输入条件
///
/// 每个字段对应一个修正项，`Some` 即参与计算。
/// 气候以一个整体出现，避免"只有温度/只有降水"的组合被静默忽略。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SiteConditions {
    pub soil_moisture_pct: Option<f64>,
    pub cane_age_months: Option<u32>,
    pub climate: Option<ClimateReading>,
}

impl SiteConditions {
    /// 四项条件是否齐全（决定走高级计算还是基础计算）
    pub fn is_complete(&self) -> bool {
        self.soil_moisture_pct.is_some() && self.cane_age_months.is_some() && self.climate.is_some()
    }
}

// ==========================================
// ProductionRecord - 生产记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub location: String,
    pub planted_area_ha: f64,
    pub harvested_qty_tons: f64,
    pub harvest_type: HarvestType,
    pub harvest_date: NaiveDate,

    #[serde(default)]
    pub variety: Option<String>,
    #[serde(default)]
    pub cane_age_months: Option<u32>,
    #[serde(default)]
    pub soil_moisture_pct: Option<f64>,
    #[serde(default)]
    pub avg_temperature_c: Option<f64>,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<GpsCoordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moisture_history: Option<Vec<f64>>,
}

impl ProductionRecord {
    /// 只含必填字段的记录
    pub fn new(
        location: impl Into<String>,
        planted_area_ha: f64,
        harvested_qty_tons: f64,
        harvest_type: HarvestType,
        harvest_date: NaiveDate,
    ) -> Self {
        Self {
            location: location.into(),
            planted_area_ha,
            harvested_qty_tons,
            harvest_type,
            harvest_date,
            variety: None,
            cane_age_months: None,
            soil_moisture_pct: None,
            avg_temperature_c: None,
            precipitation_mm: None,
            gps_coordinates: None,
            moisture_history: None,
        }
    }

    pub fn with_variety(mut self, variety: impl Into<String>) -> Self {
        self.variety = Some(variety.into());
        self
    }

    pub fn with_cane_age(mut self, months: u32) -> Self {
        self.cane_age_months = Some(months);
        self
    }

    pub fn with_soil_moisture(mut self, pct: f64) -> Self {
        self.soil_moisture_pct = Some(pct);
        self
    }

    pub fn with_climate(mut self, temperature_c: f64, precipitation_mm: f64) -> Self {
        self.avg_temperature_c = Some(temperature_c);
        self.precipitation_mm = Some(precipitation_mm);
        self
    }

    /// 提取高级计算所需的地块条件
    pub fn site_conditions(&self) -> SiteConditions {
        let climate = match (self.avg_temperature_c, self.precipitation_mm) {
            (Some(temperature_c), Some(precipitation_mm)) => Some(ClimateReading {
                temperature_c,
                precipitation_mm,
            }),
            _ => None,
        };

        SiteConditions {
            soil_moisture_pct: self.soil_moisture_pct,
            cane_age_months: self.cane_age_months,
            climate,
        }
    }

    /// 单位面积产量（吨/公顷）
    pub fn productivity_t_ha(&self) -> Option<f64> {
        if self.planted_area_ha > 0.0 {
            Some(self.harvested_qty_tons / self.planted_area_ha)
        } else {
            None
        }
    }
}

// ==========================================
// StoredProduction - 已入库的生产记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProduction {
    pub id: i64,
    #[serde(flatten)]
    pub record: ProductionRecord,
    pub productivity_t_ha: Option<f64>,
    pub created_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProductionRecord {
        ProductionRecord::new(
            "Fazenda Teste - Talhão 1",
            50.0,
            4000.0,
            HarvestType::Manual,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
    }

    #[test]
    fn test_site_conditions_climate_requires_both_fields() {
        let mut record = sample();
        record.avg_temperature_c = Some(27.0);
        assert!(record.site_conditions().climate.is_none());

        record.precipitation_mm = Some(100.0);
        let climate = record.site_conditions().climate.unwrap();
        assert_eq!(climate.temperature_c, 27.0);
        assert_eq!(climate.precipitation_mm, 100.0);
    }

    #[test]
    fn test_site_conditions_complete() {
        let record = sample()
            .with_cane_age(14)
            .with_soil_moisture(65.0)
            .with_climate(26.5, 100.0);
        assert!(record.site_conditions().is_complete());
        assert!(!sample().site_conditions().is_complete());
    }

    #[test]
    fn test_productivity() {
        assert_eq!(sample().productivity_t_ha(), Some(80.0));
    }
}
