// ==========================================
// 甘蔗收获损失估算系统 - 损失计算引擎
// ==========================================
// 计算流程:
//   1. 解析系数（自定义优先，否则使用收获方式默认值）
//   2. 基础系数 + 湿度/蔗龄/气候修正（条件齐备才参与）
//   3. 合计系数截断至 25%
//   4. 损失量 = 收获量 × 系数，百分比 = 系数 × 100
// ==========================================

use crate::config::EngineSettings;
use crate::domain::loss::{AppliedFactors, LossParameters, LossResult};
use crate::domain::production::{GpsCoordinates, ProductionRecord};
use crate::domain::types::{CalculationMethod, HarvestType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::factors::{
    age_factor, climate_factor, moisture_factor, IDEAL_AGE_MONTHS, IDEAL_MOISTURE_PCT,
};
use crate::engine::history::HistoryManager;
use crate::engine::stats::round_to;
use crate::engine::validation::ensure_valid_production;
use tracing::{debug, info, instrument};

/// 合计损失系数上限
pub const MAX_TOTAL_FACTOR: f64 = 0.25;
/// GPS 计算时附近农场的查询半径 (km)
pub const NEARBY_RADIUS_KM: f64 = 15.0;

// ==========================================
// LossCalculator
// ==========================================
#[derive(Debug, Clone)]
pub struct LossCalculator {
    manual_defaults: LossParameters,
    mechanized_defaults: LossParameters,
    history: HistoryManager,
    precision: u8,
    debug_mode: bool,
}

impl LossCalculator {
    /// 创建计算器（内置默认系数 + 空历史）
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_history(HistoryManager::new(settings))
    }

    /// 使用已有的历史管理器
    pub fn with_history(history: HistoryManager) -> Self {
        let settings = history.settings();
        Self {
            manual_defaults: LossParameters::default_for(HarvestType::Manual),
            mechanized_defaults: LossParameters::default_for(HarvestType::Mechanized),
            precision: settings.decimal_precision,
            debug_mode: settings.debug_mode,
            history,
        }
    }

    /// 替换某收获方式的默认系数（如从数据库加载的参数）
    pub fn with_default_parameters(mut self, params: LossParameters) -> Self {
        match params.harvest_type {
            HarvestType::Manual => self.manual_defaults = params,
            HarvestType::Mechanized => self.mechanized_defaults = params,
        }
        self
    }

    pub fn default_parameters(&self, harvest_type: HarvestType) -> &LossParameters {
        match harvest_type {
            HarvestType::Manual => &self.manual_defaults,
            HarvestType::Mechanized => &self.mechanized_defaults,
        }
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryManager {
        &mut self.history
    }

    // ==========================================
    // 基础计算
    // ==========================================

    /// 仅按收获方式的基础系数估算（不写入历史）
    ///
    /// # 错误
    /// - 收获量为负或非有限值
    /// - 自定义系数含负值
    pub fn compute_basic(
        &self,
        harvested_qty_tons: f64,
        harvest_type: HarvestType,
        params: Option<&LossParameters>,
    ) -> EngineResult<LossResult> {
        if !(harvested_qty_tons.is_finite() && harvested_qty_tons >= 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "收获量不能为负数，实际为 {}",
                harvested_qty_tons
            )));
        }

        let params = self.resolve_parameters(harvest_type, params)?;
        let base = params.base_loss_factor;

        Ok(LossResult {
            estimated_loss_tons: round_to(harvested_qty_tons * base, self.precision),
            loss_percentage: round_to(base * 100.0, self.precision),
            applied_factors: AppliedFactors::new(base),
            calculation_method: CalculationMethod::Basic,
            notes: format!("基础计算: {}收获", harvest_type.label()),
        })
    }

    // ==========================================
    // 高级计算
    // ==========================================

    /// 综合环境条件的损失估算，结果写入历史
    #[instrument(skip(self, record, params), fields(
        location = %record.location,
        harvest_type = %record.harvest_type
    ))]
    pub fn compute_advanced(
        &mut self,
        record: &ProductionRecord,
        params: Option<&LossParameters>,
    ) -> EngineResult<LossResult> {
        let result = self.evaluate(record, params)?;
        self.history.record(record, &result);
        Ok(result)
    }

    /// 高级计算的纯函数部分（校验 + 计算，不写历史）
    pub fn evaluate(
        &self,
        record: &ProductionRecord,
        params: Option<&LossParameters>,
    ) -> EngineResult<LossResult> {
        ensure_valid_production(record)?;
        let params = self.resolve_parameters(record.harvest_type, params)?;
        let conditions = record.site_conditions();

        let mut factors = AppliedFactors::new(params.base_loss_factor);
        let mut notes = vec![format!("高级计算: {}收获", record.harvest_type.label())];

        if let Some(moisture) = conditions.soil_moisture_pct {
            let value = moisture_factor(moisture, params.moisture_factor);
            factors = factors.with_moisture(value);
            if value != 0.0 {
                if moisture < IDEAL_MOISTURE_PCT.0 {
                    notes.push(format!("土壤偏干 ({}%) 导致损失增加", moisture));
                } else if moisture > IDEAL_MOISTURE_PCT.1 {
                    notes.push(format!("土壤过湿 ({}%) 导致损失增加", moisture));
                }
            }
        }

        if let Some(age) = conditions.cane_age_months {
            let value = age_factor(age, params.age_factor);
            factors = factors.with_age(value);
            if value != 0.0 {
                if age < IDEAL_AGE_MONTHS.0 {
                    notes.push(format!("蔗龄过短 ({} 个月) 导致损失增加", age));
                } else if age > IDEAL_AGE_MONTHS.1 {
                    notes.push(format!("蔗龄过长 ({} 个月) 导致损失增加", age));
                }
            }
        }

        if let Some(climate) = conditions.climate {
            let value = climate_factor(
                climate.temperature_c,
                climate.precipitation_mm,
                params.climate_factor,
            );
            factors = factors.with_climate(value);
            if value != 0.0 {
                notes.push("识别到不利气候条件".to_string());
            }
        }

        let raw_total = factors.total();
        let total = raw_total.min(MAX_TOTAL_FACTOR);

        if self.debug_mode {
            info!(raw_total, total, factors = ?factors, "高级计算系数明细");
        } else {
            debug!(raw_total, total, "高级计算系数");
        }

        Ok(LossResult {
            estimated_loss_tons: round_to(record.harvested_qty_tons * total, self.precision),
            loss_percentage: round_to(total * 100.0, self.precision),
            applied_factors: factors,
            calculation_method: CalculationMethod::Advanced,
            notes: notes.join("; "),
        })
    }

    // ==========================================
    // GPS 增强计算
    // ==========================================

    /// 写入坐标后做高级计算，并在备注中追加附近农场
    ///
    /// 附近农场备注在写入历史之前追加，地块缓存与返回值一致
    #[instrument(skip(self, record), fields(location = %record.location))]
    pub fn compute_with_coordinates(
        &mut self,
        record: &mut ProductionRecord,
        coordinates: GpsCoordinates,
    ) -> EngineResult<LossResult> {
        record.gps_coordinates = Some(coordinates);

        let mut result = self.evaluate(record, None)?;
        let nearby = self.history.find_nearby(
            coordinates.latitude,
            coordinates.longitude,
            NEARBY_RADIUS_KM,
        );

        if !nearby.is_empty() {
            let names: Vec<&str> = nearby.iter().map(|n| n.name.as_str()).collect();
            result
                .notes
                .push_str(&format!(" | 附近农场: {}", names.join(", ")));
        }

        self.history.record(record, &result);
        Ok(result)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn resolve_parameters<'a>(
        &'a self,
        harvest_type: HarvestType,
        params: Option<&'a LossParameters>,
    ) -> EngineResult<&'a LossParameters> {
        match params {
            Some(custom) if !custom.is_valid() => Err(EngineError::InvalidInput(format!(
                "损失系数必须为非负有限值且基础系数不超过 1: {:?}",
                custom
            ))),
            Some(custom) => Ok(custom),
            None => Ok(self.default_parameters(harvest_type)),
        }
    }
}
