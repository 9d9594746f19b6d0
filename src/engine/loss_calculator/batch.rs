// ==========================================
// 多次湿度测量批量分析
// ==========================================
// 每个读数替换基础记录的土壤湿度后做一次高级计算，
// 其余条件（蔗龄、气候）保持不变
// ==========================================

use crate::domain::production::ProductionRecord;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::stats::{mean, min_max};
use serde::Serialize;
use tracing::{info, instrument};

use super::core::LossCalculator;

/// 单个读数的计算结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchDetail {
    pub moisture: f64,
    pub loss_tons: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchAnalysis {
    pub total_readings: usize,
    pub moisture_mean: f64,
    pub moisture_range: (f64, f64),
    pub loss_mean_tons: f64,
    pub loss_range_tons: (f64, f64),
    pub percentage_mean: f64,
    pub percentage_range: (f64, f64),
    /// 最大与最小损失百分比之差
    pub percentage_spread: f64,
    /// 原始读数（输入顺序）
    pub readings: Vec<f64>,
    /// 与读数一一对应
    pub details: Vec<BatchDetail>,
}

impl LossCalculator {
    /// 批量分析多个土壤湿度读数
    ///
    /// # 错误
    /// - 读数为空
    /// - 任一读数不在 [0, 100]
    /// - 基础记录本身不合法
    #[instrument(skip(self, base, readings), fields(
        location = %base.location,
        count = readings.len()
    ))]
    pub fn compute_batch(
        &mut self,
        base: &mut ProductionRecord,
        readings: &[f64],
    ) -> EngineResult<BatchAnalysis> {
        let moisture_range = min_max(readings)
            .ok_or_else(|| EngineError::InvalidInput("湿度读数不能为空".to_string()))?;

        if let Some(bad) = readings.iter().find(|m| !(0.0..=100.0).contains(*m)) {
            return Err(EngineError::InvalidInput(format!(
                "湿度读数必须在 0~100% 之间，实际为 {}",
                bad
            )));
        }

        base.moisture_history = Some(readings.to_vec());

        let mut details = Vec::with_capacity(readings.len());
        for &moisture in readings {
            let mut sample = base.clone();
            sample.soil_moisture_pct = Some(moisture);
            sample.moisture_history = None;
            sample.gps_coordinates = None;

            let result = self.compute_advanced(&sample, None)?;
            details.push(BatchDetail {
                moisture,
                loss_tons: result.estimated_loss_tons,
                percentage: result.loss_percentage,
            });
        }

        let losses: Vec<f64> = details.iter().map(|d| d.loss_tons).collect();
        let percentages: Vec<f64> = details.iter().map(|d| d.percentage).collect();
        let loss_range_tons = min_max(&losses).unwrap_or_default();
        let percentage_range = min_max(&percentages).unwrap_or_default();

        info!(
            readings = readings.len(),
            spread = percentage_range.1 - percentage_range.0,
            "批量湿度分析完成"
        );

        Ok(BatchAnalysis {
            total_readings: readings.len(),
            moisture_mean: mean(readings).unwrap_or_default(),
            moisture_range,
            loss_mean_tons: mean(&losses).unwrap_or_default(),
            loss_range_tons,
            percentage_mean: mean(&percentages).unwrap_or_default(),
            percentage_range,
            percentage_spread: percentage_range.1 - percentage_range.0,
            readings: readings.to_vec(),
            details,
        })
    }
}
