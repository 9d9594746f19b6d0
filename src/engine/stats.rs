// ==========================================
// 甘蔗收获损失估算系统 - 数值工具
// ==========================================

use crate::config::MAX_DECIMAL_PRECISION;

/// 按小数位四舍五入（小数位超过上限时按上限处理）
pub fn round_to(value: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(i32::from(decimals.min(MAX_DECIMAL_PRECISION)));
    (value * factor).round() / factor
}

/// 算术平均，空序列返回 None
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// (最小值, 最大值)，空序列返回 None
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// 安全除法，分母非正时返回 0
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
