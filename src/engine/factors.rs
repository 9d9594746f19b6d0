// ==========================================
// 甘蔗收获损失估算系统 - 环境修正系数
// ==========================================
// 职责: 根据土壤湿度、蔗龄、气候计算附加损失系数
// 红线: 纯函数，无状态；理想区间内返回 0，区间外线性增加
// ==========================================

/// 土壤湿度理想区间 (%)
pub const IDEAL_MOISTURE_PCT: (f64, f64) = (60.0, 70.0);
/// 湿度偏离的归一化跨度
const MOISTURE_SPAN: f64 = 30.0;

/// 蔗龄理想区间 (月)
pub const IDEAL_AGE_MONTHS: (u32, u32) = (12, 18);
const YOUNG_CANE_SPAN: f64 = 6.0;
const MATURE_CANE_SPAN: f64 = 12.0;

/// 温度理想区间 (°C)
pub const IDEAL_TEMPERATURE_C: (f64, f64) = (25.0, 30.0);
const TEMPERATURE_SPAN: f64 = 10.0;

/// 月降水理想区间 (mm)，对应年降水 1000~1500mm 的月均近似
pub const IDEAL_PRECIPITATION_MM: (f64, f64) = (80.0, 125.0);

/// 土壤湿度修正
///
/// - [60, 70] → 0
/// - < 60 → base × (60 − m) / 30 （偏干）
/// - > 70 → base × (m − 70) / 30 （过湿）
pub fn moisture_factor(soil_moisture_pct: f64, base: f64) -> f64 {
    let (low, high) = IDEAL_MOISTURE_PCT;
    if soil_moisture_pct < low {
        base * (low - soil_moisture_pct) / MOISTURE_SPAN
    } else if soil_moisture_pct > high {
        base * (soil_moisture_pct - high) / MOISTURE_SPAN
    } else {
        0.0
    }
}

/// 蔗龄修正
///
/// 幼龄蔗每月惩罚是老龄蔗的两倍:
/// - < 12 → base × (12 − a) / 6
/// - > 18 → base × (a − 18) / 12
pub fn age_factor(age_months: u32, base: f64) -> f64 {
    let (low, high) = IDEAL_AGE_MONTHS;
    let age = age_months as f64;
    if age_months < low {
        base * (low as f64 - age) / YOUNG_CANE_SPAN
    } else if age_months > high {
        base * (age - high as f64) / MATURE_CANE_SPAN
    } else {
        0.0
    }
}

/// 气候修正：温度分量与降水分量取平均
pub fn climate_factor(temperature_c: f64, precipitation_mm: f64, base: f64) -> f64 {
    (temperature_penalty(temperature_c, base) + precipitation_penalty(precipitation_mm, base)) / 2.0
}

fn temperature_penalty(temperature_c: f64, base: f64) -> f64 {
    let (low, high) = IDEAL_TEMPERATURE_C;
    if temperature_c < low {
        base * (low - temperature_c) / TEMPERATURE_SPAN
    } else if temperature_c > high {
        base * (temperature_c - high) / TEMPERATURE_SPAN
    } else {
        0.0
    }
}

// 偏少按下限归一，偏多按上限归一
fn precipitation_penalty(precipitation_mm: f64, base: f64) -> f64 {
    let (low, high) = IDEAL_PRECIPITATION_MM;
    if precipitation_mm < low {
        base * (low - precipitation_mm) / low
    } else if precipitation_mm > high {
        base * (precipitation_mm - high) / high
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_moisture_ideal_band_is_zero() {
        for m in [60.0, 62.5, 65.0, 69.9, 70.0] {
            assert_eq!(moisture_factor(m, 0.02), 0.0, "m={}", m);
        }
    }

    #[test]
    fn test_moisture_outside_band() {
        assert!((moisture_factor(30.0, 0.02) - 0.02).abs() < EPS);
        assert!((moisture_factor(100.0, 0.03) - 0.03).abs() < EPS);
        assert!((moisture_factor(45.0, 0.02) - 0.01).abs() < EPS);
    }

    #[test]
    fn test_moisture_monotonic_and_continuous() {
        // 向下偏离
        let mut prev = moisture_factor(60.0, 0.02);
        for step in 1..=60 {
            let m = 60.0 - step as f64;
            let v = moisture_factor(m, 0.02);
            assert!(v >= prev);
            prev = v;
        }
        // 向上偏离
        let mut prev = moisture_factor(70.0, 0.02);
        for step in 1..=30 {
            let m = 70.0 + step as f64;
            let v = moisture_factor(m, 0.02);
            assert!(v >= prev);
            prev = v;
        }
        // 区间边界连续
        assert!(moisture_factor(59.9999, 0.02) < 1e-6);
        assert!(moisture_factor(70.0001, 0.02) < 1e-6);
    }

    #[test]
    fn test_age_factor_reference_points() {
        let base = 0.01;
        assert_eq!(age_factor(15, base), 0.0);
        assert_eq!(age_factor(12, base), 0.0);
        assert_eq!(age_factor(18, base), 0.0);
        assert!((age_factor(6, base) - base * 1.0).abs() < EPS);
        assert!((age_factor(24, base) - base * 0.5).abs() < EPS);
    }

    #[test]
    fn test_age_factor_young_penalized_twice_as_steeply() {
        let base = 0.012;
        let young = age_factor(11, base);
        let mature = age_factor(19, base);
        assert!((young - 2.0 * mature).abs() < EPS);
    }

    #[test]
    fn test_climate_ideal_is_zero() {
        assert_eq!(climate_factor(27.0, 100.0, 0.015), 0.0);
        assert_eq!(climate_factor(25.0, 80.0, 0.015), 0.0);
        assert_eq!(climate_factor(30.0, 125.0, 0.015), 0.0);
    }

    #[test]
    fn test_climate_components_are_averaged() {
        let base = 0.02;
        // 只有温度偏离: 15°C → base × 10/10 = base，平均后 base/2
        assert!((climate_factor(15.0, 100.0, base) - base / 2.0).abs() < EPS);
        // 只有降水偏少: 40mm → base × 40/80 = base/2，平均后 base/4
        assert!((climate_factor(27.0, 40.0, base) - base / 4.0).abs() < EPS);
        // 降水偏多: 250mm → base × 125/125 = base
        assert!((climate_factor(27.0, 250.0, base) - base / 2.0).abs() < EPS);
        // 两者都偏离
        let both = climate_factor(35.0, 0.0, base);
        assert!((both - (base * 0.5 + base) / 2.0).abs() < EPS);
    }
}
