// ==========================================
// 甘蔗收获损失估算系统 - 领域类型定义
// ==========================================
// 职责: 收获方式、计算方法等枚举类型
// 序列化格式: 小写 (与数据库、JSON 备份一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 收获方式 (Harvest Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestType {
    Manual,     // 人工收获
    Mechanized, // 机械收获
}

impl HarvestType {
    /// 全部收获方式（按参数表顺序）
    pub const ALL: [HarvestType; 2] = [HarvestType::Manual, HarvestType::Mechanized];

    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            HarvestType::Manual => "manual",
            HarvestType::Mechanized => "mechanized",
        }
    }

    /// 中文显示名称
    pub fn label(&self) -> &'static str {
        match self {
            HarvestType::Manual => "人工",
            HarvestType::Mechanized => "机械",
        }
    }
}

impl fmt::Display for HarvestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

/// 收获方式解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("收获方式必须是 'manual' 或 'mechanized'，实际为 '{0}'")]
pub struct ParseHarvestTypeError(pub String);

impl FromStr for HarvestType {
    type Err = ParseHarvestTypeError;

    // 兼容旧库中的葡语取值 (manual / mecanizada)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(HarvestType::Manual),
            "mechanized" | "mecanizada" => Ok(HarvestType::Mechanized),
            other => Err(ParseHarvestTypeError(other.to_string())),
        }
    }
}

// ==========================================
// 计算方法 (Calculation Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMethod {
    Basic,    // 基础计算: 只用基础损失系数
    Advanced, // 高级计算: 叠加土壤湿度/蔗龄/气候修正
}

impl CalculationMethod {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CalculationMethod::Basic => "basic",
            CalculationMethod::Advanced => "advanced",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(CalculationMethod::Basic),
            "advanced" => Some(CalculationMethod::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
