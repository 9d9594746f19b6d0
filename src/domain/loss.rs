// ==========================================
// 甘蔗收获损失估算系统 - 损失参数与结果
// ==========================================
// 职责: 损失系数配置、修正项明细、计算结果
// 红线: 结果一经产生不再修改（GPS 附近农场备注除外，由计算器在返回前追加）
// ==========================================

use crate::domain::types::{CalculationMethod, HarvestType};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// LossParameters - 损失系数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossParameters {
    pub harvest_type: HarvestType,
    pub base_loss_factor: f64,
    pub moisture_factor: f64,
    pub age_factor: f64,
    pub climate_factor: f64,
    #[serde(default)]
    pub description: String,
}

impl LossParameters {
    /// 内置默认系数
    ///
    /// - 人工: 基础 5%，对环境较不敏感
    /// - 机械: 基础 8%，机械损伤及环境敏感度更高
    pub fn default_for(harvest_type: HarvestType) -> Self {
        match harvest_type {
            HarvestType::Manual => Self {
                harvest_type,
                base_loss_factor: 0.05,
                moisture_factor: 0.02,
                age_factor: 0.01,
                climate_factor: 0.015,
                description: "人工收获 - 损失较低，但依赖工人经验".to_string(),
            },
            HarvestType::Mechanized => Self {
                harvest_type,
                base_loss_factor: 0.08,
                moisture_factor: 0.025,
                age_factor: 0.015,
                climate_factor: 0.02,
                description: "机械收获 - 效率高，但存在机械损失".to_string(),
            },
        }
    }

    /// 系数是否全部非负且有限，且基础系数不超过 1（损失率不超过 100%）
    pub fn is_valid(&self) -> bool {
        let factors = [
            self.base_loss_factor,
            self.moisture_factor,
            self.age_factor,
            self.climate_factor,
        ];
        factors.iter().all(|v| v.is_finite() && *v >= 0.0) && self.base_loss_factor <= 1.0
    }
}

// ==========================================
// LossFactor - 修正项名称
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossFactor {
    Base,
    Moisture,
    Age,
    Climate,
}

impl LossFactor {
    /// 应用顺序
    pub const ORDER: [LossFactor; 4] = [
        LossFactor::Base,
        LossFactor::Moisture,
        LossFactor::Age,
        LossFactor::Climate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LossFactor::Base => "base_factor",
            LossFactor::Moisture => "moisture_factor",
            LossFactor::Age => "age_factor",
            LossFactor::Climate => "climate_factor",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ORDER.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for LossFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// AppliedFactors - 已应用的修正项
// ==========================================
/// 基础系数始终存在；其余修正项只在前置条件满足时为 `Some`。
///
/// 序列化为有序 JSON 对象: base → moisture → age → climate
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "HashMap<String, f64>")]
pub struct AppliedFactors {
    base: f64,
    moisture: Option<f64>,
    age: Option<f64>,
    climate: Option<f64>,
}

impl AppliedFactors {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            moisture: None,
            age: None,
            climate: None,
        }
    }

    pub fn with_moisture(mut self, value: f64) -> Self {
        self.moisture = Some(value);
        self
    }

    pub fn with_age(mut self, value: f64) -> Self {
        self.age = Some(value);
        self
    }

    pub fn with_climate(mut self, value: f64) -> Self {
        self.climate = Some(value);
        self
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn get(&self, factor: LossFactor) -> Option<f64> {
        match factor {
            LossFactor::Base => Some(self.base),
            LossFactor::Moisture => self.moisture,
            LossFactor::Age => self.age,
            LossFactor::Climate => self.climate,
        }
    }

    pub fn contains(&self, factor: LossFactor) -> bool {
        self.get(factor).is_some()
    }

    /// 按应用顺序迭代已应用的修正项
    pub fn iter(&self) -> impl Iterator<Item = (LossFactor, f64)> + '_ {
        LossFactor::ORDER
            .iter()
            .filter_map(move |f| self.get(*f).map(|v| (*f, v)))
    }

    /// 已应用的修正项个数（至少为 1）
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// 未截断的合计系数
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }
}

impl Serialize for AppliedFactors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (factor, value) in self.iter() {
            map.serialize_entry(factor.key(), &value)?;
        }
        map.end()
    }
}

impl TryFrom<HashMap<String, f64>> for AppliedFactors {
    type Error = String;

    fn try_from(raw: HashMap<String, f64>) -> Result<Self, Self::Error> {
        if let Some(unknown) = raw.keys().find(|k| LossFactor::from_key(k).is_none()) {
            return Err(format!("未知的修正项: {}", unknown));
        }

        let base = raw
            .get(LossFactor::Base.key())
            .copied()
            .ok_or_else(|| "缺少基础系数 base_factor".to_string())?;

        let mut factors = AppliedFactors::new(base);
        factors.moisture = raw.get(LossFactor::Moisture.key()).copied();
        factors.age = raw.get(LossFactor::Age.key()).copied();
        factors.climate = raw.get(LossFactor::Climate.key()).copied();
        Ok(factors)
    }
}

// ==========================================
// LossResult - 损失计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossResult {
    pub estimated_loss_tons: f64,
    pub loss_percentage: f64,
    pub applied_factors: AppliedFactors,
    pub calculation_method: CalculationMethod,
    #[serde(default)]
    pub notes: String,
}
