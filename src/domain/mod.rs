// ==========================================
// 甘蔗收获损失估算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod history;
pub mod loss;
pub mod production;
pub mod report;
pub mod types;

// 重导出核心类型
pub use history::HistoryEntry;
pub use loss::{AppliedFactors, LossFactor, LossParameters, LossResult};
pub use production::{
    ClimateReading, GpsCoordinates, ProductionRecord, SiteConditions, StoredProduction,
};
pub use report::{LossReportRow, LossReportTotals, StoredLoss};
pub use types::{CalculationMethod, HarvestType, ParseHarvestTypeError};
