// ==========================================
// 甘蔗收获损失估算系统 - 引擎层
// ==========================================
// 职责: 损失估算规则、历史与分析，不拼 SQL，不做文件 IO
// 红线: 所有对外入口返回 EngineResult；空历史显式报错
// ==========================================

pub mod error;
pub mod factors;
pub mod history;
pub mod loss_calculator;
pub mod stats;
pub mod validation;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use history::{
    AnalyticsRow, AnalyticsTable, FullReport, HistoryManager, MemoryTableReport, NearbyLocation,
    RegisteredLocation, SummaryStatistics,
};
pub use loss_calculator::{BatchAnalysis, BatchDetail, LossCalculator};
pub use validation::{ensure_valid_production, validate_production};
