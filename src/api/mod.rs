// ==========================================
// 甘蔗收获损失估算系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行调用
// ==========================================

pub mod error;
pub mod loss_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use loss_api::{
    apply_automatic_defaults, choose_method, demo_record, AppliedDefault, AutomaticInput,
    DatabaseHandles, DatabaseStatus, HarvestLossApi, InputSource, LossReport, ParameterStatus,
    RegisterOutcome, ReportPeriod, SaveOutcome, DEFAULT_COORDINATES, EXAMPLE_MOISTURE_READINGS,
    RECENT_REPORT_DAYS,
};
