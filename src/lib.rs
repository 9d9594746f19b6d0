// ==========================================
// 甘蔗收获损失估算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + JSON 备份
// 系统定位: 按收获方式与地块条件估算收获损失
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 损失估算与历史分析
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// JSON 文件备份
pub mod backup;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 命令行
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CalculationMethod, HarvestType};

// 领域实体
pub use domain::{
    GpsCoordinates, HistoryEntry, LossParameters, LossReportRow, LossResult, ProductionRecord,
};

// 引擎
pub use engine::{HistoryManager, LossCalculator};

// API
pub use api::HarvestLossApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "甘蔗收获损失估算系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
