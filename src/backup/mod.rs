// ==========================================
// 甘蔗收获损失估算系统 - JSON 文件备份
// ==========================================
// 职责: 生产记录与损失报告的 JSON 文档读写
// 红线: 只操作数据目录下的 .json 文件
// ==========================================

pub mod error;
pub mod json_backup;

pub use error::{BackupError, BackupResult};
pub use json_backup::{
    JsonBackupStore, LossReportDocument, LossReportSummary, ProductionDocument,
    ProductionSnapshot,
};
