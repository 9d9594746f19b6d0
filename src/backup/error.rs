// ==========================================
// 甘蔗收获损失估算系统 - JSON 备份错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("无效的备份文件: {0}")]
    InvalidDocument(String),

    #[error("备份文件不存在: {0}")]
    NotFound(String),
}

pub type BackupResult<T> = Result<T, BackupError>;
