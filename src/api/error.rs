// ==========================================
// 甘蔗收获损失估算系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把各层错误转换为用户可读的消息
// ==========================================

use crate::backup::BackupError;
use crate::engine::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    /// 生产记录校验失败（包含全部违规项）
    #[error("数据验证失败: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 历史为空，调用方应提示先执行计算
    #[error("历史记录为空: {0}")]
    EmptyHistory(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库不可用: {0}")]
    DatabaseUnavailable(String),

    #[error("JSON 备份错误: {0}")]
    BackupError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            EngineError::EmptyHistory(msg) => ApiError::EmptyHistory(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseUnavailable(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseUnavailable(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

// ==========================================
// 从 BackupError 转换
// ==========================================
impl From<BackupError> for ApiError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::NotFound(name) => ApiError::NotFound(format!("备份文件 {}", name)),
            other => ApiError::BackupError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_violations() {
        let err = ApiError::ValidationError(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "数据验证失败: a; b");
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: ApiError = EngineError::EmptyHistory("空".to_string()).into();
        assert!(matches!(err, ApiError::EmptyHistory(_)));
    }

    #[test]
    fn test_repository_not_found_conversion() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "cane_production".to_string(),
            id: "7".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "资源未找到: cane_production(id=7)不存在");
    }
}
