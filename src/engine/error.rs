// ==========================================
// 甘蔗收获损失估算系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::ParseHarvestTypeError;
use thiserror::Error;

/// 引擎层错误类型
///
/// - InvalidInput: 输入错误，计算不会开始
/// - EmptyHistory: 历史为空时请求统计/报表，属于预期状态，调用方应分支处理
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("历史记录为空: {0}")]
    EmptyHistory(String),
}

impl EngineError {
    pub fn is_empty_history(&self) -> bool {
        matches!(self, EngineError::EmptyHistory(_))
    }
}

impl From<ParseHarvestTypeError> for EngineError {
    fn from(err: ParseHarvestTypeError) -> Self {
        EngineError::InvalidInput(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
