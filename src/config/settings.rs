// ==========================================
// 甘蔗收获损失估算系统 - 运行配置
// ==========================================
// 职责: 引擎设置 + 应用路径配置
// 优先级: 环境变量 > config_kv 表 > 内置默认值
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "CANE_LOSS_DB_PATH";
/// JSON 备份目录环境变量
pub const ENV_DATA_DIR: &str = "CANE_LOSS_DATA_DIR";

// ==========================================
// EngineSettings - 引擎设置
// ==========================================
/// 结果小数位上限
pub const MAX_DECIMAL_PRECISION: u8 = 10;

/// 引擎设置（报表中的配置快照即此结构）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// 结果保留的小数位数
    pub decimal_precision: u8,
    /// 调试模式（输出更多计算细节日志）
    pub debug_mode: bool,
    /// 计算后自动保存结果
    pub auto_save: bool,
    /// 日期格式
    pub date_format: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            decimal_precision: 2,
            debug_mode: false,
            auto_save: true,
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite 数据库文件路径
    pub db_path: String,
    /// JSON 备份目录
    pub data_dir: PathBuf,
    /// 引擎设置
    pub engine: EngineSettings,
}

impl AppConfig {
    /// 使用默认路径（可被环境变量覆盖）
    pub fn from_env() -> Self {
        Self {
            db_path: get_default_db_path(),
            data_dir: get_default_data_dir(),
            engine: EngineSettings::default(),
        }
    }

    /// 指定路径（测试/命令行参数）
    pub fn with_paths(db_path: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            data_dir: data_dir.into(),
            engine: EngineSettings::default(),
        }
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn app_data_root() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("cane-loss"))
}

/// 获取默认数据库路径
///
/// 1. 环境变量 CANE_LOSS_DB_PATH
/// 2. 用户数据目录/cane-loss/cane_loss.db
/// 3. 回退: ./cane_loss.db
pub fn get_default_db_path() -> String {
    if let Some(path) = env_override(ENV_DB_PATH) {
        return path;
    }

    match app_data_root() {
        Some(root) => {
            if let Err(e) = std::fs::create_dir_all(&root) {
                tracing::warn!("无法创建数据目录 {}: {}", root.display(), e);
                return "./cane_loss.db".to_string();
            }
            root.join("cane_loss.db").to_string_lossy().to_string()
        }
        None => "./cane_loss.db".to_string(),
    }
}

/// 获取默认 JSON 备份目录
pub fn get_default_data_dir() -> PathBuf {
    if let Some(dir) = env_override(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }

    app_data_root()
        .map(|root| root.join("data"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
