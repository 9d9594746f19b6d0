// ==========================================
// 甘蔗收获损失估算系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表 + 环境变量
// ==========================================

pub mod config_manager;
pub mod settings;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use settings::{
    get_default_data_dir, get_default_db_path, AppConfig, EngineSettings, MAX_DECIMAL_PRECISION,
};
