// ==========================================
// 甘蔗收获损失估算系统 - 应用状态
// ==========================================
// 职责: 组装配置、数据库、计算引擎与 JSON 备份
// 红线: 数据库打不开时降级为仅 JSON 备份模式，不中止启动
// ==========================================

use crate::api::{DatabaseHandles, HarvestLossApi};
use crate::backup::JsonBackupStore;
use crate::config::{AppConfig, ConfigManager, EngineSettings};
use crate::engine::LossCalculator;

/// 应用状态
///
/// 命令行每次调用构造一次
pub struct AppState {
    /// 实际生效的配置（引擎设置已合并 config_kv）
    pub config: AppConfig,

    /// 损失估算API
    pub api: HarvestLossApi,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（失败则降级）
    /// 2. 从 config_kv 加载引擎设置
    /// 3. 用数据库中启用的损失系数覆盖内置默认值
    /// 4. 打开 JSON 备份目录
    pub fn new(mut config: AppConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", config.db_path);

        let database = match DatabaseHandles::open(&config.db_path) {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!("数据库不可用，仅使用 JSON 备份: {}", e);
                None
            }
        };

        if let Some(db) = &database {
            config.engine = load_engine_settings(db, &config.engine);
        }

        let mut calculator = LossCalculator::new(config.engine.clone());
        if let Some(db) = &database {
            match db.parameters().list_active() {
                Ok(rows) => {
                    for parameters in rows {
                        if parameters.is_valid() {
                            calculator = calculator.with_default_parameters(parameters);
                        } else {
                            tracing::warn!(
                                harvest_type = %parameters.harvest_type,
                                "数据库损失系数含负值，保留内置默认值"
                            );
                        }
                    }
                }
                Err(e) => tracing::warn!("读取损失系数失败，使用内置默认值: {}", e),
            }
        }

        let backup = JsonBackupStore::open(&config.data_dir)
            .map_err(|e| format!("无法创建备份目录 {}: {}", config.data_dir.display(), e))?;

        tracing::info!(
            database = database.is_some(),
            data_dir = %config.data_dir.display(),
            "AppState初始化完成"
        );

        Ok(Self {
            api: HarvestLossApi::new(calculator, database, backup),
            config,
        })
    }
}

fn load_engine_settings(db: &DatabaseHandles, fallback: &EngineSettings) -> EngineSettings {
    let manager = ConfigManager::from_connection(db.connection());
    match manager.load_engine_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("加载引擎设置失败，使用默认值: {}", e);
            fallback.clone()
        }
    }
}
