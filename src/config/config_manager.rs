// ==========================================
// 甘蔗收获损失估算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::settings::{EngineSettings, MAX_DECIMAL_PRECISION};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 引擎设置 =====

    /// 加载引擎设置，缺失或格式错误的项使用默认值
    pub fn load_engine_settings(&self) -> Result<EngineSettings, Box<dyn Error>> {
        let defaults = EngineSettings::default();

        let precision_raw = self.get_config_or_default(
            config_keys::DECIMAL_PRECISION,
            &defaults.decimal_precision.to_string(),
        )?;
        let decimal_precision = precision_raw
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= MAX_DECIMAL_PRECISION)
            .unwrap_or_else(|| {
                tracing::warn!(
                    config_key = config_keys::DECIMAL_PRECISION,
                    raw_value = %precision_raw,
                    max = MAX_DECIMAL_PRECISION,
                    "小数位配置无效或超出范围，使用默认值"
                );
                defaults.decimal_precision
            });

        let debug_mode = parse_flag(
            &self.get_config_or_default(config_keys::DEBUG_MODE, "false")?,
            defaults.debug_mode,
        );
        let auto_save = parse_flag(
            &self.get_config_or_default(config_keys::AUTO_SAVE, "true")?,
            defaults.auto_save,
        );
        let date_format = self.get_config_or_default(config_keys::DATE_FORMAT, &defaults.date_format)?;

        Ok(EngineSettings {
            decimal_precision,
            debug_mode,
            auto_save,
            date_format,
        })
    }
}

fn parse_flag(raw: &str, default: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => default,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const DECIMAL_PRECISION: &str = "decimal_precision";
    pub const DEBUG_MODE: &str = "debug_mode";
    pub const AUTO_SAVE: &str = "auto_save";
    pub const DATE_FORMAT: &str = "date_format";
}
