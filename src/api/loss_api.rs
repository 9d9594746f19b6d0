// ==========================================
// 甘蔗收获损失估算系统 - 损失估算 API
// ==========================================
// 职责: 串联计算引擎、数据库仓储与 JSON 备份
// 红线: 数据库不可用时写 JSON 备份继续工作，不中断用户操作
// ==========================================
// 子模块:
// - calculation: 自动模式、计算方法选择、GPS/批量计算、结果保存
// - records:     登记生产记录、数据库查询与检查、备份文件管理
// - reports:     损失报表、历史统计与分析表报表
// ==========================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::backup::JsonBackupStore;
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection, read_schema_version};
use crate::domain::history::HistoryEntry;
use crate::domain::loss::{LossParameters, LossResult};
use crate::domain::production::{GpsCoordinates, ProductionRecord, StoredProduction};
use crate::domain::report::{LossReportRow, LossReportTotals, StoredLoss};
use crate::domain::types::{CalculationMethod, HarvestType};
use crate::engine::{
    validate_production, BatchAnalysis, FullReport, LossCalculator, MemoryTableReport,
    NearbyLocation, SummaryStatistics,
};
use crate::repository::{LossParametersRepository, LossRepository, ProductionRepository};

mod calculation;
mod records;
mod reports;

#[cfg(test)]
mod tests;

pub use calculation::{apply_automatic_defaults, choose_method, AppliedDefault, AutomaticInput, InputSource};
pub use records::{DatabaseStatus, ParameterStatus};
pub use reports::{LossReport, ReportPeriod, RECENT_REPORT_DAYS};

// ==========================================
// 自动模式默认值（巴西典型种植条件）
// ==========================================
pub const DEFAULT_CANE_AGE_MONTHS: u32 = 14;
pub const DEFAULT_SOIL_MOISTURE_PCT: f64 = 65.0;
pub const DEFAULT_TEMPERATURE_C: f64 = 26.5;
pub const DEFAULT_PRECIPITATION_MM: f64 = 100.0;
pub const DEFAULT_VARIETY: &str = "RB92579";

/// 批量分析的示例湿度读数
pub const EXAMPLE_MOISTURE_READINGS: [f64; 8] = [64.2, 66.8, 63.5, 68.1, 65.9, 67.3, 62.8, 69.0];

/// GPS 计算的默认坐标
pub const DEFAULT_COORDINATES: GpsCoordinates = GpsCoordinates {
    latitude: -22.5,
    longitude: -47.8,
    altitude: 600.0,
};

/// 数据库中没有生产记录时使用的演示记录
pub fn demo_record(harvest_date: NaiveDate) -> ProductionRecord {
    ProductionRecord::new(
        "Fazenda Exemplo - Talhão Demo",
        100.0,
        8000.0,
        HarvestType::Mechanized,
        harvest_date,
    )
    .with_variety(DEFAULT_VARIETY)
    .with_cane_age(DEFAULT_CANE_AGE_MONTHS)
    .with_soil_moisture(DEFAULT_SOIL_MOISTURE_PCT)
    .with_climate(DEFAULT_TEMPERATURE_C, DEFAULT_PRECIPITATION_MM)
}

// ==========================================
// 操作结果
// ==========================================

/// 登记生产记录的结果
#[derive(Debug, Clone, Serialize)]
pub struct RegisterOutcome {
    /// 数据库写入失败或不可用时为 None
    pub production_id: Option<i64>,
    pub backup_path: PathBuf,
    pub database_error: Option<String>,
}

/// 保存计算结果的结果
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub report_path: PathBuf,
    pub production_id: Option<i64>,
    pub loss_id: Option<i64>,
    pub database_error: Option<String>,
}

// ==========================================
// DatabaseHandles - 共享连接上的仓储集合
// ==========================================
pub struct DatabaseHandles {
    conn: Arc<Mutex<Connection>>,
    productions: ProductionRepository,
    losses: LossRepository,
    parameters: LossParametersRepository,
}

impl DatabaseHandles {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            productions: ProductionRepository::from_connection(conn.clone()),
            losses: LossRepository::from_connection(conn.clone()),
            parameters: LossParametersRepository::from_connection(conn.clone()),
            conn,
        }
    }

    /// 打开数据库文件并建表
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseUnavailable(format!("{}: {}", db_path, e)))?;
        ensure_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 共享连接（配置管理器复用同一连接）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    pub fn productions(&self) -> &ProductionRepository {
        &self.productions
    }

    pub fn losses(&self) -> &LossRepository {
        &self.losses
    }

    pub fn parameters(&self) -> &LossParametersRepository {
        &self.parameters
    }

    pub fn is_available(&self) -> bool {
        self.productions.test_connection()
    }

    pub fn schema_version(&self) -> ApiResult<Option<i64>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::DatabaseUnavailable(format!("数据库锁获取失败: {}", e)))?;
        read_schema_version(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// config_kv 全量快照
    pub fn config_snapshot(&self) -> ApiResult<serde_json::Value> {
        let snapshot = ConfigManager::from_connection(self.connection())
            .get_config_snapshot()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        serde_json::from_str(&snapshot).map_err(|e| ApiError::DatabaseError(e.to_string()))
    }
}

// ==========================================
// HarvestLossApi - 损失估算 API
// ==========================================

/// 损失估算API
///
/// 职责：
/// 1. 选择基础/高级计算并保存结果（JSON 必存，数据库可选）
/// 2. 生产记录登记与查询
/// 3. 报表与历史分析
pub struct HarvestLossApi {
    calculator: LossCalculator,
    database: Option<DatabaseHandles>,
    backup: JsonBackupStore,
}

impl HarvestLossApi {
    pub fn new(
        calculator: LossCalculator,
        database: Option<DatabaseHandles>,
        backup: JsonBackupStore,
    ) -> Self {
        Self {
            calculator,
            database,
            backup,
        }
    }

    pub fn calculator(&self) -> &LossCalculator {
        &self.calculator
    }

    pub fn backup(&self) -> &JsonBackupStore {
        &self.backup
    }

    /// 数据库是否可用（已配置且连接检查通过）
    pub fn database_available(&self) -> bool {
        self.database
            .as_ref()
            .map(|db| db.is_available())
            .unwrap_or(false)
    }

    fn require_database(&self) -> ApiResult<&DatabaseHandles> {
        match &self.database {
            Some(db) if db.is_available() => Ok(db),
            Some(_) => Err(ApiError::DatabaseUnavailable("连接检查失败".to_string())),
            None => Err(ApiError::DatabaseUnavailable("未配置数据库".to_string())),
        }
    }
}
