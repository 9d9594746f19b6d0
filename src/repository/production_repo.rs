// ==========================================
// 甘蔗收获损失估算系统 - 生产记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection, test_connection};
use crate::domain::production::{ProductionRecord, StoredProduction};
use crate::domain::types::HarvestType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// 日期列存储格式
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

const PRODUCTION_COLUMNS: &str = r#"
    id, location, planted_area_ha, harvested_qty_tons, harvest_type, harvest_date,
    variety, cane_age_months, soil_moisture_pct, avg_temperature_c, precipitation_mm,
    productivity_t_ha, created_at
"#;

// ==========================================
// ProductionRepository - 生产记录仓储
// ==========================================
/// 职责: 管理 cane_production 表
pub struct ProductionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRepository {
    /// 打开数据库（必要时建表）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 连接检查
    pub fn test_connection(&self) -> bool {
        self.get_conn()
            .map(|conn| test_connection(&conn))
            .unwrap_or(false)
    }

    /// 插入生产记录，单位面积产量在写入时计算
    ///
    /// # 返回
    /// 新记录 id
    pub fn insert_production(&self, record: &ProductionRecord) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_production_tx(&conn, record)
    }

    /// 在调用方持有的连接/事务上插入生产记录
    pub(crate) fn insert_production_tx(
        conn: &Connection,
        record: &ProductionRecord,
    ) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT INTO cane_production (
                location, planted_area_ha, harvested_qty_tons, harvest_type, harvest_date,
                variety, cane_age_months, soil_moisture_pct, avg_temperature_c, precipitation_mm,
                productivity_t_ha
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.location,
                record.planted_area_ha,
                record.harvested_qty_tons,
                record.harvest_type.to_db_str(),
                record.harvest_date.format(DATE_FORMAT).to_string(),
                record.variety,
                record.cane_age_months,
                record.soil_moisture_pct,
                record.avg_temperature_c,
                record.precipitation_mm,
                record.productivity_t_ha(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, location = %record.location, "生产记录已入库");
        Ok(id)
    }

    /// 按 id 查询
    ///
    /// # 返回
    /// - Ok(Some(..)): 找到记录
    /// - Ok(None): 未找到
    pub fn fetch_production(&self, id: i64) -> RepositoryResult<Option<StoredProduction>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM cane_production WHERE id = ?1", PRODUCTION_COLUMNS);
        let production = conn
            .query_row(&sql, params![id], map_production_row)
            .optional()?;
        Ok(production)
    }

    /// 按收获日期倒序列出
    pub fn list_productions(&self, limit: usize) -> RepositoryResult<Vec<StoredProduction>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM cane_production ORDER BY harvest_date DESC, id DESC LIMIT ?1",
            PRODUCTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let productions = stmt
            .query_map(params![limit as i64], map_production_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        debug!(count = productions.len(), limit, "生产记录列表");
        Ok(productions)
    }

    /// 最近一次收获的记录
    pub fn fetch_latest_production(&self) -> RepositoryResult<Option<StoredProduction>> {
        Ok(self.list_productions(1)?.into_iter().next())
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM cane_production", [], |row| row.get(0))?;
        Ok(n)
    }
}

// ==========================================
// 行映射
// ==========================================

fn map_production_row(row: &Row<'_>) -> SqliteResult<StoredProduction> {
    let harvest_type = parse_harvest_type(row, 4)?;
    let harvest_date = parse_date(row, 5)?;

    let record = ProductionRecord {
        location: row.get(1)?,
        planted_area_ha: row.get(2)?,
        harvested_qty_tons: row.get(3)?,
        harvest_type,
        harvest_date,
        variety: row.get(6)?,
        cane_age_months: row.get(7)?,
        soil_moisture_pct: row.get(8)?,
        avg_temperature_c: row.get(9)?,
        precipitation_mm: row.get(10)?,
        gps_coordinates: None,
        moisture_history: None,
    };

    Ok(StoredProduction {
        id: row.get(0)?,
        record,
        productivity_t_ha: row.get(11)?,
        created_at: row.get::<_, Option<NaiveDateTime>>(12)?,
    })
}

pub(crate) fn parse_harvest_type(row: &Row<'_>, idx: usize) -> SqliteResult<HarvestType> {
    let raw: String = row.get(idx)?;
    raw.parse::<HarvestType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_date(row: &Row<'_>, idx: usize) -> SqliteResult<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
