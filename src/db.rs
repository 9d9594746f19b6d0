// ==========================================
// 甘蔗收获损失估算系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 首次打开时建表并写入默认损失系数（不做迁移）
// ==========================================

use crate::domain::loss::LossParameters;
use crate::domain::types::HarvestType;
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS cane_production (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    planted_area_ha REAL NOT NULL CHECK (planted_area_ha > 0),
    harvested_qty_tons REAL NOT NULL CHECK (harvested_qty_tons >= 0),
    harvest_type TEXT NOT NULL CHECK (harvest_type IN ('manual', 'mechanized')),
    harvest_date TEXT NOT NULL,
    variety TEXT,
    cane_age_months INTEGER CHECK (cane_age_months IS NULL OR cane_age_months > 0),
    soil_moisture_pct REAL CHECK (soil_moisture_pct IS NULL OR soil_moisture_pct BETWEEN 0 AND 100),
    avg_temperature_c REAL,
    precipitation_mm REAL,
    productivity_t_ha REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_cane_production_harvest_date
    ON cane_production (harvest_date);

CREATE TABLE IF NOT EXISTS harvest_loss (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    production_id INTEGER NOT NULL REFERENCES cane_production(id) ON DELETE CASCADE,
    estimated_loss_tons REAL NOT NULL CHECK (estimated_loss_tons >= 0),
    loss_percentage REAL NOT NULL CHECK (loss_percentage BETWEEN 0 AND 100),
    applied_factors TEXT NOT NULL,
    calculation_method TEXT NOT NULL,
    notes TEXT,
    calculated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS loss_parameters (
    harvest_type TEXT PRIMARY KEY,
    base_loss_factor REAL NOT NULL CHECK (base_loss_factor BETWEEN 0 AND 1),
    moisture_factor REAL NOT NULL CHECK (moisture_factor >= 0),
    age_factor REAL NOT NULL CHECK (age_factor >= 0),
    climate_factor REAL NOT NULL CHECK (climate_factor >= 0),
    description TEXT NOT NULL DEFAULT '',
    active INTEGER NOT NULL DEFAULT 1
);

CREATE VIEW IF NOT EXISTS v_loss_report AS
SELECT
    p.id AS production_id,
    p.location,
    p.harvest_date,
    p.harvest_type,
    p.harvested_qty_tons,
    p.planted_area_ha,
    p.productivity_t_ha,
    l.estimated_loss_tons,
    l.loss_percentage,
    l.calculation_method,
    l.calculated_at
FROM cane_production p
JOIN harvest_loss l ON l.production_id = p.id;
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys / busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并写入默认损失系数
///
/// 已存在的系数行不会被覆盖，人工调整过的参数得以保留。
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    for harvest_type in HarvestType::ALL {
        let defaults = LossParameters::default_for(harvest_type);
        conn.execute(
            r#"
            INSERT OR IGNORE INTO loss_parameters (
                harvest_type, base_loss_factor, moisture_factor,
                age_factor, climate_factor, description, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
            "#,
            params![
                defaults.harvest_type.to_db_str(),
                defaults.base_loss_factor,
                defaults.moisture_factor,
                defaults.age_factor,
                defaults.climate_factor,
                defaults.description,
            ],
        )?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 连接检查（SELECT 1）
pub fn test_connection(conn: &Connection) -> bool {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map(|v| v == 1)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM loss_parameters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        assert!(test_connection(&conn));
    }

    #[test]
    fn test_schema_version_absent_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
