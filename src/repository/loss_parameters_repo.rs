// ==========================================
// 甘蔗收获损失估算系统 - 损失系数仓储
// ==========================================
// 红线: 只返回启用 (active = 1) 的系数
// ==========================================

use crate::domain::loss::LossParameters;
use crate::domain::types::HarvestType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::production_repo::parse_harvest_type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct LossParametersRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LossParametersRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询某收获方式的启用系数
    pub fn fetch_loss_parameters(
        &self,
        harvest_type: HarvestType,
    ) -> RepositoryResult<Option<LossParameters>> {
        let conn = self.get_conn()?;
        let parameters = conn
            .query_row(
                r#"
                SELECT harvest_type, base_loss_factor, moisture_factor, age_factor,
                       climate_factor, description
                FROM loss_parameters
                WHERE harvest_type = ?1 AND active = 1
                "#,
                params![harvest_type.to_db_str()],
                map_parameters_row,
            )
            .optional()?;
        Ok(parameters)
    }

    /// 全部启用系数
    pub fn list_active(&self) -> RepositoryResult<Vec<LossParameters>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT harvest_type, base_loss_factor, moisture_factor, age_factor,
                   climate_factor, description
            FROM loss_parameters
            WHERE active = 1
            ORDER BY harvest_type
            "#,
        )?;
        let rows = stmt
            .query_map([], map_parameters_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 写入或更新系数，并设为启用
    pub fn upsert(&self, parameters: &LossParameters) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO loss_parameters (
                harvest_type, base_loss_factor, moisture_factor, age_factor,
                climate_factor, description, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
            ON CONFLICT(harvest_type) DO UPDATE SET
                base_loss_factor = excluded.base_loss_factor,
                moisture_factor = excluded.moisture_factor,
                age_factor = excluded.age_factor,
                climate_factor = excluded.climate_factor,
                description = excluded.description,
                active = 1
            "#,
            params![
                parameters.harvest_type.to_db_str(),
                parameters.base_loss_factor,
                parameters.moisture_factor,
                parameters.age_factor,
                parameters.climate_factor,
                parameters.description,
            ],
        )?;
        info!(harvest_type = %parameters.harvest_type, "损失系数已更新");
        Ok(())
    }

    /// 停用某收获方式的系数（计算时回退到内置默认值）
    pub fn deactivate(&self, harvest_type: HarvestType) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE loss_parameters SET active = 0 WHERE harvest_type = ?1",
            params![harvest_type.to_db_str()],
        )?;
        Ok(changed > 0)
    }
}

fn map_parameters_row(row: &Row<'_>) -> SqliteResult<LossParameters> {
    Ok(LossParameters {
        harvest_type: parse_harvest_type(row, 0)?,
        base_loss_factor: row.get(1)?,
        moisture_factor: row.get(2)?,
        age_factor: row.get(3)?,
        climate_factor: row.get(4)?,
        description: row.get(5)?,
    })
}
