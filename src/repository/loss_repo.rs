// ==========================================
// 甘蔗收获损失估算系统 - 损失计算仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: applied_factors 以 JSON 文本存储（有序对象）
// ==========================================

use crate::domain::loss::{AppliedFactors, LossResult};
use crate::domain::production::ProductionRecord;
use crate::domain::report::{LossReportRow, StoredLoss};
use crate::domain::types::CalculationMethod;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::production_repo::{
    parse_date, parse_harvest_type, ProductionRepository, DATE_FORMAT,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// ==========================================
// LossRepository - 损失计算仓储
// ==========================================
/// 职责: 管理 harvest_loss 表及 v_loss_report 报表视图
pub struct LossRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LossRepository {
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

    /// 保存一次损失计算
    ///
    /// # 错误
    /// - ForeignKeyViolation: production_id 不存在
    pub fn insert_loss(&self, production_id: i64, result: &LossResult) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_loss_tx(&conn, production_id, result)
    }

    /// 在同一事务内写入生产记录及其损失计算，任一失败则整体回滚
    ///
    /// # 返回
    /// (生产记录 id, 损失计算 id)
    pub fn insert_production_with_loss(
        &self,
        record: &ProductionRecord,
        result: &LossResult,
    ) -> RepositoryResult<(i64, i64)> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let production_id = ProductionRepository::insert_production_tx(&tx, record)?;
        let loss_id = Self::insert_loss_tx(&tx, production_id, result)?;

        tx.commit()?;
        Ok((production_id, loss_id))
    }

    fn insert_loss_tx(
        conn: &Connection,
        production_id: i64,
        result: &LossResult,
    ) -> RepositoryResult<i64> {
        let factors_json = serde_json::to_string(&result.applied_factors).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "applied_factors".to_string(),
                message: e.to_string(),
            }
        })?;

        conn.execute(
            r#"
            INSERT INTO harvest_loss (
                production_id, estimated_loss_tons, loss_percentage,
                applied_factors, calculation_method, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                production_id,
                result.estimated_loss_tons,
                result.loss_percentage,
                factors_json,
                result.calculation_method.to_db_str(),
                result.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, production_id, "损失计算已入库");
        Ok(id)
    }

    /// 某生产记录的全部损失计算（按计算时间倒序）
    pub fn list_losses_for_production(&self, production_id: i64) -> RepositoryResult<Vec<StoredLoss>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                id, production_id, estimated_loss_tons, loss_percentage,
                applied_factors, calculation_method, notes, calculated_at
            FROM harvest_loss
            WHERE production_id = ?1
            ORDER BY calculated_at DESC, id DESC
            "#,
        )?;

        let losses = stmt
            .query_map(params![production_id], map_loss_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(losses)
    }

    /// 损失报表（按收获日期倒序）
    ///
    /// # 参数
    /// - `from` / `to`: 收获日期闭区间，None 表示不限
    pub fn generate_loss_report(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<LossReportRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                production_id, location, harvest_date, harvest_type,
                harvested_qty_tons, planted_area_ha, productivity_t_ha,
                estimated_loss_tons, loss_percentage, calculation_method, calculated_at
            FROM v_loss_report
            WHERE (?1 IS NULL OR harvest_date >= ?1)
              AND (?2 IS NULL OR harvest_date <= ?2)
            ORDER BY harvest_date DESC, calculated_at DESC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![
                    from.map(|d| d.format(DATE_FORMAT).to_string()),
                    to.map(|d| d.format(DATE_FORMAT).to_string()),
                ],
                map_report_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        debug!(rows = rows.len(), ?from, ?to, "损失报表已生成");
        Ok(rows)
    }
}

// ==========================================
// 行映射
// ==========================================

fn map_loss_row(row: &Row<'_>) -> SqliteResult<StoredLoss> {
    Ok(StoredLoss {
        id: row.get(0)?,
        production_id: row.get(1)?,
        result: LossResult {
            estimated_loss_tons: row.get(2)?,
            loss_percentage: row.get(3)?,
            applied_factors: parse_factors(row, 4)?,
            calculation_method: parse_method(row, 5)?,
            notes: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        },
        calculated_at: row.get::<_, NaiveDateTime>(7)?,
    })
}

fn map_report_row(row: &Row<'_>) -> SqliteResult<LossReportRow> {
    Ok(LossReportRow {
        production_id: row.get(0)?,
        location: row.get(1)?,
        harvest_date: parse_date(row, 2)?,
        harvest_type: parse_harvest_type(row, 3)?,
        harvested_qty_tons: row.get(4)?,
        planted_area_ha: row.get(5)?,
        productivity_t_ha: row.get(6)?,
        estimated_loss_tons: row.get(7)?,
        loss_percentage: row.get(8)?,
        calculation_method: parse_method(row, 9)?,
        calculated_at: row.get::<_, NaiveDateTime>(10)?,
    })
}

fn parse_factors(row: &Row<'_>, idx: usize) -> SqliteResult<AppliedFactors> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_method(row: &Row<'_>, idx: usize) -> SqliteResult<CalculationMethod> {
    let raw: String = row.get(idx)?;
    CalculationMethod::from_db_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("未知的计算方法: {}", raw).into(),
        )
    })
}
