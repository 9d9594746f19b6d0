use super::*;

/// "最近 N 天" 报表的默认天数
pub const RECENT_REPORT_DAYS: i64 = 30;

// ==========================================
// ReportPeriod - 报表时间范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    All,
    LastDays(i64),
    Range { from: NaiveDate, to: NaiveDate },
}

impl ReportPeriod {
    pub fn recent() -> Self {
        ReportPeriod::LastDays(RECENT_REPORT_DAYS)
    }

    /// 换算为收获日期闭区间
    ///
    /// # 错误
    /// - 天数为负或超出日期范围
    /// - 起始日期晚于结束日期
    pub fn bounds(&self, today: NaiveDate) -> ApiResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        match *self {
            ReportPeriod::All => Ok((None, None)),
            ReportPeriod::LastDays(days) => {
                if days < 0 {
                    return Err(ApiError::InvalidInput(format!(
                        "报表天数不能为负数，实际为 {}",
                        days
                    )));
                }
                let from = today
                    .checked_sub_days(Days::new(days.unsigned_abs()))
                    .ok_or_else(|| {
                        ApiError::InvalidInput(format!("报表天数超出日期范围: {}", days))
                    })?;
                Ok((Some(from), Some(today)))
            }
            ReportPeriod::Range { from, to } => {
                if from > to {
                    return Err(ApiError::InvalidInput(format!(
                        "起始日期 {} 晚于结束日期 {}",
                        from, to
                    )));
                }
                Ok((Some(from), Some(to)))
            }
        }
    }
}

/// 损失报表
#[derive(Debug, Clone, Serialize)]
pub struct LossReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub rows: Vec<LossReportRow>,
    pub totals: LossReportTotals,
    pub by_harvest_type: BTreeMap<HarvestType, LossReportTotals>,
}

impl HarvestLossApi {
    // ==========================================
    // 数据库报表
    // ==========================================

    pub fn loss_report(&self, period: ReportPeriod, today: NaiveDate) -> ApiResult<LossReport> {
        let (from, to) = period.bounds(today)?;
        let db = self.require_database()?;
        let rows = db.losses().generate_loss_report(from, to)?;

        let mut grouped: BTreeMap<HarvestType, Vec<LossReportRow>> = BTreeMap::new();
        for row in &rows {
            grouped.entry(row.harvest_type).or_default().push(row.clone());
        }
        let by_harvest_type = grouped
            .into_iter()
            .map(|(harvest_type, group)| (harvest_type, LossReportTotals::from_rows(&group)))
            .collect();

        Ok(LossReport {
            from,
            to,
            totals: LossReportTotals::from_rows(&rows),
            rows,
            by_harvest_type,
        })
    }

    // ==========================================
    // 历史分析
    // ==========================================

    /// 用数据库中的损失记录重建内存历史（旧到新）
    ///
    /// 仅在内存历史为空时执行，返回回放的条数
    pub fn restore_history_from_database(&mut self) -> ApiResult<usize> {
        if !self.calculator.history().is_empty() {
            return Ok(0);
        }

        let db = self.require_database()?;
        let mut rows = db.losses().generate_loss_report(None, None)?;
        rows.sort_by_key(|row| row.calculated_at);

        let history = self.calculator.history_mut();
        for row in &rows {
            history.replay(HistoryEntry {
                timestamp: row.calculated_at,
                location: row.location.clone(),
                area_ha: row.planted_area_ha,
                production_tons: row.harvested_qty_tons,
                loss_tons: row.estimated_loss_tons,
                loss_percentage: row.loss_percentage,
                harvest_type: row.harvest_type,
                coordinates: None,
            });
        }

        debug!(restored = rows.len(), "已从数据库回放历史");
        Ok(rows.len())
    }

    /// # 错误
    /// - EmptyHistory: 尚无计算记录
    pub fn summary_statistics(&self) -> ApiResult<SummaryStatistics> {
        Ok(self.calculator.history().summary_statistics()?)
    }

    pub fn full_report(&self) -> FullReport {
        self.calculator.history().full_report()
    }

    pub fn memory_table_report(&self) -> ApiResult<MemoryTableReport> {
        Ok(self.calculator.history().memory_table_report()?)
    }
}
