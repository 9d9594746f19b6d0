use super::*;

// ==========================================
// 自动模式输入
// ==========================================

/// 自动模式的记录来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Database,
    File,
    Demo,
}

/// 自动模式补齐的单个默认值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedDefault {
    pub field: &'static str,
    pub value: String,
}

impl AppliedDefault {
    fn new(field: &'static str, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutomaticInput {
    pub source: InputSource,
    pub production_id: Option<i64>,
    pub record: ProductionRecord,
    pub applied_defaults: Vec<AppliedDefault>,
}

/// 用典型种植条件补齐缺失的可选字段，返回实际补齐的项
pub fn apply_automatic_defaults(record: &mut ProductionRecord) -> Vec<AppliedDefault> {
    let mut applied = Vec::new();

    if record.cane_age_months.is_none() {
        record.cane_age_months = Some(DEFAULT_CANE_AGE_MONTHS);
        applied.push(AppliedDefault::new("cane_age_months", DEFAULT_CANE_AGE_MONTHS));
    }
    if record.soil_moisture_pct.is_none() {
        record.soil_moisture_pct = Some(DEFAULT_SOIL_MOISTURE_PCT);
        applied.push(AppliedDefault::new("soil_moisture_pct", DEFAULT_SOIL_MOISTURE_PCT));
    }
    if record.avg_temperature_c.is_none() {
        record.avg_temperature_c = Some(DEFAULT_TEMPERATURE_C);
        applied.push(AppliedDefault::new("avg_temperature_c", DEFAULT_TEMPERATURE_C));
    }
    if record.precipitation_mm.is_none() {
        record.precipitation_mm = Some(DEFAULT_PRECIPITATION_MM);
        applied.push(AppliedDefault::new("precipitation_mm", DEFAULT_PRECIPITATION_MM));
    }
    if record.variety.is_none() {
        record.variety = Some(DEFAULT_VARIETY.to_string());
        applied.push(AppliedDefault::new("variety", DEFAULT_VARIETY));
    }

    applied
}

/// 湿度、蔗龄、温度、降水齐全时走高级计算，否则走基础计算
pub fn choose_method(record: &ProductionRecord) -> CalculationMethod {
    if record.site_conditions().is_complete() {
        CalculationMethod::Advanced
    } else {
        CalculationMethod::Basic
    }
}

impl HarvestLossApi {
    // ==========================================
    // 自动模式
    // ==========================================

    /// 从数据库读取生产记录（指定ID或最近一条）并补齐默认值
    ///
    /// # 错误
    /// - DatabaseUnavailable: 数据库不可用
    /// - NotFound: 指定ID不存在或库中没有记录
    pub fn automatic_input(&self, production_id: Option<i64>) -> ApiResult<AutomaticInput> {
        let db = self.require_database()?;

        let stored = match production_id {
            Some(id) => db
                .productions()
                .fetch_production(id)?
                .ok_or_else(|| ApiError::NotFound(format!("生产记录(id={})不存在", id)))?,
            None => db
                .productions()
                .fetch_latest_production()?
                .ok_or_else(|| ApiError::NotFound("数据库中没有生产记录".to_string()))?,
        };

        let mut record = stored.record;
        let applied_defaults = apply_automatic_defaults(&mut record);
        debug!(
            production_id = stored.id,
            defaults = applied_defaults.len(),
            "自动模式已补齐默认值"
        );

        Ok(AutomaticInput {
            source: InputSource::Database,
            production_id: Some(stored.id),
            record,
            applied_defaults,
        })
    }

    /// 同 `automatic_input`，无可用记录时退回演示记录
    pub fn automatic_input_or_demo(
        &self,
        production_id: Option<i64>,
        today: NaiveDate,
    ) -> ApiResult<AutomaticInput> {
        match self.automatic_input(production_id) {
            Ok(input) => Ok(input),
            Err(ApiError::NotFound(msg)) | Err(ApiError::DatabaseUnavailable(msg)) => {
                warn!(reason = %msg, "未取得生产记录，使用演示数据");
                Ok(AutomaticInput {
                    source: InputSource::Demo,
                    production_id: None,
                    record: demo_record(today),
                    applied_defaults: Vec::new(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// 读取生产记录备份文件并补齐默认值
    pub fn input_from_file(&self, name: &str) -> ApiResult<AutomaticInput> {
        let mut record = self.backup.load_production(name)?;
        let applied_defaults = apply_automatic_defaults(&mut record);
        Ok(AutomaticInput {
            source: InputSource::File,
            production_id: None,
            record,
            applied_defaults,
        })
    }

    // ==========================================
    // 计算接口
    // ==========================================

    /// 校验记录后按条件完整性选择基础或高级计算
    pub fn calculate(&mut self, record: &ProductionRecord) -> ApiResult<LossResult> {
        let violations = validate_production(record);
        if !violations.is_empty() {
            return Err(ApiError::ValidationError(violations));
        }

        let result = match choose_method(record) {
            CalculationMethod::Advanced => self.calculator.compute_advanced(record, None)?,
            CalculationMethod::Basic => {
                self.calculator
                    .compute_basic(record.harvested_qty_tons, record.harvest_type, None)?
            }
        };

        info!(
            location = %record.location,
            method = %result.calculation_method,
            loss_tons = result.estimated_loss_tons,
            "损失计算完成"
        );
        Ok(result)
    }

    /// GPS 增强计算（坐标写入记录，备注追加附近农场）
    pub fn calculate_with_coordinates(
        &mut self,
        record: &mut ProductionRecord,
        coordinates: GpsCoordinates,
    ) -> ApiResult<LossResult> {
        let violations = validate_production(record);
        if !violations.is_empty() {
            return Err(ApiError::ValidationError(violations));
        }
        Ok(self.calculator.compute_with_coordinates(record, coordinates)?)
    }

    /// 多个土壤湿度读数的批量分析
    pub fn analyze_readings(
        &mut self,
        record: &mut ProductionRecord,
        readings: &[f64],
    ) -> ApiResult<BatchAnalysis> {
        Ok(self.calculator.compute_batch(record, readings)?)
    }

    /// 半径内的已登记农场，按距离升序
    pub fn nearby_farms(&self, latitude: f64, longitude: f64, radius_km: f64) -> Vec<NearbyLocation> {
        self.calculator
            .history()
            .find_nearby(latitude, longitude, radius_km)
    }

    // ==========================================
    // 结果保存
    // ==========================================

    /// 保存计算结果
    ///
    /// 先写 JSON 损失报告（必须成功），再尝试写入数据库；
    /// 数据库失败只记录日志并在结果中返回错误描述
    pub fn save_result(
        &self,
        record: &ProductionRecord,
        result: &LossResult,
    ) -> ApiResult<SaveOutcome> {
        let report_path = self.backup.save_loss_report(result, record)?;
        info!(path = %report_path.display(), "损失报告已保存");

        let mut outcome = SaveOutcome {
            report_path,
            production_id: None,
            loss_id: None,
            database_error: None,
        };

        let db = match self.require_database() {
            Ok(db) => db,
            Err(e) => {
                outcome.database_error = Some(e.to_string());
                return Ok(outcome);
            }
        };

        match db.losses().insert_production_with_loss(record, result) {
            Ok((production_id, loss_id)) => {
                outcome.production_id = Some(production_id);
                outcome.loss_id = Some(loss_id);
            }
            Err(e) => {
                warn!(error = %e, "计算结果写入数据库失败，已回滚");
                outcome.database_error = Some(e.to_string());
            }
        }

        Ok(outcome)
    }
}
