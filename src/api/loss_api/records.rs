use super::*;

/// 某收获方式的参数状态（数据库中无启用行时为 None）
#[derive(Debug, Clone, Serialize)]
pub struct ParameterStatus {
    pub harvest_type: HarvestType,
    pub parameters: Option<LossParameters>,
}

/// 数据库连接检查结果
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatus {
    pub available: bool,
    pub schema_version: Option<i64>,
    pub production_count: Option<i64>,
    pub config: Option<serde_json::Value>,
}

impl HarvestLossApi {
    /// 连接状态、schema 版本、记录数与配置快照
    pub fn database_status(&self) -> DatabaseStatus {
        let db = match self.require_database() {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "数据库检查失败");
                return DatabaseStatus {
                    available: false,
                    schema_version: None,
                    production_count: None,
                    config: None,
                };
            }
        };

        DatabaseStatus {
            available: true,
            schema_version: db.schema_version().ok().flatten(),
            production_count: db.productions().count().ok(),
            config: db.config_snapshot().ok(),
        }
    }

    // ==========================================
    // 生产记录登记
    // ==========================================

    /// 登记生产记录
    ///
    /// # 说明
    /// - 校验失败直接返回全部违规项，不落库也不备份
    /// - 数据库写入失败只记录日志，JSON 备份照常写出
    pub fn register_production(&self, record: &ProductionRecord) -> ApiResult<RegisterOutcome> {
        let violations = validate_production(record);
        if !violations.is_empty() {
            return Err(ApiError::ValidationError(violations));
        }

        let (production_id, database_error) = match self.require_database() {
            Ok(db) => match db.productions().insert_production(record) {
                Ok(id) => {
                    info!(production_id = id, location = %record.location, "生产记录已入库");
                    (Some(id), None)
                }
                Err(e) => {
                    warn!(error = %e, location = %record.location, "生产记录入库失败");
                    (None, Some(e.to_string()))
                }
            },
            Err(e) => {
                warn!(error = %e, "数据库不可用，仅写 JSON 备份");
                (None, Some(e.to_string()))
            }
        };

        let backup_path = self.backup.save_production(record)?;
        info!(path = %backup_path.display(), "生产记录备份已写出");

        Ok(RegisterOutcome {
            production_id,
            backup_path,
            database_error,
        })
    }

    // ==========================================
    // 数据库查询
    // ==========================================

    /// 最近的生产记录（按收获日期倒序）
    pub fn list_productions(&self, limit: usize) -> ApiResult<Vec<StoredProduction>> {
        let db = self.require_database()?;
        Ok(db.productions().list_productions(limit)?)
    }

    pub fn fetch_production(&self, id: i64) -> ApiResult<StoredProduction> {
        let db = self.require_database()?;
        db.productions()
            .fetch_production(id)?
            .ok_or_else(|| ApiError::NotFound(format!("生产记录(id={})不存在", id)))
    }

    pub fn losses_for_production(&self, production_id: i64) -> ApiResult<Vec<StoredLoss>> {
        let db = self.require_database()?;
        Ok(db.losses().list_losses_for_production(production_id)?)
    }

    /// 两种收获方式当前启用的损失系数
    pub fn loss_parameters(&self) -> ApiResult<Vec<ParameterStatus>> {
        let db = self.require_database()?;
        HarvestType::ALL
            .iter()
            .map(|&harvest_type| {
                Ok(ParameterStatus {
                    harvest_type,
                    parameters: db.parameters().fetch_loss_parameters(harvest_type)?,
                })
            })
            .collect()
    }

    // ==========================================
    // 备份文件管理
    // ==========================================

    pub fn list_files(&self) -> ApiResult<Vec<String>> {
        Ok(self.backup.list_documents()?)
    }

    pub fn read_file(&self, name: &str) -> ApiResult<serde_json::Value> {
        Ok(self.backup.read_document(name)?)
    }

    pub fn delete_file(&self, name: &str) -> ApiResult<()> {
        self.backup.delete_document(name)?;
        info!(file = name, "备份文件已删除");
        Ok(())
    }

    /// 读取生产记录备份（文件名或路径）
    pub fn load_production_file(&self, name: &str) -> ApiResult<ProductionRecord> {
        Ok(self.backup.load_production(name)?)
    }
}
