// ==========================================
// 甘蔗收获损失估算系统 - JSON 备份存储
// ==========================================
// 文件命名:
// - production_YYYYMMDD_HHMMSS.json
// - loss_report_YYYYMMDD_HHMMSS.json
// 同一秒内重复保存时追加 _1、_2 … 后缀，不覆盖已有文件
// ==========================================

use crate::backup::error::{BackupError, BackupResult};
use crate::domain::loss::LossResult;
use crate::domain::production::ProductionRecord;
use crate::domain::types::HarvestType;
use crate::engine::stats::{ratio_or_zero, round_to};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{error, info};

const PRODUCTION_PREFIX: &str = "production";
const LOSS_REPORT_PREFIX: &str = "loss_report";
const JSON_EXTENSION: &str = "json";

// ==========================================
// 文档结构
// ==========================================

/// 生产记录备份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionDocument {
    #[serde(flatten)]
    pub record: ProductionRecord,
    pub exported_at: NaiveDateTime,
}

/// 损失报告中的生产数据摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSnapshot {
    pub location: String,
    pub planted_area_ha: f64,
    pub harvested_qty_tons: f64,
    pub harvest_type: HarvestType,
    pub harvest_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossReportSummary {
    /// 收获量 + 估算损失
    pub potential_production_tons: f64,
    pub harvest_efficiency_pct: f64,
    pub productivity_t_ha: f64,
}

impl LossReportSummary {
    pub fn compute(record: &ProductionRecord, result: &LossResult) -> Self {
        let potential = record.harvested_qty_tons + result.estimated_loss_tons;
        Self {
            potential_production_tons: potential,
            harvest_efficiency_pct: round_to(
                ratio_or_zero(record.harvested_qty_tons, potential) * 100.0,
                2,
            ),
            productivity_t_ha: round_to(
                ratio_or_zero(record.harvested_qty_tons, record.planted_area_ha),
                2,
            ),
        }
    }
}

/// 损失计算报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossReportDocument {
    pub production: ProductionSnapshot,
    pub calculation: LossResult,
    pub summary: LossReportSummary,
    pub calculated_at: NaiveDateTime,
}

impl LossReportDocument {
    pub fn new(record: &ProductionRecord, result: &LossResult) -> Self {
        Self {
            production: ProductionSnapshot {
                location: record.location.clone(),
                planted_area_ha: record.planted_area_ha,
                harvested_qty_tons: record.harvested_qty_tons,
                harvest_type: record.harvest_type,
                harvest_date: record.harvest_date,
            },
            calculation: result.clone(),
            summary: LossReportSummary::compute(record, result),
            calculated_at: Local::now().naive_local(),
        }
    }
}

// ==========================================
// JsonBackupStore
// ==========================================
#[derive(Debug, Clone)]
pub struct JsonBackupStore {
    data_dir: PathBuf,
}

impl JsonBackupStore {
    /// 打开数据目录（不存在则创建）
    pub fn open(data_dir: impl Into<PathBuf>) -> BackupResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ==========================================
    // 生产记录
    // ==========================================

    /// 保存生产记录，返回文件路径
    pub fn save_production(&self, record: &ProductionRecord) -> BackupResult<PathBuf> {
        let path = self.next_path(PRODUCTION_PREFIX);
        let document = ProductionDocument {
            record: record.clone(),
            exported_at: Local::now().naive_local(),
        };
        self.write_json(&path, &document)?;
        info!(path = %path.display(), location = %record.location, "生产记录已备份");
        Ok(path)
    }

    /// 加载生产记录
    ///
    /// # 参数
    /// - `name`: 文件名（相对数据目录）或完整路径
    pub fn load_production(&self, name: &str) -> BackupResult<ProductionRecord> {
        let path = self.resolve(name);
        if !path.is_file() {
            return Err(BackupError::NotFound(path.display().to_string()));
        }

        let file = File::open(&path)?;
        let document: ProductionDocument =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                error!(path = %path.display(), error = %e, "生产记录备份解析失败");
                BackupError::InvalidDocument(format!("{}: {}", path.display(), e))
            })?;

        info!(path = %path.display(), "生产记录已加载");
        Ok(document.record)
    }

    // ==========================================
    // 损失报告
    // ==========================================

    /// 保存损失计算报告（生产数据 + 计算结果 + 摘要）
    pub fn save_loss_report(
        &self,
        result: &LossResult,
        record: &ProductionRecord,
    ) -> BackupResult<PathBuf> {
        let path = self.next_path(LOSS_REPORT_PREFIX);
        self.write_json(&path, &LossReportDocument::new(record, result))?;
        info!(path = %path.display(), "损失报告已保存");
        Ok(path)
    }

    // ==========================================
    // 文件管理
    // ==========================================

    /// 数据目录下的 .json 文件名（升序）
    pub fn list_documents(&self) -> BackupResult<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_json_name(name))
            .collect();
        names.sort();
        Ok(names)
    }

    /// 读取任意备份文件为 JSON 值
    pub fn read_document(&self, name: &str) -> BackupResult<serde_json::Value> {
        let path = self.document_path(name)?;
        let file = File::open(&path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(value)
    }

    /// 删除备份文件
    pub fn delete_document(&self, name: &str) -> BackupResult<()> {
        let path = self.document_path(name)?;
        fs::remove_file(&path)?;
        info!(path = %path.display(), "备份文件已删除");
        Ok(())
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> BackupResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), value)?;
        Ok(())
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        let bare_name = candidate
            .parent()
            .map(|p| p.as_os_str().is_empty())
            .unwrap_or(true);
        if bare_name {
            self.data_dir.join(candidate)
        } else {
            candidate.to_path_buf()
        }
    }

    // 管理操作只接受数据目录下的文件名
    fn document_path(&self, name: &str) -> BackupResult<PathBuf> {
        if name.contains('/') || name.contains('\\') || !is_json_name(name) {
            return Err(BackupError::InvalidDocument(name.to_string()));
        }

        let path = self.data_dir.join(name);
        if !path.is_file() {
            return Err(BackupError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    fn next_path(&self, prefix: &str) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut path = self
            .data_dir
            .join(format!("{}_{}.{}", prefix, stamp, JSON_EXTENSION));

        let mut suffix = 1;
        while path.exists() {
            path = self
                .data_dir
                .join(format!("{}_{}_{}.{}", prefix, stamp, suffix, JSON_EXTENSION));
            suffix += 1;
        }
        path
    }
}

fn is_json_name(name: &str) -> bool {
    Path::new(name).extension().and_then(|ext| ext.to_str()) == Some(JSON_EXTENSION)
}
