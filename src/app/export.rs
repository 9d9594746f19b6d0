// ==========================================
// 甘蔗收获损失估算系统 - 报表导出
// ==========================================
// 职责: 损失报表导出为 CSV（表头即字段名）
// ==========================================

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::report::LossReportRow;

/// 写出 CSV，返回数据行数
pub fn write_report_csv(path: &Path, rows: &[LossReportRow]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("无法创建 CSV 文件 {}", path.display()))?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = rows.len(), "损失报表已导出 CSV");
    Ok(rows.len())
}
