// ==========================================
// 甘蔗收获损失估算系统 - 命令输出
// ==========================================
// 职责: 表格文本与 JSON 两种输出格式
// 红线: 只写 stdout，日志走 stderr
// ==========================================

use anyhow::Result;
use serde::Serialize;

use crate::api::{
    AutomaticInput, DatabaseStatus, InputSource, LossReport, ParameterStatus, RegisterOutcome,
    SaveOutcome,
};
use crate::domain::loss::LossResult;
use crate::domain::production::{GpsCoordinates, ProductionRecord, StoredProduction};
use crate::domain::report::StoredLoss;
use crate::engine::{BatchAnalysis, FullReport, MemoryTableReport, NearbyLocation, SummaryStatistics};

const RULE: &str = "==================================================";

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn heading(title: &str) {
    println!("\n{}", title);
    println!("{}", RULE);
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// ==========================================
// 生产记录
// ==========================================

pub fn print_record(record: &ProductionRecord) {
    println!("地块:       {}", record.location);
    println!("收获日期:   {}", record.harvest_date);
    println!("收获方式:   {}", record.harvest_type.label());
    println!("种植面积:   {:.2} ha", record.planted_area_ha);
    println!("收获量:     {:.2} t", record.harvested_qty_tons);
    println!("品种:       {}", opt(record.variety.as_deref()));
    println!("蔗龄:       {} 个月", opt(record.cane_age_months));
    println!("土壤湿度:   {} %", opt(record.soil_moisture_pct));
    println!("平均温度:   {} °C", opt(record.avg_temperature_c));
    println!("降水量:     {} mm", opt(record.precipitation_mm));
    if let Some(gps) = &record.gps_coordinates {
        print_coordinates(gps);
    }
}

fn print_coordinates(gps: &GpsCoordinates) {
    println!(
        "坐标:       {:.4}, {:.4} (海拔 {:.0} m)",
        gps.latitude, gps.longitude, gps.altitude
    );
}

fn source_label(input: &AutomaticInput) -> String {
    match input.source {
        InputSource::Database => format!("数据库记录 #{}", opt(input.production_id)),
        InputSource::File => "备份文件".to_string(),
        InputSource::Demo => "演示数据（数据库中无可用记录）".to_string(),
    }
}

pub fn print_automatic_input(input: &AutomaticInput) {
    heading("计算输入");
    println!("来源:       {}", source_label(input));
    print_record(&input.record);
    if !input.applied_defaults.is_empty() {
        println!("\n自动补齐的默认值:");
        for applied in &input.applied_defaults {
            println!("  - {} = {}", applied.field, applied.value);
        }
    }
}

pub fn print_register_outcome(outcome: &RegisterOutcome) {
    heading("生产记录登记");
    match outcome.production_id {
        Some(id) => println!("数据库ID:   {}", id),
        None => println!(
            "数据库:     未写入 ({})",
            outcome.database_error.as_deref().unwrap_or("未知原因")
        ),
    }
    println!("JSON 备份:  {}", outcome.backup_path.display());
}

pub fn print_productions(rows: &[StoredProduction]) {
    heading("生产记录");
    if rows.is_empty() {
        println!("（无记录）");
        return;
    }
    println!(
        "{:>5}  {:<10}  {:<32}  {:>10}  {:>10}  {:<10}  {:>8}",
        "ID", "收获日期", "地块", "面积(ha)", "产量(t)", "方式", "t/ha"
    );
    for row in rows {
        println!(
            "{:>5}  {:<10}  {:<32}  {:>10.2}  {:>10.2}  {:<10}  {:>8}",
            row.id,
            row.record.harvest_date,
            row.record.location,
            row.record.planted_area_ha,
            row.record.harvested_qty_tons,
            row.record.harvest_type.to_db_str(),
            opt(row.productivity_t_ha.map(|p| format!("{:.2}", p))),
        );
    }
}

pub fn print_production_detail(production: &StoredProduction, losses: &[StoredLoss]) {
    heading(&format!("生产记录 #{}", production.id));
    print_record(&production.record);
    println!("单产:       {} t/ha", opt(production.productivity_t_ha.map(|p| format!("{:.2}", p))));

    println!("\n损失计算 ({} 次):", losses.len());
    for loss in losses {
        println!(
            "  #{} {}  {:.2} t ({:.2}%)  [{}]",
            loss.id,
            loss.calculated_at,
            loss.result.estimated_loss_tons,
            loss.result.loss_percentage,
            loss.result.calculation_method,
        );
    }
}

pub fn print_parameters(statuses: &[ParameterStatus]) {
    heading("损失系数");
    for status in statuses {
        match &status.parameters {
            Some(p) => println!(
                "{:<10} 基础 {:.3}  湿度 {:.3}  蔗龄 {:.3}  气候 {:.3}  {}",
                status.harvest_type.to_db_str(), p.base_loss_factor, p.moisture_factor, p.age_factor,
                p.climate_factor, p.description
            ),
            None => println!(
                "{:<10} （无启用参数，使用内置默认值）",
                status.harvest_type.to_db_str()
            ),
        }
    }
}

// ==========================================
// 计算结果
// ==========================================

pub fn print_loss_result(result: &LossResult) {
    heading("损失估算结果");
    println!("计算方法:   {}", result.calculation_method);
    println!("估算损失:   {:.2} t", result.estimated_loss_tons);
    println!("损失比例:   {:.2} %", result.loss_percentage);
    println!("修正系数:");
    for (factor, value) in result.applied_factors.iter() {
        println!("  - {:<16} {:.4}", factor.key(), value);
    }
    if !result.notes.is_empty() {
        println!("备注:       {}", result.notes);
    }
}

pub fn print_save_outcome(outcome: &SaveOutcome) {
    println!("\n损失报告:   {}", outcome.report_path.display());
    match (outcome.production_id, outcome.loss_id) {
        (Some(production_id), Some(loss_id)) => {
            println!("数据库:     生产记录 #{}，损失记录 #{}", production_id, loss_id)
        }
        _ => println!(
            "数据库:     未写入 ({})",
            outcome.database_error.as_deref().unwrap_or("未知原因")
        ),
    }
}

pub fn print_nearby(nearby: &[NearbyLocation]) {
    if nearby.is_empty() {
        println!("\n附近无已登记农场");
        return;
    }
    println!("\n附近农场:");
    for farm in nearby {
        println!("  - {} ({:.2} km)", farm.name, farm.distance_km);
    }
}

pub fn print_batch(analysis: &BatchAnalysis) {
    heading("湿度批量分析");
    println!("读数个数:   {}", analysis.total_readings);
    println!(
        "湿度:       均值 {:.2}%  范围 {:.1}% ~ {:.1}%",
        analysis.moisture_mean, analysis.moisture_range.0, analysis.moisture_range.1
    );
    println!(
        "损失:       均值 {:.2} t  范围 {:.2} ~ {:.2} t",
        analysis.loss_mean_tons, analysis.loss_range_tons.0, analysis.loss_range_tons.1
    );
    println!(
        "损失比例:   均值 {:.2}%  范围 {:.2}% ~ {:.2}%  极差 {:.2}",
        analysis.percentage_mean,
        analysis.percentage_range.0,
        analysis.percentage_range.1,
        analysis.percentage_spread
    );
    println!("\n{:>8}  {:>10}  {:>8}", "湿度(%)", "损失(t)", "比例(%)");
    for detail in &analysis.details {
        println!(
            "{:>8.1}  {:>10.2}  {:>8.2}",
            detail.moisture, detail.loss_tons, detail.percentage
        );
    }
}

// ==========================================
// 报表
// ==========================================

pub fn print_loss_report(report: &LossReport) {
    heading("损失报表");
    println!("收获日期:   {} ~ {}", opt(report.from), opt(report.to));
    if report.rows.is_empty() {
        println!("（区间内无损失记录）");
        return;
    }

    println!(
        "{:<10}  {:<32}  {:<10}  {:>10}  {:>10}  {:>7}  {:<8}",
        "收获日期", "地块", "方式", "产量(t)", "损失(t)", "比例%", "方法"
    );
    for row in &report.rows {
        println!(
            "{:<10}  {:<32}  {:<10}  {:>10.2}  {:>10.2}  {:>7.2}  {:<8}",
            row.harvest_date,
            row.location,
            row.harvest_type.to_db_str(),
            row.harvested_qty_tons,
            row.estimated_loss_tons,
            row.loss_percentage,
            row.calculation_method.to_db_str(),
        );
    }

    let totals = &report.totals;
    println!(
        "\n合计: {} 条  产量 {:.2} t  损失 {:.2} t  平均损失比例 {:.2}%",
        totals.rows, totals.total_production_tons, totals.total_loss_tons, totals.mean_loss_percentage
    );
    for (harvest_type, group) in &report.by_harvest_type {
        println!(
            "  {:<10} {} 条  损失 {:.2} t  平均 {:.2}%",
            harvest_type.label(),
            group.rows,
            group.total_loss_tons,
            group.mean_loss_percentage
        );
    }
}

pub fn print_statistics(stats: &SummaryStatistics) {
    heading("历史统计");
    println!("计算次数:   {}", stats.total_count);
    println!("地块数:     {}", stats.distinct_locations);
    println!("总产量:     {:.2} t", stats.total_production_tons);
    println!(
        "损失:       均值 {:.2} t  最大 {:.2} t  最小 {:.2} t",
        stats.mean_loss_tons, stats.max_loss_tons, stats.min_loss_tons
    );
    println!("平均损失比例: {:.2} %", stats.mean_loss_percentage);
}

pub fn print_memory_report(report: &MemoryTableReport) {
    heading("分析表报表");
    println!("行数:       {}", report.summary.total_rows);
    println!("内存占用:   {:.4} MB", report.summary.memory_mb);
    println!("时间范围:   {} ~ {}", report.period_start, report.period_end);

    println!("\n列:");
    for (name, column_type) in &report.summary.column_types {
        println!("  - {:<24} {}", name, column_type);
    }

    let totals = &report.totals;
    println!("\n总产量:     {:.2} t", totals.total_production_tons);
    println!("总损失:     {:.2} t", totals.total_loss_tons);
    println!("总面积:     {:.2} ha", totals.total_area_ha);
    println!("平均收获效率: {:.2} %", totals.mean_efficiency_pct);
    println!("平均单产:   {:.2} t/ha", totals.mean_productivity_per_ha);

    println!("\n按月份:");
    for (month, count) in &report.rows_per_month {
        println!("  {:>2} 月: {}", month, count);
    }
    println!("\n按地块 ({} 个):", report.distinct_locations);
    for (location, count) in &report.rows_per_location {
        println!("  {}: {}", location, count);
    }
}

pub fn print_full_report(report: &FullReport) {
    let (major, minor, patch) = report.system_version;
    heading("系统报表");
    println!("系统版本:   {}.{}.{}", major, minor, patch);
    println!(
        "配置:       小数位 {}  调试 {}  自动保存 {}  日期格式 {}",
        report.settings.decimal_precision,
        report.settings.debug_mode,
        report.settings.auto_save,
        report.settings.date_format
    );
    println!("参考农场:   {}", report.registered_locations);
    println!("历史条数:   {}", report.history_len);

    match &report.statistics {
        Some(stats) => print_statistics(stats),
        None => println!("\n（尚无计算历史）"),
    }

    if let Some(analysis) = &report.table_analysis {
        println!("\n分析表: {} 列", analysis.columns.len());
        for (harvest_type, count) in &analysis.harvest_type_counts {
            println!("  {}: {}", harvest_type.label(), count);
        }
        println!("平均收获效率: {:.2} %", analysis.mean_efficiency_pct);
        println!("平均单产:   {:.2} t/ha", analysis.mean_productivity_per_ha);
        println!("时间范围:   {} ~ {}", analysis.period.0, analysis.period.1);
    }
}

// ==========================================
// 备份文件
// ==========================================

pub fn print_files(names: &[String]) {
    heading("JSON 备份文件");
    if names.is_empty() {
        println!("（无文件）");
        return;
    }
    for (i, name) in names.iter().enumerate() {
        println!("{:>3}. {}", i + 1, name);
    }
}

pub fn print_database_status(db_path: &str, status: &DatabaseStatus) {
    heading("数据库检查");
    println!("路径:       {}", db_path);
    if !status.available {
        println!("状态:       不可用（仅 JSON 备份模式）");
        return;
    }
    println!("状态:       连接正常");
    println!("Schema:     v{}", opt(status.schema_version));
    println!("生产记录:   {} 条", opt(status.production_count));
    if let Some(config) = status.config.as_ref().and_then(|c| c.as_object()) {
        if config.is_empty() {
            println!("配置项:     （无）");
        }
        for (key, value) in config {
            println!("  {} = {}", key, value);
        }
    }
}
