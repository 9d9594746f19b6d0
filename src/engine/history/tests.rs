use super::*;
use crate::config::EngineSettings;
use crate::domain::loss::{AppliedFactors, LossResult};
use crate::domain::production::{GpsCoordinates, ProductionRecord};
use crate::domain::types::{CalculationMethod, HarvestType};
use crate::engine::error::EngineError;
use chrono::{NaiveDate, NaiveDateTime};

// ==========================================
// 测试辅助函数
// ==========================================

fn ts(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn record(location: &str, area: f64, qty: f64, harvest_type: HarvestType) -> ProductionRecord {
    ProductionRecord::new(
        location,
        area,
        qty,
        harvest_type,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    )
}

fn result(loss_tons: f64, loss_percentage: f64) -> LossResult {
    LossResult {
        estimated_loss_tons: loss_tons,
        loss_percentage,
        applied_factors: AppliedFactors::new(loss_percentage / 100.0),
        calculation_method: CalculationMethod::Advanced,
        notes: String::new(),
    }
}

fn manager_with_three_entries() -> HistoryManager {
    let mut manager = HistoryManager::new(EngineSettings::default());
    manager.record_at(
        ts(3, 1, 8),
        &record("Talhão A", 10.0, 800.0, HarvestType::Manual),
        &result(40.0, 5.0),
    );
    manager.record_at(
        ts(3, 15, 9),
        &record("Talhão B", 20.0, 1600.0, HarvestType::Mechanized),
        &result(128.0, 8.0),
    );
    manager.record_at(
        ts(5, 2, 10),
        &record("Talhão A", 10.0, 900.0, HarvestType::Manual),
        &result(54.0, 6.0),
    );
    manager
}

// ==========================================
// 写入与缓存
// ==========================================

#[test]
fn test_record_appends_and_updates_latest_cache() {
    let manager = manager_with_three_entries();

    assert_eq!(manager.len(), 3);
    assert_eq!(manager.entries()[0].location, "Talhão A");
    assert_eq!(manager.entries()[2].production_tons, 900.0);

    // 同一地块以最后一次为准
    let latest = manager.latest_result("Talhão A").unwrap();
    assert_eq!(latest.estimated_loss_tons, 54.0);
    assert!(manager.latest_result("Talhão C").is_none());
}

#[test]
fn test_record_keeps_coordinates() {
    let mut manager = HistoryManager::new(EngineSettings::default());
    let mut production = record("Talhão GPS", 5.0, 400.0, HarvestType::Manual);
    production.gps_coordinates = Some(GpsCoordinates::new(-22.5, -47.8, 600.0));
    manager.record(&production, &result(20.0, 5.0));

    assert_eq!(
        manager.entries()[0].coordinates,
        Some(GpsCoordinates::new(-22.5, -47.8, 600.0))
    );
}

// ==========================================
// 汇总统计
// ==========================================

#[test]
fn test_summary_statistics_on_empty_history() {
    let manager = HistoryManager::new(EngineSettings::default());
    let err = manager.summary_statistics().unwrap_err();
    assert!(err.is_empty_history());
}

#[test]
fn test_summary_statistics_single_entry() {
    let mut manager = HistoryManager::new(EngineSettings::default());
    manager.record(&record("Único", 10.0, 500.0, HarvestType::Manual), &result(25.0, 5.0));

    let stats = manager.summary_statistics().unwrap();
    assert_eq!(stats.total_count, 1);
    assert_eq!(stats.mean_loss_tons, 25.0);
    assert_eq!(stats.max_loss_tons, 25.0);
    assert_eq!(stats.min_loss_tons, 25.0);
    assert_eq!(stats.distinct_locations, 1);
}

#[test]
fn test_summary_statistics_multiple_entries() {
    let stats = manager_with_three_entries().summary_statistics().unwrap();

    assert_eq!(stats.total_count, 3);
    assert!((stats.mean_loss_tons - (40.0 + 128.0 + 54.0) / 3.0).abs() < 1e-9);
    assert_eq!(stats.max_loss_tons, 128.0);
    assert_eq!(stats.min_loss_tons, 40.0);
    assert!((stats.mean_loss_percentage - 19.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.total_production_tons, 3300.0);
    assert_eq!(stats.distinct_locations, 2);
}

// ==========================================
// 分析表
// ==========================================

#[test]
fn test_analytics_table_empty_history() {
    let table = HistoryManager::new(EngineSettings::default()).build_analytics_table();
    assert!(table.is_empty());
    assert_eq!(table.timestamp_range(), None);
    assert_eq!(table.mean(NumericColumn::LossTons), None);
}

#[test]
fn test_analytics_table_derived_columns() {
    let table = manager_with_three_entries().build_analytics_table();
    assert_eq!(table.len(), 3);

    for row in table.rows() {
        let expected = row.production_tons / (row.production_tons + row.loss_tons) * 100.0;
        assert!((row.harvest_efficiency_pct - expected).abs() < 1e-9);
        assert!((row.productivity_per_ha - row.production_tons / row.area_ha).abs() < 1e-9);
    }

    assert_eq!(table.rows()[0].productivity_per_ha, 80.0);
}

#[test]
fn test_analytics_table_zero_denominators() {
    let mut manager = HistoryManager::new(EngineSettings::default());
    manager.record(&record("Vazio", 10.0, 0.0, HarvestType::Manual), &result(0.0, 5.0));

    let table = manager.build_analytics_table();
    let row = &table.rows()[0];
    assert_eq!(row.harvest_efficiency_pct, 0.0);
    assert_eq!(row.productivity_per_ha, 0.0);
}

#[test]
fn test_analytics_table_grouping() {
    let table = manager_with_three_entries().build_analytics_table();

    let by_type = table.count_by_harvest_type();
    assert_eq!(by_type[&HarvestType::Manual], 2);
    assert_eq!(by_type[&HarvestType::Mechanized], 1);

    let by_month = table.count_by_month();
    assert_eq!(by_month[&3], 2);
    assert_eq!(by_month[&5], 1);

    assert_eq!(table.count_by_location()["Talhão A"], 2);
    assert_eq!(table.distinct_locations(), 2);
    assert_eq!(table.timestamp_range(), Some((ts(3, 1, 8), ts(5, 2, 10))));
    assert_eq!(table.sum(NumericColumn::AreaHa), 40.0);
}

#[test]
fn test_columns_include_derived() {
    let names = AnalyticsTable::column_names();
    assert_eq!(names.len(), 10);
    assert!(names.contains(&"harvest_efficiency_pct".to_string()));
    assert!(names.contains(&"productivity_per_ha".to_string()));
}

// ==========================================
// 报表
// ==========================================

#[test]
fn test_full_report_on_empty_history() {
    let report = HistoryManager::new(EngineSettings::default()).full_report();

    assert_eq!(report.system_version, (1, 0, 0));
    assert_eq!(report.settings.decimal_precision, 2);
    assert!(report.statistics.is_none());
    assert!(report.table_analysis.is_none());
    assert_eq!(report.registered_locations, 3);
    assert_eq!(report.history_len, 0);
}

#[test]
fn test_full_report_with_history() {
    let report = manager_with_three_entries().full_report();

    assert_eq!(report.history_len, 3);
    assert_eq!(report.statistics.as_ref().unwrap().total_count, 3);

    let analysis = report.table_analysis.unwrap();
    assert_eq!(analysis.harvest_type_counts[&HarvestType::Manual], 2);
    assert_eq!(analysis.period, (ts(3, 1, 8), ts(5, 2, 10)));
    assert!(analysis.mean_efficiency_pct > 90.0);
}

#[test]
fn test_full_report_serializes_harvest_type_keys() {
    let report = manager_with_three_entries().full_report();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["table_analysis"]["harvest_type_counts"]["mechanized"], 1);
    assert_eq!(json["system_version"], serde_json::json!([1, 0, 0]));
}

#[test]
fn test_memory_table_report_on_empty_history() {
    let err = HistoryManager::new(EngineSettings::default())
        .memory_table_report()
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyHistory(_)));
}

#[test]
fn test_memory_table_report_with_history() {
    let report = manager_with_three_entries().memory_table_report().unwrap();

    assert_eq!(report.summary.total_rows, 3);
    assert_eq!(report.summary.column_types["timestamp"], ColumnType::Timestamp);
    assert_eq!(report.summary.column_types["area_ha"], ColumnType::Float);
    assert!(report.summary.memory_mb > 0.0);
    assert_eq!(report.totals.total_production_tons, 3300.0);
    assert_eq!(report.totals.total_loss_tons, 222.0);
    assert_eq!(report.totals.total_area_ha, 40.0);
    assert_eq!(report.period_start, ts(3, 1, 8));
    assert_eq!(report.period_end, ts(5, 2, 10));
    assert_eq!(report.rows_per_month[&3], 2);
    assert_eq!(report.distinct_locations, 2);
    assert_eq!(report.rows_per_location["Talhão B"], 1);
}

// ==========================================
// 附近农场
// ==========================================

#[test]
fn test_find_nearby_within_radius() {
    let manager = HistoryManager::new(EngineSettings::default());
    let nearby = manager.find_nearby(-22.1234, -47.5678, 1.0);

    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].name, "Fazenda São João");
    assert_eq!(nearby[0].distance_km, 0.0);
}

#[test]
fn test_find_nearby_empty_when_far() {
    let manager = HistoryManager::new(EngineSettings::default());
    assert!(manager.find_nearby(0.0, 0.0, 15.0).is_empty());
}

#[test]
fn test_find_nearby_sorted_and_rounded() {
    let manager = HistoryManager::with_locations(
        EngineSettings::default(),
        vec![
            RegisteredLocation::new("Longe", 0.1, 0.0),
            RegisteredLocation::new("Perto", 0.0, 0.05),
            RegisteredLocation::new("Fora", 1.0, 1.0),
        ],
    );
    let nearby = manager.find_nearby(0.0, 0.0, 50.0);

    let names: Vec<&str> = nearby.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Perto", "Longe"]);
    assert_eq!(nearby[0].distance_km, 5.55);
    assert_eq!(nearby[1].distance_km, 11.1);
}
