use super::*;
use crate::config::EngineSettings;
use crate::engine::history::default_locations;
use crate::engine::HistoryManager;
use tempfile::TempDir;

fn harvest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn calculator() -> LossCalculator {
    LossCalculator::with_history(HistoryManager::with_locations(
        EngineSettings::default(),
        default_locations(),
    ))
}

fn api_without_db(dir: &TempDir) -> HarvestLossApi {
    let backup = JsonBackupStore::open(dir.path().join("data")).unwrap();
    HarvestLossApi::new(calculator(), None, backup)
}

fn api_with_db(dir: &TempDir) -> HarvestLossApi {
    let db_path = dir.path().join("cane_loss.db");
    let database = DatabaseHandles::open(db_path.to_str().unwrap()).unwrap();
    let backup = JsonBackupStore::open(dir.path().join("data")).unwrap();
    HarvestLossApi::new(calculator(), Some(database), backup)
}

fn minimal_record() -> ProductionRecord {
    ProductionRecord::new("Talhão 7", 20.0, 1000.0, HarvestType::Manual, harvest_date())
}

// ==========================================
// 自动模式
// ==========================================

#[test]
fn test_apply_automatic_defaults_fills_missing_fields() {
    let mut record = minimal_record();
    assert_eq!(choose_method(&record), CalculationMethod::Basic);

    let applied = apply_automatic_defaults(&mut record);
    let fields: Vec<&str> = applied.iter().map(|d| d.field).collect();
    assert_eq!(
        fields,
        vec![
            "cane_age_months",
            "soil_moisture_pct",
            "avg_temperature_c",
            "precipitation_mm",
            "variety"
        ]
    );
    assert_eq!(record.cane_age_months, Some(14));
    assert_eq!(record.soil_moisture_pct, Some(65.0));
    assert_eq!(record.variety.as_deref(), Some("RB92579"));
    assert_eq!(choose_method(&record), CalculationMethod::Advanced);
}

#[test]
fn test_apply_automatic_defaults_keeps_existing_values() {
    let mut record = minimal_record().with_soil_moisture(55.0).with_cane_age(20);
    let applied = apply_automatic_defaults(&mut record);

    assert_eq!(applied.len(), 3);
    assert_eq!(record.soil_moisture_pct, Some(55.0));
    assert_eq!(record.cane_age_months, Some(20));
}

#[test]
fn test_partial_climate_selects_basic() {
    let mut record = minimal_record().with_soil_moisture(65.0).with_cane_age(14);
    record.avg_temperature_c = Some(27.0);
    assert_eq!(choose_method(&record), CalculationMethod::Basic);
}

#[test]
fn test_automatic_input_falls_back_to_demo_without_database() {
    let dir = TempDir::new().unwrap();
    let api = api_without_db(&dir);

    let input = api.automatic_input_or_demo(None, harvest_date()).unwrap();
    assert_eq!(input.source, InputSource::Demo);
    assert_eq!(input.production_id, None);
    assert_eq!(input.record.location, "Fazenda Exemplo - Talhão Demo");
    assert!(input.applied_defaults.is_empty());
}

#[test]
fn test_automatic_input_falls_back_to_demo_on_empty_database() {
    let dir = TempDir::new().unwrap();
    let api = api_with_db(&dir);

    assert!(matches!(api.automatic_input(None), Err(ApiError::NotFound(_))));
    let input = api.automatic_input_or_demo(None, harvest_date()).unwrap();
    assert_eq!(input.source, InputSource::Demo);
}

#[test]
fn test_automatic_input_uses_latest_stored_record() {
    let dir = TempDir::new().unwrap();
    let api = api_with_db(&dir);

    let outcome = api.register_production(&minimal_record()).unwrap();
    let id = outcome.production_id.unwrap();

    let input = api.automatic_input(None).unwrap();
    assert_eq!(input.source, InputSource::Database);
    assert_eq!(input.production_id, Some(id));
    assert_eq!(input.record.location, "Talhão 7");
    assert_eq!(input.applied_defaults.len(), 5);

    assert!(matches!(
        api.automatic_input(Some(id + 100)),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 计算
// ==========================================

#[test]
fn test_calculate_basic_when_conditions_incomplete() {
    let dir = TempDir::new().unwrap();
    let mut api = api_without_db(&dir);

    let result = api.calculate(&minimal_record()).unwrap();
    assert_eq!(result.calculation_method, CalculationMethod::Basic);
    assert_eq!(result.estimated_loss_tons, 50.0);
    assert_eq!(result.loss_percentage, 5.0);
    assert!(api.calculator().history().is_empty());
}

#[test]
fn test_calculate_demo_record_is_advanced() {
    let dir = TempDir::new().unwrap();
    let mut api = api_without_db(&dir);

    let result = api.calculate(&demo_record(harvest_date())).unwrap();
    assert_eq!(result.calculation_method, CalculationMethod::Advanced);
    assert_eq!(result.estimated_loss_tons, 640.0);
    assert_eq!(result.loss_percentage, 8.0);
    assert_eq!(api.calculator().history().len(), 1);
}

#[test]
fn test_calculate_rejects_invalid_record_with_all_violations() {
    let dir = TempDir::new().unwrap();
    let mut api = api_without_db(&dir);

    let record = ProductionRecord::new("  ", 0.0, 100.0, HarvestType::Manual, harvest_date());
    match api.calculate(&record) {
        Err(ApiError::ValidationError(violations)) => assert_eq!(violations.len(), 2),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_calculate_with_default_coordinates() {
    let dir = TempDir::new().unwrap();
    let mut api = api_without_db(&dir);

    let mut record = demo_record(harvest_date());
    let result = api
        .calculate_with_coordinates(&mut record, DEFAULT_COORDINATES)
        .unwrap();

    assert_eq!(record.gps_coordinates, Some(DEFAULT_COORDINATES));
    assert_eq!(result.estimated_loss_tons, 640.0);
    assert_eq!(api.calculator().history().len(), 1);
}

#[test]
fn test_analyze_example_readings() {
    let dir = TempDir::new().unwrap();
    let mut api = api_without_db(&dir);

    let mut record = demo_record(harvest_date());
    let analysis = api
        .analyze_readings(&mut record, &EXAMPLE_MOISTURE_READINGS)
        .unwrap();

    assert_eq!(analysis.total_readings, 8);
    assert_eq!(analysis.moisture_range, (62.8, 69.0));
    assert_eq!(api.calculator().history().len(), 8);
}

#[test]
fn test_nearby_farms() {
    let dir = TempDir::new().unwrap();
    let api = api_without_db(&dir);

    let nearby = api.nearby_farms(-22.1234, -47.5678, 15.0);
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].name, "Fazenda São João");
    assert!(api.nearby_farms(0.0, 0.0, 15.0).is_empty());
}

// ==========================================
// 登记与保存
// ==========================================

#[test]
fn test_register_without_database_still_writes_backup() {
    let dir = TempDir::new().unwrap();
    let api = api_without_db(&dir);

    let outcome = api.register_production(&minimal_record()).unwrap();
    assert_eq!(outcome.production_id, None);
    assert!(outcome.database_error.is_some());
    assert!(outcome.backup_path.exists());

    let files = api.list_files().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("production_"));

    let loaded = api.load_production_file(&files[0]).unwrap();
    assert_eq!(loaded, minimal_record());
}

#[test]
fn test_register_invalid_record_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let api = api_with_db(&dir);

    let record = ProductionRecord::new("Talhão 7", -1.0, -5.0, HarvestType::Manual, harvest_date());
    assert!(matches!(
        api.register_production(&record),
        Err(ApiError::ValidationError(_))
    ));
    assert!(api.list_files().unwrap().is_empty());
    assert!(api.list_productions(10).unwrap().is_empty());
}

#[test]
fn test_register_and_query_with_database() {
    let dir = TempDir::new().unwrap();
    let api = api_with_db(&dir);
    assert!(api.database_available());

    let outcome = api.register_production(&minimal_record()).unwrap();
    let id = outcome.production_id.unwrap();
    assert!(outcome.database_error.is_none());

    let stored = api.fetch_production(id).unwrap();
    assert_eq!(stored.record.location, "Talhão 7");
    assert_eq!(stored.productivity_t_ha, Some(50.0));
    assert_eq!(api.list_productions(10).unwrap().len(), 1);
    assert!(matches!(api.fetch_production(id + 1), Err(ApiError::NotFound(_))));
}

#[test]
fn test_save_result_writes_report_and_database_rows() {
    let dir = TempDir::new().unwrap();
    let mut api = api_with_db(&dir);

    let record = demo_record(harvest_date());
    let result = api.calculate(&record).unwrap();
    let outcome = api.save_result(&record, &result).unwrap();

    assert!(outcome.report_path.exists());
    assert!(outcome.database_error.is_none());
    let production_id = outcome.production_id.unwrap();

    let losses = api.losses_for_production(production_id).unwrap();
    assert_eq!(losses.len(), 1);
    assert_eq!(losses[0].result, result);

    let document = api
        .read_file(outcome.report_path.file_name().unwrap().to_str().unwrap())
        .unwrap();
    assert_eq!(document["summary"]["potential_production_tons"], 8640.0);
}

#[test]
fn test_save_result_without_database_keeps_json_report() {
    let dir = TempDir::new().unwrap();
    let mut api = api_without_db(&dir);

    let record = demo_record(harvest_date());
    let result = api.calculate(&record).unwrap();
    let outcome = api.save_result(&record, &result).unwrap();

    assert!(outcome.report_path.exists());
    assert_eq!(outcome.production_id, None);
    assert!(outcome.database_error.is_some());
}

#[test]
fn test_save_result_rolls_back_production_when_loss_insert_fails() {
    let dir = TempDir::new().unwrap();
    let mut api = api_with_db(&dir);

    let record = demo_record(harvest_date());
    let mut result = api.calculate(&record).unwrap();
    result.loss_percentage = 150.0;
    let outcome = api.save_result(&record, &result).unwrap();

    assert!(outcome.report_path.exists());
    assert_eq!(outcome.production_id, None);
    assert_eq!(outcome.loss_id, None);
    assert!(outcome.database_error.is_some());
    assert!(api.list_productions(10).unwrap().is_empty());
}

#[test]
fn test_delete_file() {
    let dir = TempDir::new().unwrap();
    let api = api_without_db(&dir);

    let outcome = api.register_production(&minimal_record()).unwrap();
    let name = outcome.backup_path.file_name().unwrap().to_str().unwrap().to_string();

    api.delete_file(&name).unwrap();
    assert!(api.list_files().unwrap().is_empty());
    assert!(api.delete_file(&name).is_err());
}

#[test]
fn test_loss_parameters_seeded() {
    let dir = TempDir::new().unwrap();
    let api = api_with_db(&dir);

    let statuses = api.loss_parameters().unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].harvest_type, HarvestType::Manual);
    assert_eq!(statuses[0].parameters.as_ref().unwrap().base_loss_factor, 0.05);
    assert_eq!(statuses[1].parameters.as_ref().unwrap().base_loss_factor, 0.08);
}

#[test]
fn test_database_operations_require_database() {
    let dir = TempDir::new().unwrap();
    let api = api_without_db(&dir);

    assert!(!api.database_available());
    assert!(matches!(
        api.list_productions(5),
        Err(ApiError::DatabaseUnavailable(_))
    ));
    assert!(matches!(
        api.loss_report(ReportPeriod::All, harvest_date()),
        Err(ApiError::DatabaseUnavailable(_))
    ));
}

// ==========================================
// 报表
// ==========================================

#[test]
fn test_report_period_bounds() {
    let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

    assert_eq!(ReportPeriod::All.bounds(today).unwrap(), (None, None));
    assert_eq!(
        ReportPeriod::recent().bounds(today).unwrap(),
        (NaiveDate::from_ymd_opt(2024, 3, 2), Some(today))
    );

    let inverted = ReportPeriod::Range {
        from: today,
        to: harvest_date(),
    };
    assert!(matches!(
        inverted.bounds(today),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(ReportPeriod::LastDays(-1).bounds(today).is_err());
}

#[test]
fn test_report_period_beyond_calendar_is_rejected() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    for days in [100_000_000, i64::MAX] {
        assert!(matches!(
            ReportPeriod::LastDays(days).bounds(today),
            Err(ApiError::InvalidInput(_))
        ));
    }
    assert_eq!(
        ReportPeriod::LastDays(0).bounds(today).unwrap(),
        (Some(today), Some(today))
    );
}

#[test]
fn test_loss_report_totals_and_grouping() {
    let dir = TempDir::new().unwrap();
    let mut api = api_with_db(&dir);

    let demo = demo_record(harvest_date());
    let demo_result = api.calculate(&demo).unwrap();
    api.save_result(&demo, &demo_result).unwrap();

    let manual = minimal_record();
    let manual_result = api.calculate(&manual).unwrap();
    api.save_result(&manual, &manual_result).unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let report = api.loss_report(ReportPeriod::All, today).unwrap();
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.totals.total_loss_tons, 690.0);
    assert_eq!(report.by_harvest_type.len(), 2);
    assert_eq!(report.by_harvest_type[&HarvestType::Manual].rows, 1);

    let recent = api.loss_report(ReportPeriod::recent(), today).unwrap();
    assert_eq!(recent.rows.len(), 2);

    let old = api
        .loss_report(
            ReportPeriod::Range {
                from: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            },
            today,
        )
        .unwrap();
    assert!(old.rows.is_empty());
    assert_eq!(old.totals.rows, 0);
}

#[test]
fn test_summary_statistics_empty_history() {
    let dir = TempDir::new().unwrap();
    let api = api_without_db(&dir);

    assert!(matches!(
        api.summary_statistics(),
        Err(ApiError::EmptyHistory(_))
    ));
    assert!(matches!(
        api.memory_table_report(),
        Err(ApiError::EmptyHistory(_))
    ));
    assert_eq!(api.full_report().history_len, 0);
}

#[test]
fn test_restore_history_from_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cane_loss.db");

    {
        let mut api = api_with_db(&dir);
        let record = demo_record(harvest_date());
        let result = api.calculate(&record).unwrap();
        api.save_result(&record, &result).unwrap();
    }

    let database = DatabaseHandles::open(db_path.to_str().unwrap()).unwrap();
    let backup = JsonBackupStore::open(dir.path().join("data")).unwrap();
    let mut api = HarvestLossApi::new(calculator(), Some(database), backup);

    assert_eq!(api.restore_history_from_database().unwrap(), 1);
    assert_eq!(api.restore_history_from_database().unwrap(), 0);

    let stats = api.summary_statistics().unwrap();
    assert_eq!(stats.total_count, 1);
    assert_eq!(stats.mean_loss_tons, 640.0);
    assert!(api.calculator().history().latest_result("Fazenda Exemplo - Talhão Demo").is_none());
}

#[test]
fn test_input_from_backup_file() {
    let dir = TempDir::new().unwrap();
    let api = api_without_db(&dir);

    let outcome = api.register_production(&minimal_record()).unwrap();
    let input = api
        .input_from_file(outcome.backup_path.to_str().unwrap())
        .unwrap();

    assert_eq!(input.source, InputSource::File);
    assert_eq!(input.record.location, "Talhão 7");
    assert_eq!(choose_method(&input.record), CalculationMethod::Advanced);
    assert!(api.input_from_file("missing.json").is_err());
}

#[test]
fn test_database_status() {
    let dir = TempDir::new().unwrap();

    let offline = api_without_db(&dir).database_status();
    assert!(!offline.available);
    assert_eq!(offline.production_count, None);

    let api = api_with_db(&dir);
    api.register_production(&minimal_record()).unwrap();
    let status = api.database_status();
    assert!(status.available);
    assert_eq!(status.schema_version, Some(crate::db::CURRENT_SCHEMA_VERSION));
    assert_eq!(status.production_count, Some(1));
    assert_eq!(status.config, Some(serde_json::json!({})));
}
