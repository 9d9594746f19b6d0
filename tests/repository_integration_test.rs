// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 生产记录 → 损失结果 → 报表视图的持久化流程
// ==========================================


use cane_loss::domain::loss::{AppliedFactors, LossResult};
use cane_loss::domain::types::{CalculationMethod, HarvestType};
use cane_loss::logging;
use cane_loss::repository::{
    LossParametersRepository, LossRepository, ProductionRepository, RepositoryError,
};
use test_helpers::{basic_record, create_test_db, date, ideal_record, open_shared};

fn sample_result(loss_tons: f64, percentage: f64) -> LossResult {
    LossResult {
        estimated_loss_tons: loss_tons,
        loss_percentage: percentage,
        applied_factors: AppliedFactors::new(0.05).with_moisture(0.01),
        calculation_method: CalculationMethod::Advanced,
        notes: "高级计算: 人工收获".to_string(),
    }
}

#[test]
fn test_insert_and_fetch_production() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let repo = ProductionRepository::new(&db_path).unwrap();
    assert!(repo.test_connection());

    let record = ideal_record("Talhão 1", HarvestType::Mechanized, date(2024, 5, 10));
    let id = repo.insert_production(&record).unwrap();

    let stored = repo.fetch_production(id).unwrap().unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.record, record);
    assert_eq!(stored.productivity_t_ha, Some(80.0));
    assert!(stored.created_at.is_some());

    assert!(repo.fetch_production(id + 1).unwrap().is_none());
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn test_list_productions_ordered_by_harvest_date() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repo = ProductionRepository::new(&db_path).unwrap();

    repo.insert_production(&basic_record("A", HarvestType::Manual, date(2024, 3, 1)))
        .unwrap();
    repo.insert_production(&basic_record("B", HarvestType::Manual, date(2024, 7, 1)))
        .unwrap();
    repo.insert_production(&basic_record("C", HarvestType::Manual, date(2024, 5, 1)))
        .unwrap();

    let all = repo.list_productions(10).unwrap();
    let locations: Vec<&str> = all.iter().map(|p| p.record.location.as_str()).collect();
    assert_eq!(locations, vec!["B", "C", "A"]);

    assert_eq!(repo.list_productions(2).unwrap().len(), 2);
    let latest = repo.fetch_latest_production().unwrap().unwrap();
    assert_eq!(latest.record.location, "B");
}

#[test]
fn test_check_constraint_rejects_non_positive_area() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repo = ProductionRepository::new(&db_path).unwrap();

    let mut record = basic_record("A", HarvestType::Manual, date(2024, 3, 1));
    record.planted_area_ha = 0.0;

    let err = repo.insert_production(&record).unwrap_err();
    assert!(matches!(err, RepositoryError::CheckConstraintViolation(_)));
}

#[test]
fn test_insert_loss_and_list() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let productions = ProductionRepository::from_connection(conn.clone());
    let losses = LossRepository::from_connection(conn);

    let production_id = productions
        .insert_production(&ideal_record("Talhão 1", HarvestType::Manual, date(2024, 5, 10)))
        .unwrap();
    let result = sample_result(480.0, 6.0);
    let loss_id = losses.insert_loss(production_id, &result).unwrap();

    let stored = losses.list_losses_for_production(production_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, loss_id);
    assert_eq!(stored[0].production_id, production_id);
    assert_eq!(stored[0].result, result);
}

#[test]
fn test_insert_production_with_loss_is_atomic() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let productions = ProductionRepository::from_connection(conn.clone());
    let losses = LossRepository::from_connection(conn);
    let record = ideal_record("Talhão 2", HarvestType::Mechanized, date(2024, 6, 1));

    let (production_id, loss_id) = losses
        .insert_production_with_loss(&record, &sample_result(640.0, 8.0))
        .unwrap();
    assert_eq!(losses.list_losses_for_production(production_id).unwrap()[0].id, loss_id);
    assert_eq!(productions.count().unwrap(), 1);

    // harvest_loss 的 CHECK 约束失败时生产记录一并回滚
    let rejected = losses.insert_production_with_loss(&record, &sample_result(640.0, 150.0));
    assert!(rejected.is_err());
    assert_eq!(productions.count().unwrap(), 1);
}

#[test]
fn test_insert_loss_for_unknown_production_fails() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let losses = LossRepository::from_connection(open_shared(&db_path));

    let err = losses.insert_loss(999, &sample_result(1.0, 1.0)).unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
}

#[test]
fn test_generate_loss_report_with_date_filter() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let productions = ProductionRepository::from_connection(conn.clone());
    let losses = LossRepository::from_connection(conn);

    for (location, harvest_date) in [
        ("Março", date(2024, 3, 15)),
        ("Junho", date(2024, 6, 15)),
        ("Setembro", date(2024, 9, 15)),
    ] {
        let id = productions
            .insert_production(&basic_record(location, HarvestType::Manual, harvest_date))
            .unwrap();
        losses.insert_loss(id, &sample_result(40.0, 5.0)).unwrap();
    }

    let all = losses.generate_loss_report(None, None).unwrap();
    let locations: Vec<&str> = all.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(locations, vec!["Setembro", "Junho", "Março"]);
    assert_eq!(all[0].productivity_t_ha, Some(80.0));
    assert_eq!(all[0].calculation_method, CalculationMethod::Advanced);

    let window = losses
        .generate_loss_report(Some(date(2024, 6, 1)), Some(date(2024, 6, 30)))
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].location, "Junho");

    let since = losses.generate_loss_report(Some(date(2024, 6, 15)), None).unwrap();
    assert_eq!(since.len(), 2);
}

#[test]
fn test_loss_parameters_lifecycle() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repo = LossParametersRepository::from_connection(open_shared(&db_path));

    let manual = repo.fetch_loss_parameters(HarvestType::Manual).unwrap().unwrap();
    assert_eq!(manual.base_loss_factor, 0.05);
    assert_eq!(repo.list_active().unwrap().len(), 2);

    assert!(repo.deactivate(HarvestType::Manual).unwrap());
    assert!(repo.fetch_loss_parameters(HarvestType::Manual).unwrap().is_none());
    assert_eq!(repo.list_active().unwrap().len(), 1);

    let mut updated = manual.clone();
    updated.moisture_factor = 0.03;
    repo.upsert(&updated).unwrap();
    let reloaded = repo.fetch_loss_parameters(HarvestType::Manual).unwrap().unwrap();
    assert_eq!(reloaded.moisture_factor, 0.03);
}
