// ==========================================
// 甘蔗收获损失估算系统 - 命令处理
// ==========================================
// 职责: 解析后的命令 → HarvestLossApi 调用 → 输出
// 红线: 业务规则留在 API/引擎层，这里只做参数组装与展示
// ==========================================

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use serde_json::json;

use crate::api::{
    ApiError, AutomaticInput, HarvestLossApi, ReportPeriod, DEFAULT_COORDINATES,
    EXAMPLE_MOISTURE_READINGS,
};
use crate::app::cli::{
    Cli, Commands, FilesCommand, OutputFormat, PeriodArg, ProductionArgs, QueryCommand,
    SourceArgs,
};
use crate::app::export::write_report_csv;
use crate::app::output;
use crate::app::state::AppState;
use crate::config::AppConfig;
use crate::domain::production::{GpsCoordinates, ProductionRecord};
use crate::engine::loss_calculator::NEARBY_RADIUS_KM;

/// 执行命令
pub fn execute(cli: Cli) -> Result<()> {
    let config = build_config(&cli);
    let mut state = AppState::new(config).map_err(anyhow::Error::msg)?;
    let today = Local::now().date_naive();
    let format = cli.format;

    match cli.command {
        Commands::Register(args) => cmd_register(&state.api, args, today, format),
        Commands::Calculate { source, no_save } => {
            let save = state.config.engine.auto_save && !no_save;
            cmd_calculate(&mut state.api, &source, save, today, format)
        }
        Commands::Gps {
            source,
            lat,
            lon,
            alt,
            no_save,
        } => {
            let coordinates = GpsCoordinates::new(
                lat.unwrap_or(DEFAULT_COORDINATES.latitude),
                lon.unwrap_or(DEFAULT_COORDINATES.longitude),
                alt.unwrap_or(DEFAULT_COORDINATES.altitude),
            );
            let save = state.config.engine.auto_save && !no_save;
            cmd_gps(&mut state.api, &source, coordinates, save, today, format)
        }
        Commands::Batch { source, readings } => {
            cmd_batch(&mut state.api, &source, readings, today, format)
        }
        Commands::Report {
            period,
            days,
            from,
            to,
            csv,
        } => {
            let period = report_period(period, days, from, to)?;
            let report = state.api.loss_report(period, today)?;
            if let Some(path) = csv {
                let rows = write_report_csv(&path, &report.rows)?;
                eprintln!("已导出 {} 行到 {}", rows, path.display());
            }
            match format {
                OutputFormat::Json => output::print_json(&report),
                OutputFormat::Table => {
                    output::print_loss_report(&report);
                    Ok(())
                }
            }
        }
        Commands::Stats => cmd_stats(&mut state.api, format),
        Commands::MemoryReport { full } => cmd_memory_report(&mut state.api, full, format),
        Commands::Files(command) => cmd_files(&state.api, command, format),
        Commands::Query(command) => cmd_query(&state.api, command, format),
        Commands::CheckDb => {
            let status = state.api.database_status();
            match format {
                OutputFormat::Json => output::print_json(&json!({
                    "db_path": state.config.db_path,
                    "status": status,
                })),
                OutputFormat::Table => {
                    output::print_database_status(&state.config.db_path, &status);
                    Ok(())
                }
            }
        }
    }
}

/// 命令行参数覆盖默认路径/环境变量
fn build_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config
}

fn report_period(
    period: PeriodArg,
    days: i64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<ReportPeriod> {
    Ok(match period {
        PeriodArg::All => ReportPeriod::All,
        PeriodArg::Recent => ReportPeriod::LastDays(days),
        PeriodArg::Range => match (from, to) {
            (Some(from), Some(to)) => ReportPeriod::Range { from, to },
            _ => bail!("--period range 需要同时指定 --from 和 --to"),
        },
    })
}

fn resolve_input(api: &HarvestLossApi, source: &SourceArgs, today: NaiveDate) -> Result<AutomaticInput> {
    let input = match (&source.file, source.id) {
        (Some(file), _) => api.input_from_file(file)?,
        (None, Some(id)) => api.automatic_input(Some(id))?,
        (None, None) => api.automatic_input_or_demo(None, today)?,
    };
    Ok(input)
}

// ==========================================
// 登记与计算
// ==========================================

fn cmd_register(
    api: &HarvestLossApi,
    args: ProductionArgs,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<()> {
    let record = record_from_args(args, today);
    let outcome = api.register_production(&record)?;

    match format {
        OutputFormat::Json => output::print_json(&outcome),
        OutputFormat::Table => {
            output::print_register_outcome(&outcome);
            Ok(())
        }
    }
}

fn record_from_args(args: ProductionArgs, today: NaiveDate) -> ProductionRecord {
    let mut record = ProductionRecord::new(
        args.location,
        args.area,
        args.qty,
        args.harvest_type,
        args.date.unwrap_or(today),
    );
    record.variety = args.variety;
    record.cane_age_months = args.age;
    record.soil_moisture_pct = args.moisture;
    record.avg_temperature_c = args.temperature;
    record.precipitation_mm = args.precipitation;
    record
}

fn cmd_calculate(
    api: &mut HarvestLossApi,
    source: &SourceArgs,
    save: bool,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<()> {
    let input = resolve_input(api, source, today)?;
    let result = api.calculate(&input.record)?;
    let saved = if save {
        Some(api.save_result(&input.record, &result)?)
    } else {
        None
    };

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "input": input,
            "result": result,
            "saved": saved,
        })),
        OutputFormat::Table => {
            output::print_automatic_input(&input);
            output::print_loss_result(&result);
            if let Some(outcome) = &saved {
                output::print_save_outcome(outcome);
            }
            Ok(())
        }
    }
}

fn cmd_gps(
    api: &mut HarvestLossApi,
    source: &SourceArgs,
    coordinates: GpsCoordinates,
    save: bool,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<()> {
    let mut input = resolve_input(api, source, today)?;
    let result = api.calculate_with_coordinates(&mut input.record, coordinates)?;
    let nearby = api.nearby_farms(coordinates.latitude, coordinates.longitude, NEARBY_RADIUS_KM);
    let saved = if save {
        Some(api.save_result(&input.record, &result)?)
    } else {
        None
    };

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "input": input,
            "result": result,
            "nearby": nearby,
            "saved": saved,
        })),
        OutputFormat::Table => {
            output::print_automatic_input(&input);
            output::print_loss_result(&result);
            output::print_nearby(&nearby);
            if let Some(outcome) = &saved {
                output::print_save_outcome(outcome);
            }
            Ok(())
        }
    }
}

fn cmd_batch(
    api: &mut HarvestLossApi,
    source: &SourceArgs,
    readings: Vec<f64>,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<()> {
    let readings = if readings.is_empty() {
        EXAMPLE_MOISTURE_READINGS.to_vec()
    } else {
        readings
    };

    let mut input = resolve_input(api, source, today)?;
    let analysis = api.analyze_readings(&mut input.record, &readings)?;

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "input": input,
            "analysis": analysis,
        })),
        OutputFormat::Table => {
            output::print_automatic_input(&input);
            output::print_batch(&analysis);
            Ok(())
        }
    }
}

// ==========================================
// 历史分析
// ==========================================

/// 一次性命令没有进程内历史，先从数据库回放
fn restore_history(api: &mut HarvestLossApi) {
    match api.restore_history_from_database() {
        Ok(count) => tracing::debug!(count, "历史回放完成"),
        Err(e) => tracing::warn!("无法从数据库恢复历史: {}", e),
    }
}

fn cmd_stats(api: &mut HarvestLossApi, format: OutputFormat) -> Result<()> {
    restore_history(api);

    match api.summary_statistics() {
        Ok(stats) => match format {
            OutputFormat::Json => output::print_json(&stats),
            OutputFormat::Table => {
                output::print_statistics(&stats);
                Ok(())
            }
        },
        Err(ApiError::EmptyHistory(_)) => print_empty_history(format),
        Err(e) => Err(e.into()),
    }
}

fn cmd_memory_report(api: &mut HarvestLossApi, full: bool, format: OutputFormat) -> Result<()> {
    restore_history(api);

    if full {
        let report = api.full_report();
        return match format {
            OutputFormat::Json => output::print_json(&report),
            OutputFormat::Table => {
                output::print_full_report(&report);
                Ok(())
            }
        };
    }

    match api.memory_table_report() {
        Ok(report) => match format {
            OutputFormat::Json => output::print_json(&report),
            OutputFormat::Table => {
                output::print_memory_report(&report);
                Ok(())
            }
        },
        Err(ApiError::EmptyHistory(_)) => print_empty_history(format),
        Err(e) => Err(e.into()),
    }
}

fn print_empty_history(format: OutputFormat) -> Result<()> {
    const MESSAGE: &str = "尚无计算历史，请先执行 calculate";
    match format {
        OutputFormat::Json => output::print_json(&json!({ "empty": true, "message": MESSAGE })),
        OutputFormat::Table => {
            println!("{}", MESSAGE);
            Ok(())
        }
    }
}

// ==========================================
// 文件与查询
// ==========================================

fn cmd_files(api: &HarvestLossApi, command: FilesCommand, format: OutputFormat) -> Result<()> {
    match command {
        FilesCommand::List => {
            let names = api.list_files()?;
            match format {
                OutputFormat::Json => output::print_json(&names),
                OutputFormat::Table => {
                    output::print_files(&names);
                    Ok(())
                }
            }
        }
        FilesCommand::Show { name } => {
            // 文档本身就是 JSON，两种格式都原样输出
            output::print_json(&api.read_file(&name)?)
        }
        FilesCommand::Delete { name, yes } => {
            if !yes {
                bail!("删除 {} 需要 --yes 确认", name);
            }
            api.delete_file(&name)?;
            match format {
                OutputFormat::Json => output::print_json(&json!({ "deleted": name })),
                OutputFormat::Table => {
                    println!("已删除 {}", name);
                    Ok(())
                }
            }
        }
    }
}

fn cmd_query(api: &HarvestLossApi, command: QueryCommand, format: OutputFormat) -> Result<()> {
    match command {
        QueryCommand::List { limit } => {
            let rows = api.list_productions(limit)?;
            match format {
                OutputFormat::Json => output::print_json(&rows),
                OutputFormat::Table => {
                    output::print_productions(&rows);
                    Ok(())
                }
            }
        }
        QueryCommand::Get { id } => {
            let production = api.fetch_production(id)?;
            let losses = api.losses_for_production(id)?;
            match format {
                OutputFormat::Json => output::print_json(&json!({
                    "production": production,
                    "losses": losses,
                })),
                OutputFormat::Table => {
                    output::print_production_detail(&production, &losses);
                    Ok(())
                }
            }
        }
        QueryCommand::Params => {
            let statuses = api.loss_parameters()?;
            match format {
                OutputFormat::Json => output::print_json(&statuses),
                OutputFormat::Table => {
                    output::print_parameters(&statuses);
                    Ok(())
                }
            }
        }
    }
}
