// ==========================================
// 甘蔗收获损失估算系统 - 命令行定义
// ==========================================
// 职责: clap 参数与子命令声明，不含业务逻辑
// ==========================================

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::types::HarvestType;

/// 输出格式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cane-loss")]
#[command(version)]
#[command(about = "甘蔗收获损失估算")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite 数据库路径（默认用户数据目录，可用 CANE_LOSS_DB_PATH 覆盖）
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// JSON 备份目录（可用 CANE_LOSS_DATA_DIR 覆盖）
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// 输出格式
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// 日志级别，优先于 RUST_LOG（如 debug、cane_loss=trace）
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// 日志以 JSON 行输出到 stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 登记生产记录（写数据库并备份 JSON）
    Register(ProductionArgs),

    /// 计算损失（数据库记录/备份文件/演示数据）
    Calculate {
        #[command(flatten)]
        source: SourceArgs,

        /// 不保存计算结果
        #[arg(long)]
        no_save: bool,
    },

    /// GPS 增强计算，备注附近农场
    Gps {
        #[command(flatten)]
        source: SourceArgs,

        /// 纬度
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// 经度
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        /// 海拔（米）
        #[arg(long, allow_negative_numbers = true)]
        alt: Option<f64>,

        /// 不保存计算结果
        #[arg(long)]
        no_save: bool,
    },

    /// 多个土壤湿度读数的批量分析
    Batch {
        #[command(flatten)]
        source: SourceArgs,

        /// 湿度读数（逗号分隔），缺省使用示例读数
        #[arg(long, value_delimiter = ',')]
        readings: Vec<f64>,
    },

    /// 数据库损失报表
    Report {
        /// 时间范围
        #[arg(long, value_enum, default_value_t = PeriodArg::All)]
        period: PeriodArg,

        /// period=recent 时的天数
        #[arg(long, default_value_t = crate::api::RECENT_REPORT_DAYS)]
        days: i64,

        /// period=range 的起始收获日期 (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// period=range 的结束收获日期 (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// 同时导出 CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// 历史统计（从数据库回放计算记录）
    Stats,

    /// 分析表内存报表
    MemoryReport {
        /// 输出完整系统报表
        #[arg(long)]
        full: bool,
    },

    /// JSON 备份文件管理
    #[command(subcommand)]
    Files(FilesCommand),

    /// 数据库查询
    #[command(subcommand)]
    Query(QueryCommand),

    /// 检查数据库连接
    CheckDb,
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// 列出备份文件
    List,
    /// 显示备份文件内容
    Show { name: String },
    /// 删除备份文件
    Delete {
        name: String,
        /// 确认删除
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// 最近的生产记录
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// 单条生产记录及其损失计算
    Get { id: i64 },
    /// 当前启用的损失系数
    Params,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    All,
    Recent,
    Range,
}

/// 计算输入来源：--file 优先，其次 --id，否则最近一条（无则演示数据）
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// 生产记录ID
    #[arg(long)]
    pub id: Option<i64>,

    /// 生产记录备份文件（文件名或路径）
    #[arg(long, conflicts_with = "id")]
    pub file: Option<String>,
}

/// 生产记录字段
#[derive(Args, Debug, Clone)]
pub struct ProductionArgs {
    /// 地块位置
    #[arg(long)]
    pub location: String,

    /// 种植面积（公顷）
    #[arg(long)]
    pub area: f64,

    /// 收获量（吨）
    #[arg(long)]
    pub qty: f64,

    /// 收获方式 (manual / mechanized)
    #[arg(long = "harvest-type", value_parser = parse_harvest_type)]
    pub harvest_type: HarvestType,

    /// 收获日期 (YYYY-MM-DD)，缺省为今天
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// 品种
    #[arg(long)]
    pub variety: Option<String>,

    /// 蔗龄（月）
    #[arg(long)]
    pub age: Option<u32>,

    /// 土壤湿度 (%)
    #[arg(long)]
    pub moisture: Option<f64>,

    /// 平均温度 (°C)
    #[arg(long, allow_negative_numbers = true)]
    pub temperature: Option<f64>,

    /// 降水量 (mm)
    #[arg(long)]
    pub precipitation: Option<f64>,
}

fn parse_harvest_type(raw: &str) -> Result<HarvestType, String> {
    raw.parse::<HarvestType>().map_err(|e| e.to_string())
}
