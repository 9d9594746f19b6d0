// ==========================================
// 甘蔗收获损失估算系统 - 命令行入口
// ==========================================
// 技术栈: Rust + SQLite + JSON 备份
// ==========================================

use clap::Parser;
use cane_loss::app::{execute, Cli};
use cane_loss::logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init(cli.log_level.as_deref(), cli.log_json);

    tracing::debug!("{} v{}", cane_loss::APP_NAME, cane_loss::VERSION);

    execute(cli)
}
