// ==========================================
// 甘蔗收获损失估算系统 - 应用层
// ==========================================
// 职责: 命令行集成，连接用户输入与 API
// ==========================================

pub mod cli;
pub mod commands;
pub mod export;
pub mod output;
pub mod state;

// 重导出
pub use cli::{Cli, Commands, OutputFormat};
pub use commands::execute;
pub use state::AppState;
