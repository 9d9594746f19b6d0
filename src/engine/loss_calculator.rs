// ==========================================
// 甘蔗收获损失估算系统 - 损失计算引擎
// ==========================================
// 职责: 组合环境修正系数，产出基础/高级损失估算
//       GPS 增强计算、多次湿度测量批量分析
// 红线: 合计系数上限 25%；结果保留两位小数
// 红线: 高级计算（含 GPS、批量）每次都写入历史
// ==========================================
// 输入: 生产记录 + 可选的自定义系数
// 输出: LossResult / BatchAnalysis
// ==========================================

mod batch;
mod core;


pub use batch::{BatchAnalysis, BatchDetail};
pub use core::{LossCalculator, MAX_TOTAL_FACTOR, NEARBY_RADIUS_KM};
