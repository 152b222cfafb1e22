/// 报表系统 (Reporting sink)
///
/// 调度器产生的事件在独立派发线程里落到报表端:
/// - A1:       区域引用解析
/// - Memory:   进程内表格 (离线运行 / 测试)
/// - Sheets:   电子表格 values REST 接口
/// - Dispatch: 有界队列 + 派发线程, 不阻塞帧循环
pub mod a1;
pub mod dispatch;
pub mod memory;
pub mod sheets;

pub use dispatch::{DispatchStats, DispatchWorker, ShutdownReport};
pub use memory::MemorySink;
pub use sheets::SheetsSink;

use crate::error::SinkError;
use crate::schedule::{AggregationEvent, SlotAction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// 导出时读取的整表区域
pub const SNAPSHOT_RANGE: &str = "A1:Z";

/// 单元格值
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn blank() -> Self {
        CellValue::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(text) if text.trim().is_empty())
    }

    /// 数值 (文本形式的数字也可解析)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl From<usize> for CellValue {
    fn from(n: usize) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Text(text)
    }
}

/// 报表端
pub trait ReportSink: Send {
    /// 写入单个单元格
    fn write_cell(&mut self, range: &str, value: CellValue) -> Result<(), SinkError>;

    /// 读取区域 (按行)
    fn read_range(&mut self, range: &str) -> Result<Vec<Vec<CellValue>>, SinkError>;

    /// 清空区域
    fn clear_range(&mut self, range: &str) -> Result<(), SinkError>;

    /// 把整张表导出为以日期命名的本地文件
    fn export_snapshot(&mut self, date: NaiveDate) -> Result<PathBuf, SinkError>;
}

/// 日期戳格式, 例如 `March 01, 2024`
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// 导出文件名, 例如 `SMARTVIEW-2024-03-01.json`
pub fn snapshot_file_name(date: NaiveDate) -> String {
    format!("SMARTVIEW-{}.json", date.format("%Y-%m-%d"))
}

/// 把读出的整表写入导出目录
pub fn write_snapshot(
    dir: &Path,
    date: NaiveDate,
    rows: &[Vec<CellValue>],
) -> Result<PathBuf, SinkError> {
    if rows.iter().all(|row| row.iter().all(CellValue::is_blank)) {
        return Err(SinkError::Empty(SNAPSHOT_RANGE.to_string()));
    }

    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |source: std::io::Error| SinkError::Io { path, source }
    };
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let path = dir.join(snapshot_file_name(date));
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(&path, json).map_err(io_err(&path))?;
    Ok(path)
}

/// 区域内数值之和 (空白与非数字单元格跳过)
///
/// 区域完全为空时返回 `SinkError::Empty`.
pub fn sum_range(rows: &[Vec<CellValue>], range: &str) -> Result<f64, SinkError> {
    let values: Vec<&CellValue> = rows.iter().flatten().filter(|v| !v.is_blank()).collect();
    if values.is_empty() {
        return Err(SinkError::Empty(range.to_string()));
    }
    Ok(values.iter().filter_map(|v| v.as_f64()).sum())
}

/// 把一个汇总事件落到报表端
pub fn apply_event(sink: &mut dyn ReportSink, event: &AggregationEvent) -> Result<(), SinkError> {
    match &event.action {
        SlotAction::RawData {
            date_cell,
            compliant_cell,
            non_compliant_cell,
        } => {
            sink.write_cell(date_cell, CellValue::Text(date_stamp(event.date)))?;
            sink.write_cell(compliant_cell, event.compliant_count.into())?;
            sink.write_cell(non_compliant_cell, event.non_compliant_count.into())?;
            info!(
                "📝 {} 写入 {}={} {}={}",
                event.slot_label,
                compliant_cell,
                event.compliant_count,
                non_compliant_cell,
                event.non_compliant_count
            );
        }
        SlotAction::TotalCompute {
            compliant_source,
            non_compliant_source,
            compliant_target,
            non_compliant_target,
        } => {
            let compliant = sum_range(&sink.read_range(compliant_source)?, compliant_source)?;
            let non_compliant =
                sum_range(&sink.read_range(non_compliant_source)?, non_compliant_source)?;
            sink.write_cell(compliant_target, CellValue::Number(compliant))?;
            sink.write_cell(non_compliant_target, CellValue::Number(non_compliant))?;
            info!(
                "🧮 合计 {}={} {}={}",
                compliant_target, compliant, non_compliant_target, non_compliant
            );
        }
        SlotAction::Export => {
            let path = sink.export_snapshot(event.date)?;
            info!("💾 报表已导出: {}", path.display());
        }
        SlotAction::Clear { ranges } => {
            for range in ranges {
                sink.clear_range(range)?;
                info!("🧹 已清空 {}", range);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_parsing() {
        assert_eq!(CellValue::Text("12".into()).as_f64(), Some(12.0));
        assert_eq!(CellValue::Text("abc".into()).as_f64(), None);
        assert!(CellValue::blank().is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_cell_value_json_shape() {
        let rows = vec![vec![CellValue::Text("a".into()), CellValue::Number(3.0)]];
        let json = serde_json::to_string(&rows).unwrap();
        assert_eq!(json, r#"[["a",3.0]]"#);
        let back: Vec<Vec<CellValue>> = serde_json::from_str(r#"[["5", 7]]"#).unwrap();
        assert_eq!(back[0][0].as_f64(), Some(5.0));
        assert_eq!(back[0][1], CellValue::Number(7.0));
    }

    #[test]
    fn test_sum_range_skips_blanks() {
        let rows = vec![
            vec![CellValue::Number(2.0)],
            vec![CellValue::blank()],
            vec![CellValue::Text("3".into())],
            vec![CellValue::Text("n/a".into())],
        ];
        assert_eq!(sum_range(&rows, "C4:C16").unwrap(), 5.0);
        assert!(sum_range(&[vec![CellValue::blank()]], "C4:C16").is_err());
    }

    #[test]
    fn test_date_stamp_and_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(date_stamp(date), "March 01, 2024");
        assert_eq!(snapshot_file_name(date), "SMARTVIEW-2024-03-01.json");
    }
}
