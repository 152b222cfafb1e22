//! 进程内表格报表端

use super::a1::{CellRef, RangeRef};
use super::{write_snapshot, CellValue, ReportSink, SNAPSHOT_RANGE};
use crate::error::SinkError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

type Sheet = BTreeMap<CellRef, CellValue>;

/// 进程内表格
///
/// 克隆出的句柄共享同一份数据, 派发线程写入后主线程仍可读取.
#[derive(Clone, Debug)]
pub struct MemorySink {
    sheets: Arc<Mutex<HashMap<String, Sheet>>>,
    default_sheet: String,
    export_dir: PathBuf,
}

impl MemorySink {
    pub fn new(default_sheet: impl Into<String>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            sheets: Arc::new(Mutex::new(HashMap::new())),
            default_sheet: default_sheet.into(),
            export_dir: export_dir.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Sheet>> {
        match self.sheets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn sheet_name(&self, range: &RangeRef) -> String {
        range
            .sheet
            .clone()
            .unwrap_or_else(|| self.default_sheet.clone())
    }

    /// 读取单个单元格 (测试与调试用)
    pub fn get(&self, cell: &str) -> Option<CellValue> {
        let range = RangeRef::parse(cell).ok()?;
        let name = self.sheet_name(&range);
        let sheets = self.lock();
        sheets.get(&name)?.get(&range.start).cloned()
    }

    /// 已写入的非空单元格数
    pub fn filled_cells(&self) -> usize {
        self.lock().values().map(|sheet| sheet.len()).sum()
    }
}

impl ReportSink for MemorySink {
    fn write_cell(&mut self, range: &str, value: CellValue) -> Result<(), SinkError> {
        let range = RangeRef::parse(range)?;
        let name = self.sheet_name(&range);
        self.lock().entry(name).or_default().insert(range.start, value);
        Ok(())
    }

    fn read_range(&mut self, range: &str) -> Result<Vec<Vec<CellValue>>, SinkError> {
        let range = RangeRef::parse(range)?;
        let name = self.sheet_name(&range);
        let sheets = self.lock();
        let Some(sheet) = sheets.get(&name) else {
            return Ok(Vec::new());
        };

        let last_row = match range.end_row {
            Some(row) => row,
            None => match sheet.keys().filter(|cell| range.contains(**cell)).map(|c| c.row).max() {
                Some(row) => row,
                None => return Ok(Vec::new()),
            },
        };

        let rows = (range.start.row..=last_row)
            .map(|row| {
                (range.start.col..=range.end_col)
                    .map(|col| {
                        sheet
                            .get(&CellRef { row, col })
                            .cloned()
                            .unwrap_or_else(CellValue::blank)
                    })
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    fn clear_range(&mut self, range: &str) -> Result<(), SinkError> {
        let range = RangeRef::parse(range)?;
        let name = self.sheet_name(&range);
        if let Some(sheet) = self.lock().get_mut(&name) {
            sheet.retain(|cell, _| !range.contains(*cell));
        }
        Ok(())
    }

    fn export_snapshot(&mut self, date: NaiveDate) -> Result<PathBuf, SinkError> {
        let rows = self.read_range(SNAPSHOT_RANGE)?;
        write_snapshot(&self.export_dir, date, &rows)
    }
}
