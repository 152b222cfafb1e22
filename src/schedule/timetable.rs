//! 每日时间表 (Daily timetable)
//!
//! 13个整点汇总槽 (06:59:59 … 18:59:59) + 3个日终控制槽 (汇总/导出/清空),
//! 按触发时刻升序排列. 每个槽有一个 `fired` 标志, 清空槽触发后全部复位.

use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// 报表表格布局 (各槽写入的目标单元格)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// 工作表名
    pub sheet: String,
    /// 日期戳单元格
    pub date_cell: String,
    /// 合规计数列
    pub compliant_column: String,
    /// 不合规计数列
    pub non_compliant_column: String,
    /// 第一个整点槽写入的行
    pub first_row: u32,
    /// 第一个整点槽对应的小时 (06 → 06:59:59 触发)
    pub first_hour: u32,
    /// 最后一个整点槽对应的小时
    pub last_hour: u32,
    /// 合计行
    pub total_row: u32,
    /// 日终控制槽触发时刻 (HH:MM:SS)
    pub total_at: String,
    pub export_at: String,
    pub clear_at: String,
    /// 日终清空的区域
    pub clear_ranges: Vec<String>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet: "Sheet1".to_string(),
            date_cell: "C1".to_string(),
            compliant_column: "C".to_string(),
            non_compliant_column: "D".to_string(),
            first_row: 4,
            first_hour: 6,
            last_hour: 18,
            total_row: 17,
            total_at: "19:00:30".to_string(),
            export_at: "19:01:00".to_string(),
            clear_at: "19:02:00".to_string(),
            clear_ranges: vec!["C1".to_string(), "C4:C17".to_string(), "D4:D17".to_string()],
        }
    }
}

impl SheetLayout {
    /// 带工作表前缀的区域引用
    pub fn qualify(&self, range: &str) -> String {
        if range.contains('!') || self.sheet.is_empty() {
            range.to_string()
        } else {
            format!("{}!{}", self.sheet, range)
        }
    }

    fn last_hourly_row(&self) -> u32 {
        self.first_row + self.last_hour.saturating_sub(self.first_hour)
    }
}

/// 槽触发时要执行的报表动作
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotAction {
    /// 写入日期戳和本小时的合规/不合规计数
    RawData {
        date_cell: String,
        compliant_cell: String,
        non_compliant_cell: String,
    },
    /// 对整点列求和写入合计行
    TotalCompute {
        compliant_source: String,
        non_compliant_source: String,
        compliant_target: String,
        non_compliant_target: String,
    },
    /// 导出整张表到本地文件
    Export,
    /// 清空当日工作区域
    Clear { ranges: Vec<String> },
}

/// 事件类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    RawData,
    TotalCompute,
    Export,
    Clear,
}

impl SlotAction {
    pub fn kind(&self) -> EventKind {
        match self {
            SlotAction::RawData { .. } => EventKind::RawData,
            SlotAction::TotalCompute { .. } => EventKind::TotalCompute,
            SlotAction::Export => EventKind::Export,
            SlotAction::Clear { .. } => EventKind::Clear,
        }
    }
}

/// 时间表中的一个槽
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub at: NaiveTime,
    pub label: String,
    pub action: SlotAction,
    pub fired: bool,
}

impl Slot {
    /// 该时刻是否应当触发
    pub fn is_due(&self, now: NaiveTime) -> bool {
        !self.fired && self.at == now
    }
}

/// 每日时间表
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyTimetable {
    slots: Vec<Slot>,
}

impl DailyTimetable {
    /// 根据报表布局构建时间表
    pub fn from_layout(layout: &SheetLayout) -> Result<Self, ConfigError> {
        if layout.first_hour > layout.last_hour || layout.last_hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "hourly slots {}..={} out of range",
                layout.first_hour, layout.last_hour
            )));
        }

        let mut slots = Vec::new();
        for (offset, hour) in (layout.first_hour..=layout.last_hour).enumerate() {
            let row = layout.first_row + offset as u32;
            let at = NaiveTime::from_hms_opt(hour, 59, 59)
                .ok_or_else(|| ConfigError::Invalid(format!("invalid hour {}", hour)))?;
            slots.push(Slot {
                at,
                label: format!("{:02}:00", hour),
                action: SlotAction::RawData {
                    date_cell: layout.qualify(&layout.date_cell),
                    compliant_cell: layout.qualify(&format!("{}{}", layout.compliant_column, row)),
                    non_compliant_cell: layout
                        .qualify(&format!("{}{}", layout.non_compliant_column, row)),
                },
                fired: false,
            });
        }

        let last_row = layout.last_hourly_row();
        let column_range =
            |column: &str| layout.qualify(&format!("{0}{1}:{0}{2}", column, layout.first_row, last_row));
        let total_cell =
            |column: &str| layout.qualify(&format!("{}{}", column, layout.total_row));

        slots.push(Slot {
            at: parse_time(&layout.total_at)?,
            label: "total".to_string(),
            action: SlotAction::TotalCompute {
                compliant_source: column_range(&layout.compliant_column),
                non_compliant_source: column_range(&layout.non_compliant_column),
                compliant_target: total_cell(&layout.compliant_column),
                non_compliant_target: total_cell(&layout.non_compliant_column),
            },
            fired: false,
        });
        slots.push(Slot {
            at: parse_time(&layout.export_at)?,
            label: "export".to_string(),
            action: SlotAction::Export,
            fired: false,
        });
        slots.push(Slot {
            at: parse_time(&layout.clear_at)?,
            label: "clear".to_string(),
            action: SlotAction::Clear {
                ranges: layout.clear_ranges.iter().map(|r| layout.qualify(r)).collect(),
            },
            fired: false,
        });

        slots.sort_by_key(|slot| slot.at);
        if slots.windows(2).any(|pair| pair[0].at == pair[1].at) {
            return Err(ConfigError::Invalid(
                "two timetable slots share the same instant".to_string(),
            ));
        }

        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// 重新武装全部槽 (整点 + 控制)
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.fired = false;
        }
    }

    pub fn fired_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.fired).count()
    }

    /// 尚未触发的槽
    pub fn pending(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| !slot.fired)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for DailyTimetable {
    fn default() -> Self {
        // 默认布局是固定合法的
        match Self::from_layout(&SheetLayout::default()) {
            Ok(timetable) => timetable,
            Err(_) => Self { slots: Vec::new() },
        }
    }
}

fn parse_time(text: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .map_err(|e| ConfigError::Invalid(format!("bad slot time {:?}: {}", text, e)))
}
