//! 整点汇总调度器
//!
//! 每次时钟滴答检查时间表: 处于活动窗口 [05:00, 20:00] 内, 且当前秒恰好等于
//! 某个未触发槽的时刻, 则产生一个事件并置位该槽. 错过的秒当天不再补发.

use super::timetable::{DailyTimetable, EventKind, SlotAction};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, info};

/// 交给报表端的汇总事件
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationEvent {
    pub kind: EventKind,
    pub slot_label: String,
    pub date: NaiveDate,
    pub at: NaiveDateTime,
    pub compliant_count: usize,
    pub non_compliant_count: usize,
    pub action: SlotAction,
}

impl AggregationEvent {
    /// 调用方是否需要清空各类别的区域计数
    pub fn resets_membership(&self) -> bool {
        self.kind == EventKind::RawData
    }
}

/// 整点汇总调度器
#[derive(Clone, Debug)]
pub struct AggregationScheduler {
    timetable: DailyTimetable,
    window_start: NaiveTime,
    window_end: NaiveTime,
    /// 最近一次触发所在的秒, 同一秒内不会再次触发
    last_fire: Option<NaiveDateTime>,
}

impl AggregationScheduler {
    pub fn new(timetable: DailyTimetable) -> Self {
        Self {
            timetable,
            window_start: NaiveTime::from_hms_opt(5, 0, 0).unwrap_or(NaiveTime::MIN),
            window_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            last_fire: None,
        }
    }

    pub fn timetable(&self) -> &DailyTimetable {
        &self.timetable
    }

    pub fn in_window(&self, time: NaiveTime) -> bool {
        time >= self.window_start && time <= self.window_end
    }

    /// 时钟滴答
    ///
    /// 返回零个或一个事件. 清空槽触发后时间表全部复位.
    pub fn tick(
        &mut self,
        now: NaiveDateTime,
        compliant_count: usize,
        non_compliant_count: usize,
    ) -> Vec<AggregationEvent> {
        if !self.in_window(now.time()) {
            return Vec::new();
        }

        let second = truncate_to_second(now);
        if self.last_fire == Some(second) {
            return Vec::new();
        }

        let Some(slot) = self
            .timetable
            .slots_mut()
            .iter_mut()
            .find(|slot| slot.is_due(second.time()))
        else {
            return Vec::new();
        };

        slot.fired = true;
        let event = AggregationEvent {
            kind: slot.action.kind(),
            slot_label: slot.label.clone(),
            date: now.date(),
            at: second,
            compliant_count,
            non_compliant_count,
            action: slot.action.clone(),
        };
        self.last_fire = Some(second);

        info!(
            "⏰ 时间槽 {} 触发 ({:?}) 合规={} 不合规={}",
            event.slot_label, event.kind, compliant_count, non_compliant_count
        );

        if event.kind == EventKind::Clear {
            self.timetable.reset();
            debug!("🔄 时间表已复位, 等待下一天");
        }

        vec![event]
    }
}

impl Default for AggregationScheduler {
    fn default() -> Self {
        Self::new(DailyTimetable::default())
    }
}

fn truncate_to_second(now: NaiveDateTime) -> NaiveDateTime {
    now.with_nanosecond(0).unwrap_or(now)
}
