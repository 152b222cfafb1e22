/// 汇总调度系统 (Aggregation scheduling)
///
/// - Timetable: 每日固定时间表 (整点槽 + 日终控制槽)
/// - Scheduler: 按墙钟滴答触发, 每槽每天最多一次
/// - Clock:     系统时钟 / 手动时钟
pub mod clock;
pub mod scheduler;
pub mod timetable;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{AggregationEvent, AggregationScheduler};
pub use timetable::{DailyTimetable, EventKind, SheetLayout, Slot, SlotAction};
