// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
#![allow(clippy::type_complexity)]
pub mod config; // 运行配置
pub mod detection; // 类别拆分与质心跟踪
pub mod error; // 错误类型
pub mod input; // 检测输入
pub mod pipeline; // 帧循环
pub mod renderer; // 帧标注
pub mod schedule; // 整点汇总调度
pub mod sink; // 报表端与派发线程
pub mod zone; // 区域计数

pub use crate::config::{AppConfig, SinkKind};
pub use crate::detection::{BBox, Category, CategoryCounts, CentroidTracker, Detection, Tracker};
pub use crate::pipeline::{FrameLoop, FrameReport, RunSummary};
pub use crate::schedule::{AggregationEvent, AggregationScheduler, Clock, ManualClock, SystemClock};
pub use crate::sink::{DispatchWorker, MemorySink, ReportSink, SheetsSink};
pub use crate::zone::{Zone, ZoneCounter};

pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
