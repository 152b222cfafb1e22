/// 帧处理流水线 (Frame Processing Pipeline)
///
/// 单线程帧循环 + 独立派发线程:
/// - FrameLoop: 类别拆分 → 三路跟踪 → 三路区域计数 → 时间表滴答
/// - Dispatch:  汇总事件交给派发线程, 帧循环不等待
pub mod frame_loop;

pub use frame_loop::FrameLoop;

use crate::detection::CategoryCounts;
use crate::schedule::AggregationEvent;
use image::RgbImage;

// ========== 帧循环输出 ==========

/// 单帧处理结果
#[derive(Clone, Debug)]
pub struct FrameReport {
    pub frame_index: u64,
    /// 三个类别当前的区域计数
    pub counts: CategoryCounts,
    /// 本帧触发的汇总事件
    pub events: Vec<AggregationEvent>,
    /// 标注后的画面 (开启标注时)
    pub canvas: Option<RgbImage>,
}

/// 整次运行的统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub events_emitted: u64,
    pub events_dropped: u64,
}
