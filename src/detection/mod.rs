/// 检测系统 (Detection System)
///
/// 外部检测引擎的输出在这里被整理成带身份的目标
/// - Labels:  类别标签表与类别拆分
/// - Tracker: 质心跟踪 (每个类别一个独立实例)
pub mod labels;
pub mod tracker;
pub mod types;

pub use labels::{CategoryMatcher, ClassLabels};
pub use tracker::{CentroidTracker, Tracker};
pub use types::{BBox, Category, CategoryCounts, Detection, Track, TrackedBox};
