/// 区域计数系统 (Zone occupancy)
///
/// - Zone:         监控区域多边形 (全局只读共享)
/// - ZoneCounter:  每个类别一个, 累计进入过区域的不同目标
pub mod counter;
pub mod polygon;

pub use counter::{process, ZoneCounter, ZoneMembership};
pub use polygon::Zone;
