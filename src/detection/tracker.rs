//! 质心跟踪器
//! Frame-to-frame centroid association (first match under threshold, ascending ID)

use super::types::{BBox, Track, TrackedBox, ASSOCIATION_THRESHOLD};
use std::collections::BTreeMap;

// ========== 跟踪器统一接口 ==========

/// 多目标跟踪器 Trait
pub trait Tracker {
    /// 更新跟踪器
    ///
    /// # 参数
    /// - `detections`: 当前帧的检测框
    ///
    /// # 返回
    /// 与输入顺序一致的带ID检测框
    fn update(&mut self, detections: &[BBox]) -> Vec<TrackedBox>;

    /// 重置跟踪器 (清除所有跟踪, ID计数不回退)
    fn reset(&mut self);

    /// 获取当前跟踪数量
    fn track_count(&self) -> usize;
}

// ========== 质心跟踪器 ==========

/// 质心距离跟踪器
///
/// 每个检测框按ID升序与已有跟踪比较, 取第一个距离小于阈值的跟踪
/// (first-match, 非全局最近). 未在本帧出现的跟踪在帧末被丢弃.
#[derive(Clone, Debug)]
pub struct CentroidTracker {
    /// ID → 跟踪对象 (BTreeMap保证升序遍历)
    tracks: BTreeMap<u32, Track>,

    /// 下一个分配的ID
    next_id: u32,

    /// 关联距离阈值
    threshold: f64,

    /// 已处理帧数
    frame_index: u64,
}

impl Default for CentroidTracker {
    fn default() -> Self {
        Self::new(ASSOCIATION_THRESHOLD)
    }
}

impl CentroidTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 0,
            threshold,
            frame_index: 0,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 已分配的ID总数
    pub fn minted(&self) -> u32 {
        self.next_id
    }

    /// 当前存活的跟踪 (ID升序)
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    fn first_match(&self, center: (i32, i32)) -> Option<u32> {
        self.tracks
            .values()
            .find(|track| centroid_distance(center, track.center) < self.threshold)
            .map(|track| track.id)
    }
}

impl Tracker for CentroidTracker {
    fn update(&mut self, detections: &[BBox]) -> Vec<TrackedBox> {
        self.frame_index += 1;
        let mut output = Vec::with_capacity(detections.len());

        for bbox in detections {
            let center = bbox.center();

            let id = match self.first_match(center) {
                Some(id) => {
                    if let Some(track) = self.tracks.get_mut(&id) {
                        track.center = center;
                        track.last_seen = self.frame_index;
                    }
                    id
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.tracks.insert(
                        id,
                        Track {
                            id,
                            center,
                            last_seen: self.frame_index,
                        },
                    );
                    id
                }
            };

            output.push(TrackedBox { bbox: *bbox, id });
        }

        // 只保留本帧被引用的跟踪
        let mut live = BTreeMap::new();
        for tracked in &output {
            if let Some(track) = self.tracks.remove(&tracked.id) {
                live.insert(tracked.id, track);
            }
        }
        self.tracks = live;

        output
    }

    fn reset(&mut self) {
        self.tracks.clear();
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

// ========== 工具函数 ==========

/// 两个质心的欧氏距离
pub fn centroid_distance(a: (i32, i32), b: (i32, i32)) -> f64 {
    let dx = f64::from(a.0) - f64::from(b.0);
    let dy = f64::from(a.1) - f64::from(b.1);
    dx.hypot(dy)
}

/// 根据ID生成不同颜色
pub fn id_to_color(id: u32) -> (u8, u8, u8) {
    let hue = (id as f32 * 137.508) % 360.0; // 黄金角度采样
    hsv_to_rgb(hue, 0.8, 0.9)
}

/// HSV转RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn square(cx: i32, cy: i32) -> BBox {
        BBox::new(cx - 10, cy - 10, cx + 10, cy + 10)
    }

    #[test]
    fn test_empty_input() {
        let mut tracker = CentroidTracker::default();
        assert!(tracker.update(&[]).is_empty());
        assert_eq!(tracker.track_count(), 0);
        assert_eq!(tracker.minted(), 0);
    }

    #[test]
    fn test_small_motion_keeps_id() {
        let mut tracker = CentroidTracker::default();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let (mut x, mut y) = (100, 100);
        let first = tracker.update(&[square(x, y)]);
        assert_eq!(first[0].id, 0);

        for _ in 0..200 {
            // 每步位移 < 35
            x += rng.gen_range(-20..=20);
            y += rng.gen_range(-20..=20);
            let out = tracker.update(&[square(x, y)]);
            assert_eq!(out[0].id, 0);
        }
        assert_eq!(tracker.minted(), 1);
    }

    #[test]
    fn test_far_jump_mints_new_id() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[square(100, 100)]);
        let out = tracker.update(&[square(135, 100)]);
        assert_eq!(out[0].id, 1);

        // 距离约34.7, 仍在阈值内
        let out = tracker.update(&[square(160, 124)]);
        assert_eq!(out[0].id, 1);
    }

    #[test]
    fn test_minted_ids_are_dense_and_unique() {
        let mut tracker = CentroidTracker::default();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut seen = std::collections::BTreeSet::new();
        let mut max_minted = 0;

        for _ in 0..100 {
            let n = rng.gen_range(0..6);
            let boxes: Vec<BBox> = (0..n)
                .map(|_| square(rng.gen_range(0..640), rng.gen_range(0..640)))
                .collect();
            for tracked in tracker.update(&boxes) {
                seen.insert(tracked.id);
            }
            assert!(tracker.minted() >= max_minted);
            max_minted = tracker.minted();
        }

        let expected: std::collections::BTreeSet<u32> = (0..tracker.minted()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_first_match_in_ascending_id_order() {
        let mut tracker = CentroidTracker::default();
        let out = tracker.update(&[square(100, 100), square(140, 100)]);
        assert_eq!((out[0].id, out[1].id), (0, 1));

        // 新框离ID 1更近, 但ID 0也在阈值内 → 取ID 0
        let out = tracker.update(&[square(125, 100)]);
        assert_eq!(out[0].id, 0);
    }

    #[test]
    fn test_unreferenced_tracks_are_evicted() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[square(100, 100), square(300, 300)]);
        assert_eq!(tracker.track_count(), 2);

        tracker.update(&[square(102, 101)]);
        assert_eq!(tracker.track_count(), 1);

        // 被丢弃的跟踪不会再被匹配
        let out = tracker.update(&[square(300, 300)]);
        assert_eq!(out[0].id, 2);
    }

    #[test]
    fn test_two_boxes_can_share_a_track() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[square(100, 100)]);
        let out = tracker.update(&[square(105, 100), square(110, 100)]);
        assert_eq!(out[0].id, 0);
        assert_eq!(out[1].id, 0);
        assert_eq!(tracker.track_count(), 1);
    }

    #[test]
    fn test_reset_keeps_id_counter() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[square(100, 100)]);
        tracker.reset();
        let out = tracker.update(&[square(100, 100)]);
        assert_eq!(out[0].id, 1);
    }

    #[test]
    fn test_last_seen_tracks_frame_index() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[square(100, 100)]);
        tracker.update(&[square(101, 100)]);
        let track = tracker.tracks().next().expect("track");
        assert_eq!(track.last_seen, 2);
        assert_eq!(track.center, (101, 100));
    }
}
