//! 区域计数: 质心落入区域的目标ID去重累计

use super::polygon::Zone;
use crate::detection::{Category, TrackedBox};
use crate::renderer::Canvas;
use std::collections::BTreeSet;
use std::sync::Arc;

/// 自上次清零以来进入过区域的目标ID集合
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneMembership {
    ids: BTreeSet<u32>,
}

impl ZoneMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入ID, 返回是否为新ID
    pub fn insert(&mut self, id: u32) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.ids.iter().copied()
    }
}

/// 处理一帧的带ID检测框
///
/// 质心在区域内 (含边界) 的框被画到画布上, 其ID加入 `membership`.
/// 返回 `membership` 当前大小.
pub fn process(
    zone: &Zone,
    canvas: &mut impl Canvas,
    boxes: &[TrackedBox],
    membership: &mut ZoneMembership,
) -> usize {
    for tracked in boxes {
        if zone.contains(tracked.bbox.center()) {
            canvas.draw_tracked(tracked);
            membership.insert(tracked.id);
        }
    }
    membership.len()
}

/// 单个类别的区域计数器
#[derive(Clone, Debug)]
pub struct ZoneCounter {
    zone: Arc<Zone>,
    category: Category,
    membership: ZoneMembership,
}

impl ZoneCounter {
    pub fn new(zone: Arc<Zone>, category: Category) -> Self {
        Self {
            zone,
            category,
            membership: ZoneMembership::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn membership(&self) -> &ZoneMembership {
        &self.membership
    }

    pub fn count(&self) -> usize {
        self.membership.len()
    }

    /// 处理本帧并在画布上写出计数
    pub fn process(&mut self, canvas: &mut impl Canvas, boxes: &[TrackedBox]) -> usize {
        let count = process(&self.zone, canvas, boxes, &mut self.membership);
        canvas.draw_count(self.category, count);
        count
    }

    /// 整点清零
    pub fn clear(&mut self) {
        self.membership.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BBox;
    use crate::renderer::NullCanvas;

    fn boxed(cx: i32, cy: i32, id: u32) -> TrackedBox {
        TrackedBox {
            bbox: BBox::new(cx - 5, cy - 5, cx + 5, cy + 5),
            id,
        }
    }

    #[derive(Default)]
    struct RecordingCanvas {
        drawn: Vec<u32>,
        counts: Vec<(Category, usize)>,
    }

    impl Canvas for RecordingCanvas {
        fn draw_tracked(&mut self, tracked: &TrackedBox) {
            self.drawn.push(tracked.id);
        }

        fn draw_zone(&mut self, _zone: &Zone) {}

        fn draw_count(&mut self, category: Category, count: usize) {
            self.counts.push((category, count));
        }
    }

    #[test]
    fn test_only_inside_boxes_are_counted_and_drawn() {
        let zone = Zone::new(vec![(0, 0), (100, 0), (100, 100), (0, 100)]);
        let mut canvas = RecordingCanvas::default();
        let mut membership = ZoneMembership::new();

        let count = process(
            &zone,
            &mut canvas,
            &[boxed(50, 50, 0), boxed(200, 50, 1), boxed(100, 20, 2)],
            &mut membership,
        );
        assert_eq!(count, 2);
        assert_eq!(canvas.drawn, vec![0, 2]);
        assert!(!membership.contains(1));
    }

    #[test]
    fn test_count_is_monotonic_until_clear() {
        let zone = Arc::new(Zone::new(vec![(0, 0), (100, 0), (100, 100), (0, 100)]));
        let mut counter = ZoneCounter::new(zone, Category::FullCompliant);
        let mut canvas = NullCanvas;

        let frames = [
            vec![boxed(10, 10, 0)],
            vec![],
            vec![boxed(10, 10, 0), boxed(20, 20, 1)],
            vec![boxed(500, 500, 2)],
            vec![boxed(30, 30, 3)],
        ];
        let mut last = 0;
        for boxes in &frames {
            let count = counter.process(&mut canvas, boxes);
            assert!(count >= last);
            last = count;
        }
        assert_eq!(last, 3);

        counter.clear();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.process(&mut canvas, &[]), 0);
    }

    #[test]
    fn test_counter_reports_count_to_canvas() {
        let zone = Arc::new(Zone::default());
        let mut counter = ZoneCounter::new(zone, Category::NonCompliant);
        let mut canvas = RecordingCanvas::default();
        counter.process(&mut canvas, &[boxed(300, 360, 4)]);
        assert_eq!(canvas.counts, vec![(Category::NonCompliant, 1)]);
    }
}
