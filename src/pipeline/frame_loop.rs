//! 帧循环
//!
//! 一个线程独占跟踪器、区域计数、调度器和画布; 报表写入全部交给派发线程.

use super::{FrameReport, RunSummary};
use crate::config::AppConfig;
use crate::detection::{Category, CategoryCounts, CategoryMatcher, CentroidTracker, ClassLabels, Tracker};
use crate::error::{ConfigError, SourceError};
use crate::input::{Frame, FrameSource};
use crate::renderer::{Canvas, ImageCanvas, NullCanvas};
use crate::schedule::{AggregationScheduler, Clock};
use crate::sink::{DispatchWorker, ShutdownReport};
use crate::zone::{Zone, ZoneCounter};
use ab_glyph::FontArc;
use image::RgbImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 标注输出参数
struct Annotation {
    width: u32,
    height: u32,
    font: Option<Arc<FontArc>>,
}

pub struct FrameLoop {
    labels: ClassLabels,
    matcher: CategoryMatcher,
    zone: Arc<Zone>,
    trackers: [CentroidTracker; 3],
    counters: [ZoneCounter; 3],
    scheduler: AggregationScheduler,
    clock: Box<dyn Clock>,
    dispatcher: DispatchWorker,
    annotation: Option<Annotation>,
    summary: RunSummary,
}

impl FrameLoop {
    pub fn new(
        config: &AppConfig,
        labels: ClassLabels,
        clock: Box<dyn Clock>,
        dispatcher: DispatchWorker,
    ) -> Result<Self, ConfigError> {
        let zone = Arc::new(config.zone());
        let threshold = config.tracker_threshold;
        Ok(Self {
            labels,
            matcher: config.matcher(),
            trackers: Category::ALL.map(|_| CentroidTracker::new(threshold)),
            counters: Category::ALL.map(|category| ZoneCounter::new(zone.clone(), category)),
            zone,
            scheduler: AggregationScheduler::new(config.timetable()?),
            clock,
            dispatcher,
            annotation: None,
            summary: RunSummary::default(),
        })
    }

    /// 开启标注输出, 每帧的 `FrameReport::canvas` 带标注画面
    pub fn with_annotation(mut self, width: u32, height: u32, font: Option<Arc<FontArc>>) -> Self {
        self.annotation = Some(Annotation {
            width,
            height,
            font,
        });
        self
    }

    pub fn scheduler(&self) -> &AggregationScheduler {
        &self.scheduler
    }

    pub fn counter(&self, category: Category) -> &ZoneCounter {
        &self.counters[category.index()]
    }

    pub fn tracker(&self, category: Category) -> &CentroidTracker {
        &self.trackers[category.index()]
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// 处理一帧
    pub fn step(&mut self, frame: Frame) -> FrameReport {
        let base = self
            .annotation
            .as_ref()
            .map(|annotation| (base_image(annotation, &frame), annotation.font.clone()));
        let Some((image, font)) = base else {
            let counts = self.track_and_count(&mut NullCanvas, &frame);
            return self.finish_frame(frame.index, counts, None);
        };

        let mut canvas = ImageCanvas::new(image, font);
        let counts = self.track_and_count(&mut canvas, &frame);
        self.finish_frame(frame.index, counts, Some(canvas.into_image()))
    }

    fn track_and_count(&mut self, canvas: &mut impl Canvas, frame: &Frame) -> CategoryCounts {
        canvas.draw_zone(&self.zone);

        let buckets = self.matcher.partition(&self.labels, &frame.detections);
        let mut counts = CategoryCounts::default();
        for category in Category::ALL {
            let i = category.index();
            let tracked = self.trackers[i].update(&buckets[i]);
            counts.set(category, self.counters[i].process(canvas, &tracked));
        }
        counts
    }

    fn finish_frame(
        &mut self,
        frame_index: u64,
        counts: CategoryCounts,
        canvas: Option<RgbImage>,
    ) -> FrameReport {
        debug!(
            "帧 {}: 计数 {:?} 合规={} 不合规={}",
            frame_index,
            counts.0,
            counts.compliant(),
            counts.non_compliant()
        );

        let events = self
            .scheduler
            .tick(self.clock.now(), counts.compliant(), counts.non_compliant());

        for event in &events {
            if event.resets_membership() {
                for counter in &mut self.counters {
                    counter.clear();
                }
            }
            self.summary.events_emitted += 1;
            if !self.dispatcher.dispatch(event.clone()) {
                self.summary.events_dropped += 1;
            }
        }
        self.summary.frames += 1;

        FrameReport {
            frame_index,
            counts,
            events,
            canvas,
        }
    }

    /// 持续处理直到输入结束或收到停止信号
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        stop: &AtomicBool,
        mut on_frame: impl FnMut(&FrameReport),
    ) -> Result<RunSummary, SourceError> {
        info!("▶️ 帧循环启动");
        while !stop.load(Ordering::Relaxed) {
            let Some(frame) = source.next_frame()? else {
                info!("📭 输入结束");
                break;
            };
            let report = self.step(frame);
            on_frame(&report);
        }
        info!(
            "⏹️ 帧循环结束: {} 帧, {} 个事件, {} 个被丢弃",
            self.summary.frames, self.summary.events_emitted, self.summary.events_dropped
        );
        Ok(self.summary)
    }

    /// 关闭派发线程
    pub fn shutdown(self, timeout: Duration) -> ShutdownReport {
        self.dispatcher.shutdown(timeout)
    }
}

/// 标注底图: 帧自带画面优先, 否则纯黑画布
fn base_image(annotation: &Annotation, frame: &Frame) -> RgbImage {
    if let Some(path) = &frame.image {
        match image::open(path) {
            Ok(img) => return img.to_rgb8(),
            Err(e) => warn!("⚠️ 无法读取帧画面 {}: {}", path.display(), e),
        }
    }
    RgbImage::new(annotation.width, annotation.height)
}
