//! 帧循环端到端: 脚本化输入 + 手动时钟 + 进程内表格

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use smartview_rs::detection::ClassLabels;
use smartview_rs::input::{Frame, FrameSource, JsonLinesSource, ScriptedSource};
use smartview_rs::schedule::EventKind;
use smartview_rs::sink::CellValue;
use smartview_rs::{
    AppConfig, BBox, Category, Detection, DispatchWorker, FrameLoop, ManualClock, MemorySink,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FULL: usize = 0;
const NON: usize = 2;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn labels() -> ClassLabels {
    ClassLabels::parse("bsufcomply\nbsumcomply\nbsunoncomply")
}

/// 以 (cx, cy) 为中心的 20x40 检测框
fn det_at(cx: i32, cy: i32, class_index: usize) -> Detection {
    Detection {
        bbox: BBox::new(cx - 10, cy - 20, cx + 10, cy + 20),
        class_index,
    }
}

fn build(clock: &ManualClock, dir: &std::path::Path) -> (FrameLoop, MemorySink) {
    let sink = MemorySink::new("Sheet1", dir);
    let worker = DispatchWorker::spawn(sink.clone(), 16).unwrap();
    let frame_loop = FrameLoop::new(
        &AppConfig::default(),
        labels(),
        Box::new(clock.clone()),
        worker,
    )
    .unwrap();
    (frame_loop, sink)
}

#[test]
fn two_objects_entering_are_counted_once_each() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(10, 0, 0));
    let (mut frame_loop, _) = build(&clock, dir.path());

    let mut frames = Vec::new();
    frames.push(Frame::new(0, Vec::new()));
    // 第1帧进入区域, 之后缓慢移动
    for i in 1..=10 {
        frames.push(Frame::new(i, vec![det_at(100 + 2 * i as i32, 345, FULL)]));
    }
    for i in 11..50 {
        frames.push(Frame::new(i, Vec::new()));
    }
    // 第50帧另一个目标出现在偏移40处
    frames.push(Frame::new(50, vec![det_at(160, 345, FULL)]));

    let mut source = ScriptedSource::new(frames);
    let stop = AtomicBool::new(false);
    let mut counts = Vec::new();
    let summary = frame_loop
        .run(&mut source, &stop, |report| {
            counts.push(report.counts.get(Category::FullCompliant));
        })
        .unwrap();

    assert_eq!(summary.frames, 51);
    assert_eq!(counts[1], 1);
    assert_eq!(counts[10], 1);
    assert_eq!(counts[50], 2);

    let counter = frame_loop.counter(Category::FullCompliant);
    assert_eq!(counter.membership().ids().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(counter.count(), 2);
    assert_eq!(frame_loop.tracker(Category::FullCompliant).minted(), 2);

    let report = frame_loop.shutdown(Duration::from_secs(5));
    assert!(!report.timed_out);
}

#[test]
fn hourly_slot_writes_once_and_resets_counts() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(6, 59, 58));
    let (mut frame_loop, sink) = build(&clock, dir.path());

    let frame = |i: u64| {
        Frame::new(
            i,
            vec![
                det_at(100, 345, FULL),
                det_at(300, 360, 1),
                det_at(500, 375, NON),
            ],
        )
    };

    assert!(frame_loop.step(frame(0)).events.is_empty());

    clock.set(at(6, 59, 59));
    let report = frame_loop.step(frame(1));
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::RawData);
    assert_eq!(report.events[0].slot_label, "06:00");
    assert_eq!(report.events[0].compliant_count, 2);
    assert_eq!(report.events[0].non_compliant_count, 1);

    // 同一秒再来一帧不再触发
    clock.advance(ChronoDuration::milliseconds(400));
    let report = frame_loop.step(frame(2));
    assert!(report.events.is_empty());
    assert_eq!(report.counts.0, [1, 1, 1]);

    let summary = frame_loop.summary();
    assert_eq!(summary.events_emitted, 1);
    assert_eq!(summary.events_dropped, 0);

    let shutdown = frame_loop.shutdown(Duration::from_secs(5));
    assert_eq!(shutdown.stats.map(|s| s.applied), Some(1));
    assert_eq!(sink.get("Sheet1!C4"), Some(CellValue::Number(2.0)));
    assert_eq!(sink.get("Sheet1!D4"), Some(CellValue::Number(1.0)));
    assert_eq!(
        sink.get("Sheet1!C1"),
        Some(CellValue::Text("March 01, 2024".into()))
    );
    assert_eq!(sink.get("Sheet1!C5"), None);
}

#[test]
fn jsonl_input_drives_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(9, 0, 0));
    let (mut frame_loop, _) = build(&clock, dir.path());

    let text = r#"{"frame": 0, "detections": [[90, 325, 110, 365, 0], [490, 355, 510, 395, 2]]}
garbage
{"frame": 1, "detections": [[92, 325, 112, 365, 0]]}

{"frame": 2, "detections": [[90, 0, 110, 40, 0]]}
"#;
    let mut source = JsonLinesSource::new(Cursor::new(text.as_bytes().to_vec()));
    let stop = AtomicBool::new(false);
    let mut last = None;
    frame_loop
        .run(&mut source, &stop, |report| last = Some(report.counts))
        .unwrap();
    assert_eq!(source.skipped(), 1);
    assert!(source.next_frame().unwrap().is_none());

    let counts = last.unwrap();
    assert_eq!(counts.get(Category::FullCompliant), 1);
    assert_eq!(counts.get(Category::NonCompliant), 1);
    // 区域外的新目标拿到新ID, 但不计数
    assert_eq!(frame_loop.tracker(Category::FullCompliant).minted(), 2);
    frame_loop.shutdown(Duration::from_secs(5));
}

#[test]
fn stop_flag_mid_run_still_drains_queued_events() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(6, 59, 59));
    let (mut frame_loop, sink) = build(&clock, dir.path());

    let frames = (0..10).map(|i| Frame::new(i, vec![det_at(100, 345, FULL)]));
    let mut source = ScriptedSource::new(frames);

    // 中断处理只置位共享标志
    let stop = Arc::new(AtomicBool::new(false));
    let interrupt = stop.clone();
    let summary = frame_loop
        .run(&mut source, &stop, |report| {
            if !report.events.is_empty() {
                interrupt.store(true, Ordering::Relaxed);
            }
        })
        .unwrap();

    assert_eq!(summary.frames, 1);
    assert_eq!(summary.events_emitted, 1);
    assert_eq!(source.remaining(), 9);

    let report = frame_loop.shutdown(Duration::from_secs(5));
    assert!(!report.timed_out);
    assert_eq!(report.stats.map(|s| s.applied), Some(1));
    assert_eq!(sink.get("Sheet1!C4"), Some(CellValue::Number(1.0)));
    assert_eq!(sink.get("Sheet1!D4"), Some(CellValue::Number(0.0)));
}
