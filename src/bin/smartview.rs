use anyhow::{bail, Context, Result};
use clap::Parser;
/// 区域计数 + 整点汇总
///
/// 主程序入口 - 直接运行: cargo run --bin smartview -- -i detections.jsonl
use mimalloc::MiMalloc;
use smartview_rs::config::{AppConfig, SinkKind};
use smartview_rs::detection::ClassLabels;
use smartview_rs::input::{FrameSource, JsonLinesSource};
use smartview_rs::renderer::load_font;
use smartview_rs::sink::{DispatchWorker, MemorySink, SheetsSink};
use smartview_rs::{gen_time_string, FrameLoop, SystemClock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// 区域计数程序
#[derive(Parser, Debug)]
#[command(author, version, about = "区域计数 + 整点汇总", long_about = None)]
struct Args {
    /// 配置文件 (不存在时自动创建)
    #[arg(short, long, default_value = "smartview.json")]
    config: PathBuf,

    /// 检测记录 (JSON-lines 文件, `-` 为标准输入)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// 类别标签文件 (覆盖配置)
    #[arg(long)]
    classes: Option<PathBuf>,

    /// 报表端 (覆盖配置)
    #[arg(long, value_enum)]
    sink: Option<SinkKind>,

    /// 导出目录 (覆盖配置)
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// 标注图输出目录, 为空时不输出
    #[arg(long)]
    annotated_dir: Option<PathBuf>,

    /// 处理帧数上限
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smartview_rs=info,smartview=info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    // ========== 配置 ==========
    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;
    if let Some(classes) = args.classes {
        config.classes_path = classes;
    }
    if let Some(sink) = args.sink {
        config.sink = sink;
    }
    if let Some(dir) = args.export_dir {
        config.export_dir = dir;
    }
    config.validate().context("配置无效")?;
    config.print_summary();

    let labels = ClassLabels::load(&config.classes_path)
        .with_context(|| format!("加载类别标签失败: {}", config.classes_path.display()))?;
    info!("🏷️  已加载 {} 个类别标签", labels.len());

    // ========== 报表端 + 派发线程 ==========
    let dispatcher = match config.sink {
        SinkKind::Memory => {
            info!("🗂️  报表端: 进程内表格");
            DispatchWorker::spawn(
                MemorySink::new(config.layout.sheet.clone(), config.export_dir.clone()),
                config.queue_capacity,
            )
        }
        SinkKind::Sheets => {
            let Some(token) = config.sheets_token() else {
                bail!("电子表格报表端需要令牌 (配置 sheets.token 或环境变量 SMARTVIEW_SHEETS_TOKEN)");
            };
            info!("🌐 报表端: {}", config.sheets.base_url);
            DispatchWorker::spawn(
                SheetsSink::new(
                    config.sheets.base_url.clone(),
                    config.sheets.spreadsheet_id.clone(),
                    token,
                    config.export_dir.clone(),
                ),
                config.queue_capacity,
            )
        }
    }
    .context("启动派发线程失败")?;

    // ========== 帧循环 ==========
    let mut frame_loop = FrameLoop::new(&config, labels, Box::new(SystemClock), dispatcher)?;

    let annotated_dir = match args.annotated_dir {
        Some(dir) => {
            let dir = dir.join(gen_time_string("-"));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("创建标注目录失败: {}", dir.display()))?;
            let font = config.font_path.as_ref().and_then(load_font);
            frame_loop = frame_loop.with_annotation(config.canvas_width, config.canvas_height, font);
            info!("🖼️  标注图输出到 {}", dir.display());
            Some(dir)
        }
        None => None,
    };

    let mut source: Box<dyn FrameSource> = if args.input == "-" {
        info!("📥 从标准输入读取检测记录");
        Box::new(JsonLinesSource::stdin())
    } else {
        info!("📥 读取检测记录: {}", args.input);
        Box::new(JsonLinesSource::open(&args.input)?)
    };

    // Ctrl-C 只置位停止标志, 帧循环返回后照常等待派发线程清空队列
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            if !stop.swap(true, Ordering::Relaxed) {
                info!("🛑 收到中断信号, 处理完当前帧后退出");
            }
        })
        .context("注册中断处理失败")?;
    }
    let stop_flag = stop.clone();
    let max_frames = args.max_frames;
    let mut processed = 0u64;

    let result = frame_loop.run(source.as_mut(), &stop, |report| {
        if let (Some(dir), Some(image)) = (&annotated_dir, &report.canvas) {
            let path = dir.join(format!("frame_{:06}.png", report.frame_index));
            if let Err(e) = image.save(&path) {
                warn!("⚠️ 保存标注图失败 {}: {}", path.display(), e);
            }
        }
        processed += 1;
        if max_frames.is_some_and(|max| processed >= max) {
            info!("🛑 已达到帧数上限 {}", processed);
            stop_flag.store(true, Ordering::Relaxed);
        }
    });

    // ========== 退出 ==========
    let report = frame_loop.shutdown(config.shutdown_timeout());
    if report.timed_out {
        warn!("⚠️ 派发线程未在 {}s 内退出, 部分事件可能未写入", config.shutdown_timeout_secs);
    }
    if let Some(stats) = report.stats {
        info!(
            "📊 报表事件: 成功 {} 失败 {} 丢弃 {}",
            stats.applied, stats.failed, report.dropped
        );
    }

    match result {
        Ok(summary) => {
            info!("✅ 共处理 {} 帧, 触发 {} 个事件", summary.frames, summary.events_emitted);
            Ok(())
        }
        Err(e) => {
            error!("❌ 读取检测记录失败: {}", e);
            Err(e.into())
        }
    }
}
