//! 运行配置 - 通过JSON文件调整参数

use crate::detection::types::{ASSOCIATION_THRESHOLD, CANVAS_SIZE};
use crate::detection::CategoryMatcher;
use crate::error::ConfigError;
use crate::schedule::{DailyTimetable, SheetLayout};
use crate::sink::sheets::TOKEN_ENV;
use crate::zone::Zone;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// 报表端类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// 进程内表格, 导出文件落到本地
    Memory,
    /// 电子表格 REST 接口
    Sheets,
}

/// 类别关键字 (按顺序对标签做子串匹配)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryKeys {
    pub full_compliant: String,
    pub partial_compliant: String,
    pub non_compliant: String,
}

impl Default for CategoryKeys {
    fn default() -> Self {
        Self {
            full_compliant: "bsufcomply".to_string(),
            partial_compliant: "bsumcomply".to_string(),
            non_compliant: "bsunoncomply".to_string(),
        }
    }
}

/// 电子表格接口参数
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub base_url: String,
    pub spreadsheet_id: String,
    /// 为空时读取环境变量 SMARTVIEW_SHEETS_TOKEN
    pub token: Option<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sheets.googleapis.com".to_string(),
            spreadsheet_id: String::new(),
            token: None,
        }
    }
}

/// 运行参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // === 跟踪参数 ===
    pub tracker_threshold: f64, // 质心关联距离阈值(像素)

    // === 区域参数 ===
    pub zone: Vec<(i32, i32)>, // 监控区域顶点
    pub categories: CategoryKeys,
    pub classes_path: PathBuf, // 类别标签文件

    // === 画布参数 ===
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub font_path: Option<PathBuf>, // 标注字体, 为空时不写文字

    // === 派发参数 ===
    pub queue_capacity: usize,      // 派发队列容量
    pub shutdown_timeout_secs: u64, // 退出时等待派发线程的秒数

    // === 报表参数 ===
    pub sink: SinkKind,
    pub sheets: SheetsConfig,
    pub export_dir: PathBuf,
    pub layout: SheetLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracker_threshold: ASSOCIATION_THRESHOLD,

            zone: vec![(0, 310), (0, 370), (628, 390), (615, 375)],
            categories: CategoryKeys::default(),
            classes_path: PathBuf::from("classes.txt"),

            canvas_width: CANVAS_SIZE,
            canvas_height: CANVAS_SIZE,
            font_path: None,

            queue_capacity: 16,
            shutdown_timeout_secs: 5,

            sink: SinkKind::Memory,
            sheets: SheetsConfig::default(),
            export_dir: PathBuf::from("exports"),
            layout: SheetLayout::default(),
        }
    }
}

impl AppConfig {
    /// 从JSON文件加载配置, 文件不存在时写出默认配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("📝 配置文件不存在,创建默认配置: {}", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker_threshold.is_nan() || self.tracker_threshold <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tracker_threshold must be positive, got {}",
                self.tracker_threshold
            )));
        }
        if self.zone.len() < 3 {
            return Err(ConfigError::Invalid(format!(
                "zone needs at least 3 vertices, got {}",
                self.zone.len()
            )));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::Invalid("canvas size must be non-zero".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1".into()));
        }
        if self.sink == SinkKind::Sheets && self.sheets.spreadsheet_id.is_empty() {
            return Err(ConfigError::Invalid(
                "sheets sink requires sheets.spreadsheet_id".into(),
            ));
        }
        DailyTimetable::from_layout(&self.layout)?;
        Ok(())
    }

    pub fn zone(&self) -> Zone {
        Zone::new(self.zone.clone())
    }

    pub fn matcher(&self) -> CategoryMatcher {
        CategoryMatcher::new(
            &self.categories.full_compliant,
            &self.categories.partial_compliant,
            &self.categories.non_compliant,
        )
    }

    pub fn timetable(&self) -> Result<DailyTimetable, ConfigError> {
        DailyTimetable::from_layout(&self.layout)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// 令牌: 配置优先, 其次环境变量
    pub fn sheets_token(&self) -> Option<String> {
        self.sheets
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️  当前配置:");
        info!("  关联阈值: {:.1}", self.tracker_threshold);
        info!("  监控区域: {:?}", self.zone);
        info!(
            "  类别关键字: {} / {} / {}",
            self.categories.full_compliant,
            self.categories.partial_compliant,
            self.categories.non_compliant
        );
        info!("  画布: {}x{}", self.canvas_width, self.canvas_height);
        info!("  报表端: {:?}, 队列容量: {}", self.sink, self.queue_capacity);
        info!("  导出目录: {}", self.export_dir.display());
    }
}
