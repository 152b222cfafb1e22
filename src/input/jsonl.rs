//! JSON-lines 检测输入
//!
//! 每行一帧: `{"frame": 12, "detections": [[x1, y1, x2, y2, cls], ...], "image": "f.png"}`
//! `frame` 与 `image` 可省略. 空行跳过, 无法解析的行记录警告后跳过.

use super::{Frame, FrameSource};
use crate::detection::{BBox, Detection};
use crate::error::SourceError;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    frame: Option<u64>,
    #[serde(default)]
    detections: Vec<[f64; 5]>,
    #[serde(default)]
    image: Option<PathBuf>,
}

/// 逐行读取检测记录
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_no: u64,
    next_index: u64,
    skipped: u64,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonLinesSource<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
            next_index: 0,
            skipped: 0,
        }
    }

    /// 被跳过的无效行数
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn to_frame(&mut self, record: FrameRecord) -> Frame {
        let index = record.frame.unwrap_or(self.next_index);
        self.next_index = index.saturating_add(1);

        let mut detections = Vec::with_capacity(record.detections.len());
        for [x1, y1, x2, y2, cls] in record.detections {
            if cls < 0.0 || !cls.is_finite() {
                warn!("⚠️ 第{}行: 无效类别索引 {}", self.line_no, cls);
                continue;
            }
            detections.push(Detection {
                bbox: BBox::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32),
                class_index: cls as usize,
            });
        }

        Frame {
            index,
            detections,
            image: record.image,
        }
    }
}

impl<R: BufRead> FrameSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            match serde_json::from_str::<FrameRecord>(text) {
                Ok(record) => return Ok(Some(self.to_frame(record))),
                Err(e) => {
                    self.skipped += 1;
                    warn!("⚠️ 第{}行解析失败, 已跳过: {}", self.line_no, e);
                }
            }
        }
    }
}
