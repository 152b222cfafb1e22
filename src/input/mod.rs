/// 检测输入系统 (Detection Input)
///
/// 检测引擎在进程外运行, 这里只接收它逐帧输出的检测框:
/// - JsonLines: 每行一帧的 JSON 记录 (文件或标准输入)
/// - Scripted:  预先排好的帧序列 (回放 / 测试)
pub mod jsonl;

pub use jsonl::JsonLinesSource;

use crate::detection::Detection;
use crate::error::SourceError;
use std::collections::VecDeque;
use std::path::PathBuf;

/// 一帧检测结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub detections: Vec<Detection>,
    /// 可选的原始画面, 输出标注图时作为底图
    pub image: Option<PathBuf>,
}

impl Frame {
    pub fn new(index: u64, detections: Vec<Detection>) -> Self {
        Self {
            index,
            detections,
            image: None,
        }
    }
}

/// 帧来源
pub trait FrameSource {
    /// 取下一帧, `Ok(None)` 表示输入结束
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;
}

/// 预先排好的帧序列
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        Ok(self.frames.pop_front())
    }
}
