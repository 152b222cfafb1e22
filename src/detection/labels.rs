//! 类别标签表 (检测引擎的 class index → label)

use super::types::{BBox, Category, Detection};
use crate::error::SourceError;
use std::path::Path;

/// 类别标签表, 启动时从换行分隔的文本文件加载一次
#[derive(Clone, Debug, Default)]
pub struct ClassLabels {
    labels: Vec<String>,
}

impl ClassLabels {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// 从文本文件加载 (每行一个标签)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let labels = text
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        Self { labels }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// 类别匹配规则: 标签包含关键字即归入对应类别, 按顺序取第一个
#[derive(Clone, Debug)]
pub struct CategoryMatcher {
    keys: [(Category, String); 3],
}

impl CategoryMatcher {
    pub fn new(full: &str, partial: &str, non: &str) -> Self {
        Self {
            keys: [
                (Category::FullCompliant, full.to_string()),
                (Category::PartialCompliant, partial.to_string()),
                (Category::NonCompliant, non.to_string()),
            ],
        }
    }

    pub fn classify(&self, label: &str) -> Option<Category> {
        self.keys
            .iter()
            .find(|(_, key)| !key.is_empty() && label.contains(key.as_str()))
            .map(|(category, _)| *category)
    }

    /// 把一帧的检测按类别拆分成三个桶, 无法识别的标签被忽略
    pub fn partition(&self, labels: &ClassLabels, detections: &[Detection]) -> [Vec<BBox>; 3] {
        let mut buckets: [Vec<BBox>; 3] = Default::default();
        for detection in detections {
            let category = labels
                .get(detection.class_index)
                .and_then(|label| self.classify(label));
            if let Some(category) = category {
                buckets[category.index()].push(detection.bbox);
            }
        }
        buckets
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new("bsufcomply", "bsumcomply", "bsunoncomply")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_line_order() {
        let labels = ClassLabels::parse("bsufcomply\r\nbsumcomply\nbsunoncomply");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("bsufcomply"));
        assert_eq!(labels.get(2), Some("bsunoncomply"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn test_partition_by_substring() {
        let labels = ClassLabels::parse("bsufcomply\nbsumcomply\nbsunoncomply\nperson");
        let matcher = CategoryMatcher::default();
        let det = |cls| Detection {
            bbox: BBox::new(0, 0, 10, 10),
            class_index: cls,
        };
        let buckets = matcher.partition(&labels, &[det(0), det(2), det(2), det(3), det(9)]);
        assert_eq!(buckets[0].len(), 1);
        assert_eq!(buckets[1].len(), 0);
        assert_eq!(buckets[2].len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClassLabels::load("/nonexistent/classes.txt").unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
