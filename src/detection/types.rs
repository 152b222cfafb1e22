/// 检测与跟踪数据结构定义
/// Data structures shared by detection input, tracking and zone counting

// ========== 公共常量 ==========

/// 画布默认尺寸 (检测引擎输出坐标系)
pub const CANVAS_SIZE: u32 = 640;

/// 质心关联距离阈值
pub const ASSOCIATION_THRESHOLD: f64 = 35.0;

// ========== 数据结构 ==========

/// 检测框 (Axis-aligned bounding box, 整数像素坐标)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 获取中心点 (整数向下取整)
    pub fn center(&self) -> (i32, i32) {
        (
            (self.x1 + self.x2).div_euclid(2),
            (self.y1 + self.y2).div_euclid(2),
        )
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// 单帧检测结果 (检测引擎 → 帧循环)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub bbox: BBox,
    pub class_index: usize,
}

/// 带跟踪ID的检测框 (跟踪器输出)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedBox {
    pub bbox: BBox,
    pub id: u32,
}

/// 跟踪对象 (质心 + 最近一次匹配的帧序号)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: u32,
    pub center: (i32, i32),
    pub last_seen: u64,
}

/// 类别分组
///
/// 两个合规类别 + 一个不合规类别, 每个类别独立跟踪与计数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    FullCompliant,
    PartialCompliant,
    NonCompliant,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::FullCompliant,
        Category::PartialCompliant,
        Category::NonCompliant,
    ];

    pub fn index(self) -> usize {
        match self {
            Category::FullCompliant => 0,
            Category::PartialCompliant => 1,
            Category::NonCompliant => 2,
        }
    }

    pub fn is_compliant(self) -> bool {
        !matches!(self, Category::NonCompliant)
    }
}

/// 每帧三个类别的区域计数
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounts(pub [usize; 3]);

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        self.0[category.index()]
    }

    pub fn set(&mut self, category: Category, count: usize) {
        self.0[category.index()] = count;
    }

    /// 合规总数
    pub fn compliant(&self) -> usize {
        Category::ALL
            .iter()
            .filter(|c| c.is_compliant())
            .map(|c| self.get(*c))
            .sum()
    }

    /// 不合规总数
    pub fn non_compliant(&self) -> usize {
        self.get(Category::NonCompliant)
    }
}
