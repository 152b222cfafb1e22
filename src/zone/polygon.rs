//! 监控区域多边形与点包含判定

use serde::{Deserialize, Serialize};

/// 监控区域 (闭合多边形, 顶点按顺序连接)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub vertices: Vec<(i32, i32)>,
}

impl Zone {
    pub fn new(vertices: Vec<(i32, i32)>) -> Self {
        Self { vertices }
    }

    /// 依次返回每条边 (最后一个顶点连回第一个)
    pub fn edges(&self) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// 点是否在区域内 (边界上算在内)
    ///
    /// 少于3个顶点的区域不包含任何点.
    pub fn contains(&self, point: (i32, i32)) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        if self.edges().any(|(a, b)| on_segment(point, a, b)) {
            return true;
        }
        self.ray_cast(point)
    }

    /// 射线法 (奇偶规则)
    fn ray_cast(&self, (px, py): (i32, i32)) -> bool {
        let (px, py) = (f64::from(px), f64::from(py));
        let mut inside = false;
        for ((xi, yi), (xj, yj)) in self.edges() {
            let (xi, yi, xj, yj) = (f64::from(xi), f64::from(yi), f64::from(xj), f64::from(yj));
            if (yi > py) != (yj > py) {
                let x_cross = (xj - xi) * (py - yi) / (yj - yi) + xi;
                if px < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::new(vec![(0, 310), (0, 370), (628, 390), (615, 375)])
    }
}

/// 点是否落在线段 ab 上 (含端点)
fn on_segment(p: (i32, i32), a: (i32, i32), b: (i32, i32)) -> bool {
    let (px, py) = (i64::from(p.0), i64::from(p.1));
    let (ax, ay) = (i64::from(a.0), i64::from(a.1));
    let (bx, by) = (i64::from(b.0), i64::from(b.1));

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross != 0 {
        return false;
    }
    px >= ax.min(bx) && px <= ax.max(bx) && py >= ay.min(by) && py <= ay.max(by)
}
