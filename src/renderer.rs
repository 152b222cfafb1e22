//! 帧标注 (Frame annotation)
//!
//! 区域计数只依赖 `Canvas` trait; 无界面运行时使用 `NullCanvas`,
//! 需要输出标注图时使用基于 image/imageproc 的 `ImageCanvas`.

use crate::detection::tracker::id_to_color;
use crate::detection::{Category, TrackedBox};
use crate::zone::Zone;
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// 标注画布
pub trait Canvas {
    /// 画出区域内目标的框和ID
    fn draw_tracked(&mut self, tracked: &TrackedBox);

    /// 画出区域轮廓
    fn draw_zone(&mut self, zone: &Zone);

    /// 画出某个类别的计数
    fn draw_count(&mut self, category: Category, count: usize);
}

/// 空画布 (不做任何绘制)
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn draw_tracked(&mut self, _tracked: &TrackedBox) {}

    fn draw_zone(&mut self, _zone: &Zone) {}

    fn draw_count(&mut self, _category: Category, _count: usize) {}
}

const ZONE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_BG: Rgb<u8> = Rgb([128, 0, 0]);
const BOX_THICKNESS: i32 = 3;

/// 基于 RgbImage 的画布
pub struct ImageCanvas {
    pub image: RgbImage,
    font: Option<Arc<FontArc>>,
}

impl ImageCanvas {
    pub fn new(image: RgbImage, font: Option<Arc<FontArc>>) -> Self {
        Self { image, font }
    }

    /// 纯黑画布
    pub fn blank(width: u32, height: u32, font: Option<Arc<FontArc>>) -> Self {
        Self::new(RgbImage::new(width, height), font)
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    fn put_label(&mut self, text: &str, x: i32, y: i32, scale: f32) {
        let Some(font) = self.font.clone() else {
            return;
        };
        let width = (text.chars().count() as f32 * scale * 0.6).ceil() as u32 + 4;
        let height = scale.ceil() as u32 + 4;
        draw_filled_rect_mut(
            &mut self.image,
            Rect::at(x, y - height as i32).of_size(width, height),
            LABEL_BG,
        );
        draw_text_mut(
            &mut self.image,
            LABEL_TEXT,
            x + 2,
            y - height as i32 + 2,
            PxScale::from(scale),
            &*font,
            text,
        );
    }
}

impl Canvas for ImageCanvas {
    fn draw_tracked(&mut self, tracked: &TrackedBox) {
        let bbox = tracked.bbox;
        let (r, g, b) = id_to_color(tracked.id);
        for inset in 0..BOX_THICKNESS {
            let w = (bbox.width() - 2 * inset).max(1) as u32;
            let h = (bbox.height() - 2 * inset).max(1) as u32;
            draw_hollow_rect_mut(
                &mut self.image,
                Rect::at(bbox.x1 + inset, bbox.y1 + inset).of_size(w, h),
                Rgb([r, g, b]),
            );
        }
        self.put_label(&tracked.id.to_string(), bbox.x1, bbox.y1, 18.0);
    }

    fn draw_zone(&mut self, zone: &Zone) {
        for (a, b) in zone.edges() {
            draw_line_segment_mut(
                &mut self.image,
                (a.0 as f32, a.1 as f32),
                (b.0 as f32, b.1 as f32),
                ZONE_COLOR,
            );
        }
    }

    fn draw_count(&mut self, category: Category, count: usize) {
        let x = [30, 250, 450][category.index()];
        let y = self.image.height().saturating_sub(40) as i32;
        let label = format!("{}: {}", category_label(category), count);
        self.put_label(&label, x, y, 16.0);
    }
}

/// HUD 上显示的类别名
pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::FullCompliant => "BSUFCOMPLY",
        Category::PartialCompliant => "BSUMCOMPLY",
        Category::NonCompliant => "BSUNONCOMPLY",
    }
}

/// 加载标注字体, 失败时只告警 (标注不显示文字)
pub fn load_font(path: impl AsRef<Path>) -> Option<Arc<FontArc>> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("⚠️ 未找到标注字体 {}: {}", path.display(), e);
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(Arc::new(font)),
        Err(e) => {
            warn!("⚠️ 标注字体解析失败 {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BBox;

    #[test]
    fn test_draw_tracked_marks_box_edges() {
        let mut canvas = ImageCanvas::blank(64, 64, None);
        canvas.draw_tracked(&TrackedBox {
            bbox: BBox::new(10, 10, 30, 30),
            id: 0,
        });
        let (r, g, b) = id_to_color(0);
        assert_eq!(*canvas.image.get_pixel(10, 10), Rgb([r, g, b]));
        assert_eq!(*canvas.image.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_draw_zone_and_offscreen_box() {
        let mut canvas = ImageCanvas::blank(32, 32, None);
        canvas.draw_zone(&Zone::new(vec![(0, 0), (31, 0), (31, 31)]));
        assert_eq!(*canvas.image.get_pixel(15, 0), ZONE_COLOR);

        // 超出画布的框不会 panic
        canvas.draw_tracked(&TrackedBox {
            bbox: BBox::new(20, 20, 80, 80),
            id: 3,
        });
        canvas.draw_count(Category::NonCompliant, 2);
    }
}
