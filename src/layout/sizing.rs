use serde::Serialize;

use crate::config::Dimensions;
use crate::geometry::Canvas;

/// Final drawing extent. `min_x`/`min_y` stay at zero unless something was
/// drawn left of or above the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CanvasSize {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Largest right and bottom edge over every drawn shape, plus padding.
pub(super) fn compute_size(canvas: &Canvas, dims: &Dimensions) -> CanvasSize {
    let mut min_x = 0.0f32;
    let mut min_y = 0.0f32;
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    for shape in canvas.shapes() {
        let bbox = shape.bbox();
        max_x = max_x.max(bbox.x2);
        max_y = max_y.max(bbox.y2);
        min_x = min_x.min(bbox.x);
        min_y = min_y.min(bbox.y);
    }
    if min_x < 0.0 {
        min_x -= dims.svg_padding;
    }
    if min_y < 0.0 {
        min_y -= dims.svg_padding;
    }
    CanvasSize {
        min_x,
        min_y,
        width: max_x + dims.svg_padding - min_x,
        height: max_y + dims.svg_padding - min_y,
    }
}
