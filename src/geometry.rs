//! Drawing primitives. Every shape lives in a [`Canvas`] arena and is
//! addressed by a [`ShapeId`]; layout code reads bounding boxes and moves
//! shapes in place through the canvas.

use serde::Serialize;

use crate::config::Config;
use crate::text_metrics::measure_text_width;

/// Ascent of a baseline-anchored label, as a fraction of its font size.
const TEXT_ASCENT: f32 = 0.8;
const TEXT_LINE_HEIGHT: f32 = 1.2;
const TITLE_SCALE: f32 = 1.5;
const SMALL_SCALE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ShapeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn cx(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn cy(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn union(&self, other: &BBox) -> BBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BBox::new(x, y, self.x2.max(other.x2) - x, self.y2.max(other.y2) - y)
    }

    /// Whether `x` lies strictly inside the horizontal span.
    pub fn straddles_x(&self, x: f32) -> bool {
        self.x < x && x < self.x2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineOption {
    EndMarker,
    StartMarker,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextOption {
    Centered,
    Title,
    Small,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RectOption {
    Thin,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineShape {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub options: Vec<LineOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectShape {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub options: Vec<RectOption>,
}

/// A single-line label. `x`/`y` is the anchor: the centre when
/// `Centered` is set, otherwise the left end of the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextShape {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    pub width: f32,
    pub height: f32,
    pub options: Vec<TextOption>,
}

impl TextShape {
    pub fn is_centered(&self) -> bool {
        self.options.contains(&TextOption::Centered)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    Line(LineShape),
    Rect(RectShape),
    Text(TextShape),
}

impl Shape {
    pub fn bbox(&self) -> BBox {
        match self {
            Shape::Line(line) => {
                let x = line.x1.min(line.x2);
                let y = line.y1.min(line.y2);
                BBox::new(x, y, (line.x2 - line.x1).abs(), (line.y2 - line.y1).abs())
            }
            Shape::Rect(rect) => BBox::new(rect.x, rect.y, rect.width, rect.height),
            Shape::Text(text) => {
                let left = if text.is_centered() {
                    text.x - text.width / 2.0
                } else {
                    text.x
                };
                let top = if text.is_centered() {
                    text.y - text.height / 2.0
                } else {
                    text.y - text.font_size * TEXT_ASCENT
                };
                BBox::new(left, top, text.width, text.height)
            }
        }
    }

    pub fn translate_x(&mut self, offset: f32) {
        match self {
            Shape::Line(line) => {
                line.x1 += offset;
                line.x2 += offset;
            }
            Shape::Rect(rect) => rect.x += offset,
            Shape::Text(text) => text.x += offset,
        }
    }

    pub fn translate_y(&mut self, offset: f32) {
        match self {
            Shape::Line(line) => {
                line.y1 += offset;
                line.y2 += offset;
            }
            Shape::Rect(rect) => rect.y += offset,
            Shape::Text(text) => text.y += offset,
        }
    }

    /// Moves the shape so its bounding box starts at `(x, y)`.
    pub fn set_position(&mut self, x: f32, y: f32) {
        let bbox = self.bbox();
        self.translate_x(x - bbox.x);
        self.translate_y(y - bbox.y);
    }

    /// Resizes a rectangle, or stretches a line from its first point.
    /// Text sizes follow their content and are left untouched.
    pub fn set_size(&mut self, width: f32, height: f32) {
        match self {
            Shape::Line(line) => {
                line.x2 = line.x1 + width.copysign(line.x2 - line.x1);
                line.y2 = line.y1 + height.copysign(line.y2 - line.y1);
            }
            Shape::Rect(rect) => {
                rect.width = width;
                rect.height = height;
            }
            Shape::Text(_) => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct Canvas {
    shapes: Vec<Shape>,
    font_family: String,
    font_size: f32,
    fast_text_metrics: bool,
}

impl Canvas {
    pub fn new(config: &Config) -> Self {
        Self {
            shapes: Vec::new(),
            font_family: config.theme.font_family.clone(),
            font_size: config.theme.font_size,
            fast_text_metrics: config.fast_text_metrics,
        }
    }

    pub fn draw_line(&mut self, x1: f32, x2: f32, y1: f32, y2: f32, options: &[LineOption]) -> ShapeId {
        self.push(Shape::Line(LineShape {
            x1,
            y1,
            x2,
            y2,
            options: options.to_vec(),
        }))
    }

    pub fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32, options: &[RectOption]) -> ShapeId {
        self.push(Shape::Rect(RectShape {
            x,
            y,
            width,
            height,
            options: options.to_vec(),
        }))
    }

    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, options: &[TextOption]) -> ShapeId {
        let font_size = self.font_size_for(options);
        let width = self.text_width(text, options);
        self.push(Shape::Text(TextShape {
            x,
            y,
            text: text.to_string(),
            font_size,
            width,
            height: font_size * TEXT_LINE_HEIGHT,
            options: options.to_vec(),
        }))
    }

    /// Width `text` would have if drawn with `options`.
    pub fn text_width(&self, text: &str, options: &[TextOption]) -> f32 {
        let font_size = self.font_size_for(options);
        measure_text_width(text, font_size, &self.font_family, self.fast_text_metrics)
    }

    fn font_size_for(&self, options: &[TextOption]) -> f32 {
        let mut font_size = self.font_size;
        if options.contains(&TextOption::Title) {
            font_size *= TITLE_SCALE;
        }
        if options.contains(&TextOption::Small) {
            font_size *= SMALL_SCALE;
        }
        font_size
    }

    /// Two crossing lines of `width` centred on `(x, y)`.
    pub fn draw_cross(&mut self, x: f32, y: f32, width: f32) -> (ShapeId, ShapeId) {
        let half = width / 2.0;
        let line1 = self.draw_line(x - half, x + half, y - half, y + half, &[]);
        let line2 = self.draw_line(x - half, x + half, y + half, y - half, &[]);
        (line1, line2)
    }

    fn push(&mut self, shape: Shape) -> ShapeId {
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.0]
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> &mut Shape {
        &mut self.shapes[id.0]
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn bbox(&self, id: ShapeId) -> BBox {
        self.shape(id).bbox()
    }

    pub fn translate_x(&mut self, ids: &[ShapeId], offset: f32) {
        for id in ids {
            self.shape_mut(*id).translate_x(offset);
        }
    }

    pub fn translate_y(&mut self, ids: &[ShapeId], offset: f32) {
        for id in ids {
            self.shape_mut(*id).translate_y(offset);
        }
    }

    /// Sets both x coordinates of a line, keeping its y coordinates.
    pub fn set_line_x(&mut self, id: ShapeId, x1: f32, x2: f32) {
        if let Shape::Line(line) = self.shape_mut(id) {
            line.x1 = x1;
            line.x2 = x2;
        }
    }

    pub fn set_line_y2(&mut self, id: ShapeId, y2: f32) {
        if let Shape::Line(line) = self.shape_mut(id) {
            line.y2 = y2;
        }
    }

    /// Replaces the start/end markers of a line, keeping its other options.
    pub fn set_line_markers(&mut self, id: ShapeId, start: bool, end: bool) {
        if let Shape::Line(line) = self.shape_mut(id) {
            line.options
                .retain(|opt| !matches!(opt, LineOption::StartMarker | LineOption::EndMarker));
            if start {
                line.options.push(LineOption::StartMarker);
            }
            if end {
                line.options.push(LineOption::EndMarker);
            }
        }
    }

    pub fn set_rect_width(&mut self, id: ShapeId, width: f32) {
        let height = self.bbox(id).height;
        self.shape_mut(id).set_size(width, height);
    }

    /// Moves a label horizontally so its anchor sits at `x`.
    pub fn set_text_x(&mut self, id: ShapeId, x: f32) {
        if let Shape::Text(text) = self.shape_mut(id) {
            text.x = x;
        }
    }

    /// Moves a label horizontally so its left edge sits at `x`.
    pub fn set_text_left(&mut self, id: ShapeId, x: f32) {
        let y = self.bbox(id).y;
        self.shape_mut(id).set_position(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(&Config::default())
    }

    #[test]
    fn line_bbox_is_normalised() {
        let mut canvas = canvas();
        let id = canvas.draw_line(120.0, 20.0, 40.0, 40.0, &[LineOption::EndMarker]);
        let bbox = canvas.bbox(id);
        assert_eq!(bbox.x, 20.0);
        assert_eq!(bbox.x2, 120.0);
        assert_eq!(bbox.width, 100.0);
        assert_eq!(bbox.height, 0.0);
    }

    #[test]
    fn centered_text_bbox_surrounds_anchor() {
        let mut canvas = canvas();
        let id = canvas.draw_text(50.0, 25.0, "Alice", &[TextOption::Centered]);
        let bbox = canvas.bbox(id);
        assert!((bbox.cx() - 50.0).abs() < 1e-4);
        assert!((bbox.cy() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn baseline_text_starts_at_anchor() {
        let mut canvas = canvas();
        let id = canvas.draw_text(10.0, 30.0, "hello", &[]);
        let bbox = canvas.bbox(id);
        assert_eq!(bbox.x, 10.0);
        assert!(bbox.y < 30.0 && bbox.y2 > 30.0);
    }

    #[test]
    fn title_text_is_larger() {
        let mut canvas = canvas();
        let plain = canvas.draw_text(0.0, 0.0, "Title", &[]);
        let title = canvas.draw_text(0.0, 0.0, "Title", &[TextOption::Title]);
        assert!(canvas.bbox(title).width > canvas.bbox(plain).width);
    }

    #[test]
    fn translate_and_position() {
        let mut canvas = canvas();
        let rect = canvas.draw_rect(0.0, 0.0, 100.0, 50.0, &[]);
        canvas.translate_x(&[rect], 15.0);
        canvas.translate_y(&[rect], 5.0);
        assert_eq!(canvas.bbox(rect), BBox::new(15.0, 5.0, 100.0, 50.0));
        canvas.shape_mut(rect).set_position(1.0, 2.0);
        assert_eq!(canvas.bbox(rect), BBox::new(1.0, 2.0, 100.0, 50.0));
        canvas.set_rect_width(rect, 140.0);
        assert_eq!(canvas.bbox(rect).width, 140.0);
    }

    #[test]
    fn cross_lines_share_span() {
        let mut canvas = canvas();
        let (l1, l2) = canvas.draw_cross(100.0, 200.0, 20.0);
        assert_eq!(canvas.bbox(l1), canvas.bbox(l2));
        assert_eq!(canvas.bbox(l1).cx(), 100.0);
        assert_eq!(canvas.bbox(l1).cy(), 200.0);
    }

    #[test]
    fn markers_are_replaced() {
        let mut canvas = canvas();
        let id = canvas.draw_line(0.0, 10.0, 0.0, 0.0, &[LineOption::EndMarker, LineOption::Dotted]);
        canvas.set_line_markers(id, true, false);
        let Shape::Line(line) = canvas.shape(id) else {
            panic!("expected line");
        };
        assert!(line.options.contains(&LineOption::StartMarker));
        assert!(line.options.contains(&LineOption::Dotted));
        assert!(!line.options.contains(&LineOption::EndMarker));
    }
}
