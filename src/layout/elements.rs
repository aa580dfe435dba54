use serde::Serialize;
use std::collections::HashSet;

use crate::config::Dimensions;
use crate::geometry::{BBox, Canvas, ShapeId, TextOption};
use crate::ir::{LineType, SignalKind};

/// Index of an [`ActorElement`] in `SequenceLayout::actors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActorId(pub usize);

/// An actor box and its centred label.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActorRect {
    pub rect: ShapeId,
    pub text: ShapeId,
}

impl ActorRect {
    pub fn draw(canvas: &mut Canvas, x: f32, y: f32, label: &str, dims: &Dimensions) -> Self {
        let width = dims.actor_rect_width;
        let height = dims.actor_rect_height;
        let rect = canvas.draw_rect(x, y, width, height, &[]);
        let text = canvas.draw_text(x + width / 2.0, y + height / 2.0, label, &[TextOption::Centered]);
        Self { rect, text }
    }

    /// The label is at least as wide as the box around it.
    pub fn should_be_resized(&self, canvas: &Canvas) -> bool {
        canvas.bbox(self.text).width >= canvas.bbox(self.rect).width
    }

    /// Widens the box in place, keeping its left edge, and recentres the label.
    pub fn resize(&self, canvas: &mut Canvas, width: f32) {
        canvas.set_rect_width(self.rect, width);
        let center = canvas.bbox(self.rect).cx();
        canvas.set_text_x(self.text, center);
    }

    pub fn shapes(&self) -> [ShapeId; 2] {
        [self.rect, self.text]
    }
}

/// The X drawn where an actor is destroyed. Both lines always move together.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CrossElement {
    pub line1: ShapeId,
    pub line2: ShapeId,
}

impl CrossElement {
    pub fn draw(canvas: &mut Canvas, x: f32, y: f32, dims: &Dimensions) -> Self {
        let (line1, line2) = canvas.draw_cross(x, y, dims.cross_width);
        Self { line1, line2 }
    }

    pub fn bbox(&self, canvas: &Canvas) -> BBox {
        canvas.bbox(self.line1).union(&canvas.bbox(self.line2))
    }

    /// Centres both lines on `x`, preserving the cross width.
    pub fn recenter(&self, canvas: &mut Canvas, x: f32) {
        let offset = x - self.bbox(canvas).cx();
        canvas.translate_x(&self.shapes(), offset);
    }

    pub fn shapes(&self) -> [ShapeId; 2] {
        [self.line1, self.line2]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorElement {
    pub name: String,
    pub label: String,
    pub order: usize,
    pub created_by_signal: bool,
    pub top: ActorRect,
    pub bottom: Option<ActorRect>,
    /// Lifeline, from the bottom of the top box to the destruction point or
    /// the bottom box.
    pub line: ShapeId,
    pub cross: Option<CrossElement>,
    pub destroyed: bool,
    /// Indices into `SequenceLayout::signals`.
    pub incoming: Vec<usize>,
    pub outgoing: Vec<usize>,
    pub self_signals: Vec<usize>,
}

impl ActorElement {
    pub fn line_x(&self, canvas: &Canvas) -> f32 {
        canvas.bbox(self.line).x
    }

    /// Every shape owned by the actor.
    pub fn shapes(&self) -> Vec<ShapeId> {
        let mut shapes = self.top.shapes().to_vec();
        shapes.push(self.line);
        if let Some(bottom) = &self.bottom {
            shapes.extend(bottom.shapes());
        }
        if let Some(cross) = &self.cross {
            shapes.extend(cross.shapes());
        }
        shapes
    }

    /// Signals touching the actor: self first, then incoming, then outgoing.
    pub fn signal_indices(&self) -> Vec<usize> {
        let mut indices = self.self_signals.clone();
        indices.extend(&self.incoming);
        indices.extend(&self.outgoing);
        indices
    }
}

impl std::fmt::Display for ActorElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ActorElement '{}' (order {}, created by signal: {}, destroyed: {}, signals in/out/self: {}/{}/{})",
            self.name,
            self.order,
            self.created_by_signal,
            self.destroyed,
            self.incoming.len(),
            self.outgoing.len(),
            self.self_signals.len()
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SignalShape {
    /// A straight horizontal arrow between two lifelines, `x1 < x2`.
    Classic { line: ShapeId },
    /// Out along the top, down, and back to the lifeline with an arrowhead.
    SelfLoop { lines: [ShapeId; 3] },
    /// From the creator's lifeline to the left edge of the created box.
    Creation { line: ShapeId },
    Destruction { cross: CrossElement },
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalElement {
    pub id: u32,
    pub line_type: LineType,
    pub kind: SignalKind,
    pub shape: SignalShape,
    pub text: Option<ShapeId>,
    pub actor_a: ActorId,
    pub actor_b: Option<ActorId>,
}

impl SignalElement {
    pub fn shapes(&self) -> Vec<ShapeId> {
        let mut shapes = match &self.shape {
            SignalShape::Classic { line } | SignalShape::Creation { line } => vec![*line],
            SignalShape::SelfLoop { lines } => lines.to_vec(),
            SignalShape::Destruction { cross } => cross.shapes().to_vec(),
        };
        shapes.extend(self.text);
        shapes
    }

    fn line_bbox(&self, canvas: &Canvas) -> BBox {
        match &self.shape {
            SignalShape::Classic { line } | SignalShape::Creation { line } => canvas.bbox(*line),
            SignalShape::SelfLoop { lines } => lines
                .iter()
                .map(|id| canvas.bbox(*id))
                .reduce(|acc, bbox| acc.union(&bbox))
                .unwrap_or_else(|| canvas.bbox(lines[0])),
            SignalShape::Destruction { cross } => cross.bbox(canvas),
        }
    }

    /// Horizontal extent of the drawn line(s).
    pub fn line_x(&self, canvas: &Canvas) -> (f32, f32) {
        let bbox = self.line_bbox(canvas);
        (bbox.x, bbox.x2)
    }

    /// Vertical extent of the drawn line(s).
    pub fn line_y(&self, canvas: &Canvas) -> (f32, f32) {
        let bbox = self.line_bbox(canvas);
        (bbox.y, bbox.y2)
    }

    /// Bounding box of everything the signal drew, label included.
    pub fn bbox(&self, canvas: &Canvas) -> BBox {
        let line = self.line_bbox(canvas);
        match self.text {
            Some(text) => line.union(&canvas.bbox(text)),
            None => line,
        }
    }

    pub fn top(&self, canvas: &Canvas) -> f32 {
        self.bbox(canvas).y
    }

    pub fn bottom(&self, canvas: &Canvas) -> f32 {
        self.bbox(canvas).y2
    }

    pub fn is_self(&self) -> bool {
        matches!(self.shape, SignalShape::SelfLoop { .. })
    }
}

impl std::fmt::Display for SignalElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SignalElement #{} ({:?}, {:?}, actor {}",
            self.id, self.kind, self.line_type, self.actor_a.0
        )?;
        if let Some(actor_b) = self.actor_b {
            write!(f, " -> {}", actor_b.0)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TitleElement {
    pub text: ShapeId,
}

/// One drawn block: keyword badge, optional `[label]` and the outline.
#[derive(Debug, Clone, Serialize)]
pub struct BlockElement {
    pub level: usize,
    pub kind_text: ShapeId,
    pub badge: ShapeId,
    pub label: Option<ShapeId>,
    pub outline: ShapeId,
}

impl BlockElement {
    pub fn shapes(&self) -> Vec<ShapeId> {
        let mut shapes = vec![self.outline, self.badge, self.kind_text];
        shapes.extend(self.label);
        shapes
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockStackElement {
    /// Drawn blocks, outermost first.
    pub blocks: Vec<BlockElement>,
    /// Every signal id declared anywhere in the stack, ascending.
    pub signal_ids: Vec<u32>,
    pub last_signal_id: Option<u32>,
}

impl BlockStackElement {
    pub fn shapes(&self) -> Vec<ShapeId> {
        self.blocks.iter().flat_map(BlockElement::shapes).collect()
    }

    pub fn bbox(&self, canvas: &Canvas) -> Option<BBox> {
        self.blocks
            .iter()
            .map(|block| canvas.bbox(block.outline))
            .reduce(|acc, bbox| acc.union(&bbox))
    }

    pub fn covers_any(&self, ids: &HashSet<u32>) -> bool {
        self.signal_ids.iter().any(|id| ids.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn long_label_requires_resize() {
        let config = Config::default();
        let mut canvas = Canvas::new(&config);
        let short = ActorRect::draw(&mut canvas, 0.0, 0.0, "A", &config.dimensions);
        let long = ActorRect::draw(&mut canvas, 150.0, 0.0, "VeryLongActorNameHere", &config.dimensions);
        assert!(!short.should_be_resized(&canvas));
        assert!(long.should_be_resized(&canvas));

        long.resize(&mut canvas, 200.0);
        assert_eq!(canvas.bbox(long.rect).x, 150.0);
        assert!((canvas.bbox(long.text).cx() - 250.0).abs() < 1e-3);
    }

    #[test]
    fn cross_recenter_keeps_width() {
        let config = Config::default();
        let mut canvas = Canvas::new(&config);
        let cross = CrossElement::draw(&mut canvas, 50.0, 100.0, &config.dimensions);
        cross.recenter(&mut canvas, 80.0);
        let bbox = cross.bbox(&canvas);
        assert_eq!(bbox.width, 20.0);
        assert_eq!(bbox.cx(), 80.0);
    }
}
