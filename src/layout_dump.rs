use crate::geometry::BBox;
use crate::ir::{DiagramModel, LineType, SignalKind};
use crate::layout::{Diagnostic, SequenceLayout, SignalShape};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Flat, resolved view of a finished layout for inspection and regression
/// diffs.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub title: Option<String>,
    pub width: f32,
    pub height: f32,
    pub actors: Vec<ActorDump>,
    pub signals: Vec<SignalDump>,
    pub blocks: Vec<BlockDump>,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ActorDump {
    pub name: String,
    pub label: String,
    pub created_by_signal: bool,
    pub destroyed: bool,
    pub lifeline_x: f32,
    pub lifeline_y: [f32; 2],
    pub top: BBox,
    pub bottom: Option<BBox>,
    pub cross: Option<BBox>,
}

#[derive(Debug, Serialize)]
pub struct SignalDump {
    pub id: u32,
    pub kind: SignalKind,
    pub line_type: LineType,
    pub shape: &'static str,
    pub from: String,
    pub to: Option<String>,
    pub line_x: [f32; 2],
    pub line_y: [f32; 2],
    pub text: Option<BBox>,
}

#[derive(Debug, Serialize)]
pub struct BlockDump {
    pub stack: usize,
    pub level: usize,
    pub outline: BBox,
}

impl LayoutDump {
    pub fn from_layout(layout: &SequenceLayout, model: &DiagramModel) -> Self {
        let canvas = &layout.canvas;
        let actors = layout
            .actors
            .iter()
            .map(|actor| {
                let line = canvas.bbox(actor.line);
                ActorDump {
                    name: actor.name.clone(),
                    label: actor.label.clone(),
                    created_by_signal: actor.created_by_signal,
                    destroyed: actor.destroyed,
                    lifeline_x: line.x,
                    lifeline_y: [line.y, line.y2],
                    top: canvas.bbox(actor.top.rect),
                    bottom: actor.bottom.map(|bottom| canvas.bbox(bottom.rect)),
                    cross: actor.cross.map(|cross| cross.bbox(canvas)),
                }
            })
            .collect();

        let signals = layout
            .signals
            .iter()
            .map(|signal| {
                let (x1, x2) = signal.line_x(canvas);
                let (y1, y2) = signal.line_y(canvas);
                SignalDump {
                    id: signal.id,
                    kind: signal.kind,
                    line_type: signal.line_type,
                    shape: match signal.shape {
                        SignalShape::Classic { .. } => "classic",
                        SignalShape::SelfLoop { .. } => "self",
                        SignalShape::Creation { .. } => "creation",
                        SignalShape::Destruction { .. } => "destruction",
                    },
                    from: layout.actor(signal.actor_a).name.clone(),
                    to: signal.actor_b.map(|id| layout.actor(id).name.clone()),
                    line_x: [x1, x2],
                    line_y: [y1, y2],
                    text: signal.text.map(|text| canvas.bbox(text)),
                }
            })
            .collect();

        let blocks = layout
            .block_stacks
            .iter()
            .enumerate()
            .flat_map(|(stack, element)| {
                element.blocks.iter().map(move |block| BlockDump {
                    stack,
                    level: block.level,
                    outline: canvas.bbox(block.outline),
                })
            })
            .collect();

        LayoutDump {
            title: model.title.clone(),
            width: layout.size.width,
            height: layout.size.height,
            actors,
            signals,
            blocks,
            diagnostics: layout.diagnostics.items().to_vec(),
            warnings: model.warnings.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &SequenceLayout, model: &DiagramModel) -> crate::error::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, model);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
