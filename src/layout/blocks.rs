use super::*;
use crate::config::Dimensions;
use crate::geometry::{BBox, RectOption, ShapeId, TextOption};
use crate::ir::{BlockStack, SignalKind};
use std::collections::HashSet;

const LABEL_OPTIONS: [TextOption; 2] = [TextOption::Centered, TextOption::Small];

struct Frame {
    index: usize,
    bbox: BBox,
    badge_width: f32,
    label: Option<(String, f32)>,
}

/// Draws every block stack around the signals it covers. Inner blocks get
/// less outward padding than the blocks around them.
pub(super) fn place_blocks(layout: &mut SequenceLayout, model: &DiagramModel, dims: &Dimensions) {
    for stack in &model.block_stacks {
        let frames = block_frames(layout, stack, dims);
        if frames.is_empty() {
            continue;
        }

        let blocks = frames
            .into_iter()
            .map(|frame| draw_block(layout, stack, frame, dims))
            .collect();
        let mut signal_ids: Vec<u32> = stack
            .blocks
            .iter()
            .flat_map(|block| block.signal_ids.iter().copied())
            .collect();
        signal_ids.sort_unstable();
        layout.block_stacks.push(BlockStackElement {
            blocks,
            signal_ids,
            last_signal_id: stack.last_signal_id(),
        });
    }
}

fn block_frames(layout: &mut SequenceLayout, stack: &BlockStack, dims: &Dimensions) -> Vec<Frame> {
    let max_level = stack.blocks.iter().map(|block| block.level).max().unwrap_or(0);
    let mut frames = Vec::new();

    for (index, block) in stack.blocks.iter().enumerate() {
        let mut extent: Option<BBox> = None;
        for id in stack.covered_signal_ids(index) {
            match layout.signal(id) {
                Some(signal) => {
                    let bbox = signal.bbox(&layout.canvas);
                    extent = Some(extent.map_or(bbox, |acc| acc.union(&bbox)));
                }
                // Reported once, by the block that declared the signal.
                None if block.signal_ids.contains(&id) => {
                    layout.diagnostics.push(Diagnostic::BlockSignalMissing {
                        label: block.label.clone(),
                        signal_id: id,
                    });
                }
                None => {}
            }
        }
        let Some(extent) = extent else {
            layout.diagnostics.push(Diagnostic::EmptyBlock {
                label: block.label.clone(),
            });
            continue;
        };

        let depth_gap = (max_level - block.level) as f32;
        let pad_x = dims.block_padding_x + depth_gap * dims.block_nesting_step;
        let pad_top = dims.block_padding_y
            + depth_gap * (dims.block_nesting_step + dims.block_header_height)
            + dims.block_header_height;
        let pad_bottom = dims.block_padding_y + depth_gap * dims.block_nesting_step;
        let bbox = BBox::new(
            extent.x - pad_x,
            extent.y - pad_top,
            extent.width + pad_x * 2.0,
            extent.height + pad_top + pad_bottom,
        );

        let badge_width =
            layout.canvas.text_width(block.kind.keyword(), &LABEL_OPTIONS) + dims.block_label_padding * 2.0;
        let label = (!block.label.is_empty()).then(|| {
            let text = format!("[{}]", block.label);
            let width = layout.canvas.text_width(&text, &LABEL_OPTIONS);
            (text, width)
        });
        frames.push(Frame {
            index,
            bbox,
            badge_width,
            label,
        });
    }

    // Every level grows by the largest shortfall so borders stay nested.
    let delta = frames
        .iter()
        .map(|frame| {
            let label_width = frame.label.as_ref().map_or(0.0, |(_, width)| *width);
            let needed = frame.badge_width + label_width + dims.block_label_padding * 3.0;
            needed - frame.bbox.width
        })
        .fold(0.0f32, f32::max);
    if delta > 0.0 {
        debug!(delta, "widening block stack to fit its labels");
        for frame in &mut frames {
            let bbox = frame.bbox;
            frame.bbox = BBox::new(bbox.x, bbox.y, bbox.width + delta, bbox.height);
        }
    }
    frames
}

fn draw_block(layout: &mut SequenceLayout, stack: &BlockStack, frame: Frame, dims: &Dimensions) -> BlockElement {
    let block = &stack.blocks[frame.index];
    let canvas = &mut layout.canvas;
    let bbox = frame.bbox;
    let header_cy = bbox.y + dims.block_header_height / 2.0;

    let outline_style = if block.level == 0 {
        RectOption::Thin
    } else {
        RectOption::Dotted
    };
    let outline = canvas.draw_rect(bbox.x, bbox.y, bbox.width, bbox.height, &[outline_style]);
    let badge = canvas.draw_rect(
        bbox.x,
        bbox.y,
        frame.badge_width,
        dims.block_header_height,
        &[RectOption::Thin],
    );
    let kind_text = canvas.draw_text(
        bbox.x + frame.badge_width / 2.0,
        header_cy,
        block.kind.keyword(),
        &LABEL_OPTIONS,
    );
    let label = frame.label.map(|(text, width)| {
        let x = bbox.x + frame.badge_width + dims.block_label_padding + width / 2.0;
        canvas.draw_text(x, header_cy, &text, &LABEL_OPTIONS)
    });

    debug!(kind = block.kind.keyword(), level = block.level, label = %block.label, "drawing block");
    BlockElement {
        level: block.level,
        kind_text,
        badge,
        label,
        outline,
    }
}

/// Pushes content down when a block stack reaches into the signal that
/// follows its last signal. Only that following signal is checked.
pub(super) fn resolve_block_overlap(layout: &mut SequenceLayout, dims: &Dimensions) {
    for stack_idx in 0..layout.block_stacks.len() {
        let stack = &layout.block_stacks[stack_idx];
        let (Some(bbox), Some(last_id)) = (stack.bbox(&layout.canvas), stack.last_signal_id) else {
            continue;
        };
        let Some(following) = layout
            .signals
            .iter()
            .filter(|signal| signal.id > last_id)
            .min_by_key(|signal| signal.id)
        else {
            continue;
        };

        let threshold = following.top(&layout.canvas);
        if bbox.y2 < threshold {
            continue;
        }
        let offset = (bbox.y2 - following.bottom(&layout.canvas) + dims.distance_between_signals).max(0.0);
        if offset <= 0.0 {
            continue;
        }
        debug!(
            signal_id = following.id,
            offset_y = offset,
            "block overlaps the next signal, moving content down"
        );
        push_down(layout, stack_idx, threshold, offset);
    }
}

fn push_down(layout: &mut SequenceLayout, stack_idx: usize, threshold: f32, offset: f32) {
    let canvas = &layout.canvas;
    let mut to_move: Vec<ShapeId> = Vec::new();
    let mut moved_creations = HashSet::new();
    let mut moved_signals = HashSet::new();

    for signal in &layout.signals {
        if signal.top(canvas) >= threshold {
            to_move.extend(signal.shapes());
            moved_signals.insert(signal.id);
            if signal.kind == SignalKind::ActorCreation {
                moved_creations.extend(signal.actor_b);
            }
        }
    }

    for (idx, stack) in layout.block_stacks.iter().enumerate() {
        if idx == stack_idx {
            continue;
        }
        // A stack travels with its signals; its header starts above them.
        if stack.covers_any(&moved_signals) {
            to_move.extend(stack.shapes());
            continue;
        }
        for block in &stack.blocks {
            if canvas.bbox(block.outline).y >= threshold {
                to_move.extend(block.shapes());
            }
        }
    }

    let mut extend = Vec::new();
    for (idx, actor) in layout.actors.iter().enumerate() {
        if moved_creations.contains(&ActorId(idx)) || canvas.bbox(actor.top.rect).y >= threshold {
            to_move.extend(actor.shapes());
            continue;
        }
        // The top stays put; the lifeline grows under it.
        if canvas.bbox(actor.line).y2 >= threshold {
            extend.push(actor.line);
        }
        if let Some(bottom) = &actor.bottom
            && canvas.bbox(bottom.rect).y >= threshold
        {
            to_move.extend(bottom.shapes());
        }
        if let Some(cross) = &actor.cross
            && cross.bbox(canvas).y >= threshold
        {
            to_move.extend(cross.shapes());
        }
    }

    // Destruction signals share their cross with the actor.
    let mut seen = HashSet::new();
    to_move.retain(|id| seen.insert(*id));

    let canvas = &mut layout.canvas;
    canvas.translate_y(&to_move, offset);
    for line in extend {
        let y2 = canvas.bbox(line).y2;
        canvas.set_line_y2(line, y2 + offset);
    }
}
