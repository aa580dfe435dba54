//! Global correction passes run once over the first-pass layout, in a fixed
//! order: resize actor boxes, restore actor spacing, push actors clear of
//! signal labels, then recentre destruction crosses.

use super::*;
use crate::config::Dimensions;
use crate::geometry::BBox;
use crate::ir::SignalKind;

/// Positions closer than this are treated as equal.
const EPS: f32 = 1e-3;

pub(super) fn auto_adjust(layout: &mut SequenceLayout, dims: &Dimensions) {
    let order = layout.sorted_actor_ids();
    debug!(
        actors = ?order
            .iter()
            .map(|id| layout.actor(*id).name.as_str())
            .collect::<Vec<_>>(),
        "actors sorted by lifeline"
    );

    resize_actors(layout, &order, dims);
    space_actors(layout, &order, dims);
    adjust_signals(layout, &order, dims);
    for id in &order {
        update_destroyed_actor(layout, *id);
    }
}

/// Widens every actor box whose label overflows it, keeping the left edge,
/// and moves the lifeline to the new centre.
fn resize_actors(layout: &mut SequenceLayout, order: &[ActorId], dims: &Dimensions) {
    for id in order {
        let element = &layout.actors[id.0];
        if !element.top.should_be_resized(&layout.canvas) {
            continue;
        }
        let text_width = layout.canvas.bbox(element.top.text).width;
        let width = text_width + dims.actor_rect_min_x_padding * 2.0;
        let rect_x = layout.canvas.bbox(element.top.rect).x;
        let line_x = rect_x + width / 2.0;
        debug!(actor = %element.name, width, line_x, "resizing actor rectangles");

        let (top, bottom, line) = (element.top, element.bottom, element.line);
        let canvas = &mut layout.canvas;
        top.resize(canvas, width);
        canvas.set_line_x(line, line_x, line_x);
        if let Some(bottom) = bottom {
            let bottom_x = canvas.bbox(bottom.rect).x;
            canvas.translate_x(&bottom.shapes(), rect_x - bottom_x);
            bottom.resize(canvas, width);
        }
        update_destroyed_actor(layout, *id);
    }
}

/// Restores the default gap between each pair of neighbouring boxes by
/// moving the right one. Later pairs see positions already updated.
fn space_actors(layout: &mut SequenceLayout, order: &[ActorId], dims: &Dimensions) {
    let gap = dims.default_rect_gap();
    for pair in order.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        let left_x2 = layout.canvas.bbox(layout.actor(left).top.rect).x2;
        let right_x = layout.canvas.bbox(layout.actor(right).top.rect).x;
        let offset = left_x2 + gap - right_x;
        if offset.abs() > EPS {
            debug!(
                actor = %layout.actor(right).name,
                after = %layout.actor(left).name,
                offset_x = offset,
                "restoring default distance between actors"
            );
            layout.translate_actor_x(right, offset);
        }
    }
}

/// Moves actors right until no signal label straddles a neighbouring
/// lifeline or a created actor's box.
fn adjust_signals(layout: &mut SequenceLayout, order: &[ActorId], dims: &Dimensions) {
    reanchor_signals(layout, dims);
    let positions: HashMap<ActorId, usize> = order
        .iter()
        .enumerate()
        .map(|(pos, id)| (*id, pos))
        .collect();

    for id in order {
        for signal_idx in layout.actor(*id).signal_indices() {
            let Some((from, offset)) = label_overlap(layout, order, &positions, signal_idx, dims) else {
                continue;
            };
            debug!(
                signal_id = layout.signals[signal_idx].id,
                actor = %layout.actor(order[from]).name,
                offset_x = offset,
                "signal text too long, moving actors to the right"
            );
            for moved in &order[from..] {
                layout.translate_actor_x(*moved, offset);
            }
            reanchor_signals(layout, dims);
        }
    }
}

/// For an overlapping label, the sorted position of the first actor to move
/// and the distance to move it and every actor after it.
fn label_overlap(
    layout: &SequenceLayout,
    order: &[ActorId],
    positions: &HashMap<ActorId, usize>,
    signal_idx: usize,
    dims: &Dimensions,
) -> Option<(usize, f32)> {
    let signal = &layout.signals[signal_idx];
    let text = layout.canvas.bbox(signal.text?);
    let anchor = *positions.get(&signal.actor_a)?;
    let clearance = dims.signal_overlapping_actor_x_offset;

    match signal.kind {
        SignalKind::Simple if signal.is_self() => {
            let next = *order.get(anchor + 1)?;
            pushed_right(&text, layout.lifeline_x(next), clearance).map(|offset| (anchor + 1, offset))
        }
        SignalKind::Simple => {
            let actor_b = signal.actor_b?;
            if layout.lifeline_x(signal.actor_a) <= layout.lifeline_x(actor_b) {
                let next = *order.get(anchor + 1)?;
                pushed_right(&text, layout.lifeline_x(next), clearance).map(|offset| (anchor + 1, offset))
            } else {
                // The label sits left of the sender; move the sender away
                // from the lifeline it covers.
                let previous = *order.get(anchor.checked_sub(1)?)?;
                let target = layout.lifeline_x(previous);
                text.straddles_x(target)
                    .then(|| (anchor, target - text.x + clearance))
            }
        }
        SignalKind::ActorCreation => {
            let mut targets = Vec::new();
            if let Some(next) = order.get(anchor + 1) {
                targets.push(*next);
            }
            targets.extend(signal.actor_b);
            targets.into_iter().find_map(|target| {
                let rect_x = layout.canvas.bbox(layout.actor(target).top.rect).x;
                let pos = *positions.get(&target)?;
                pushed_right(&text, rect_x, clearance).map(|offset| (pos, offset))
            })
        }
        SignalKind::ActorDeletion => None,
    }
}

fn pushed_right(text: &BBox, target_x: f32, clearance: f32) -> Option<f32> {
    text.straddles_x(target_x)
        .then(|| text.x2 - target_x + clearance)
}

/// Snaps every signal's line ends and label back onto the current lifelines.
/// Running it twice without moving an actor changes nothing.
pub(super) fn reanchor_signals(layout: &mut SequenceLayout, dims: &Dimensions) {
    for idx in 0..layout.signals.len() {
        reanchor_signal(layout, idx, dims);
    }
}

fn reanchor_signal(layout: &mut SequenceLayout, idx: usize, dims: &Dimensions) {
    let signal = &layout.signals[idx];
    let a_x = layout.lifeline_x(signal.actor_a);
    let (shape, text, actor_b) = (signal.shape, signal.text, signal.actor_b);
    let canvas = &mut layout.canvas;

    match shape {
        SignalShape::SelfLoop { lines } => {
            let width = dims.signal_self_width;
            canvas.set_line_x(lines[0], a_x, a_x + width);
            canvas.set_line_x(lines[1], a_x + width, a_x + width);
            canvas.set_line_x(lines[2], a_x + width, a_x);
            if let Some(text) = text {
                canvas.set_text_left(text, a_x + width + dims.signal_text_padding_x);
            }
        }
        SignalShape::Classic { line } => {
            let Some(actor_b) = actor_b else {
                return;
            };
            let b_x = layout.actors[actor_b.0].line_x(canvas);
            let forward = a_x <= b_x;
            canvas.set_line_x(line, a_x.min(b_x), a_x.max(b_x));
            canvas.set_line_markers(line, !forward, forward);
            if let Some(text) = text {
                let width = canvas.bbox(text).width;
                canvas.set_text_left(text, placement::classic_label_left(forward, a_x, width, dims));
            }
        }
        SignalShape::Creation { line } => {
            let Some(actor_b) = actor_b else {
                return;
            };
            let b_rect_x = canvas.bbox(layout.actors[actor_b.0].top.rect).x;
            canvas.set_line_x(line, a_x, b_rect_x);
            if let Some(text) = text {
                canvas.set_text_left(text, a_x + dims.signal_text_padding_x);
            }
        }
        SignalShape::Destruction { .. } => {}
    }
}

/// Recentres a destroyed actor's cross on its lifeline.
fn update_destroyed_actor(layout: &mut SequenceLayout, id: ActorId) {
    let element = &layout.actors[id.0];
    let (Some(cross), true) = (element.cross, element.destroyed) else {
        return;
    };
    let line_x = element.line_x(&layout.canvas);
    let center = cross.bbox(&layout.canvas).cx();
    if (center - line_x).abs() > EPS {
        debug!(actor = %element.name, line_x, "recentring destruction cross");
        cross.recenter(&mut layout.canvas, line_x);
    }
}
