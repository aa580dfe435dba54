//! First pass: actors left to right, then signals top to bottom, using only
//! positions already known. The adjustment passes repair what this gets wrong.

use super::*;
use crate::config::Dimensions;
use crate::geometry::{LineOption, TextOption};
use crate::ir::{Actor, LineType, Signal, SignalKind};

pub(super) fn place_actors(layout: &mut SequenceLayout, model: &DiagramModel, dims: &Dimensions) {
    let top = actors_top(model, dims);
    let mut offset_x = 0.0;
    for actor in model.actors_in_order() {
        // Drawn along with their creation signal.
        if actor.created_by_signal {
            continue;
        }
        debug!(actor = %actor.name, x = offset_x, "drawing actor");
        let element = draw_actor(layout, actor, &actor.name, false, offset_x, top, dims);
        layout.push_actor(element);
        offset_x += dims.distance_between_actors;
    }
}

fn actors_top(model: &DiagramModel, dims: &Dimensions) -> f32 {
    if model.has_title() {
        dims.title_height
    } else {
        0.0
    }
}

fn draw_actor(
    layout: &mut SequenceLayout,
    actor: &Actor,
    name: &str,
    created_by_signal: bool,
    x: f32,
    y: f32,
    dims: &Dimensions,
) -> ActorElement {
    let canvas = &mut layout.canvas;
    let top = ActorRect::draw(canvas, x, y, &actor.label, dims);
    let rect = canvas.bbox(top.rect);
    // Zero length until the actor is destroyed or the diagram ends.
    let line = canvas.draw_line(rect.cx(), rect.cx(), rect.y2, rect.y2, &[]);
    ActorElement {
        name: name.to_string(),
        label: actor.label.clone(),
        order: actor.order,
        created_by_signal,
        top,
        bottom: None,
        line,
        cross: None,
        destroyed: false,
        incoming: Vec::new(),
        outgoing: Vec::new(),
        self_signals: Vec::new(),
    }
}

/// Left edge of a classic signal label. Forward labels start just right of
/// the sender's lifeline; backward labels end just left of it.
pub(super) fn classic_label_left(forward: bool, sender_x: f32, text_width: f32, dims: &Dimensions) -> f32 {
    if forward {
        sender_x + dims.signal_text_padding_x
    } else {
        sender_x - dims.signal_text_padding_x - text_width
    }
}

pub(super) fn place_signals(layout: &mut SequenceLayout, model: &DiagramModel, dims: &Dimensions) {
    let mut offset_y =
        actors_top(model, dims) + dims.actor_rect_height + dims.distance_between_signals;

    for signal in &model.signals {
        let advance = match signal.kind {
            SignalKind::Simple => place_simple(layout, signal, offset_y, dims),
            SignalKind::ActorCreation => place_creation(layout, model, signal, offset_y, dims),
            SignalKind::ActorDeletion => place_deletion(layout, signal, offset_y, dims),
        };
        offset_y += advance;
    }

    // Living actors get one lifeline down to a bottom box.
    for idx in 0..layout.actors.len() {
        let id = ActorId(idx);
        if layout.destroyed.contains(&id) {
            continue;
        }
        let canvas = &mut layout.canvas;
        let element = &mut layout.actors[idx];
        let line_x = canvas.bbox(element.line).x;
        canvas.set_line_y2(element.line, offset_y);
        let width = canvas.bbox(element.top.rect).width;
        let bottom = ActorRect::draw(canvas, line_x - width / 2.0, offset_y, &element.label, dims);
        if (width - dims.actor_rect_width).abs() > f32::EPSILON {
            bottom.resize(canvas, width);
        }
        element.bottom = Some(bottom);
    }
}

/// Draws a request/response or self signal; returns how far the cursor moves.
fn place_simple(layout: &mut SequenceLayout, signal: &Signal, offset_y: f32, dims: &Dimensions) -> f32 {
    let actor_b_name = signal.actor_b.as_deref().unwrap_or_default();
    let actor_a = layout.resolve_actor(&signal.actor_a);
    let actor_b = layout.resolve_actor(actor_b_name);

    if signal.to_same_actor() {
        let Some(actor) = actor_a else {
            layout.diagnostics.push(Diagnostic::SelfSignalUnresolved {
                signal_id: signal.id,
                actor: signal.actor_a.clone(),
            });
            return 0.0;
        };
        draw_self_signal(layout, signal, actor, offset_y, dims);
        return dims.distance_between_signals * 2.0;
    }

    let (actor_a, actor_b) = match (actor_a, actor_b) {
        (Some(a), Some(b)) => (a, b),
        (a, _) => {
            let missing = if a.is_none() {
                signal.actor_a.clone()
            } else {
                actor_b_name.to_string()
            };
            layout.diagnostics.push(Diagnostic::UnresolvedActor {
                signal_id: signal.id,
                actor: missing,
            });
            return 0.0;
        }
    };

    debug!(signal_id = signal.id, "drawing {signal}");
    let canvas = &mut layout.canvas;
    let rect_a = canvas.bbox(layout.actors[actor_a.0].top.rect);
    let rect_b = canvas.bbox(layout.actors[actor_b.0].top.rect);
    let forward = rect_a.x < rect_b.x;
    let (x1, x2) = if forward {
        (rect_a.cx(), rect_b.cx())
    } else {
        (rect_b.cx(), rect_a.cx())
    };

    let mut options = vec![if forward {
        LineOption::EndMarker
    } else {
        LineOption::StartMarker
    }];
    if signal.line_type == LineType::Response {
        options.push(LineOption::Dotted);
    }
    let line = canvas.draw_line(x1, x2, offset_y, offset_y, &options);

    let text_y = offset_y - dims.signal_text_padding_y;
    let text = canvas.draw_text(0.0, text_y, &signal.message, &[]);
    let width = canvas.bbox(text).width;
    canvas.set_text_left(text, classic_label_left(forward, rect_a.cx(), width, dims));

    let idx = layout.signals.len();
    layout.signals.push(SignalElement {
        id: signal.id,
        line_type: signal.line_type,
        kind: SignalKind::Simple,
        shape: SignalShape::Classic { line },
        text: Some(text),
        actor_a,
        actor_b: Some(actor_b),
    });
    layout.actors[actor_a.0].outgoing.push(idx);
    layout.actors[actor_b.0].incoming.push(idx);
    dims.distance_between_signals
}

fn draw_self_signal(
    layout: &mut SequenceLayout,
    signal: &Signal,
    actor: ActorId,
    offset_y: f32,
    dims: &Dimensions,
) {
    debug!(signal_id = signal.id, "drawing {signal}");
    let canvas = &mut layout.canvas;
    let x1 = canvas.bbox(layout.actors[actor.0].top.rect).cx();
    let x2 = x1 + dims.signal_self_width;
    let y1 = offset_y;
    let y2 = y1 + dims.signal_self_height;

    let dotted = signal.line_type == LineType::Response;
    let style: &[LineOption] = if dotted { &[LineOption::Dotted] } else { &[] };
    let mut end = style.to_vec();
    end.push(LineOption::EndMarker);

    let lines = [
        canvas.draw_line(x1, x2, y1, y1, style),
        canvas.draw_line(x2, x2, y1, y2, style),
        canvas.draw_line(x2, x1, y2, y2, &end),
    ];
    let text = canvas.draw_text(
        x2 + dims.signal_text_padding_x,
        y1 + dims.signal_self_text_padding_y,
        &signal.message,
        &[],
    );

    let idx = layout.signals.len();
    layout.signals.push(SignalElement {
        id: signal.id,
        line_type: signal.line_type,
        kind: SignalKind::Simple,
        shape: SignalShape::SelfLoop { lines },
        text: Some(text),
        actor_a: actor,
        actor_b: Some(actor),
    });
    layout.actors[actor.0].self_signals.push(idx);
}

fn place_creation(
    layout: &mut SequenceLayout,
    model: &DiagramModel,
    signal: &Signal,
    offset_y: f32,
    dims: &Dimensions,
) -> f32 {
    let actor_b_name = signal.actor_b.as_deref().unwrap_or_default();
    let Some(actor_a) = layout.resolve_actor(&signal.actor_a) else {
        layout.diagnostics.push(Diagnostic::UnresolvedActor {
            signal_id: signal.id,
            actor: signal.actor_a.clone(),
        });
        return 0.0;
    };
    if layout.find_actor(actor_b_name, true).is_some() {
        layout.diagnostics.push(Diagnostic::DuplicateActorCreation {
            signal_id: signal.id,
            actor: actor_b_name.to_string(),
        });
        return 0.0;
    }

    debug!(signal_id = signal.id, actor = %actor_b_name, "drawing actor created by a signal");
    let canvas = &mut layout.canvas;
    let a_x = canvas.bbox(layout.actors[actor_a.0].top.rect).cx();
    let b_x = a_x + dims.signal_creation_width;

    let mut options = vec![LineOption::EndMarker];
    if signal.line_type == LineType::Response {
        options.push(LineOption::Dotted);
    }
    let line = canvas.draw_line(a_x, b_x, offset_y, offset_y, &options);
    let text = canvas.draw_text(
        a_x + dims.signal_text_padding_x,
        offset_y - dims.signal_text_padding_y,
        &signal.message,
        &[],
    );

    let fallback;
    let actor = match model.actors.get(actor_b_name) {
        Some(actor) => actor,
        None => {
            fallback = Actor {
                order: model.actors.len(),
                name: actor_b_name.to_string(),
                label: actor_b_name.to_string(),
                created_by_signal: true,
            };
            &fallback
        }
    };
    let rect_y = offset_y - dims.actor_rect_height / 2.0;
    let element = draw_actor(layout, actor, actor_b_name, true, b_x, rect_y, dims);
    let actor_b = layout.push_actor(element);

    let idx = layout.signals.len();
    layout.signals.push(SignalElement {
        id: signal.id,
        line_type: signal.line_type,
        kind: SignalKind::ActorCreation,
        shape: SignalShape::Creation { line },
        text: Some(text),
        actor_a,
        actor_b: Some(actor_b),
    });
    layout.actors[actor_a.0].outgoing.push(idx);
    layout.actors[actor_b.0].incoming.push(idx);
    dims.distance_between_signals
}

fn place_deletion(layout: &mut SequenceLayout, signal: &Signal, offset_y: f32, dims: &Dimensions) -> f32 {
    let target = layout
        .find_actor(&signal.actor_a, true)
        .or_else(|| layout.find_actor(&signal.actor_a, false))
        .filter(|id| !layout.destroyed.contains(id));
    let Some(actor) = target else {
        layout.diagnostics.push(Diagnostic::DestroyUnresolved {
            signal_id: signal.id,
            actor: signal.actor_a.clone(),
        });
        return 0.0;
    };

    debug!(signal_id = signal.id, actor = %signal.actor_a, "drawing destruction");
    let canvas = &mut layout.canvas;
    let element = &mut layout.actors[actor.0];
    let line_x = canvas.bbox(element.line).x;
    canvas.set_line_y2(element.line, offset_y);
    let cross = CrossElement::draw(canvas, line_x, offset_y, dims);
    element.cross = Some(cross);
    element.destroyed = true;
    layout.destroyed.insert(actor);

    layout.signals.push(SignalElement {
        id: signal.id,
        line_type: signal.line_type,
        kind: SignalKind::ActorDeletion,
        shape: SignalShape::Destruction { cross },
        text: None,
        actor_a: actor,
        actor_b: None,
    });
    dims.distance_between_signals
}

/// Centres the title over the actor row, inside the band reserved above it.
pub(super) fn place_title(layout: &mut SequenceLayout, title: &str, dims: &Dimensions) {
    let options = [TextOption::Centered, TextOption::Title];
    let width = layout.canvas.text_width(title, &options);
    let span = layout
        .actors
        .iter()
        .map(|actor| layout.canvas.bbox(actor.top.rect))
        .reduce(|acc, bbox| acc.union(&bbox));
    let center = span.map_or(width / 2.0, |bbox| bbox.cx()).max(width / 2.0);
    let text = layout
        .canvas
        .draw_text(center, dims.title_height / 2.0, title, &options);
    layout.title = Some(TitleElement { text });
}

#[cfg(test)]
mod tests {
    use crate::layout::test_support::layout_of;
    use super::*;
    use crate::geometry::Shape;

    fn line_options(layout: &SequenceLayout, id: crate::geometry::ShapeId) -> Vec<LineOption> {
        match layout.canvas.shape(id) {
            Shape::Line(line) => line.options.clone(),
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn forward_request_points_at_receiver() {
        let layout = layout_of("A->B: hello");
        assert_eq!(layout.actors.len(), 2);
        let a = layout.actor_named("A").unwrap();
        let b = layout.actor_named("B").unwrap();
        assert!(a.line_x(&layout.canvas) < b.line_x(&layout.canvas));

        let signal = layout.signal(0).unwrap();
        let SignalShape::Classic { line } = signal.shape else {
            panic!("expected classic signal");
        };
        let options = line_options(&layout, line);
        assert!(options.contains(&LineOption::EndMarker));
        assert!(!options.contains(&LineOption::Dotted));
        let (x1, x2) = signal.line_x(&layout.canvas);
        assert_eq!(x1, a.line_x(&layout.canvas));
        assert_eq!(x2, b.line_x(&layout.canvas));
        let text = layout.canvas.bbox(signal.text.unwrap());
        assert_eq!(text.x, x1 + 5.0);
    }

    #[test]
    fn backward_response_is_dotted_with_start_marker() {
        let layout = layout_of("participant A\nparticipant B\nB-->A: ok");
        let signal = layout.signal(0).unwrap();
        let SignalShape::Classic { line } = signal.shape else {
            panic!("expected classic signal");
        };
        let options = line_options(&layout, line);
        assert!(options.contains(&LineOption::StartMarker));
        assert!(options.contains(&LineOption::Dotted));
        let (x1, x2) = signal.line_x(&layout.canvas);
        assert!(x1 < x2);
        let text = layout.canvas.bbox(signal.text.unwrap());
        assert!((text.x2 - (x2 - 5.0)).abs() < 1e-3);
    }

    #[test]
    fn signals_are_registered_on_both_actors() {
        let layout = layout_of("A->B: one\nB-->A: two\nA->A: three");
        let a = layout.actor_named("A").unwrap();
        let b = layout.actor_named("B").unwrap();
        assert_eq!(a.outgoing, vec![0]);
        assert_eq!(a.incoming, vec![1]);
        assert_eq!(a.self_signals, vec![2]);
        assert_eq!(b.incoming, vec![0]);
        assert_eq!(b.outgoing, vec![1]);
    }

    #[test]
    fn self_signal_takes_two_steps() {
        let plain = layout_of("A->B: msg\nA->B: next");
        let looped = layout_of("A->A: loop\nA->B: next");
        let step = |layout: &SequenceLayout| {
            let first = layout.signal(0).unwrap().line_y(&layout.canvas).0;
            let second = layout.signal(1).unwrap().line_y(&layout.canvas).0;
            second - first
        };
        assert_eq!(step(&plain), 50.0);
        assert_eq!(step(&looped), 100.0);
    }

    #[test]
    fn creation_draws_second_actor_at_signal_height() {
        let layout = layout_of("A->*C: spawn\ndestroy C");
        let c = layout.actor_named("C").unwrap();
        assert!(c.created_by_signal);
        assert!(c.destroyed);
        assert!(c.bottom.is_none());
        assert!(c.cross.is_some());

        let creation = layout.signal(0).unwrap();
        assert_eq!(creation.kind, SignalKind::ActorCreation);
        let (_, x2) = creation.line_x(&layout.canvas);
        assert_eq!(x2, layout.canvas.bbox(c.top.rect).x);
        let (y, _) = creation.line_y(&layout.canvas);
        assert_eq!(layout.canvas.bbox(c.top.rect).cy(), y);
    }

    #[test]
    fn bottom_boxes_sit_at_final_offset() {
        let layout = layout_of("A->B: one\nA->B: two");
        for actor in &layout.actors {
            let bottom = actor.bottom.unwrap();
            let line = layout.canvas.bbox(actor.line);
            let rect = layout.canvas.bbox(bottom.rect);
            assert_eq!(line.y2, rect.y);
            assert_eq!(line.y, layout.canvas.bbox(actor.top.rect).y2);
            assert_eq!(rect.cx(), line.x);
        }
    }

    #[test]
    fn duplicate_creation_is_skipped() {
        let mut model = DiagramModel::new();
        model.get_or_create("A", false);
        model.get_or_create("C", true);
        model.signals.push(Signal::simple(0, "A", "C", LineType::Request, SignalKind::ActorCreation, "one"));
        model.signals.push(Signal::simple(1, "A", "C", LineType::Request, SignalKind::ActorCreation, "two"));
        let layout = compute_layout(&model, &Config::default());
        assert_eq!(layout.actors.len(), 2);
        assert_eq!(layout.signals.len(), 1);
        assert!(matches!(
            layout.diagnostics.items(),
            [Diagnostic::DuplicateActorCreation { signal_id: 1, .. }]
        ));
    }

    #[test]
    fn unresolved_actor_is_skipped_without_advancing() {
        let mut model = DiagramModel::new();
        model.get_or_create("A", false);
        model.signals.push(Signal::simple(0, "A", "Ghost", LineType::Request, SignalKind::Simple, "lost"));
        model.signals.push(Signal::simple(1, "A", "A", LineType::Request, SignalKind::Simple, "kept"));
        let layout = compute_layout(&model, &Config::default());
        assert!(layout.signal(0).is_none());
        assert_eq!(layout.signal(1).unwrap().line_y(&layout.canvas).0, 100.0);
        assert!(matches!(
            layout.diagnostics.items(),
            [Diagnostic::UnresolvedActor { signal_id: 0, .. }]
        ));
    }

    #[test]
    fn unresolved_self_signal_is_skipped() {
        let mut model = DiagramModel::new();
        model.get_or_create("A", false);
        model.signals.push(Signal::simple(0, "Ghost", "Ghost", LineType::Request, SignalKind::Simple, "echo"));
        model.signals.push(Signal::simple(1, "A", "A", LineType::Request, SignalKind::Simple, "kept"));
        let layout = compute_layout(&model, &Config::default());
        assert!(layout.signal(0).is_none());
        assert_eq!(layout.signal(1).unwrap().line_y(&layout.canvas).0, 100.0);
        assert!(matches!(
            layout.diagnostics.items(),
            [Diagnostic::SelfSignalUnresolved { signal_id: 0, actor }] if actor == "Ghost"
        ));
    }

    #[test]
    fn second_destroy_is_reported() {
        let mut model = DiagramModel::new();
        model.get_or_create("A", false);
        model.get_or_create("C", true);
        model.signals.push(Signal::simple(0, "A", "C", LineType::Request, SignalKind::ActorCreation, "spawn"));
        model.signals.push(Signal::destroy(1, "C"));
        model.signals.push(Signal::destroy(2, "C"));
        let layout = compute_layout(&model, &Config::default());

        assert!(layout.signal(1).is_some());
        assert!(layout.signal(2).is_none());
        assert_eq!(layout.destroyed.len(), 1);
        assert!(matches!(
            layout.diagnostics.items(),
            [Diagnostic::DestroyUnresolved { signal_id: 2, actor }] if actor == "C"
        ));
    }

    #[test]
    fn title_shifts_actor_row_down() {
        let layout = layout_of("title: Checkout\nA->B: pay");
        let title = layout.title.unwrap();
        let bbox = layout.canvas.bbox(title.text);
        let a = layout.actor_named("A").unwrap();
        assert_eq!(layout.canvas.bbox(a.top.rect).y, 50.0);
        assert!((bbox.cy() - 25.0).abs() < 1e-3);
    }
}
