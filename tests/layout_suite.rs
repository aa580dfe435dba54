use std::path::Path;

use seqdiag_renderer::geometry::BBox;
use seqdiag_renderer::ir::SignalKind;
use seqdiag_renderer::layout::{Diagnostic, SequenceLayout, SignalShape};
use seqdiag_renderer::{Config, SequenceDiagram};

// Keep this list explicit so new fixtures must be added intentionally.
const FIXTURES: [&str; 7] = [
    "basic.seq",
    "blocks.seq",
    "lifecycle.seq",
    "long_labels.seq",
    "nested_blocks.seq",
    "notes_and_comments.seq",
    "self_signals.seq",
];

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.starts_with("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.ends_with("</svg>"), "{fixture}: missing </svg tag");
    assert!(!svg.contains("NaN"), "{fixture}: NaN coordinate");
}

fn draw(source: &str) -> (SequenceDiagram, String) {
    let mut diagram = SequenceDiagram::new(Config::default());
    diagram.load(source).expect("parse failed");
    let svg = diagram.draw("suite").expect("draw failed");
    (diagram, svg)
}

fn draw_fixture(name: &str) -> (SequenceDiagram, String) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    draw(&input)
}

fn layout(diagram: &SequenceDiagram) -> &SequenceLayout {
    diagram.layout().expect("drawn")
}

fn rect(layout: &SequenceLayout, name: &str) -> BBox {
    let actor = layout.actor_named(name).expect("actor exists");
    layout.canvas.bbox(actor.top.rect)
}

#[test]
fn render_all_fixtures() {
    for fixture in FIXTURES {
        let (diagram, svg) = draw_fixture(fixture);
        assert_valid_svg(&svg, fixture);
        assert!(svg.contains("id=\"suite\""), "{fixture}: container id");
        let layout = layout(&diagram);
        assert!(layout.size.width > 0.0 && layout.size.height > 0.0, "{fixture}: empty canvas");
        assert!(diagram.diagnostics().is_empty(), "{fixture}: {:?}", diagram.diagnostics());
    }
}

#[test]
fn every_model_signal_has_one_element() {
    for fixture in FIXTURES {
        let (diagram, _) = draw_fixture(fixture);
        let model = diagram.model().expect("loaded");
        let layout = layout(&diagram);
        for signal in &model.signals {
            let matching: Vec<_> = layout.signals.iter().filter(|element| element.id == signal.id).collect();
            assert_eq!(matching.len(), 1, "{fixture}: signal {}", signal.id);
            let (x1, x2) = matching[0].line_x(&layout.canvas);
            let (y1, y2) = matching[0].line_y(&layout.canvas);
            assert!(
                [x1, x2, y1, y2].iter().all(|value| value.is_finite()),
                "{fixture}: signal {} has non-finite geometry",
                signal.id
            );
        }
    }
}

#[test]
fn signals_flow_top_to_bottom() {
    for fixture in FIXTURES {
        let (diagram, _) = draw_fixture(fixture);
        let layout = layout(&diagram);
        let mut signals: Vec<_> = layout.signals.iter().collect();
        signals.sort_by_key(|signal| signal.id);
        for pair in signals.windows(2) {
            let upper = pair[0].line_y(&layout.canvas).0;
            let lower = pair[1].line_y(&layout.canvas).0;
            assert!(
                upper < lower,
                "{fixture}: signal {} at {upper} is not above signal {} at {lower}",
                pair[0].id,
                pair[1].id
            );
        }
    }
}

#[test]
fn actor_labels_fit_their_boxes() {
    for fixture in FIXTURES {
        let (diagram, _) = draw_fixture(fixture);
        let layout = layout(&diagram);
        for actor in &layout.actors {
            let boxes = std::iter::once(actor.top).chain(actor.bottom);
            for rect in boxes {
                let text = layout.canvas.bbox(rect.text);
                let frame = layout.canvas.bbox(rect.rect);
                assert!(text.width < frame.width, "{fixture}: label of {actor} overflows");
            }
        }
    }
}

#[test]
fn self_signals_loop_back_to_their_lifeline() {
    let (diagram, _) = draw_fixture("self_signals.seq");
    let layout = layout(&diagram);
    let mut seen = 0;
    for signal in layout.signals.iter().filter(|signal| signal.is_self()) {
        let SignalShape::SelfLoop { lines } = signal.shape else {
            unreachable!();
        };
        let line_x = layout.lifeline_x(signal.actor_a);
        let first = layout.canvas.bbox(lines[0]);
        let last = layout.canvas.bbox(lines[2]);
        assert_eq!(first.x, line_x);
        assert_eq!(last.x, line_x);
        assert_eq!(first.x2, last.x2);
        assert!(first.y < last.y);
        seen += 1;
    }
    assert_eq!(seen, 2);
}

#[test]
fn scenario_forward_signal() {
    let (diagram, svg) = draw("A->B: hello");
    let layout = layout(&diagram);
    assert_eq!(layout.actors.len(), 2);
    assert!(rect(layout, "A").x < rect(layout, "B").x);

    let signal = layout.signal(0).expect("signal drawn");
    let (x1, x2) = signal.line_x(&layout.canvas);
    let a = layout.actor_named("A").unwrap().line_x(&layout.canvas);
    let b = layout.actor_named("B").unwrap().line_x(&layout.canvas);
    assert_eq!((x1, x2), (a, b));
    assert!(svg.contains(">hello</text>"));
    assert!(svg.contains("marker-end=\"url(#suite-end)\""));
    assert!(!svg.contains("marker-start=\"url(#suite-start)\""));
}

#[test]
fn scenario_create_then_destroy() {
    let (diagram, _) = draw("A->*C: spawn\ndestroy C");
    let layout = layout(&diagram);
    let c = layout.actor_named("C").expect("C drawn");
    assert!(c.created_by_signal);
    assert!(c.destroyed);
    assert!(c.bottom.is_none());
    assert_eq!(layout.destroyed.len(), 1);

    let creation = layout.signal(0).unwrap();
    assert_eq!(creation.kind, SignalKind::ActorCreation);
    let (x1, x2) = creation.line_x(&layout.canvas);
    assert_eq!(x1, layout.actor_named("A").unwrap().line_x(&layout.canvas));
    assert_eq!(x2, layout.canvas.bbox(c.top.rect).x);

    let cross = c.cross.expect("cross drawn").bbox(&layout.canvas);
    assert!((cross.cx() - c.line_x(&layout.canvas)).abs() < 1e-3);
    assert!(matches!(layout.signal(1).unwrap().shape, SignalShape::Destruction { .. }));
}

#[test]
fn scenario_self_signal_takes_two_steps() {
    let (self_diagram, _) = draw("A->A: loop\nA->B: next");
    let (plain_diagram, _) = draw("A->B: msg\nA->B: next");
    let step = Config::default().dimensions.distance_between_signals;

    let cursor = |diagram: &SequenceDiagram| {
        let layout = layout(diagram);
        let first = layout.signal(0).unwrap().line_y(&layout.canvas).0;
        let second = layout.signal(1).unwrap().line_y(&layout.canvas).0;
        second - first
    };
    assert_eq!(cursor(&plain_diagram), step);
    assert_eq!(cursor(&self_diagram), step * 2.0);
}

#[test]
fn scenario_wide_actor_pushes_neighbour_by_growth() {
    let (diagram, _) = draw("participant VeryLongActorNameHere\nparticipant B\nVeryLongActorNameHere->B: x");
    let layout = layout(&diagram);
    let dims = Config::default().dimensions;
    let long = rect(layout, "VeryLongActorNameHere");
    let b = rect(layout, "B");
    assert!(long.width > dims.actor_rect_width);
    let growth = long.width - dims.actor_rect_width;
    assert!((b.x - (dims.distance_between_actors + growth)).abs() < 1e-3);
    assert!((b.x - long.x2 - dims.default_rect_gap()).abs() < 1e-3);
}

#[test]
fn adjacent_actors_keep_default_gap() {
    let (diagram, _) = draw_fixture("basic.seq");
    let layout = layout(&diagram);
    let gap = Config::default().dimensions.default_rect_gap();
    let order = layout.sorted_actor_ids();
    for pair in order.windows(2) {
        let left = layout.canvas.bbox(layout.actor(pair[0]).top.rect);
        let right = layout.canvas.bbox(layout.actor(pair[1]).top.rect);
        assert!((right.x - left.x2 - gap).abs() < 1e-3);
    }
}

#[test]
fn blocks_do_not_swallow_the_next_signal() {
    let (diagram, _) = draw_fixture("nested_blocks.seq");
    let layout = layout(&diagram);
    assert_eq!(layout.block_stacks.len(), 2);
    let outer = layout.canvas.bbox(layout.block_stacks[0].blocks[0].outline);
    let following = layout.signal(1).unwrap();
    assert!(following.top(&layout.canvas) > outer.y2);
}

#[test]
fn title_is_drawn_above_actors() {
    let (diagram, svg) = draw_fixture("blocks.seq");
    let layout = layout(&diagram);
    let title = layout.canvas.bbox(layout.title.expect("title drawn").text);
    assert!(title.y2 <= rect(layout, "A").y);
    assert!(svg.contains(">Retry with backoff</text>"));
}

#[test]
fn init_directive_reaches_the_svg() {
    let (_, svg) = draw_fixture("notes_and_comments.seq");
    assert!(svg.contains("stroke=\"#336699\""));
}

#[test]
fn problems_are_reported_not_fatal() {
    let (diagram, svg) = draw("A->*B: first\nA->*B: again\nA->B: still fine");
    assert_valid_svg(&svg, "duplicate creation");
    assert!(matches!(
        diagram.diagnostics(),
        [Diagnostic::DuplicateActorCreation { .. }]
    ));
    let layout = layout(&diagram);
    assert!(layout.signal(1).is_none());
    assert!(layout.signal(2).is_some());
}

#[test]
fn destroy_of_plain_actor_is_dropped_by_parser() {
    let mut diagram = SequenceDiagram::new(Config::default());
    let model = diagram.load("A->B: hi\ndestroy B\ndestroy Z").expect("parses");
    assert_eq!(model.signals.len(), 1);
    assert_eq!(model.warnings.len(), 2);
}

#[test]
fn unknown_statement_is_a_parse_error() {
    let mut diagram = SequenceDiagram::new(Config::default());
    let err = diagram.load("A->B: fine\nthis is not a statement").unwrap_err();
    assert!(matches!(err, seqdiag_renderer::Error::Parse { line: 2, .. }));
}

#[test]
fn one_shot_render_matches_facade() {
    let source = "A->B: hello";
    let svg = seqdiag_renderer::render(source, &Config::default()).expect("render");
    let mut diagram = SequenceDiagram::new(Config::default());
    diagram.load(source).unwrap();
    assert_eq!(svg, diagram.draw("sequence-diagram").unwrap());
}
