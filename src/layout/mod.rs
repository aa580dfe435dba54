mod adjust;
mod blocks;
mod diagnostics;
mod elements;
mod placement;
mod sizing;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use elements::*;
pub use sizing::CanvasSize;

use crate::config::Config;
use crate::geometry::Canvas;
use crate::ir::DiagramModel;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Positioned drawing of one sequence diagram: the shape arena plus the
/// elements that own those shapes.
#[derive(Debug, Clone)]
pub struct SequenceLayout {
    pub canvas: Canvas,
    pub actors: Vec<ActorElement>,
    pub signals: Vec<SignalElement>,
    pub title: Option<TitleElement>,
    pub block_stacks: Vec<BlockStackElement>,
    pub destroyed: BTreeSet<ActorId>,
    pub diagnostics: Diagnostics,
    pub size: CanvasSize,
    index: HashMap<(String, bool), ActorId>,
}

impl SequenceLayout {
    fn new(config: &Config) -> Self {
        Self {
            canvas: Canvas::new(config),
            actors: Vec::new(),
            signals: Vec::new(),
            title: None,
            block_stacks: Vec::new(),
            destroyed: BTreeSet::new(),
            diagnostics: Diagnostics::default(),
            size: CanvasSize::default(),
            index: HashMap::new(),
        }
    }

    /// The element drawn for `name` with exactly this creation flag.
    pub fn find_actor(&self, name: &str, created_by_signal: bool) -> Option<ActorId> {
        self.index.get(&(name.to_string(), created_by_signal)).copied()
    }

    /// The plain element for `name`, or the one created by a signal.
    pub fn resolve_actor(&self, name: &str) -> Option<ActorId> {
        self.find_actor(name, false)
            .or_else(|| self.find_actor(name, true))
    }

    pub fn actor(&self, id: ActorId) -> &ActorElement {
        &self.actors[id.0]
    }

    pub fn actor_named(&self, name: &str) -> Option<&ActorElement> {
        self.resolve_actor(name).map(|id| self.actor(id))
    }

    pub fn lifeline_x(&self, id: ActorId) -> f32 {
        self.actor(id).line_x(&self.canvas)
    }

    pub fn signal(&self, id: u32) -> Option<&SignalElement> {
        self.signals.iter().find(|signal| signal.id == id)
    }

    fn push_actor(&mut self, element: ActorElement) -> ActorId {
        let id = ActorId(self.actors.len());
        self.index
            .insert((element.name.clone(), element.created_by_signal), id);
        self.actors.push(element);
        id
    }

    /// Actors by current lifeline x. Coinciding lifelines fall back to
    /// declaration order, then plain before created.
    pub fn sorted_actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = (0..self.actors.len()).map(ActorId).collect();
        ids.sort_by(|a, b| {
            let (ea, eb) = (self.actor(*a), self.actor(*b));
            self.lifeline_x(*a)
                .partial_cmp(&self.lifeline_x(*b))
                .unwrap_or(Ordering::Equal)
                .then(ea.order.cmp(&eb.order))
                .then(ea.created_by_signal.cmp(&eb.created_by_signal))
                .then(a.cmp(b))
        });
        ids
    }

    /// Moves every shape owned by the actor horizontally.
    pub fn translate_actor_x(&mut self, id: ActorId, offset: f32) {
        let shapes = self.actor(id).shapes();
        debug!(actor = %self.actor(id).name, offset_x = offset, "moving actor");
        self.canvas.translate_x(&shapes, offset);
    }

    /// Logs the drawn actors, destroyed actors and signals.
    pub fn log_state(&self) {
        info!("actors currently drawn");
        for actor in &self.actors {
            info!("{actor}");
        }
        info!("actors that have been destroyed");
        for id in &self.destroyed {
            info!("{}", self.actor(*id).name);
        }
        info!("signals currently drawn");
        for signal in &self.signals {
            info!("{signal}");
        }
    }
}

/// Runs placement, the adjustment passes, title and block placement, block
/// overlap resolution and sizing, in that order.
pub fn compute_layout(model: &DiagramModel, config: &Config) -> SequenceLayout {
    let dims = &config.dimensions;
    let mut layout = SequenceLayout::new(config);

    info!(
        actors = model.actors.len(),
        signals = model.signals.len(),
        "placing sequence diagram"
    );
    placement::place_actors(&mut layout, model, dims);
    placement::place_signals(&mut layout, model, dims);

    info!("adjusting layout");
    adjust::auto_adjust(&mut layout, dims);

    if let Some(title) = model.title.as_deref().filter(|_| model.has_title()) {
        placement::place_title(&mut layout, title.trim(), dims);
    }

    blocks::place_blocks(&mut layout, model, dims);
    blocks::resolve_block_overlap(&mut layout, dims);

    layout.size = sizing::compute_size(&layout.canvas, dims);
    info!(
        width = layout.size.width,
        height = layout.size.height,
        diagnostics = layout.diagnostics.len(),
        "layout complete"
    );
    layout
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::parser::parse_sequence;

    pub fn layout_of(source: &str) -> SequenceLayout {
        let parsed = parse_sequence(source).expect("fixture parses");
        compute_layout(&parsed.model, &Config::default())
    }
}
