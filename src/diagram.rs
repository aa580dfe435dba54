use crate::config::{apply_overrides, Config};
use crate::error::{Error, Result};
use crate::ir::DiagramModel;
use crate::layout::{compute_layout, Diagnostic, SequenceLayout};
use crate::parser::parse_sequence;
use crate::render::render_svg;
use tracing::{info, warn};

/// Load-then-draw entry point for a host: parse once, draw into a named
/// container, inspect the result.
#[derive(Debug, Clone, Default)]
pub struct SequenceDiagram {
    config: Config,
    model: Option<DiagramModel>,
    init_config: Option<serde_json::Value>,
    layout: Option<SequenceLayout>,
}

impl SequenceDiagram {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Parses `source`, replacing any previously loaded diagram.
    pub fn load(&mut self, source: &str) -> Result<&DiagramModel> {
        info!("parsing sequence diagram");
        let parsed = parse_sequence(source)?;
        self.init_config = parsed.init_config;
        self.layout = None;
        Ok(self.model.insert(parsed.model))
    }

    pub fn model(&self) -> Option<&DiagramModel> {
        self.model.as_ref()
    }

    /// Config in effect for the loaded diagram: the base config with the
    /// source's `init` directive merged over it.
    pub fn effective_config(&self) -> Config {
        let Some(init) = self.init_config.clone() else {
            return self.config.clone();
        };
        match apply_overrides(self.config.clone(), init) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "ignoring init directive");
                self.config.clone()
            }
        }
    }

    /// Lays out the loaded diagram and returns it as SVG whose root element
    /// has `container_id` as id.
    pub fn draw(&mut self, container_id: &str) -> Result<String> {
        let model = self.model.as_ref().ok_or(Error::NotLoaded)?;
        let config = self.effective_config();
        let layout = compute_layout(model, &config);
        let svg = render_svg(&layout, &config.theme, container_id);
        self.layout = Some(layout);
        Ok(svg)
    }

    /// Layout from the last `draw()`.
    pub fn layout(&self) -> Option<&SequenceLayout> {
        self.layout.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.layout
            .as_ref()
            .map(|layout| layout.diagnostics.items())
            .unwrap_or_default()
    }

    /// Logs the drawn actors, destroyed actors and signals.
    pub fn debug(&self) {
        match &self.layout {
            Some(layout) => layout.log_state(),
            None => info!("nothing drawn yet"),
        }
    }
}
