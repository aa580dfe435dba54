pub mod config;
pub mod diagram;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::Config;
pub use diagram::SequenceDiagram;
pub use error::{Error, Result};
pub use layout::{Diagnostic, SequenceLayout};

/// Parses `source` and renders it to SVG in one call.
pub fn render(source: &str, config: &Config) -> Result<String> {
    let mut diagram = SequenceDiagram::new(config.clone());
    diagram.load(source)?;
    diagram.draw("sequence-diagram")
}
