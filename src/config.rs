use crate::error::Result;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named layout constants. Built once per render and passed by reference
/// into every layout stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dimensions {
    /// X and Y padding around the whole drawing.
    pub svg_padding: f32,
    /// Vertical step between two consecutive signals.
    pub distance_between_signals: f32,
    /// Horizontal distance between two consecutive lifelines.
    pub distance_between_actors: f32,
    /// Width (and height) of the cross drawn on a destroyed actor.
    pub cross_width: f32,
    pub actor_rect_width: f32,
    pub actor_rect_height: f32,
    /// Left and right padding kept around an actor label once resized.
    pub actor_rect_min_x_padding: f32,
    pub signal_self_width: f32,
    pub signal_self_height: f32,
    pub signal_self_text_padding_y: f32,
    pub signal_text_padding_x: f32,
    pub signal_text_padding_y: f32,
    /// Clearance added when a label pushes an actor to the right.
    pub signal_overlapping_actor_x_offset: f32,
    /// Length of the line between a creator lifeline and the created box.
    pub signal_creation_width: f32,
    pub title_height: f32,
    pub block_padding_x: f32,
    pub block_padding_y: f32,
    /// Extra outward padding per nesting level below a block.
    pub block_nesting_step: f32,
    pub block_header_height: f32,
    pub block_label_padding: f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            svg_padding: 10.0,
            distance_between_signals: 50.0,
            distance_between_actors: 150.0,
            cross_width: 20.0,
            actor_rect_width: 100.0,
            actor_rect_height: 50.0,
            actor_rect_min_x_padding: 5.0,
            signal_self_width: 25.0,
            signal_self_height: 50.0,
            signal_self_text_padding_y: 25.0,
            signal_text_padding_x: 5.0,
            signal_text_padding_y: 5.0,
            signal_overlapping_actor_x_offset: 10.0,
            signal_creation_width: 100.0,
            title_height: 50.0,
            block_padding_x: 15.0,
            block_padding_y: 10.0,
            block_nesting_step: 8.0,
            block_header_height: 20.0,
            block_label_padding: 6.0,
        }
    }
}

impl Dimensions {
    /// Gap between two actor rectangles when both have the default width.
    pub fn default_rect_gap(&self) -> f32 {
        self.distance_between_actors - self.actor_rect_width
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub dimensions: Dimensions,
    pub render: RenderConfig,
    /// Use the per-character width table instead of system font metrics.
    pub fast_text_metrics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::classic(),
            dimensions: Dimensions::default(),
            render: RenderConfig::default(),
            fast_text_metrics: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    dimensions: Option<serde_json::Value>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    line_color: Option<String>,
    actor_bkg: Option<String>,
    actor_border: Option<String>,
    block_border: Option<String>,
    background: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    apply_overrides(config, value)
}

/// Merges a config object (file contents or an `init` directive) over
/// `config`. Unknown keys are ignored.
pub fn apply_overrides(mut config: Config, value: serde_json::Value) -> Result<Config> {
    let parsed: ConfigFile = serde_json::from_value(value)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.actor_bkg {
            config.theme.actor_fill = v;
        }
        if let Some(v) = vars.actor_border {
            config.theme.actor_border = v;
        }
        if let Some(v) = vars.block_border {
            config.theme.block_border = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(serde_json::Value::Object(overrides)) = parsed.dimensions {
        let mut merged = serde_json::to_value(&config.dimensions)?;
        if let serde_json::Value::Object(current) = &mut merged {
            for (key, value) in overrides {
                current.insert(key, value);
            }
        }
        config.dimensions = serde_json::from_value(merged)?;
    }

    if let Some(fast) = parsed.fast_text_metrics {
        config.fast_text_metrics = fast;
    }

    Ok(config)
}
