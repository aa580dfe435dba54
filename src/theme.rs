use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub line_color: String,
    pub line_width: f32,
    pub actor_fill: String,
    pub actor_border: String,
    pub block_border: String,
    pub background: String,
}

impl Theme {
    /// Black strokes on white.
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 16.0,
            text_color: "#000000".to_string(),
            line_color: "#000000".to_string(),
            line_width: 2.0,
            actor_fill: "#FFFFFF".to_string(),
            actor_border: "#000000".to_string(),
            block_border: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            text_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            line_width: 1.5,
            actor_fill: "#F8FAFF".to_string(),
            actor_border: "#C7D2E5".to_string(),
            block_border: "#9AA8C2".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
