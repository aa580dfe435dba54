use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static FONT_MEASURER: Lazy<Mutex<FontMeasurer>> = Lazy::new(|| Mutex::new(FontMeasurer::new()));

/// Width of `text` rendered at `font_size`. With `fast` set, or when no
/// system face matches `font_family`, the per-character table is used.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str, fast: bool) -> f32 {
    if text.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    if !fast
        && let Some(width) = FONT_MEASURER
            .lock()
            .ok()
            .and_then(|mut guard| guard.measure(text, font_size, font_family))
    {
        return width;
    }
    estimate_text_width(text, font_size)
}

/// Deterministic width estimate calibrated on a sans-serif face.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.28,
        'i' | 'j' | 'l' | '!' | '|' | '.' | ',' | ':' | ';' | '\'' => 0.25,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '{' | '}' | '-' => 0.35,
        'm' | 'w' => 0.82,
        'M' | 'W' | '@' => 0.9,
        '0'..='9' => 0.55,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.52,
        '\t' => 1.12,
        c if c.is_ascii() => 0.5,
        // CJK and other wide glyphs.
        _ => 1.0,
    }
}

struct FontMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascii_advances: [u16; 128],
}

impl FontMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_string();
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font_family);
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get(&key)?.as_ref()?;
        face.measure(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<LoadedFace> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "-apple-system" => Family::SansSerif,
                "monospace" => Family::Monospace,
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| LoadedFace::new(data.to_vec(), index))
            .flatten()
    }
}

impl LoadedFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = f32::from(face.units_per_em().max(1));
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
        })
    }

    fn measure(&self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        if text.is_ascii() {
            let width = text
                .bytes()
                .map(|byte| match self.ascii_advances[byte as usize] {
                    0 => fallback,
                    advance => f32::from(advance) * scale,
                })
                .sum();
            return Some(width);
        }

        let face = Face::parse(&self.data, self.index).ok()?;
        let width = text
            .chars()
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map_or(fallback, |advance| f32::from(advance) * scale)
            })
            .sum();
        Some(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_deterministic_and_monotonic() {
        let short = estimate_text_width("hello", 16.0);
        let long = estimate_text_width("hello world", 16.0);
        assert!(short > 0.0);
        assert!(long > short);
        assert_eq!(short, estimate_text_width("hello", 16.0));
    }

    #[test]
    fn fast_mode_uses_estimate() {
        let width = measure_text_width("VeryLongActorNameHere", 16.0, "sans-serif", true);
        assert_eq!(width, estimate_text_width("VeryLongActorNameHere", 16.0));
        assert!(width > 100.0);
    }

    #[test]
    fn empty_text_has_no_width() {
        assert_eq!(measure_text_width("", 16.0, "sans-serif", false), 0.0);
    }
}
