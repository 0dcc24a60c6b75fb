use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Category colours: value → Color32
// ---------------------------------------------------------------------------

/// Fixed colours for well-known categories.
const FIXED: &[(&str, Color32)] = &[
    ("female", Color32::from_rgb(0xe3, 0x77, 0xc2)),
    ("male", Color32::from_rgb(0x1f, 0x77, 0xb4)),
];

/// Maps the distinct values of a column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from a column's distinct values. Values listed in
    /// the fixed table keep their colour; the rest share evenly spaced hues.
    pub fn new<'v>(values: impl IntoIterator<Item = &'v Value>) -> Self {
        let values: Vec<&Value> = values.into_iter().filter(|v| !v.is_null()).collect();
        let fixed = |v: &Value| match v {
            Value::String(s) => FIXED.iter().find(|(k, _)| *k == s.as_str()).map(|(_, c)| *c),
            _ => None,
        };
        let free: Vec<&Value> = values.iter().copied().filter(|v| fixed(*v).is_none()).collect();
        let mut palette = generate_palette(free.len()).into_iter();

        let mut mapping = BTreeMap::new();
        for v in values {
            let color = match fixed(v) {
                Some(c) => c,
                None => palette.next().unwrap_or(Color32::GRAY),
            };
            mapping.insert(v.clone(), color);
        }

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Diverging colour map for the correlation heatmap
// ---------------------------------------------------------------------------

/// Blue–white–red ramp for values in `[-1, 1]`, interpolated in linear RGB.
pub fn coolwarm(t: f64) -> Color32 {
    let cold: LinSrgb = Srgb::new(0.230, 0.299, 0.754).into_linear();
    let mid: LinSrgb = Srgb::new(0.865, 0.865, 0.865).into_linear();
    let warm: LinSrgb = Srgb::new(0.706, 0.016, 0.150).into_linear();

    let t = t.clamp(-1.0, 1.0) as f32;
    let lin = if t < 0.0 {
        mid.mix(cold, -t)
    } else {
        mid.mix(warm, t)
    };
    to_color32(Srgb::from_linear(lin))
}

/// Black or white, whichever reads better on `background`.
pub fn text_on(background: Color32) -> Color32 {
    let [r, g, b, _] = background.to_array();
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        for (i, a) in p.iter().enumerate() {
            assert!(p[i + 1..].iter().all(|b| a != b));
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn gender_colours_are_fixed() {
        let values = [Value::from("female"), Value::from("male"), Value::from("other")];
        let map = ColorMap::new(&values);
        assert_eq!(map.color_for(&Value::from("female")), Color32::from_rgb(0xe3, 0x77, 0xc2));
        assert_eq!(map.color_for(&Value::from("male")), Color32::from_rgb(0x1f, 0x77, 0xb4));
        assert_eq!(map.color_for(&Value::from("unseen")), Color32::GRAY);
    }

    #[test]
    fn coolwarm_ends_are_blue_and_red() {
        let [r, _, b, _] = coolwarm(-1.0).to_array();
        assert!(b > r);
        let [r, _, b, _] = coolwarm(1.0).to_array();
        assert!(r > b);
        assert_eq!(text_on(coolwarm(0.0)), Color32::BLACK);
    }
}
