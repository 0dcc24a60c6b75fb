//! Word cloud: text assembly, word frequencies and a spiral placement layout.
//!
//! Rendering is left to the UI; this module only decides which words appear,
//! how large, and where.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::data::filter::View;

/// Upper bound on the number of words placed.
pub const MAX_WORDS: usize = 200;

/// Share of the font size driven by relative frequency; the rest is driven by
/// rank.
const RELATIVE_SCALING: f32 = 0.5;

const MIN_FONT_SIZE: f32 = 8.0;

/// Common English words that carry no signal in a cloud.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had",
    "has", "have", "he", "her", "here", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "me", "more", "most", "my", "no", "nor", "not", "of", "on", "only", "or", "other",
    "our", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "with", "would", "you", "your",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WordCloudError {
    #[error("no text to build a word cloud from")]
    EmptyText,
}

/// Join the non-null values of `column` with spaces.
pub fn build_text(view: &View<'_>, column: &str) -> String {
    view.column(column)
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Count words in `text`, most frequent first (ties alphabetical), capped at
/// [`MAX_WORDS`].
///
/// Tokens are runs of alphanumerics, with inner apostrophes kept. Words are
/// grouped case-insensitively and shown in their most frequent casing.
/// Single-character tokens and stop words are dropped.
pub fn word_frequencies(text: &str) -> Result<Vec<(String, usize)>, WordCloudError> {
    if text.trim().is_empty() {
        return Err(WordCloudError::EmptyText);
    }

    // lowercase key → (total, casing → count)
    let mut groups: BTreeMap<String, (usize, BTreeMap<&str, usize>)> = BTreeMap::new();
    for token in tokens(text) {
        if token.chars().count() < 2 {
            continue;
        }
        let key = token.to_lowercase();
        if STOPWORDS.contains(&key.as_str()) {
            continue;
        }
        let entry = groups.entry(key).or_default();
        entry.0 += 1;
        *entry.1.entry(token).or_default() += 1;
    }

    if groups.is_empty() {
        return Err(WordCloudError::EmptyText);
    }

    let mut words: Vec<(String, usize)> = groups
        .into_values()
        .map(|(total, casings)| {
            let mut best: Option<(&str, usize)> = None;
            for (casing, n) in casings {
                if best.map_or(true, |(_, m)| n > m) {
                    best = Some((casing, n));
                }
            }
            (best.map(|(c, _)| c.to_string()).unwrap_or_default(), total)
        })
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(MAX_WORDS);
    Ok(words)
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '_'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '_'))
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Axis-aligned box in canvas coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    fn inside(&self, width: f32, height: f32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x + self.w <= width && self.y + self.h <= height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub count: usize,
    pub font_size: f32,
    pub rect: Rect,
}

/// Place words on a `width` × `height` canvas.
///
/// `measure(text, font_size)` returns the rendered `(width, height)` of a
/// word. Words are placed largest first along an Archimedean spiral from the
/// centre. Each word's size follows the previous one, scaled by the ratio of
/// their counts; a word that does not fit is retried smaller. Once a word
/// does not fit even at the minimum size, placement stops.
pub fn layout(
    words: &[(String, usize)],
    width: f32,
    height: f32,
    measure: impl Fn(&str, f32) -> (f32, f32),
) -> Vec<PlacedWord> {
    let max_font = (height * 0.4).max(MIN_FONT_SIZE);
    let mut placed: Vec<PlacedWord> = Vec::new();
    let mut last: Option<(usize, f32)> = None;

    for (text, count) in words {
        let mut font_size = match last {
            None => max_font,
            Some((last_count, last_size)) => {
                let ratio = *count as f32 / last_count.max(1) as f32;
                (RELATIVE_SCALING * ratio + (1.0 - RELATIVE_SCALING)) * last_size
            }
        };
        font_size = font_size.min(max_font);

        let mut spot = None;
        while font_size >= MIN_FONT_SIZE {
            let (w, h) = measure(text, font_size);
            if let Some(rect) = find_spot(w, h, width, height, &placed) {
                spot = Some(rect);
                break;
            }
            font_size *= 0.8;
        }

        let Some(rect) = spot else {
            log::trace!("word cloud: canvas full at '{text}'");
            break;
        };
        last = Some((*count, font_size));
        placed.push(PlacedWord {
            text: text.clone(),
            count: *count,
            font_size,
            rect,
        });
    }
    placed
}

/// Radial distance between successive spiral turns, in pixels.
const SPIRAL_SPACING: f32 = 10.0;
/// Approximate arc length between probes, in pixels.
const SPIRAL_STEP: f32 = 8.0;

fn find_spot(w: f32, h: f32, width: f32, height: f32, placed: &[PlacedWord]) -> Option<Rect> {
    if w > width || h > height {
        return None;
    }
    let (cx, cy) = (width / 2.0, height / 2.0);
    // Stretch the spiral to the canvas aspect ratio.
    let stretch = (width / height.max(1.0)).sqrt();
    let max_radius = (width.powi(2) + height.powi(2)).sqrt() / 2.0;
    let mut theta: f32 = 0.0;

    loop {
        let r = SPIRAL_SPACING / std::f32::consts::TAU * theta;
        if r > max_radius {
            return None;
        }
        let rect = Rect {
            x: cx + r * theta.cos() * stretch - w / 2.0,
            y: cy + r * theta.sin() / stretch - h / 2.0,
            w,
            h,
        };
        if rect.inside(width, height) && placed.iter().all(|p| !p.rect.intersects(&rect)) {
            return Some(rect);
        }
        theta += (SPIRAL_STEP / r.max(SPIRAL_STEP)).min(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dataset, Record, Value};
    use crate::data::schema::{ColumnDef, ColumnKind, Schema};

    fn approx_measure(text: &str, size: f32) -> (f32, f32) {
        (text.chars().count() as f32 * size * 0.6, size * 1.2)
    }

    #[test]
    fn empty_or_blank_text_is_reported() {
        assert_eq!(word_frequencies(""), Err(WordCloudError::EmptyText));
        assert_eq!(word_frequencies("  \n\t "), Err(WordCloudError::EmptyText));
        assert_eq!(word_frequencies("a the of"), Err(WordCloudError::EmptyText));
    }

    #[test]
    fn counts_case_insensitively_and_skips_stopwords() {
        let words = word_frequencies("Coding, coding and Coding; Writing the essays, writing").unwrap();
        assert_eq!(
            words,
            vec![
                ("Coding".to_string(), 3),
                ("Writing".to_string(), 2),
                ("essays".to_string(), 1),
            ]
        );
    }

    #[test]
    fn keeps_inner_apostrophes() {
        let words = word_frequencies("bachelor's degree, master's degree").unwrap();
        assert_eq!(words[0], ("degree".to_string(), 2));
        assert!(words.iter().any(|(w, _)| w == "bachelor's"));
    }

    #[test]
    fn build_text_skips_nulls() {
        let ds = Dataset::new(
            Schema::new(vec![ColumnDef::required("Use_Cases", ColumnKind::Text)]),
            vec![
                Record::new(vec![Value::from("Coding, Exam Prep")]),
                Record::new(vec![Value::Null]),
                Record::new(vec![Value::from("Writing")]),
            ],
        );
        let view = crate::data::filter::View::all(&ds);
        assert_eq!(build_text(&view, "Use_Cases"), "Coding, Exam Prep Writing");
    }

    #[test]
    fn layout_places_without_overlap_inside_canvas() {
        let words: Vec<(String, usize)> = (0..60)
            .map(|i| (format!("word{i}"), 60 - i))
            .collect();
        let placed = layout(&words, 800.0, 400.0, approx_measure);
        assert!(!placed.is_empty());
        assert_eq!(placed[0].text, "word0");
        for (i, a) in placed.iter().enumerate() {
            assert!(a.rect.inside(800.0, 400.0), "{} out of bounds", a.text);
            assert!(a.font_size >= MIN_FONT_SIZE);
            for b in &placed[i + 1..] {
                assert!(!a.rect.intersects(&b.rect), "{} overlaps {}", a.text, b.text);
            }
        }
    }

    #[test]
    fn layout_sizes_follow_frequency_and_are_deterministic() {
        let words = vec![("Coding".to_string(), 10), ("Writing".to_string(), 2)];
        let first = layout(&words, 800.0, 400.0, approx_measure);
        let second = layout(&words, 800.0, 400.0, approx_measure);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first[0].font_size > first[1].font_size);
    }
}
