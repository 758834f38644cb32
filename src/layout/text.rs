use crate::config::LayoutConfig;
use crate::geometry::Size;
use crate::text_metrics;

// Horizontal padding around proposition text, per side, in em.
const CONTENT_PADDING_EM: f32 = 0.5;
const LINE_HEIGHT: f32 = 1.2;

/// Single-line content size of a proposition, including side padding.
pub fn measure_proposition(text: &str, config: &LayoutConfig) -> Size {
    let line = flatten_line(text);
    let width = text_width(&line, config.font_size, &config.font_family, config.fast_text_metrics);
    Size::new(
        width + 2.0 * CONTENT_PADDING_EM * config.font_size,
        config.font_size * LINE_HEIGHT,
    )
}

/// Label text is set at a reduced size next to the inference line.
pub fn measure_label(text: &str, config: &LayoutConfig) -> Size {
    let font_size = config.font_size * 0.6;
    let line = flatten_line(text);
    let width = text_width(&line, font_size, &config.font_family, config.fast_text_metrics);
    Size::new(width, font_size * LINE_HEIGHT)
}

// Propositions never wrap; collapse any line breaks into spaces.
fn flatten_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(super) fn text_width(text: &str, font_size: f32, font_family: &str, fast_metrics: bool) -> f32 {
    if fast_metrics {
        return fallback_text_width(text, font_size);
    }
    text_metrics::measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| fallback_text_width(text, font_size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

// Rough em-relative advances for a proportional sans-serif face.
fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.31,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '|' | '!' | '\'' => 0.26,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '{' | '}' => 0.35,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.88,
        'A'..='Z' => 0.66,
        // Logical connectives and turnstiles render roughly square.
        '∧' | '∨' | '→' | '↔' | '¬' | '⊢' | '⊥' | '∀' | '∃' | '⇒' => 0.8,
        _ => 0.56,
    }
}
