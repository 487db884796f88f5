//! Caption line layout.
//!
//! Pure and re-entrant; called on every keystroke. The wrapped line count
//! decides the caption band height, so this sits on the hot path of every
//! caption edit.

/// Greedily wrap `text` into lines that fit `available_width`.
///
/// Line capacity is approximated as `floor(available_width / measure("a"))`
/// characters rather than measuring the growing candidate itself. For
/// proportional fonts this under- or over-estimates capacity; the trade is
/// intentional (it keeps the per-keystroke cost at one `measure` call) and is
/// preserved for output compatibility.
///
/// A line breaks at the last space inside the over-limit candidate. When a
/// word has no space to break at, the line breaks at the character boundary
/// and the break character itself is dropped, exactly like the space would
/// have been.
///
/// Empty input yields zero lines. A non-positive `measure("a")` disables
/// wrapping and yields the text as a single line.
pub fn wrap<F>(text: &str, measure: F, available_width: f32) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let glyph_width = measure("a");
    if glyph_width <= 0.0 {
        return vec![text.to_string()];
    }
    let limit = (available_width / glyph_width).floor().max(0.0) as usize;

    let mut lines = Vec::new();
    let mut rest: &[char] = &chars;
    let mut i = 0usize;
    while i < rest.len() {
        i += 1;
        if i > limit {
            let candidate = &rest[..i];
            let k = candidate
                .iter()
                .rposition(|&c| c == ' ')
                .unwrap_or(candidate.len());
            lines.push(rest[..k].iter().collect());
            rest = &rest[(k + 1).min(rest.len())..];
            i = 0;
        } else if i == rest.len() {
            // Shorter-than-limit residue becomes the last line.
            lines.push(rest.iter().collect());
            break;
        }
    }
    lines
}
