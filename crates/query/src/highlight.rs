// Search-term highlighting for display text.
// Rendering-agnostic: callers decide how a matched segment is drawn.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "camelCase")]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

/// Split `text` into plain and matched segments for `term`.
///
/// Matching is case-insensitive, left to right, non-overlapping. Segment
/// boundaries always fall on character boundaries of the original text.
pub fn highlight<'a>(text: &'a str, term: &str) -> Vec<Segment<'a>> {
    let term = term.trim().to_lowercase();
    if text.is_empty() {
        return Vec::new();
    }
    if term.is_empty() {
        return vec![Segment::Plain(text)];
    }

    let folded: Vec<(usize, String)> = text
        .char_indices()
        .map(|(offset, c)| (offset, c.to_lowercase().collect()))
        .collect();
    let offset_at = |index: usize| folded.get(index).map_or(text.len(), |(o, _)| *o);

    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    while i < folded.len() {
        match match_end(&folded, i, &term) {
            Some(end) => {
                let (start_offset, end_offset) = (offset_at(i), offset_at(end));
                if plain_start < start_offset {
                    segments.push(Segment::Plain(&text[plain_start..start_offset]));
                }
                segments.push(Segment::Match(&text[start_offset..end_offset]));
                plain_start = end_offset;
                i = end;
            }
            None => i += 1,
        }
    }
    if plain_start < text.len() {
        segments.push(Segment::Plain(&text[plain_start..]));
    }
    segments
}

/// Index one past the last char of a match starting at `start`, if any.
fn match_end(folded: &[(usize, String)], start: usize, term: &str) -> Option<usize> {
    let mut buffer = String::new();
    for (index, (_, lower)) in folded.iter().enumerate().skip(start) {
        buffer.push_str(lower);
        if buffer == term {
            return Some(index + 1);
        }
        if !term.starts_with(buffer.as_str()) {
            return None;
        }
    }
    None
}
