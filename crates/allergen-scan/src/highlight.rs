//! Highlight markup for scan matches.
//!
//! Matches carry character offsets into the text that was scanned. Each
//! positioned match is wrapped in
//! `<highlight severity="high|medium|low">...</highlight>`, working from the
//! highest start offset toward the lowest so that earlier offsets stay valid
//! while later text grows.
//!
//! Overlapping spans are not merged. Every wrap is applied to the string as
//! already annotated, at the match's original offsets, so a span that starts
//! earlier may enclose or cut through markup added for a later one.

use allergen_core::{MatchSpan, Position, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

/// Element name used for highlight markup.
pub const HIGHLIGHT_TAG: &str = "highlight";

static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<highlight severity="[a-z]+">|</highlight>"#).expect("valid markup regex")
});

/// Render `source` with every positioned match wrapped in highlight markup.
///
/// Returns `source` unchanged when it is empty or there are no matches.
/// Matches without a position are ignored. Spans that do not satisfy
/// `start <= end <= chars(source)` are skipped with a warning.
#[must_use]
pub fn render(source: &str, matches: &[MatchSpan]) -> String {
    if source.is_empty() || matches.is_empty() {
        return source.to_string();
    }

    let char_len = source.chars().count();
    let mut spans: Vec<(Position, Severity)> = matches
        .iter()
        .filter_map(|m| m.position.map(|position| (position, m.severity)))
        .filter(|(position, _)| {
            let valid = position.start <= position.end && position.end <= char_len;
            if !valid {
                tracing::warn!(
                    start = position.start,
                    end = position.end,
                    char_len,
                    "skipping match span outside the source text"
                );
            }
            valid
        })
        .collect();

    // Stable, so equal starts keep service order
    spans.sort_by(|a, b| b.0.start.cmp(&a.0.start));

    let mut annotated = source.to_string();
    for (position, severity) in spans {
        let start = byte_offset(&annotated, position.start);
        let end = byte_offset(&annotated, position.end);
        let wrapped = format!(
            "<{HIGHLIGHT_TAG} severity=\"{}\">{}</{HIGHLIGHT_TAG}>",
            severity.as_tag(),
            &annotated[start..end]
        );
        annotated.replace_range(start..end, &wrapped);
    }

    annotated
}

/// Remove highlight markup, leaving the text between the tags.
#[must_use]
pub fn strip_markup(annotated: &str) -> String {
    MARKUP_REGEX.replace_all(annotated, "").into_owned()
}

/// Byte offset of the `index`-th character, or the end of the string.
fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map_or(text.len(), |(offset, _)| offset)
}
