use std::sync::LazyLock;

use regex::Regex;

/// Numbered exercise start: "32. text" or "32) text". Group 1 is the number,
/// group 2 the rest of the line.
pub const ITEM_START_PATTERN: &str = r"^\s*([0-9]{1,3})[.)]\s+(.*)$";

/// A standalone keyword line: one word, 2-20 uppercase ASCII letters.
pub const KEYWORD_PATTERN: &str = r"^[A-Z]{2,20}$";

/// Any OCR rendering of a blank: 3+ underscores, 2+ em/en dashes, 5+ dots.
pub const GAP_PATTERN: &str = "_{3,}|[\u{2014}\u{2013}]{2,}|\\.{5,}";

/// Gap token written into every gapped sentence.
pub const CANONICAL_GAP: &str = "______";

pub const DEFAULT_MAX_WORDS: u8 = 5;

static ITEM_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(ITEM_START_PATTERN).unwrap());
static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(KEYWORD_PATTERN).unwrap());
static GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(GAP_PATTERN).unwrap());

/// If `line` opens a numbered item, return the item number and the text after
/// the marker.
pub fn item_start(line: &str) -> Option<(u16, &str)> {
    let caps = ITEM_START_RE.captures(line)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    Some((number, caps.get(2).map_or("", |m| m.as_str())))
}

pub fn is_keyword(line: &str) -> bool {
    KEYWORD_RE.is_match(line.trim())
}

pub fn contains_gap(line: &str) -> bool {
    GAP_RE.is_match(line)
}

/// Rewrite every gap run in `line` to [`CANONICAL_GAP`] and trim the result.
pub fn canonicalize_gaps(line: &str) -> String {
    GAP_RE.replace_all(line, CANONICAL_GAP).trim().to_string()
}
