use super::patterns::item_start;

/// Lines belonging to one numbered exercise. The first line is the text that
/// followed the item marker, with the number already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineGroup<'a> {
    pub number: u16,
    pub lines: Vec<&'a str>,
}

/// Byte order marks count as whitespace; editors prepend them to .txt files.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Split raw text into trimmed, non-empty lines in reading order.
pub fn normalize_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(|l| l.trim_matches(is_blank))
        .filter(|l| !l.is_empty())
        .collect()
}

/// Group lines into per-item blocks, delimited by numbered item starts.
/// Lines before the first numbered item are preamble and are dropped.
pub fn split_into_groups<'a>(lines: &[&'a str]) -> Vec<LineGroup<'a>> {
    let mut groups = Vec::new();
    let mut current: Option<LineGroup<'a>> = None;

    for &line in lines {
        if let Some((number, rest)) = item_start(line) {
            if let Some(done) = current.take() {
                groups.push(done);
            }
            current = Some(LineGroup {
                number,
                lines: vec![rest],
            });
        } else if let Some(group) = current.as_mut() {
            group.lines.push(line);
        }
    }

    if let Some(done) = current {
        groups.push(done);
    }

    groups
}
