use super::blocks::LineGroup;
use super::patterns::{canonicalize_gaps, contains_gap, is_keyword, DEFAULT_MAX_WORDS};
use super::DraftRecord;

/// What a single line contributes to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role<'a> {
    Keyword(&'a str),
    Gapped(String),
    Stem(&'a str),
    /// Anything after the gapped sentence (page numbers, footers).
    Ignored,
}

/// Accumulator carried across the lines of one group.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldState<'a> {
    pub keyword: Option<&'a str>,
    pub gapped: Option<String>,
    pub stem_parts: Vec<&'a str>,
}

impl<'a> FieldState<'a> {
    /// Role of `line` given what has been found so far.
    /// Priority is keyword, then gap, then stem; first match wins.
    pub fn classify(&self, line: &'a str) -> Role<'a> {
        if self.keyword.is_none() && is_keyword(line) {
            return Role::Keyword(line.trim());
        }
        if self.gapped.is_none() && contains_gap(line) {
            return Role::Gapped(canonicalize_gaps(line));
        }
        if self.gapped.is_none() {
            Role::Stem(line)
        } else {
            Role::Ignored
        }
    }

    pub fn apply(mut self, role: Role<'a>) -> Self {
        match role {
            Role::Keyword(k) => self.keyword = Some(k),
            Role::Gapped(g) => self.gapped = Some(g),
            Role::Stem(s) => self.stem_parts.push(s),
            Role::Ignored => {}
        }
        self
    }

    pub fn into_record(self) -> DraftRecord {
        DraftRecord {
            stem: self.stem_parts.join(" ").trim().to_string(),
            gapped: self.gapped.unwrap_or_default(),
            keyword: self.keyword.unwrap_or_default().to_string(),
            answer: None,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// Turn one line group into a draft record. Never fails; fields that could
/// not be found are left empty.
pub fn extract_fields(group: &LineGroup<'_>) -> DraftRecord {
    group
        .lines
        .iter()
        .fold(FieldState::default(), |state, &line| {
            let role = state.classify(line);
            state.apply(role)
        })
        .into_record()
}
