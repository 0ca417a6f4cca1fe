use crate::db::QuestionRow;
use crate::parser::patterns::CANONICAL_GAP;

const ALLOWED_MAX_WORDS: &[u8] = &[3, 4, 5];

/// Something a reviewer still has to fix before a set can be finalised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewIssue {
    #[error("set has no questions")]
    EmptySet,
    #[error("Q{0}: stem sentence required")]
    MissingStem(u32),
    #[error("Q{0}: gapped sentence must contain ______")]
    MissingGap(u32),
    #[error("Q{0}: keyword required")]
    MissingKeyword(u32),
    #[error("Q{0}: answer required")]
    MissingAnswer(u32),
    #[error("Q{0}: max words must be 3, 4 or 5 (got {1})")]
    BadMaxWords(u32, u8),
}

pub fn check_question(q: &QuestionRow) -> Vec<ReviewIssue> {
    let mut issues = Vec::new();
    let pos = q.position;

    if q.stem.trim().is_empty() {
        issues.push(ReviewIssue::MissingStem(pos));
    }
    if !q.gapped.contains(CANONICAL_GAP) {
        issues.push(ReviewIssue::MissingGap(pos));
    }
    if q.keyword.trim().is_empty() {
        issues.push(ReviewIssue::MissingKeyword(pos));
    }
    if q.answer.as_deref().map_or(true, |a| a.trim().is_empty()) {
        issues.push(ReviewIssue::MissingAnswer(pos));
    }
    if !ALLOWED_MAX_WORDS.contains(&q.max_words) {
        issues.push(ReviewIssue::BadMaxWords(pos, q.max_words));
    }
    issues
}

/// All open issues for a set, in question order. Empty means ready to finalise.
pub fn check_set(questions: &[QuestionRow]) -> Vec<ReviewIssue> {
    if questions.is_empty() {
        return vec![ReviewIssue::EmptySet];
    }
    questions.iter().flat_map(check_question).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(position: u32) -> QuestionRow {
        QuestionRow {
            id: position as i64,
            position,
            stem: "He left without saying goodbye.".into(),
            gapped: "He left without even saying ______.".into(),
            keyword: "FAREWELL".into(),
            answer: Some("bidding farewell".into()),
            max_words: 5,
        }
    }

    #[test]
    fn complete_question_passes() {
        assert!(check_question(&complete(1)).is_empty());
    }

    #[test]
    fn fresh_draft_needs_answer() {
        let mut q = complete(2);
        q.answer = None;
        assert_eq!(check_question(&q), vec![ReviewIssue::MissingAnswer(2)]);
        q.answer = Some("   ".into());
        assert_eq!(check_question(&q), vec![ReviewIssue::MissingAnswer(2)]);
    }

    #[test]
    fn every_rule_reports() {
        let q = QuestionRow {
            id: 9,
            position: 4,
            stem: " ".into(),
            gapped: "no gap here ___".into(),
            keyword: String::new(),
            answer: None,
            max_words: 6,
        };
        assert_eq!(
            check_question(&q),
            vec![
                ReviewIssue::MissingStem(4),
                ReviewIssue::MissingGap(4),
                ReviewIssue::MissingKeyword(4),
                ReviewIssue::MissingAnswer(4),
                ReviewIssue::BadMaxWords(4, 6),
            ]
        );
    }

    #[test]
    fn empty_set_cannot_be_finalised() {
        assert_eq!(check_set(&[]), vec![ReviewIssue::EmptySet]);
    }

    #[test]
    fn set_issues_in_order() {
        let mut second = complete(2);
        second.keyword.clear();
        let mut third = complete(3);
        third.max_words = 2;
        let issues = check_set(&[complete(1), second, third]);
        assert_eq!(
            issues,
            vec![ReviewIssue::MissingKeyword(2), ReviewIssue::BadMaxWords(3, 2)]
        );
        assert_eq!(issues[1].to_string(), "Q3: max words must be 3, 4 or 5 (got 2)");
    }
}
