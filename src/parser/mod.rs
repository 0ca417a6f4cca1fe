pub mod blocks;
pub mod fields;
pub mod patterns;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One exercise recovered from OCR text, awaiting human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub stem: String,
    pub gapped: String,
    pub keyword: String,
    pub answer: Option<String>,
    pub max_words: u8,
}

/// Three-step pipeline: raw text → lines → line groups → draft records.
/// Groups without a stem sentence are dropped as noise.
pub fn parse_questions(raw: &str) -> Vec<DraftRecord> {
    let lines = blocks::normalize_lines(raw);
    let groups = blocks::split_into_groups(&lines);
    debug!("{} lines, {} numbered groups", lines.len(), groups.len());

    groups
        .iter()
        .filter_map(|group| {
            let record = fields::extract_fields(group);
            if record.stem.trim().is_empty() {
                debug!("Dropping item {}: no stem sentence", group.number);
                None
            } else {
                Some(record)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item() {
        let drafts = parse_questions(
            "3. He left without saying goodbye.\nFAREWELL\nHe left without even saying ___.\n",
        );
        assert_eq!(
            drafts,
            vec![DraftRecord {
                stem: "He left without saying goodbye.".into(),
                gapped: "He left without even saying ______.".into(),
                keyword: "FAREWELL".into(),
                answer: None,
                max_words: 5,
            }]
        );
    }

    #[test]
    fn bom_prefixed_text_keeps_first_item() {
        let drafts = parse_questions(
            "\u{feff}1. He left without saying goodbye.\nFAREWELL\nHe left without even saying ___.\n\
             2. Second item.\nX ___",
        );
        assert_eq!(drafts.len(), 2, "got: {:?}", drafts);
        assert_eq!(drafts[0].stem, "He left without saying goodbye.");
        assert_eq!(drafts[0].keyword, "FAREWELL");
        assert_eq!(drafts[0].gapped, "He left without even saying ______.");
        assert_eq!(drafts[1].stem, "Second item.");
    }

    #[test]
    fn unnumbered_text_yields_nothing() {
        assert!(parse_questions("A stray paragraph\nwith ___ a gap\nAND CAPS").is_empty());
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(parse_questions("").is_empty());
        assert!(parse_questions(" \n\t\r\n").is_empty());
    }

    #[test]
    fn gap_without_keyword() {
        let drafts = parse_questions("1. They cancelled the match.\nThe match ___ cancelled.");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].keyword, "");
        assert_eq!(drafts[0].gapped, "The match ______ cancelled.");
    }

    #[test]
    fn header_only_group_is_discarded() {
        let drafts = parse_questions("1. PART\n2. I started here in May.\nSINCE\nI have ___ May.");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].stem, "I started here in May.");
    }

    #[test]
    fn several_gap_notations() {
        let drafts = parse_questions(
            "1. It's a pity I can't swim.\nWISH\nI \u{2014}\u{2014}\u{2014} swim.\nI ...... swim.\nI ___ swim.",
        );
        assert_eq!(drafts[0].gapped, "I ______ swim.");
        assert_eq!(drafts[0].stem, "It's a pity I can't swim.");
    }

    #[test]
    fn output_follows_text_order() {
        let drafts = parse_questions("5. Five.\nF ___\n3. Three.\nT ___\n9. Nine.\nN ___");
        let stems: Vec<&str> = drafts.iter().map(|d| d.stem.as_str()).collect();
        assert_eq!(stems, vec!["Five.", "Three.", "Nine."]);
    }

    #[test]
    fn pathological_input_terminates() {
        let noise: String = "1. \u{0}\u{2014}\u{2013}....._\n".repeat(200)
            + &"ÄÖÜ ))) 999) 1000. \u{feff}\n".repeat(200);
        let drafts = parse_questions(&noise);
        assert!(drafts.len() <= 200);
    }

    #[test]
    fn worksheet_fixture() {
        let text = std::fs::read_to_string("tests/fixtures/worksheet.txt").unwrap();
        let drafts = parse_questions(&text);
        assert_eq!(drafts.len(), 4, "got: {:?}", drafts);

        assert_eq!(drafts[0].keyword, "FAREWELL");
        assert_eq!(drafts[0].stem, "He left without saying goodbye to anyone.");
        assert_eq!(drafts[0].gapped, "He left without even ______ to anyone.");

        assert_eq!(drafts[1].keyword, "SUCCEEDED");
        assert_eq!(
            drafts[1].stem,
            "Although it was difficult, she managed to finish the marathon."
        );

        assert_eq!(drafts[2].keyword, "");
        assert!(drafts[2].gapped.contains("______"));

        assert_eq!(drafts[3].keyword, "LONG");
        assert_eq!(drafts[3].gapped, "It's ______ I last saw a film.");
        assert!(drafts.iter().all(|d| d.answer.is_none() && d.max_words == 5));
    }
}
