use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::parser::patterns::canonicalize_gaps;
use crate::parser::DraftRecord;

pub const DB_PATH: &str = "data/kwt.sqlite";

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sets (
            id         INTEGER PRIMARY KEY,
            slug       TEXT UNIQUE NOT NULL,
            title      TEXT NOT NULL,
            source     TEXT,
            status     TEXT NOT NULL DEFAULT 'draft' CHECK(status IN ('draft','final')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS questions (
            id                 INTEGER PRIMARY KEY,
            set_id             INTEGER NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
            position           INTEGER NOT NULL,
            sentence1          TEXT NOT NULL,
            sentence2_with_gap TEXT NOT NULL,
            keyword            TEXT NOT NULL,
            correct_answer     TEXT,
            max_words          INTEGER NOT NULL DEFAULT 5 CHECK(max_words BETWEEN 3 AND 5),
            UNIQUE(set_id, position)
        );
        CREATE INDEX IF NOT EXISTS idx_questions_set ON questions(set_id);
        ",
    )?;
    Ok(())
}

// ── Drafts ──

/// Store parsed drafts as a new set, positions 1..n in draft order.
/// Returns the new set's slug.
pub fn save_draft_set(
    conn: &Connection,
    title: &str,
    source: Option<&str>,
    drafts: &[DraftRecord],
) -> Result<String> {
    let tx = conn.unchecked_transaction()?;
    let slug = unique_slug(&tx, &make_slug(title))?;
    {
        tx.execute(
            "INSERT INTO sets (slug, title, source) VALUES (?1, ?2, ?3)",
            params![slug, title.trim(), source],
        )?;
        let set_id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            "INSERT INTO questions
             (set_id, position, sentence1, sentence2_with_gap, keyword, correct_answer, max_words)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (i, d) in drafts.iter().enumerate() {
            stmt.execute(params![
                set_id,
                i + 1,
                d.stem.trim(),
                d.gapped.trim(),
                d.keyword.trim().to_uppercase(),
                d.answer.as_deref().map(str::trim),
                d.max_words,
            ])?;
        }
    }
    tx.commit()?;
    Ok(slug)
}

/// Same-titled imports within one millisecond get a numeric suffix.
fn unique_slug(conn: &Connection, base: &str) -> Result<String> {
    let mut slug = base.to_string();
    let mut n = 1;
    loop {
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sets WHERE slug = ?1)",
            params![slug],
            |r| r.get(0),
        )?;
        if !taken {
            return Ok(slug);
        }
        n += 1;
        slug = format!("{}-{}", base, n);
    }
}

fn make_slug(title: &str) -> String {
    let mut base = String::new();
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c.to_ascii_lowercase());
        } else if !base.ends_with('-') && !base.is_empty() {
            base.push('-');
        }
    }
    let base = base.trim_end_matches('-');
    let base = if base.is_empty() { "set" } else { base };
    format!("{}-{}", base, chrono::Utc::now().format("%Y%m%d%H%M%S%3f"))
}

// ── Review ──

pub struct SetRow {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub source: Option<String>,
    pub status: String,
    pub created_at: String,
    pub question_count: usize,
}

const SET_COLUMNS: &str = "s.id, s.slug, s.title, s.source, s.status, s.created_at,
     (SELECT COUNT(*) FROM questions q WHERE q.set_id = s.id)";

fn set_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SetRow> {
    Ok(SetRow {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        source: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        question_count: row.get(6)?,
    })
}

pub fn fetch_sets(conn: &Connection, status: Option<&str>) -> Result<Vec<SetRow>> {
    let sql = format!(
        "SELECT {} FROM sets s WHERE ?1 IS NULL OR s.status = ?1 ORDER BY s.id",
        SET_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![status], set_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_set(conn: &Connection, slug: &str) -> Result<Option<SetRow>> {
    let sql = format!("SELECT {} FROM sets s WHERE s.slug = ?1", SET_COLUMNS);
    let row = conn.query_row(&sql, params![slug], set_from_row).optional()?;
    Ok(row)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRow {
    pub id: i64,
    pub position: u32,
    pub stem: String,
    pub gapped: String,
    pub keyword: String,
    pub answer: Option<String>,
    pub max_words: u8,
}

pub fn fetch_questions(conn: &Connection, set_id: i64) -> Result<Vec<QuestionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, position, sentence1, sentence2_with_gap, keyword, correct_answer, max_words
         FROM questions WHERE set_id = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map(params![set_id], |row| {
            Ok(QuestionRow {
                id: row.get(0)?,
                position: row.get(1)?,
                stem: row.get(2)?,
                gapped: row.get(3)?,
                keyword: row.get(4)?,
                answer: row.get(5)?,
                max_words: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Reviewer edits to one question. `None` leaves the field unchanged.
#[derive(Debug, Default)]
pub struct QuestionPatch {
    pub stem: Option<String>,
    pub gapped: Option<String>,
    pub keyword: Option<String>,
    pub answer: Option<String>,
    pub max_words: Option<u8>,
}

impl QuestionPatch {
    pub fn is_empty(&self) -> bool {
        self.stem.is_none()
            && self.gapped.is_none()
            && self.keyword.is_none()
            && self.answer.is_none()
            && self.max_words.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Updated,
    NotFound,
    /// The question belongs to a finalised set and was left untouched.
    SetFinal,
}

/// Apply a reviewer patch. Questions of finalised sets are read-only.
pub fn update_question(conn: &Connection, id: i64, patch: &QuestionPatch) -> Result<PatchOutcome> {
    let status: Option<String> = conn
        .query_row(
            "SELECT s.status FROM questions q JOIN sets s ON s.id = q.set_id WHERE q.id = ?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    match status.as_deref() {
        None => return Ok(PatchOutcome::NotFound),
        Some("final") => return Ok(PatchOutcome::SetFinal),
        Some(_) => {}
    }

    conn.execute(
        "UPDATE questions SET
             sentence1          = COALESCE(?2, sentence1),
             sentence2_with_gap = COALESCE(?3, sentence2_with_gap),
             keyword            = COALESCE(?4, keyword),
             correct_answer     = COALESCE(?5, correct_answer),
             max_words          = COALESCE(?6, max_words)
         WHERE id = ?1",
        params![
            id,
            patch.stem.as_deref().map(str::trim),
            patch.gapped.as_deref().map(canonicalize_gaps),
            patch.keyword.as_deref().map(|k| k.trim().to_uppercase()),
            patch.answer.as_deref().map(str::trim),
            patch.max_words,
        ],
    )?;
    Ok(PatchOutcome::Updated)
}

pub fn mark_final(conn: &Connection, set_id: i64) -> Result<()> {
    conn.execute("UPDATE sets SET status = 'final' WHERE id = ?1", params![set_id])?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub sets: usize,
    pub drafts: usize,
    pub finalized: usize,
    pub questions: usize,
    pub missing_keyword: usize,
    pub missing_gap: usize,
    pub missing_answer: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    Ok(Stats {
        sets: count("SELECT COUNT(*) FROM sets")?,
        drafts: count("SELECT COUNT(*) FROM sets WHERE status = 'draft'")?,
        finalized: count("SELECT COUNT(*) FROM sets WHERE status = 'final'")?,
        questions: count("SELECT COUNT(*) FROM questions")?,
        missing_keyword: count("SELECT COUNT(*) FROM questions WHERE keyword = ''")?,
        missing_gap: count("SELECT COUNT(*) FROM questions WHERE instr(sentence2_with_gap, '______') = 0")?,
        missing_answer: count(
            "SELECT COUNT(*) FROM questions WHERE correct_answer IS NULL OR TRIM(correct_answer) = ''",
        )?,
    })
}
