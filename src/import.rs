use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db;
use crate::extract::{ExtractError, Extractor, MediaType, MAX_UPLOAD_BYTES};
use crate::parser::{self, DraftRecord};

/// Text pulled out of one input file, or why it could not be.
pub struct ExtractedFile {
    pub path: PathBuf,
    pub text: Result<String, String>,
    pub latency_ms: u128,
}

pub struct ImportStats {
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
    pub errors: usize,
    pub questions: usize,
}

/// Read a file and extract its text. `media` overrides the extension guess.
pub async fn extract_file(
    extractor: &Extractor,
    path: &Path,
    media: Option<&str>,
) -> Result<String> {
    let media = match media {
        Some(m) => MediaType::from_mime(m)?,
        None => MediaType::from_path(path)?,
    };
    let size = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    if size > MAX_UPLOAD_BYTES as u64 {
        return Err(ExtractError::TooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit: MAX_UPLOAD_BYTES,
        }
        .into());
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let text = extractor.extract(bytes, &media).await?;
    if text.trim().is_empty() {
        anyhow::bail!("No text could be extracted from {}", path.display());
    }
    Ok(text)
}

/// Extract all files concurrently, at most `concurrency` at a time.
/// Results come back in input order.
pub async fn extract_files(
    extractor: &Extractor,
    paths: Vec<PathBuf>,
    concurrency: usize,
) -> Vec<ExtractedFile> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let total = paths.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} extracting")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, ExtractedFile)>(concurrency.max(1) * 2);

    for (idx, path) in paths.into_iter().enumerate() {
        let extractor = extractor.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let start = Instant::now();
            let text = extract_file(&extractor, &path, None)
                .await
                .map_err(|e| format!("{:#}", e));
            if let Err(e) = &text {
                warn!("Extraction failed for {}: {}", path.display(), e);
            }
            let _ = tx
                .send((
                    idx,
                    ExtractedFile {
                        path,
                        text,
                        latency_ms: start.elapsed().as_millis(),
                    },
                ))
                .await;
        });
    }

    // Drop our sender so rx closes once every task is done.
    drop(tx);

    let mut results = Vec::with_capacity(total);
    while let Some(item) = rx.recv().await {
        results.push(item);
        pb.inc(1);
    }
    pb.finish_and_clear();

    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, file)| file).collect()
}

/// Parse extracted files in parallel and save each one as a draft set.
pub fn save_extracted(
    conn: &Connection,
    files: Vec<ExtractedFile>,
    title: Option<&str>,
) -> Result<ImportStats> {
    let total = files.len();
    let parsed: Vec<(ExtractedFile, Vec<DraftRecord>)> = files
        .into_par_iter()
        .map(|file| {
            let drafts = match &file.text {
                Ok(text) => parser::parse_questions(text),
                Err(_) => Vec::new(),
            };
            (file, drafts)
        })
        .collect();

    let mut stats = ImportStats {
        total,
        saved: 0,
        skipped: 0,
        errors: 0,
        questions: 0,
    };

    for (file, drafts) in parsed {
        if file.text.is_err() {
            stats.errors += 1;
            continue;
        }
        if drafts.is_empty() {
            warn!("No numbered items found in {}", file.path.display());
            stats.skipped += 1;
            continue;
        }

        let set_title = set_title(title, &file.path, total);
        let source = file.path.display().to_string();
        let slug = db::save_draft_set(conn, &set_title, Some(&source), &drafts)?;
        info!(
            "Saved {} drafts from {} as {} ({} ms extraction)",
            drafts.len(),
            source,
            slug,
            file.latency_ms
        );
        println!("{} -> {} ({} questions)", source, slug, drafts.len());
        stats.saved += 1;
        stats.questions += drafts.len();
    }

    Ok(stats)
}

fn set_title(title: Option<&str>, path: &Path, file_count: usize) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "worksheet".to_string());
    match title {
        Some(t) if file_count == 1 => t.to_string(),
        Some(t) => format!("{} - {}", t, stem),
        None => stem,
    }
}
