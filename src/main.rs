mod db;
mod extract;
mod import;
mod parser;
mod review;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kwt_import", about = "Key word transformation worksheet importer")]
struct Cli {
    /// SQLite database holding imported sets
    #[arg(long, env = "KWT_DB", default_value = db::DB_PATH, global = true)]
    db: String,

    /// HTTP OCR endpoint used for image files
    #[arg(long, env = "KWT_OCR_URL", global = true)]
    ocr_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and parse one file, print the drafts without saving
    Parse {
        file: PathBuf,
        /// Media type, e.g. "application/pdf" (default: guessed from extension)
        #[arg(short, long)]
        media_type: Option<String>,
        /// Print drafts as JSON
        #[arg(long)]
        json: bool,
        /// Also print the extracted text
        #[arg(long)]
        raw: bool,
    },
    /// Extract, parse and save files as draft sets
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Set title (default: file name)
        #[arg(short, long)]
        title: Option<String>,
        /// Files extracted at the same time
        #[arg(short = 'j', long, default_value = "4")]
        concurrency: usize,
    },
    /// List imported sets
    Sets {
        /// Filter by status (draft, final)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show the questions of a set with their open issues
    Show { slug: String },
    /// Fill in or correct fields of one question
    Edit {
        id: i64,
        #[arg(long)]
        stem: Option<String>,
        #[arg(long)]
        gapped: Option<String>,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        answer: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(3..=5))]
        max_words: Option<u8>,
    },
    /// Mark a set final once every question is complete
    Finalize { slug: String },
    /// Show import statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let extractor = extract::Extractor::new(cli.ocr_url.clone());

    let result = match cli.command {
        Commands::Parse {
            file,
            media_type,
            json,
            raw,
        } => {
            let text = import::extract_file(&extractor, &file, media_type.as_deref()).await?;
            let drafts = parser::parse_questions(&text);
            if raw {
                println!("{}\n{}", text, "-".repeat(60));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&drafts)?);
            } else if drafts.is_empty() {
                println!("No numbered questions found.");
            } else {
                for (i, d) in drafts.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, d.stem);
                    println!("     [{}]", or_dash(&d.keyword));
                    println!("     {}", or_dash(&d.gapped));
                }
                println!("\n{} drafts", drafts.len());
            }
            Ok(())
        }
        Commands::Import {
            files,
            title,
            concurrency,
        } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            println!("Importing {} files...", files.len());
            let extracted = import::extract_files(&extractor, files, concurrency).await;
            let stats = import::save_extracted(&conn, extracted, title.as_deref())?;
            println!(
                "Done: {} files ({} saved, {} without questions, {} errors), {} questions.",
                stats.total, stats.saved, stats.skipped, stats.errors, stats.questions
            );
            Ok(())
        }
        Commands::Sets { status } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let sets = db::fetch_sets(&conn, status.as_deref())?;
            if sets.is_empty() {
                println!("No sets found. Run 'import' first.");
                return Ok(());
            }
            println!(
                "{:<40} | {:<28} | {:<6} | {:>3} | {:<19}",
                "Slug", "Title", "Status", "Qs", "Created"
            );
            println!("{}", "-".repeat(108));
            for s in &sets {
                println!(
                    "{:<40} | {:<28} | {:<6} | {:>3} | {:<19}",
                    truncate(&s.slug, 40),
                    truncate(&s.title, 28),
                    s.status,
                    s.question_count,
                    s.created_at
                );
            }
            Ok(())
        }
        Commands::Show { slug } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let Some(set) = db::fetch_set(&conn, &slug)? else {
                anyhow::bail!("No set with slug '{}'", slug);
            };
            let questions = db::fetch_questions(&conn, set.id)?;
            println!("{} [{}]", set.title, set.status);
            if let Some(source) = &set.source {
                println!("source: {}", source);
            }
            println!();
            for q in &questions {
                println!("#{} (id {}, max {} words)", q.position, q.id, q.max_words);
                println!("  1: {}", or_dash(&q.stem));
                println!("  K: {}", or_dash(&q.keyword));
                println!("  2: {}", or_dash(&q.gapped));
                println!("  A: {}", q.answer.as_deref().map_or("-", or_dash));
                for issue in review::check_question(q) {
                    println!("  ! {}", issue);
                }
            }
            Ok(())
        }
        Commands::Edit {
            id,
            stem,
            gapped,
            keyword,
            answer,
            max_words,
        } => {
            let patch = db::QuestionPatch {
                stem,
                gapped,
                keyword,
                answer,
                max_words,
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to change; pass at least one field");
            }
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            match db::update_question(&conn, id, &patch)? {
                db::PatchOutcome::Updated => {
                    println!("Updated question {}.", id);
                    Ok(())
                }
                db::PatchOutcome::NotFound => Err(anyhow::anyhow!("No question with id {}", id)),
                db::PatchOutcome::SetFinal => Err(anyhow::anyhow!(
                    "Question {} belongs to a final set and cannot be edited",
                    id
                )),
            }
        }
        Commands::Finalize { slug } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let Some(set) = db::fetch_set(&conn, &slug)? else {
                anyhow::bail!("No set with slug '{}'", slug);
            };
            let questions = db::fetch_questions(&conn, set.id)?;
            let issues = review::check_set(&questions);
            if issues.is_empty() {
                db::mark_final(&conn, set.id)?;
                println!("Set '{}' is final ({} questions).", set.title, questions.len());
                Ok(())
            } else {
                for issue in &issues {
                    println!("  {}", issue);
                }
                Err(anyhow::anyhow!("{} issues left in '{}'", issues.len(), slug))
            }
        }
        Commands::Stats => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Sets:            {}", s.sets);
            println!("  draft:         {}", s.drafts);
            println!("  final:         {}", s.finalized);
            println!("Questions:       {}", s.questions);
            println!("  no keyword:    {}", s.missing_keyword);
            println!("  no gap:        {}", s.missing_gap);
            println!("  no answer:     {}", s.missing_answer);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}
