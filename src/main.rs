use std::io::Read;
use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slop_scan::runner::{self, BatchJob};
use slop_scan::{Analyzer, ChatMessage, QualityPolicy};

#[derive(Parser)]
#[command(
    name = "slop-scan",
    about = "Find over-used phrasing across AI chat histories",
    version
)]
struct Cli {
    /// Chat history JSON files, each an array of {author, text} messages
    /// (reads stdin if none provided)
    files: Vec<String>,

    /// Settings JSON (ngramMax, slopThreshold, pruningCycle, ...)
    #[arg(short, long)]
    config: Option<String>,

    /// File of active fix-rule regexes, one per line
    #[arg(long)]
    covered: Option<String>,

    /// Keep single low-score records during replay instead of compacting
    /// them, so the result matches live ingestion exactly
    #[arg(long)]
    no_compact: bool,

    /// Include every raw index entry in the output
    #[arg(long)]
    entries: bool,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}

fn read_history(raw: &str, source: &str) -> Vec<ChatMessage> {
    serde_json::from_str(raw).unwrap_or_else(|e| fail(format!("{source}: {e}")))
}

async fn scan(
    messages: Vec<ChatMessage>,
    policy: &QualityPolicy,
    covered: &[String],
    cli: &Cli,
) -> serde_json::Value {
    let job = BatchJob {
        messages,
        config: policy.clone(),
        covered_patterns: covered.to_vec(),
        compact: !cli.no_compact,
    };
    let result = runner::spawn_batch(job)
        .finish(|p| info!("processed {}/{} messages", p.processed, p.total))
        .await
        .unwrap_or_else(|e| fail(e));

    let mut analyzer = Analyzer::new(policy.clone(), covered.to_vec());
    let analyzed = result.messages_analyzed;
    analyzer.commit(result);

    let leaderboard = analyzer.leaderboard();
    if leaderboard.snapshot.is_empty() {
        info!("no repeated phrasing found");
    }
    let mut out = serde_json::json!({
        "messagesAnalyzed": analyzed,
        "merged": leaderboard.snapshot.merged,
        "remaining": leaderboard.snapshot.remaining,
    });
    if cli.entries {
        out["entries"] = serde_json::json!(leaderboard.entries);
    }
    out
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let policy = match &cli.config {
        Some(path) => QualityPolicy::from_path(path).unwrap_or_else(|e| fail(e)),
        None => QualityPolicy::default(),
    };
    let covered: Vec<String> = match &cli.covered {
        Some(path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("{path}: {e}")))
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    if cli.files.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .unwrap_or_else(|e| fail(format!("stdin: {e}")));
        let out = scan(read_history(&input, "stdin"), &policy, &covered, &cli).await;
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_else(|e| fail(e)));
    } else {
        for path in &cli.files {
            let text = std::fs::read_to_string(path).unwrap_or_else(|e| fail(format!("{path}: {e}")));
            let out = scan(read_history(&text, path), &policy, &covered, &cli).await;
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_else(|e| fail(e)));
        }
    }
}
