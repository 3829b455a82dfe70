use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tweet_topics::corpus::{merge_documents, read_documents};
use tweet_topics::export::write_atomic;

/// Samples a share of a one-document-per-line corpus and writes it in both
/// the per-line and the merged single-line shapes.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    input: PathBuf,
    output: PathBuf,
    #[clap(help = "Percentage of documents to keep, in (0, 100]")]
    sample_percentage: f32,
    #[clap(long, help = "Merged output path; defaults to <output>_merged.txt")]
    merged: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if !(args.sample_percentage > 0.0 && args.sample_percentage <= 100.0) {
        bail!("sample percentage must be between 0 and 100, got {}", args.sample_percentage);
    }

    let documents = read_documents(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let total = documents.len();
    let sample_size = ((total as f32) * (args.sample_percentage / 100.0)) as usize;
    let step = (if sample_size > 0 { total / sample_size } else { 1 }).max(1);
    info!(total, sample_size, step, "sampling documents");

    let sampled: Vec<&str> = documents
        .iter()
        .step_by(step)
        .map(String::as_str)
        .filter(|doc| !doc.trim().is_empty())
        .collect();

    let mut lines = sampled.join("\n");
    lines.push('\n');
    write_atomic(&args.output, &lines)?;

    let merged_path = args.merged.unwrap_or_else(|| {
        let stem = args
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());
        args.output.with_file_name(format!("{stem}_merged.txt"))
    });
    write_atomic(&merged_path, &merge_documents(&sampled))?;

    info!(
        sampled = sampled.len(),
        output = %args.output.display(),
        merged = %merged_path.display(),
        "wrote sample"
    );
    Ok(())
}
