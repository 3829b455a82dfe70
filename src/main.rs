use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tweet_topics::analysis::{self, Analysis};
use tweet_topics::corpus::{read_documents, read_merged, merge_documents};
use tweet_topics::{ModelConfig, TrainedModel};

#[derive(Parser, Debug)]
#[command(version, about = "Topic modeling for a user's tweets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model on one document per line and write all reports
    Train {
        documents: PathBuf,
        #[clap(long, help = "Merged single-document file; defaults to the documents joined by spaces")]
        merged: Option<PathBuf>,
        #[clap(long, help = "Write the trained model as JSON to this path")]
        save_model: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        overrides: ConfigArgs,
    },
    /// Infer the composition of a file with a saved model
    Infer {
        #[clap(short, long)]
        model: PathBuf,
        documents: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        overrides: ConfigArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[clap(short, long, default_value = ".")]
    out: PathBuf,
    #[clap(short, long, help = "Report file prefix (e.g. the user name); defaults to the input file stem")]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[clap(short, long, help = "YAML model configuration")]
    config: Option<PathBuf>,
    #[clap(short, long)]
    topics: Option<usize>,
    #[clap(short, long)]
    iterations: Option<usize>,
    #[clap(long, help = "Sum of the document-topic prior over all topics")]
    alpha: Option<f64>,
    #[clap(long)]
    beta: Option<f64>,
    #[clap(short, long, help = "Top words per topic")]
    words: Option<usize>,
    #[clap(long, help = "Sweeps between hyperparameter updates, 0 disables")]
    optimize_interval: Option<usize>,
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long, help = "Sampler workers; 1 runs the deterministic sequential sampler")]
    threads: Option<usize>,
    #[clap(long, help = "Topics in the ranked report and hierarchy")]
    top_topics: Option<usize>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<ModelConfig> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::from_yaml_file(path)?,
            None => ModelConfig::default(),
        };
        if let Some(v) = self.topics {
            config.num_topics = v;
        }
        if let Some(v) = self.iterations {
            config.num_iterations = v;
        }
        if let Some(v) = self.alpha {
            config.alpha_sum = v;
        }
        if let Some(v) = self.beta {
            config.beta = v;
        }
        if let Some(v) = self.words {
            config.num_words = v;
        }
        if let Some(v) = self.optimize_interval {
            config.optimize_interval = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.threads {
            config.threads = v;
        }
        if let Some(v) = self.top_topics {
            config.top_topics = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Train {
            documents,
            merged,
            save_model,
            output,
            overrides,
        } => {
            let config = overrides.resolve()?;
            let texts = read_documents(&documents)?;
            let merged = merged.as_deref().map(read_merged).transpose()?;
            info!(path = %documents.display(), documents = texts.len(), "read corpus");

            let analysis = analysis::run(&texts, merged.as_deref(), &config)
                .with_context(|| format!("analyzing {}", documents.display()))?;

            if let Some(path) = save_model {
                analysis
                    .model
                    .save(&path)
                    .with_context(|| format!("saving model to {}", path.display()))?;
                info!(path = %path.display(), "saved model");
            }

            let name = report_name(&output, &documents);
            analysis.write_reports(&output.out, &name, config.num_words, true)?;
            print_summary(&analysis, config.num_words);
        }
        Command::Infer {
            model,
            documents,
            output,
            overrides,
        } => {
            let config = overrides.resolve()?;
            let trained = TrainedModel::load(&model).with_context(|| format!("loading model {}", model.display()))?;
            let merged = merge_documents(&read_documents(&documents)?);

            let analysis = analysis::analyze_with(trained, &merged, &analysis::tokenizer_for(&config), &config)?;
            let name = report_name(&output, &documents);
            analysis.write_reports(&output.out, &name, config.num_words, false)?;
            print_summary(&analysis, config.num_words);
        }
    }

    Ok(())
}

fn report_name(output: &OutputArgs, documents: &Path) -> String {
    output.name.clone().unwrap_or_else(|| {
        documents
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "corpus".to_string())
    })
}

fn print_summary(analysis: &Analysis, num_words: usize) {
    let top_words = analysis.model.top_words(num_words);
    println!("{:<8} {:>12}  {}", "Topic", "Probability", "Top words");
    println!("{}", "-".repeat(60));
    for score in &analysis.ranking {
        let words: Vec<&str> = top_words[score.topic].iter().take(5).map(|w| w.word.as_str()).collect();
        println!("{:<8} {:>12.4}  {}", score.topic, score.probability, words.join(", "));
    }
}
