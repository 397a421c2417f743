use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use precis_harness::{
    config::HarnessConfig, models::candle::t5::CandleT5Summarizer, GenerationParams,
    StrategyRegistry, Summarizer, SummaryPath,
};
use precis_textrank::summarize_extractive;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demo text used when no input file is given.
const SAMPLE_TEXT: &str = "The resulting edges of the graph carry weights derived from \
    co-occurrence counts. A ranking pass over this weighted graph surfaces the most \
    important words in the document, and adjacent high-ranking words merge into key \
    phrases. Sentences carrying the strongest phrases are selected for the summary. \
    Sequence-to-sequence models take a different route and rewrite the document into \
    new sentences altogether. Both families of approaches are exposed here behind one \
    command line.";

#[derive(Parser)]
#[command(name = "precis", about = "Extractive and abstractive text summarization")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize with every configured seq2seq model, over both invocation
    /// paths.
    Abstractive {
        /// TOML configuration listing the models to load.
        #[arg(long)]
        config: PathBuf,
        /// File containing the text to summarize.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = 250)]
        max_length: usize,
        #[arg(long, default_value_t = 150)]
        min_length: usize,
        #[arg(long, default_value_t = 2.0)]
        length_penalty: f32,
        #[arg(long, default_value_t = 4)]
        num_beams: usize,
    },
    /// Rank phrases and select the top sentences of the input text.
    Extractive {
        /// File containing the text to summarize.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        limit_phrases: usize,
        #[arg(long, default_value_t = 5)]
        limit_sentences: usize,
        /// How many ranked phrases to print.
        #[arg(long, default_value_t = 10)]
        top_phrases: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Abstractive {
            config,
            file,
            max_length,
            min_length,
            length_penalty,
            num_beams,
        } => {
            let params = GenerationParams::new(max_length, min_length, length_penalty, num_beams);
            run_abstractive(config, file, &params)
        }
        Command::Extractive {
            file,
            limit_phrases,
            limit_sentences,
            top_phrases,
        } => run_extractive(file, limit_phrases, limit_sentences, top_phrases),
    }
}

fn read_input(file: Option<PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => Ok(SAMPLE_TEXT.to_string()),
    }
}

fn run_abstractive(
    config_path: PathBuf,
    file: Option<PathBuf>,
    params: &GenerationParams,
) -> anyhow::Result<()> {
    let config = HarnessConfig::from_file_path(config_path);
    let text = read_input(file)?;

    let mut registry = StrategyRegistry::new();
    for spec in config.models() {
        registry.register(
            spec.model_id(),
            CandleT5Summarizer::hub_entry(
                spec.model_id(),
                spec.revision(),
                config.api_key(),
                config.cache_dir(),
                spec.prompt_prefix(),
            ),
        );
    }
    info!("registered {} model(s)", registry.len());
    let summarizer = Summarizer::new(registry);

    for spec in config.models() {
        for (label, path) in [
            ("Direct", SummaryPath::Direct),
            ("Pipeline", SummaryPath::Pipeline),
        ] {
            let summary = summarizer.summarize(&text, spec.model_id(), path, params)?;
            println!("{label} summary ({}):", summary.model_id);
            println!("{}\n", summary.text);
        }
        println!("{}\n", "=".repeat(70));
    }

    Ok(())
}

fn run_extractive(
    file: Option<PathBuf>,
    limit_phrases: usize,
    limit_sentences: usize,
    top_phrases: usize,
) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let summary = summarize_extractive(&text, limit_phrases, limit_sentences)?;

    println!("Summary:");
    for sentence in &summary.sentences {
        println!("{sentence}");
    }

    println!("\n{}", "-".repeat(70));
    println!("Top {top_phrases} phrases with their ranks:");
    for phrase in summary.phrases.iter().take(top_phrases) {
        println!("{:.4}  {}", phrase.score, phrase.text);
    }

    Ok(())
}
