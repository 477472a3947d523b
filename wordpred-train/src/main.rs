use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use wordpred_core::config::{BackoffConfig, PipelineConfig, SplitConfig};
use wordpred_core::io::{Artifact, artifact_path, read_lines, write_json};
use wordpred_core::model::evaluation::{EvalReport, evaluate};
use wordpred_core::model::{BackoffModel, NgramContinuation};
use wordpred_core::text::Language;
use wordpred_core::text::corpus::{CorpusFilter, prepare_corpus};
use wordpred_core::text::splitter::split_train_val_test;

/// Prepares a corpus and writes the prediction artifacts for one language.
#[derive(Parser, Debug)]
#[command(name = "wordpred-train")]
#[command(about = "Clean, split and index a text corpus for next-word prediction")]
struct Args {
	/// Path to the raw corpus (one sentence per line, optional <eos> markers)
	#[arg(short, long)]
	corpus: PathBuf,

	/// Corpus language (en or he)
	#[arg(short, long, default_value = "en")]
	lang: Language,

	/// Output directory for artifacts
	#[arg(short, long, default_value = "models")]
	out: PathBuf,

	/// JSON configuration file, applied over the language defaults
	#[arg(long)]
	config: Option<PathBuf>,

	/// Split seed
	#[arg(long)]
	seed: Option<u32>,

	/// Maximum tokens per line
	#[arg(long)]
	max_tokens: Option<usize>,

	/// Maximum backoff context order
	#[arg(long)]
	max_context: Option<usize>,

	/// Share of lines used for training
	#[arg(long)]
	train_ratio: Option<f64>,

	/// Share of lines used for validation
	#[arg(long)]
	val_ratio: Option<f64>,

	/// Words generated by the n-gram continuation model during evaluation
	#[arg(long, default_value = "3")]
	continuation_words: usize,
}

/// The sections of `PipelineConfig` this pipeline reads, saved next to the
/// artifacts. Sequence-model training is driven by library users.
#[derive(Serialize)]
struct PreparationConfig<'a> {
	corpus: &'a CorpusFilter,
	split: &'a SplitConfig,
	backoff: &'a BackoffConfig,
}

impl<'a> From<&'a PipelineConfig> for PreparationConfig<'a> {
	fn from(config: &'a PipelineConfig) -> Self {
		Self { corpus: &config.corpus, split: &config.split, backoff: &config.backoff }
	}
}

impl Args {
	/// Language defaults, then the config file, then explicit flags.
	fn pipeline_config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
		let mut config = match &self.config {
			Some(path) => PipelineConfig::load(path, self.lang)?,
			None => PipelineConfig::for_language(self.lang),
		};
		if let Some(seed) = self.seed {
			config.split.seed = seed;
		}
		if let Some(max_tokens) = self.max_tokens {
			config.corpus.max_tokens = max_tokens;
		}
		if let Some(max_context) = self.max_context {
			config.backoff.max_context = max_context;
		}
		if let Some(train_ratio) = self.train_ratio {
			config.split.train_ratio = train_ratio;
		}
		if let Some(val_ratio) = self.val_ratio {
			config.split.val_ratio = val_ratio;
		}
		config.validate()?;
		Ok(config)
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();
	let lang = args.lang;
	let config = args.pipeline_config()?;

	// Load + clean
	let raw = read_lines(&args.corpus)?;
	let corpus = prepare_corpus(&raw, lang, &config.corpus)?;
	log::info!(
		"Corpus ({lang}): {} source lines, {} after filtering to max_tokens={}",
		corpus.source_total,
		corpus.lines.len(),
		config.corpus.max_tokens
	);

	// Split
	let split = split_train_val_test(corpus.lines, config.split.seed, config.split.train_ratio, config.split.val_ratio)?;
	log::info!("Split: {} train, {} val, {} test (seed={})", split.train.len(), split.val.len(), split.test.len(), config.split.seed);

	// Backoff tables from the training part only
	let backoff = BackoffModel::build(&split.train, config.backoff.max_context)?;

	// Evaluate the backoff-driven predictor
	let sequence_model = NgramContinuation::new(&backoff, args.continuation_words);
	let report = EvalReport {
		lang,
		has_backoff: true,
		validation: evaluate("Validation", &split.val, &sequence_model, Some(&backoff), lang),
		test: evaluate("Test", &split.test, &sequence_model, Some(&backoff), lang),
	};

	// Save outputs
	write_json(artifact_path(&args.out, lang, Artifact::Splits), &split)?;
	backoff.save_json(artifact_path(&args.out, lang, Artifact::Backoff))?;
	write_json(artifact_path(&args.out, lang, Artifact::Eval), &report)?;
	write_json(args.out.join(format!("{}_config.json", lang.tag())), &PreparationConfig::from(&config))?;

	println!("Saved artifacts for '{lang}' to {}", args.out.display());
	println!("Validation top-1 accuracy: {:.2}%", report.validation.accuracy * 100.0);
	println!("Test top-1 accuracy: {:.2}%", report.test.accuracy * 100.0);

	Ok(())
}
