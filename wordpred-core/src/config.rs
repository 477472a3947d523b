use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::read_json;
use crate::text::Language;
use crate::text::corpus::CorpusFilter;
use crate::training::TrainingConfig;

/// Seeded split ratios. Test gets the remainder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitConfig {
	pub seed: u32,
	pub train_ratio: f64,
	pub val_ratio: f64,
}

impl Default for SplitConfig {
	fn default() -> Self {
		Self { seed: 1234, train_ratio: 0.7, val_ratio: 0.15 }
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BackoffConfig {
	pub max_context: usize,
}

impl Default for BackoffConfig {
	fn default() -> Self {
		Self { max_context: 4 }
	}
}

/// Every tunable of the corpus-to-artifacts pipeline.
///
/// All fields are optional in the JSON form; missing ones take the defaults
/// of the language given to `load`.
///
/// `training` is not read by the corpus pipeline. It configures
/// `train_with_retries` for callers that plug in their own sequence trainer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
	pub corpus: CorpusFilter,
	pub split: SplitConfig,
	pub backoff: BackoffConfig,
	pub training: TrainingConfig,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self::for_language(Language::English)
	}
}

impl PipelineConfig {
	/// Defaults tuned per language (Hebrew trains slower and on longer lines).
	pub fn for_language(lang: Language) -> Self {
		let training = match lang {
			Language::English => TrainingConfig::default(),
			Language::Hebrew => TrainingConfig { base_learning_rate: 0.0005, iterations: 120, ..TrainingConfig::default() },
		};
		Self {
			corpus: CorpusFilter::for_language(lang),
			split: SplitConfig::default(),
			backoff: BackoffConfig::default(),
			training,
		}
	}

	/// Loads a configuration file on top of the language defaults.
	///
	/// Only the fields present in the file override the defaults.
	///
	/// # Errors
	/// Fails on I/O or parse errors, and if the merged config does not validate.
	pub fn load<P: AsRef<Path>>(path: P, lang: Language) -> Result<Self> {
		let overrides: serde_json::Value = read_json(path)?;
		let mut merged = serde_json::to_value(Self::for_language(lang))?;
		merge_json(&mut merged, overrides);
		let config: Self = serde_json::from_value(merged)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the parts that cannot be checked where they are used.
	pub fn validate(&self) -> Result<()> {
		self.training.validate()
	}
}

/// Recursively overlays `overrides` onto `base`.
fn merge_json(base: &mut serde_json::Value, overrides: serde_json::Value) {
	match (base, overrides) {
		(serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
			for (key, value) in overrides {
				match base.get_mut(&key) {
					Some(existing) => merge_json(existing, value),
					None => {
						base.insert(key, value);
					}
				}
			}
		}
		(base, overrides) => *base = overrides,
	}
}
