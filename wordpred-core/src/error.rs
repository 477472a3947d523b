/// Errors raised by the prediction pipeline.
///
/// Empty normalizations, short sequences, missing candidates and unknown
/// categories are ordinary outcomes and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum WordPredError {
	#[error("Unknown language tag: {0} (expected en or he)")]
	UnknownLanguage(String),

	#[error("Invalid split ratios: train={train}, val={val}")]
	InvalidSplitRatios { train: f64, val: f64 },

	#[error("Invalid training parameter {field}={value}: {reason}")]
	InvalidTrainingConfig { field: &'static str, value: f64, reason: &'static str },

	#[error("Context order must be >= 1, got {0}")]
	InvalidContextOrder(usize),

	#[error("Max context mismatch: self={expected}, other={found}")]
	ContextMismatch { expected: usize, found: usize },

	#[error("Only {remaining} samples remain after filtering, at least {required} required")]
	InsufficientCorpus { remaining: usize, required: usize },

	#[error("No stable model produced after {attempts} attempts")]
	Unstable { attempts: usize },

	#[error("IO error: {source}")]
	Io {
		#[from]
		source: std::io::Error,
	},

	#[error("JSON error: {source}")]
	Json {
		#[from]
		source: serde_json::Error,
	},

	#[error("Binary cache error: {source}")]
	Binary {
		#[from]
		source: postcard::Error,
	},
}

pub type Result<T> = std::result::Result<T, WordPredError>;
