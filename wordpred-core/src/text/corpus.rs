use serde::{Deserialize, Serialize};

use super::normalizer::{Language, clean_sentence, tokenize};
use crate::error::{Result, WordPredError};

/// Shape filters applied to cleaned corpus lines before splitting.
///
/// Long lines destabilise sequence-model training, so the corpus is limited to
/// short sentences. Word and line length limits only apply to English.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CorpusFilter {
	/// Maximum whitespace tokens per line, `<eos>` included.
	pub max_tokens: usize,
	/// Maximum characters per word (English).
	pub max_word_len: usize,
	/// Maximum characters per line (English).
	pub max_line_len: usize,
	/// Minimum number of lines that must survive filtering.
	pub min_samples: usize,
}

impl Default for CorpusFilter {
	fn default() -> Self {
		Self::for_language(Language::English)
	}
}

impl CorpusFilter {
	pub fn for_language(lang: Language) -> Self {
		Self {
			max_tokens: match lang {
				Language::English => 6,
				Language::Hebrew => 8,
			},
			max_word_len: 20,
			max_line_len: 60,
			min_samples: 50,
		}
	}
}

/// Cleaned and filtered corpus, ready to split.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedCorpus {
	/// Number of non-empty lines after cleaning, before shape filters.
	pub source_total: usize,
	pub lines: Vec<String>,
}

/// Cleans raw corpus lines and applies the shape filters.
///
/// Blank raw lines and lines that clean to nothing are dropped.
///
/// # Errors
/// Returns `InsufficientCorpus` when fewer than `filter.min_samples` lines remain.
pub fn prepare_corpus<S: AsRef<str>>(raw: &[S], lang: Language, filter: &CorpusFilter) -> Result<PreparedCorpus> {
	let cleaned: Vec<String> = raw
		.iter()
		.map(AsRef::as_ref)
		.filter(|line| !line.is_empty())
		.map(|line| clean_sentence(line, lang))
		.filter(|line| !line.is_empty())
		.collect();
	let source_total = cleaned.len();

	let lines: Vec<String> = cleaned
		.into_iter()
		.filter(|line| match lang {
			Language::English => {
				line.split_whitespace().all(|w| w.chars().count() <= filter.max_word_len)
					&& line.chars().count() <= filter.max_line_len
			}
			Language::Hebrew => true,
		})
		.filter(|line| tokenize(line).len() <= filter.max_tokens)
		.collect();

	log::debug!("Corpus ({lang}): {source_total} cleaned lines, {} kept", lines.len());

	if lines.len() < filter.min_samples {
		return Err(WordPredError::InsufficientCorpus { remaining: lines.len(), required: filter.min_samples });
	}

	Ok(PreparedCorpus { source_total, lines })
}
