use serde::Serialize;

use super::backoff_model::BackoffModel;
use super::fusion::fuse_suggestions;
use super::rerank::rerank_by_category;
use super::sequence::SequenceModel;
use crate::text::Language;
use crate::text::normalizer::{clean_sentence, to_sequence};

/// Suggestions for one prediction event.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Prediction {
	/// Fused suggestions, before reranking.
	pub raw: Vec<String>,
	/// Final suggestions after category reranking.
	pub suggestions: Vec<String>,
}

/// High-level prediction interface over one language's artifacts.
///
/// # Responsibilities
/// - Normalize the typed prefix exactly like the training corpus
/// - Fuse sequence-model and backoff suggestions
/// - Rerank them with an externally predicted category
///
/// Holds no state between calls; the model and tables are shared read-only.
pub struct Predictor<'a, M: SequenceModel + ?Sized> {
	model: &'a M,
	backoff: &'a BackoffModel,
	lang: Language,
}

impl<'a, M: SequenceModel + ?Sized> Predictor<'a, M> {
	pub fn new(model: &'a M, backoff: &'a BackoffModel, lang: Language) -> Self {
		Self { model, backoff, lang }
	}

	pub fn language(&self) -> Language {
		self.lang
	}

	/// Suggests next words for a raw typed prefix.
	///
	/// # Parameters
	/// - `prefix`: raw user input; cleaned with the corpus normalizer and cut
	///   at any end marker
	/// - `category`: predicted category, if the classifier produced one
	/// - `raw_limit`: number of fused suggestions kept before reranking
	/// - `limit`: number of final suggestions
	///
	/// An empty prediction is a valid "nothing to suggest" outcome.
	pub fn suggest(&self, prefix: &str, category: Option<&str>, raw_limit: usize, limit: usize) -> Prediction {
		let prefix = to_sequence(&clean_sentence(prefix, self.lang)).join(" ");
		if prefix.is_empty() {
			return Prediction::default();
		}

		let raw = fuse_suggestions(self.model, self.backoff, &prefix, self.lang, raw_limit);
		let suggestions = rerank_by_category(&raw, category, self.lang, limit);
		log::debug!("suggest({prefix:?}, {category:?}) -> raw={raw:?}, final={suggestions:?}");

		Prediction { raw, suggestions }
	}
}
