use serde::{Deserialize, Serialize};

use super::backoff_model::BackoffModel;
use super::fusion::sequence_word;
use super::sequence::SequenceModel;
use crate::text::Language;
use crate::text::normalizer::{clean_sentence, to_sequence};

/// Placeholder prediction recorded when nothing is predicted.
pub const EMPTY_PREDICTION: &str = "<empty>";

/// Top-1 accuracy over one split.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EvalResult {
	pub name: String,
	pub samples: usize,
	#[serde(rename = "acc")]
	pub accuracy: f64,
}

/// Evaluation artifact for one language.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvalReport {
	pub lang: Language,
	pub has_backoff: bool,
	pub validation: EvalResult,
	pub test: EvalResult,
}

/// Share of positions where the prediction equals the truth.
///
/// Returns 0 when there is nothing to compare.
pub fn accuracy<T: PartialEq>(truth: &[T], predicted: &[T]) -> f64 {
	let total = truth.len().min(predicted.len());
	if total == 0 {
		return 0.0;
	}
	let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
	correct as f64 / total as f64
}

/// Predicts a single next word by combining the sequence model and the backoff list.
///
/// - If the sequence-model word is a backoff candidate, it wins
/// - Else the first candidate extending it (prefix match) wins
/// - Else the sequence-model word is kept if the backoff has nothing
/// - Else the top backoff candidate
///
/// Returns an empty string when neither source proposes anything.
pub fn predict_next_word<M: SequenceModel + ?Sized>(
	model: &M,
	backoff: Option<&BackoffModel>,
	prefix: &str,
	lang: Language,
) -> String {
	let model_word = sequence_word(model, prefix, lang);
	let candidates: Vec<String> = backoff
		.map(|b| b.candidates(prefix, usize::MAX).into_iter().map(|c| c.word).collect())
		.unwrap_or_default();

	if let Some(word) = model_word {
		if candidates.contains(&word) {
			return word;
		}
		if let Some(extended) = candidates.iter().find(|c| c.starts_with(word.as_str())) {
			return extended.clone();
		}
		if candidates.is_empty() {
			return word;
		}
	}

	candidates.into_iter().next().unwrap_or_default()
}

/// Evaluates top-1 next-word accuracy on stored lines.
///
/// Each line is cleaned and cut at `<eos>`; lines with fewer than 2 tokens
/// are skipped. The last token is the target, the rest is the prefix.
pub fn evaluate<S: AsRef<str>, M: SequenceModel + ?Sized>(
	name: &str,
	lines: &[S],
	model: &M,
	backoff: Option<&BackoffModel>,
	lang: Language,
) -> EvalResult {
	let mut truth = Vec::new();
	let mut predicted = Vec::new();

	for line in lines {
		let mut tokens = to_sequence(&clean_sentence(line.as_ref(), lang));
		if tokens.len() < 2 {
			continue;
		}
		let Some(target) = tokens.pop() else { continue };
		let prediction = predict_next_word(model, backoff, &tokens.join(" "), lang);

		truth.push(target);
		predicted.push(if prediction.is_empty() { EMPTY_PREDICTION.to_owned() } else { prediction });
	}

	let result = EvalResult { name: name.to_owned(), samples: truth.len(), accuracy: accuracy(&truth, &predicted) };
	log::info!("{} samples: {}, top-1 accuracy: {:.2}%", result.name, result.samples, result.accuracy * 100.0);
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	fn backoff() -> BackoffModel {
		let mut model = BackoffModel::new(2).unwrap();
		for line in ["i want water", "i want water", "i want watermelon", "i need help"] {
			model.add_line(line);
		}
		model
	}

	#[test]
	fn accuracy_counts_matches() {
		assert_eq!(accuracy(&["a", "b", "c", "d"], &["a", "x", "c", "y"]), 0.5);
		assert_eq!(accuracy::<&str>(&[], &[]), 0.0);
	}

	#[test]
	fn model_word_confirmed_by_backoff() {
		let backoff = backoff();
		let model = |_: &str| "watermelon".to_owned();
		assert_eq!(predict_next_word(&model, Some(&backoff), "i want", Language::English), "watermelon");
	}

	#[test]
	fn model_word_completed_by_backoff() {
		let backoff = backoff();
		let model = |_: &str| "wat".to_owned();
		assert_eq!(predict_next_word(&model, Some(&backoff), "i want", Language::English), "water");
	}

	#[test]
	fn backoff_overrides_unknown_model_word() {
		let backoff = backoff();
		let model = |_: &str| "juice".to_owned();
		assert_eq!(predict_next_word(&model, Some(&backoff), "i want", Language::English), "water");
		assert_eq!(predict_next_word(&model, Some(&backoff), "they", Language::English), "juice");
		assert_eq!(predict_next_word(&model, None, "i want", Language::English), "juice");
	}

	#[test]
	fn evaluate_skips_short_lines() {
		let backoff = backoff();
		let silent = |_: &str| String::new();
		let lines = ["I want water <eos>", "i need help", "hello <eos>", "you want water", "nobody knows"];
		let result = evaluate("Validation", &lines, &silent, Some(&backoff), Language::English);
		assert_eq!(result.samples, 4);
		assert_eq!(result.accuracy, 0.75);
	}
}
