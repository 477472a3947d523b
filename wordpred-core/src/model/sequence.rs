use super::backoff_model::BackoffModel;
use crate::text::normalizer::tokenize;

/// A trained sequence model, seen from the outside.
///
/// Given a prefix (tokens joined by single spaces, possibly with trailing
/// whitespace), returns the raw text the model would continue with. Nothing
/// else is assumed about the model.
pub trait SequenceModel {
	fn continuation(&self, prefix: &str) -> String;
}

/// Any `Fn(&str) -> String` can stand in for a sequence model.
impl<F> SequenceModel for F
where
	F: Fn(&str) -> String,
{
	fn continuation(&self, prefix: &str) -> String {
		self(prefix)
	}
}

/// A categorical classifier, seen from the outside.
///
/// Returns one score per category label for an encoded feature vector.
pub trait Classifier {
	fn predict(&self, features: &[f64]) -> Vec<(String, f64)>;
}

/// Label with the highest score.
///
/// The first maximum wins on ties. NaN scores are ignored; returns `None`
/// when no score is comparable.
pub fn arg_max<S: AsRef<str>>(scores: &[(S, f64)]) -> Option<&str> {
	let mut best: Option<(&str, f64)> = None;
	for (label, score) in scores {
		if score.is_nan() {
			continue;
		}
		match best {
			Some((_, best_score)) if *score <= best_score => {}
			_ => best = Some((label.as_ref(), *score)),
		}
	}
	best.map(|(label, _)| label)
}

/// Runs `classifier` on `features` and keeps the winning label.
pub fn predict_category<C: Classifier + ?Sized>(classifier: &C, features: &[f64]) -> Option<String> {
	arg_max(&classifier.predict(features)).map(str::to_owned)
}

/// Sequence model backed by the backoff tables.
///
/// Greedily extends the prefix with the top backoff candidate, one word at a
/// time, until no candidate is found or `max_words` words were produced. Used
/// when no trained neural model is deployed.
pub struct NgramContinuation<'a> {
	backoff: &'a BackoffModel,
	max_words: usize,
}

impl<'a> NgramContinuation<'a> {
	pub fn new(backoff: &'a BackoffModel, max_words: usize) -> Self {
		Self { backoff, max_words }
	}
}

impl SequenceModel for NgramContinuation<'_> {
	fn continuation(&self, prefix: &str) -> String {
		let mut tokens = tokenize(prefix);
		let start = tokens.len();

		for _ in 0..self.max_words {
			match self.backoff.candidates_for_tokens(&tokens, 1).into_iter().next() {
				Some(candidate) => tokens.push(candidate.word),
				None => break,
			}
		}

		tokens[start..].join(" ")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FixedScores(Vec<(String, f64)>);

	impl Classifier for FixedScores {
		fn predict(&self, _features: &[f64]) -> Vec<(String, f64)> {
			self.0.clone()
		}
	}

	#[test]
	fn arg_max_picks_first_maximum() {
		let scores = [("Needs", 0.2), ("Feelings", 0.7), ("Places", 0.7)];
		assert_eq!(arg_max(&scores), Some("Feelings"));
		assert_eq!(arg_max::<&str>(&[]), None);
		assert_eq!(arg_max(&[("a", f64::NAN), ("b", -1.0)]), Some("b"));
		assert_eq!(arg_max(&[("a", f64::NAN)]), None);
	}

	#[test]
	fn classifier_adapter() {
		let classifier = FixedScores(vec![("Needs".into(), 0.9), ("Objects".into(), 0.1)]);
		assert_eq!(predict_category(&classifier, &[0.0, 1.0]), Some("Needs".to_owned()));
	}

	#[test]
	fn closures_are_sequence_models() {
		let model = |prefix: &str| format!("{} more", prefix.len());
		assert_eq!(model.continuation("abc"), "3 more");
	}

	#[test]
	fn ngram_continuation_extends_greedily() {
		let mut backoff = BackoffModel::new(2).unwrap();
		backoff.add_line("i want to drink water <eos>");
		backoff.add_line("i want to go <eos>");
		backoff.add_line("i want to drink tea <eos>");

		let model = NgramContinuation::new(&backoff, 2);
		assert_eq!(model.continuation("i want to"), "drink water");
		assert_eq!(model.continuation("i want to  "), "drink water");
		assert_eq!(model.continuation("unknown words"), "");

		let single = NgramContinuation::new(&backoff, 1);
		assert_eq!(single.continuation("want"), "to");
	}
}
