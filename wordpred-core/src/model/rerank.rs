use super::vocabulary::{fallback_words, word_category};
use crate::text::Language;
use crate::text::normalizer::normalize_word;

/// Reorders suggestions so words of the predicted category come first.
///
/// - Without a category, returns the first `limit` suggestions unchanged
/// - Otherwise extends the pool with the category's fallback words that are
///   not already present, then moves every word of the category ahead of
///   the others and keeps the best `limit`
///
/// Earlier entries win among words of the same tier, whatever the pool size.
pub fn rerank_by_category<S: AsRef<str>>(
	suggestions: &[S],
	category: Option<&str>,
	lang: Language,
	limit: usize,
) -> Vec<String> {
	let mut pool: Vec<String> = suggestions.iter().map(|s| s.as_ref().to_owned()).collect();

	let Some(category) = category else {
		pool.truncate(limit);
		return pool;
	};

	for word in fallback_words(lang, category) {
		let word = normalize_word(word, lang);
		if !word.is_empty() && !pool.contains(&word) {
			pool.push(word);
		}
	}

	let mut tiered: Vec<(bool, String)> = pool
		.into_iter()
		.map(|word| (word_category(&word, lang) == Some(category), word))
		.collect();
	// stable: pool order is kept inside each tier
	tiered.sort_by(|a, b| b.0.cmp(&a.0));

	tiered.into_iter().take(limit).map(|(_, word)| word).collect()
}
