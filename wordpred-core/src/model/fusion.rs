use indexmap::IndexMap;

use super::backoff_model::BackoffModel;
use super::sequence::SequenceModel;
use crate::text::Language;
use crate::text::normalizer::{normalize_word, tokenize};

/// Prefix variants probed per request: the prefix, then one and two trailing spaces.
const TRAILING_SPACES: [&str; 3] = ["", " ", "  "];

/// Base score of the sequence-model word for the first variant.
const SEQUENCE_SCORE: f64 = 3.0;
const SEQUENCE_VARIANT_DECAY: f64 = 0.2;

/// Base score of the top backoff candidate. Always below every sequence-model score.
const BACKOFF_SCORE: f64 = 2.5;
const BACKOFF_RANK_DECAY: f64 = 0.12;
const BACKOFF_VARIANT_DECAY: f64 = 0.05;

/// Extra backoff candidates fetched beyond the final limit, to leave room for merging.
const EXTRA_CANDIDATES: usize = 4;

/// Best score seen for each normalized word, in first-offer order.
#[derive(Debug, Default)]
struct ScoreBoard {
	scores: IndexMap<String, f64>,
}

impl ScoreBoard {
	/// Offers `raw_word` with `score`.
	///
	/// The word is normalized first; empty words and the end marker are
	/// ignored. A word keeps the maximum of all scores offered for it.
	fn offer(&mut self, raw_word: &str, score: f64, lang: Language) {
		let word = normalize_word(raw_word, lang);
		if word.is_empty() || word == "eos" {
			return;
		}
		let best = self.scores.entry(word).or_insert(f64::NEG_INFINITY);
		if score > *best {
			*best = score;
		}
	}

	/// Words by descending score; ties keep first-offer order.
	fn into_ranked(self, limit: usize) -> Vec<(String, f64)> {
		let mut ranked: Vec<(String, f64)> = self.scores.into_iter().collect();
		ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
		ranked.truncate(limit);
		ranked
	}
}

/// Extracts the word the sequence model proposes right after `prefix`.
///
/// The continuation is appended to the prefix and re-tokenized; the token at
/// the prefix's own token count is the proposed word. Returns `None` when the
/// model proposes nothing usable (no token, the end marker, or a word that
/// normalizes to empty).
pub fn sequence_word<M: SequenceModel + ?Sized>(model: &M, prefix: &str, lang: Language) -> Option<String> {
	let continuation = model.continuation(prefix);
	let full = tokenize(&format!("{prefix} {continuation}"));
	let next = full.get(tokenize(prefix).len())?;

	let word = normalize_word(next, lang);
	if word.is_empty() || word == "eos" {
		return None;
	}
	Some(word)
}

/// Fuses sequence-model and backoff suggestions, keeping scores.
///
/// For every prefix variant `v` (0, 1 or 2 trailing spaces):
/// - the sequence-model word scores `3.0 - 0.2 v`
/// - the backoff candidate at rank `i` scores `2.5 - 0.12 i - 0.05 v`
///
/// A word offered several times keeps its maximum score. Returns at most
/// `limit` words by descending score, possibly none.
pub fn fuse_scored<M: SequenceModel + ?Sized>(
	model: &M,
	backoff: &BackoffModel,
	prefix: &str,
	lang: Language,
	limit: usize,
) -> Vec<(String, f64)> {
	let mut board = ScoreBoard::default();

	for (v, spaces) in TRAILING_SPACES.iter().enumerate() {
		let variant = format!("{prefix}{spaces}");
		let v = v as f64;

		if let Some(word) = sequence_word(model, &variant, lang) {
			board.offer(&word, SEQUENCE_SCORE - v * SEQUENCE_VARIANT_DECAY, lang);
		}

		for (i, candidate) in backoff.candidates(&variant, limit.saturating_add(EXTRA_CANDIDATES)).iter().enumerate() {
			let score = BACKOFF_SCORE - i as f64 * BACKOFF_RANK_DECAY - v * BACKOFF_VARIANT_DECAY;
			board.offer(&candidate.word, score, lang);
		}
	}

	board.into_ranked(limit)
}

/// Fused suggestions for `prefix`, best first.
pub fn fuse_suggestions<M: SequenceModel + ?Sized>(
	model: &M,
	backoff: &BackoffModel,
	prefix: &str,
	lang: Language,
	limit: usize,
) -> Vec<String> {
	fuse_scored(model, backoff, prefix, lang, limit).into_iter().map(|(word, _)| word).collect()
}
