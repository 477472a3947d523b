use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::backoff_model::Candidate;

/// Next-word counts observed after one context key.
///
/// Conceptually a node of a Markov chain whose outgoing edges are weighted by
/// their number of observations.
///
/// ## Invariants
/// - Every count is strictly positive
/// - Iteration order is first-insertion order, which breaks count ties
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub(crate) struct ContextTable {
	/// Example: { "go" => 5, "eat" => 3 }
	transitions: IndexMap<String, u64>,
}

impl ContextTable {
	/// Records one occurrence of `next_word`.
	pub(crate) fn add_transition(&mut self, next_word: &str) {
		if let Some(count) = self.transitions.get_mut(next_word) {
			*count += 1;
		} else {
			self.transitions.insert(next_word.to_owned(), 1);
		}
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	pub(crate) fn count(&self, word: &str) -> u64 {
		self.transitions.get(word).copied().unwrap_or(0)
	}

	/// Returns at most `limit` candidates by descending count.
	///
	/// The sort is stable, so ties keep first-insertion order.
	pub(crate) fn ranked(&self, limit: usize) -> Vec<Candidate> {
		let mut candidates: Vec<Candidate> = self
			.transitions
			.iter()
			.map(|(word, count)| Candidate { word: word.clone(), count: *count })
			.collect();
		candidates.sort_by(|a, b| b.count.cmp(&a.count));
		candidates.truncate(limit);
		candidates
	}

	/// Adds every count of `other` to this table.
	///
	/// Words unknown to this table are appended in `other`'s order.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (word, count) in &other.transitions {
			*self.transitions.entry(word.clone()).or_insert(0) += *count;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ties_keep_insertion_order() {
		let mut table = ContextTable::default();
		for word in ["b", "a", "c", "a", "c"] {
			table.add_transition(word);
		}
		let words: Vec<String> = table.ranked(10).into_iter().map(|c| c.word).collect();
		assert_eq!(words, vec!["a", "c", "b"]);
	}

	#[test]
	fn merge_sums_counts() {
		let mut a = ContextTable::default();
		a.add_transition("go");
		let mut b = ContextTable::default();
		b.add_transition("go");
		b.add_transition("eat");
		a.merge(&b);
		assert_eq!(a.count("go"), 2);
		assert_eq!(a.count("eat"), 1);
		assert_eq!(a.count("sleep"), 0);
	}

	#[test]
	fn ranked_respects_limit() {
		let mut table = ContextTable::default();
		for word in ["x", "y", "z"] {
			table.add_transition(word);
		}
		assert_eq!(table.ranked(2).len(), 2);
		assert!(table.ranked(0).is_empty());
	}
}
