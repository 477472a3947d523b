use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::thread;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::context_table::ContextTable;
use crate::error::{Result, WordPredError};
use crate::io::{build_output_path, read_json, write_json};
use crate::text::normalizer::{to_sequence, tokenize};

/// Number of chunks per CPU used by the parallel build.
const CHUNKS_PER_CPU: usize = 8;

/// A next-word candidate with its raw count.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
	pub word: String,
	pub count: u64,
}

/// Multi-order n-gram backoff model over word tokens.
///
/// For every context order `k` in `1..=max_context`, maps the space-joined
/// last `k` tokens of a prefix to the counts of the words that followed it.
///
/// # Responsibilities
/// - Count (context → next word) pairs from training sequences
/// - Retrieve candidates, longest available context first
/// - Merge with another model of the same `max_context`
/// - Persist as JSON, with a compact binary cache
///
/// # Invariants
/// - `max_context` is always >= 1
/// - Only sequences of at least 2 tokens contribute counts
/// - Counts never decrease as data is folded in
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackoffModel {
	max_context: usize,

	/// Context order → context key → next-word counts
	tables: BTreeMap<usize, IndexMap<String, ContextTable>>,
}

impl BackoffModel {
	/// Creates an empty model with one table per context order.
	///
	/// # Errors
	/// Returns an error if `max_context < 1`.
	pub fn new(max_context: usize) -> Result<Self> {
		if max_context < 1 {
			return Err(WordPredError::InvalidContextOrder(max_context));
		}
		let tables = (1..=max_context).map(|k| (k, IndexMap::new())).collect();
		Ok(Self { max_context, tables })
	}

	pub fn max_context(&self) -> usize {
		self.max_context
	}

	/// Returns `true` if no count was recorded.
	pub fn is_empty(&self) -> bool {
		self.tables.values().all(IndexMap::is_empty)
	}

	/// Number of distinct context keys stored for order `k`.
	pub fn context_count(&self, k: usize) -> usize {
		self.tables.get(&k).map_or(0, IndexMap::len)
	}

	/// Observed count of `word` after the exact context `key` of order `k`.
	pub fn count(&self, k: usize, key: &str, word: &str) -> u64 {
		self.tables.get(&k).and_then(|t| t.get(key)).map_or(0, |table| table.count(word))
	}

	/// Adds one token sequence to the model.
	///
	/// Each position `i >= 1` makes `seq[i]` the next word for every context
	/// order `k <= i`, keyed by `seq[i-k..i]`.
	///
	/// # Notes
	/// - Sequences shorter than 2 tokens are ignored.
	/// - The caller is responsible for `<eos>` truncation (see `add_line`).
	pub fn add_sequence<S: AsRef<str>>(&mut self, seq: &[S]) {
		if seq.len() < 2 {
			return;
		}

		for i in 1..seq.len() {
			let next_word = seq[i].as_ref();
			for k in 1..=self.max_context.min(i) {
				let key = seq[i - k..i].iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
				self.tables.entry(k).or_default().entry(key).or_default().add_transition(next_word);
			}
		}
	}

	/// Tokenizes a cleaned line, truncates it at `<eos>` and adds it.
	pub fn add_line(&mut self, line: &str) {
		self.add_sequence(&to_sequence(line));
	}

	/// Builds a model from cleaned lines.
	///
	/// # Behavior
	/// - Splits the lines into chunks (CPU count × factor)
	/// - Builds one partial model per chunk on scoped threads
	/// - Merges the partial models in chunk order
	///
	/// Merging in chunk order keeps first-insertion order, so the result is
	/// identical to adding the lines one by one.
	pub fn build<S: AsRef<str> + Sync>(lines: &[S], max_context: usize) -> Result<Self> {
		let mut model = Self::new(max_context)?;
		if lines.is_empty() {
			return Ok(model);
		}

		let chunks = num_cpus::get() * CHUNKS_PER_CPU;
		let chunk_size = lines.len().div_ceil(chunks);
		log::debug!("Building backoff model from {} lines in chunks of {}", lines.len(), chunk_size);

		let partial_models: Vec<Self> = thread::scope(|scope| {
			let handles: Vec<_> = lines
				.chunks(chunk_size)
				.map(|chunk| {
					let mut partial_model = model.empty_like();
					scope.spawn(move || {
						for line in chunk {
							partial_model.add_line(line.as_ref());
						}
						partial_model
					})
				})
				.collect();

			handles
				.into_iter()
				.map(|handle| handle.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload)))
				.collect()
		});

		for partial_model in &partial_models {
			model.merge(partial_model)?;
		}

		log::info!(
			"Backoff model built: max_context={}, contexts per order={:?}",
			model.max_context,
			(1..=model.max_context).map(|k| model.context_count(k)).collect::<Vec<_>>()
		);
		Ok(model)
	}

	fn empty_like(&self) -> Self {
		Self {
			max_context: self.max_context,
			tables: (1..=self.max_context).map(|k| (k, IndexMap::new())).collect(),
		}
	}

	/// Merges another model into this one.
	///
	/// # Notes
	/// - Both models must have the same `max_context`.
	/// - Counts for matching (order, key, word) are summed; new keys are
	///   appended in `other`'s order.
	///
	/// # Errors
	/// Returns an error if the context orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.max_context != other.max_context {
			return Err(WordPredError::ContextMismatch { expected: self.max_context, found: other.max_context });
		}

		for (k, other_tables) in &other.tables {
			let tables = self.tables.entry(*k).or_default();
			for (key, table) in other_tables {
				if let Some(existing) = tables.get_mut(key) {
					existing.merge(table);
				} else {
					tables.insert(key.clone(), table.clone());
				}
			}
		}

		Ok(())
	}

	/// Returns next-word candidates for a prefix.
	///
	/// Tries the longest available context first (`min(max_context, tokens)`)
	/// and falls back to shorter ones. The first matching table wins; its
	/// candidates come by descending count, ties in first-insertion order.
	///
	/// Returns an empty list if no context order matches.
	pub fn candidates(&self, prefix: &str, limit: usize) -> Vec<Candidate> {
		self.candidates_for_tokens(&tokenize(prefix), limit)
	}

	pub(crate) fn candidates_for_tokens<S: AsRef<str>>(&self, tokens: &[S], limit: usize) -> Vec<Candidate> {
		for k in (1..=self.max_context.min(tokens.len())).rev() {
			let key = tokens[tokens.len() - k..].iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
			match self.tables.get(&k).and_then(|t| t.get(&key)) {
				Some(table) if !table.is_empty() => return table.ranked(limit),
				_ => continue,
			}
		}
		Vec::new()
	}

	/// Writes the model as JSON (`{maxContext, tables}`).
	pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		write_json(path, self)
	}

	/// Reads a model from JSON.
	///
	/// # Errors
	/// Returns an error on I/O or parse failure, or if `maxContext < 1`.
	pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
		let model: Self = read_json(path)?;
		if model.max_context < 1 {
			return Err(WordPredError::InvalidContextOrder(model.max_context));
		}
		Ok(model)
	}

	pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		fs::write(path, bytes)?;
		Ok(())
	}

	pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Loads a model from its JSON artifact, going through the binary cache.
	///
	/// - Reads `<name>.bin` next to the JSON file if it is at least as recent
	/// - Otherwise parses the JSON and (re)writes the cache
	pub fn load<P: AsRef<Path>>(json_path: P) -> Result<Self> {
		let json_path = json_path.as_ref();
		let binary_path = build_output_path(json_path, "bin")?;

		if is_fresh(&binary_path, json_path) {
			log::debug!("Loading backoff cache {}", binary_path.display());
			return Self::load_binary(&binary_path);
		}

		let model = Self::load_json(json_path)?;
		if let Err(e) = model.save_binary(&binary_path) {
			log::warn!("Could not write backoff cache {}: {e}", binary_path.display());
		}
		Ok(model)
	}
}

/// `true` when `cache` exists and is not older than `source`.
fn is_fresh(cache: &Path, source: &Path) -> bool {
	let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified());
	match (modified(cache), modified(source)) {
		(Ok(cache_time), Ok(source_time)) => cache_time >= source_time,
		_ => false,
	}
}
