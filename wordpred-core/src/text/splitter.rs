use serde::{Deserialize, Serialize};

use crate::error::{Result, WordPredError};
use crate::rng::Mulberry32;

/// Train / validation / test partition of a corpus.
///
/// The three parts are disjoint contiguous slices of one shuffled copy of the
/// input. Order inside each part follows the shuffle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Split<T> {
	pub train: Vec<T>,
	pub val: Vec<T>,
	pub test: Vec<T>,
}

impl<T> Split<T> {
	/// Total number of items across the three parts.
	pub fn len(&self) -> usize {
		self.train.len() + self.val.len() + self.test.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Shuffles `items` in place with a seeded Fisher–Yates pass.
///
/// Walks from the last index down to 1 and swaps each slot with an index
/// drawn uniformly in `0..=i`.
pub fn shuffle<T>(items: &mut [T], rng: &mut Mulberry32) {
	for i in (1..items.len()).rev() {
		let j = rng.next_index(i + 1);
		items.swap(i, j);
	}
}

/// Shuffles `items` with `seed` and slices them into train / val / test.
///
/// - `train` gets `floor(n * train_ratio)` items
/// - `val` gets the next `floor(n * val_ratio)` items
/// - `test` gets the remainder
///
/// # Errors
/// Returns an error if a ratio is outside `[0, 1]` or if the two ratios sum
/// to more than 1.
pub fn split_train_val_test<T>(mut items: Vec<T>, seed: u32, train_ratio: f64, val_ratio: f64) -> Result<Split<T>> {
	let valid = |r: f64| (0.0..=1.0).contains(&r);
	if !valid(train_ratio) || !valid(val_ratio) || train_ratio + val_ratio > 1.0 {
		return Err(WordPredError::InvalidSplitRatios { train: train_ratio, val: val_ratio });
	}

	let mut rng = Mulberry32::new(seed);
	shuffle(&mut items, &mut rng);

	let n = items.len();
	let n_train = ((n as f64 * train_ratio).floor() as usize).min(n);
	let n_val = ((n as f64 * val_ratio).floor() as usize).min(n - n_train);

	// split_off leaves [0..at] in place and returns the tail
	let mut val = items.split_off(n_train);
	let test = val.split_off(n_val);

	log::debug!("Split {} items: {} train, {} val, {} test", n, items.len(), val.len(), test.len());

	Ok(Split { train: items, val, test })
}
