//! Bounded-retry driver for an external sequence-model trainer.
//!
//! Each attempt trains with a geometrically decayed learning rate and its own
//! seeded RNG. An attempt whose error turns NaN or infinite is aborted and
//! recorded; the first attempt that ends with a finite error produces the
//! model. If every attempt fails, the run is marked crashed and no model is
//! returned.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordPredError};
use crate::rng::Mulberry32;

/// Training hyper-parameters and retry policy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainingConfig {
	pub base_learning_rate: f64,
	/// Multiplier applied per attempt, in `(0, 1)`.
	pub lr_decay: f64,
	/// Attempts after the first one.
	pub max_retries: usize,
	/// Iteration cap given to the trainer.
	pub iterations: usize,
	/// Error under which the trainer may stop early.
	pub error_threshold: f64,
	/// Attempt `i` draws from `Mulberry32::new(seed + i)`.
	pub seed: u32,
	/// Keep every n-th epoch statistic (non-finite ones are always kept).
	pub stats_period: usize,
}

impl Default for TrainingConfig {
	fn default() -> Self {
		Self {
			base_learning_rate: 0.001,
			lr_decay: 0.5,
			max_retries: 4,
			iterations: 180,
			error_threshold: 0.02,
			seed: 1234,
			stats_period: 10,
		}
	}
}

impl TrainingConfig {
	/// Learning rate of attempt `attempt` (0-based).
	pub fn learning_rate(&self, attempt: usize) -> f64 {
		self.base_learning_rate * self.lr_decay.powi(attempt as i32)
	}

	/// Checks that retries use strictly decreasing, positive learning rates.
	///
	/// # Errors
	/// Returns `InvalidTrainingConfig` if `base_learning_rate` is not a
	/// positive finite number, if `lr_decay` is outside `(0, 1)`, or if
	/// `error_threshold` is negative or NaN.
	pub fn validate(&self) -> Result<()> {
		let invalid = |field, value, reason| Err(WordPredError::InvalidTrainingConfig { field, value, reason });

		if !(self.base_learning_rate.is_finite() && self.base_learning_rate > 0.0) {
			return invalid("baseLearningRate", self.base_learning_rate, "must be a positive finite number");
		}
		if !(self.lr_decay > 0.0 && self.lr_decay < 1.0) {
			return invalid("lrDecay", self.lr_decay, "must be in (0, 1)");
		}
		if self.error_threshold.is_nan() || self.error_threshold < 0.0 {
			return invalid("errorThreshold", self.error_threshold, "must be >= 0");
		}
		Ok(())
	}
}

/// Serde helper for `f64` values that may be NaN or infinite.
///
/// JSON has no literal for them, so they are written as the strings `"NaN"`,
/// `"Infinity"` and `"-Infinity"`. Finite values stay plain numbers.
mod non_finite {
	use serde::{Deserialize, Deserializer, Serializer, de};

	const NAN: &str = "NaN";
	const INFINITY: &str = "Infinity";
	const NEG_INFINITY: &str = "-Infinity";

	pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
		if value.is_nan() {
			serializer.serialize_str(NAN)
		} else if *value == f64::INFINITY {
			serializer.serialize_str(INFINITY)
		} else if *value == f64::NEG_INFINITY {
			serializer.serialize_str(NEG_INFINITY)
		} else {
			serializer.serialize_f64(*value)
		}
	}

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Repr {
		Number(f64),
		Text(String),
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
		match Repr::deserialize(deserializer)? {
			Repr::Number(value) => Ok(value),
			Repr::Text(text) => match text.as_str() {
				NAN => Ok(f64::NAN),
				INFINITY => Ok(f64::INFINITY),
				NEG_INFINITY => Ok(f64::NEG_INFINITY),
				other => Err(de::Error::invalid_value(de::Unexpected::Str(other), &"a number, NaN or Infinity")),
			},
		}
	}
}

/// Parameters handed to the trainer for one attempt.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptParams {
	pub attempt: usize,
	pub learning_rate: f64,
	pub iterations: usize,
	pub error_threshold: f64,
}

/// Progress reported by the trainer after an epoch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EpochStats {
	pub iterations: usize,
	#[serde(with = "non_finite")]
	pub error: f64,
}

/// Final figures of a completed training.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainingResult {
	#[serde(with = "non_finite")]
	pub error: f64,
	pub iterations: usize,
}

/// A trained model with its final figures.
#[derive(Debug)]
pub struct Trained<M> {
	pub model: M,
	pub result: TrainingResult,
}

/// External sequence-model trainer.
///
/// Implementations must call `on_epoch` after every epoch and stop as soon as
/// it returns `ControlFlow::Break`. Parameter initialisation must draw from
/// `rng` only, so an attempt is reproducible from its seed.
pub trait SequenceTrainer {
	type Model;

	fn train(
		&mut self,
		params: &AttemptParams,
		rng: &mut Mulberry32,
		on_epoch: &mut dyn FnMut(&EpochStats) -> ControlFlow<()>,
	) -> std::result::Result<Trained<Self::Model>, String>;
}

/// Why an attempt did not produce a usable model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttemptFailure {
	#[error("Training became non-finite at iteration {iterations} (error={error})")]
	NonFinite {
		iterations: usize,
		#[serde(with = "non_finite")]
		error: f64,
	},

	#[error("Training finished with non-finite final error ({error})")]
	NonFiniteFinal {
		#[serde(with = "non_finite")]
		error: f64,
	},

	#[error("Trainer failed: {message}")]
	Trainer { message: String },
}

/// Diagnostics of one attempt, kept whatever its outcome.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingAttempt {
	/// 0-based attempt index, so `learning_rate = base * decay^attempt`.
	///
	/// Logs number attempts from 1; the persisted value does not.
	pub attempt: usize,
	pub learning_rate: f64,
	pub result: Option<TrainingResult>,
	pub failure: Option<AttemptFailure>,
	pub training_stats: Vec<EpochStats>,
}

/// How a training run ended.
#[derive(Debug)]
pub enum TrainingOutcome<M> {
	/// `attempt` produced a model with a finite final error.
	Stable { attempt: usize, learning_rate: f64, result: TrainingResult, model: M },
	/// Every attempt failed; nothing may be persisted.
	Crashed,
}

/// Result of a full training run: every attempt plus the outcome.
#[derive(Debug)]
pub struct TrainingRun<M> {
	pub attempts: Vec<TrainingAttempt>,
	pub outcome: TrainingOutcome<M>,
}

impl<M> TrainingRun<M> {
	pub fn is_crashed(&self) -> bool {
		matches!(self.outcome, TrainingOutcome::Crashed)
	}

	pub fn model(&self) -> Option<&M> {
		match &self.outcome {
			TrainingOutcome::Stable { model, .. } => Some(model),
			TrainingOutcome::Crashed => None,
		}
	}

	/// Takes the trained model.
	///
	/// # Errors
	/// Returns `Unstable` for a crashed run: a missing model means training
	/// could not be stabilised, never an empty result.
	pub fn into_model(self) -> Result<M> {
		match self.outcome {
			TrainingOutcome::Stable { model, .. } => Ok(model),
			TrainingOutcome::Crashed => Err(WordPredError::Unstable { attempts: self.attempts.len() }),
		}
	}

	/// Serializable summary of the run.
	pub fn report(&self, config: &TrainingConfig) -> TrainingReport {
		let (used_learning_rate, result) = match &self.outcome {
			TrainingOutcome::Stable { learning_rate, result, .. } => (Some(*learning_rate), Some(result.clone())),
			TrainingOutcome::Crashed => (None, None),
		};
		TrainingReport {
			params: config.clone(),
			used_learning_rate,
			crashed: self.is_crashed(),
			result,
			attempts: self.attempts.clone(),
		}
	}
}

/// Training diagnostics artifact.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
	pub params: TrainingConfig,
	pub used_learning_rate: Option<f64>,
	pub crashed: bool,
	pub result: Option<TrainingResult>,
	pub attempts: Vec<TrainingAttempt>,
}

/// Drives a trainer through at most `max_retries + 1` attempts.
///
/// # Behavior
/// - Attempt `i` uses `base_learning_rate * lr_decay^i` and a fresh RNG
///   seeded with `seed + i`
/// - The progress callback aborts the attempt on the first non-finite error
/// - Stops at the first attempt whose final error is finite
///
/// Never fails: instability and trainer errors are recorded in the attempts.
/// The config is expected to have passed [`TrainingConfig::validate`].
pub fn train_with_retries<T: SequenceTrainer>(trainer: &mut T, config: &TrainingConfig) -> TrainingRun<T::Model> {
	let mut attempts = Vec::with_capacity(config.max_retries + 1);
	let period = config.stats_period.max(1);

	for attempt in 0..=config.max_retries {
		let params = AttemptParams {
			attempt,
			learning_rate: config.learning_rate(attempt),
			iterations: config.iterations,
			error_threshold: config.error_threshold,
		};
		let mut rng = Mulberry32::new(config.seed.wrapping_add(attempt as u32));
		log::info!("Attempt {}/{} with learning_rate={}", attempt + 1, config.max_retries + 1, params.learning_rate);

		let mut training_stats = Vec::new();
		let mut unstable: Option<EpochStats> = None;
		let outcome = trainer.train(&params, &mut rng, &mut |stats: &EpochStats| {
			if !stats.error.is_finite() {
				training_stats.push(stats.clone());
				unstable = Some(stats.clone());
				return ControlFlow::Break(());
			}
			if stats.iterations % period == 0 {
				training_stats.push(stats.clone());
			}
			ControlFlow::Continue(())
		});

		let (result, failure, model) = match (unstable, outcome) {
			(Some(stats), outcome) => (
				outcome.ok().map(|t| t.result),
				Some(AttemptFailure::NonFinite { iterations: stats.iterations, error: stats.error }),
				None,
			),
			(None, Err(message)) => (None, Some(AttemptFailure::Trainer { message }), None),
			(None, Ok(trained)) if !trained.result.error.is_finite() => {
				let error = trained.result.error;
				(Some(trained.result), Some(AttemptFailure::NonFiniteFinal { error }), None)
			}
			(None, Ok(trained)) => (Some(trained.result), None, Some(trained.model)),
		};

		if let Some(failure) = &failure {
			log::warn!("Attempt {} failed: {failure}", attempt + 1);
		}

		attempts.push(TrainingAttempt {
			attempt,
			learning_rate: params.learning_rate,
			result: result.clone(),
			failure,
			training_stats,
		});

		if let (Some(model), Some(result)) = (model, result) {
			log::info!("Attempt {} converged with error {}", attempt + 1, result.error);
			return TrainingRun {
				attempts,
				outcome: TrainingOutcome::Stable { attempt, learning_rate: params.learning_rate, result, model },
			};
		}
	}

	log::error!("Stopped after {} attempts due to training instability", attempts.len());
	TrainingRun { attempts, outcome: TrainingOutcome::Crashed }
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::{Rng, RngCore};

	/// Trainer whose error curve is scripted per attempt.
	struct ScriptedTrainer {
		/// Per attempt: errors reported epoch after epoch.
		curves: Vec<Vec<f64>>,
		seen: Vec<(AttemptParams, u32)>,
		epochs_run: Vec<usize>,
	}

	impl ScriptedTrainer {
		fn new(curves: Vec<Vec<f64>>) -> Self {
			Self { curves, seen: Vec::new(), epochs_run: Vec::new() }
		}
	}

	impl SequenceTrainer for ScriptedTrainer {
		type Model = usize;

		fn train(
			&mut self,
			params: &AttemptParams,
			rng: &mut Mulberry32,
			on_epoch: &mut dyn FnMut(&EpochStats) -> ControlFlow<()>,
		) -> std::result::Result<Trained<usize>, String> {
			self.seen.push((params.clone(), rng.clone().next_u32()));
			let curve = self.curves.get(params.attempt).cloned().unwrap_or_default();
			if curve.is_empty() {
				return Err("no data".to_owned());
			}

			let mut last = f64::NAN;
			let mut epochs = 0;
			for (i, error) in curve.iter().enumerate() {
				epochs += 1;
				last = *error;
				if on_epoch(&EpochStats { iterations: i + 1, error: *error }).is_break() {
					break;
				}
			}
			self.epochs_run.push(epochs);
			Ok(Trained { model: params.attempt, result: TrainingResult { error: last, iterations: epochs } })
		}
	}

	fn config(max_retries: usize) -> TrainingConfig {
		TrainingConfig { max_retries, stats_period: 1, ..TrainingConfig::default() }
	}

	#[test]
	fn first_stable_attempt_wins() {
		let mut trainer = ScriptedTrainer::new(vec![vec![0.5, 0.3], vec![0.9, 0.1]]);
		let run = train_with_retries(&mut trainer, &config(4));

		assert_eq!(run.attempts.len(), 1);
		assert!(!run.is_crashed());
		assert_eq!(run.model(), Some(&0));
		assert!(run.attempts[0].failure.is_none());
		assert_eq!(run.attempts[0].training_stats.len(), 2);
	}

	#[test]
	fn unstable_attempt_is_aborted_and_retried() {
		let mut trainer = ScriptedTrainer::new(vec![vec![0.5, f64::NAN, 0.2, 0.1], vec![0.4, 0.2]]);
		let run = train_with_retries(&mut trainer, &config(4));

		assert_eq!(trainer.epochs_run, vec![2, 2]);
		assert_eq!(run.attempts.len(), 2);
		assert!(matches!(run.attempts[0].failure, Some(AttemptFailure::NonFinite { iterations: 2, .. })));
		match &run.outcome {
			TrainingOutcome::Stable { attempt, learning_rate, result, model } => {
				assert_eq!(*attempt, 1);
				assert_eq!(*model, 1);
				assert!((learning_rate - 0.0005).abs() < 1e-12);
				assert_eq!(result.error, 0.2);
			}
			TrainingOutcome::Crashed => panic!("expected a stable run"),
		}
	}

	#[test]
	fn all_attempts_unstable_crashes() {
		let curves = vec![vec![f64::INFINITY]; 5];
		let mut trainer = ScriptedTrainer::new(curves);
		let run = train_with_retries(&mut trainer, &config(4));

		assert!(run.is_crashed());
		assert!(run.model().is_none());
		assert_eq!(run.attempts.len(), 5);
		for pair in run.attempts.windows(2) {
			assert!(pair[1].learning_rate < pair[0].learning_rate);
		}
		assert!(run.attempts.iter().all(|a| a.failure.is_some()));
		assert!(matches!(run.into_model(), Err(WordPredError::Unstable { attempts: 5 })));
	}

	#[test]
	fn trainer_errors_are_recorded() {
		let mut trainer = ScriptedTrainer::new(vec![vec![], vec![0.3]]);
		let run = train_with_retries(&mut trainer, &config(1));
		assert!(matches!(&run.attempts[0].failure, Some(AttemptFailure::Trainer { message }) if message == "no data"));
		assert_eq!(run.model(), Some(&1));
	}

	#[test]
	fn attempts_get_distinct_reproducible_seeds() {
		let curves = vec![vec![f64::NAN]; 3];
		let mut first = ScriptedTrainer::new(curves.clone());
		let mut second = ScriptedTrainer::new(curves);
		train_with_retries(&mut first, &config(2));
		train_with_retries(&mut second, &config(2));

		let draws: Vec<u32> = first.seen.iter().map(|(_, draw)| *draw).collect();
		assert_eq!(draws, second.seen.iter().map(|(_, draw)| *draw).collect::<Vec<_>>());
		assert_ne!(draws[0], draws[1]);
		assert_ne!(draws[1], draws[2]);

		let mut expected = Mulberry32::new(1234 + 2);
		assert_eq!(draws[2], expected.random::<u32>());
	}

	#[test]
	fn non_finite_final_error_fails_attempt() {
		struct LyingTrainer;
		impl SequenceTrainer for LyingTrainer {
			type Model = ();
			fn train(
				&mut self,
				_params: &AttemptParams,
				_rng: &mut Mulberry32,
				_on_epoch: &mut dyn FnMut(&EpochStats) -> ControlFlow<()>,
			) -> std::result::Result<Trained<()>, String> {
				Ok(Trained { model: (), result: TrainingResult { error: f64::NAN, iterations: 3 } })
			}
		}

		let run = train_with_retries(&mut LyingTrainer, &config(0));
		assert!(run.is_crashed());
		assert!(matches!(run.attempts[0].failure, Some(AttemptFailure::NonFiniteFinal { .. })));
	}

	#[test]
	fn report_serializes_attempts() {
		let mut trainer = ScriptedTrainer::new(vec![vec![f64::NAN], vec![0.1]]);
		let config = config(2);
		let run = train_with_retries(&mut trainer, &config);
		let json = serde_json::to_value(run.report(&config)).unwrap();

		assert_eq!(json["crashed"], false);
		assert_eq!(json["attempts"].as_array().unwrap().len(), 2);
		assert_eq!(json["attempts"][0]["failure"]["kind"], "nonFinite");
		assert_eq!(json["attempts"][1]["learningRate"], 0.0005);
		assert_eq!(json["params"]["maxRetries"], 2);
	}

	#[test]
	fn crashed_report_reads_back() {
		let mut trainer = ScriptedTrainer::new(vec![vec![0.4, f64::INFINITY], vec![f64::NAN]]);
		let config = config(1);
		let report = train_with_retries(&mut trainer, &config).report(&config);
		assert!(report.crashed);

		let json = serde_json::to_string(&report).unwrap();
		assert!(json.contains("\"Infinity\""));
		assert!(json.contains("\"NaN\""));

		let reloaded: TrainingReport = serde_json::from_str(&json).unwrap();
		assert_eq!(reloaded.attempts[0], report.attempts[0]);
		assert_eq!(reloaded.attempts[0].training_stats[0].error, 0.4);
		assert!(matches!(
			reloaded.attempts[1].failure,
			Some(AttemptFailure::NonFinite { iterations: 1, error }) if error.is_nan()
		));
	}

	#[test]
	fn unknown_error_text_is_rejected() {
		let json = r#"{"iterations":3,"error":"lots"}"#;
		assert!(serde_json::from_str::<EpochStats>(json).is_err());
		let stats: EpochStats = serde_json::from_str(r#"{"iterations":3,"error":"-Infinity"}"#).unwrap();
		assert_eq!(stats.error, f64::NEG_INFINITY);
	}

	#[test]
	fn validate_rejects_non_decreasing_rates() {
		assert!(TrainingConfig::default().validate().is_ok());
		for lr_decay in [1.0, 0.0, -0.5, 1.5, f64::NAN] {
			let config = TrainingConfig { lr_decay, ..TrainingConfig::default() };
			assert!(matches!(
				config.validate(),
				Err(WordPredError::InvalidTrainingConfig { field: "lrDecay", .. })
			));
		}
		for base_learning_rate in [0.0, -0.001, f64::INFINITY] {
			let config = TrainingConfig { base_learning_rate, ..TrainingConfig::default() };
			assert!(config.validate().is_err());
		}
		let config = TrainingConfig { error_threshold: -1.0, ..TrainingConfig::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn attempts_are_recorded_from_zero() {
		let mut trainer = ScriptedTrainer::new(vec![vec![f64::NAN]; 3]);
		let config = config(2);
		let run = train_with_retries(&mut trainer, &config);

		let indices: Vec<usize> = run.attempts.iter().map(|a| a.attempt).collect();
		assert_eq!(indices, vec![0, 1, 2]);
		for attempt in &run.attempts {
			assert_eq!(attempt.learning_rate, config.learning_rate(attempt.attempt));
		}
		assert_eq!(run.attempts[0].learning_rate, config.base_learning_rate);
	}

	#[test]
	fn stats_period_thins_out_epochs() {
		let mut trainer = ScriptedTrainer::new(vec![vec![0.9; 25]]);
		let config = TrainingConfig { stats_period: 10, ..TrainingConfig::default() };
		let run = train_with_retries(&mut trainer, &config);
		let kept: Vec<usize> = run.attempts[0].training_stats.iter().map(|s| s.iterations).collect();
		assert_eq!(kept, vec![10, 20]);
	}
}
