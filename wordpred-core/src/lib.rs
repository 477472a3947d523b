//! Hybrid next-word prediction library.
//!
//! This crate provides the word-prediction pipeline of an assistive
//! communication tool, including:
//! - Language-aware corpus normalization and deterministic splitting
//! - A multi-order n-gram backoff model
//! - A bounded-retry stability controller for an external sequence-model trainer
//! - Fusion of sequence-model continuations with backoff candidates
//! - Category-aware reranking of the fused suggestions
//!
//! The sequence model and the category classifier are external collaborators,
//! consumed through the traits in [`model::sequence`].

/// Workspace-wide error type.
pub mod error;

/// Deterministic seeded random stream.
pub mod rng;

/// Text cleaning, tokenization, corpus preparation and splitting.
pub mod text;

/// Backoff model, fusion, reranking and evaluation.
pub mod model;

/// Training stability controller.
pub mod training;

/// Pipeline configuration with per-language defaults.
pub mod config;

/// I/O utilities (file loading, artifact paths, JSON helpers).
pub mod io;

pub use error::{Result, WordPredError};
