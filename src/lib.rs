//! doctriage
//!
//! Classification-and-organization pipeline for scanned office PDF forms:
//! - a layered text acquisition chain (direct extraction with OCR fallback),
//! - a model-backed classifier with a forgiving free-text reply parser,
//! - a sequential, rate-limited batch orchestrator with per-item isolation,
//! - a deterministic file organizer (category folders, per-category
//!   numbering, duplicate-name resolution, run statistics).

pub mod ai;
pub mod classify;
pub mod extract;
pub mod organize;
pub mod taxonomy;
