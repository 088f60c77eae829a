//! # compaction
//!
//! Background file consolidation (§4.6): merges a table's registered
//! columnar files, drops tombstones once no deeper level can still need
//! them to shadow older data, and swaps the result into the catalog in one
//! atomic commit. Grounded on the teacher's `engine/src/compaction.rs` full
//! merge-and-replace pass, generalized from "merge everything into one L1
//! file" into a pluggable [`CompactionStrategy`] that selects a bounded
//! subset of files per `(table, level)` run.
//!
//! No inheritance tree (REDESIGN FLAGS): [`CompactionStrategy`] is a narrow
//! trait over `select`/`priority`, implemented independently by
//! [`SizeTiered`], [`Leveled`], [`TimeWindow`], and [`Adaptive`] (which
//! holds and periodically re-selects among the first three).

mod adaptive;
mod error;
mod executor;
mod leveled;
mod merge;
mod scheduler;
mod size_tiered;
mod strategy;
mod time_window;

pub use adaptive::Adaptive;
pub use error::CompactionError;
pub use executor::{run_compaction, CompactionPlan};
pub use leveled::Leveled;
pub use merge::{merge_inputs, MergedRun};
pub use scheduler::{pick_for_tick, rank_candidates, Candidate, GraceQueue};
pub use size_tiered::SizeTiered;
pub use strategy::{CompactionStrategy, LevelView};
pub use time_window::TimeWindow;

pub type CompactionResult<T> = Result<T, CompactionError>;

#[cfg(test)]
mod tests;
