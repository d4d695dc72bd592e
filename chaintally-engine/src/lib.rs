//! Chaintally Analysis Engine
//!
//! Platform-agnostic core analysis for jumpchain save exports: purchase
//! classification, purpose-token milestone accounting, and age trajectories.
//! This crate performs no I/O; frontends hand it a parsed save document and
//! render the rows it returns.

pub mod age;
pub mod classify;
pub mod duration;
pub mod milestones;
pub mod numbers;
pub mod save;
pub mod session;

// Re-export commonly used types
pub use age::{AgeMode, AgeRow, AgeSummary, AgeTrajectory, age_trajectory};
pub use classify::{AltFormSource, CategoryTallies, EpisodeTallies, classify_purchases};
pub use duration::{ChainDuration, DurationText};
pub use milestones::{
    CategoryCell, CategoryTotal, GrandTotals, MilestoneReport, MilestoneRow, MilestoneRule,
    RewardCategory, RewardConfig, RewardConfigError, tally_milestones,
};
pub use save::{
    AltForm, ChainSave, Character, Jump, JumpOrder, MAIN_CHARACTER_ID, ParticipantSet, Purchase,
    PurchaseKind,
};
pub use session::ChainSession;
