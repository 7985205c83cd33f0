// src/pipeline/mod.rs

//! Orchestration layered on top of the scraping services.

pub mod assemble;
pub mod schedule;

pub use assemble::assemble_schedule;
pub use schedule::{SchedulePipeline, ScheduleOutcome};
