//! Contains the building blocks the scheduler is made of.
//!
//! This module provides the records for timed actions (one-shot and repeating)
//! and the per-kind id allocator. The `Scheduler` owns collections of these
//! components and drives them from its tick evaluation.

pub mod action;
pub mod ids;
