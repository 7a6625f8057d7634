// src/engine/mod.rs

//! Orchestration engine for parrun.
//!
//! The [`Orchestrator`] starts one [`crate::exec::ProcessRunner`] per program,
//! shares a single [`crate::gate::OutputGate`] between them and folds their
//! exits into one aggregate result.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
