// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the requested programs,
//! using `tokio::process::Command`, and routing their captured output to the
//! shared console through the output gate.
//!
//! - [`runner`] spawns a single program and owns its output pumps.
//! - [`tagger`] prefixes captured chunks.
//! - [`sink`] provides the `OutputSink` trait and the real `StdioSink`;
//!   tests can replace it with a recording implementation.
//! - [`child_args`] defines where forwarded arguments come from and how they
//!   are merged into each program's own arguments.

pub mod child_args;
pub mod runner;
pub mod sink;
pub mod tagger;

pub use child_args::{merge_child_args, ChildArg, ChildArgSource, StaticArgs};
pub use runner::{ProcessRunner, RunReport};
pub use sink::{OutputSink, StdioSink};
pub use tagger::{tag, LineTagger};
