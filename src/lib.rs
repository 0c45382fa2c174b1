// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shell command batch generation for backend chores.
//!
//! Rooomy generates shell command lines and whole batches of them for
//! recurring backend engineering chores: running `psql`, `pg_dump`, or
//! `pg_restore` against PostgreSQL databases, fetching files from AWS S3,
//! running Git operations over many objects, and expanding table driven test
//! contexts. The actual work is always delegated to the respective binaries.
//!
//! # Definitions
//!
//! Every generator reads its parameters out of __definitions__, i.e., nested
//! listings of values where any element may instead name a preset that
//! produces the value. Named presets live in a [`Registry`], which comes
//! loaded with built-in generators plus a few samples, and can be extended
//! through a [presets file](config::Presets).
//!
//! # Batches
//!
//! Generated batches are plain listings of command tuples. They are run
//! sequentially by a [`BatchRunner`], which records one result per command
//! into a [`ResultLog`] and halts once the admitted error count is exceeded.

pub mod batch;
pub mod config;
pub mod contexts;
pub mod definition;
pub mod generate;
pub mod json;
pub mod path;
pub mod rows;
pub mod shell;
pub mod strings;

pub use batch::{
    exec::{Execution, Executor, ShellExecutor},
    log::{ResultLog, ResultRecord},
    BatchController, BatchRunner, ResumeMode, RunState,
};
pub use definition::{Definition, Registry, Value};
pub use shell::{Batch, Command};
