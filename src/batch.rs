// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Sequential batch execution.
//!
//! A [`BatchRunner`] walks a batch in order, handing every command tuple to
//! an [`Executor`] and appending exactly one [`ResultRecord`] per command to
//! a caller owned [`ResultLog`]. Failing commands never raise errors. They
//! only count against the runner's error threshold.
//!
//! # Halting
//!
//! The runner starts out [`RunState::Running`]. After each command, if the
//! number of failures seen during the current invocation __exceeds__ the
//! admitted error count, the runner transitions to [`RunState::Halted`] and
//! stops. Commands after the halting failure stay behind as the working
//! batch. An unset admitted error count never halts.
//!
//! # Resuming
//!
//! A halted runner can be resumed through [`BatchRunner::resume`]. Resuming
//! either skips the halting command, or retries it before continuing with the
//! working batch. Every invocation starts with a fresh error counter.

pub mod exec;
pub mod log;

use crate::{
    batch::{
        exec::{Executor, ShellExecutor},
        log::{ResultLog, ResultRecord},
    },
    shell::{Batch, Command},
};

use std::collections::VecDeque;
use tracing::{debug, info, instrument, warn};

/// Error tolerance plus execution strategy of batch runs.
#[derive(Default, Debug, Clone)]
pub struct BatchController<E> {
    /// Failures tolerated before halting. [`None`] means unlimited.
    pub admitted_errors: Option<usize>,

    pub executor: E,
}

impl<E: Executor> BatchController<E> {
    pub fn new(executor: E) -> Self {
        Self {
            admitted_errors: None,
            executor,
        }
    }

    pub fn with_admitted_errors(mut self, admitted_errors: impl Into<Option<usize>>) -> Self {
        self.admitted_errors = admitted_errors.into();
        self
    }
}

impl BatchController<ShellExecutor> {
    /// Unlimited errors through the shell.
    pub fn shell() -> Self {
        Self::new(ShellExecutor::new())
    }
}

/// State of batch runner.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub enum RunState {
    #[default]
    Running,
    Halted,
}

/// How to continue a halted run.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub enum ResumeMode {
    /// Continue right after the halting command.
    #[default]
    Skip,

    /// Run the halting command again before continuing.
    Retry,
}

/// Runs batches, retaining whatever remains after a halt.
#[derive(Debug)]
pub struct BatchRunner<E> {
    controller: BatchController<E>,
    state: RunState,
    working: VecDeque<Command>,
    halted_on: Option<Command>,
}

impl<E: Executor> BatchRunner<E> {
    pub fn new(controller: BatchController<E>) -> Self {
        Self {
            controller,
            state: RunState::default(),
            working: VecDeque::new(),
            halted_on: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Commands that have not run yet.
    pub fn working_batch(&self) -> Batch {
        self.working.iter().cloned().collect()
    }

    /// Command whose failure halted the last invocation.
    pub fn halted_on(&self) -> Option<&Command> {
        self.halted_on.as_ref()
    }

    pub fn controller(&self) -> &BatchController<E> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut BatchController<E> {
        &mut self.controller
    }

    /// Run whole batch, replacing any retained working batch.
    ///
    /// Returns the records produced during this invocation only. The same
    /// records are appended to the result log.
    #[instrument(skip(self, batch, log), level = "debug")]
    pub fn run(&mut self, batch: Batch, log: &mut ResultLog) -> Vec<ResultRecord> {
        if !self.working.is_empty() {
            warn!("drop {} unexecuted command(s) of previous batch", self.working.len());
        }

        self.working = batch.into_iter().collect();
        self.halted_on = None;
        self.drain(log)
    }

    /// Continue with retained working batch.
    ///
    /// Does nothing when there is nothing left to run.
    #[instrument(skip(self, log), level = "debug")]
    pub fn resume(&mut self, mode: ResumeMode, log: &mut ResultLog) -> Vec<ResultRecord> {
        let halted_on = self.halted_on.take();
        if let (ResumeMode::Retry, Some(command)) = (mode, halted_on) {
            debug!("retry {:?}", command.render());
            self.working.push_front(command);
        }

        self.drain(log)
    }

    fn drain(&mut self, log: &mut ResultLog) -> Vec<ResultRecord> {
        let start = log.len();
        let mut errors = 0;
        self.state = RunState::Running;

        while let Some(command) = self.working.pop_front() {
            let execution = self.controller.executor.execute(&command);
            let record = ResultRecord::new(&command, execution.success, execution.output);
            log.push(record);

            if execution.success {
                continue;
            }

            errors += 1;
            warn!("command failed ({errors} error(s)): {:?}", command.render());

            // INVARIANT: Halt strictly after exceeding admitted errors.
            if self.controller.admitted_errors.is_some_and(|admitted| errors > admitted) {
                info!(
                    "halt after {errors} error(s), {} command(s) left",
                    self.working.len()
                );
                self.state = RunState::Halted;
                self.halted_on = Some(command);
                break;
            }
        }

        log.since(start).to_vec()
    }
}

/// Run batch once through a throwaway runner.
pub fn execute<E: Executor>(
    batch: Batch,
    controller: BatchController<E>,
    log: &mut ResultLog,
) -> Vec<ResultRecord> {
    BatchRunner::new(controller).run(batch, log)
}
