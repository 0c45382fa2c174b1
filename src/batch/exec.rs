// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Per-command execution strategies.
//!
//! An [`Executor`] runs exactly one command tuple and reports whether it
//! succeeded along with whatever it printed. Executors never raise errors for
//! failing commands. A command that cannot even be spawned is reported as a
//! failed execution.
//!
//! Two strategies are provided:
//!
//! - [`ShellExecutor`]: spawn `sh -c <rendered command>` with stderr merged
//!   into stdout.
//! - [`ConnectionExecutor`]: invoke a named call on a held [`Connection`].

use crate::shell::Command;

use git2::{build::CheckoutBuilder, BranchType, Repository};
use std::{
    fmt::Display,
    path::{Path, PathBuf},
    process::Command as Process,
};
use tracing::{debug, instrument, warn};

/// Outcome of running one command.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Execution {
    pub success: bool,
    pub output: String,
}

impl Execution {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Strategy that runs a single command tuple.
pub trait Executor {
    fn execute(&mut self, command: &Command) -> Execution;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, command: &Command) -> Execution {
        (**self).execute(command)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&mut self, command: &Command) -> Execution {
        (**self).execute(command)
    }
}

/// Executor out of a plain closure.
pub struct FnExecutor<F>(pub F);

impl<F> Executor for FnExecutor<F>
where
    F: FnMut(&Command) -> Execution,
{
    fn execute(&mut self, command: &Command) -> Execution {
        (self.0)(command)
    }
}

/// Run commands through `sh -c`.
#[derive(Default, Debug, Clone)]
pub struct ShellExecutor {
    shell: Option<String>,
    current_dir: Option<PathBuf>,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another POSIX shell instead of `sh`.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Run every command inside given directory.
    pub fn with_current_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(path.into());
        self
    }
}

impl Executor for ShellExecutor {
    #[instrument(skip(self, command), level = "debug")]
    fn execute(&mut self, command: &Command) -> Execution {
        let rendered = command.render();
        let mut process = Process::new(self.shell.as_deref().unwrap_or("sh"));

        // INVARIANT: Merge stderr into stdout so output stays in the order it was printed.
        process.arg("-c").arg(format!("exec 2>&1; {rendered}"));
        if let Some(path) = &self.current_dir {
            process.current_dir(path);
        }

        debug!("run {rendered:?}");
        let output = match process.output() {
            Ok(output) => output,
            Err(error) => {
                warn!("cannot spawn {rendered:?}: {error}");
                return Execution::failure(error.to_string());
            }
        };

        let mut message = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
        message.push_str(String::from_utf8_lossy(output.stderr.as_slice()).as_ref());

        Execution {
            success: output.status.success(),
            output: chomp(message),
        }
    }
}

fn chomp(message: String) -> String {
    // INVARIANT: Chomp trailing newlines.
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}

/// Connection-like object offering named calls.
pub trait Connection {
    type Error: Display;

    /// Invoke named call with positional arguments.
    fn call(&mut self, name: &str, args: &[String]) -> Result<String, Self::Error>;
}

/// Run commands as named calls on a held connection.
///
/// The call name of a command tuple is the connection call to invoke, and
/// its arguments are passed through unchanged. A call succeeds iff it
/// returns [`Ok`]. The error message of a failed call becomes the output.
#[derive(Debug)]
pub struct ConnectionExecutor<C> {
    connection: C,
}

impl<C: Connection> ConnectionExecutor<C> {
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn into_inner(self) -> C {
        self.connection
    }
}

impl<C: Connection> Executor for ConnectionExecutor<C> {
    #[instrument(skip(self, command), level = "debug")]
    fn execute(&mut self, command: &Command) -> Execution {
        debug!("call {:?} with {:?}", command.call(), command.arguments());
        match self.connection.call(command.call(), command.arguments()) {
            Ok(output) => Execution::success(output),
            Err(error) => Execution::failure(error.to_string()),
        }
    }
}

/// Connection to a Git repository through libgit2.
///
/// Offers the calls `current-branch`, `checkout <branch>`,
/// `branch [<name> [<start>]]`, `rev-parse <spec>`, and `show <spec>`.
pub struct GitConnection {
    repository: Repository,
}

impl GitConnection {
    /// Open repository at path, or any of its parents.
    ///
    /// # Errors
    ///
    /// - Return [`git2::Error`] if no repository can be found.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, git2::Error> {
        Ok(Self {
            repository: Repository::discover(path.as_ref())?,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn current_branch(&self) -> Result<String, git2::Error> {
        let head = self.repository.head()?;
        if !head.is_branch() {
            return Err(git2::Error::from_str("HEAD does not point to a branch"));
        }

        head.shorthand()
            .map(ToString::to_string)
            .ok_or_else(|| git2::Error::from_str("branch name is not valid UTF-8"))
    }

    fn checkout(&self, branch: &str) -> Result<String, git2::Error> {
        let reference = self
            .repository
            .find_branch(branch, BranchType::Local)?
            .into_reference();
        let refname = reference
            .name()
            .ok_or_else(|| git2::Error::from_str("reference name is not valid UTF-8"))?
            .to_owned();
        let tree = reference.peel_to_tree()?;

        self.repository
            .checkout_tree(tree.as_object(), Some(CheckoutBuilder::new().safe()))?;
        self.repository.set_head(refname.as_str())?;

        Ok(format!("Switched to branch '{branch}'"))
    }

    fn branch(&self, name: Option<&String>, start: Option<&String>) -> Result<String, git2::Error> {
        let Some(name) = name else {
            let current = self.current_branch().ok();
            let mut lines = Vec::new();
            for branch in self.repository.branches(Some(BranchType::Local))? {
                let (branch, _) = branch?;
                let Some(name) = branch.name()? else {
                    continue;
                };
                let marker = if current.as_deref() == Some(name) { "*" } else { " " };
                lines.push(format!("{marker} {name}"));
            }
            return Ok(lines.join("\n"));
        };

        let start = start.map(String::as_str).unwrap_or("HEAD");
        let commit = self.repository.revparse_single(start)?.peel_to_commit()?;
        self.repository.branch(name, &commit, false)?;

        Ok(String::new())
    }

    fn rev_parse(&self, spec: &str) -> Result<String, git2::Error> {
        Ok(self.repository.revparse_single(spec)?.id().to_string())
    }

    fn show(&self, spec: &str) -> Result<String, git2::Error> {
        let commit = self.repository.revparse_single(spec)?.peel_to_commit()?;
        let author = commit.author();
        Ok(format!(
            "commit {}\nAuthor: {} <{}>\n\n    {}",
            commit.id(),
            author.name().unwrap_or_default(),
            author.email().unwrap_or_default(),
            commit.summary().unwrap_or_default(),
        ))
    }
}

impl Connection for GitConnection {
    type Error = git2::Error;

    #[instrument(skip(self, args), level = "debug")]
    fn call(&mut self, name: &str, args: &[String]) -> Result<String, Self::Error> {
        let required = |index: usize| {
            args.get(index)
                .map(String::as_str)
                .ok_or_else(|| git2::Error::from_str(format!("{name} needs argument {}", index + 1).as_str()))
        };

        match name {
            "current-branch" => self.current_branch(),
            "checkout" => self.checkout(required(0)?),
            "branch" => self.branch(args.first(), args.get(1)),
            "rev-parse" => self.rev_parse(required(0)?),
            "show" => self.show(args.first().map(String::as_str).unwrap_or("HEAD")),
            name => Err(git2::Error::from_str(format!("unknown git call {name:?}").as_str())),
        }
    }
}
