// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git command batches.
//!
//! Expand Git subcommands over a listing of object ids, i.e., commit SHAs,
//! branch names, tags, etc. Every `(subcommand, options)` pair is combined
//! with every object id, producing one `git <subcommand> <options> <id>`
//! command tuple per combination. Object ids and branch names are shell
//! escaped, options are passed through as written.

use crate::{
    definition::{Registry, Value},
    generate::{Fields, GenerateError, Result},
    shell::{escape, Batch, Command},
};

use git2::Repository;
use std::path::Path;
use tracing::{debug, instrument};

/// Git subcommand with its options.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct GitCommand {
    pub subcommand: String,
    pub options: String,
}

impl GitCommand {
    pub fn new(subcommand: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            subcommand: subcommand.into(),
            options: options.into(),
        }
    }

    /// Read `[subcommand, options]` pair out of its definition form.
    pub fn from_value(registry: &Registry, value: &Value) -> Result<Self> {
        let fields = Fields::resolve(registry, value, "git_command");
        Ok(Self {
            subcommand: fields.text(0, "subcommand")?,
            options: fields.opt_text(1, "options")?.unwrap_or_default(),
        })
    }

    /// Read either one pair, or a listing of pairs.
    pub fn many_from_value(registry: &Registry, value: &Value) -> Result<Vec<Self>> {
        let resolved = registry.resolve(value);
        match resolved.first() {
            Some(Value::List(_)) => resolved
                .iter()
                .map(|pair| Self::from_value(registry, pair))
                .collect(),
            Some(_) => Ok(vec![Self::from_value(registry, &Value::List(resolved))?]),
            None => Err(GenerateError::MissingField {
                what: "git_command",
                field: "subcommand",
            }),
        }
    }

    /// Command tuple targeting given object id.
    pub fn on_object(&self, object_id: impl AsRef<str>) -> Command {
        Command::new("git")
            .arg(self.subcommand.as_str())
            .arg(self.options.as_str())
            .arg(escape(object_id))
    }
}

/// Expand every command over every object id.
pub fn on_objects(commands: &[GitCommand], object_ids: &[impl AsRef<str>]) -> Batch {
    commands
        .iter()
        .flat_map(|command| object_ids.iter().map(|object_id| command.on_object(object_id)))
        .collect()
}

/// Run operation against a remote while operand branch is checked out.
///
/// Checks out operand branch, runs `git <operation> <remote> <operand>`, then
/// checks out the branch that was current before. This pulls, or pushes, the
/// operand branch into itself rather than into the current branch.
pub fn on_operand_branch(
    operation: impl AsRef<str>,
    operand_branch: impl AsRef<str>,
    remote: impl AsRef<str>,
    current_branch: impl AsRef<str>,
) -> Batch {
    let operand_branch = escape(operand_branch);
    Batch::from(vec![
        Command::new("git").arg("checkout").arg(operand_branch.as_str()),
        Command::new("git")
            .arg(operation.as_ref())
            .arg(escape(remote))
            .arg(operand_branch.as_str()),
        Command::new("git").arg("checkout").arg(escape(current_branch)),
    ])
}

/// Name of branch that HEAD currently points to.
///
/// # Errors
///
/// - Return [`GenerateError::Git2`] if repository cannot be opened, or HEAD
///   is detached or unborn.
#[instrument(skip(path), level = "debug")]
pub fn current_branch(path: impl AsRef<Path>) -> Result<String> {
    let repository = Repository::discover(path.as_ref())?;
    let head = repository.head()?;
    if !head.is_branch() {
        return Err(git2::Error::from_str("HEAD does not point to a branch").into());
    }

    let branch = head
        .shorthand()
        .ok_or_else(|| git2::Error::from_str("branch name is not valid UTF-8"))?
        .to_owned();
    debug!("current branch of {:?} is {branch:?}", repository.path().display());

    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn on_objects_is_commands_times_targets() {
        let commands = [GitCommand::new("show", "--stat"), GitCommand::new("branch", "")];
        let batch = on_objects(&commands, &["abc123", "main"]);
        assert_eq!(
            batch.render(),
            vec![
                "git show --stat abc123",
                "git show --stat main",
                "git branch abc123",
                "git branch main",
            ]
        );

        assert!(on_objects(&commands, &Vec::<String>::new()).is_empty());
    }

    #[test]
    fn on_operand_branch_returns_to_current() {
        let batch = on_operand_branch("pull", "release", "origin", "main");
        assert_eq!(
            batch.render(),
            vec!["git checkout release", "git pull origin release", "git checkout main"]
        );
    }

    #[test]
    fn user_supplied_names_are_escaped() {
        let commands = [GitCommand::new("show", "--stat")];
        let batch = on_objects(&commands, &["my tag", "HEAD~1", "feature/x"]);
        assert_eq!(
            batch.render(),
            vec![r"git show --stat my\ tag", r"git show --stat HEAD\~1", "git show --stat feature/x"]
        );

        let batch = on_operand_branch("push", "wip; rm -rf", "origin", "main");
        assert_eq!(
            batch.render(),
            vec![
                r"git checkout wip\;\ rm\ -rf",
                r"git push origin wip\;\ rm\ -rf",
                "git checkout main",
            ]
        );
    }

    #[test]
    fn many_from_value_accepts_single_pair() -> anyhow::Result<()> {
        let registry = Registry::empty();

        let single = GitCommand::many_from_value(&registry, &Value::list(["log", "-1"]))?;
        assert_eq!(single, vec![GitCommand::new("log", "-1")]);

        let many = Value::list([Value::list(["log", "-1"]), Value::list(["show"])]);
        let many = GitCommand::many_from_value(&registry, &many)?;
        assert_eq!(many, vec![GitCommand::new("log", "-1"), GitCommand::new("show", "")]);

        Ok(())
    }
}
