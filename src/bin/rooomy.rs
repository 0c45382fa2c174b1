// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use rooomy::{
    batch::{
        exec::{Execution, Executor, ShellExecutor},
        log::ResultLog,
        BatchController, BatchRunner, ResumeMode, RunState,
    },
    config::Presets,
    contexts,
    definition::{Registry, Value},
    generate::{git, sql},
    json,
    path::default_presets_path,
    shell::{Batch, Command as CommandTuple},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Select};
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "rooomy [options] <rooomy-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to presets file to use instead of the default one.
    #[arg(short, long, global = true, value_name = "path")]
    pub presets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let registry = load_registry(self.presets.clone())?;
        match self.command {
            Command::List(opts) => run_list(&registry, opts),
            Command::Show(opts) => run_show(&registry, opts),
            Command::Batch(opts) => run_batch(&registry, opts),
            Command::Exec(opts) => run_exec(&registry, opts),
            Command::Contexts(opts) => run_contexts(self.presets, opts),
            Command::Git(opts) => run_git(opts),
            Command::Branch(opts) => run_branch(opts),
            Command::Sql(opts) => run_sql(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List names of presets, or of batch generators.
    #[command(override_usage = "rooomy list [options]")]
    List(ListOptions),

    /// Show what definition resolves to.
    #[command(override_usage = "rooomy show [options] <definition>...")]
    Show(ShowOptions),

    /// Print batch of batch generator definition without running it.
    #[command(override_usage = "rooomy batch [options] <generator> [<argument>]...")]
    Batch(BatchOptions),

    /// Run batch of batch generator definition through the shell.
    #[command(override_usage = "rooomy exec [options] <generator> [<argument>]...")]
    Exec(ExecOptions),

    /// Expand named test context templates.
    #[command(override_usage = "rooomy contexts [options] <name>")]
    Contexts(ContextsOptions),

    /// Print Git subcommand expanded over object ids.
    #[command(override_usage = "rooomy git [options] <subcommand> <object_id>...")]
    Git(GitOptions),

    /// Print batch that pulls or pushes another branch into itself.
    #[command(override_usage = "rooomy branch [options] <operation> <operand_branch>")]
    Branch(BranchOptions),

    /// Compose SQL statements.
    #[command(subcommand)]
    Sql(SqlCommand),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ListOptions {
    /// List batch generators instead of presets.
    #[arg(short, long)]
    pub generators: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ShowOptions {
    /// Definition to resolve, where `:name` references a preset.
    #[arg(required = true, value_name = "definition")]
    pub definition: Vec<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BatchOptions {
    /// Batch generator definition, where `:name` references a preset.
    #[arg(required = true, value_name = "definition")]
    pub definition: Vec<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ExecOptions {
    /// Batch generator definition, where `:name` references a preset.
    #[arg(required = true, value_name = "definition")]
    pub definition: Vec<String>,

    /// Failures to tolerate before halting, unlimited if not given.
    #[arg(short, long, value_name = "count")]
    pub admitted_errors: Option<usize>,

    /// Run without asking for confirmation, never resume after halting.
    #[arg(short, long)]
    pub yes: bool,

    /// Write result log as JSON into file.
    #[arg(short, long, value_name = "path")]
    pub results: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ContextsOptions {
    /// Name of context templates in presets file, or "sample".
    #[arg(required = true, value_name = "name")]
    pub name: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct GitOptions {
    /// Git subcommand to run on every object.
    #[arg(required = true, value_name = "subcommand")]
    pub subcommand: String,

    /// Commit SHAs, branch names, tags, etc.
    #[arg(required = true, value_name = "object_id")]
    pub object_ids: Vec<String>,

    /// Options to pass to Git subcommand.
    #[arg(short, long, value_name = "options", allow_hyphen_values = true, default_value = "")]
    pub options: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BranchOptions {
    /// Git operation to perform against remote, e.g., pull or push.
    #[arg(required = true, value_name = "operation")]
    pub operation: String,

    /// Branch to check out while performing operation.
    #[arg(required = true, value_name = "operand_branch")]
    pub operand_branch: String,

    /// Remote to perform operation against.
    #[arg(short, long, value_name = "remote", default_value = "origin")]
    pub remote: String,

    /// Path into repository.
    #[arg(short = 'C', long, value_name = "path", default_value = ".")]
    pub repository: PathBuf,
}

#[derive(Debug, Clone, Subcommand)]
enum SqlCommand {
    /// Render WHERE clause out of JSON condition listing.
    #[command(override_usage = "rooomy sql where <conditions>")]
    Where(SqlWhereOptions),

    /// Render SELECT statement.
    #[command(override_usage = "rooomy sql select [options] <table>")]
    Select(SqlSelectOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SqlWhereOptions {
    /// JSON condition listing, e.g., '[[["A", "B"], "="]]'.
    #[arg(required = true, value_name = "conditions")]
    pub conditions: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SqlSelectOptions {
    /// Table to select from.
    #[arg(required = true, value_name = "table")]
    pub table: String,

    /// Columns to select, all of them if not given.
    #[arg(short, long, value_name = "column")]
    pub columns: Vec<String>,

    /// JSON condition listing.
    #[arg(short = 'w', long = "where", value_name = "conditions")]
    pub conditions: Option<String>,
}

/// Advance progress bar after every executed command.
struct ProgressExecutor<E> {
    executor: E,
    bar: ProgressBar,
}

impl<E: Executor> ProgressExecutor<E> {
    fn new(executor: E, length: usize) -> Result<Self> {
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}] {pos}/{len}",
        )?
        .progress_chars("-Cco.");
        let bar = ProgressBar::new(length as u64);
        bar.set_style(style);

        Ok(Self { executor, bar })
    }

    /// Account for the halting command running again.
    fn grow_for(&self, mode: ResumeMode) {
        if mode == ResumeMode::Retry {
            self.bar.inc_length(1);
        }
    }
}

impl<E: Executor> Executor for ProgressExecutor<E> {
    fn execute(&mut self, command: &CommandTuple) -> Execution {
        self.bar.set_message(command.render());
        let execution = self.executor.execute(command);
        if !execution.success {
            self.bar.suspend(|| warn!("{}", execution.output));
        }
        self.bar.inc(1);

        execution
    }
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn load_registry(presets: Option<PathBuf>) -> Result<Registry> {
    let mut registry = Registry::new();
    load_presets(presets)?.register(&mut registry);

    Ok(registry)
}

fn load_presets(presets: Option<PathBuf>) -> Result<Presets> {
    let path = match presets {
        Some(path) => path,
        None => default_presets_path()?,
    };

    Ok(Presets::load(path)?)
}

fn print_batch(batch: &Batch) {
    for command in batch {
        println!("{command}");
    }
}

fn run_list(registry: &Registry, opts: ListOptions) -> Result<()> {
    if opts.generators {
        registry.generator_names().for_each(|name| println!("{name}"));
    } else {
        registry.preset_names().for_each(|name| println!("{name}"));
    }

    Ok(())
}

fn run_show(registry: &Registry, opts: ShowOptions) -> Result<()> {
    let resolved = registry.resolve(&Value::from_args(&opts.definition));
    println!("{}", json::pretty(&resolved)?);

    Ok(())
}

fn run_batch(registry: &Registry, opts: BatchOptions) -> Result<()> {
    let batch = registry.batch_from_generator(&Value::from_args(&opts.definition))?;
    print_batch(&batch);

    Ok(())
}

fn run_exec(registry: &Registry, opts: ExecOptions) -> Result<()> {
    let batch = registry.batch_from_generator(&Value::from_args(&opts.definition))?;
    if batch.is_empty() {
        info!("nothing to run");
        return Ok(());
    }

    for command in &batch {
        info!("{command}");
    }

    if !opts.yes {
        let proceed = Confirm::new(format!("run {} command(s)?", batch.len()).as_str())
            .with_default(false)
            .prompt()?;
        if !proceed {
            info!("abort");
            return Ok(());
        }
    }

    let executor = ProgressExecutor::new(ShellExecutor::new(), batch.len())?;
    let controller = BatchController::new(executor).with_admitted_errors(opts.admitted_errors);
    let mut runner = BatchRunner::new(controller);
    let mut log = ResultLog::new();

    runner.run(batch, &mut log);
    while runner.state() == RunState::Halted && !opts.yes {
        let choice = Select::new("batch halted, how to continue?", vec!["retry", "skip", "stop"]).prompt()?;
        let mode = match choice {
            "retry" => ResumeMode::Retry,
            "skip" => ResumeMode::Skip,
            _ => break,
        };
        runner.controller().executor.grow_for(mode);
        runner.resume(mode, &mut log);
    }
    runner.controller().executor.bar.finish_and_clear();

    if let Some(path) = opts.results {
        log.write_json(path)?;
    }

    info!("{} command(s) run, {} failed", log.len(), log.failures());
    if runner.state() == RunState::Halted {
        bail!(
            "batch halted on {:?} with {} command(s) left",
            runner.halted_on().map(CommandTuple::render).unwrap_or_default(),
            runner.working_batch().len()
        );
    }

    Ok(())
}

fn run_contexts(presets: Option<PathBuf>, opts: ContextsOptions) -> Result<()> {
    let presets = load_presets(presets)?;
    let expanded = match opts.name.as_str() {
        "sample" if !presets.contexts.contains_key("sample") => contexts::expand(&contexts::sample()),
        name => presets.expand_contexts(name)?,
    };
    println!("{}", json::pretty(&expanded)?);

    Ok(())
}

fn run_git(opts: GitOptions) -> Result<()> {
    let commands = [git::GitCommand::new(opts.subcommand, opts.options)];
    print_batch(&git::on_objects(&commands, &opts.object_ids));

    Ok(())
}

fn run_branch(opts: BranchOptions) -> Result<()> {
    let current = git::current_branch(&opts.repository)?;
    let batch = git::on_operand_branch(opts.operation, opts.operand_branch, opts.remote, current);
    print_batch(&batch);

    Ok(())
}

fn run_sql(command: SqlCommand) -> Result<()> {
    let conditions = |json: Option<&str>| -> Result<Vec<sql::Condition>> {
        match json {
            Some(json) => Ok(sql::Condition::many_from_value(&Value::from_arg(json))?),
            None => Ok(Vec::new()),
        }
    };

    match command {
        SqlCommand::Where(opts) => {
            println!("{}", sql::where_clause(&conditions(Some(opts.conditions.as_str()))?))
        }
        SqlCommand::Select(opts) => println!(
            "{}",
            sql::select(opts.table, opts.columns, &conditions(opts.conditions.as_deref())?)
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rooomy::batch::exec::FnExecutor;

    #[test]
    fn progress_grows_only_on_retry() -> Result<()> {
        let executor = FnExecutor(|_: &CommandTuple| Execution::failure("boom"));
        let mut progress = ProgressExecutor::new(executor, 2)?;
        progress.execute(&CommandTuple::new("one"));

        progress.grow_for(ResumeMode::Skip);
        assert_eq!(progress.bar.length(), Some(2));
        progress.grow_for(ResumeMode::Retry);
        assert_eq!(progress.bar.length(), Some(3));
        assert_eq!(progress.bar.position(), 1);

        Ok(())
    }
}
