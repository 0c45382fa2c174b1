// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Domain generators.
//!
//! Generators are pure functions that map structured parameters into command
//! tuples or whole batches. Each submodule offers a typed API for its domain:
//!
//! - [`sql`]: SELECT/UPDATE composition and condition trees.
//! - [`psql`]: `psql`, `pg_dump`, and `pg_restore` command batches.
//! - [`s3`]: `aws s3 cp` fetch batches.
//! - [`git`]: `git` command expansion over object ids.
//!
//! On top of the typed API sits a dynamic layer that reads generator
//! parameters out of [definitions](crate::definition). Every built-in
//! generator is registered into a [`Registry`] by name through
//! [`register_builtins`], alongside a handful of sample presets.

pub mod git;
pub mod psql;
pub mod s3;
pub mod sql;

use crate::{
    definition::{Registry, Value},
    generate::{
        git::GitCommand,
        psql::{DumpReplacer, PsqlDb},
        s3::S3Path,
    },
    shell::Batch,
};

use tracing::instrument;

/// Positional fields of a resolved definition.
///
/// Wraps the result of resolving a definition, so required and optional
/// fields can be read out of it by position with meaningful errors.
#[derive(Debug, Clone)]
pub(crate) struct Fields<'r> {
    registry: &'r Registry,
    values: Vec<Value>,
    what: &'static str,
}

impl<'r> Fields<'r> {
    pub(crate) fn resolve(registry: &'r Registry, value: &Value, what: &'static str) -> Self {
        Self {
            registry,
            values: registry.resolve(value),
            what,
        }
    }

    pub(crate) fn from_args(registry: &'r Registry, args: &[Value], what: &'static str) -> Self {
        Self {
            registry,
            values: args.to_vec(),
            what,
        }
    }

    pub(crate) fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Required textual field.
    pub(crate) fn text(&self, index: usize, field: &'static str) -> Result<String> {
        match self.value(index) {
            Some(value) if value.is_truthy() => value.as_text().ok_or_else(|| {
                GenerateError::InvalidField {
                    what: self.what,
                    field,
                    found: value.to_string(),
                }
            }),
            _ => Err(GenerateError::MissingField {
                what: self.what,
                field,
            }),
        }
    }

    /// Optional textual field. Nil, false, and absent fields are [`None`].
    pub(crate) fn opt_text(&self, index: usize, field: &'static str) -> Result<Option<String>> {
        match self.value(index) {
            Some(value) if value.is_truthy() => self.text(index, field).map(Some),
            _ => Ok(None),
        }
    }

    pub(crate) fn flag(&self, index: usize) -> bool {
        self.value(index).is_some_and(Value::is_truthy)
    }

    /// Nested definition field, resolved. Absent fields resolve to nothing.
    pub(crate) fn nested(&self, index: usize) -> Vec<Value> {
        self.value(index)
            .map(|value| self.registry.resolve(value))
            .unwrap_or_default()
    }

    /// Nested listing of optional texts, e.g., dump paths where nil means
    /// interactive mode.
    pub(crate) fn opt_texts(&self, index: usize, field: &'static str) -> Result<Vec<Option<String>>> {
        self.nested(index)
            .iter()
            .map(|value| match value {
                value if !value.is_truthy() => Ok(None),
                value => value.as_text().map(Some).ok_or_else(|| GenerateError::InvalidField {
                    what: self.what,
                    field,
                    found: value.to_string(),
                }),
            })
            .collect()
    }
}

/// Register built-in batch generators and sample presets.
pub fn register_builtins(registry: &mut Registry) {
    registry.register_generator("psql-cli-or-queries", gen_psql_cli_or_queries);
    registry.register_generator("psql-queries-method", gen_psql_queries_method);
    registry.register_generator("psql-drop-owned", gen_psql_drop_owned);
    registry.register_generator("psql-apply-dumps", gen_psql_apply_dumps);
    registry.register_generator("psql-generate-dumps", gen_psql_generate_dumps);
    registry.register_generator("psql-dump-replace", gen_psql_dump_replace);
    registry.register_generator("pg-restore-list", gen_pg_restore_list);
    registry.register_generator("s3-fetch", gen_s3_fetch);
    registry.register_generator("s3-fetch-to-local", gen_s3_fetch_to_local);
    registry.register_generator("git-on-objects", gen_git_on_objects);

    registry.define("psql-db-sample", PsqlDb::sample().to_value());
    registry.define("db-dumps-sample", Value::list(psql::sample_dumps()));
    registry.define("s3-path-sample-file", S3Path::sample_file().to_value());
    registry.define("s3-path-sample-dir", S3Path::sample_dir().to_value());
    registry.define("db-query-show-tables", sql::show_tables());
    registry.define("db-query-show-tables-count", sql::show_tables_count());
    registry.define("db-query-drop-owned", sql::drop_owned_current_user());
    registry.define("db-queries-drop-owned", Value::list(sql::drop_owned_queries()));
    registry.define(
        "dump-replace-sample",
        Value::list([
            Value::reference("psql-db-sample"),
            Value::list(["/tmp/psql_db_original_dump"]),
            Value::list(["/tmp/database_dump"]),
            Value::from(psql::SAMPLE_APPLY_OPTIONS),
        ]),
    );
    registry.define(
        "batch-apply-dumps-sample",
        Value::list([
            Value::from("psql-apply-dumps"),
            Value::reference("psql-db-sample"),
            Value::reference("db-dumps-sample"),
            Value::from(psql::SAMPLE_APPLY_OPTIONS),
        ]),
    );
    registry.define(
        "batch-dump-replace-sample",
        Value::list([
            Value::from("psql-dump-replace"),
            Value::reference("dump-replace-sample"),
        ]),
    );
    registry.define(
        "batch-drop-owned-sample",
        Value::list([
            Value::from("psql-queries-method"),
            Value::reference("psql-db-sample"),
            Value::reference("db-queries-drop-owned"),
        ]),
    );
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_psql_cli_or_queries(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let fields = Fields::from_args(registry, args, "psql-cli-or-queries");
    let psql_db = PsqlDb::from_value(registry, fields.value(0).unwrap_or(&Value::Nil))?;
    let queries = match fields.value(1) {
        Some(_) => fields.opt_texts(1, "db_queries")?,
        None => vec![None],
    };
    psql::cli_or_queries(&psql_db, &queries)
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_psql_queries_method(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let fields = Fields::from_args(registry, args, "psql-queries-method");
    let psql_db = PsqlDb::from_value(registry, fields.value(0).unwrap_or(&Value::Nil))?;
    let queries = fields.opt_texts(1, "db_queries")?;
    psql::cli_or_queries(&psql_db, &queries)
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_psql_drop_owned(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let psql_db = PsqlDb::from_value(registry, args.first().unwrap_or(&Value::Nil))?;
    psql::drop_owned(&psql_db)
}

fn dump_args(registry: &Registry, args: &[Value], what: &'static str) -> Result<(PsqlDb, Vec<Option<String>>, String)> {
    let fields = Fields::from_args(registry, args, what);
    let psql_db = PsqlDb::from_value(registry, fields.value(0).unwrap_or(&Value::Nil))?;
    let paths = match fields.value(1) {
        Some(_) => psql::expand_dump_paths(fields.opt_texts(1, "db_dump_paths")?)?,
        None => vec![None],
    };
    let options = fields.opt_text(2, "options")?.unwrap_or_default();
    Ok((psql_db, paths, options))
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_psql_apply_dumps(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let (psql_db, paths, options) = dump_args(registry, args, "psql-apply-dumps")?;
    psql::apply_dumps(&psql_db, &paths, &options)
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_psql_generate_dumps(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let (psql_db, paths, options) = dump_args(registry, args, "psql-generate-dumps")?;
    psql::generate_dumps(&psql_db, &paths, &options)
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_psql_dump_replace(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let replacer = DumpReplacer::from_value(registry, args.first().unwrap_or(&Value::Nil))?;
    replacer.batch()
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_pg_restore_list(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let fields = Fields::from_args(registry, args, "pg-restore-list");
    let dump_path = fields.text(0, "local_path")?;
    let output_path = fields.text(1, "output_file_path")?;
    Ok(psql::pg_restore_list(dump_path, output_path))
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_s3_fetch(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let fields = Fields::from_args(registry, args, "s3-fetch");
    let s3_path = S3Path::from_value(registry, fields.value(0).unwrap_or(&Value::Nil))?;
    let local_path = fields.text(1, "local_path")?;
    Ok(s3::fetch_file(&s3_path, local_path))
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_s3_fetch_to_local(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let fields = Fields::from_args(registry, args, "s3-fetch-to-local");
    let s3_path = S3Path::from_value(registry, fields.value(0).unwrap_or(&Value::Nil))?;
    let local_path = fields.text(1, "local_path")?;
    Ok(s3::fetch_to_local(&s3_path, local_path, fields.flag(2)))
}

#[instrument(skip(registry, args), level = "debug")]
fn gen_git_on_objects(registry: &Registry, args: &[Value]) -> Result<Batch> {
    let fields = Fields::from_args(registry, args, "git-on-objects");
    let commands = GitCommand::many_from_value(registry, fields.value(0).unwrap_or(&Value::Nil))?;
    let object_ids = fields
        .opt_texts(1, "object_ids")?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
    Ok(git::on_objects(&commands, &object_ids))
}

/// Generator error types.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Required positional field is missing.
    #[error("{what} is missing required field {field:?}")]
    MissingField { what: &'static str, field: &'static str },

    /// Positional field holds the wrong kind of value.
    #[error("{what} field {field:?} cannot use {found:?}")]
    InvalidField {
        what: &'static str,
        field: &'static str,
        found: String,
    },

    /// Batch generator definition resolved to nothing.
    #[error("batch generator definition is empty")]
    EmptyGenerator,

    /// Batch generator definition names no registered generator.
    #[error("no batch generator named {0:?}")]
    UnknownGenerator(String),

    /// Dump path glob pattern is invalid.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fields_distinguish_missing_from_invalid() {
        let registry = Registry::empty();
        let args = [Value::from("name"), Value::Nil, Value::list(["nested"])];
        let fields = Fields::from_args(&registry, &args, "thing");

        assert_eq!(fields.text(0, "first").ok(), Some("name".into()));
        assert!(matches!(
            fields.text(1, "second"),
            Err(GenerateError::MissingField { field: "second", .. })
        ));
        assert!(matches!(
            fields.text(2, "third"),
            Err(GenerateError::InvalidField { field: "third", .. })
        ));
        assert!(matches!(fields.opt_text(1, "second"), Ok(None)));
        assert!(matches!(fields.opt_text(9, "absent"), Ok(None)));
    }

    #[test]
    fn builtin_sample_batches_generate() -> anyhow::Result<()> {
        let registry = Registry::new();

        let batch = registry.batch_from_generator(&Value::reference("batch-apply-dumps-sample"))?;
        assert_eq!(batch.len(), 2);

        let batch = registry.batch_from_generator(&Value::reference("batch-drop-owned-sample"))?;
        assert_eq!(batch.len(), 3);

        // Fetch nothing from a source, backup once, three queries, apply once.
        let batch = registry.batch_from_generator(&Value::reference("batch-dump-replace-sample"))?;
        assert_eq!(batch.len(), 5);

        Ok(())
    }

    #[test]
    fn builtin_s3_generator_reads_sample_path() -> anyhow::Result<()> {
        let registry = Registry::new();
        let definition = Value::list([
            Value::from("s3-fetch"),
            Value::reference("s3-path-sample-file"),
            Value::from("/tmp/x"),
        ]);
        let batch = registry.batch_from_generator(&definition)?;
        assert_eq!(
            batch.render(),
            vec!["aws s3 cp s3://bucket_name/path_to_file/file /tmp/x"]
        );

        Ok(())
    }

    #[test]
    fn builtin_git_generator_expands_objects() -> anyhow::Result<()> {
        let registry = Registry::new();
        let definition = Value::from_arg(r#"["git-on-objects", ["show", "--stat"], ["abc123", "main"]]"#);
        let batch = registry.batch_from_generator(&definition)?;
        assert_eq!(
            batch.render(),
            vec!["git show --stat abc123", "git show --stat main"]
        );

        Ok(())
    }

    #[test]
    fn builtin_generator_reports_missing_descriptor() {
        let registry = Registry::new();
        let definition = Value::list([Value::from("psql-drop-owned"), Value::list(["db_only"])]);
        let result = registry.batch_from_generator(&definition);
        assert!(matches!(
            result,
            Err(GenerateError::MissingField { field: "db_user", .. })
        ));
    }
}
