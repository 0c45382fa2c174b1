// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Presets configuration layout.
//!
//! Users keep their own named definitions in a TOML presets file. Loading
//! that file registers every entry as a named preset of a [`Registry`], so it
//! can be referenced like any built-in sample, e.g., `:staging-db`.
//!
//! # General Layout
//!
//! ```toml
//! [psql_db.staging-db]
//! name = "app"
//! user = "app"
//! password = "$STAGING_PASSWORD"
//! host = "staging.internal"
//! port = 5432
//!
//! [s3_path.last-dump]
//! bucket = "backups"
//! region = "eu-west-1"
//! path = "dumps/app"
//! is_dir = true
//!
//! [dumps]
//! local = ["~/dumps/*.sql"]
//!
//! [queries]
//! users = ["SELECT * FROM users"]
//!
//! [definitions]
//! refresh-staging = ["psql-apply-dumps", { ref = "staging-db" }, { ref = "local" }]
//!
//! [[contexts.roles]]
//! role = ["admin"]
//! result = [{ format = "{role} may log in" }]
//! ```
//!
//! String fields of database descriptors, S3 paths, and dump listings are
//! shell expanded. Dump listings are glob expanded afterwards.

use crate::{
    contexts::{self, Context},
    definition::{Registry, Value},
    generate::{psql::{self, PsqlDb}, s3::S3Path, GenerateError},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs,
    path::Path,
    str::FromStr,
};
use tracing::{debug, info, instrument};

/// Presets file layout.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Presets {
    /// Database connection descriptors.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub psql_db: BTreeMap<String, PsqlDbEntry>,

    /// S3 locations.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub s3_path: BTreeMap<String, S3PathEntry>,

    /// Listings of dump paths.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dumps: BTreeMap<String, Vec<String>>,

    /// Listings of SQL queries.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub queries: BTreeMap<String, Vec<String>>,

    /// Free-form definitions, including batch generator definitions.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Value>,

    /// Test context templates.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, Vec<Map<String, JsonValue>>>,
}

impl Presets {
    /// Load presets file.
    ///
    /// A missing file is not an error, it just means there are no presets.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Io`] if file exists, but cannot be read.
    /// - Return any parsing error of [`Presets::from_str`].
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no presets file at {:?}", path.display());
            return Ok(Self::default());
        }

        let presets: Presets = fs::read_to_string(path)?.parse()?;
        info!("load {} preset(s) from {:?}", presets.len(), path.display());

        Ok(presets)
    }

    /// Count of named entries across all sections.
    pub fn len(&self) -> usize {
        self.psql_db.len()
            + self.s3_path.len()
            + self.dumps.len()
            + self.queries.len()
            + self.definitions.len()
            + self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Define every entry as a named preset of registry.
    ///
    /// Context templates are not definitions, so they are left out.
    pub fn register(&self, registry: &mut Registry) {
        for (name, entry) in &self.psql_db {
            registry.define(name.as_str(), entry.to_psql_db().to_value());
        }

        for (name, entry) in &self.s3_path {
            registry.define(name.as_str(), entry.to_s3_path().to_value());
        }

        for (name, paths) in self.dumps.iter().chain(self.queries.iter()) {
            registry.define(name.as_str(), Value::list(paths.iter().map(String::as_str)));
        }

        for (name, value) in &self.definitions {
            registry.define(name.as_str(), value.clone());
        }
    }

    /// Expand context templates of given name.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoContexts`] if no templates have that name.
    /// - Return [`ConfigError::Contexts`] if templates are malformed.
    pub fn expand_contexts(&self, name: impl AsRef<str>) -> Result<Vec<Context>> {
        let name = name.as_ref();
        let templates = self
            .contexts
            .get(name)
            .ok_or_else(|| ConfigError::NoContexts(name.into()))?;
        Ok(contexts::expand_json(templates)?)
    }
}

impl FromStr for Presets {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut presets: Presets = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every typed string field.
        for entry in presets.psql_db.values_mut() {
            entry.name = expand(&entry.name)?;
            entry.user = expand(&entry.user)?;
            entry.host = expand(&entry.host)?;
            entry.password = entry.password.as_deref().map(expand).transpose()?;
        }

        for entry in presets.s3_path.values_mut() {
            entry.bucket = expand(&entry.bucket)?;
            entry.path = expand(&entry.path)?;
            entry.region = entry.region.as_deref().map(expand).transpose()?;
        }

        // INVARIANT: Glob expansion happens after shell expansion.
        for paths in presets.dumps.values_mut() {
            let expanded = paths
                .iter()
                .map(|path| expand(path).map(Some))
                .collect::<Result<Vec<_>>>()?;
            *paths = psql::expand_dump_paths(expanded)?.into_iter().flatten().collect();
        }

        Ok(presets)
    }
}

impl Display for Presets {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand(data: impl AsRef<str>) -> Result<String> {
    Ok(shellexpand::full(data.as_ref())?.into_owned())
}

/// Database connection descriptor entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PsqlDbEntry {
    pub name: String,
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
}

impl PsqlDbEntry {
    pub fn to_psql_db(&self) -> PsqlDb {
        let mut psql_db = PsqlDb::new(self.name.as_str(), self.user.as_str(), self.host.as_str());
        psql_db.password = self.password.clone();
        psql_db.port = self.port.map(|port| port.to_string());
        psql_db
    }
}

/// S3 location entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct S3PathEntry {
    pub bucket: String,
    pub region: Option<String>,
    pub path: String,

    #[serde(default)]
    pub is_dir: bool,

    pub exclude: Option<String>,
    pub include: Option<String>,
}

impl S3PathEntry {
    pub fn to_s3_path(&self) -> S3Path {
        S3Path {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            path: self.path.clone(),
            is_dir: self.is_dir,
            exclude: self.exclude.clone(),
            include: self.include.clone(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to glob expand dump listing.
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Context templates are malformed.
    #[error(transparent)]
    Contexts(#[from] contexts::ContextError),

    /// No context templates go by given name.
    #[error("no context templates named {0:?}")]
    NoContexts(String),

    /// Failed to read configuration file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
