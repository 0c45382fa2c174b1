// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! AWS S3 fetch batches.
//!
//! Fetching is delegated to `aws s3 cp`. As a definition, an S3 path is the
//! ordered listing `[bucket, region, path, is_dir, exclude, include]`.

use crate::{
    definition::{Registry, Value},
    generate::{Fields, Result},
    shell::{quote, Batch, Command},
};

/// Location of a file or directory in an S3 bucket.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct S3Path {
    pub bucket: String,
    pub region: Option<String>,
    pub path: String,
    pub is_dir: bool,
    pub exclude: Option<String>,
    pub include: Option<String>,
}

impl S3Path {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn sample_file() -> Self {
        Self::new("bucket_name", "path_to_file/file")
    }

    pub fn sample_dir() -> Self {
        Self {
            is_dir: true,
            ..Self::new("bucket_name", "path_to_dir/dir")
        }
    }

    /// Read S3 path out of its definition form.
    ///
    /// # Errors
    ///
    /// - Return [`GenerateError::MissingField`](crate::generate::GenerateError::MissingField)
    ///   if bucket or path is unset.
    pub fn from_value(registry: &Registry, value: &Value) -> Result<Self> {
        let fields = Fields::resolve(registry, value, "aws_s3_path");
        Ok(Self {
            bucket: fields.text(0, "s3_bucket")?,
            region: fields.opt_text(1, "s3_region")?,
            path: fields.text(2, "s3_path")?,
            is_dir: fields.flag(3),
            exclude: fields.opt_text(4, "s3_exclude_pattern")?,
            include: fields.opt_text(5, "s3_include_pattern")?,
        })
    }

    /// Convert S3 path into its definition form.
    pub fn to_value(&self) -> Value {
        Value::list([
            Value::from(self.bucket.clone()),
            Value::from(self.region.clone()),
            Value::from(self.path.clone()),
            Value::from(self.is_dir),
            Value::from(self.exclude.clone()),
            Value::from(self.include.clone()),
        ])
    }

    /// Full `s3://` URL.
    pub fn url(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.path)
    }
}

/// Copy S3 path into local path.
pub fn fetch_file(s3_path: &S3Path, local_path: impl AsRef<str>) -> Batch {
    let command = Command::new("aws s3")
        .arg_opt(s3_path.region.as_ref().map(|region| format!("--region {region}")))
        .arg("cp")
        .arg(s3_path.url())
        .arg(local_path.as_ref())
        .arg(if s3_path.is_dir { "--recursive" } else { "" })
        .arg_opt(s3_path.exclude.as_ref().map(|pattern| format!("--exclude {}", quote(pattern))))
        .arg_opt(s3_path.include.as_ref().map(|pattern| format!("--include {}", quote(pattern))));

    Batch::from(vec![command])
}

/// Copy S3 path into local path, listing the local path before and after.
///
/// The local path gets created first when it is meant to be a directory.
pub fn fetch_to_local(s3_path: &S3Path, local_path: impl AsRef<str>, local_is_dir: bool) -> Batch {
    let local_path = local_path.as_ref();
    let mut batch = Batch::new();
    if local_is_dir {
        batch.push(Command::new("mkdir").args(["-p", local_path]));
    }
    batch.push(Command::new("ls").args(["-lh", local_path]));
    batch.extend(fetch_file(s3_path, local_path));
    batch.push(Command::new("ls").args(["-lh", local_path]));

    batch
}
