// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use git2::{Oid, Repository, RepositoryInitOptions};
use std::{fs, path::Path};
use tempfile::TempDir;

/// Normal repository living in a temporary directory.
pub(crate) struct RepoFixture {
    dir: TempDir,
    repo: Repository,
}

impl RepoFixture {
    pub(crate) fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { dir, repo })
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }

    pub(crate) fn stage_and_commit(&self, filename: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<Oid> {
        fs::write(self.path().join(filename.as_ref()), contents.as_ref())?;

        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = self.repo.index()?;
        index.add_path(filename.as_ref())?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        // INVARIANT: Always determine latest parent commits to append to.
        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().map(|head| head.target().unwrap()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        // INVARIANT: Commit to HEAD by appending to obtained parent commits.
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            format!("chore: add {:?}", filename.as_ref()).as_ref(),
            &tree,
            &parents,
        )?;

        Ok(oid)
    }
}
