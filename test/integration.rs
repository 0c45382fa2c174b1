// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::RepoFixture;

use anyhow::Result;
use pretty_assertions::assert_eq;
use rooomy::{
    batch::{
        exec::{ConnectionExecutor, GitConnection, ShellExecutor},
        log::ResultLog,
        BatchController, BatchRunner, ResumeMode, RunState,
    },
    config::Presets,
    generate::git,
    shell::{Batch, Command},
    Registry, Value,
};
use std::fs;

#[test]
fn git_connection_switches_branches() -> Result<()> {
    let fixture = RepoFixture::new()?;
    let oid = fixture.stage_and_commit("README.md", "hello")?;

    let connection = GitConnection::open(fixture.path())?;
    let controller = BatchController::new(ConnectionExecutor::new(connection));
    let mut runner = BatchRunner::new(controller);
    let mut log = ResultLog::new();

    let batch = Batch::from(vec![
        Command::new("current-branch"),
        Command::new("branch").arg("feature"),
        Command::new("checkout").arg("feature"),
        Command::new("current-branch"),
        Command::new("rev-parse").arg("HEAD"),
        Command::new("checkout").arg("main"),
        Command::new("checkout").arg("missing"),
    ]);
    let records = runner.run(batch, &mut log);

    let outputs = records.iter().map(|record| record.output.as_str()).collect::<Vec<_>>();
    assert_eq!(&outputs[..6], &[
        "main",
        "",
        "Switched to branch 'feature'",
        "feature",
        oid.to_string().as_str(),
        "Switched to branch 'main'",
    ]);
    assert!(!records[6].success);
    assert_eq!(log.failures(), 1);
    assert_eq!(git::current_branch(fixture.path())?, "main");
    assert!(fixture.repo().find_branch("feature", git2::BranchType::Local).is_ok());

    Ok(())
}

#[test]
fn shell_batch_halts_and_resumes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let executor = ShellExecutor::new().with_current_dir(dir.path());
    let controller = BatchController::new(executor).with_admitted_errors(0);
    let mut runner = BatchRunner::new(controller);
    let mut log = ResultLog::new();

    let batch = Batch::from(vec![
        Command::new("echo").args(["hello", ">", "out.txt"]),
        Command::new("false"),
        Command::new("cat").arg("out.txt"),
    ]);
    let records = runner.run(batch, &mut log);
    assert_eq!(records.len(), 2);
    assert_eq!(runner.state(), RunState::Halted);
    assert_eq!(runner.working_batch().render(), vec!["cat out.txt"]);

    let records = runner.resume(ResumeMode::Skip, &mut log);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].output, "hello");
    assert_eq!(runner.state(), RunState::Running);

    let path = dir.path().join("results").join("log.json");
    log.write_json(&path)?;
    let exported: serde_json::Value = serde_json::from_str(fs::read_to_string(&path)?.as_str())?;
    let commands = exported
        .as_array()
        .map(|records| records.iter().map(|record| record["command"].clone()).collect::<Vec<_>>())
        .unwrap_or_default();
    assert_eq!(commands, vec![
        serde_json::json!("echo hello > out.txt"),
        serde_json::json!("false"),
        serde_json::json!("cat out.txt"),
    ]);

    Ok(())
}

#[test]
fn presets_file_feeds_batch_generators() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("presets.toml");
    fs::write(
        &path,
        r#"
            [definitions]
            log-heads = ["git-on-objects", [["log", "-1"], ["show", "--stat"]], { ref = "heads" }]
            heads = ["main", "release"]
        "#,
    )?;

    let mut registry = Registry::new();
    Presets::load(&path)?.register(&mut registry);

    let batch = registry.batch_from_generator(&Value::from_args([":log-heads"]))?;
    assert_eq!(
        batch.render(),
        vec![
            "git log -1 main",
            "git log -1 release",
            "git show --stat main",
            "git show --stat release",
        ]
    );

    Ok(())
}
