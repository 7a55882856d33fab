//! Exercises branch/commit against a real throwaway git repository, the way
//! `shipper`'s own git tests exercise real temp directories rather than
//! mocking the filesystem. Push/PR are left to unit-level classification
//! tests since they need a real remote.

use std::fs;
use std::path::Path;
use std::process::Command;

use orc_git::{commit_all, create_branch, derive_branch_name, render_commit_message, CommitOutcome};
use serial_test::serial;
use tempfile::tempdir;

fn init_repo(dir: &Path) {
    let run = |args: &[&str]| {
        let status = Command::new("git").args(args).current_dir(dir).status().expect("run git");
        assert!(status.success(), "git {args:?} failed");
    };
    run(&["init", "-q"]);
    run(&["config", "user.email", "orc@example.invalid"]);
    run(&["config", "user.name", "orc-test"]);
    fs::write(dir.join("README.md"), "hello\n").unwrap();
    run(&["add", "-A"]);
    run(&["commit", "-q", "-m", "initial"]);
}

#[test]
#[serial]
fn creates_branch_and_commits_staged_changes() {
    let td = tempdir().expect("tempdir");
    init_repo(td.path());

    let branch = derive_branch_name("mgx", "Hello API", 1, None);
    let created = create_branch(td.path(), &branch).expect("create branch");
    assert_eq!(created, branch);

    fs::write(td.path().join("main.py"), "print('hi')\n").unwrap();
    let message = render_commit_message("MGX Task: {task_name} - Run #{run_number}", "Hello API", 1);
    match commit_all(td.path(), &message).expect("commit") {
        CommitOutcome::Committed(sha) => assert_eq!(sha.len(), 40),
        CommitOutcome::NothingToCommit => panic!("expected a real commit"),
    }
}

#[test]
#[serial]
fn empty_working_tree_is_a_vacuous_success() {
    let td = tempdir().expect("tempdir");
    init_repo(td.path());

    let outcome = commit_all(td.path(), "no-op").expect("commit");
    assert_eq!(outcome, CommitOutcome::NothingToCommit);
}

#[test]
#[serial]
fn creating_an_existing_branch_fails_with_branch_exists() {
    let td = tempdir().expect("tempdir");
    init_repo(td.path());

    let branch = derive_branch_name("mgx", "Hello API", 1, None);
    create_branch(td.path(), &branch).expect("first create succeeds");

    // Return to the default branch before attempting to recreate it, since
    // git refuses to "create" the branch you're already on by a different
    // path but would also refuse a duplicate name outright.
    let status = Command::new("git")
        .args(["checkout", "-"])
        .current_dir(td.path())
        .status()
        .expect("checkout back");
    assert!(status.success());

    let err = create_branch(td.path(), &branch).expect_err("duplicate branch must fail");
    assert!(err.is_branch_exists());
}
