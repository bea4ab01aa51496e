//! Integration tests for DN path materialization
//!
//! Covers:
//! - Idempotent re-runs against a mutating directory
//! - Partial existence
//! - Non-container skip policy
//! - Fail-fast on creation errors
//! - Dry-run classification parity with real runs
//! - End-to-end against a SQLite directory file

use dnpath_core::{
    parse, plan, ActionKind, DirectoryCall, ErrorKind, InMemoryDirectory, SqliteDirectory,
    SqliteLocator,
};
use dnpath_orchestration::{
    resolve_endpoint, MaterializeError, MaterializeOptions, Materializer,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const ROOT: &str = "DC=x,DC=y";
const PATH: &str = "OU=a,OU=b,DC=x,DC=y";

fn materializer(dir: &InMemoryDirectory) -> Materializer {
    Materializer::new(Arc::new(dir.clone()), MaterializeOptions::default())
}

fn names(outcome: &dnpath_orchestration::MaterializeOutcome) -> Vec<(ActionKind, String)> {
    outcome
        .actions
        .iter()
        .map(|a| (a.kind, a.segment.name.clone()))
        .collect()
}

#[tokio::test]
async fn test_idempotent_rerun() {
    let dir = InMemoryDirectory::with_naming_context(ROOT);
    let m = materializer(&dir);

    let first = m.ensure_path(PATH).await.expect("first run failed");
    assert_eq!(
        names(&first),
        vec![
            (ActionKind::Created, "b".to_string()),
            (ActionKind::Created, "a".to_string()),
        ]
    );
    assert_eq!(first.final_path, PATH);

    dir.clear_calls();

    let second = m.ensure_path(PATH).await.expect("second run failed");
    assert_eq!(
        names(&second),
        vec![
            (ActionKind::Exists, "b".to_string()),
            (ActionKind::Exists, "a".to_string()),
        ]
    );
    assert_eq!(second.final_path, PATH);
    assert_eq!(dir.create_calls(), 0);
    assert_eq!(dir.containers().len(), 2);
}

#[tokio::test]
async fn test_creation_order_is_parent_first() {
    let dir = InMemoryDirectory::with_naming_context(ROOT);
    materializer(&dir).ensure_path(PATH).await.unwrap();

    assert_eq!(
        dir.calls(),
        vec![
            DirectoryCall::Exists("OU=b,DC=x,DC=y".to_string()),
            DirectoryCall::CreateContainer {
                name: "b".to_string(),
                parent: ROOT.to_string(),
            },
            DirectoryCall::Exists(PATH.to_string()),
            DirectoryCall::CreateContainer {
                name: "a".to_string(),
                parent: "OU=b,DC=x,DC=y".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_partial_existence() {
    let dir = InMemoryDirectory::with_naming_context(ROOT);
    dir.seed_container("b", ROOT);

    let outcome = materializer(&dir).ensure_path(PATH).await.unwrap();

    assert_eq!(
        names(&outcome),
        vec![
            (ActionKind::Exists, "b".to_string()),
            (ActionKind::Created, "a".to_string()),
        ]
    );
    // b is never created; a is still checked before creation
    assert_eq!(
        dir.calls(),
        vec![
            DirectoryCall::Exists("OU=b,DC=x,DC=y".to_string()),
            DirectoryCall::Exists(PATH.to_string()),
            DirectoryCall::CreateContainer {
                name: "a".to_string(),
                parent: "OU=b,DC=x,DC=y".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_non_container_skip() {
    let dir = InMemoryDirectory::with_naming_context(ROOT);

    let outcome = materializer(&dir)
        .ensure_path("CN=svc,OU=b,DC=x,DC=y")
        .await
        .unwrap();

    assert_eq!(
        names(&outcome),
        vec![
            (ActionKind::Created, "b".to_string()),
            (ActionKind::UnsupportedSkip, "svc".to_string()),
        ]
    );
    assert_eq!(outcome.final_path, "OU=b,DC=x,DC=y");
    assert!(!dir.contains("CN=svc,OU=b,DC=x,DC=y"));
}

#[tokio::test]
async fn test_fail_fast_on_creation_error() {
    let dir = InMemoryDirectory::with_naming_context(ROOT);
    dir.fail_create("OU=b,DC=x,DC=y", ErrorKind::PermissionDenied);

    let err = materializer(&dir).ensure_path(PATH).await.unwrap_err();

    match &err {
        MaterializeError::SegmentFailed {
            segment,
            prefix,
            source,
            actions,
        } => {
            assert_eq!(segment.name, "b");
            assert_eq!(prefix, ROOT);
            assert_eq!(source.kind, ErrorKind::PermissionDenied);
            assert_eq!(actions.len(), 1);
            assert_eq!(actions[0].kind, ActionKind::Failed);
        }
        other => panic!("expected SegmentFailed, got {other}"),
    }

    // a is never queried
    assert_eq!(dir.calls().len(), 2);
    assert!(!dir
        .calls()
        .iter()
        .any(|c| matches!(c, DirectoryCall::Exists(dn) if dn == PATH)));
}

#[tokio::test]
async fn test_failure_keeps_earlier_containers() {
    let dir = InMemoryDirectory::with_naming_context(ROOT);
    dir.fail_create(PATH, ErrorKind::Timeout);

    let err = materializer(&dir).ensure_path(PATH).await.unwrap_err();

    match &err {
        MaterializeError::SegmentFailed { prefix, actions, .. } => {
            assert_eq!(prefix, "OU=b,DC=x,DC=y");
            assert_eq!(
                actions.iter().map(|a| a.kind).collect::<Vec<_>>(),
                vec![ActionKind::Created, ActionKind::Failed]
            );
        }
        other => panic!("expected SegmentFailed, got {other}"),
    }
    // no rollback
    assert!(dir.contains("OU=b,DC=x,DC=y"));
}

#[tokio::test]
async fn test_root_only_path() {
    let dir = InMemoryDirectory::with_naming_context(ROOT);

    let outcome = materializer(&dir).ensure_path(ROOT).await.unwrap();

    assert_eq!(outcome.final_path, ROOT);
    assert!(outcome.actions.is_empty());
}

#[tokio::test]
async fn test_dry_run_matches_real_run() {
    let path = "OU=c,OU=a,OU=b,DC=x,DC=y";

    let simulated_dir = InMemoryDirectory::with_naming_context(ROOT);
    simulated_dir.seed_container("b", ROOT);
    let simulated = Materializer::new(
        Arc::new(simulated_dir.clone()),
        MaterializeOptions {
            dry_run: true,
            quiet: true,
        },
    )
    .ensure_path(path)
    .await
    .unwrap();

    let real_dir = InMemoryDirectory::with_naming_context(ROOT);
    real_dir.seed_container("b", ROOT);
    let real = materializer(&real_dir).ensure_path(path).await.unwrap();

    assert_eq!(simulated.kinds(), real.kinds());
    assert_eq!(simulated.final_path, real.final_path);
    assert!(simulated.dry_run);
    assert_eq!(simulated_dir.create_calls(), 0);
    assert_eq!(simulated_dir.containers().len(), 1);
}

#[tokio::test]
async fn test_sqlite_end_to_end() {
    let tmp = tempfile::TempDir::new().unwrap();
    let locator = SqliteLocator::new(tmp.path());
    let root = "DC=corp,DC=example";
    let path = "OU=EMEA,OU=Sales,DC=corp,DC=example";

    SqliteDirectory::create(locator.path_for("corp.example"), root).unwrap();

    let parsed = parse(path).unwrap();
    let plan = plan(&parsed);

    let endpoint = resolve_endpoint(None, &parsed.root, &locator).await.unwrap();
    let directory = SqliteDirectory::open(&endpoint).unwrap();
    let outcome = Materializer::new(Arc::new(directory), MaterializeOptions::default())
        .materialize(&plan)
        .await
        .unwrap();

    assert_eq!(outcome.final_path, path);
    assert_eq!(outcome.count(ActionKind::Created), 2);

    // reopen: second run only finds existing containers
    let directory = SqliteDirectory::open(&endpoint).unwrap();
    let containers = directory.containers().unwrap();
    assert_eq!(containers.len(), 2);
    assert!(containers.iter().all(|c| !c.protected_from_deletion));

    let rerun = Materializer::new(Arc::new(directory), MaterializeOptions::default())
        .materialize(&plan)
        .await
        .unwrap();
    assert_eq!(
        rerun.kinds(),
        vec![ActionKind::Exists, ActionKind::Exists]
    );
}
