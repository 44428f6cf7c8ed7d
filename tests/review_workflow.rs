//! End-to-end reviewer workflows against a real SQLite database.
//!
//! Each test opens a fresh database in a temporary directory and drives the
//! orchestrators exactly as the HTTP layer does.

use std::sync::Arc;

use pr_reviewer_lib::db::{self, SqliteStore};
use pr_reviewer_lib::error::AppError;
use pr_reviewer_lib::models::{PullRequestStatus, Team, TeamMember};
use pr_reviewer_lib::services::{AssignmentPolicy, Services};
use pr_reviewer_lib::store::{PrStore, TeamStore, UserStore};
use tempfile::{tempdir, TempDir};

async fn setup() -> (Services, Arc<SqliteStore>, TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("reviews.db");
    let pool = db::initialize(&db_path)
        .await
        .expect("Failed to initialize database");
    let store = Arc::new(SqliteStore::new(pool));
    let services = Services::new(store.clone(), AssignmentPolicy::default());
    (services, store, dir)
}

fn member(id: &str, active: bool) -> TeamMember {
    TeamMember::new(id, format!("user {}", id), active)
}

#[tokio::test]
async fn test_backend_example_scenario() {
    let (services, _store, _dir) = setup().await;
    services
        .teams
        .create_team(Team::new(
            "backend",
            vec![member("u1", true), member("u2", true), member("u3", true)],
        ))
        .await
        .unwrap();

    let pr = services.prs.create_pr("pr-1", "Add X", "u1").await.unwrap();
    assert_eq!(pr.status, PullRequestStatus::Open);
    assert!(!pr.assigned_reviewers.is_empty());
    for id in &pr.assigned_reviewers {
        assert!(id == "u2" || id == "u3");
    }

    let merged = services.prs.merge_pr("pr-1").await.unwrap();
    assert_eq!(merged.status, PullRequestStatus::Merged);
    assert!(merged.merged_at.is_some());

    let again = services.prs.merge_pr("pr-1").await.unwrap();
    assert_eq!(again.merged_at, merged.merged_at);
}

#[tokio::test]
async fn test_reassign_unassigned_reviewer() {
    let (services, _store, _dir) = setup().await;
    services
        .teams
        .create_team(Team::new(
            "backend",
            vec![member("u1", true), member("u2", true), member("u3", false)],
        ))
        .await
        .unwrap();
    services.prs.create_pr("pr-1", "Add X", "u1").await.unwrap();

    let err = services.prs.reassign_reviewer("pr-1", "u3").await.unwrap_err();
    assert!(matches!(err, AppError::ReviewerNotAssigned));
}

#[tokio::test]
async fn test_reassign_within_team() {
    let (services, store, _dir) = setup().await;
    services
        .teams
        .create_team(Team::new(
            "backend",
            vec![
                member("u1", true),
                member("u2", true),
                member("u3", true),
                member("u4", true),
            ],
        ))
        .await
        .unwrap();
    services.prs.create_pr("pr-1", "Add X", "u1").await.unwrap();

    let outcome = services.prs.reassign_reviewer("pr-1", "u3").await.unwrap();

    assert_eq!(outcome.replaced_by, "u4");
    assert_eq!(outcome.pr.assigned_reviewers, vec!["u2", "u4"]);
    assert!(!store.is_reviewer("pr-1", "u3").await.unwrap());
    assert_eq!(store.get_team_of_user("u4").await.unwrap(), "backend");
}

#[tokio::test]
async fn test_create_team_is_atomic_and_upserts() {
    let (services, store, _dir) = setup().await;
    services
        .teams
        .create_team(Team::new("backend", vec![member("u1", false)]))
        .await
        .unwrap();

    services
        .teams
        .create_team(Team::new("platform", vec![TeamMember::new("u1", "New Name", true)]))
        .await
        .unwrap();

    let user = store.get_user("u1").await.unwrap();
    assert_eq!(user.team_name, "platform");
    assert_eq!(user.username, "user u1");
    assert!(!user.is_active);

    let backend = services.teams.get_team("backend").await.unwrap();
    assert!(backend.members.is_empty());
    assert!(store.team_exists("platform").await.unwrap());
}

#[tokio::test]
async fn test_deactivation_hands_reviews_to_other_teams() {
    let (services, store, _dir) = setup().await;
    services
        .teams
        .create_team(Team::new(
            "backend",
            vec![member("u1", true), member("u2", true), member("u3", true)],
        ))
        .await
        .unwrap();
    services
        .teams
        .create_team(Team::new(
            "frontend",
            vec![member("f1", true), member("f2", true), member("f3", false)],
        ))
        .await
        .unwrap();
    services.prs.create_pr("pr-1", "Add X", "u1").await.unwrap();
    services.prs.create_pr("pr-2", "Add Y", "f1").await.unwrap();

    let result = services.teams.deactivate_team_users("backend").await.unwrap();

    assert_eq!(result.deactivated_users, 3);
    assert_eq!(result.deactivated_user_ids, vec!["u1", "u2", "u3"]);
    assert_eq!(result.reassigned_prs, 1);
    assert_eq!(result.failed_reassignments, 0);

    assert_eq!(store.list_reviewers("pr-1").await.unwrap(), vec!["f1", "f2"]);
    assert_eq!(store.list_reviewers("pr-2").await.unwrap(), vec!["f2"]);
    assert!(store.list_active_members("backend").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deactivation_without_replacements_is_partial() {
    let (services, store, _dir) = setup().await;
    services
        .teams
        .create_team(Team::new(
            "backend",
            vec![member("u1", true), member("u2", true), member("u3", true)],
        ))
        .await
        .unwrap();
    services
        .teams
        .create_team(Team::new("frontend", vec![member("f1", false)]))
        .await
        .unwrap();
    services.prs.create_pr("pr-1", "Add X", "u1").await.unwrap();

    let err = services.teams.deactivate_team_users("backend").await.unwrap_err();

    assert_eq!(err.code(), "PARTIAL_REASSIGNMENT");
    let result = err.into_partial_result().expect("partial result");
    assert_eq!(result.deactivated_users, 3);
    assert_eq!(result.failed_reassignments, 1);
    assert_eq!(store.list_reviewers("pr-1").await.unwrap(), vec!["u2", "u3"]);
}

#[tokio::test]
async fn test_review_lists_and_stats() {
    let (services, _store, _dir) = setup().await;
    services
        .teams
        .create_team(Team::new(
            "backend",
            vec![member("u1", true), member("u2", true), member("u3", true)],
        ))
        .await
        .unwrap();
    services.prs.create_pr("pr-1", "Add X", "u1").await.unwrap();
    services.prs.create_pr("pr-2", "Add Y", "u3").await.unwrap();
    services.prs.merge_pr("pr-1").await.unwrap();

    let reviews = services.users.get_user_review_prs("u2").await.unwrap();
    let ids: Vec<&str> = reviews.iter().map(|p| p.pull_request_id.as_str()).collect();
    assert_eq!(ids, vec!["pr-1", "pr-2"]);

    let per_user = services.stats.review_stats().await.unwrap();
    assert_eq!(per_user[0].user_id, "u2");
    assert_eq!(per_user[0].review_count, 2);
    assert_eq!(per_user.len(), 3);

    let per_pr = services.stats.pr_assignment_stats().await.unwrap();
    assert!(per_pr.iter().all(|s| s.reviewers_count == 2));
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("reviews.db");

    {
        let pool = db::initialize(&db_path).await.unwrap();
        let store = SqliteStore::new(pool.clone());
        store
            .create_team(&Team::new("backend", vec![member("u1", true)]))
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = db::initialize(&db_path).await.unwrap();
    let store = SqliteStore::new(pool);
    assert!(store.team_exists("backend").await.unwrap());
}
