//! Integration tests for the database layer.
//!
//! These tests verify the record store using an in-memory SQLite database.
//! Tests are organized by module and functionality.

use chrono::{Duration, TimeZone, Utc};
use taskboard::db::Database;
use taskboard::error::{AppError, ErrorCode};
use taskboard::motivation::FixedPicker;
use taskboard::stats::dashboard_view;
use taskboard::types::{Priority, TaskInput, TaskStatus, User, parse_date};

/// Few hashing rounds keep the tests fast.
const TEST_ITERATIONS: u32 = 2;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn create_user(db: &Database, username: &str) -> User {
    db.create_user(username, None, "correct horse", TEST_ITERATIONS)
        .expect("Failed to create user")
}

/// Extract the structured error code from an anyhow error.
fn error_code(err: anyhow::Error) -> ErrorCode {
    AppError::from(err).code
}

mod storage_tests {
    use super::*;

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskboard.db");

        let task_id = {
            let db = Database::open(&path).expect("Failed to open database");
            let user = create_user(&db, "alice");
            db.create_task(user.id, &TaskInput::new("Persisted")).unwrap().id
        };

        // Reopening runs migrations again without touching existing data.
        let db = Database::open(&path).expect("Failed to reopen database");
        let user = db.get_user_by_username("alice").unwrap().unwrap();
        let task = db.get_task(task_id, user.id).unwrap().unwrap();
        assert_eq!(task.title, "Persisted");
    }
}

mod user_tests {
    use super::*;

    #[test]
    fn create_user_stores_hash_not_password() {
        let db = setup_db();
        let user = db
            .create_user("alice", Some("alice@example.com"), "correct horse", TEST_ITERATIONS)
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert!(user.password_hash.starts_with("pbkdf2_sha256$2$"));
        assert!(!user.password_hash.contains("correct horse"));

        let loaded = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(loaded.username, "alice");
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = setup_db();
        create_user(&db, "alice");

        let err = db
            .create_user("alice", None, "another pass", TEST_ITERATIONS)
            .unwrap_err();
        assert_eq!(error_code(err), ErrorCode::AlreadyExists);
    }

    #[test]
    fn authenticate_checks_password() {
        let db = setup_db();
        let user = create_user(&db, "alice");

        let found = db.authenticate("alice", "correct horse").unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        assert!(db.authenticate("alice", "wrong").unwrap().is_none());
        assert!(db.authenticate("nobody", "correct horse").unwrap().is_none());
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn session_resolves_until_expiry() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();

        let session = db
            .create_session_at(user.id, Duration::hours(1), start)
            .unwrap();
        assert_eq!(session.token.len(), 64);

        let found = db
            .session_user(&session.token, start + Duration::minutes(30))
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let expired = db
            .session_user(&session.token, start + Duration::hours(2))
            .unwrap();
        assert!(expired.is_none());

        // The expired session was removed.
        assert!(!db.delete_session(&session.token).unwrap());
    }

    #[test]
    fn session_past_representable_dates_is_an_error() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();

        // Roughly 270,000 years: past the last representable date.
        let result = db.create_session_at(user.id, Duration::days(100_000_000), start);
        assert!(result.is_err());
        assert_eq!(db.purge_expired_sessions(start + Duration::days(1)).unwrap(), 0);
    }

    #[test]
    fn delete_session_logs_out() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let session = db.create_session(user.id, Duration::hours(1)).unwrap();

        assert!(db.delete_session(&session.token).unwrap());
        assert!(db.session_user(&session.token, Utc::now()).unwrap().is_none());
    }

    #[test]
    fn purge_removes_only_expired() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();

        db.create_session_at(user.id, Duration::hours(1), start).unwrap();
        let live = db
            .create_session_at(user.id, Duration::hours(10), start)
            .unwrap();

        let purged = db.purge_expired_sessions(start + Duration::hours(5)).unwrap();
        assert_eq!(purged, 1);
        assert!(
            db.session_user(&live.token, start + Duration::hours(5))
                .unwrap()
                .is_some()
        );
    }
}

mod category_tests {
    use super::*;

    #[test]
    fn get_or_create_reuses_existing_title() {
        let db = setup_db();
        let user = create_user(&db, "alice");

        let first = db.get_or_create_category(user.id, "Work").unwrap();
        let second = db.get_or_create_category(user.id, "Work").unwrap();
        assert_eq!(first.id, second.id);

        db.get_or_create_category(user.id, "Home").unwrap();
        let titles: Vec<String> = db
            .list_categories(user.id)
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Home", "Work"]);
    }

    #[test]
    fn categories_are_per_user() {
        let db = setup_db();
        let alice = create_user(&db, "alice");
        let bob = create_user(&db, "bob");

        let a = db.get_or_create_category(alice.id, "Work").unwrap();
        let b = db.get_or_create_category(bob.id, "Work").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(db.list_categories(bob.id).unwrap().len(), 1);
    }

    #[test]
    fn foreign_category_cannot_be_attached() {
        let db = setup_db();
        let alice = create_user(&db, "alice");
        let bob = create_user(&db, "bob");
        let bobs = db.get_or_create_category(bob.id, "Secret").unwrap();

        let input = TaskInput {
            category_ids: vec![bobs.id],
            ..TaskInput::new("Sneaky")
        };
        let err = db.create_task(alice.id, &input).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::CategoryNotFound);

        // Nothing was written.
        assert!(db.list_tasks(alice.id).unwrap().is_empty());
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_applies_defaults() {
        let db = setup_db();
        let user = create_user(&db, "alice");

        let task = db.create_task(user.id, &TaskInput::new("Write report")).unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.due_date.is_none());
        assert!(task.completed_at.is_none());
        assert!(!task.notified);
        assert!(task.categories.is_empty());
    }

    #[test]
    fn create_task_with_categories_and_new_category() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let work = db.get_or_create_category(user.id, "Work").unwrap();

        let input = TaskInput {
            category_ids: vec![work.id, work.id],
            new_category: Some("Urgent".to_string()),
            ..TaskInput::new("Ship")
                .with_priority(Priority::High)
                .with_due_date(parse_date("2024-06-11").unwrap())
        };
        let task = db.create_task(user.id, &input).unwrap();

        let titles: Vec<&str> = task.categories.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Urgent", "Work"]);
        assert_eq!(task.due_date, parse_date("2024-06-11"));
        assert_eq!(db.task_categories(task.id).unwrap().len(), 2);

        // Reusing the name attaches the existing category.
        let again = TaskInput {
            new_category: Some("Urgent".to_string()),
            ..TaskInput::new("Ship more")
        };
        db.create_task(user.id, &again).unwrap();
        assert_eq!(db.list_categories(user.id).unwrap().len(), 2);
    }

    #[test]
    fn update_replaces_fields_and_category_set() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let work = db.get_or_create_category(user.id, "Work").unwrap();
        let home = db.get_or_create_category(user.id, "Home").unwrap();

        let task = db
            .create_task(
                user.id,
                &TaskInput {
                    category_ids: vec![work.id],
                    ..TaskInput::new("Draft")
                },
            )
            .unwrap();

        let updated = db
            .update_task(
                task.id,
                user.id,
                &TaskInput {
                    description: "second pass".to_string(),
                    category_ids: vec![home.id],
                    ..TaskInput::new("Final").with_priority(Priority::Low)
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description, "second pass");
        assert_eq!(updated.priority, Priority::Low);
        assert_eq!(updated.categories, vec![home]);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn owner_guards_hide_other_users_tasks() {
        let db = setup_db();
        let alice = create_user(&db, "alice");
        let bob = create_user(&db, "bob");
        let task = db.create_task(alice.id, &TaskInput::new("Private")).unwrap();

        assert!(db.get_task(task.id, bob.id).unwrap().is_none());

        let err = db
            .update_task(task.id, bob.id, &TaskInput::new("Hijacked"))
            .unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);

        let err = db.complete_task(task.id, bob.id).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);

        let err = db.delete_task(task.id, bob.id).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);

        let unchanged = db.get_task(task.id, alice.id).unwrap().unwrap();
        assert_eq!(unchanged.title, "Private");
        assert_eq!(unchanged.status, TaskStatus::Pending);
    }

    #[test]
    fn delete_removes_task() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let task = db.create_task(user.id, &TaskInput::new("Gone")).unwrap();

        db.delete_task(task.id, user.id).unwrap();
        assert!(db.get_task(task.id, user.id).unwrap().is_none());

        let err = db.delete_task(task.id, user.id).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
    }

    #[test]
    fn completing_sets_status_and_timestamp() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let created = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        let task = db
            .create_task_at(user.id, &TaskInput::new("Finish"), created)
            .unwrap();

        let first_done = created + Duration::hours(2);
        let done = db.complete_task_at(task.id, user.id, first_done).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.completed_at, Some(first_done));
        assert!(done.completed_at.unwrap() >= done.created_at);

        let again = db
            .complete_task_at(task.id, user.id, first_done + Duration::hours(1))
            .unwrap();
        assert_eq!(again.status, TaskStatus::Completed);
        assert_ne!(again.completed_at, done.completed_at);
    }

    #[test]
    fn list_tasks_is_scoped_and_ordered_by_id() {
        let db = setup_db();
        let alice = create_user(&db, "alice");
        let bob = create_user(&db, "bob");

        let first = db.create_task(alice.id, &TaskInput::new("one")).unwrap();
        db.create_task(bob.id, &TaskInput::new("bob's")).unwrap();
        let second = db.create_task(alice.id, &TaskInput::new("two")).unwrap();

        let ids: Vec<i64> = db.list_tasks(alice.id).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn deleting_user_cascades() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let work = db.get_or_create_category(user.id, "Work").unwrap();
        let task = db
            .create_task(
                user.id,
                &TaskInput {
                    category_ids: vec![work.id],
                    ..TaskInput::new("Doomed")
                },
            )
            .unwrap();

        assert!(db.delete_user(user.id).unwrap());
        assert!(db.get_task(task.id, user.id).unwrap().is_none());
        assert!(db.list_categories(user.id).unwrap().is_empty());
        assert!(db.task_categories(task.id).unwrap().is_empty());
    }
}

mod summary_tests {
    use super::*;

    #[test]
    fn dashboard_over_stored_tasks() {
        let db = setup_db();
        let user = create_user(&db, "alice");
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap();
        let created = now - Duration::days(3);

        let a = db
            .create_task_at(
                user.id,
                &TaskInput::new("A")
                    .with_priority(Priority::High)
                    .with_due_date(parse_date("2024-06-11").unwrap()),
                created,
            )
            .unwrap();
        let b = db
            .create_task_at(
                user.id,
                &TaskInput::new("B")
                    .with_priority(Priority::Low)
                    .with_due_date(parse_date("2024-06-10").unwrap()),
                created,
            )
            .unwrap();
        let late = db
            .create_task_at(
                user.id,
                &TaskInput::new("Late").with_due_date(parse_date("2024-06-01").unwrap()),
                created,
            )
            .unwrap();
        let done = db
            .create_task_at(user.id, &TaskInput::new("Done"), created)
            .unwrap();
        db.complete_task_at(done.id, user.id, now - Duration::hours(1))
            .unwrap();

        let view = dashboard_view(db.list_tasks(user.id).unwrap(), now, &FixedPicker(0));
        let summary = &view.summary;
        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.pending_count, 3);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.tasks_completed_today, 1);
        assert_eq!(summary.tasks_completed_week, 1);
        assert_eq!(summary.overdue_tasks, 1);

        let reminder_ids: Vec<i64> = summary.reminders.iter().map(|t| t.id).collect();
        assert_eq!(reminder_ids, vec![b.id, a.id]);

        let order: Vec<i64> = view.tasks.iter().map(|t| t.id).collect();
        assert_eq!(order[0], a.id);
        assert_eq!(order.last(), Some(&b.id));
        assert!(order.contains(&late.id));
    }
}
