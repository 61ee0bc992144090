//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `opencourse_test`)
//!   `TEST_DB_PASSWORD` (default: `opencourse_test`)
//!   `TEST_DB_NAME` (default: `opencourse_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use opencourse_common::AppError;
use opencourse_db::entities::{
    Enrollment, LessonProgress, chapter, course, enrollment, lesson, lesson_progress, user,
};
use opencourse_db::repositories::{EnrollmentRepository, LessonProgressRepository};
use opencourse_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply_cleanly() {
    let db = TestDatabase::create_unique().await.expect("Failed to create");

    let result = opencourse_db::migrate(db.connection()).await;
    assert!(result.is_ok(), "Migrations failed: {:?}", result.err());

    db.drop_database().await.expect("Failed to drop");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_execute_query() {
    let db = TestDatabase::new().await.expect("Failed to connect");

    // Connection should be valid
    use sea_orm::ConnectionTrait;
    let result = db
        .connection()
        .execute(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await;

    assert!(result.is_ok(), "Query failed: {:?}", result.err());
}

async fn seed_user(conn: &DatabaseConnection, id: &str, role: user::UserRole) {
    user::ActiveModel {
        id: Set(id.to_string()),
        email: Set(format!("{id}@example.com")),
        email_lower: Set(format!("{id}@example.com")),
        name: Set("Test User".to_string()),
        bio: Set(None),
        avatar_url: Set(None),
        role: Set(role),
        password_hash: Set("$argon2id$stub".to_string()),
        token: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .expect("Failed to insert user");
}

async fn seed_course(conn: &DatabaseConnection, id: &str, owner_id: &str) {
    course::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(owner_id.to_string()),
        title: Set("Rust Basics".to_string()),
        description: Set("Learn Rust from scratch".to_string()),
        small_description: Set("Rust from zero".to_string()),
        slug: Set(format!("rust-basics-{id}")),
        image_url: Set(None),
        price: Set(None),
        duration: Set(10),
        level: Set(course::CourseLevel::Beginner),
        category: Set("Development".to_string()),
        status: Set(course::CourseStatus::Published),
        requirements: Set(serde_json::json!([])),
        what_you_will_learn: Set(serde_json::json!([])),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .expect("Failed to insert course");
}

async fn seed_chapter(conn: &DatabaseConnection, id: &str, course_id: &str) {
    chapter::ActiveModel {
        id: Set(id.to_string()),
        course_id: Set(course_id.to_string()),
        title: Set("Chapter".to_string()),
        position: Set(0),
        is_published: Set(true),
        is_free: Set(false),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .expect("Failed to insert chapter");
}

async fn seed_lesson(conn: &DatabaseConnection, id: &str, chapter_id: &str) {
    lesson::ActiveModel {
        id: Set(id.to_string()),
        chapter_id: Set(chapter_id.to_string()),
        title: Set("Lesson".to_string()),
        description: Set(None),
        video_url: Set(None),
        position: Set(0),
        is_published: Set(true),
        is_free: Set(false),
        duration: Set(Some(15)),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .expect("Failed to insert lesson");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_progress_upsert_twice_keeps_one_row() {
    let db = TestDatabase::create_unique().await.expect("Failed to create");
    opencourse_db::migrate(db.connection())
        .await
        .expect("Migrations failed");

    let conn = Arc::new(
        Database::connect(&db.config.database_url())
            .await
            .expect("Failed to connect"),
    );
    seed_user(&conn, "u1", user::UserRole::Instructor).await;
    seed_user(&conn, "u2", user::UserRole::Student).await;
    seed_course(&conn, "c1", "u1").await;
    seed_chapter(&conn, "ch1", "c1").await;
    seed_lesson(&conn, "l1", "ch1").await;

    let repo = LessonProgressRepository::new(conn.clone());
    let first = repo
        .upsert("p1".to_string(), "u2".to_string(), "l1".to_string(), true)
        .await
        .expect("First upsert failed");
    let second = repo
        .upsert("p2".to_string(), "u2".to_string(), "l1".to_string(), false)
        .await
        .expect("Second upsert failed");

    // The second write lands on the row the first one created.
    assert_eq!(second.id, first.id);
    assert!(first.is_completed);
    assert!(!second.is_completed);

    let rows = LessonProgress::find()
        .filter(lesson_progress::Column::UserId.eq("u2"))
        .filter(lesson_progress::Column::LessonId.eq("l1"))
        .count(conn.as_ref())
        .await
        .expect("Count failed");
    assert_eq!(rows, 1);

    drop(repo);
    drop(conn);
    db.drop_database().await.expect("Failed to drop");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_enrollment_insert_is_conflict() {
    let db = TestDatabase::create_unique().await.expect("Failed to create");
    opencourse_db::migrate(db.connection())
        .await
        .expect("Migrations failed");

    let conn = Arc::new(
        Database::connect(&db.config.database_url())
            .await
            .expect("Failed to connect"),
    );
    seed_user(&conn, "u1", user::UserRole::Instructor).await;
    seed_user(&conn, "u2", user::UserRole::Student).await;
    seed_course(&conn, "c1", "u1").await;

    let repo = EnrollmentRepository::new(conn.clone());
    repo.create(enrollment::ActiveModel {
        id: Set("e1".to_string()),
        user_id: Set("u2".to_string()),
        course_id: Set("c1".to_string()),
        created_at: Set(Utc::now().into()),
    })
    .await
    .expect("First enrollment failed");

    let result = repo
        .create(enrollment::ActiveModel {
            id: Set("e2".to_string()),
            user_id: Set("u2".to_string()),
            course_id: Set("c1".to_string()),
            created_at: Set(Utc::now().into()),
        })
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let rows = Enrollment::find()
        .count(conn.as_ref())
        .await
        .expect("Count failed");
    assert_eq!(rows, 1);

    drop(repo);
    drop(conn);
    db.drop_database().await.expect("Failed to drop");
}

#[test]
fn test_config_from_env() {
    // Test that default config is valid
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
