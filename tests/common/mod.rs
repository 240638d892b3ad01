#![allow(dead_code)]

use aakar_backend::db::{connect_in_memory, repository};
use aakar_backend::models::{Caller, Role, User};
use sqlx::SqlitePool;

pub async fn setup_test_db() -> SqlitePool {
    connect_in_memory()
        .await
        .expect("Failed to create test database")
}

pub fn user(id: &str, role: Role, batch: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.com", id),
        role,
        batch: batch.map(str::to_string),
    }
}

pub async fn seed_user(pool: &SqlitePool, id: &str, role: Role, batch: Option<&str>) -> Caller {
    let user = user(id, role, batch);
    repository::insert_user(pool, &user)
        .await
        .expect("Failed to insert user");
    Caller::from(user)
}

pub async fn seed_assignment(
    pool: &SqlitePool,
    id: &str,
    teacher_id: &str,
    batch: &str,
    created_at: &str,
    submission_date: Option<&str>,
) {
    sqlx::query(
        r#"
        INSERT INTO assignments (id, title, teacher_id, batch, created_at, submission_date, solution)
        VALUES (?, ?, ?, ?, ?, ?, NULL)
        "#,
    )
    .bind(id)
    .bind(format!("Assignment {}", id))
    .bind(teacher_id)
    .bind(batch)
    .bind(created_at)
    .bind(submission_date)
    .execute(pool)
    .await
    .expect("Failed to insert assignment");
}

/// `2025-01-01T00:00:SS.000Z`-style timestamps, one second apart.
pub fn second(n: u32) -> String {
    format!("2025-01-01T00:{:02}:{:02}.000Z", n / 60, n % 60)
}
