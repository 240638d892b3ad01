use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Assignment, AssignmentRow, NewAssignmentRequest, Task, TaskRow, UpdateAssignmentRequest,
    UpdateTaskRequest, User, UserRow,
};
use crate::timestamp;

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, role, batch FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(|row| {
        User::try_from(row).map_err(|e| {
            tracing::error!("corrupt user row {}: {}", id, e);
            AppError::InternalServerError
        })
    })
    .transpose()
}

pub async fn insert_user(db: &SqlitePool, user: &User) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO users (id, name, email, role, batch, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role.as_str())
    .bind(&user.batch)
    .bind(timestamp::now())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_assignment_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<Assignment>, AppError> {
    let sql = format!(
        "SELECT {} FROM assignments a INNER JOIN users u ON a.teacher_id = u.id WHERE a.id = ?",
        AssignmentRow::SELECT_COLUMNS
    );
    sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?
        .map(Assignment::try_from)
        .transpose()
}

/// Inserts an assignment and its tasks atomically.
pub async fn insert_assignment(
    db: &SqlitePool,
    teacher_id: &str,
    req: NewAssignmentRequest,
    submission_date: String,
    now: DateTime<Utc>,
) -> Result<(Assignment, Vec<Task>), AppError> {
    let id = Uuid::new_v4().to_string();
    let created_at = timestamp::format(now);

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO assignments
            (id, title, teacher_id, batch, created_at, submission_date, solution)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(teacher_id)
    .bind(&req.batch)
    .bind(&created_at)
    .bind(&submission_date)
    .execute(&mut *tx)
    .await?;

    let mut tasks = Vec::with_capacity(req.tasks.len());
    for (position, task) in req.tasks.into_iter().enumerate() {
        let task_id = Uuid::new_v4().to_string();
        let links = task.links.unwrap_or_default();
        let links_json = serde_json::to_string(&links).map_err(|e| {
            tracing::error!("failed to encode task links: {}", e);
            AppError::InternalServerError
        })?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, assignment_id, position, title, remarks, links)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&task_id)
        .bind(&id)
        .bind(position as i64)
        .bind(&task.title)
        .bind(&task.remarks)
        .bind(&links_json)
        .execute(&mut *tx)
        .await?;

        tasks.push(Task {
            id: task_id,
            assignment_id: id.clone(),
            title: task.title,
            remarks: task.remarks,
            links,
        });
    }

    tx.commit().await?;

    let assignment = find_assignment_by_id(db, &id)
        .await?
        .ok_or(AppError::InternalServerError)?;
    Ok((assignment, tasks))
}

pub async fn update_assignment(
    db: &SqlitePool,
    id: &str,
    req: UpdateAssignmentRequest,
    submission_date: Option<String>,
) -> Result<Option<Assignment>, AppError> {
    let Some(mut current) = find_assignment_by_id(db, id).await? else {
        return Ok(None);
    };

    if let Some(batch) = req.batch {
        current.batch = batch;
    }
    if let Some(title) = req.title {
        current.title = Some(title);
    }
    if let Some(submission_date) = submission_date {
        current.submission_date = Some(submission_date);
    }
    if let Some(solution) = req.solution {
        current.solution = Some(solution);
    }

    sqlx::query(
        r#"
        UPDATE assignments
        SET batch = ?1,
            title = ?2,
            submission_date = ?3,
            solution = ?4
        WHERE id = ?5
        "#,
    )
    .bind(&current.batch)
    .bind(&current.title)
    .bind(&current.submission_date)
    .bind(&current.solution)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

/// Tasks go with their assignment through `ON DELETE CASCADE`.
pub async fn delete_assignment(db: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_tasks(db: &SqlitePool, assignment_id: &str) -> Result<Vec<Task>, AppError> {
    sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, assignment_id, title, remarks, links
        FROM tasks
        WHERE assignment_id = ?
        ORDER BY position ASC, id ASC
        "#,
    )
    .bind(assignment_id)
    .fetch_all(db)
    .await?
    .into_iter()
    .map(Task::try_from)
    .collect()
}

pub async fn find_task(
    db: &SqlitePool,
    assignment_id: &str,
    task_id: &str,
) -> Result<Option<Task>, AppError> {
    sqlx::query_as::<_, TaskRow>(
        "SELECT id, assignment_id, title, remarks, links FROM tasks WHERE id = ? AND assignment_id = ?",
    )
    .bind(task_id)
    .bind(assignment_id)
    .fetch_optional(db)
    .await?
    .map(Task::try_from)
    .transpose()
}

pub async fn update_task(
    db: &SqlitePool,
    assignment_id: &str,
    task_id: &str,
    req: UpdateTaskRequest,
) -> Result<Option<Task>, AppError> {
    let Some(mut current) = find_task(db, assignment_id, task_id).await? else {
        return Ok(None);
    };

    if let Some(title) = req.title {
        current.title = title;
    }
    if let Some(remarks) = req.remarks {
        current.remarks = Some(remarks);
    }
    if let Some(links) = req.links {
        current.links = links;
    }
    let links_json = serde_json::to_string(&current.links).map_err(|e| {
        tracing::error!("failed to encode task links: {}", e);
        AppError::InternalServerError
    })?;

    sqlx::query("UPDATE tasks SET title = ?1, remarks = ?2, links = ?3 WHERE id = ?4")
        .bind(&current.title)
        .bind(&current.remarks)
        .bind(&links_json)
        .bind(task_id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

pub async fn delete_task(
    db: &SqlitePool,
    assignment_id: &str,
    task_id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND assignment_id = ?")
        .bind(task_id)
        .bind(assignment_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
