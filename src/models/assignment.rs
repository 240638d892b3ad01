use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::limits::{
    DEFAULT_SUBMISSION_DAYS, MAX_ASSIGNMENT_TITLE_LENGTH, MAX_SOLUTION_LENGTH, MAX_TASKS,
};
use crate::models::task::NewTaskRequest;
use crate::models::user::{User, UserRow};
use crate::timestamp::{self, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub title: Option<String>,
    pub teacher_id: String,
    pub batch: String,
    pub created_at: String,
    pub submission_date: Option<String>,
    pub solution: Option<String>,
    pub teacher: User,
}

/// Assignment joined with its owner, as selected by every read query.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: String,
    pub title: Option<String>,
    pub teacher_id: String,
    pub batch: String,
    pub created_at: String,
    pub submission_date: Option<String>,
    pub solution: Option<String>,
    pub teacher_name: String,
    pub teacher_email: String,
    pub teacher_role: String,
    pub teacher_batch: Option<String>,
}

impl AssignmentRow {
    /// Column list matching the fields above. Expects `assignments a` joined
    /// to `users u`.
    pub const SELECT_COLUMNS: &'static str = "a.id, a.title, a.teacher_id, a.batch, \
        a.created_at, a.submission_date, a.solution, \
        u.name AS teacher_name, u.email AS teacher_email, \
        u.role AS teacher_role, u.batch AS teacher_batch";
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let teacher = User::try_from(UserRow {
            id: row.teacher_id.clone(),
            name: row.teacher_name,
            email: row.teacher_email,
            role: row.teacher_role,
            batch: row.teacher_batch,
        })
        .map_err(|e| {
            tracing::error!("corrupt teacher row for assignment {}: {}", row.id, e);
            AppError::InternalServerError
        })?;

        Ok(Assignment {
            id: row.id,
            title: row.title,
            teacher_id: row.teacher_id,
            batch: row.batch,
            created_at: row.created_at,
            submission_date: row.submission_date,
            solution: row.solution,
            teacher,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignmentRequest {
    pub batch: String,
    pub title: Option<String>,
    pub submission_date: Option<String>,
    pub tasks: Vec<NewTaskRequest>,
}

impl NewAssignmentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_batch(&self.batch)?;
        validate_title(self.title.as_deref())?;

        if self.tasks.is_empty() {
            return Err(AppError::BadRequest(
                "Assignment must have at least one task".to_string(),
            ));
        }
        if self.tasks.len() > MAX_TASKS {
            return Err(AppError::BadRequest(format!(
                "Assignment can't have more than {} tasks",
                MAX_TASKS
            )));
        }
        for task in &self.tasks {
            task.validate()?;
        }

        Ok(())
    }

    /// The stored deadline: the requested one, or the default window.
    pub fn resolve_submission_date(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        match self.submission_date.as_deref() {
            Some(raw) => parse_submission_date(raw, now),
            None => Ok(timestamp::format(now + Duration::days(DEFAULT_SUBMISSION_DAYS))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub batch: Option<String>,
    pub title: Option<String>,
    pub submission_date: Option<String>,
    pub solution: Option<String>,
}

impl UpdateAssignmentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(batch) = &self.batch {
            validate_batch(batch)?;
        }
        validate_title(self.title.as_deref())?;
        if let Some(solution) = &self.solution {
            if solution.chars().count() > MAX_SOLUTION_LENGTH {
                return Err(AppError::BadRequest(format!(
                    "Solution can't exceed {} characters",
                    MAX_SOLUTION_LENGTH
                )));
            }
        }
        Ok(())
    }
}

fn validate_batch(batch: &str) -> Result<(), AppError> {
    if batch.trim().is_empty() {
        return Err(AppError::BadRequest("Batch is required".to_string()));
    }
    Ok(())
}

fn validate_title(title: Option<&str>) -> Result<(), AppError> {
    match title {
        Some(title) if title.chars().count() > MAX_ASSIGNMENT_TITLE_LENGTH => {
            Err(AppError::BadRequest(format!(
                "Assignment title can't exceed {} characters",
                MAX_ASSIGNMENT_TITLE_LENGTH
            )))
        }
        _ => Ok(()),
    }
}

/// Normalizes a requested deadline, which must lie in the future.
pub fn parse_submission_date(raw: &str, now: DateTime<Utc>) -> Result<String, AppError> {
    let instant = Instant::parse(raw)
        .ok_or_else(|| AppError::BadRequest("Invalid submission date".to_string()))?;
    let deadline = instant.start();
    if deadline <= now {
        return Err(AppError::BadRequest("Invalid submission date".to_string()));
    }
    Ok(timestamp::format(deadline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(title: &str) -> NewTaskRequest {
        NewTaskRequest {
            title: title.to_string(),
            remarks: None,
            links: None,
        }
    }

    fn request(tasks: Vec<NewTaskRequest>) -> NewAssignmentRequest {
        NewAssignmentRequest {
            batch: "2081".to_string(),
            title: Some("Linked lists".to_string()),
            submission_date: None,
            tasks,
        }
    }

    #[test]
    fn test_requires_between_one_and_max_tasks() {
        assert!(request(vec![]).validate().is_err());
        assert!(request(vec![task("reverse a list")]).validate().is_ok());

        let too_many = (0..=MAX_TASKS).map(|i| task(&format!("task {}", i))).collect();
        assert!(request(too_many).validate().is_err());
    }

    #[test]
    fn test_rejects_long_title_and_blank_batch() {
        let mut req = request(vec![task("t")]);
        req.title = Some("x".repeat(MAX_ASSIGNMENT_TITLE_LENGTH + 1));
        assert!(req.validate().is_err());

        let mut req = request(vec![task("t")]);
        req.batch = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_submission_date_defaults_to_window() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let req = request(vec![task("t")]);
        assert_eq!(
            req.resolve_submission_date(now).unwrap(),
            "2025-01-31T12:00:00.000Z"
        );
    }

    #[test]
    fn test_submission_date_must_be_in_future() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert!(parse_submission_date("2024-12-31", now).is_err());
        assert!(parse_submission_date("2025-01-01", now).is_err());
        assert!(parse_submission_date("someday", now).is_err());
        assert_eq!(
            parse_submission_date("2025-01-02", now).unwrap(),
            "2025-01-02T00:00:00.000Z"
        );
    }

    #[test]
    fn test_row_with_unknown_role_is_rejected() {
        let row = AssignmentRow {
            id: "a1".into(),
            title: None,
            teacher_id: "t1".into(),
            batch: "2081".into(),
            created_at: "2025-01-01T00:00:00.000Z".into(),
            submission_date: None,
            solution: None,
            teacher_name: "T".into(),
            teacher_email: "t@example.com".into(),
            teacher_role: "janitor".into(),
            teacher_batch: None,
        };
        assert!(Assignment::try_from(row).is_err());
    }
}
