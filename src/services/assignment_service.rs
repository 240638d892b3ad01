use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::assignment::parse_submission_date;
use crate::models::{
    Assignment, Caller, NewAssignmentRequest, Role, Task, UpdateAssignmentRequest,
    UpdateTaskRequest,
};
use crate::query::{self, AssignmentPage, AssignmentQueryParams};

pub struct AssignmentService {
    db: SqlitePool,
}

#[derive(Debug, Serialize)]
pub struct CreatedAssignment {
    pub assignment: Assignment,
    pub tasks: Vec<Task>,
}

impl AssignmentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        caller: Option<&Caller>,
        params: &AssignmentQueryParams,
    ) -> Result<AssignmentPage, AppError> {
        query::query_assignments(&self.db, caller, params).await
    }

    pub async fn create(
        &self,
        caller: Option<&Caller>,
        req: NewAssignmentRequest,
    ) -> Result<CreatedAssignment, AppError> {
        let teacher_id = require_teacher(caller)?.to_string();

        req.validate()?;
        let now = Utc::now();
        let submission_date = req.resolve_submission_date(now)?;

        let (assignment, tasks) =
            repository::insert_assignment(&self.db, &teacher_id, req, submission_date, now).await?;
        info!(
            "assignment {} posted by {} for batch {} with {} tasks",
            assignment.id,
            teacher_id,
            assignment.batch,
            tasks.len()
        );

        Ok(CreatedAssignment { assignment, tasks })
    }

    pub async fn detail(&self, id: &str) -> Result<Assignment, AppError> {
        repository::find_assignment_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment does not exist".to_string()))
    }

    pub async fn update(
        &self,
        caller: Option<&Caller>,
        id: &str,
        req: UpdateAssignmentRequest,
    ) -> Result<Assignment, AppError> {
        let caller = require_staff(caller, "update")?;
        req.validate()?;
        let submission_date = req
            .submission_date
            .as_deref()
            .map(|raw| parse_submission_date(raw, Utc::now()))
            .transpose()?;

        self.owned_assignment(caller, id).await?;

        let assignment = repository::update_assignment(&self.db, id, req, submission_date)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;
        info!("assignment {} updated by {:?}", id, caller.id);
        Ok(assignment)
    }

    pub async fn delete(&self, caller: Option<&Caller>, id: &str) -> Result<(), AppError> {
        let caller = require_staff(caller, "delete")?;
        self.owned_assignment(caller, id).await?;

        if !repository::delete_assignment(&self.db, id).await? {
            return Err(AppError::NotFound("Assignment not found".to_string()));
        }
        info!("assignment {} deleted by {:?}", id, caller.id);
        Ok(())
    }

    pub async fn tasks(&self, assignment_id: &str) -> Result<Vec<Task>, AppError> {
        self.detail(assignment_id).await?;
        repository::fetch_tasks(&self.db, assignment_id).await
    }

    pub async fn update_task(
        &self,
        caller: Option<&Caller>,
        assignment_id: &str,
        task_id: &str,
        req: UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        let caller = require_staff(caller, "update")?;
        req.validate()?;
        self.owned_assignment(caller, assignment_id).await?;

        repository::update_task(&self.db, assignment_id, task_id, req)
            .await?
            .ok_or_else(|| AppError::NotFound("Task does not exist".to_string()))
    }

    pub async fn delete_task(
        &self,
        caller: Option<&Caller>,
        assignment_id: &str,
        task_id: &str,
    ) -> Result<(), AppError> {
        let caller = require_staff(caller, "delete")?;
        self.owned_assignment(caller, assignment_id).await?;

        if !repository::delete_task(&self.db, assignment_id, task_id).await? {
            return Err(AppError::NotFound("Task does not exist".to_string()));
        }
        Ok(())
    }

    /// Loads the assignment, requiring the caller to own it unless admin.
    async fn owned_assignment(&self, caller: &Caller, id: &str) -> Result<Assignment, AppError> {
        let assignment = self.detail(id).await?;
        if !caller.is_admin() && caller.id.as_deref() != Some(assignment.teacher_id.as_str()) {
            warn!(
                "{:?} tried to modify assignment {} owned by {}",
                caller.id, id, assignment.teacher_id
            );
            return Err(AppError::Forbidden(
                "Teacher does not belong to the assignment".to_string(),
            ));
        }
        Ok(assignment)
    }
}

/// Returns the id of a caller allowed to post assignments.
pub fn require_teacher(caller: Option<&Caller>) -> Result<&str, AppError> {
    let caller = caller.ok_or(AppError::Unauthorized)?;
    match (&caller.id, caller.role) {
        (Some(id), Some(Role::Teacher)) => Ok(id.as_str()),
        _ => Err(AppError::Forbidden(
            "Only teachers can post assignments".to_string(),
        )),
    }
}

pub fn require_staff<'a>(
    caller: Option<&'a Caller>,
    action: &str,
) -> Result<&'a Caller, AppError> {
    let caller = caller.ok_or(AppError::Unauthorized)?;
    if !caller.has_role(&[Role::Teacher, Role::Admin]) {
        return Err(AppError::Forbidden(format!(
            "Only teachers or admins can {} assignments",
            action
        )));
    }
    Ok(caller)
}
