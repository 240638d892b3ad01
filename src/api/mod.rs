pub mod extract;
pub mod identity;

use axum::Json;
use axum::extract::Path;
use axum::middleware;
use axum::routing::put;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::error::AppError;
use crate::models::*;
use crate::query::{AssignmentPage, AssignmentQueryParams};
use crate::services::{AssignmentService, CreatedAssignment, require_staff, require_teacher};
use crate::state::AppState;

pub use extract::{ApiJson, ApiQuery};
pub use identity::{Identity, USER_ID_HEADER};

#[derive(Serialize)]
struct AssignmentResponse {
    assignment: Assignment,
}

#[derive(Serialize)]
struct TasksResponse {
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskResponse {
    task: Task,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/{id}",
            get(get_assignment).put(update_assignment).delete(delete_assignment),
        )
        .route("/assignments/{id}/tasks", get(list_tasks))
        .route(
            "/assignments/{id}/tasks/{task_id}",
            put(update_task).delete(delete_task),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity::resolve_identity,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_assignments(
    State(state): State<AppState>,
    identity: Identity,
    ApiQuery(params): ApiQuery<AssignmentQueryParams>,
) -> Result<Json<AssignmentPage>, AppError> {
    let service = AssignmentService::new(state.db.clone());
    let page = service.list(identity.caller(), &params).await?;
    Ok(Json(page))
}

async fn create_assignment(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<ApiJson<NewAssignmentRequest>, AppError>,
) -> Result<(StatusCode, Json<CreatedAssignment>), AppError> {
    require_teacher(identity.caller())?;
    let ApiJson(req) = body?;
    let service = AssignmentService::new(state.db.clone());
    let created = service.create(identity.caller(), req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let service = AssignmentService::new(state.db.clone());
    let assignment = service.detail(&id).await?;
    Ok(Json(AssignmentResponse { assignment }))
}

async fn update_assignment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    body: Result<ApiJson<UpdateAssignmentRequest>, AppError>,
) -> Result<Json<AssignmentResponse>, AppError> {
    require_staff(identity.caller(), "update")?;
    let ApiJson(req) = body?;
    let service = AssignmentService::new(state.db.clone());
    let assignment = service.update(identity.caller(), &id, req).await?;
    Ok(Json(AssignmentResponse { assignment }))
}

async fn delete_assignment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = AssignmentService::new(state.db.clone());
    service.delete(identity.caller(), &id).await?;
    Ok(Json(MessageResponse {
        message: "Assignment deleted successfully".to_string(),
    }))
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TasksResponse>, AppError> {
    let service = AssignmentService::new(state.db.clone());
    let tasks = service.tasks(&id).await?;
    Ok(Json(TasksResponse { tasks }))
}

async fn update_task(
    State(state): State<AppState>,
    identity: Identity,
    Path((id, task_id)): Path<(String, String)>,
    body: Result<ApiJson<UpdateTaskRequest>, AppError>,
) -> Result<Json<TaskResponse>, AppError> {
    require_staff(identity.caller(), "update")?;
    let ApiJson(req) = body?;
    let service = AssignmentService::new(state.db.clone());
    let task = service.update_task(identity.caller(), &id, &task_id, req).await?;
    Ok(Json(TaskResponse { task }))
}

async fn delete_task(
    State(state): State<AppState>,
    identity: Identity,
    Path((id, task_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = AssignmentService::new(state.db.clone());
    service.delete_task(identity.caller(), &id, &task_id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
