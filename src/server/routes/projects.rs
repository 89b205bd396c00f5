use crate::models::{MessageResponse, Page, Project, ProjectCreate, ProjectUpdate, now_unix};
use crate::server::AppState;
use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

const NOT_FOUND: &str = "Project not found";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/public/list", get(list_public_projects))
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
}

async fn create_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(body): ApiJson<ProjectCreate>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    body.validate().map_err(ApiError::Unprocessable)?;
    let user_id = current.user.id;
    let project = state
        .storage
        .run(move |s| s.create_project(user_id, &body, now_unix()))
        .await?;
    tracing::info!(user_id, project_id = project.id, "created project");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Project>>, ApiError> {
    page.validate().map_err(ApiError::Unprocessable)?;
    let user_id = current.user.id;
    let projects = state
        .storage
        .run(move |s| s.list_projects(user_id, page))
        .await?;
    Ok(Json(projects))
}

async fn list_public_projects(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Page>,
) -> Result<Json<Vec<Project>>, ApiError> {
    page.validate().map_err(ApiError::Unprocessable)?;
    let projects = state
        .storage
        .run(move |s| s.list_public_projects(page))
        .await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(project_id): ApiPath<i64>,
) -> Result<Json<Project>, ApiError> {
    let user_id = current.user.id;
    state
        .storage
        .run(move |s| s.get_project(project_id, user_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn update_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(project_id): ApiPath<i64>,
    ApiJson(update): ApiJson<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    update.validate().map_err(ApiError::Unprocessable)?;
    let user_id = current.user.id;
    let project = state
        .storage
        .run(move |s| {
            let Some(mut project) = s.get_project(project_id, user_id)? else {
                return Ok(None);
            };
            update.apply(&mut project);
            project.updated_at = now_unix();
            s.save_project(&project)?;
            Ok(Some(project))
        })
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(project_id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = current.user.id;
    let deleted = state
        .storage
        .run(move |s| s.delete_project(project_id, user_id))
        .await?;
    if !deleted {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    tracing::info!(user_id, project_id, "deleted project");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}
