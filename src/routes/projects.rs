use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::db::projects::ProjectSort;
use crate::error::AppError;
use crate::models::Project;
use crate::state::SharedState;
use crate::urls;

/// Project as exposed to API clients, with the image resolved to a URL and
/// the campaign progress precomputed for card rendering.
#[derive(Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub image_url: Option<String>,
    pub funding_percentage: f64,
    pub days_left: Option<i64>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            image_url: project.image_url(),
            funding_percentage: project.funding_percentage(),
            days_left: project.days_left(),
            project,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub sort: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let sort = match query.sort.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<ProjectSort>().map_err(AppError::BadRequest)?,
        None => ProjectSort::default(),
    };
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    let projects = db::projects::list(&state.pool, category, sort).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let not_found = || AppError::NotFound("Project not found".to_string());
    let id = urls::parse_id(&id).ok_or_else(not_found)?;
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(project.into()))
}

pub async fn categories(State(state): State<SharedState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(db::projects::categories(&state.pool).await?))
}
