use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::db;
use crate::error::AppError;
use crate::forms::{FormPayload, ProjectForm};
use crate::models::Project;
use crate::state::SharedState;
use crate::urls::Route;

#[derive(Template)]
#[template(path = "projects/index.html")]
struct IndexTemplate {
    projects: Vec<Project>,
    form: ProjectForm,
    action: &'static str,
}

async fn render_index(state: &SharedState, form: ProjectForm) -> Result<Response, AppError> {
    let projects = db::projects::list_all(&state.pool).await?;
    let template = IndexTemplate {
        projects,
        form,
        action: Route::ProjectsIndex.path(),
    };
    Ok(Html(template.render()?).into_response())
}

/// `GET /projects/`: every project plus an empty entry form.
pub async fn index(State(state): State<SharedState>) -> Result<Response, AppError> {
    render_index(&state, ProjectForm::unbound()).await
}

/// `POST /projects/`: create a project and redirect back to the index,
/// or re-render the page with the bound form and its errors.
pub async fn create(
    State(state): State<SharedState>,
    payload: FormPayload,
) -> Result<Response, AppError> {
    let form = ProjectForm::bind(payload);

    match form.validate() {
        Ok(cleaned) => {
            cleaned.save(&state.pool, &state.media, None).await?;
            tracing::debug!(route = Route::ProjectsIndex.name(), "Redirecting after create");
            Ok(Redirect::to(Route::ProjectsIndex.path()).into_response())
        }
        Err(errors) => {
            tracing::debug!(
                invalid = ?errors.invalid_fields().collect::<Vec<_>>(),
                "Project form rejected"
            );
            render_index(&state, form.with_errors(errors)).await
        }
    }
}

pub async fn root() -> impl IntoResponse {
    Redirect::to(Route::ProjectsIndex.path())
}
