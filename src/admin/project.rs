use async_trait::async_trait;
use uuid::Uuid;

use crate::admin::{
    column_label, AdminField, AdminForm, AdminRow, ModelAdmin, Paginator, SaveOutcome, Widget,
};
use crate::db;
use crate::error::AppError;
use crate::forms::{FormPayload, ProjectForm, CATEGORY_MAX_LENGTH, TITLE_MAX_LENGTH};
use crate::models::Project;
use crate::state::AppState;

const DESCRIPTION_PREVIEW_CHARS: usize = 80;

/// Console descriptor for projects: newest first, searchable by title, description and category.
pub struct ProjectAdmin;

impl ProjectAdmin {
    fn row(project: &Project) -> AdminRow {
        let dash = || "-".to_string();
        AdminRow {
            id: project.id,
            cells: vec![
                project.title.clone(),
                Some(project.category.clone())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(dash),
                truncate(&project.description, DESCRIPTION_PREVIEW_CHARS),
                project.image.clone().unwrap_or_else(dash),
                funding(project),
                project.backers.to_string(),
                if project.featured { "Yes" } else { "No" }.to_string(),
                project.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ],
        }
    }

    fn form(form: &ProjectForm) -> AdminForm {
        let field = |name: &'static str, widget: Widget, value: &str| AdminField {
            name,
            label: column_label(name),
            widget,
            required: false,
            value: value.to_string(),
            max_length: None,
            current_file: None,
            errors: form.errors.field(name).to_vec(),
        };

        AdminForm {
            fields: vec![
                AdminField {
                    required: true,
                    max_length: Some(TITLE_MAX_LENGTH),
                    ..field("title", Widget::Text, &form.title)
                },
                AdminField {
                    required: true,
                    ..field("description", Widget::TextArea, &form.description)
                },
                AdminField {
                    max_length: Some(CATEGORY_MAX_LENGTH),
                    ..field("category", Widget::Text, &form.category)
                },
                field("funded_amount", Widget::Number, &form.funded_amount),
                field("goal_amount", Widget::Number, &form.goal_amount),
                field("backers", Widget::Number, &form.backers),
                field("ends_on", Widget::Date, &form.ends_on),
                field(
                    "featured",
                    Widget::Checkbox,
                    if form.featured { "on" } else { "" },
                ),
                AdminField {
                    current_file: form.current_image.clone(),
                    ..field("image", Widget::Image, "")
                },
            ],
            non_field_errors: form.errors.non_field().to_vec(),
        }
    }
}

/// `$2.4M of $5.0M (48%)`, or just the pledged amount without a goal.
fn funding(project: &Project) -> String {
    if project.goal_amount <= 0 {
        return project.funded_display();
    }
    format!(
        "{} of {} ({:.0}%)",
        project.funded_display(),
        project.goal_display(),
        project.funding_percentage()
    )
}

#[async_trait]
impl ModelAdmin for ProjectAdmin {
    fn slug(&self) -> &'static str {
        "projects"
    }

    fn verbose_name(&self) -> &'static str {
        "project"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "projects"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &[
            "title",
            "category",
            "description",
            "image",
            "funding",
            "backers",
            "featured",
            "created_at",
        ]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["title", "description", "category"]
    }

    fn list_per_page(&self) -> i64 {
        25
    }

    async fn count(&self, state: &AppState, search: Option<&str>) -> Result<i64, AppError> {
        Ok(db::projects::count_matching(&state.pool, search).await?)
    }

    async fn rows(
        &self,
        state: &AppState,
        search: Option<&str>,
        paginator: &Paginator,
    ) -> Result<Vec<AdminRow>, AppError> {
        let projects =
            db::projects::search(&state.pool, search, paginator.per_page, paginator.offset())
                .await?;
        Ok(projects.iter().map(Self::row).collect())
    }

    async fn object_label(&self, state: &AppState, id: Uuid) -> Result<Option<String>, AppError> {
        Ok(db::projects::find_by_id(&state.pool, id)
            .await?
            .map(|p| p.title))
    }

    fn add_form(&self) -> AdminForm {
        Self::form(&ProjectForm::unbound())
    }

    async fn change_form(&self, state: &AppState, id: Uuid) -> Result<Option<AdminForm>, AppError> {
        Ok(db::projects::find_by_id(&state.pool, id)
            .await?
            .map(|p| Self::form(&ProjectForm::for_instance(&p))))
    }

    async fn save(
        &self,
        state: &AppState,
        id: Option<Uuid>,
        payload: FormPayload,
    ) -> Result<SaveOutcome, AppError> {
        let existing = match id {
            Some(id) => Some(
                db::projects::find_by_id(&state.pool, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?,
            ),
            None => None,
        };

        let form = ProjectForm::bind(payload)
            .with_current_image(existing.as_ref().and_then(Project::image_url));

        match form.validate() {
            Ok(cleaned) => {
                let project = cleaned
                    .save(&state.pool, &state.media, existing.as_ref())
                    .await?;
                Ok(SaveOutcome::Saved {
                    id: project.id,
                    label: project.title,
                })
            }
            Err(errors) => Ok(SaveOutcome::Invalid(Self::form(&form.with_errors(errors)))),
        }
    }

    async fn delete(&self, state: &AppState, id: Uuid) -> Result<bool, AppError> {
        let Some(project) = db::projects::find_by_id(&state.pool, id).await? else {
            return Ok(false);
        };
        let deleted = db::projects::delete(&state.pool, id).await?;
        if deleted {
            if let Some(image) = &project.image {
                state.media.delete(image).await;
            }
            tracing::info!(project_id = %id, "Project deleted");
        }
        Ok(deleted)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}\u{2026}", cut.trim_end())
}
