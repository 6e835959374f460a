use chrono::NaiveDate;
use sqlx::PgPool;

use crate::db;
use crate::error::AppError;
use crate::forms::{FormErrors, FormPayload, UploadedFile};
use crate::media::{self, MediaStorage};
use crate::models::{Campaign, NewProject, Project};

pub const TITLE_MAX_LENGTH: usize = 200;

pub const CATEGORY_MAX_LENGTH: usize = 100;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

const REQUIRED: &str = "This field is required.";
const NULL_CHARACTERS: &str = "Null characters are not allowed.";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// What to do with the stored image when a form is saved.
#[derive(Debug, Clone)]
pub enum ImageChange {
    Keep,
    Replace(UploadedFile),
    Clear,
}

/// Output of a successful `ProjectForm::validate`.
#[derive(Debug, Clone)]
pub struct CleanedProject {
    pub project: NewProject,
    pub image: ImageChange,
}

impl CleanedProject {
    /// Persist the cleaned values: insert when `existing` is `None`, update otherwise.
    ///
    /// A new upload is written before the row; it is removed again if the
    /// database write fails. An image replaced or cleared by a successful
    /// save is deleted from storage.
    pub async fn save(
        self,
        pool: &PgPool,
        media: &MediaStorage,
        existing: Option<&Project>,
    ) -> Result<Project, AppError> {
        let previous = existing.and_then(|p| p.image.clone());

        let (image, stored_now) = match &self.image {
            ImageChange::Keep => (previous.clone(), None),
            ImageChange::Clear => (None, None),
            ImageChange::Replace(upload) => {
                let path = media.save_image(upload).await?;
                (Some(path.clone()), Some(path))
            }
        };

        let result = match existing {
            Some(project) => {
                db::projects::update(pool, project.id, &self.project, image.as_deref()).await
            }
            None => db::projects::create(pool, &self.project, image.as_deref()).await,
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                if let Some(path) = &stored_now {
                    media.delete(path).await;
                }
                return Err(e.into());
            }
        };

        if let Some(old) = previous.filter(|old| image.as_deref() != Some(old.as_str())) {
            media.delete(&old).await;
        }

        match existing {
            Some(_) => tracing::info!(project_id = %saved.id, "Project updated"),
            None => tracing::info!(project_id = %saved.id, title = %saved.title, "Project created"),
        }

        Ok(saved)
    }
}

/// Entry form for a project, shared by the public index page and the admin console.
///
/// An unbound form renders empty; a bound form carries the submitted values
/// so the page can be re-rendered with them after a failed validation.
/// Campaign fields are kept as submitted text until `validate` parses them.
#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub funded_amount: String,
    pub goal_amount: String,
    pub backers: String,
    /// `YYYY-MM-DD`, as sent by a date input.
    pub ends_on: String,
    pub featured: bool,
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
    /// URL of the image already stored for the edited project.
    pub current_image: Option<String>,
    pub errors: FormErrors,
    payload_error: Option<String>,
    bound: bool,
}

impl ProjectForm {
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Unbound form pre-filled from an existing record.
    pub fn for_instance(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            category: project.category.clone(),
            funded_amount: project.funded_amount.to_string(),
            goal_amount: project.goal_amount.to_string(),
            backers: project.backers.to_string(),
            ends_on: project
                .ends_on
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            featured: project.featured,
            current_image: project.image_url(),
            ..Self::default()
        }
    }

    pub fn bind(payload: FormPayload) -> Self {
        let mut payload = payload;
        let mut take = |name: &str| payload.fields.remove(name).unwrap_or_default();
        let title = take("title");
        let description = take("description");
        let category = take("category");
        let funded_amount = take("funded_amount");
        let goal_amount = take("goal_amount");
        let backers = take("backers");
        let ends_on = take("ends_on");
        Self {
            title,
            description,
            category,
            funded_amount,
            goal_amount,
            backers,
            ends_on,
            featured: payload.checkbox("featured"),
            clear_image: payload.checkbox("image-clear"),
            image: payload.files.remove("image"),
            current_image: None,
            errors: FormErrors::default(),
            payload_error: payload.parse_error,
            bound: true,
        }
    }

    pub fn with_current_image(mut self, current_image: Option<String>) -> Self {
        self.current_image = current_image;
        self
    }

    pub fn with_errors(mut self, errors: FormErrors) -> Self {
        self.errors = errors;
        self
    }

    /// Clean the bound values into a `NewProject`, or report every problem found.
    pub fn validate(&self) -> Result<CleanedProject, FormErrors> {
        let mut errors = FormErrors::default();

        if !self.bound {
            errors.add_non_field("No data was submitted.");
            return Err(errors);
        }
        if let Some(e) = &self.payload_error {
            errors.add_non_field(format!("The submission could not be read: {e}"));
        }

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else {
            check_length(&mut errors, "title", title, TITLE_MAX_LENGTH);
            check_no_null(&mut errors, "title", title);
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", REQUIRED);
        } else {
            check_no_null(&mut errors, "description", description);
        }

        let category = self.category.trim();
        check_length(&mut errors, "category", category, CATEGORY_MAX_LENGTH);
        check_no_null(&mut errors, "category", category);

        let funded_amount = clean_count(&mut errors, "funded_amount", &self.funded_amount);
        let goal_amount = clean_count(&mut errors, "goal_amount", &self.goal_amount);
        let backers = match i32::try_from(clean_count(&mut errors, "backers", &self.backers)) {
            Ok(backers) => backers,
            Err(_) => {
                errors.add(
                    "backers",
                    format!("Ensure this value is less than or equal to {}.", i32::MAX),
                );
                0
            }
        };

        let ends_on = match self.ends_on.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("ends_on", "Enter a valid date.");
                    None
                }
            },
        };

        let image = match (&self.image, self.clear_image) {
            (Some(_), true) => {
                errors.add(
                    "image",
                    "Please either submit a file or check the clear checkbox, not both.",
                );
                ImageChange::Keep
            }
            (Some(upload), false) => match check_image(upload) {
                Ok(()) => ImageChange::Replace(upload.clone()),
                Err(message) => {
                    errors.add("image", message);
                    ImageChange::Keep
                }
            },
            (None, true) => ImageChange::Clear,
            (None, false) => ImageChange::Keep,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CleanedProject {
            project: NewProject {
                title: title.to_string(),
                description: description.to_string(),
                campaign: Campaign {
                    category: category.to_string(),
                    funded_amount,
                    goal_amount,
                    backers,
                    ends_on,
                    featured: self.featured,
                },
            },
            image,
        })
    }
}

fn check_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

/// Postgres text columns cannot store U+0000.
fn check_no_null(errors: &mut FormErrors, field: &str, value: &str) {
    if value.contains('\0') {
        errors.add(field, NULL_CHARACTERS);
    }
}

/// Optional non-negative whole number; blank means 0.
fn clean_count(errors: &mut FormErrors, field: &str, raw: &str) -> i64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => value,
        Ok(_) => {
            errors.add(field, "Ensure this value is greater than or equal to 0.");
            0
        }
        Err(_) => {
            errors.add(field, "Enter a whole number.");
            0
        }
    }
}

fn check_image(upload: &UploadedFile) -> Result<(), String> {
    if upload.data.is_empty() {
        return Err("The submitted file is empty.".to_string());
    }

    let ext = upload
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(format!(
            "File extension \u{201c}{ext}\u{201d} is not allowed. Allowed extensions are: {}.",
            IMAGE_EXTENSIONS.join(", ")
        ));
    }

    if media::sniff_image(&upload.data).is_none() {
        return Err(
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                .to_string(),
        );
    }

    Ok(())
}
