//! Generic administrative console.
//!
//! Entities become manageable by registering a [`ModelAdmin`] descriptor with
//! the [`AdminSite`]. The console views in `views::admin` only talk to the
//! trait, so they render change lists and change forms for any registered
//! model.

pub mod pagination;
pub mod project;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::forms::FormPayload;
use crate::state::AppState;

pub use pagination::Paginator;
pub use project::ProjectAdmin;

/// One line of a change list: the object id plus one rendered cell per `list_display` column.
#[derive(Debug, Clone)]
pub struct AdminRow {
    pub id: Uuid,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Text,
    TextArea,
    Number,
    Date,
    Checkbox,
    Image,
}

/// A field of a rendered change form.
#[derive(Debug, Clone)]
pub struct AdminField {
    pub name: &'static str,
    pub label: String,
    pub widget: Widget,
    pub required: bool,
    pub value: String,
    pub max_length: Option<usize>,
    /// URL of the file currently stored for file widgets.
    pub current_file: Option<String>,
    pub errors: Vec<String>,
}

impl AdminField {
    pub fn is_textarea(&self) -> bool {
        self.widget == Widget::TextArea
    }

    pub fn is_file(&self) -> bool {
        self.widget == Widget::Image
    }

    pub fn is_checkbox(&self) -> bool {
        self.widget == Widget::Checkbox
    }

    /// A checkbox field is checked when its value is `"on"`.
    pub fn is_checked(&self) -> bool {
        self.is_checkbox() && self.value == "on"
    }

    /// `type` attribute for widgets rendered as a plain `<input>`.
    pub fn input_type(&self) -> &'static str {
        match self.widget {
            Widget::Number => "number",
            Widget::Date => "date",
            Widget::Checkbox => "checkbox",
            Widget::Image => "file",
            Widget::Text | Widget::TextArea => "text",
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdminForm {
    pub fields: Vec<AdminField>,
    pub non_field_errors: Vec<String>,
}

impl AdminForm {
    pub fn is_multipart(&self) -> bool {
        self.fields.iter().any(AdminField::is_file)
    }

    pub fn has_errors(&self) -> bool {
        !self.non_field_errors.is_empty() || self.fields.iter().any(AdminField::has_errors)
    }
}

pub enum SaveOutcome {
    Saved { id: Uuid, label: String },
    Invalid(AdminForm),
}

/// Presentation and persistence hooks for one entity in the console.
#[async_trait]
pub trait ModelAdmin: Send + Sync {
    /// URL segment, e.g. `projects` in `/admin/projects/`.
    fn slug(&self) -> &'static str;
    fn verbose_name(&self) -> &'static str;
    fn verbose_name_plural(&self) -> &'static str;
    fn list_display(&self) -> &'static [&'static str];
    fn search_fields(&self) -> &'static [&'static str];

    fn list_per_page(&self) -> i64 {
        100
    }

    async fn count(&self, state: &AppState, search: Option<&str>) -> Result<i64, AppError>;

    async fn rows(
        &self,
        state: &AppState,
        search: Option<&str>,
        paginator: &Paginator,
    ) -> Result<Vec<AdminRow>, AppError>;

    /// Human readable label of one object, `None` if it does not exist.
    async fn object_label(&self, state: &AppState, id: Uuid) -> Result<Option<String>, AppError>;

    fn add_form(&self) -> AdminForm;

    async fn change_form(&self, state: &AppState, id: Uuid) -> Result<Option<AdminForm>, AppError>;

    /// Validate and persist a submission. `id` is `None` when adding.
    async fn save(
        &self,
        state: &AppState,
        id: Option<Uuid>,
        payload: FormPayload,
    ) -> Result<SaveOutcome, AppError>;

    /// Returns whether the object existed.
    async fn delete(&self, state: &AppState, id: Uuid) -> Result<bool, AppError>;
}

/// Turn a field name into a column heading: `created_at` -> `Created at`.
pub fn column_label(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Registry of models exposed through the console.
pub struct AdminSite {
    pub title: String,
    models: HashMap<String, Arc<dyn ModelAdmin>>,
}

impl AdminSite {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            models: HashMap::new(),
        }
    }

    pub fn register(&mut self, model: Arc<dyn ModelAdmin>) {
        tracing::debug!(model = model.slug(), "Registered admin model");
        self.models.insert(model.slug().to_string(), model);
    }

    pub fn get(&self, slug: &str) -> Option<&Arc<dyn ModelAdmin>> {
        self.models.get(slug)
    }

    pub fn is_registered(&self, slug: &str) -> bool {
        self.models.contains_key(slug)
    }

    /// Registered models sorted by their plural name.
    pub fn list(&self) -> Vec<&Arc<dyn ModelAdmin>> {
        let mut models: Vec<_> = self.models.values().collect();
        models.sort_by_key(|m| m.verbose_name_plural());
        models
    }
}

/// The console as served by the application.
pub fn site() -> AdminSite {
    let mut site = AdminSite::new("Showcase administration");
    site.register(Arc::new(ProjectAdmin));
    site
}
