use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::admin::{column_label, AdminForm, ModelAdmin, Paginator, SaveOutcome};
use crate::auth::extractor::{StaffUser, SESSION_COOKIE};
use crate::auth::jwt::{self, Claims, SESSION_HOURS};
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::forms::FormPayload;
use crate::state::SharedState;
use crate::urls::{self, Route};

const INVALID_LOGIN: &str =
    "Please enter the correct email and password for a staff account.";

#[derive(Template)]
#[template(path = "admin/login.html")]
struct LoginTemplate {
    site_title: String,
    email: String,
    error: Option<String>,
    action: &'static str,
}

#[allow(dead_code)]
struct ModelLink {
    name: String,
    changelist_url: String,
    add_url: String,
}

#[derive(Template)]
#[template(path = "admin/index.html")]
struct IndexTemplate {
    site_title: String,
    user_name: String,
    logout_url: &'static str,
    models: Vec<ModelLink>,
}

#[derive(Template)]
#[template(path = "admin/change_list.html")]
struct ChangeListTemplate {
    site_title: String,
    user_name: String,
    logout_url: &'static str,
    index_url: &'static str,
    model_name: String,
    model_name_plural: String,
    columns: Vec<String>,
    rows: Vec<RowLink>,
    search: String,
    searchable: bool,
    total: i64,
    paginator: Paginator,
    previous_url: Option<String>,
    next_url: Option<String>,
    add_url: String,
}

#[allow(dead_code)]
struct RowLink {
    change_url: String,
    cells: Vec<String>,
}

fn page_url(search: &str, page: i64) -> String {
    if search.is_empty() {
        return format!("?page={page}");
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", search)
        .append_pair("page", &page.to_string())
        .finish();
    format!("?{query}")
}

#[derive(Template)]
#[template(path = "admin/change_form.html")]
struct ChangeFormTemplate {
    site_title: String,
    user_name: String,
    logout_url: &'static str,
    index_url: &'static str,
    changelist_url: String,
    model_name: String,
    title: String,
    form: AdminForm,
    delete_url: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/delete_confirmation.html")]
struct DeleteTemplate {
    site_title: String,
    user_name: String,
    logout_url: &'static str,
    index_url: &'static str,
    changelist_url: String,
    change_url: String,
    model_name: String,
    object_label: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangeListQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
}

fn html<T: Template>(template: T) -> Result<Response, AppError> {
    Ok(Html(template.render()?).into_response())
}

fn lookup(state: &SharedState, model: &str) -> Result<Arc<dyn ModelAdmin>, AppError> {
    state
        .admin
        .get(model)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No admin registered for '{model}'")))
}

fn missing(admin: &dyn ModelAdmin, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("No {} with id {id}", admin.verbose_name()))
}

fn object_id(admin: &dyn ModelAdmin, raw: &str) -> Result<Uuid, AppError> {
    urls::parse_id(raw).ok_or_else(|| missing(admin, raw))
}

async fn display_name(state: &SharedState, staff: &StaffUser) -> Result<String, AppError> {
    Ok(db::admin_users::find_by_id(&state.pool, staff.user_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| staff.email.clone()))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_HOURS))
        .build()
}

fn login_page_with(
    state: &SharedState,
    email: String,
    error: Option<String>,
) -> Result<Response, AppError> {
    html(LoginTemplate {
        site_title: state.admin.title.clone(),
        email,
        error,
        action: Route::AdminLogin.path(),
    })
}

pub async fn login_page(State(state): State<SharedState>, jar: CookieJar) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if jwt::decode_token(cookie.value(), &state.config.jwt_secret).is_ok() {
            return Ok(Redirect::to(Route::AdminIndex.path()).into_response());
        }
    }
    login_page_with(&state, String::new(), None)
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(req): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = req.email.trim().to_string();

    if let Err(retry_after) = state.login_limiter.check(&email) {
        tracing::warn!(email = %email, "Console login rate limited");
        let mut response = login_page_with(
            &state,
            email,
            Some(format!(
                "Too many login attempts. Try again in {} minutes.",
                retry_after.div_ceil(60).max(1)
            )),
        )?;
        *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        return Ok(response);
    }

    let user = db::admin_users::find_by_email(&state.pool, &email).await?;
    let valid = match &user {
        Some(user) => password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?,
        None => {
            password::verify_unknown_account(&req.password);
            false
        }
    };

    let Some(user) = user.filter(|_| valid) else {
        state.login_limiter.record_failure(&email);
        tracing::info!(email = %email, "Console login failed");
        return login_page_with(&state, email, Some(INVALID_LOGIN.to_string()));
    };

    state.login_limiter.reset(&email);

    let token = jwt::encode_token(&Claims::new(user.id, user.email.clone()), &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, "Console login");
    let jar = jar.add(session_cookie(token, state.config.secure_cookies));
    Ok((jar, Redirect::to(Route::AdminIndex.path())).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let cleared = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    (jar.add(cleared), Redirect::to(Route::AdminLogin.path()))
}

pub async fn index(staff: StaffUser, State(state): State<SharedState>) -> Result<Response, AppError> {
    let models = state
        .admin
        .list()
        .into_iter()
        .map(|m| ModelLink {
            name: column_label(m.verbose_name_plural()),
            changelist_url: urls::admin_changelist(m.slug()),
            add_url: urls::admin_add(m.slug()),
        })
        .collect();

    html(IndexTemplate {
        site_title: state.admin.title.clone(),
        user_name: display_name(&state, &staff).await?,
        logout_url: Route::AdminLogout.path(),
        models,
    })
}

pub async fn changelist(
    staff: StaffUser,
    State(state): State<SharedState>,
    Path(model): Path<String>,
    Query(query): Query<ChangeListQuery>,
) -> Result<Response, AppError> {
    let admin = lookup(&state, &model)?;

    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty() && !admin.search_fields().is_empty());

    let total = admin.count(&state, search).await?;
    let paginator = Paginator::new(query.page.unwrap_or(1), admin.list_per_page(), total);
    let rows = admin
        .rows(&state, search, &paginator)
        .await?
        .into_iter()
        .map(|row| RowLink {
            change_url: urls::admin_change(admin.slug(), row.id),
            cells: row.cells,
        })
        .collect();
    let search = search.unwrap_or_default().to_string();
    let previous_url = paginator
        .has_previous()
        .then(|| page_url(&search, paginator.previous()));
    let next_url = paginator
        .has_next()
        .then(|| page_url(&search, paginator.next()));

    html(ChangeListTemplate {
        site_title: state.admin.title.clone(),
        user_name: display_name(&state, &staff).await?,
        logout_url: Route::AdminLogout.path(),
        index_url: Route::AdminIndex.path(),
        model_name: admin.verbose_name().to_string(),
        model_name_plural: column_label(admin.verbose_name_plural()),
        columns: admin.list_display().iter().map(|c| column_label(c)).collect(),
        rows,
        search,
        searchable: !admin.search_fields().is_empty(),
        total,
        paginator,
        previous_url,
        next_url,
        add_url: urls::admin_add(admin.slug()),
    })
}

async fn render_change_form(
    state: &SharedState,
    staff: &StaffUser,
    admin: &dyn ModelAdmin,
    id: Option<Uuid>,
    form: AdminForm,
) -> Result<Response, AppError> {
    let title = match id {
        Some(_) => format!("Change {}", admin.verbose_name()),
        None => format!("Add {}", admin.verbose_name()),
    };

    html(ChangeFormTemplate {
        site_title: state.admin.title.clone(),
        user_name: display_name(state, staff).await?,
        logout_url: Route::AdminLogout.path(),
        index_url: Route::AdminIndex.path(),
        changelist_url: urls::admin_changelist(admin.slug()),
        model_name: column_label(admin.verbose_name_plural()),
        title,
        form,
        delete_url: id.map(|id| urls::admin_delete(admin.slug(), id)),
    })
}

async fn handle_save(
    state: &SharedState,
    staff: &StaffUser,
    admin: &dyn ModelAdmin,
    id: Option<Uuid>,
    payload: FormPayload,
) -> Result<Response, AppError> {
    match admin.save(state, id, payload).await? {
        SaveOutcome::Saved { id, label } => {
            tracing::info!(
                model = admin.slug(),
                object_id = %id,
                object = %label,
                staff = %staff.email,
                "Saved through admin console"
            );
            Ok(Redirect::to(&urls::admin_changelist(admin.slug())).into_response())
        }
        SaveOutcome::Invalid(form) => render_change_form(state, staff, admin, id, form).await,
    }
}

pub async fn add_page(
    staff: StaffUser,
    State(state): State<SharedState>,
    Path(model): Path<String>,
) -> Result<Response, AppError> {
    let admin = lookup(&state, &model)?;
    let form = admin.add_form();
    render_change_form(&state, &staff, admin.as_ref(), None, form).await
}

pub async fn add(
    staff: StaffUser,
    State(state): State<SharedState>,
    Path(model): Path<String>,
    payload: FormPayload,
) -> Result<Response, AppError> {
    let admin = lookup(&state, &model)?;
    handle_save(&state, &staff, admin.as_ref(), None, payload).await
}

pub async fn change_page(
    staff: StaffUser,
    State(state): State<SharedState>,
    Path((model, raw_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let admin = lookup(&state, &model)?;
    let id = object_id(admin.as_ref(), &raw_id)?;
    let form = admin
        .change_form(&state, id)
        .await?
        .ok_or_else(|| missing(admin.as_ref(), id))?;
    render_change_form(&state, &staff, admin.as_ref(), Some(id), form).await
}

pub async fn change(
    staff: StaffUser,
    State(state): State<SharedState>,
    Path((model, raw_id)): Path<(String, String)>,
    payload: FormPayload,
) -> Result<Response, AppError> {
    let admin = lookup(&state, &model)?;
    let id = object_id(admin.as_ref(), &raw_id)?;
    handle_save(&state, &staff, admin.as_ref(), Some(id), payload).await
}

pub async fn delete_page(
    staff: StaffUser,
    State(state): State<SharedState>,
    Path((model, raw_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let admin = lookup(&state, &model)?;
    let id = object_id(admin.as_ref(), &raw_id)?;
    let object_label = admin
        .object_label(&state, id)
        .await?
        .ok_or_else(|| missing(admin.as_ref(), id))?;

    html(DeleteTemplate {
        site_title: state.admin.title.clone(),
        user_name: display_name(&state, &staff).await?,
        logout_url: Route::AdminLogout.path(),
        index_url: Route::AdminIndex.path(),
        changelist_url: urls::admin_changelist(admin.slug()),
        change_url: urls::admin_change(admin.slug(), id),
        model_name: admin.verbose_name().to_string(),
        object_label,
    })
}

pub async fn delete(
    staff: StaffUser,
    State(state): State<SharedState>,
    Path((model, raw_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let admin = lookup(&state, &model)?;
    let id = object_id(admin.as_ref(), &raw_id)?;
    if !admin.delete(&state, id).await? {
        return Err(missing(admin.as_ref(), id));
    }
    tracing::info!(model = admin.slug(), object_id = %id, staff = %staff.email, "Deleted through admin console");
    Ok(Redirect::to(&urls::admin_changelist(admin.slug())).into_response())
}
