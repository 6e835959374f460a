pub mod admin;
pub mod projects;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;
use crate::urls::Route;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(projects::root))
        .route(
            Route::ProjectsIndex.path(),
            get(projects::index).post(projects::create),
        )
}

/// Admin console pages. Unauthenticated requests are redirected to the login page
/// by the layer applied in `build_app`.
pub fn admin_routes() -> Router<SharedState> {
    Router::new()
        .route(Route::AdminIndex.path(), get(admin::index))
        .route(
            Route::AdminLogin.path(),
            get(admin::login_page).post(admin::login),
        )
        .route(Route::AdminLogout.path(), post(admin::logout))
        .route("/admin/{model}/", get(admin::changelist))
        .route("/admin/{model}/add/", get(admin::add_page).post(admin::add))
        .route(
            "/admin/{model}/{id}/change/",
            get(admin::change_page).post(admin::change),
        )
        .route(
            "/admin/{model}/{id}/delete/",
            get(admin::delete_page).post(admin::delete),
        )
}
