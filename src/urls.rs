//! Named routes. Handlers and templates resolve paths through these names
//! instead of spelling them out.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ProjectsIndex,
    AdminIndex,
    AdminLogin,
    AdminLogout,
}

impl Route {
    pub fn name(self) -> &'static str {
        match self {
            Route::ProjectsIndex => "projects_index",
            Route::AdminIndex => "admin_index",
            Route::AdminLogin => "admin_login",
            Route::AdminLogout => "admin_logout",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::ProjectsIndex => "/projects/",
            Route::AdminIndex => "/admin/",
            Route::AdminLogin => "/admin/login/",
            Route::AdminLogout => "/admin/logout/",
        }
    }
}

pub fn admin_changelist(model: &str) -> String {
    format!("/admin/{model}/")
}

pub fn admin_add(model: &str) -> String {
    format!("/admin/{model}/add/")
}

pub fn admin_change(model: &str, id: Uuid) -> String {
    format!("/admin/{model}/{id}/change/")
}

pub fn admin_delete(model: &str, id: Uuid) -> String {
    format!("/admin/{model}/{id}/delete/")
}

/// Object id taken from a URL segment. Text that is not a UUID cannot name
/// any stored object, so callers report it as not found.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_routes() {
        assert_eq!(Route::ProjectsIndex.name(), "projects_index");
        assert_eq!(Route::ProjectsIndex.path(), "/projects/");
        assert_eq!(Route::AdminLogin.path(), "/admin/login/");
    }

    #[test]
    fn admin_paths() {
        let id = Uuid::nil();
        assert_eq!(admin_changelist("projects"), "/admin/projects/");
        assert_eq!(admin_add("projects"), "/admin/projects/add/");
        assert_eq!(
            admin_change("projects", id),
            "/admin/projects/00000000-0000-0000-0000-000000000000/change/"
        );
        assert!(admin_delete("projects", id).ends_with("/delete/"));
    }

    #[test]
    fn ids_from_paths() {
        assert_eq!(
            parse_id("0192f0c1-0000-7000-8000-000000000000").map(|id| id.get_version_num()),
            Some(7)
        );
        assert_eq!(parse_id("not-a-uuid"), None);
        assert_eq!(parse_id(""), None);
    }
}
