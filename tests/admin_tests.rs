mod common;

use reqwest::StatusCode;

async fn first_project_id(app: &common::TestApp) -> uuid::Uuid {
    let row: (uuid::Uuid,) = sqlx::query_as("SELECT id FROM projects ORDER BY created_at LIMIT 1")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    row.0
}

// ── Authentication ──────────────────────────────────────────────

#[tokio::test]
async fn console_redirects_anonymous_users_to_login() {
    let app = common::spawn_app().await;

    for path in ["/admin/", "/admin/projects/", "/admin/projects/add/"] {
        let resp = app.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(common::location(&resp), "/admin/login/");
    }

    let resp = app.get("/admin/login/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("name=\"password\""));

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_with_valid_credentials() {
    let app = common::spawn_app().await;

    let (cookie, status) = app.login(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(cookie.is_some());

    let resp = app.get_admin("/admin/", &cookie.unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Site administration"));
    assert!(html.contains("Welcome, <strong>admin</strong>"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = common::spawn_app().await;

    let (cookie, status) = app.login(common::ADMIN_EMAIL, "wrongpassword").await;
    assert_eq!(status, StatusCode::OK);
    assert!(cookie.is_none());

    let (cookie, _) = app.login("nobody@test.com", common::ADMIN_PASSWORD).await;
    assert!(cookie.is_none());

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_is_rate_limited() {
    let app = common::spawn_app().await;

    for _ in 0..5 {
        let (_, status) = app.login(common::ADMIN_EMAIL, "wrongpassword").await;
        assert_eq!(status, StatusCode::OK);
    }

    // Even the right password is refused while locked out
    let (cookie, status) = app.login(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(cookie.is_none());

    common::cleanup(app).await;
}

#[tokio::test]
async fn forged_session_is_rejected() {
    let app = common::spawn_app().await;

    let resp = app
        .get_admin("/admin/", "access_token=not.a.jwt")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/admin/login/");

    common::cleanup(app).await;
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    let resp = app.post_admin("/admin/logout/", &session, &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/admin/login/");
    let cleared = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("access_token=;") || v.starts_with("access_token=\"\""));
    assert!(cleared);

    common::cleanup(app).await;
}

// ── Registration ────────────────────────────────────────────────

#[tokio::test]
async fn project_is_registered_in_console() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    let html = app.get_admin("/admin/", &session).await.text().await.unwrap();
    assert!(html.contains("href=\"/admin/projects/\""));
    assert!(html.contains("href=\"/admin/projects/add/\""));

    let resp = app.get_admin("/admin/widgets/", &session).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Change list ─────────────────────────────────────────────────

#[tokio::test]
async fn changelist_shows_projects_newest_first() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    app.post_project(&[("title", "Older project"), ("description", "first")])
        .await;
    app.post_project(&[("title", "Newer project"), ("description", "second")])
        .await;

    let resp = app.get_admin("/admin/projects/", &session).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    for heading in ["Title", "Description", "Image", "Created at"] {
        assert!(html.contains(&format!("<th scope=\"col\">{heading}</th>")), "{heading}");
    }
    let newer = html.find("Newer project").unwrap();
    let older = html.find("Older project").unwrap();
    assert!(newer < older);

    common::cleanup(app).await;
}

#[tokio::test]
async fn changelist_search_filters_rows() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    app.post_project(&[("title", "Lunar Rover"), ("description", "Moon driving")])
        .await;
    app.post_project(&[("title", "Mars Lab"), ("description", "Soil analysis")])
        .await;

    let html = app
        .get_admin("/admin/projects/?q=soil", &session)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("Mars Lab"));
    assert!(!html.contains("Lunar Rover"));
    assert!(html.contains("1 result"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn changelist_paginates() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    for i in 0..30 {
        let title = format!("Project {i:02}");
        app.post_project(&[("title", title.as_str()), ("description", "d")])
            .await;
    }

    let first = app
        .get_admin("/admin/projects/", &session)
        .await
        .text()
        .await
        .unwrap();
    assert!(first.contains("Page 1 of 2"));
    assert!(first.contains("Project 29"));
    assert!(!first.contains("Project 00"));
    assert!(first.contains("href=\"?page=2\""));

    let second = app
        .get_admin("/admin/projects/?page=2", &session)
        .await
        .text()
        .await
        .unwrap();
    assert!(second.contains("Page 2 of 2"));
    assert!(second.contains("Project 00"));

    common::cleanup(app).await;
}

// ── Add / change / delete ───────────────────────────────────────

#[tokio::test]
async fn add_through_console() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    let form = app
        .get_admin("/admin/projects/add/", &session)
        .await
        .text()
        .await
        .unwrap();
    assert!(form.contains("Add project"));
    assert!(form.contains("enctype=\"multipart/form-data\""));

    let resp = app
        .post_admin(
            "/admin/projects/add/",
            &session,
            &[("title", "Console project"), ("description", "Made by staff")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/admin/projects/");
    assert_eq!(app.project_count().await, 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn invalid_console_add_rerenders_errors() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    let resp = app
        .post_admin("/admin/projects/add/", &session, &[("title", "Only title")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Please correct the errors below."));
    assert!(html.contains("This field is required."));
    assert!(html.contains("value=\"Only title\""));
    assert_eq!(app.project_count().await, 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn change_through_console() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    app.post_project(&[("title", "Draft"), ("description", "Needs work")])
        .await;
    let id = first_project_id(&app).await;
    let path = format!("/admin/projects/{id}/change/");

    let form = app.get_admin(&path, &session).await.text().await.unwrap();
    assert!(form.contains("Change project"));
    assert!(form.contains("value=\"Draft\""));
    assert!(form.contains("Needs work"));

    let resp = app
        .post_admin(&path, &session, &[("title", "Final"), ("description", "Done")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let row: (String, String) = sqlx::query_as("SELECT title, description FROM projects WHERE id = $1")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row, ("Final".to_string(), "Done".to_string()));
    assert_eq!(app.project_count().await, 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn clearing_image_removes_file() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    app.post_project_with_image("Pictured", "Has an image", "p.png", common::PNG_1X1)
        .await;
    let id = first_project_id(&app).await;
    let (image,): (Option<String>,) = sqlx::query_as("SELECT image FROM projects WHERE id = $1")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let image = image.unwrap();
    assert!(app.media.path().join(&image).exists());

    let path = format!("/admin/projects/{id}/change/");
    let form = app.get_admin(&path, &session).await.text().await.unwrap();
    assert!(form.contains("Currently:"));

    let resp = app
        .post_admin(
            &path,
            &session,
            &[("title", "Pictured"), ("description", "Has an image"), ("image-clear", "on")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let (after,): (Option<String>,) = sqlx::query_as("SELECT image FROM projects WHERE id = $1")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(after, None);
    assert!(!app.media.path().join(&image).exists());

    common::cleanup(app).await;
}

#[tokio::test]
async fn delete_through_console() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    app.post_project(&[("title", "Doomed"), ("description", "Short lived")])
        .await;
    let id = first_project_id(&app).await;
    let path = format!("/admin/projects/{id}/delete/");

    let confirm = app.get_admin(&path, &session).await.text().await.unwrap();
    assert!(confirm.contains("Are you sure"));
    assert!(confirm.contains("Doomed"));

    let resp = app.post_admin(&path, &session, &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), "/admin/projects/");
    assert_eq!(app.project_count().await, 0);

    let resp = app.post_admin(&path, &session, &[]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn campaign_fields_through_console() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    let form = app
        .get_admin("/admin/projects/add/", &session)
        .await
        .text()
        .await
        .unwrap();
    assert!(form.contains("type=\"number\" name=\"funded_amount\""));
    assert!(form.contains("type=\"date\" name=\"ends_on\""));
    assert!(form.contains("type=\"checkbox\" name=\"featured\""));

    let resp = app
        .post_admin(
            "/admin/projects/add/",
            &session,
            &[
                ("title", "Zero-G Manufacturing"),
                ("description", "Materials in microgravity"),
                ("category", "Manufacturing"),
                ("funded_amount", "1900000"),
                ("goal_amount", "4500000"),
                ("backers", "891"),
                ("ends_on", "2030-01-31"),
                ("featured", "on"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let row: (String, i64, i64, i32, bool) = sqlx::query_as(
        "SELECT category, funded_amount, goal_amount, backers, featured FROM projects",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(row, ("Manufacturing".to_string(), 1_900_000, 4_500_000, 891, true));

    let html = app.get_admin("/admin/projects/", &session).await.text().await.unwrap();
    assert!(html.contains("$1.9M of $4.5M (42%)"));
    assert!(html.contains("<td>891</td>"));
    assert!(html.contains("<td>Yes</td>"));

    let html = app
        .get_admin("/admin/projects/?q=manufact", &session)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("1 result"));

    let id = first_project_id(&app).await;
    let form = app
        .get_admin(&format!("/admin/projects/{id}/change/"), &session)
        .await
        .text()
        .await
        .unwrap();
    assert!(form.contains("value=\"2030-01-31\""));
    assert!(form.contains("name=\"featured\" id=\"id_featured\" checked"));

    let resp = app
        .post_admin(
            "/admin/projects/add/",
            &session,
            &[("title", "t"), ("description", "d"), ("backers", "-3")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("greater than or equal to 0"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn malformed_object_id_is_404() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    for path in [
        "/admin/projects/not-a-uuid/change/",
        "/admin/projects/not-a-uuid/delete/",
    ] {
        let resp = app.get_admin(path, &session).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));
    }

    let resp = app
        .post_admin("/admin/projects/not-a-uuid/delete/", &session, &[])
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn unknown_email_login_fails_like_wrong_password() {
    let app = common::spawn_app().await;

    let (cookie, status) = app.login("ghost@test.com", "whatever-password").await;
    assert_eq!(status, StatusCode::OK);
    assert!(cookie.is_none());

    let (_, status) = app.login(common::ADMIN_EMAIL, "whatever-password").await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn unknown_object_is_404() {
    let app = common::spawn_app().await;
    let session = app.admin_session().await;

    let missing = "0192f0c1-0000-7000-8000-000000000000";
    for path in [
        format!("/admin/projects/{missing}/change/"),
        format!("/admin/projects/{missing}/delete/"),
    ] {
        let resp = app.get_admin(&path, &session).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
    }

    let resp = app
        .post_admin(
            &format!("/admin/projects/{missing}/change/"),
            &session,
            &[("title", "t"), ("description", "d")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}
