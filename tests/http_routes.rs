mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Local};
use common::{Install, body_json, body_text, get_request, json_request, session_cookie_of};
use serde_json::json;
use tower::ServiceExt;

fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn api_login(app: &axum::Router, username: &str, password: &str) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    session_cookie_of(&resp).expect("login did not set a cookie")
}

#[tokio::test]
async fn anonymous_callers_are_turned_away() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);

    let resp = app
        .clone()
        .oneshot(get_request("/api/vehicles", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = app.clone().oneshot(get_request("/home", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login");

    let resp = app.clone().oneshot(get_request("/", None)).await.unwrap();
    assert_eq!(resp.headers()[header::LOCATION], "/login");

    // a forged cookie decrypts to nothing
    let resp = app
        .oneshot(get_request("/api/vehicles", Some("flota_session=forged")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn json_login_opens_a_session() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);

    let resp = app
        .clone()
        .oneshot(get_request("/api/session", None))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "authenticated": false, "username": null, "role": null }));

    let cookie = api_login(&app, "admin", "admin123").await;

    let resp = app
        .clone()
        .oneshot(get_request("/api/session", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(
        body,
        json!({ "authenticated": true, "username": "admin", "role": "admin" })
    );

    let resp = app
        .oneshot(get_request("/api/vehicles", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn wrong_password_is_an_authentication_failure() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({ "username": "admin", "password": "user123" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie_of(&resp).is_none());
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn form_login_redirects_on_both_outcomes() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);

    let resp = app
        .clone()
        .oneshot(form_request("/login", None, "username=user&password=bad"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login?error=1");

    let resp = app
        .clone()
        .oneshot(get_request("/login?error=1", None))
        .await
        .unwrap();
    assert!(body_text(resp).await.contains("Usuario o contraseña incorrectos"));
    let resp = app
        .clone()
        .oneshot(get_request("/login", None))
        .await
        .unwrap();
    assert!(!body_text(resp).await.contains("incorrectos"));

    let resp = app
        .clone()
        .oneshot(form_request("/login", None, "username=user&password=user123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/home");
    let cookie = session_cookie_of(&resp).expect("form login did not set a cookie");

    let resp = app
        .oneshot(get_request("/home", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_text(resp).await;
    assert!(page.contains("Bienvenido, <strong>User</strong> (user)"));
}

#[tokio::test]
async fn regular_users_cannot_reach_admin_routes() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);

    let user = api_login(&app, "user", "user123").await;
    let resp = app
        .clone()
        .oneshot(get_request("/api/accounts", Some(&user)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/backups", Some(&user), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = api_login(&app, "admin", "admin123").await;
    let resp = app
        .oneshot(get_request("/api/accounts", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["admin", "user"]);
    assert!(body[0].get("password_hash").is_none());
}

#[tokio::test]
async fn logout_invalidates_the_cookie() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let cookie = api_login(&app, "user", "user123").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .clone()
        .oneshot(get_request("/api/vehicles", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // logging out twice is harmless
    let resp = app
        .oneshot(json_request("POST", "/api/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn changing_the_password_ends_every_session() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let first = api_login(&app, "user", "user123").await;
    let second = api_login(&app, "user", "user123").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/account/password",
            Some(&first),
            json!({ "current_password": "wrong", "new_password": "brand-new" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/account/password",
            Some(&first),
            json!({ "current_password": "user123", "new_password": "brand-new" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    for cookie in [&first, &second] {
        let resp = app
            .clone()
            .oneshot(get_request("/api/vehicles", Some(cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
    api_login(&app, "user", "brand-new").await;
}

#[tokio::test]
async fn form_login_redirects_on_both_outcomes_dup() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);

    let resp = app
        .clone()
        .oneshot(form_request("/login", None, "username=user&password=bad"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login?error=1");

    let resp = app
        .clone()
        .oneshot(get_request("/login?error=1", None))
        .await
        .unwrap();
    assert!(body_text(resp).await.contains("Usuario o contraseña incorrectos"));
    let resp = app
        .clone()
        .oneshot(get_request("/login", None))
        .await
        .unwrap();
    assert!(!body_text(resp).await.contains("incorrectos"));

    let resp = app
        .clone()
        .oneshot(form_request("/login", None, "username=user&password=user123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/home");
    let cookie = session_cookie_of(&resp).expect("form login did not set a cookie");

    let resp = app
        .oneshot(get_request("/home", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_text(resp).await;
    assert!(page.contains("Bienvenido, <strong>User</strong> (user)"));
}

#[tokio::test]
async fn regular_users_cannot_reach_admin_routes_dup() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);

    let user = api_login(&app, "user", "user123").await;
    let resp = app
        .clone()
        .oneshot(get_request("/api/accounts", Some(&user)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/backups", Some(&user), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = api_login(&app, "admin", "admin123").await;
    let resp = app
        .oneshot(get_request("/api/accounts", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["admin", "user"]);
    assert!(body[0].get("password_hash").is_none());
}

#[tokio::test]
async fn logout_invalidates_the_cookie_dup() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let cookie = api_login(&app, "user", "user123").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .clone()
        .oneshot(get_request("/api/vehicles", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // logging out twice is harmless
    let resp = app
        .oneshot(json_request("POST", "/api/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn changing_the_password_ends_every_session_dup() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let first = api_login(&app, "user", "user123").await;
    let second = api_login(&app, "user", "user123").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/account/password",
            Some(&first),
            json!({ "current_password": "wrong", "new_password": "brand-new" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/account/password",
            Some(&first),
            json!({ "current_password": "user123", "new_password": "brand-new" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    for cookie in [&first, &second] {
        let resp = app
            .clone()
            .oneshot(get_request("/api/vehicles", Some(cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
    api_login(&app, "user", "brand-new").await;
}

#[tokio::test]
async fn vehicles_flow_through_the_api() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let cookie = api_login(&app, "user", "user123").await;
    let expiry = Local::now().date_naive() + Duration::days(5);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles",
            Some(&cookie),
            json!({ "plate": "ab123cd", "kind": "Camioneta", "vtv_expiry": expiry }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["plate"], "AB123CD");

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles",
            Some(&cookie),
            json!({ "plate": "AB123CD" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles/AB123CD/services",
            Some(&cookie),
            json!({ "date": Local::now().date_naive(), "km": 42000, "service_kind": "Frenos" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(get_request("/api/vehicles/AB123CD", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["km"], 42000);

    let resp = app
        .clone()
        .oneshot(get_request("/api/alerts/vtv", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let alerts = body_json(resp).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["days_left"], 5);

    let resp = app
        .clone()
        .oneshot(get_request("/api/alerts/vtv?within_days=-1", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .clone()
        .oneshot(get_request("/api/vehicles/ZZZ999", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/vehicles/AB123CD")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

fn delete_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn fleet_writes_are_reserved_to_administrators() {
    let install = Install::new();
    let state = install.open().await;
    let app = flota::fleet_router(state.clone());
    let admin = api_login(&app, "admin", "admin123").await;
    let user = api_login(&app, "user", "user123").await;
    let today = Local::now().date_naive();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles",
            Some(&admin),
            json!({ "plate": "AB123CD" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/incidents",
            Some(&admin),
            json!({ "plate": "AB123CD", "date": today, "kind": "Choque" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let incident = body_json(resp).await["id"].as_i64().unwrap();

    let writes = [
        json_request("POST", "/api/vehicles", Some(&user), json!({ "plate": "XY987ZW" })),
        json_request(
            "PATCH",
            "/api/vehicles/AB123CD",
            Some(&user),
            json!({ "km": 1 }),
        ),
        delete_request("/api/vehicles/AB123CD", &user),
        json_request(
            "POST",
            "/api/vehicles/AB123CD/services",
            Some(&user),
            json!({ "date": today, "km": 10, "service_kind": "Frenos" }),
        ),
        json_request(
            "POST",
            "/api/incidents",
            Some(&user),
            json!({ "plate": "AB123CD", "date": today, "kind": "Choque" }),
        ),
        json_request(
            "PATCH",
            &format!("/api/incidents/{incident}"),
            Some(&user),
            json!({ "status": "RESUELTO" }),
        ),
        json_request(
            "POST",
            "/api/maintenance",
            Some(&user),
            json!({ "plate": "AB123CD", "scheduled_date": today, "service_kind": "Aceite" }),
        ),
    ];
    for req in writes {
        let label = format!("{} {}", req.method(), req.uri());
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{label}");
        assert_eq!(body_json(resp).await["error"]["code"], "FORBIDDEN");
    }

    // nothing changed underneath
    let vehicles = state.fleet.list_vehicles(None).await.unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].km, 0);
    assert_eq!(state.fleet.incidents(None, None).await.unwrap().len(), 1);
    assert!(state.fleet.service_history(None).await.unwrap().is_empty());

    // reads stay open to regular users
    for uri in ["/api/vehicles", "/api/incidents", "/api/maintenance"] {
        let resp = app
            .clone()
            .oneshot(get_request(uri, Some(&user)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn incident_status_is_patched_by_id() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let admin = api_login(&app, "admin", "admin123").await;
    let today = Local::now().date_naive();

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles",
            Some(&admin),
            json!({ "plate": "AB123CD" }),
        ))
        .await
        .unwrap();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/incidents",
            Some(&admin),
            json!({ "plate": "AB123CD", "date": today, "kind": "Choque" }),
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/incidents/{id}"),
            Some(&admin),
            json!({ "status": "EN PROCESO" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["id"], id);
    assert_eq!(body["status"], "EN PROCESO");

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/incidents/{id}"),
            Some(&admin),
            json!({ "status": "ARCHIVADO" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .oneshot(json_request(
            "PATCH",
            "/api/incidents/9999",
            Some(&admin),
            json!({ "status": "RESUELTO" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn maintenance_schedules_drive_reminders() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let admin = api_login(&app, "admin", "admin123").await;
    let user = api_login(&app, "user", "user123").await;
    let today = Local::now().date_naive();

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles",
            Some(&admin),
            json!({ "plate": "AB123CD", "km": 10000 }),
        ))
        .await
        .unwrap();

    // no schedule yet, nothing to remind about
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles/AB123CD/reminder",
            Some(&admin),
            json!({ "phone": "+5491100000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let soon = today + Duration::days(3);
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/maintenance",
            Some(&admin),
            json!({
                "plate": "ab123cd",
                "scheduled_date": soon,
                "scheduled_km": 15000,
                "service_kind": "Cambio de aceite"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let schedule = body_json(resp).await;
    let id = schedule["id"].as_i64().unwrap();
    assert_eq!(schedule["plate"], "AB123CD");
    assert_eq!(schedule["status"], "PENDIENTE");

    let resp = app
        .clone()
        .oneshot(get_request("/api/maintenance?within_days=7", Some(&user)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
    let resp = app
        .clone()
        .oneshot(get_request("/api/maintenance/reminders", Some(&user)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await[0]["id"], id);

    // regular users may read reminders but not send them
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles/AB123CD/reminder",
            Some(&user),
            json!({ "phone": "+5491100000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/vehicles/AB123CD/reminder",
            Some(&admin),
            json!({ "phone": "+5491100000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let sent = body_json(resp).await;
    assert_eq!(sent["simulated"], true);
    assert_eq!(sent["schedule_id"], id);
    let text = sent["text"].as_str().unwrap();
    assert!(text.contains(&soon.format("%Y-%m-%d").to_string()));
    assert!(text.contains("15000 km"));

    let resp = app
        .clone()
        .oneshot(get_request(&format!("/api/maintenance/{id}"), Some(&user)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["reminder_sent"], true);
    let resp = app
        .clone()
        .oneshot(get_request("/api/maintenance/reminders", Some(&user)))
        .await
        .unwrap();
    assert!(body_json(resp).await.as_array().unwrap().is_empty());

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/maintenance/{id}"),
            Some(&admin),
            json!({ "status": "COMPLETADO" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "COMPLETADO");

    let resp = app
        .oneshot(get_request("/api/maintenance?status=PENDIENTE", Some(&user)))
        .await
        .unwrap();
    assert!(body_json(resp).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn failed_login_keeps_the_existing_session() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let cookie = api_login(&app, "admin", "admin123").await;

    let resp = app
        .clone()
        .oneshot(form_request(
            "/login",
            Some(&cookie),
            "username=admin&password=wrong",
        ))
        .await
        .unwrap();
    assert_eq!(resp.headers()[header::LOCATION], "/login?error=1");
    assert!(resp.headers().get(header::SET_COOKIE).is_none());

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            Some(&cookie),
            json!({ "username": "admin", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(get_request("/api/accounts", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn backups_carry_descriptions_and_export_to_csv() {
    let install = Install::new();
    let app = flota::fleet_router(install.open().await);
    let admin = api_login(&app, "admin", "admin123").await;
    let user = api_login(&app, "user", "user123").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/backups",
            Some(&admin),
            json!({ "description": "cierre de mes" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["description"], "cierre de mes");

    let resp = app
        .clone()
        .oneshot(get_request("/api/backups", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await[0]["description"], "cierre de mes");

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/backups/export", Some(&user), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .oneshot(json_request("POST", "/api/backups/export", Some(&admin), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    let dir = std::path::PathBuf::from(body["dir"].as_str().unwrap());
    assert!(dir.starts_with(&install.cfg.basic.backup_dir));
    let tables = body["tables"].as_array().unwrap();
    let accounts = tables.iter().find(|t| t["table"] == "accounts").unwrap();
    assert_eq!(accounts["rows"], 2);
    assert!(dir.join("vehicles.csv").is_file());
}
