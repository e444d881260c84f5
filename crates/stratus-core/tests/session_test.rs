#![allow(clippy::unwrap_used)]
// Session resolution, login/logout and registration against a mock server.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use stratus_core::{
    Access, Gate, LoginForm, LoginResult, LogoutControl, RegistrationForm, RegistrationResult,
    Route, SessionIdentity,
};

use common::{REDIRECT, mount_csrf, setup, wait_until};

fn password(text: &str) -> SecretString {
    SecretString::from(text.to_owned())
}

// ── Session probe ───────────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_probe_resolves_signed_out() {
    let (server, app) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/session/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "no session"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(app.session().gate(Access::Authenticated), Gate::Loading);

    let identity = app.resolve_session().await.unwrap();
    assert_eq!(identity.is_authenticated, Some(false));
    assert_eq!(identity.is_admin, Some(false));
    assert_eq!(
        app.session().gate(Access::Authenticated),
        Gate::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn test_ok_probe_populates_identity() {
    let (server, app) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/session/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"userID": 7, "username": "ann", "isAdmin": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let identity = app.resolve_session().await.unwrap();
    assert_eq!(
        identity,
        SessionIdentity {
            is_authenticated: Some(true),
            is_admin: Some(false),
            username: Some("ann".into()),
            user_id: Some(7),
        }
    );

    // Already resolved: no second probe.
    app.resolve_session().await.unwrap();
    assert_eq!(app.session().gate_route(Route::AdminPanel), Gate::Redirect(Route::Home));
}

#[tokio::test]
async fn test_unreachable_probe_resolves_signed_out_with_error() {
    let server = wiremock::MockServer::start().await;
    let mut config = common::config(&server);
    config.server_url = url::Url::parse("http://127.0.0.1:9").unwrap();
    let app = stratus_core::CloudApp::new(config).unwrap();

    let err = app.resolve_session().await.unwrap_err();
    assert!(err.is_communication());
    assert!(app.session().is_resolved());
    assert!(!app.session().is_authenticated());
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_redirects_after_delay() {
    let (server, app) = setup().await;
    mount_csrf(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .and(header("X-CSRFToken", "tok"))
        .and(body_json(json!({"username": "bob", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"username": "bob", "userID": 3, "isAdmin": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let form = LoginForm::new(&app);
    let started = std::time::Instant::now();
    let result = form.submit("bob", &password("pw")).await;

    assert!(started.elapsed() >= REDIRECT);
    match result {
        LoginResult::Authenticated { identity, target } => {
            assert_eq!(target, Route::Dashboard);
            assert_eq!(identity.username.as_deref(), Some("bob"));
            assert_eq!(identity.user_id, Some(3));
        }
        other => panic!("unexpected login result: {other:?}"),
    }
    assert!(app.session().is_authenticated());
    assert!(!app.session().is_admin());
}

#[tokio::test]
async fn test_identity_is_set_only_after_redirect_delay() {
    let (server, app) = setup().await;
    mount_csrf(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"username": "root", "userID": 1, "isAdmin": true})),
        )
        .mount(&server)
        .await;

    let form = LoginForm::new(&app);
    let outcome = form.outcome();
    assert!(!outcome.is_loading());

    let task = tokio::spawn(async move { form.submit("root", &password("pw")).await });

    // The success reply is in, but the identity waits for the redirect.
    tokio::time::sleep(REDIRECT / 2).await;
    assert!(!app.session().is_resolved());

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        LoginResult::Authenticated {
            target: Route::AdminPanel,
            ..
        }
    ));
    assert!(app.session().is_admin());
}

#[tokio::test]
async fn test_login_rejected_leaves_identity_untouched() {
    let (server, app) = setup().await;
    mount_csrf(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let form = LoginForm::new(&app);
    let result = form.submit("bob", &password("wrong")).await;

    match result {
        LoginResult::Rejected { detail } => assert_eq!(detail, "Invalid credentials"),
        other => panic!("unexpected login result: {other:?}"),
    }
    assert_eq!(app.session().identity(), SessionIdentity::default());

    // The refusal is transient on screen.
    assert!(wait_until(|| form.outcome().status().is_none()).await);
}

// ── Logout ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_logout_resets_identity() {
    let (server, app) = setup().await;
    mount_csrf(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/logout/"))
        .and(header("X-CSRFToken", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    app.session().sign_in(&stratus_core::SessionInfo {
        user_id: 3,
        username: "bob".into(),
        is_admin: false,
    });

    LogoutControl::new(&app).logout().await.unwrap();
    assert_eq!(app.session().identity(), SessionIdentity::signed_out());
}

#[tokio::test]
async fn test_logout_failure_keeps_identity() {
    let (server, app) = setup().await;
    mount_csrf(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/logout/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    app.session().sign_in(&stratus_core::SessionInfo {
        user_id: 3,
        username: "bob".into(),
        is_admin: false,
    });

    assert!(LogoutControl::new(&app).logout().await.is_err());
    assert!(app.session().is_authenticated());
}

// ── Registration ────────────────────────────────────────────────────

#[tokio::test]
async fn test_registration_success_targets_login() {
    let (server, app) = setup().await;
    mount_csrf(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/users/registration/"))
        .and(body_json(
            json!({"username": "cat", "password": "Secret1!", "email": "cat@example.com"}),
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 12})))
        .expect(1)
        .mount(&server)
        .await;

    let result = RegistrationForm::new(&app)
        .submit("cat", &password("Secret1!"), "cat@example.com")
        .await;
    assert!(matches!(
        result,
        RegistrationResult::Registered {
            target: Route::Login
        }
    ));
    // Registration does not sign anyone in.
    assert!(!app.session().is_resolved());
}

#[tokio::test]
async fn test_registration_reports_field_errors() {
    let (server, app) = setup().await;
    mount_csrf(&server, "tok").await;

    Mock::given(method("POST"))
        .and(path("/api/users/registration/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "username": ["A user with that username already exists."],
            "email": ["Enter a valid email address."]
        })))
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let result = RegistrationForm::new(&app)
        .submit("cat", &password("x"), "nope")
        .await;
    assert!(started.elapsed() < Duration::from_secs(2));

    match result {
        RegistrationResult::Invalid(errors) => {
            assert_eq!(
                errors.username,
                vec!["A user with that username already exists.".to_owned()]
            );
            assert_eq!(errors.email, vec!["Enter a valid email address.".to_owned()]);
            assert!(errors.password.is_empty());
        }
        other => panic!("unexpected registration result: {other:?}"),
    }
}
